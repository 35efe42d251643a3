use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named numeric parameters of the molecule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Parameter {
    Gravity,
    Damping,
    /// Coefficient of restitution for wall impacts. Only values in `[0, 1]` are
    /// physically meaningful; anything else is accepted but not useful.
    Elasticity,
    /// Mass of every non-special atom.
    Mass,
    /// Mass of the special atom.
    MassSpecial,
    /// Rest length of non-special springs.
    Length,
    LengthSpecial,
    Stiffness,
    StiffnessSpecial,
}

impl Parameter {
    pub const ALL: [Parameter; 9] = [
        Parameter::Gravity,
        Parameter::Damping,
        Parameter::Elasticity,
        Parameter::Mass,
        Parameter::MassSpecial,
        Parameter::Length,
        Parameter::LengthSpecial,
        Parameter::Stiffness,
        Parameter::StiffnessSpecial,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Parameter::Gravity => "gravity",
            Parameter::Damping => "damping",
            Parameter::Elasticity => "elasticity",
            Parameter::Mass => "mass",
            Parameter::MassSpecial => "mass_special",
            Parameter::Length => "length",
            Parameter::LengthSpecial => "length_special",
            Parameter::Stiffness => "stiffness",
            Parameter::StiffnessSpecial => "stiffness_special",
        }
    }

    /// Recommended UI slider range. Advisory only; see [`Parameter::check`].
    pub fn range(&self) -> (f64, f64) {
        match self {
            Parameter::Gravity => (0.0, 20.0),
            Parameter::Damping | Parameter::Elasticity => (0.0, 1.0),
            Parameter::Mass | Parameter::MassSpecial => (0.2, 20.2),
            Parameter::Length | Parameter::LengthSpecial => (0.1, 10.1),
            Parameter::Stiffness | Parameter::StiffnessSpecial => (0.0, 100.0),
        }
    }

    /// Reject values that are not physically meaningful.
    ///
    /// Masses must be > 0, lengths and stiffnesses >= 0, and every value finite.
    pub fn check(&self, value: f64) -> Result<()> {
        if !value.is_finite() {
            return Err(Error::InvalidParam(format!("{} must be finite", self.name())));
        }
        let ok = match self {
            Parameter::Mass | Parameter::MassSpecial => value > 0.0,
            Parameter::Length
            | Parameter::LengthSpecial
            | Parameter::Stiffness
            | Parameter::StiffnessSpecial => value >= 0.0,
            Parameter::Gravity | Parameter::Damping | Parameter::Elasticity => true,
        };
        if ok {
            Ok(())
        } else {
            let bound = match self {
                Parameter::Mass | Parameter::MassSpecial => "> 0",
                _ => ">= 0",
            };
            Err(Error::InvalidParam(format!(
                "{} must be {}, got {}",
                self.name(),
                bound,
                value
            )))
        }
    }
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Parameter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let key = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        Parameter::ALL
            .iter()
            .copied()
            .find(|p| p.name() == key)
            .ok_or_else(|| Error::InvalidParam(format!("unknown parameter '{s}'")))
    }
}

/// Current values of every [`Parameter`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub gravity: f64,
    pub damping: f64,
    pub elasticity: f64,
    pub mass: f64,
    pub mass_special: f64,
    pub length: f64,
    pub length_special: f64,
    pub stiffness: f64,
    pub stiffness_special: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            gravity: 4.0,
            damping: 0.1,
            elasticity: 0.8,
            mass: 0.5,
            mass_special: 2.0,
            length: 3.0,
            length_special: 3.0,
            stiffness: 6.0,
            stiffness_special: 6.0,
        }
    }
}

impl Parameters {
    pub fn get(&self, p: Parameter) -> f64 {
        match p {
            Parameter::Gravity => self.gravity,
            Parameter::Damping => self.damping,
            Parameter::Elasticity => self.elasticity,
            Parameter::Mass => self.mass,
            Parameter::MassSpecial => self.mass_special,
            Parameter::Length => self.length,
            Parameter::LengthSpecial => self.length_special,
            Parameter::Stiffness => self.stiffness,
            Parameter::StiffnessSpecial => self.stiffness_special,
        }
    }

    /// Validate and store; on error the previous value is kept.
    pub fn set(&mut self, p: Parameter, value: f64) -> Result<()> {
        p.check(value)?;
        let slot = match p {
            Parameter::Gravity => &mut self.gravity,
            Parameter::Damping => &mut self.damping,
            Parameter::Elasticity => &mut self.elasticity,
            Parameter::Mass => &mut self.mass,
            Parameter::MassSpecial => &mut self.mass_special,
            Parameter::Length => &mut self.length,
            Parameter::LengthSpecial => &mut self.length_special,
            Parameter::Stiffness => &mut self.stiffness,
            Parameter::StiffnessSpecial => &mut self.stiffness_special,
        };
        *slot = value;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        for p in Parameter::ALL {
            p.check(self.get(p))?;
        }
        Ok(())
    }
}

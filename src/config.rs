//! Configuration for building a molecule simulation.
//!
//! [`SimConfig`] is a `serde` document with defaults for every field, so a JSON
//! config only needs the values it changes:
//!
//! ```json
//! {
//!   "parameters": { "gravity": 0.0, "elasticity": 1.0 },
//!   "solver": "rk4",
//!   "time_step": 0.01,
//!   "seed": 7,
//!   "initial_speed": 2.0,
//!   "tolerances": { "distance_tol": 1e-7, "max_bisections": 40 }
//! }
//! ```

use crate::core::collision::CollisionTolerances;
use crate::core::parameter::Parameters;
use crate::core::solver::Solver;
use crate::core::wall::Domain;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Initial parameter values.
    pub parameters: Parameters,
    /// Interior of the four walls.
    pub domain: Domain,
    pub atom_radius: f64,
    pub wall_thickness: f64,
    /// RNG seed for initial velocities; `None` draws one from the OS.
    pub seed: Option<u64>,
    /// Each velocity component starts uniform in `[-initial_speed, initial_speed]`.
    pub initial_speed: f64,
    pub solver: Solver,
    /// Default sub-step of the collision-aware advancer.
    pub time_step: f64,
    pub tolerances: CollisionTolerances,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            parameters: Parameters::default(),
            domain: Domain::default(),
            atom_radius: 0.5,
            wall_thickness: 1.0,
            seed: None,
            initial_speed: 0.0,
            solver: Solver::default(),
            time_step: 0.025,
            tolerances: CollisionTolerances::default(),
        }
    }
}

impl SimConfig {
    /// Parse a JSON document and validate it.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: SimConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject non-physical values.
    ///
    /// Atoms must fit inside the domain with room to spare: they are placed on a
    /// ring of radius a quarter of the smaller domain side.
    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;
        self.domain.validate()?;
        self.tolerances.validate()?;
        let span = self.domain.width().min(self.domain.height());
        if !self.atom_radius.is_finite() || self.atom_radius <= 0.0 || self.atom_radius >= 0.25 * span {
            return Err(Error::InvalidParam(format!(
                "atom_radius must be in (0, {}), got {}",
                0.25 * span,
                self.atom_radius
            )));
        }
        if !self.wall_thickness.is_finite() || self.wall_thickness <= 0.0 {
            return Err(Error::InvalidParam("wall_thickness must be > 0".into()));
        }
        if !self.initial_speed.is_finite() || self.initial_speed < 0.0 {
            return Err(Error::InvalidParam(
                "initial_speed must be finite and >= 0".into(),
            ));
        }
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(Error::InvalidParam(
                "time_step must be finite and > 0".into(),
            ));
        }
        Ok(())
    }
}

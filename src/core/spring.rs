use crate::core::point_mass::{norm, sub, Vec2};
use crate::error::{Error, Result};

/// Hooke's-law spring between two atoms.
///
/// Endpoints are atom indices into the owning molecule; the spring observes the
/// atoms and never owns them.
#[derive(Debug, Clone, PartialEq)]
pub struct Spring {
    /// `SPRINGi-j` or `SPECIALi-j` (1-based atom numbers).
    pub name: String,
    pub atom1: usize,
    pub atom2: usize,
    pub rest_length: f64,
    pub stiffness: f64,
    /// Special springs take their length and stiffness from the special parameters.
    pub special: bool,
}

impl Spring {
    pub fn new(atom1: usize, atom2: usize, rest_length: f64, stiffness: f64, special: bool) -> Result<Self> {
        if atom1 == atom2 {
            return Err(Error::InvalidParam(
                "spring endpoints must be distinct atoms".into(),
            ));
        }
        check_length(rest_length)?;
        check_stiffness(stiffness)?;
        let prefix = if special { "SPECIAL" } else { "SPRING" };
        Ok(Self {
            name: format!("{}{}-{}", prefix, atom1 + 1, atom2 + 1),
            atom1,
            atom2,
            rest_length,
            stiffness,
            special,
        })
    }

    #[inline]
    pub fn touches(&self, atom: usize) -> bool {
        self.atom1 == atom || self.atom2 == atom
    }

    /// Current length given the endpoint positions.
    #[inline]
    pub fn length(&self, r1: &Vec2, r2: &Vec2) -> f64 {
        norm(&sub(r2, r1))
    }

    /// Elastic potential energy 1/2 k (len - rest)^2.
    #[inline]
    pub fn potential_energy(&self, r1: &Vec2, r2: &Vec2) -> f64 {
        let stretch = self.length(r1, r2) - self.rest_length;
        0.5 * self.stiffness * stretch * stretch
    }

    /// Force exerted on `atom1`; `atom2` receives the negation.
    ///
    /// Positive stretch pulls the endpoints together. Coincident endpoints give no
    /// force because the spring axis is undefined.
    pub fn force_on_first(&self, r1: &Vec2, r2: &Vec2) -> Vec2 {
        let d = sub(r2, r1);
        let len = norm(&d);
        if len <= f64::EPSILON {
            return [0.0, 0.0];
        }
        let f = self.stiffness * (len - self.rest_length) / len;
        [f * d[0], f * d[1]]
    }

    pub fn set_rest_length(&mut self, rest_length: f64) -> Result<()> {
        check_length(rest_length)?;
        self.rest_length = rest_length;
        Ok(())
    }

    pub fn set_stiffness(&mut self, stiffness: f64) -> Result<()> {
        check_stiffness(stiffness)?;
        self.stiffness = stiffness;
        Ok(())
    }
}

fn check_length(v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::InvalidParam(
            "spring rest length must be finite and >= 0".into(),
        ));
    }
    Ok(())
}

fn check_stiffness(v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(Error::InvalidParam(
            "spring stiffness must be finite and >= 0".into(),
        ));
    }
    Ok(())
}

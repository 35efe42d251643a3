use crate::core::wall::WallSide;
use crate::error::{Error, Result};
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// How a detected atom–wall contact is resolved.
///
/// Tie-breaking for deterministic ordering prefers `Impact` over `Resting` at equal depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CollisionKind {
    /// The atom hit the wall during the step; its time is located by bisection.
    Impact,
    /// The atom was already touching with negligible normal speed; it is clamped
    /// to the wall face without a search.
    Resting,
}

/// An atom found overlapping (or having passed through) a wall.
///
/// - `atom`: index into the molecule's atoms.
/// - `side`: wall that was hit.
/// - `depth`: penetration depth past the wall face (finite, non-NaN, >= 0).
/// - `normal_velocity`: velocity along the inward wall normal; negative means approaching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WallCollision {
    pub atom: usize,
    pub side: WallSide,
    pub depth: NotNan<f64>,
    pub normal_velocity: NotNan<f64>,
    pub kind: CollisionKind,
}

impl WallCollision {
    /// Create a new collision record, validating that depth and velocity are finite.
    pub fn new(
        atom: usize,
        side: WallSide,
        depth: f64,
        normal_velocity: f64,
        kind: CollisionKind,
    ) -> Result<Self> {
        if !depth.is_finite() || !normal_velocity.is_finite() {
            return Err(Error::InvalidParam(
                "collision depth and velocity must be finite".into(),
            ));
        }
        let depth = NotNan::new(depth.max(0.0))
            .map_err(|_| Error::InvalidParam("collision depth cannot be NaN".into()))?;
        let normal_velocity = NotNan::new(normal_velocity)
            .map_err(|_| Error::InvalidParam("collision velocity cannot be NaN".into()))?;
        Ok(Self {
            atom,
            side,
            depth,
            normal_velocity,
            kind,
        })
    }

    #[inline]
    pub fn depth_f64(&self) -> f64 {
        self.depth.into_inner()
    }

    #[inline]
    pub fn is_impact(&self) -> bool {
        self.kind == CollisionKind::Impact
    }
}

impl Ord for WallCollision {
    /// Shallow before deep, so `max()` picks the worst penetration.
    fn cmp(&self, other: &Self) -> Ordering {
        self.depth
            .cmp(&other.depth)
            .then_with(|| other.kind.cmp(&self.kind))
            .then_with(|| other.atom.cmp(&self.atom))
            .then_with(|| other.side.cmp(&self.side))
            .then_with(|| self.normal_velocity.cmp(&other.normal_velocity))
    }
}

impl PartialOrd for WallCollision {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Deepest impact penetration in `collisions`, 0 if there is none.
pub fn max_impact_depth(collisions: &[WallCollision]) -> f64 {
    collisions
        .iter()
        .filter(|c| c.is_impact())
        .max()
        .map_or(0.0, |c| c.depth_f64())
}

/// Tunable constants of the collision search.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTolerances {
    /// Penetration depth accepted as "at the wall" when bisection stops.
    pub distance_tol: f64,
    /// Halvings of a sub-step before the search gives up and reports a near miss.
    pub max_bisections: u32,
    /// Gap within which an atom counts as touching a wall.
    pub contact_band: f64,
    /// Largest normal speed at which a touching atom is treated as resting.
    pub resting_speed: f64,
    /// Sub-steps allowed per advance call.
    pub max_sub_steps: usize,
}

impl Default for CollisionTolerances {
    fn default() -> Self {
        Self {
            distance_tol: 1e-6,
            max_bisections: 30,
            contact_band: 1e-5,
            resting_speed: 1e-3,
            max_sub_steps: 10_000,
        }
    }
}

impl CollisionTolerances {
    pub fn validate(&self) -> Result<()> {
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.distance_tol) || !positive(self.contact_band) {
            return Err(Error::InvalidParam(
                "distance_tol and contact_band must be finite and > 0".into(),
            ));
        }
        if !self.resting_speed.is_finite() || self.resting_speed < 0.0 {
            return Err(Error::InvalidParam(
                "resting_speed must be finite and >= 0".into(),
            ));
        }
        if self.max_bisections == 0 || self.max_sub_steps == 0 {
            return Err(Error::InvalidParam(
                "max_bisections and max_sub_steps must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use CollisionKind::{Impact, Resting};

    #[test]
    fn new_collision_rejects_nan() {
        let err = WallCollision::new(0, WallSide::Left, f64::NAN, -1.0, Impact).unwrap_err();
        assert!(err.to_string().contains("finite"));
    }

    #[test]
    fn negative_depth_clamped_to_zero() -> Result<()> {
        let c = WallCollision::new(0, WallSide::Top, -1e-9, -2.0, Impact)?;
        assert_eq!(c.depth_f64(), 0.0);
        Ok(())
    }

    #[test]
    fn ordering_by_depth() -> Result<()> {
        let shallow = WallCollision::new(0, WallSide::Left, 1e-4, -1.0, Impact)?;
        let deep = WallCollision::new(1, WallSide::Bottom, 2e-3, -1.0, Impact)?;
        assert!(shallow < deep);
        assert_eq!([shallow, deep].iter().max(), Some(&deep));
        Ok(())
    }

    #[test]
    fn tie_breaker_prefers_impact_over_resting() -> Result<()> {
        let a = WallCollision::new(0, WallSide::Left, 1e-3, -1.0, Impact)?;
        let b = WallCollision::new(0, WallSide::Left, 1e-3, -1.0, Resting)?;
        assert!(a > b);
        Ok(())
    }

    #[test]
    fn max_impact_depth_ignores_resting() -> Result<()> {
        let cs = [
            WallCollision::new(0, WallSide::Bottom, 5e-2, -0.1, Resting)?,
            WallCollision::new(1, WallSide::Left, 3e-4, -2.0, Impact)?,
        ];
        assert_eq!(max_impact_depth(&cs), 3e-4);
        assert_eq!(max_impact_depth(&[]), 0.0);
        Ok(())
    }

    #[test]
    fn default_tolerances_valid() -> Result<()> {
        CollisionTolerances::default().validate()?;
        let bad = CollisionTolerances {
            max_bisections: 0,
            ..CollisionTolerances::default()
        };
        assert!(bad.validate().is_err());
        Ok(())
    }
}

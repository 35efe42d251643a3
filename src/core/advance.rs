use crate::config::SimConfig;
use crate::core::collision::{max_impact_depth, CollisionTolerances, WallCollision};
use crate::core::molecule::MoleculeSim;
use crate::core::solver::Solver;
use crate::error::{Error, Result};
use log::{debug, warn};

/// Small numeric tolerance for time comparisons.
const EPS_TIME: f64 = 1e-12;

/// What happened during one [`CollisionAdvance::advance`] call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AdvanceReport {
    /// Simulation time after the call.
    pub time: f64,
    /// Solver sub-steps taken, accepted or not.
    pub sub_steps: usize,
    /// Trial steps spent locating collision times.
    pub bisections: usize,
    /// Atom–wall contacts that changed the state.
    pub collisions: usize,
    /// Collision searches that hit `max_bisections` without converging.
    pub near_misses: usize,
    /// `Error::StepLimitExceeded` if the sub-step cap cut the call short. The state
    /// is still valid; the molecule simply has not reached the requested time.
    pub warning: Option<Error>,
}

impl AdvanceReport {
    pub fn completed(&self) -> bool {
        self.warning.is_none()
    }
}

/// Result of a collision-time search inside one sub-step.
struct Located {
    /// Time from the sub-step start to the estimated collision.
    dt: f64,
    state: Vec<f64>,
    collisions: Vec<WallCollision>,
    iterations: usize,
    converged: bool,
}

/// Advances a [`MoleculeSim`] through time without letting atoms pass walls.
///
/// Each call integrates in sub-steps of at most `time_step`. When a sub-step ends
/// with an atom in a wall, the sub-step is bisected (re-integrating from its start)
/// until the penetration is within `distance_tol`; the collision is resolved there
/// and integration resumes with a fresh sub-step.
#[derive(Debug, Clone, PartialEq)]
pub struct CollisionAdvance {
    solver: Solver,
    time_step: f64,
    tolerances: CollisionTolerances,
}

impl CollisionAdvance {
    pub fn new(config: &SimConfig) -> Result<Self> {
        Self::with_parts(config.solver, config.time_step, config.tolerances)
    }

    pub fn with_parts(solver: Solver, time_step: f64, tolerances: CollisionTolerances) -> Result<Self> {
        check_time_step(time_step)?;
        tolerances.validate()?;
        Ok(Self {
            solver,
            time_step,
            tolerances,
        })
    }

    pub fn solver(&self) -> Solver {
        self.solver
    }

    pub fn set_solver(&mut self, solver: Solver) {
        self.solver = solver;
    }

    pub fn time_step(&self) -> f64 {
        self.time_step
    }

    pub fn set_time_step(&mut self, time_step: f64) -> Result<()> {
        check_time_step(time_step)?;
        self.time_step = time_step;
        Ok(())
    }

    pub fn tolerances(&self) -> &CollisionTolerances {
        &self.tolerances
    }

    /// Advance the simulation to the absolute `target_time` (must be later than now).
    pub fn advance_to(&self, sim: &mut MoleculeSim, target_time: f64) -> Result<AdvanceReport> {
        if !target_time.is_finite() {
            return Err(Error::InvalidParam("target_time must be finite".into()));
        }
        self.advance(sim, target_time - sim.time())
    }

    /// Advance the simulation by `delta_t`.
    ///
    /// Returns `Err` only for invalid input (`delta_t` not positive and finite) or an
    /// internal solver failure. Hitting the sub-step cap is reported through
    /// [`AdvanceReport::warning`] with the best state reached written back.
    pub fn advance(&self, sim: &mut MoleculeSim, delta_t: f64) -> Result<AdvanceReport> {
        if !delta_t.is_finite() || delta_t <= 0.0 {
            return Err(Error::InvalidParam(format!(
                "advance interval must be finite and > 0, got {delta_t}"
            )));
        }
        let tol = &self.tolerances;
        let mut t = sim.time();
        let target = t + delta_t;
        let eps = EPS_TIME * target.abs().max(1.0);
        let mut y = sim.state();
        let mut report = AdvanceReport::default();

        while target - t > eps {
            if report.sub_steps >= tol.max_sub_steps {
                warn!(
                    "sub-step limit {} reached at t={} (target {})",
                    tol.max_sub_steps, t, target
                );
                report.warning = Some(Error::StepLimitExceeded {
                    sub_steps: report.sub_steps,
                    time: t,
                });
                break;
            }
            report.sub_steps += 1;

            let remaining = target - t;
            let last = self.time_step >= remaining;
            let h = if last { remaining } else { self.time_step };
            let next = self.solver.step(sim, &y, t, h)?;
            let collisions = sim.find_collisions(&y, &next, h, tol)?;

            if !collisions.iter().any(|c| c.is_impact()) {
                y = next;
                t = if last { target } else { t + h };
                if !collisions.is_empty() {
                    report.collisions += sim.handle_collisions(&mut y, &collisions)?;
                }
                continue;
            }

            let found = self.locate(sim, &y, t, h, next, collisions)?;
            report.bisections += found.iterations;
            if !found.converged {
                report.near_misses += 1;
                warn!(
                    "collision search did not converge in {} halvings at t={}; depth {}",
                    found.iterations,
                    t + found.dt,
                    max_impact_depth(&found.collisions)
                );
            }
            y = found.state;
            t += found.dt;
            report.collisions += sim.handle_collisions(&mut y, &found.collisions)?;
        }

        if report.warning.is_none() {
            // Whatever is left is below the time resolution.
            t = target;
        }
        sim.set_state(&y, t)?;
        report.time = t;
        if report.collisions > 0 {
            debug!(
                "advanced to t={}: {} sub-steps, {} collisions, {} bisections",
                t, report.sub_steps, report.collisions, report.bisections
            );
        }
        Ok(report)
    }

    /// Bisect `[t, t + h]` for the first moment an atom is in a wall.
    ///
    /// `lo` always ends a collision-free step from `y`; `hi` always ends inside a
    /// wall. Stops when the deepest impact at `hi` is within `distance_tol`.
    fn locate(
        &self,
        sim: &MoleculeSim,
        y: &[f64],
        t: f64,
        h: f64,
        trial: Vec<f64>,
        trial_collisions: Vec<WallCollision>,
    ) -> Result<Located> {
        let tol = &self.tolerances;
        let mut lo = 0.0;
        let mut best = Located {
            dt: h,
            state: trial,
            collisions: trial_collisions,
            iterations: 0,
            converged: false,
        };
        loop {
            if max_impact_depth(&best.collisions) <= tol.distance_tol {
                best.converged = true;
                return Ok(best);
            }
            if best.iterations >= tol.max_bisections as usize {
                return Ok(best);
            }
            best.iterations += 1;
            let mid = 0.5 * (lo + best.dt);
            let state = self.solver.step(sim, y, t, mid)?;
            let collisions = sim.find_collisions(y, &state, mid, tol)?;
            if collisions.iter().any(|c| c.is_impact()) {
                best.dt = mid;
                best.state = state;
                best.collisions = collisions;
            } else {
                lo = mid;
            }
        }
    }
}

impl Default for CollisionAdvance {
    fn default() -> Self {
        Self {
            solver: Solver::default(),
            time_step: SimConfig::default().time_step,
            tolerances: CollisionTolerances::default(),
        }
    }
}

fn check_time_step(time_step: f64) -> Result<()> {
    if !time_step.is_finite() || time_step <= 0.0 {
        return Err(Error::InvalidParam(format!(
            "time_step must be finite and > 0, got {time_step}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::parameter::Parameter;

    fn free_config() -> SimConfig {
        let mut cfg = SimConfig::default();
        cfg.parameters.gravity = 0.0;
        cfg.parameters.damping = 0.0;
        cfg.parameters.elasticity = 1.0;
        cfg.parameters.stiffness = 0.0;
        cfg.parameters.stiffness_special = 0.0;
        cfg
    }

    #[test]
    fn rejects_non_positive_interval() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(2, &SimConfig::default())?;
        let adv = CollisionAdvance::default();
        assert!(adv.advance(&mut sim, 0.0).is_err());
        assert!(adv.advance(&mut sim, -1.0).is_err());
        assert!(adv.advance(&mut sim, f64::NAN).is_err());
        assert_eq!(sim.time(), 0.0);
        Ok(())
    }

    #[test]
    fn lands_exactly_on_target() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(3, &SimConfig::default())?;
        let adv = CollisionAdvance::default();
        let report = adv.advance(&mut sim, 0.06)?;
        assert_eq!(sim.time(), 0.06);
        assert_eq!(report.time, 0.06);
        // 0.025 + 0.025 + 0.01
        assert_eq!(report.sub_steps, 3);
        assert!(report.completed());
        adv.advance_to(&mut sim, 0.1)?;
        assert!((sim.time() - 0.1).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn interval_below_time_resolution_still_moves_clock() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(2, &SimConfig::default())?;
        let before = sim.state();
        let adv = CollisionAdvance::default();
        let report = adv.advance(&mut sim, 1e-13)?;
        assert_eq!(report.sub_steps, 0);
        assert!(report.completed());
        assert_eq!(sim.time(), 1e-13);
        assert_eq!(report.time, 1e-13);
        assert_eq!(sim.state(), before);
        Ok(())
    }

    #[test]
    fn free_flight_matches_closed_form() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(2, &free_config())?;
        sim.set_atom_velocity(0, [1.0, 0.0])?;
        let x0 = sim.atoms()[0].r[0];
        CollisionAdvance::default().advance(&mut sim, 0.5)?;
        assert!((sim.atoms()[0].r[0] - (x0 + 0.5)).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn collision_time_is_located() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(2, &free_config())?;
        // ATOM1 at x = 4.0 heading right at speed 3: contact at x = 5.5 after 0.5.
        sim.set_atom_position(0, [4.0, 3.0])?;
        sim.set_atom_velocity(0, [3.0, 0.5])?;
        let adv = CollisionAdvance::default();
        let report = adv.advance(&mut sim, 0.6)?;
        assert_eq!(report.collisions, 1);
        assert_eq!(report.near_misses, 0);
        assert!(report.bisections > 0);
        let a = &sim.atoms()[0];
        // Bounced at t = 0.5, then 0.1 back at speed 3.
        assert!((a.r[0] - 5.2).abs() < 1e-5, "x = {}", a.r[0]);
        assert!((a.v[0] + 3.0).abs() < 1e-12);
        assert_eq!(a.v[1], 0.5);
        Ok(())
    }

    #[test]
    fn inelastic_impact_stops_normal_motion() -> Result<()> {
        let mut cfg = free_config();
        cfg.parameters.elasticity = 0.0;
        let mut sim = MoleculeSim::with_atoms(2, &cfg)?;
        sim.set_atom_position(0, [0.0, -4.0])?;
        sim.set_atom_velocity(0, [0.7, -5.0])?;
        let adv = CollisionAdvance::default();
        adv.advance(&mut sim, 0.5)?;
        let a = &sim.atoms()[0];
        assert_eq!(a.v[1], 0.0);
        assert_eq!(a.v[0], 0.7);
        assert!(a.r[1] >= -5.5 - 1e-6);
        Ok(())
    }

    #[test]
    fn step_limit_returns_valid_state() -> Result<()> {
        let mut cfg = SimConfig::default();
        cfg.tolerances.max_sub_steps = 3;
        let mut sim = MoleculeSim::with_atoms(4, &cfg)?;
        let adv = CollisionAdvance::new(&cfg)?;
        let report = adv.advance(&mut sim, 1.0)?;
        assert_eq!(report.sub_steps, 3);
        assert!(matches!(
            report.warning,
            Some(Error::StepLimitExceeded { sub_steps: 3, .. })
        ));
        assert!((sim.time() - 0.075).abs() < 1e-12);
        assert!(sim.state().iter().all(|x| x.is_finite()));
        Ok(())
    }

    #[test]
    fn parameter_change_applies_to_next_call() -> Result<()> {
        let mut sim = MoleculeSim::with_atoms(2, &free_config())?;
        let adv = CollisionAdvance::default();
        adv.advance(&mut sim, 0.1)?;
        assert_eq!(sim.atoms()[0].v, [0.0, 0.0]);
        sim.set_parameter(Parameter::Gravity, 10.0)?;
        adv.advance(&mut sim, 0.1)?;
        assert!((sim.atoms()[0].v[1] + 1.0).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn invalid_time_step_rejected() {
        assert!(CollisionAdvance::with_parts(Solver::Euler, 0.0, CollisionTolerances::default()).is_err());
        let mut adv = CollisionAdvance::default();
        assert!(adv.set_time_step(-1.0).is_err());
        assert_eq!(adv.time_step(), 0.025);
    }
}

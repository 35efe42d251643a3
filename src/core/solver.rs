//! Fixed-step explicit ODE solvers.
//!
//! The solvers know nothing about collisions: they integrate whatever rate law an
//! [`OdeSystem`] supplies and are deterministic for identical inputs, which the
//! collision bisection relies on.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// A first-order system `dy/dt = f(y, t)`.
pub trait OdeSystem {
    /// Length of the state vector.
    fn state_len(&self) -> usize;

    /// Write `f(state, t)` into `rates` (same length as `state`).
    fn evaluate(&self, state: &[f64], t: f64, rates: &mut [f64]);
}

/// Which integration method to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Solver {
    /// Forward Euler, first order.
    #[serde(rename = "euler")]
    Euler,
    /// Heun's method, second order.
    #[serde(rename = "modified_euler")]
    ModifiedEuler,
    /// Classical 4th-order Runge–Kutta.
    #[default]
    #[serde(rename = "rk4")]
    RungeKutta,
}

impl Solver {
    /// Integrate from `(y, t)` over `h` and return the new state.
    ///
    /// Errors: `Error::InvalidStep` if `h` is not a positive finite number,
    /// `Error::InvalidParam` if `y` does not match `system.state_len()`.
    pub fn step<S: OdeSystem + ?Sized>(&self, system: &S, y: &[f64], t: f64, h: f64) -> Result<Vec<f64>> {
        if !h.is_finite() || h <= 0.0 {
            return Err(Error::InvalidStep(h));
        }
        let n = system.state_len();
        if y.len() != n {
            return Err(Error::InvalidParam(format!(
                "state length {} does not match system length {}",
                y.len(),
                n
            )));
        }
        let out = match self {
            Solver::Euler => {
                let mut k1 = vec![0.0; n];
                system.evaluate(y, t, &mut k1);
                axpy(y, h, &k1)
            }
            Solver::ModifiedEuler => {
                let mut k1 = vec![0.0; n];
                let mut k2 = vec![0.0; n];
                system.evaluate(y, t, &mut k1);
                let y1 = axpy(y, h, &k1);
                system.evaluate(&y1, t + h, &mut k2);
                y.iter()
                    .zip(k1.iter().zip(&k2))
                    .map(|(yi, (a, b))| yi + 0.5 * h * (a + b))
                    .collect()
            }
            Solver::RungeKutta => {
                let half = 0.5 * h;
                let mut k1 = vec![0.0; n];
                let mut k2 = vec![0.0; n];
                let mut k3 = vec![0.0; n];
                let mut k4 = vec![0.0; n];
                system.evaluate(y, t, &mut k1);
                system.evaluate(&axpy(y, half, &k1), t + half, &mut k2);
                system.evaluate(&axpy(y, half, &k2), t + half, &mut k3);
                system.evaluate(&axpy(y, h, &k3), t + h, &mut k4);
                (0..n)
                    .map(|i| y[i] + h / 6.0 * (k1[i] + 2.0 * k2[i] + 2.0 * k3[i] + k4[i]))
                    .collect()
            }
        };
        Ok(out)
    }
}

/// `y + a * k`
#[inline]
fn axpy(y: &[f64], a: f64, k: &[f64]) -> Vec<f64> {
    y.iter().zip(k).map(|(yi, ki)| yi + a * ki).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Unit harmonic oscillator: x'' = -x.
    struct Oscillator;

    impl OdeSystem for Oscillator {
        fn state_len(&self) -> usize {
            2
        }
        fn evaluate(&self, state: &[f64], _t: f64, rates: &mut [f64]) {
            rates[0] = state[1];
            rates[1] = -state[0];
        }
    }

    fn integrate(solver: Solver, h: f64, steps: usize) -> Result<Vec<f64>> {
        let mut y = vec![1.0, 0.0];
        let mut t = 0.0;
        for _ in 0..steps {
            y = solver.step(&Oscillator, &y, t, h)?;
            t += h;
        }
        Ok(y)
    }

    #[test]
    fn rk4_tracks_cosine() -> Result<()> {
        let y = integrate(Solver::RungeKutta, 0.01, 100)?;
        assert!((y[0] - 1.0_f64.cos()).abs() < 1e-9);
        assert!((y[1] + 1.0_f64.sin()).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn higher_order_is_more_accurate() -> Result<()> {
        let exact = 1.0_f64.cos();
        let e1 = (integrate(Solver::Euler, 0.01, 100)?[0] - exact).abs();
        let e2 = (integrate(Solver::ModifiedEuler, 0.01, 100)?[0] - exact).abs();
        let e4 = (integrate(Solver::RungeKutta, 0.01, 100)?[0] - exact).abs();
        assert!(e2 < e1);
        assert!(e4 < e2);
        Ok(())
    }

    #[test]
    fn non_positive_step_rejected() {
        let y = [1.0, 0.0];
        assert_eq!(
            Solver::RungeKutta.step(&Oscillator, &y, 0.0, 0.0).unwrap_err(),
            Error::InvalidStep(0.0)
        );
        assert!(Solver::Euler.step(&Oscillator, &y, 0.0, -0.1).is_err());
        assert!(Solver::Euler.step(&Oscillator, &y, 0.0, f64::NAN).is_err());
    }

    #[test]
    fn wrong_state_length_rejected() {
        let err = Solver::RungeKutta.step(&Oscillator, &[1.0], 0.0, 0.1).unwrap_err();
        assert!(matches!(err, Error::InvalidParam(_)));
    }

    #[test]
    fn deterministic_for_identical_inputs() -> Result<()> {
        let y = [0.3, -0.7];
        let a = Solver::RungeKutta.step(&Oscillator, &y, 1.0, 0.05)?;
        let b = Solver::RungeKutta.step(&Oscillator, &y, 1.0, 0.05)?;
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn serde_names() -> Result<()> {
        let s: Solver = serde_json::from_str("\"modified_euler\"")?;
        assert_eq!(s, Solver::ModifiedEuler);
        assert_eq!(Solver::default(), Solver::RungeKutta);
        Ok(())
    }
}

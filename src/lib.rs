//! Spring-connected molecule of 2–6 atoms bouncing inside four walls.
//!
//! [`MoleculeSim`] owns the atoms, springs and walls and evaluates the force law;
//! [`CollisionAdvance`] steps it through time with an ODE [`Solver`], locating each
//! wall collision by bisection instead of integrating through it. Entity changes are
//! published through a [`SimList`] so a display layer can mirror them.
//!
//! ```
//! use molsim::{CollisionAdvance, MoleculeSim, Parameter, SimConfig};
//!
//! # fn main() -> molsim::error::Result<()> {
//! let config = SimConfig::default();
//! let mut sim = MoleculeSim::with_atoms(3, &config)?;
//! let advance = CollisionAdvance::new(&config)?;
//! sim.set_parameter(Parameter::Gravity, 9.8)?;
//! let report = advance.advance(&mut sim, 0.1)?;
//! assert!(report.completed());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod core;
pub mod error;

#[cfg(feature = "python")]
mod python;

pub use crate::config::SimConfig;
pub use crate::core::{
    AdvanceReport, CollisionAdvance, MoleculeSim, Parameter, SimList, SimListEvent, SimObject, Solver,
};

//! Core simulation types for the spring molecule.
//!
//! Leaves first: point masses, springs and walls; then the molecule that owns them,
//! the ODE solvers, and the collision-aware advancer that drives both.

pub mod advance;
pub mod collision;
pub mod molecule;
pub mod parameter;
pub mod point_mass;
pub mod sim_list;
pub mod solver;
pub mod spring;
pub mod wall;

pub use advance::{AdvanceReport, CollisionAdvance};
pub use collision::{CollisionKind, CollisionTolerances, WallCollision};
pub use molecule::{EnergyInfo, MoleculeSim};
pub use parameter::{Parameter, Parameters};
pub use point_mass::{PointMass, Shape, Vec2};
pub use sim_list::{ObserverId, SimList, SimListEvent, SimObject, SimObjectKind};
pub use solver::{OdeSystem, Solver};
pub use spring::Spring;
pub use wall::{Domain, Wall, WallSide};

//! The convex-subproblem adapter: turns linearized costs and constraints
//! into a quadratic program and hands it to [`clarabel`] (§4.3, §4.4).
//!
//! Every other crate in the workspace treats [`ConvexModel`] as the only
//! way to reach the solver; nothing outside this crate touches
//! `clarabel` directly.

pub mod error;
pub mod model;

pub use error::ConvexError;
pub use model::{ConvexModel, ConvexSolution};

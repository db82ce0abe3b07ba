//! Shared primitives for the trajopt workspace: the expression algebra,
//! the rectangular variable layout built on top of it, central-difference
//! Jacobians, and the workspace-wide error type.
//!
//! Every other `trajopt-*` crate depends on this one; nothing in here
//! depends on kinematics, collision checking, or the convex solver.

pub mod error;
pub mod expr;
pub mod numeric;
pub mod var_array;

pub use error::{TrajOptError, TrajOptResult};
pub use expr::{AffExpr, QuadExpr, Variable, CLEANUP_EPS};
pub use numeric::{calc_num_jac, calc_num_jac_default, DEFAULT_JACOBIAN_STEP};
pub use var_array::VariableArray;

use thiserror::Error;
use trajopt_core::TrajOptError;

/// Errors raised while assembling or solving a convex subproblem.
#[derive(Error, Debug)]
pub enum ConvexError {
    /// A row referenced a [`trajopt_core::Variable`] whose index is outside
    /// the model's variable count.
    #[error("variable index {0} out of range for a model with {1} variables")]
    VariableOutOfRange(usize, usize),

    /// Clarabel rejected the problem data before iterating (e.g. malformed
    /// settings or dimension mismatch).
    #[error("clarabel setup failed: {0}")]
    Setup(String),

    /// Clarabel iterated but reported the subproblem primal- or
    /// dual-infeasible.
    #[error("convex subproblem infeasible or unbounded: status = {0:?}")]
    Infeasible(clarabel::solver::SolverStatus),
}

impl From<ConvexError> for TrajOptError {
    fn from(err: ConvexError) -> Self {
        TrajOptError::Solver(err.to_string())
    }
}

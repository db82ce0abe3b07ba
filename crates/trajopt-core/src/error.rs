//! Unified error taxonomy for the trajopt workspace.
//!
//! This module provides [`TrajOptError`], the common error representation
//! that every crate boundary converts into, following the same shape as the
//! teacher's `GatError`: a small set of variants, one per failure class
//! named in the error-handling design, with `#[from]` conversions so `?`
//! composes across crate boundaries without manual mapping at every call
//! site.

use thiserror::Error;

/// Unified error type for all trajopt operations.
///
/// Variants map directly onto the error taxonomy: malformed configuration
/// is always [`TrajOptError::Config`], numerical breakdowns inside belief
/// propagation are [`TrajOptError::Numeric`], convex-subproblem failures are
/// [`TrajOptError::Solver`], and violated internal invariants are
/// [`TrajOptError::Invariant`] — the only variant that should abort the
/// process rather than be handled.
#[derive(Error, Debug)]
pub enum TrajOptError {
    /// Malformed JSON, unknown cost/constraint type, wrong vector lengths,
    /// invalid link/manipulator name, or a `given_traj` that disagrees with
    /// the robot's current DOF values under `start_fixed`. Always surfaced
    /// before any solve begins.
    #[error("config error: {0}")]
    Config(String),

    /// A Cholesky factorization of a non-PSD posterior covariance, or a
    /// singular innovation matrix, encountered while linearizing belief
    /// dynamics. Recoverable: callers propagate `f64::NAN` rather than
    /// aborting, so the SQP driver can treat it as a hard reject.
    #[error("numeric error: {0}")]
    Numeric(String),

    /// The convex subproblem was reported infeasible or unbounded by the
    /// underlying solver.
    #[error("solver error: {0}")]
    Solver(String),

    /// A variable bound was violated by a returned primal, or an expression
    /// referenced a variable outside the array it was built against. These
    /// indicate a bug in problem construction, not a bad input, and should
    /// not be caught and retried.
    #[error("invariant violation: {0}")]
    Invariant(String),
}

/// Convenience alias used throughout the workspace.
pub type TrajOptResult<T> = Result<T, TrajOptError>;

impl From<String> for TrajOptError {
    fn from(s: String) -> Self {
        TrajOptError::Config(s)
    }
}

impl From<&str> for TrajOptError {
    fn from(s: &str) -> Self {
        TrajOptError::Config(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_variant_and_message() {
        let err = TrajOptError::Solver("infeasible".into());
        assert!(err.to_string().contains("solver error"));
        assert!(err.to_string().contains("infeasible"));
    }

    #[test]
    fn question_mark_composes_across_string_conversion() {
        fn inner() -> TrajOptResult<()> {
            Err(TrajOptError::from("bad config"))
        }
        fn outer() -> TrajOptResult<()> {
            inner()?;
            Ok(())
        }
        assert!(outer().is_err());
    }
}

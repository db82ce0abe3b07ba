use thiserror::Error;
use trajopt_core::TrajOptError;

/// Errors raised by a [`crate::RobotModel`] or [`crate::CollisionChecker`]
/// implementation.
#[derive(Error, Debug)]
pub enum KinematicsError {
    /// `dof_values` had the wrong length for this model's DOF count.
    #[error("expected {expected} dof values, got {got}")]
    WrongDofCount { expected: usize, got: usize },

    /// A link name was not recognized by this model.
    #[error("unknown link: {0}")]
    UnknownLink(String),
}

impl From<KinematicsError> for TrajOptError {
    fn from(err: KinematicsError) -> Self {
        TrajOptError::Config(err.to_string())
    }
}

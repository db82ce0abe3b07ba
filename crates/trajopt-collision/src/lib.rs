//! Collision linearization (§4.8): turns [`trajopt_kinematics::Collision`]
//! records into affine distance expressions a convex-model hinge penalty
//! can consume.

pub mod cache;
pub mod distance_expr;
pub mod evaluator;

pub use evaluator::{CastCollisionEvaluator, CollisionEvaluator, SigmaPtsCollisionEvaluator, SingleTimestepCollisionEvaluator};

//! The kinematics/collision trait boundary (§6) plus a reference planar
//! arm used by tests and example configs. No cost or constraint in
//! `trajopt-costs` depends on a concrete robot; everything goes through
//! [`RobotModel`] and [`CollisionChecker`].

pub mod collision;
pub mod error;
pub mod null_collision_checker;
pub mod planar_arm;
pub mod quat;
pub mod robot_model;
pub mod sphere_obstacle;

pub use collision::{Collision, CollisionChecker, MixInfo};
pub use error::KinematicsError;
pub use null_collision_checker::NullCollisionChecker;
pub use planar_arm::PlanarArm;
pub use quat::{axis_angle_to_quat, quat_inv, quat_log, quat_mult, Quat, QUAT_IDENTITY};
pub use robot_model::RobotModel;
pub use sphere_obstacle::SphereObstacleChecker;

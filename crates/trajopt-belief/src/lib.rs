//! EKF belief-space dynamics on top of [`trajopt_kinematics::RobotModel`]
//! (§4.5): mean/√covariance propagation, sigma points, and the
//! mean/√covariance packing into a flat belief vector.

pub mod belief_model;
pub mod linalg;
pub mod planar_arm_belief;

pub use belief_model::BeliefRobotModel;
pub use planar_arm_belief::PlanarArmBelief;

//! The kinematics boundary the optimization core consumes (§6).
//!
//! Costs and constraints never touch a concrete robot representation —
//! they go through [`RobotModel`] and [`CollisionChecker`] only, so the
//! same cost/constraint code runs against any backend that implements
//! these two traits.

use faer::Mat;

use crate::error::KinematicsError;
use crate::quat::{quat_inv, quat_log, quat_mult, Quat, QUAT_IDENTITY};

/// Joint-space kinematics for one articulated robot.
///
/// Implementations are expected to be cheap to clone or to expose interior
/// mutability for `set_dof_values`/`get_dof_values` — the SQP driver calls
/// these many times per outer iteration while linearizing.
pub trait RobotModel {
    /// Number of controllable joints.
    fn n_dof(&self) -> usize;

    /// `(lower, upper)` joint limits, length `n_dof()` each.
    fn dof_limits(&self) -> (Vec<f64>, Vec<f64>);

    /// Sets the current joint configuration used by subsequent queries.
    fn set_dof_values(&mut self, values: &[f64]) -> Result<(), KinematicsError>;

    /// The joint configuration set by the last `set_dof_values` call.
    fn get_dof_values(&self) -> Vec<f64>;

    /// Names of links this model's costs/constraints may reference.
    fn affected_links(&self) -> &[String];

    /// World-frame position of `link`'s reference point, evaluated at
    /// `dof_values` (not necessarily the model's currently-set state —
    /// linearization probes many configurations without mutating it).
    fn link_position(&self, link: &str, dof_values: &[f64]) -> Result<[f64; 3], KinematicsError>;

    /// `3 x n_dof` Jacobian of `point` (specified in `link`'s local frame,
    /// or world frame if the implementation has no local frames) with
    /// respect to joint angles, evaluated at `dof_values`.
    fn position_jacobian(
        &self,
        link: &str,
        point: [f64; 3],
        dof_values: &[f64],
    ) -> Result<Mat<f64>, KinematicsError>;

    /// World-frame orientation of `link`, as a unit quaternion, evaluated
    /// at `dof_values`. Robots with no meaningful orientation (or that
    /// don't participate in pose costs/constraints) can leave this at its
    /// default of the identity rotation.
    fn link_orientation(&self, link: &str, dof_values: &[f64]) -> Result<Quat, KinematicsError> {
        let _ = (link, dof_values);
        Ok(QUAT_IDENTITY)
    }

    /// `3 x n_dof` Jacobian of the orientation-error rotation vector
    /// (`quat_log` of the relative rotation from `dof_values`) with
    /// respect to joint angles, evaluated at `dof_values`.
    ///
    /// The default differentiates [`RobotModel::link_orientation`]
    /// numerically, which is correct for any robot but wasteful for ones
    /// with a closed-form orientation Jacobian (e.g. a planar arm, where
    /// every joint contributes `1` to the single rotation axis) —
    /// implementations are expected to override this when they have one.
    fn orientation_jacobian(&self, link: &str, dof_values: &[f64]) -> Result<Mat<f64>, KinematicsError> {
        let base_inv = quat_inv(self.link_orientation(link, dof_values)?);
        let f = |dv: &[f64]| -> Vec<f64> {
            self.link_orientation(link, dv)
                .map(|q| quat_log(quat_mult(q, base_inv)).to_vec())
                .unwrap_or_else(|_| vec![f64::NAN; 3])
        };
        Ok(trajopt_core::calc_num_jac_default(f, dof_values))
    }
}

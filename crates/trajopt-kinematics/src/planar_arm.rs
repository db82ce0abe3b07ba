//! A reference three-link planar arm, used by the test suite and the
//! example problem configs in place of an external kinematics backend.
//!
//! Link lengths and the end-effector Jacobian formula are taken directly
//! from the original `EndEffectorJacobian` implementation.

use faer::Mat;

use crate::error::KinematicsError;
use crate::quat::{axis_angle_to_quat, Quat};
use crate::robot_model::RobotModel;

const L1: f64 = 0.16;
const L2: f64 = 0.16;
const L3: f64 = 0.08;

/// Three revolute joints in series, all rotating about the same axis
/// (planar). `dof_values` is `[theta0, theta1, theta2]` and the only
/// link this model exposes is `"finger"`, the end effector.
#[derive(Debug, Clone)]
pub struct PlanarArm {
    dof_values: [f64; 3],
    links: Vec<String>,
}

impl Default for PlanarArm {
    fn default() -> Self {
        Self {
            dof_values: [0.0, 0.0, 0.0],
            links: vec!["finger".to_string()],
        }
    }
}

impl PlanarArm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward kinematics: end-effector `(x, y)` for a given joint vector.
    pub fn end_effector_xy(theta: &[f64; 3]) -> (f64, f64) {
        let a1 = theta[0];
        let a2 = theta[0] + theta[1];
        let a3 = theta[0] + theta[1] + theta[2];
        let x = L1 * a1.cos() + L2 * a2.cos() + L3 * a3.cos();
        let y = L1 * a1.sin() + L2 * a2.sin() + L3 * a3.sin();
        (x, y)
    }

    /// The `3 x 3` end-effector Jacobian (`d(x,y,0)/d(theta0,theta1,theta2)`),
    /// matching the original's explicit sine/cosine expansion term for term.
    pub fn end_effector_jacobian(theta: &[f64; 3]) -> Mat<f64> {
        let s1 = -L1 * theta[0].sin();
        let s2 = -L2 * (theta[0] + theta[1]).sin();
        let s3 = -L3 * (theta[0] + theta[1] + theta[2]).sin();
        let c1 = L1 * theta[0].cos();
        let c2 = L2 * (theta[0] + theta[1]).cos();
        let c3 = L3 * (theta[0] + theta[1] + theta[2]).cos();

        let mut jac = Mat::zeros(3, 3);
        jac.write(0, 0, s1 + s2 + s3);
        jac.write(0, 1, s2 + s3);
        jac.write(0, 2, s3);
        jac.write(1, 0, c1 + c2 + c3);
        jac.write(1, 1, c2 + c3);
        jac.write(1, 2, c3);
        jac
    }

    fn check_len(values: &[f64]) -> Result<(), KinematicsError> {
        if values.len() != 3 {
            return Err(KinematicsError::WrongDofCount {
                expected: 3,
                got: values.len(),
            });
        }
        Ok(())
    }
}

impl RobotModel for PlanarArm {
    fn n_dof(&self) -> usize {
        3
    }

    fn dof_limits(&self) -> (Vec<f64>, Vec<f64>) {
        let lo = vec![-std::f64::consts::PI; 3];
        let hi = vec![std::f64::consts::PI; 3];
        (lo, hi)
    }

    fn set_dof_values(&mut self, values: &[f64]) -> Result<(), KinematicsError> {
        Self::check_len(values)?;
        self.dof_values.copy_from_slice(values);
        Ok(())
    }

    fn get_dof_values(&self) -> Vec<f64> {
        self.dof_values.to_vec()
    }

    fn affected_links(&self) -> &[String] {
        &self.links
    }

    fn link_position(&self, link: &str, dof_values: &[f64]) -> Result<[f64; 3], KinematicsError> {
        if link != "finger" {
            return Err(KinematicsError::UnknownLink(link.to_string()));
        }
        Self::check_len(dof_values)?;
        let theta = [dof_values[0], dof_values[1], dof_values[2]];
        let (x, y) = Self::end_effector_xy(&theta);
        Ok([x, y, 0.0])
    }

    fn position_jacobian(
        &self,
        link: &str,
        _point: [f64; 3],
        dof_values: &[f64],
    ) -> Result<Mat<f64>, KinematicsError> {
        if link != "finger" {
            return Err(KinematicsError::UnknownLink(link.to_string()));
        }
        Self::check_len(dof_values)?;
        let theta = [dof_values[0], dof_values[1], dof_values[2]];
        Ok(Self::end_effector_jacobian(&theta))
    }

    fn link_orientation(&self, link: &str, dof_values: &[f64]) -> Result<Quat, KinematicsError> {
        if link != "finger" {
            return Err(KinematicsError::UnknownLink(link.to_string()));
        }
        Self::check_len(dof_values)?;
        let total = dof_values[0] + dof_values[1] + dof_values[2];
        Ok(axis_angle_to_quat([0.0, 0.0, 1.0], total))
    }

    fn orientation_jacobian(&self, link: &str, dof_values: &[f64]) -> Result<Mat<f64>, KinematicsError> {
        if link != "finger" {
            return Err(KinematicsError::UnknownLink(link.to_string()));
        }
        Self::check_len(dof_values)?;
        // Every joint rotates the whole chain about the same (z) axis, so
        // the total rotation angle is the sum of the joint angles and the
        // orientation-error Jacobian is constant: one full row of `1`s on
        // the z-axis component, zero elsewhere.
        let mut jac = Mat::zeros(3, 3);
        for c in 0..3 {
            jac.write(2, c, 1.0);
        }
        Ok(jac)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn straight_arm_reaches_full_extension() {
        let (x, y) = PlanarArm::end_effector_xy(&[0.0, 0.0, 0.0]);
        assert_relative_eq!(x, L1 + L2 + L3, epsilon = 1e-12);
        assert_relative_eq!(y, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn jacobian_matches_finite_difference() {
        let theta = [0.3, -0.5, 0.8];
        let jac = PlanarArm::end_effector_jacobian(&theta);
        let eps = 1e-6;
        for i in 0..3 {
            let mut plus = theta;
            let mut minus = theta;
            plus[i] += eps;
            minus[i] -= eps;
            let (xp, yp) = PlanarArm::end_effector_xy(&plus);
            let (xm, ym) = PlanarArm::end_effector_xy(&minus);
            assert_relative_eq!(jac.read(0, i), (xp - xm) / (2.0 * eps), epsilon = 1e-5);
            assert_relative_eq!(jac.read(1, i), (yp - ym) / (2.0 * eps), epsilon = 1e-5);
        }
    }

    #[test]
    fn unknown_link_is_rejected() {
        let arm = PlanarArm::new();
        assert!(arm.link_position("elbow", &[0.0, 0.0, 0.0]).is_err());
    }

    #[test]
    fn orientation_jacobian_matches_numerical_default() {
        let arm = PlanarArm::new();
        let theta = [0.2, -0.1, 0.4];
        let analytic = arm.orientation_jacobian("finger", &theta).unwrap();

        let base_inv = crate::quat::quat_inv(arm.link_orientation("finger", &theta).unwrap());
        let f = |dv: &[f64]| -> Vec<f64> {
            let q = arm.link_orientation("finger", dv).unwrap();
            crate::quat::quat_log(crate::quat::quat_mult(q, base_inv)).to_vec()
        };
        let numeric = trajopt_core::calc_num_jac_default(f, &theta);

        for r in 0..3 {
            for c in 0..3 {
                assert_relative_eq!(analytic.read(r, c), numeric.read(r, c), epsilon = 1e-4);
            }
        }
    }
}

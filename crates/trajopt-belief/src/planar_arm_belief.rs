//! Belief-space wrapper around [`PlanarArm`], matching the original
//! three-joint arm's noise model exactly (`GetDynNoise`/`GetObsNoise`/
//! `Observe`'s sigmoid-shaped state-dependent scaling).

use faer::Mat;
use trajopt_kinematics::{KinematicsError, PlanarArm, RobotModel};

use crate::belief_model::BeliefRobotModel;

/// Diagonal process-noise standard deviations, one per joint.
const DYN_NOISE_DIAG: [f64; 3] = [0.08, 0.13, 0.18];
/// Diagonal observation-noise standard deviation, shared across the three
/// observed coordinates.
const OBS_NOISE_DIAG: f64 = 0.09;

#[derive(Debug, Clone, Default)]
pub struct PlanarArmBelief {
    arm: PlanarArm,
}

impl PlanarArmBelief {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RobotModel for PlanarArmBelief {
    fn n_dof(&self) -> usize {
        self.arm.n_dof()
    }

    fn dof_limits(&self) -> (Vec<f64>, Vec<f64>) {
        self.arm.dof_limits()
    }

    fn set_dof_values(&mut self, values: &[f64]) -> Result<(), KinematicsError> {
        self.arm.set_dof_values(values)
    }

    fn get_dof_values(&self) -> Vec<f64> {
        self.arm.get_dof_values()
    }

    fn affected_links(&self) -> &[String] {
        self.arm.affected_links()
    }

    fn link_position(&self, link: &str, dof_values: &[f64]) -> Result<[f64; 3], KinematicsError> {
        self.arm.link_position(link, dof_values)
    }

    fn position_jacobian(&self, link: &str, point: [f64; 3], dof_values: &[f64]) -> Result<Mat<f64>, KinematicsError> {
        self.arm.position_jacobian(link, point, dof_values)
    }
}

impl BeliefRobotModel for PlanarArmBelief {
    fn q_dim(&self) -> usize {
        3
    }

    fn r_dim(&self) -> usize {
        3
    }

    fn dyn_noise(&self) -> Mat<f64> {
        let mut m = Mat::zeros(3, 3);
        for i in 0..3 {
            m.write(i, i, DYN_NOISE_DIAG[i]);
        }
        m
    }

    fn obs_noise(&self) -> Mat<f64> {
        let mut m = Mat::zeros(3, 3);
        for i in 0..3 {
            m.write(i, i, OBS_NOISE_DIAG);
        }
        m
    }

    fn dynamics(&self, x: &[f64], u: &[f64], q: &[f64]) -> Vec<f64> {
        (0..3).map(|i| x[i] + u[i] + DYN_NOISE_DIAG[i] * q[i]).collect()
    }

    fn observe(&self, x: &[f64], r: &[f64]) -> Vec<f64> {
        let theta = [x[0], x[1], x[2]];
        let pos = PlanarArm::end_effector_xy(&theta);
        let scale = self.observation_noise_scale(x);
        vec![
            pos.0 + scale * OBS_NOISE_DIAG * r[0],
            pos.1 + scale * OBS_NOISE_DIAG * r[1],
            scale * OBS_NOISE_DIAG * r[2],
        ]
    }

    fn observation_noise_scale(&self, x: &[f64]) -> f64 {
        let theta = [x[0], x[1], x[2]];
        let (_, y) = PlanarArm::end_effector_xy(&theta);
        0.5 * (y + 0.2).powi(2) + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn rt_sigma(diag: [f64; 3]) -> Mat<f64> {
        let mut m = Mat::zeros(3, 3);
        for i in 0..3 {
            m.write(i, i, diag[i]);
        }
        m
    }

    #[test]
    fn compose_decompose_round_trips() {
        let model = PlanarArmBelief::new();
        let x = vec![0.1, 0.2, 0.3];
        let rt_s = rt_sigma([0.5, 0.6, 0.7]);
        let theta = model.compose_belief(&x, &rt_s);
        assert_eq!(theta.len(), model.n_theta());
        let (x2, rt_s2) = model.decompose_belief(&theta);
        assert_eq!(x, x2);
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(rt_s.read(i, j), rt_s2.read(i, j), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn ekf_update_produces_psd_covariance() {
        let model = PlanarArmBelief::new();
        let x0 = vec![0.1, -0.2, 0.3];
        let u0 = vec![0.05, 0.0, -0.02];
        let rt_sigma0 = rt_sigma([0.1, 0.1, 0.1]);
        let (_, rt_sigma1) = model.ekf_update(&u0, &x0, &rt_sigma0).unwrap();
        for i in 0..3 {
            assert!(rt_sigma1.read(i, i) >= 0.0);
        }
    }

    #[test]
    fn sigma_points_center_column_is_the_mean() {
        let model = PlanarArmBelief::new();
        let x = vec![0.1, 0.2, 0.3];
        let rt_s = rt_sigma([0.2, 0.2, 0.2]);
        let theta = model.compose_belief(&x, &rt_s);
        let pts = model.sigma_points(&theta);
        assert_eq!(pts.ncols(), 7);
        for i in 0..3 {
            assert_relative_eq!(pts.read(i, 0), x[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn belief_dynamics_moves_mean_by_control() {
        let model = PlanarArmBelief::new();
        let x0 = vec![0.0, 0.0, 0.0];
        let rt_sigma0 = rt_sigma([0.05, 0.05, 0.05]);
        let theta0 = model.compose_belief(&x0, &rt_sigma0);
        let u0 = vec![0.1, 0.0, 0.0];
        let theta1 = model.belief_dynamics(&theta0, &u0).unwrap();
        let (x1, _) = model.decompose_belief(&theta1);
        assert_relative_eq!(x1[0], 0.1, epsilon = 1e-6);
    }
}

//! Initial-trajectory seeding (§4.6): stationary, given, or straight-line
//! joint trajectories, plus the belief-space forward-simulation seed.

use faer::Mat;
use trajopt_belief::BeliefRobotModel;
use trajopt_core::TrajOptResult;

use crate::config::InitInfo;

/// Builds the `n_steps x n_dof` joint trajectory named by `init_info`,
/// validating `given_traj`'s shape and (under `start_fixed`) its agreement
/// with `start` up front, so malformed seeds surface as a config error
/// before any solve begins (§7).
pub fn seed_joint_trajectory(init_info: &InitInfo, start: &[f64], n_steps: usize, start_fixed: bool) -> TrajOptResult<Vec<Vec<f64>>> {
    let n_dof = start.len();
    match init_info {
        InitInfo::Stationary => Ok(vec![start.to_vec(); n_steps]),
        InitInfo::GivenTraj { data } => {
            if data.len() != n_steps {
                return Err(format!("init_info.data has {} rows, expected n_steps={}", data.len(), n_steps).into());
            }
            for (t, row) in data.iter().enumerate() {
                if row.len() != n_dof {
                    return Err(format!("init_info.data row {t} has {} entries, expected n_dof={}", row.len(), n_dof).into());
                }
            }
            if start_fixed {
                let mismatch = data[0].iter().zip(start.iter()).any(|(a, b)| (a - b).abs() > 1e-4);
                if mismatch {
                    return Err("init_info.data row 0 disagrees with current DOF values under start_fixed".into());
                }
            }
            Ok(data.clone())
        }
        InitInfo::StraightLine { endpoint } => {
            if endpoint.len() != n_dof {
                return Err(format!("init_info.endpoint has {} entries, expected n_dof={}", endpoint.len(), n_dof).into());
            }
            Ok((0..n_steps)
                .map(|t| {
                    let frac = if n_steps <= 1 { 0.0 } else { t as f64 / (n_steps - 1) as f64 };
                    start.iter().zip(endpoint.iter()).map(|(a, b)| a + frac * (b - a)).collect()
                })
                .collect())
        }
    }
}

/// Default initial `√Σ` per §4.6: `identity * 0.1` for a 3-dof robot,
/// `identity * sqrt(5)` otherwise.
pub fn default_initial_sqrt_sigma(n_dof: usize) -> Mat<f64> {
    let scale = if n_dof == 3 { 0.1 } else { 5.0_f64.sqrt() };
    let mut m = Mat::zeros(n_dof, n_dof);
    for i in 0..n_dof {
        m.write(i, i, scale);
    }
    m
}

/// Simulates the EKF forward from a straight-line (or otherwise seeded)
/// joint trajectory to produce realistic per-timestep `√Σ` and control
/// sequences (§4.6): `u_t = joint[t+1] - joint[t]` (the mean-propagation
/// delta under `dynamics(x, u, 0) = x + u`), then `ekf_update` folds in
/// the noise model's covariance growth and the simulated observation's
/// shrinkage.
pub fn belief_seed(model: &dyn BeliefRobotModel, joint_traj: &[Vec<f64>]) -> TrajOptResult<(Vec<Mat<f64>>, Vec<Vec<f64>>)> {
    let n_steps = joint_traj.len();
    let n_dof = model.n_dof();
    let mut rt_sigmas = Vec::with_capacity(n_steps);
    let mut controls = Vec::with_capacity(n_steps.saturating_sub(1));

    let mut rt_sigma = default_initial_sqrt_sigma(n_dof);
    rt_sigmas.push(rt_sigma.clone());

    for t in 0..n_steps.saturating_sub(1) {
        let u: Vec<f64> = joint_traj[t + 1].iter().zip(joint_traj[t].iter()).map(|(a, b)| a - b).collect();
        let (_, next_rt_sigma) = model.ekf_update(&u, &joint_traj[t], &rt_sigma)?;
        rt_sigma = next_rt_sigma;
        rt_sigmas.push(rt_sigma.clone());
        controls.push(u);
    }
    // last timestep has no outgoing transition; pad with a zero control so
    // every row of the variable layout still gets an initial value.
    controls.push(vec![0.0; n_dof]);

    Ok((rt_sigmas, controls))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_belief::PlanarArmBelief;

    #[test]
    fn straight_line_interpolates_linearly() {
        let init = InitInfo::StraightLine { endpoint: vec![1.0, 0.0, 0.0] };
        let traj = seed_joint_trajectory(&init, &[0.0, 0.0, 0.0], 3, false).unwrap();
        assert_eq!(traj[0], vec![0.0, 0.0, 0.0]);
        assert_eq!(traj[1], vec![0.5, 0.0, 0.0]);
        assert_eq!(traj[2], vec![1.0, 0.0, 0.0]);
    }

    #[test]
    fn given_traj_rejects_start_mismatch_under_start_fixed() {
        let init = InitInfo::GivenTraj { data: vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]] };
        let result = seed_joint_trajectory(&init, &[0.0, 0.0, 0.0], 2, true);
        assert!(result.is_err());
    }

    #[test]
    fn belief_seed_produces_one_sigma_per_timestep() {
        let model = PlanarArmBelief::new();
        let traj = vec![vec![0.0, 0.0, 0.0], vec![0.1, 0.0, 0.0], vec![0.2, 0.0, 0.0]];
        let (sigmas, controls) = belief_seed(&model, &traj).unwrap();
        assert_eq!(sigmas.len(), 3);
        assert_eq!(controls.len(), 3);
        assert_eq!(controls[0], vec![0.1, 0.0, 0.0]);
    }
}

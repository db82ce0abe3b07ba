//! Belief-space extension of [`RobotModel`]: EKF propagation, the
//! mean/√covariance packing, and sigma-point expansion (§4.5).
//!
//! A belief `theta` packs the state mean `x` (length `n_dof`) followed by
//! the column-major lower-triangle entries of `sqrt(Sigma)` (length
//! `n_dof*(n_dof+1)/2`), so `n_theta = n_dof + n_dof*(n_dof+1)/2`.

use faer::Mat;
use trajopt_core::{calc_num_jac_default, TrajOptResult};
use trajopt_kinematics::RobotModel;

use crate::linalg::{cholesky_lower, mat_mul, mat_sub, mat_transpose, solve};

/// Extends [`RobotModel`] with EKF belief dynamics, observation, and the
/// sigma-point expansion used to linearize belief-dependent costs and
/// collision constraints.
///
/// `dynamics`/`observe` are the only problem-specific pieces; everything
/// else (`ekf_update`, `belief_dynamics`, `sigma_points`,
/// `belief_jacobian`) is a default method built on top of them using
/// [`trajopt_core::calc_num_jac`], the same "differentiate everything
/// numerically" approach the rest of the workspace uses.
pub trait BeliefRobotModel: RobotModel {
    /// `n_dof + n_dof*(n_dof+1)/2`.
    fn n_theta(&self) -> usize {
        let n = self.n_dof();
        n + n * (n + 1) / 2
    }

    /// Dimension of the process-noise vector `q` consumed by `dynamics`.
    fn q_dim(&self) -> usize;

    /// Dimension of the observation-noise vector `r` consumed by
    /// `observe`.
    fn r_dim(&self) -> usize;

    /// Process noise covariance (diagonal in practice, but returned dense
    /// for uniformity with `obs_noise`).
    fn dyn_noise(&self) -> Mat<f64>;

    /// Baseline observation noise covariance, before the state-dependent
    /// scaling applied by [`BeliefRobotModel::end_effector_noise_as_gaussian`].
    fn obs_noise(&self) -> Mat<f64>;

    /// `x' = dynamics(x, u, q)`, linear in the common case
    /// (`x + u + dyn_noise * q`) but treated as an opaque nonlinear map.
    fn dynamics(&self, x: &[f64], u: &[f64], q: &[f64]) -> Vec<f64>;

    /// `z = observe(x, r)`, the (possibly state-dependent-noise)
    /// observation model.
    fn observe(&self, x: &[f64], r: &[f64]) -> Vec<f64>;

    /// State-dependent scale factor applied to `obs_noise` inside
    /// `observe`, exposed separately so [`end_effector_noise_as_gaussian`]
    /// can report the effective noise without re-deriving it from
    /// `observe`'s finite-difference Jacobian.
    ///
    /// [`end_effector_noise_as_gaussian`]: BeliefRobotModel::end_effector_noise_as_gaussian
    fn observation_noise_scale(&self, x: &[f64]) -> f64;

    /// The effective observation noise covariance at `x`
    /// (`observation_noise_scale(x) * obs_noise()`), useful for plotting
    /// and diagnostics even though this crate has no belief-space costs
    /// depending on it directly.
    fn end_effector_noise_as_gaussian(&self, x: &[f64]) -> Mat<f64> {
        let scale = self.observation_noise_scale(x);
        let base = self.obs_noise();
        let mut out = Mat::zeros(base.nrows(), base.ncols());
        for i in 0..base.nrows() {
            for j in 0..base.ncols() {
                out.write(i, j, scale * base.read(i, j));
            }
        }
        out
    }

    /// Unscented-transform sigma-point weight, `kappa`. Default is
    /// `sqrt(n_dof)`, a common choice when no prior favors one direction.
    fn kappa(&self) -> f64 {
        (self.n_dof() as f64).sqrt()
    }

    /// Packs `x` and the lower triangle of `rt_s` (column-major) into a
    /// belief vector (`composeBelief`).
    fn compose_belief(&self, x: &[f64], rt_s: &Mat<f64>) -> Vec<f64> {
        let n = self.n_dof();
        let mut theta = vec![0.0; self.n_theta()];
        theta[..n].copy_from_slice(x);
        let mut idx = n;
        for j in 0..n {
            for i in j..n {
                theta[idx] = rt_s.read(i, j);
                idx += 1;
            }
        }
        theta
    }

    /// Inverse of [`BeliefRobotModel::compose_belief`]: unpacks a belief
    /// vector into the mean and the lower-triangular √covariance
    /// (`decomposeBelief`).
    fn decompose_belief(&self, theta: &[f64]) -> (Vec<f64>, Mat<f64>) {
        let n = self.n_dof();
        let x = theta[..n].to_vec();
        let mut rt_s = Mat::zeros(n, n);
        let mut idx = n;
        for j in 0..n {
            for i in j..n {
                rt_s.write(i, j, theta[idx]);
                idx += 1;
            }
        }
        (x, rt_s)
    }

    /// One EKF predict+update step (§4.5 steps 1-8): propagates the mean
    /// through `dynamics`, linearizes both `dynamics` and `observe` by
    /// finite differences, and folds the (simulated, zero-valued)
    /// observation back in to produce the posterior √covariance.
    fn ekf_update(&self, u0: &[f64], x0: &[f64], rt_sigma0: &Mat<f64>) -> TrajOptResult<(Vec<f64>, Mat<f64>)> {
        let q = vec![0.0; self.q_dim()];
        let x = self.dynamics(x0, u0, &q);

        let sigma0 = mat_mul(rt_sigma0, &mat_transpose(rt_sigma0));

        let a = calc_num_jac_default(|xx| self.dynamics(xx, u0, &q), x0);
        let gamma0 = mat_mul(&mat_mul(&a, &sigma0), &mat_transpose(&a));

        let r = vec![0.0; self.r_dim()];
        let c = calc_num_jac_default(|xx| self.observe(xx, &r), x0);
        let r_jac = calc_num_jac_default(|rr| self.observe(x0, rr), &r);

        let c_gamma0 = mat_mul(&c, &gamma0);
        let a_k = crate::linalg::mat_add(&mat_mul(&c_gamma0, &mat_transpose(&c)), &mat_mul(&r_jac, &mat_transpose(&r_jac)));
        let l = solve(&a_k, &c_gamma0)?;
        let sigma = mat_sub(&gamma0, &mat_mul(&gamma0, &mat_mul(&mat_transpose(&c), &l)));

        let rt_sigma = cholesky_lower(&sigma)?;
        Ok((x, rt_sigma))
    }

    /// `BeliefDynamics`: one EKF step expressed entirely in packed-belief
    /// coordinates (`decompose -> ekf_update -> compose`).
    fn belief_dynamics(&self, theta0: &[f64], u0: &[f64]) -> TrajOptResult<Vec<f64>> {
        let (x0, rt_sigma0) = self.decompose_belief(theta0);
        let (x, rt_sigma) = self.ekf_update(u0, &x0, &rt_sigma0)?;
        Ok(self.compose_belief(&x, &rt_sigma))
    }

    /// The `2*n_dof + 1` sigma points of the belief `theta`: the mean,
    /// followed by `mean + kappa * column_i(sqrt(Sigma))` and
    /// `mean - kappa * column_i(sqrt(Sigma))` for each `i`. Returned as an
    /// `n_dof x (2*n_dof+1)` matrix, one column per sigma point.
    fn sigma_points(&self, theta: &[f64]) -> Mat<f64> {
        let n = self.n_dof();
        let (x0, rt_sigma0) = self.decompose_belief(theta);
        let kappa = self.kappa();
        let mut out = Mat::zeros(n, 2 * n + 1);
        for i in 0..n {
            out.write(i, 0, x0[i]);
        }
        for col in 0..n {
            for row in 0..n {
                let delta = kappa * rt_sigma0.read(row, col);
                out.write(row, 1 + col, x0[row] + delta);
                out.write(row, 1 + n + col, x0[row] - delta);
            }
        }
        out
    }

    /// `3 x n_theta` sensitivity of `link`'s position at `point`, evaluated
    /// at sigma point `instance_ind`, with respect to the belief vector
    /// `theta`. Obtained by differencing through [`sigma_points`] and
    /// [`trajopt_kinematics::RobotModel::link_position`] together, since
    /// the sigma points are themselves a function of `theta`.
    ///
    /// [`sigma_points`]: BeliefRobotModel::sigma_points
    fn belief_jacobian(
        &self,
        link: &str,
        instance_ind: usize,
        point: [f64; 3],
        theta: &[f64],
    ) -> TrajOptResult<Mat<f64>> {
        let _ = point;
        let f = |th: &[f64]| -> Vec<f64> {
            let sigma_pts = self.sigma_points(th);
            let dof: Vec<f64> = (0..self.n_dof()).map(|row| sigma_pts.read(row, instance_ind)).collect();
            self.link_position(link, &dof)
                .map(|p| p.to_vec())
                .unwrap_or_else(|_| vec![f64::NAN; 3])
        };
        Ok(calc_num_jac_default(f, theta))
    }
}

//! `BeliefDynamicsConstraint` (§4.5): ties consecutive belief waypoints
//! together, `theta_t+1 - belief_dynamics(theta_t, u_t) = 0`.

use trajopt_belief::BeliefRobotModel;
use trajopt_core::{calc_num_jac_default, AffExpr, Variable};

use crate::ConstraintType;

fn dof_values_at(x: &[f64], vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|v| x[v.index()]).collect()
}

fn belief_step(model: &dyn BeliefRobotModel, theta: &[f64], u: &[f64]) -> Vec<f64> {
    model.belief_dynamics(theta, u).unwrap_or_else(|_| vec![f64::NAN; theta.len()])
}

/// Numerically differentiates the whole `(theta_t, u_t) -> belief_dynamics`
/// map as one black box, rather than composing closed-form Jacobians
/// through each EKF sub-step — the chosen default, since the EKF update
/// itself already differentiates `dynamics`/`observe` numerically, so
/// nothing is gained by hand-deriving the chain rule through it.
pub struct BeliefDynamicsConstraint<'a> {
    name: String,
    model: &'a dyn BeliefRobotModel,
    theta_vars: Vec<Variable>,
    u_vars: Vec<Variable>,
    next_theta_vars: Vec<Variable>,
}

impl<'a> BeliefDynamicsConstraint<'a> {
    pub fn new(name: impl Into<String>, model: &'a dyn BeliefRobotModel, theta_vars: Vec<Variable>, u_vars: Vec<Variable>, next_theta_vars: Vec<Variable>) -> Self {
        assert_eq!(theta_vars.len(), next_theta_vars.len(), "BeliefDynamicsConstraint: theta/next_theta length mismatch");
        Self { name: name.into(), model, theta_vars, u_vars, next_theta_vars }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Eq
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        let theta = dof_values_at(x, &self.theta_vars);
        let u = dof_values_at(x, &self.u_vars);
        let next_theta = dof_values_at(x, &self.next_theta_vars);
        let predicted = belief_step(self.model, &theta, &u);
        next_theta.iter().zip(predicted.iter()).map(|(n, p)| n - p).collect()
    }

    /// Linearizes `belief_dynamics` by finite-differencing the concatenated
    /// input `[theta_t | u_t]`, splits the resulting Jacobian back into its
    /// `theta` and `u` blocks, and adds the (already affine) `theta_t+1`
    /// term directly.
    pub fn convex(&self, x: &[f64]) -> Vec<AffExpr> {
        let theta0 = dof_values_at(x, &self.theta_vars);
        let u0 = dof_values_at(x, &self.u_vars);
        let next_theta0 = dof_values_at(x, &self.next_theta_vars);
        let n_theta = theta0.len();
        let n_u = u0.len();

        let mut input0 = theta0.clone();
        input0.extend_from_slice(&u0);
        let f = |v: &[f64]| belief_step(self.model, &v[..n_theta], &v[n_theta..]);
        let jac = calc_num_jac_default(f, &input0);
        let f0 = belief_step(self.model, &theta0, &u0);

        let mut rows = Vec::with_capacity(n_theta);
        for row in 0..n_theta {
            let mut aff = AffExpr::term(1.0, self.next_theta_vars[row].clone());
            let mut grad_dot_x0 = 0.0;
            for col in 0..n_theta {
                let g = -jac.read(row, col);
                aff.inc(&AffExpr::term(g, self.theta_vars[col].clone()));
                grad_dot_x0 += g * theta0[col];
            }
            for col in 0..n_u {
                let g = -jac.read(row, n_theta + col);
                aff.inc(&AffExpr::term(g, self.u_vars[col].clone()));
                grad_dot_x0 += g * u0[col];
            }
            aff.inc_const(-(f0[row] - grad_dot_x0));
            let _ = &next_theta0;
            rows.push(aff);
        }
        rows
    }
}

/// Differentiates only the mean-propagation term `dynamics(x, u, 0)`
/// analytically (via finite differences of `dynamics` alone, not the full
/// EKF covariance update), ignoring sensitivity of the posterior
/// covariance to `(theta_t, u_t)`. Kept for differential testing against
/// [`BeliefDynamicsConstraint`] on problems where the covariance Jacobian
/// is small; never selected by problem construction.
pub struct BeliefDynamicsConstraintAnalytic<'a> {
    name: String,
    model: &'a dyn BeliefRobotModel,
    theta_vars: Vec<Variable>,
    u_vars: Vec<Variable>,
    next_theta_vars: Vec<Variable>,
}

impl<'a> BeliefDynamicsConstraintAnalytic<'a> {
    pub fn new(name: impl Into<String>, model: &'a dyn BeliefRobotModel, theta_vars: Vec<Variable>, u_vars: Vec<Variable>, next_theta_vars: Vec<Variable>) -> Self {
        Self { name: name.into(), model, theta_vars, u_vars, next_theta_vars }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Eq
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        let theta = dof_values_at(x, &self.theta_vars);
        let u = dof_values_at(x, &self.u_vars);
        let next_theta = dof_values_at(x, &self.next_theta_vars);
        let predicted = belief_step(self.model, &theta, &u);
        next_theta.iter().zip(predicted.iter()).map(|(n, p)| n - p).collect()
    }

    pub fn convex(&self, x: &[f64]) -> Vec<AffExpr> {
        let theta0 = dof_values_at(x, &self.theta_vars);
        let u0 = dof_values_at(x, &self.u_vars);
        let n_dof = self.model.n_dof();
        let n_theta = theta0.len();

        let q = vec![0.0; self.model.q_dim()];
        let mean_jac_x = calc_num_jac_default(|xx| self.model.dynamics(xx, &u0, &q), &theta0[..n_dof]);
        let mean_jac_u = calc_num_jac_default(|uu| self.model.dynamics(&theta0[..n_dof], uu, &q), &u0);
        let f0 = belief_step(self.model, &theta0, &u0);

        let mut rows = Vec::with_capacity(n_theta);
        for row in 0..n_theta {
            let mut aff = AffExpr::term(1.0, self.next_theta_vars[row].clone());
            if row < n_dof {
                let mut grad_dot_x0 = 0.0;
                for col in 0..n_dof {
                    let g = -mean_jac_x.read(row, col);
                    aff.inc(&AffExpr::term(g, self.theta_vars[col].clone()));
                    grad_dot_x0 += g * theta0[col];
                }
                for col in 0..u0.len() {
                    let g = -mean_jac_u.read(row, col);
                    aff.inc(&AffExpr::term(g, self.u_vars[col].clone()));
                    grad_dot_x0 += g * u0[col];
                }
                aff.inc_const(-(f0[row] - grad_dot_x0));
            } else {
                // covariance block: held fixed at its forward-simulated value
                // rather than linearized, per this variant's approximation.
                aff.inc_const(-f0[row]);
            }
            rows.push(aff);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_belief::PlanarArmBelief;

    fn vars(prefix: &str, n: usize, offset: usize) -> Vec<Variable> {
        (0..n).map(|i| Variable::new(offset + i, format!("{prefix}_{i}"))).collect()
    }

    #[test]
    fn zero_residual_when_next_theta_equals_predicted() {
        let model = PlanarArmBelief::new();
        let n_theta = model.n_theta();
        let theta = vec![0.1; n_theta];
        let u = vec![0.01, -0.02, 0.03];
        let predicted = model.belief_dynamics(&theta, &u).unwrap();

        let theta_vars = vars("th0", n_theta, 0);
        let u_vars = vars("u", 3, n_theta);
        let next_vars = vars("th1", n_theta, n_theta + 3);

        let cnt = BeliefDynamicsConstraint::new("dyn", &model, theta_vars, u_vars, next_vars);
        let mut x = theta.clone();
        x.extend_from_slice(&u);
        x.extend_from_slice(&predicted);

        for v in cnt.value(&x) {
            assert!(v.abs() < 1e-9);
        }
    }

    #[test]
    fn linearization_matches_true_residual_at_expansion_point() {
        let model = PlanarArmBelief::new();
        let n_theta = model.n_theta();
        let theta = vec![0.05, -0.1, 0.2].into_iter().chain(std::iter::repeat(0.1).take(n_theta - 3)).collect::<Vec<_>>();
        let u = vec![0.0, 0.0, 0.0];

        let theta_vars = vars("th0", n_theta, 0);
        let u_vars = vars("u", 3, n_theta);
        let next_vars = vars("th1", n_theta, n_theta + 3);

        let cnt = BeliefDynamicsConstraint::new("dyn", &model, theta_vars, u_vars, next_vars);
        let mut x = theta.clone();
        x.extend_from_slice(&u);
        x.extend_from_slice(&theta);

        let rows = cnt.convex(&x);
        let true_val = cnt.value(&x);
        for (row, v) in rows.iter().zip(true_val.iter()) {
            assert!((row.value(&x) - v).abs() < 1e-6);
        }
    }
}

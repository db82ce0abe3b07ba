//! `CartVelConstraint` (§4.3): caps end-effector speed between consecutive
//! timesteps, `||p(theta_t+1) - p(theta_t)|| <= d_max`, linearized by
//! expanding around both endpoints' position Jacobians.

use trajopt_core::{AffExpr, Variable};
use trajopt_kinematics::RobotModel;

use crate::ConstraintType;

fn dof_values_at(x: &[f64], vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|v| x[v.index()]).collect()
}

/// `||p(theta_t+1) - p(theta_t)|| - d_max <= 0`, one row per consecutive
/// timestep pair.
pub struct CartVelConstraint<'a> {
    name: String,
    model: &'a dyn RobotModel,
    link: String,
    /// `(vars_t, vars_t+1)` per consecutive timestep pair.
    pairs: Vec<(Vec<Variable>, Vec<Variable>)>,
    d_max: f64,
}

impl<'a> CartVelConstraint<'a> {
    pub fn new(name: impl Into<String>, model: &'a dyn RobotModel, link: impl Into<String>, pairs: Vec<(Vec<Variable>, Vec<Variable>)>, d_max: f64) -> Self {
        Self { name: name.into(), model, link: link.into(), pairs, d_max }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Ineq
    }

    fn displacement(&self, i: usize, x: &[f64]) -> ([f64; 3], f64) {
        let (v0, v1) = &self.pairs[i];
        let theta0 = dof_values_at(x, v0);
        let theta1 = dof_values_at(x, v1);
        let p0 = self.model.link_position(&self.link, &theta0).unwrap_or([f64::NAN; 3]);
        let p1 = self.model.link_position(&self.link, &theta1).unwrap_or([f64::NAN; 3]);
        let d = [p1[0] - p0[0], p1[1] - p0[1], p1[2] - p0[2]];
        let norm = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        (d, norm)
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        (0..self.pairs.len()).map(|i| self.displacement(i, x).1 - self.d_max).collect()
    }

    /// `||d||` linearized via `grad ||d|| = d/||d||` applied to each
    /// endpoint's position Jacobian; degenerate (zero-displacement) pairs
    /// linearize to a constant `-d_max`, imposing no local gradient.
    pub fn convex(&self, x: &[f64]) -> Vec<AffExpr> {
        let mut rows = Vec::with_capacity(self.pairs.len());
        for i in 0..self.pairs.len() {
            let (v0, v1) = &self.pairs[i];
            let theta0 = dof_values_at(x, v0);
            let theta1 = dof_values_at(x, v1);
            let (d, norm) = self.displacement(i, x);

            if norm < 1e-12 {
                rows.push(AffExpr::constant(-self.d_max));
                continue;
            }
            let unit = [d[0] / norm, d[1] / norm, d[2] / norm];
            let jac0 = self.model.position_jacobian(&self.link, [0.0, 0.0, 0.0], &theta0).unwrap();
            let jac1 = self.model.position_jacobian(&self.link, [0.0, 0.0, 0.0], &theta1).unwrap();

            let mut aff = AffExpr::constant(-self.d_max);
            let grad_dot_theta0: f64 = (0..v0.len())
                .map(|c| {
                    let g = -(0..3).map(|r| unit[r] * jac0.read(r, c)).sum::<f64>();
                    g * theta0[c]
                })
                .sum();
            let grad_dot_theta1: f64 = (0..v1.len())
                .map(|c| {
                    let g = (0..3).map(|r| unit[r] * jac1.read(r, c)).sum::<f64>();
                    g * theta1[c]
                })
                .sum();
            aff.inc_const(norm - grad_dot_theta0 - grad_dot_theta1);

            for c in 0..v0.len() {
                let g = -(0..3).map(|r| unit[r] * jac0.read(r, c)).sum::<f64>();
                aff.inc(&AffExpr::term(g, v0[c].clone()));
            }
            for c in 0..v1.len() {
                let g = (0..3).map(|r| unit[r] * jac1.read(r, c)).sum::<f64>();
                aff.inc(&AffExpr::term(g, v1[c].clone()));
            }
            rows.push(aff);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_kinematics::PlanarArm;

    fn vars(offset: usize) -> Vec<Variable> {
        (0..3).map(|i| Variable::new(offset + i, format!("j_{}_{}", offset / 3, i))).collect()
    }

    #[test]
    fn linearization_matches_true_value_at_the_expansion_point() {
        let arm = PlanarArm::new();
        let pairs = vec![(vars(0), vars(3))];
        let cnt = CartVelConstraint::new("vel", &arm, "finger", pairs, 0.05);
        let x = [0.1, 0.2, 0.0, 0.15, 0.18, 0.02];

        let rows = cnt.convex(&x);
        let true_val = cnt.value(&x);
        for (row, v) in rows.iter().zip(true_val.iter()) {
            assert!((row.value(&x) - v).abs() < 1e-9);
        }
    }

    #[test]
    fn zero_displacement_has_no_violation_for_small_d_max() {
        let arm = PlanarArm::new();
        let pairs = vec![(vars(0), vars(3))];
        let cnt = CartVelConstraint::new("vel", &arm, "finger", pairs, 1.0);
        let x = [0.1, 0.2, 0.0, 0.1, 0.2, 0.0];
        assert!(cnt.value(&x)[0] < 0.0);
    }
}

//! `CartPoseCost` / `CartPoseConstraint` (§4.3): end-effector pose error
//! against a target, `pose_err = [rot_log(R^T . R_t) ; p_t - p]`.

use faer::Mat;
use trajopt_core::{AffExpr, QuadExpr, Variable};
use trajopt_kinematics::{quat_inv, quat_log, quat_mult, Quat, RobotModel};

use crate::ConstraintType;

fn dof_values_at(x: &[f64], vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|v| x[v.index()]).collect()
}

/// The 6-vector pose error `[rot_log(R^T . R_t) ; p_t - p]`, evaluated at
/// `dof_values` (not necessarily the linearization point — `value()` calls
/// this at the current `x` directly, exactly, with no linearization).
pub fn pose_err(model: &dyn RobotModel, link: &str, target_pos: [f64; 3], target_quat: Quat, dof_values: &[f64]) -> [f64; 6] {
    let current_quat = model.link_orientation(link, dof_values).unwrap_or([f64::NAN; 4]);
    let current_pos = model.link_position(link, dof_values).unwrap_or([f64::NAN; 3]);
    let rel = quat_mult(current_quat, quat_inv(target_quat));
    let rot = quat_log(rel);
    [rot[0], rot[1], rot[2], target_pos[0] - current_pos[0], target_pos[1] - current_pos[1], target_pos[2] - current_pos[2]]
}

/// The affine linearization of [`pose_err`] around `dof_values`, one row
/// per error dimension. Translation uses the analytic position Jacobian;
/// orientation uses the robot's analytic orientation Jacobian — exact when
/// the relevant rotations commute (true of the reference `PlanarArm`), a
/// locally valid descent direction otherwise (the trust-region loop
/// tolerates model error, it does not require an exact model).
fn pose_err_rows(model: &dyn RobotModel, link: &str, target_pos: [f64; 3], target_quat: Quat, vars: &[Variable], dof_values: &[f64]) -> Vec<AffExpr> {
    let err0 = pose_err(model, link, target_pos, target_quat, dof_values);
    let rot_jac = model.orientation_jacobian(link, dof_values).unwrap_or_else(|_| Mat::zeros(3, vars.len()));
    let pos_jac = model.position_jacobian(link, [0.0, 0.0, 0.0], dof_values).unwrap_or_else(|_| Mat::zeros(3, vars.len()));

    let mut rows = Vec::with_capacity(6);
    for row in 0..3 {
        let grad: Vec<f64> = (0..vars.len()).map(|c| rot_jac.read(row, c)).collect();
        rows.push(linearize(err0[row], &grad, vars, dof_values));
    }
    for row in 0..3 {
        // p_t - p(theta): gradient wrt theta is -position_jacobian
        let grad: Vec<f64> = (0..vars.len()).map(|c| -pos_jac.read(row, c)).collect();
        rows.push(linearize(err0[row + 3], &grad, vars, dof_values));
    }
    rows
}

fn linearize(f0: f64, grad: &[f64], vars: &[Variable], dof_values: &[f64]) -> AffExpr {
    let mut aff = AffExpr::var_dot(grad, vars);
    let grad_dot_theta0: f64 = grad.iter().zip(dof_values.iter()).map(|(g, t)| g * t).sum();
    aff.inc_const(f0 - grad_dot_theta0);
    aff
}

/// `sum_i coeff_i * pose_err_i(theta)^2`, linearized each outer iteration.
pub struct CartPoseCost<'a> {
    name: String,
    model: &'a dyn RobotModel,
    link: String,
    vars: Vec<Variable>,
    target_pos: [f64; 3],
    target_quat: Quat,
    coeffs: [f64; 6],
}

impl<'a> CartPoseCost<'a> {
    pub fn new(
        name: impl Into<String>,
        model: &'a dyn RobotModel,
        link: impl Into<String>,
        vars: Vec<Variable>,
        target_pos: [f64; 3],
        target_quat: Quat,
        coeffs: [f64; 6],
    ) -> Self {
        Self { name: name.into(), model, link: link.into(), vars, target_pos, target_quat, coeffs }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, x: &[f64]) -> f64 {
        let dof_values = dof_values_at(x, &self.vars);
        let err = pose_err(self.model, &self.link, self.target_pos, self.target_quat, &dof_values);
        err.iter().zip(self.coeffs.iter()).map(|(e, c)| c * e * e).sum()
    }

    pub fn convex(&self, x: &[f64]) -> QuadExpr {
        let dof_values = dof_values_at(x, &self.vars);
        let rows = pose_err_rows(self.model, &self.link, self.target_pos, self.target_quat, &self.vars, &dof_values);
        let mut out = QuadExpr::default();
        for (row, c) in rows.iter().zip(self.coeffs.iter()) {
            out.inc(&row.squared(*c));
        }
        out
    }
}

/// The equality constraint `pose_err(theta) = 0`.
pub struct CartPoseConstraint<'a> {
    name: String,
    model: &'a dyn RobotModel,
    link: String,
    vars: Vec<Variable>,
    target_pos: [f64; 3],
    target_quat: Quat,
}

impl<'a> CartPoseConstraint<'a> {
    pub fn new(
        name: impl Into<String>,
        model: &'a dyn RobotModel,
        link: impl Into<String>,
        vars: Vec<Variable>,
        target_pos: [f64; 3],
        target_quat: Quat,
    ) -> Self {
        Self { name: name.into(), model, link: link.into(), vars, target_pos, target_quat }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Eq
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        let dof_values = dof_values_at(x, &self.vars);
        pose_err(self.model, &self.link, self.target_pos, self.target_quat, &dof_values).to_vec()
    }

    pub fn convex(&self, x: &[f64]) -> Vec<AffExpr> {
        let dof_values = dof_values_at(x, &self.vars);
        pose_err_rows(self.model, &self.link, self.target_pos, self.target_quat, &self.vars, &dof_values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_kinematics::PlanarArm;

    fn vars() -> Vec<Variable> {
        vec![Variable::new(0, "j_0_0"), Variable::new(1, "j_0_1"), Variable::new(2, "j_0_2")]
    }

    #[test]
    fn zero_error_at_target_configuration() {
        let arm = PlanarArm::new();
        let theta = [0.3, -0.2, 0.1];
        let pos = arm.link_position("finger", &theta).unwrap();
        let quat = arm.link_orientation("finger", &theta).unwrap();
        let cost = CartPoseCost::new("pose", &arm, "finger", vars(), pos, quat, [1.0; 6]);
        assert!(cost.value(&theta) < 1e-20);
    }

    #[test]
    fn linearization_matches_true_error_at_the_point_it_was_built_at() {
        let arm = PlanarArm::new();
        let theta0 = [0.1, 0.2, -0.3];
        let target_theta = [0.5, 0.0, 0.0];
        let pos = arm.link_position("finger", &target_theta).unwrap();
        let quat = arm.link_orientation("finger", &target_theta).unwrap();
        let cnt = CartPoseConstraint::new("pose_cnt", &arm, "finger", vars(), pos, quat);

        let rows = cnt.convex(&theta0);
        let true_err = cnt.value(&theta0);
        for (row, err) in rows.iter().zip(true_err.iter()) {
            assert!((row.value(&theta0) - err).abs() < 1e-9);
        }
    }
}

//! `ControlCost` and `ControlCnt` (§4.3): control-effort penalty and the
//! per-coordinate control box constraint, both belief-mode only.

use trajopt_core::{AffExpr, QuadExpr, Variable};

use crate::ConstraintType;

/// `sum_t sum_i c_i * u_i,t^2` on the control block.
#[derive(Debug, Clone)]
pub struct ControlCost {
    name: String,
    vars: Vec<Variable>,
    coeffs: Vec<f64>,
}

impl ControlCost {
    pub fn new(name: impl Into<String>, vars: Vec<Variable>, coeffs: Vec<f64>) -> Self {
        assert_eq!(vars.len(), coeffs.len(), "ControlCost: vars/coeffs length mismatch");
        Self { name: name.into(), vars, coeffs }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, x: &[f64]) -> f64 {
        self.vars.iter().zip(self.coeffs.iter()).map(|(v, c)| c * x[v.index()].powi(2)).sum()
    }

    pub fn convex(&self, _x: &[f64]) -> QuadExpr {
        let mut out = QuadExpr::default();
        for (v, c) in self.vars.iter().zip(self.coeffs.iter()) {
            out.inc(&QuadExpr::diagonal_term(*c, v.clone()));
        }
        out
    }
}

/// Per-coordinate box `u_min <= u <= u_max`, modeled as a genuine
/// inequality constraint (two rows per control coordinate) rather than a
/// hard variable bound, so violations participate in the same ℓ1 merit
/// accounting as every other constraint (§4.7).
#[derive(Debug, Clone)]
pub struct ControlCnt {
    name: String,
    vars: Vec<Variable>,
    u_min: Vec<f64>,
    u_max: Vec<f64>,
}

impl ControlCnt {
    pub fn new(name: impl Into<String>, vars: Vec<Variable>, u_min: Vec<f64>, u_max: Vec<f64>) -> Self {
        assert_eq!(vars.len(), u_min.len());
        assert_eq!(vars.len(), u_max.len());
        Self { name: name.into(), vars, u_min, u_max }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Ineq
    }

    /// `2 * n_vars` violations: `u - u_max` then `u_min - u`, per
    /// coordinate.
    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.vars.len() * 2);
        for ((v, lo), hi) in self.vars.iter().zip(self.u_min.iter()).zip(self.u_max.iter()) {
            let u = x[v.index()];
            out.push(u - hi);
            out.push(lo - u);
        }
        out
    }

    /// Already affine, exact at every `x`.
    pub fn convex(&self, _x: &[f64]) -> Vec<AffExpr> {
        let mut rows = Vec::with_capacity(self.vars.len() * 2);
        for ((v, lo), hi) in self.vars.iter().zip(self.u_min.iter()).zip(self.u_max.iter()) {
            let mut above = AffExpr::term(1.0, v.clone());
            above.inc_const(-hi);
            rows.push(above);

            let mut below = AffExpr::term(-1.0, v.clone());
            below.inc_const(*lo);
            rows.push(below);
        }
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> Variable {
        Variable::new(i, format!("u_0_{i}"))
    }

    #[test]
    fn control_cost_matches_convex() {
        let cost = ControlCost::new("u", vec![v(0), v(1)], vec![1.0, 4.0]);
        let x = [0.5, -0.25];
        assert!((cost.value(&x) - cost.convex(&x).value(&x)).abs() < 1e-9);
    }

    #[test]
    fn control_box_reports_zero_violation_inside_bounds() {
        let cnt = ControlCnt::new("u_box", vec![v(0)], vec![-0.2], vec![0.2]);
        let violations = cnt.value(&[0.1]);
        assert!(violations.iter().all(|v| *v <= 0.0));
    }

    #[test]
    fn control_box_reports_positive_violation_outside_bounds() {
        let cnt = ControlCnt::new("u_box", vec![v(0)], vec![-0.2], vec![0.2]);
        let violations = cnt.value(&[0.5]);
        assert!(violations[0] > 0.0);
    }
}

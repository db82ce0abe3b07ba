//! `JointPosCost` (§4.3): a quadratic penalty on absolute joint position at
//! one timestep, `sum_i c_i * (theta_i - target_i)^2`.

use trajopt_core::{AffExpr, QuadExpr, Variable};

#[derive(Debug, Clone)]
pub struct JointPosCost {
    name: String,
    vars: Vec<Variable>,
    target: Vec<f64>,
    coeffs: Vec<f64>,
}

impl JointPosCost {
    pub fn new(name: impl Into<String>, vars: Vec<Variable>, target: Vec<f64>, coeffs: Vec<f64>) -> Self {
        assert_eq!(vars.len(), target.len(), "JointPosCost: vars/target length mismatch");
        assert_eq!(vars.len(), coeffs.len(), "JointPosCost: vars/coeffs length mismatch");
        Self { name: name.into(), vars, target, coeffs }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, x: &[f64]) -> f64 {
        self.vars
            .iter()
            .zip(self.target.iter())
            .zip(self.coeffs.iter())
            .map(|((v, t), c)| c * (x[v.index()] - t).powi(2))
            .sum()
    }

    /// Already quadratic in `theta`, so the convex surrogate equals the
    /// true cost exactly at every `x`, not just near the linearization
    /// point.
    pub fn convex(&self, _x: &[f64]) -> QuadExpr {
        let mut out = QuadExpr::default();
        for ((v, t), c) in self.vars.iter().zip(self.target.iter()).zip(self.coeffs.iter()) {
            let mut aff = AffExpr::term(1.0, v.clone());
            aff.inc_const(-t);
            out.inc(&aff.squared(*c));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> Variable {
        Variable::new(i, format!("j_0_{i}"))
    }

    #[test]
    fn value_and_convex_agree_everywhere() {
        let cost = JointPosCost::new("jp", vec![v(0), v(1)], vec![0.5, -0.2], vec![2.0, 3.0]);
        let x = [0.9, -1.1];
        assert!((cost.value(&x) - cost.convex(&x).value(&x)).abs() < 1e-9);
    }

    #[test]
    fn zero_at_target() {
        let cost = JointPosCost::new("jp", vec![v(0)], vec![1.0], vec![5.0]);
        assert!(cost.value(&[1.0]).abs() < 1e-12);
    }
}

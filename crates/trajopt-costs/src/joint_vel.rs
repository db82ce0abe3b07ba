//! `JointVelCost` (§4.3): a quadratic penalty on forward differences of
//! joint position between consecutive timesteps,
//! `sum_t sum_i c_i * (theta_i,t+1 - theta_i,t)^2`.

use trajopt_core::{AffExpr, QuadExpr, Variable, VariableArray};

#[derive(Debug, Clone)]
pub struct JointVelCost {
    name: String,
    /// `(var_t, var_t+1)` per dof per consecutive timestep pair.
    pairs: Vec<(Variable, Variable)>,
    /// One weight per entry in `pairs` (the dof's coefficient, repeated
    /// across every timestep transition).
    coeffs: Vec<f64>,
}

impl JointVelCost {
    /// Builds the cost over every consecutive-timestep pair in `joints`
    /// (an `n_steps x n_dof` block), weighting each dof by `coeffs`
    /// (length `n_dof`).
    pub fn from_joint_block(name: impl Into<String>, joints: &VariableArray, coeffs: &[f64]) -> Self {
        assert_eq!(joints.cols(), coeffs.len(), "JointVelCost: coeffs length must match n_dof");
        let mut pairs = Vec::new();
        let mut weights = Vec::new();
        for t in 0..joints.rows() - 1 {
            for dof in 0..joints.cols() {
                pairs.push((joints.at(t, dof).clone(), joints.at(t + 1, dof).clone()));
                weights.push(coeffs[dof]);
            }
        }
        Self { name: name.into(), pairs, coeffs: weights }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn diff(&self, i: usize) -> AffExpr {
        let (v0, v1) = &self.pairs[i];
        let mut aff = AffExpr::term(1.0, v1.clone());
        aff.inc(&AffExpr::term(-1.0, v0.clone()));
        aff
    }

    pub fn value(&self, x: &[f64]) -> f64 {
        (0..self.pairs.len()).map(|i| self.coeffs[i] * self.diff(i).value(x).powi(2)).sum()
    }

    /// Already quadratic, exact at every `x`.
    pub fn convex(&self, _x: &[f64]) -> QuadExpr {
        let mut out = QuadExpr::default();
        for i in 0..self.pairs.len() {
            out.inc(&self.diff(i).squared(self.coeffs[i]));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block(rows: usize, cols: usize) -> VariableArray {
        let data = (0..rows * cols).map(|i| Variable::new(i, format!("j_{}_{}", i / cols, i % cols))).collect();
        VariableArray::from_row_major(rows, cols, data)
    }

    #[test]
    fn zero_for_constant_trajectory() {
        let joints = block(4, 2);
        let cost = JointVelCost::from_joint_block("jv", &joints, &[1.0, 1.0]);
        let x = vec![0.3; 8];
        assert!(cost.value(&x).abs() < 1e-12);
    }

    #[test]
    fn value_and_convex_agree() {
        let joints = block(3, 2);
        let cost = JointVelCost::from_joint_block("jv", &joints, &[2.0, 0.5]);
        let x = vec![0.1, -0.2, 0.4, 0.6, -0.1, 0.9];
        assert!((cost.value(&x) - cost.convex(&x).value(&x)).abs() < 1e-9);
    }
}

//! `CovarianceCost` (§4.3): `trace(Q * sqrt(Sigma) * sqrt(Sigma)^T)`.
//!
//! For diagonal `Q`, `trace(Q L L^T) = sum_i Q_ii * sum_{k<=i} L_ik^2`
//! (`L` lower-triangular, so row `i` only has entries `k <= i`): a fixed
//! quadratic form over the packed √covariance entries, independent of the
//! linearization point, since `L`'s entries are themselves the decision
//! variables. The caller supplies each packed entry's row index weight
//! directly (`weights`), already resolved from `Q`'s diagonal.

use trajopt_core::{QuadExpr, Variable};

#[derive(Debug, Clone)]
pub struct CovarianceCost {
    name: String,
    vars: Vec<Variable>,
    weights: Vec<f64>,
}

impl CovarianceCost {
    /// `vars` are the packed lower-triangular √Σ entries for one
    /// timestep (column-major, per §3); `weights[i]` is `Q`'s diagonal
    /// entry for `vars[i]`'s row.
    pub fn new(name: impl Into<String>, vars: Vec<Variable>, weights: Vec<f64>) -> Self {
        assert_eq!(vars.len(), weights.len(), "CovarianceCost: vars/weights length mismatch");
        Self { name: name.into(), vars, weights }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self, x: &[f64]) -> f64 {
        self.vars.iter().zip(self.weights.iter()).map(|(v, w)| w * x[v.index()].powi(2)).sum()
    }

    /// Independent of `x`: the same quadratic form every time.
    pub fn convex(&self, _x: &[f64]) -> QuadExpr {
        let mut out = QuadExpr::default();
        for (v, w) in self.vars.iter().zip(self.weights.iter()) {
            out.inc(&QuadExpr::diagonal_term(*w, v.clone()));
        }
        out
    }
}

/// Builds the `(var, weight)` pairs for one timestep's packed √Σ block
/// given `Q`'s diagonal, resolving each packed column-major lower-triangle
/// entry `(i, j)` (`j <= i`, per §3) to its row `i`'s weight.
pub fn covariance_weights(n_dof: usize, q_diag: &[f64]) -> Vec<f64> {
    assert_eq!(q_diag.len(), n_dof, "covariance_weights: Q diagonal must have n_dof entries");
    let mut weights = Vec::with_capacity(n_dof * (n_dof + 1) / 2);
    for j in 0..n_dof {
        for i in j..n_dof {
            weights.push(q_diag[i]);
        }
    }
    weights
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covariance_weights_match_row_index_for_n3() {
        // column-major lower triangle of a 3x3: (0,0) (1,0) (2,0) (1,1) (2,1) (2,2)
        let weights = covariance_weights(3, &[1.0, 2.0, 3.0]);
        assert_eq!(weights, vec![1.0, 2.0, 3.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn value_and_convex_agree() {
        let vars = vec![Variable::new(0, "cov_0_0_0"), Variable::new(1, "cov_0_1_0")];
        let cost = CovarianceCost::new("cov", vars, vec![2.0, 5.0]);
        let x = [0.3, -0.7];
        assert!((cost.value(&x) - cost.convex(&x).value(&x)).abs() < 1e-9);
    }
}

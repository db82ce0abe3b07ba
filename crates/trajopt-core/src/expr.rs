//! Decision variables and the affine/quadratic expression algebra built on
//! top of them (§3, §4.1).
//!
//! A [`Variable`] is an opaque handle into a primal vector. [`AffExpr`] and
//! [`QuadExpr`] are small, cheaply-cloned expressions built fresh for every
//! convex subproblem and discarded afterward — they never outlive a single
//! linearization pass.

/// Coefficients below this magnitude are treated as zero during cleanup.
pub const CLEANUP_EPS: f64 = 1e-12;

/// An opaque handle identifying one decision coordinate.
///
/// Carries the index into the primal vector and a human-readable name for
/// diagnostics (`"j_3_1"`, `"cov_3_2_0"`, `"u_3_1"`, per the naming scheme
/// in §4.6). Variables are created once at problem construction and live
/// for the lifetime of the optimization; cloning a `Variable` is cheap and
/// does not duplicate the underlying coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Variable {
    index: usize,
    name: String,
}

impl Variable {
    /// Creates a handle for the primal coordinate at `index`.
    pub fn new(index: usize, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

    /// Index into the primal vector this variable reads from.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Human-readable name, e.g. for error messages and variable dumps.
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// An affine expression `c + sum_i a_i * x[v_i]`.
///
/// Cleanup (`cleanup`) puts the expression in canonical form: terms are
/// sorted by variable index, duplicate variables are coalesced, and terms
/// with `|coefficient| < CLEANUP_EPS` are dropped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AffExpr {
    pub constant: f64,
    pub coeffs: Vec<f64>,
    pub vars: Vec<Variable>,
}

impl AffExpr {
    /// A constant expression with no variable terms.
    pub fn constant(c: f64) -> Self {
        Self {
            constant: c,
            coeffs: Vec::new(),
            vars: Vec::new(),
        }
    }

    /// A single-term expression `coeff * var`.
    pub fn term(coeff: f64, var: Variable) -> Self {
        Self {
            constant: 0.0,
            coeffs: vec![coeff],
            vars: vec![var],
        }
    }

    /// Builds `sum_i coeffs[i] * vars[i]` (`varDot` in the original).
    pub fn var_dot(coeffs: &[f64], vars: &[Variable]) -> Self {
        assert_eq!(coeffs.len(), vars.len(), "varDot: length mismatch");
        Self {
            constant: 0.0,
            coeffs: coeffs.to_vec(),
            vars: vars.to_vec(),
        }
    }

    /// Evaluates the expression against a primal vector.
    pub fn value(&self, x: &[f64]) -> f64 {
        let mut out = self.constant;
        for (c, v) in self.coeffs.iter().zip(self.vars.iter()) {
            out += c * x[v.index()];
        }
        out
    }

    /// `self += other` (`exprInc`).
    pub fn inc(&mut self, other: &AffExpr) {
        self.constant += other.constant;
        self.coeffs.extend_from_slice(&other.coeffs);
        self.vars.extend_from_slice(&other.vars);
    }

    /// `self += k` (`exprInc` with a scalar).
    pub fn inc_const(&mut self, k: f64) {
        self.constant += k;
    }

    /// Scales every term (including the constant) by `k`.
    pub fn scale(&mut self, k: f64) {
        self.constant *= k;
        for c in &mut self.coeffs {
            *c *= k;
        }
    }

    /// `self + other`.
    pub fn add(&self, other: &AffExpr) -> AffExpr {
        let mut out = self.clone();
        out.inc(other);
        out
    }

    /// `self - other`.
    pub fn sub(&self, other: &AffExpr) -> AffExpr {
        let mut neg = other.clone();
        neg.scale(-1.0);
        self.add(&neg)
    }

    /// `weight * self^2`, expanded term-by-term into a [`QuadExpr`] upper
    /// model. Every quadratic cost in `trajopt-costs` (joint position,
    /// joint velocity, control effort, covariance trace, Cartesian pose)
    /// reduces to squaring one or more affine terms this way, so the
    /// expansion lives here once rather than being re-derived per cost.
    pub fn squared(&self, weight: f64) -> QuadExpr {
        let mut out = QuadExpr {
            affine: AffExpr::constant(weight * self.constant * self.constant),
            ..Default::default()
        };
        for (c, v) in self.coeffs.iter().zip(self.vars.iter()) {
            out.affine.coeffs.push(weight * 2.0 * self.constant * c);
            out.affine.vars.push(v.clone());
        }
        let n = self.coeffs.len();
        for i in 0..n {
            out.coeffs.push(weight * self.coeffs[i] * self.coeffs[i]);
            out.vars1.push(self.vars[i].clone());
            out.vars2.push(self.vars[i].clone());
            for j in (i + 1)..n {
                out.coeffs.push(weight * 2.0 * self.coeffs[i] * self.coeffs[j]);
                out.vars1.push(self.vars[i].clone());
                out.vars2.push(self.vars[j].clone());
            }
        }
        out
    }

    /// Sorts terms by variable index, coalesces duplicates, and drops terms
    /// with `|coefficient| < CLEANUP_EPS`. The universal invariant this
    /// maintains: `cleanup(e).value(x) == e.value(x)` for every `x`.
    pub fn cleanup(&self) -> AffExpr {
        let mut terms: Vec<(usize, f64, Variable)> = self
            .coeffs
            .iter()
            .zip(self.vars.iter())
            .map(|(c, v)| (v.index(), *c, v.clone()))
            .collect();
        terms.sort_by_key(|(idx, _, _)| *idx);

        let mut coeffs = Vec::with_capacity(terms.len());
        let mut vars = Vec::with_capacity(terms.len());
        let mut i = 0;
        while i < terms.len() {
            let idx = terms[i].0;
            let mut sum = terms[i].1;
            let var = terms[i].2.clone();
            let mut j = i + 1;
            while j < terms.len() && terms[j].0 == idx {
                sum += terms[j].1;
                j += 1;
            }
            if sum.abs() >= CLEANUP_EPS {
                coeffs.push(sum);
                vars.push(var);
            }
            i = j;
        }

        AffExpr {
            constant: self.constant,
            coeffs,
            vars,
        }
    }
}

/// A quadratic expression `affine + sum_j q_j * x[u_j] * x[w_j]`.
///
/// Cleanup symmetrizes: a `(u, w)` term and a `(w, u)` term with equal
/// coefficient coalesce into one term (see [`QuadExpr::cleanup`] for the
/// exact halving rule), then identical `(u, w)` pairs are merged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuadExpr {
    pub affine: AffExpr,
    pub coeffs: Vec<f64>,
    pub vars1: Vec<Variable>,
    pub vars2: Vec<Variable>,
}

impl QuadExpr {
    /// Evaluates the expression against a primal vector.
    pub fn value(&self, x: &[f64]) -> f64 {
        let mut out = self.affine.value(x);
        for ((c, u), w) in self.coeffs.iter().zip(self.vars1.iter()).zip(self.vars2.iter()) {
            out += c * x[u.index()] * x[w.index()];
        }
        out
    }

    /// `self += other` (`exprInc` for quadratic expressions).
    pub fn inc(&mut self, other: &QuadExpr) {
        self.affine.inc(&other.affine);
        self.coeffs.extend_from_slice(&other.coeffs);
        self.vars1.extend_from_slice(&other.vars1);
        self.vars2.extend_from_slice(&other.vars2);
    }

    /// Diagonal term `coeff * var * var`, the common case for per-coordinate
    /// quadratic penalties (joint-velocity smoothing, control effort).
    pub fn diagonal_term(coeff: f64, var: Variable) -> Self {
        Self {
            affine: AffExpr::default(),
            coeffs: vec![coeff],
            vars1: vec![var.clone()],
            vars2: vec![var],
        }
    }

    /// Canonicalizes quadratic terms: `(u, w)` and `(w, u)` pairs with
    /// matching variables are merged by summing their coefficients (each
    /// ordering contributing its own weight — a pre-symmetrized diagonal
    /// term already carries the combined coefficient), then sorted so
    /// identical `(u, w)` pairs are adjacent and combined, and terms whose
    /// combined coefficient is below [`CLEANUP_EPS`] are dropped.
    pub fn cleanup(&self) -> QuadExpr {
        let mut terms: Vec<(usize, usize, f64, Variable, Variable)> = self
            .coeffs
            .iter()
            .zip(self.vars1.iter())
            .zip(self.vars2.iter())
            .map(|((c, u), w)| {
                // canonical ordering so (u, w) and (w, u) land adjacent after sort
                if u.index() <= w.index() {
                    (u.index(), w.index(), *c, u.clone(), w.clone())
                } else {
                    (w.index(), u.index(), *c, w.clone(), u.clone())
                }
            })
            .collect();
        terms.sort_by_key(|(a, b, _, _, _)| (*a, *b));

        let mut coeffs = Vec::with_capacity(terms.len());
        let mut vars1 = Vec::with_capacity(terms.len());
        let mut vars2 = Vec::with_capacity(terms.len());
        let mut i = 0;
        while i < terms.len() {
            let (a, b, _, u, w) = terms[i].clone();
            let mut sum = terms[i].2;
            let mut j = i + 1;
            while j < terms.len() && terms[j].0 == a && terms[j].1 == b {
                sum += terms[j].2;
                j += 1;
            }
            if sum.abs() >= CLEANUP_EPS {
                coeffs.push(sum);
                vars1.push(u);
                vars2.push(w);
            }
            i = j;
        }

        QuadExpr {
            affine: self.affine.cleanup(),
            coeffs,
            vars1,
            vars2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> Variable {
        Variable::new(i, format!("x{i}"))
    }

    #[test]
    fn cleanup_preserves_affine_value() {
        let e = AffExpr {
            constant: 1.0,
            coeffs: vec![2.0, 3.0, -2.0],
            vars: vec![v(0), v(1), v(0)],
        };
        let x = [1.0, 2.0, 3.0];
        let expected = e.value(&x);
        let cleaned = e.cleanup();
        assert!((cleaned.value(&x) - expected).abs() < 1e-12 * 10.0);
        // x0's coefficients (2 and -2) cancel, so only x1's term survives.
        assert_eq!(cleaned.coeffs.len(), 1);
        assert_eq!(cleaned.vars[0].index(), 1);
    }

    #[test]
    fn cleanup_drops_zero_coefficients() {
        let e = AffExpr {
            constant: 0.0,
            coeffs: vec![1e-15],
            vars: vec![v(0)],
        };
        assert!(e.cleanup().coeffs.is_empty());
    }

    #[test]
    fn quad_cleanup_preserves_value_and_merges_duplicates() {
        let mut e = QuadExpr::default();
        e.inc(&QuadExpr {
            affine: AffExpr::constant(0.5),
            coeffs: vec![1.0, 1.0],
            vars1: vec![v(0), v(1)],
            vars2: vec![v(1), v(0)],
        });
        let x = [2.0, 3.0, 0.0];
        let expected = e.value(&x);
        let cleaned = e.cleanup();
        assert!((cleaned.value(&x) - expected).abs() < 1e-9);
        assert_eq!(cleaned.coeffs.len(), 1);
    }

    #[test]
    fn diagonal_term_matches_square() {
        let term = QuadExpr::diagonal_term(3.0, v(0));
        assert_eq!(term.value(&[2.0]), 12.0);
    }

    #[test]
    fn squared_matches_value_squared_times_weight() {
        let aff = AffExpr {
            constant: 1.5,
            coeffs: vec![2.0, -1.0, 0.5],
            vars: vec![v(0), v(1), v(2)],
        };
        let x = [0.3, -1.2, 2.0];
        let weight = 3.0;
        let expected = weight * aff.value(&x).powi(2);
        let quad = aff.squared(weight);
        assert!((quad.value(&x) - expected).abs() < 1e-9);
    }
}

//! Assembles one convex subproblem and hands it to [`clarabel`].
//!
//! A [`ConvexModel`] is rebuilt from scratch every outer SQP iteration
//! (§4.7): costs and constraints are linearized/quadraticized around the
//! current trajectory, fed into a fresh model, and solved. Nothing here
//! persists state across iterations — the model is a write-once, solve-once
//! value.

use std::collections::BTreeMap;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT,
};
use trajopt_core::{AffExpr, QuadExpr, Variable};

use crate::error::ConvexError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Eq,
    Leq,
}

struct Row {
    coeffs: Vec<(usize, f64)>,
    rhs: f64,
    kind: RowKind,
}

/// A convex quadratic program: `min 0.5 x'Px + q'x  s.t.  lb <= x <= ub,
/// Ax = b, Cx <= d`.
///
/// Variables are added up front with [`ConvexModel::new`]; rows and
/// objective terms reference them by the index carried on a
/// [`trajopt_core::Variable`] handle.
pub struct ConvexModel {
    n_vars: usize,
    lb: Vec<f64>,
    ub: Vec<f64>,
    q: Vec<f64>,
    p_entries: BTreeMap<(usize, usize), f64>,
    rows: Vec<Row>,
}

/// The solution to a solved [`ConvexModel`].
#[derive(Debug, Clone)]
pub struct ConvexSolution {
    pub x: Vec<f64>,
    pub objective: f64,
}

impl ConvexModel {
    /// Creates a model over `n_vars` variables, all unbounded by default.
    pub fn new(n_vars: usize) -> Self {
        Self {
            n_vars,
            lb: vec![f64::NEG_INFINITY; n_vars],
            ub: vec![f64::INFINITY; n_vars],
            q: vec![0.0; n_vars],
            p_entries: BTreeMap::new(),
            rows: Vec::new(),
        }
    }

    fn check_index(&self, idx: usize) -> Result<(), ConvexError> {
        if idx >= self.n_vars {
            Err(ConvexError::VariableOutOfRange(idx, self.n_vars))
        } else {
            Ok(())
        }
    }

    /// Restricts `var` to `[lb, ub]`. Intersects with any prior bound on the
    /// same variable.
    pub fn set_bounds(&mut self, var: &Variable, lb: f64, ub: f64) -> Result<(), ConvexError> {
        self.check_index(var.index())?;
        let i = var.index();
        self.lb[i] = self.lb[i].max(lb);
        self.ub[i] = self.ub[i].min(ub);
        Ok(())
    }

    /// Adds `expr` to the linear part of the objective.
    pub fn add_linear_objective(&mut self, expr: &AffExpr) -> Result<(), ConvexError> {
        for (c, v) in expr.coeffs.iter().zip(expr.vars.iter()) {
            self.check_index(v.index())?;
            self.q[v.index()] += c;
        }
        Ok(())
    }

    /// Adds `expr` (its quadratic part; the affine part folds into the
    /// linear objective) to the objective, per the diagonal-doubling
    /// convention Clarabel expects for `0.5 x'Px + q'x`.
    pub fn add_quadratic_objective(&mut self, expr: &QuadExpr) -> Result<(), ConvexError> {
        self.add_linear_objective(&expr.affine)?;
        for ((c, u), w) in expr.coeffs.iter().zip(expr.vars1.iter()).zip(expr.vars2.iter()) {
            self.check_index(u.index())?;
            self.check_index(w.index())?;
            let (lo, hi) = if u.index() <= w.index() {
                (u.index(), w.index())
            } else {
                (w.index(), u.index())
            };
            let scaled = if lo == hi { 2.0 * c } else { *c };
            *self.p_entries.entry((lo, hi)).or_insert(0.0) += scaled;
        }
        Ok(())
    }

    /// Adds the equality row `expr == 0`.
    pub fn add_equality(&mut self, expr: &AffExpr) -> Result<(), ConvexError> {
        self.add_row(expr, RowKind::Eq)
    }

    /// Adds the inequality row `expr <= 0`.
    pub fn add_inequality(&mut self, expr: &AffExpr) -> Result<(), ConvexError> {
        self.add_row(expr, RowKind::Leq)
    }

    fn add_row(&mut self, expr: &AffExpr, kind: RowKind) -> Result<(), ConvexError> {
        let mut coeffs = Vec::with_capacity(expr.coeffs.len());
        for (c, v) in expr.coeffs.iter().zip(expr.vars.iter()) {
            self.check_index(v.index())?;
            coeffs.push((v.index(), *c));
        }
        self.rows.push(Row {
            coeffs,
            rhs: -expr.constant,
            kind,
        });
        Ok(())
    }

    /// Adds an ℓ₁ hinge penalty `weight * max(expr, 0)` to the objective via
    /// a fresh slack variable and returns its index. The caller is
    /// responsible for allocating a matching [`trajopt_core::Variable`] in
    /// the surrounding [`trajopt_core::VariableArray`] bookkeeping if the
    /// slack needs to be addressed later; here it only needs to exist in
    /// this model's primal vector.
    ///
    /// `weight` is the current merit penalty `mu` (§4.4): constraint
    /// violation is priced into the objective rather than enforced hard,
    /// which is what lets the trust-region SQP loop recover from an
    /// infeasible linearization instead of failing outright.
    pub fn add_hinge_penalty(&mut self, expr: &AffExpr, weight: f64) -> Result<usize, ConvexError> {
        let slack_idx = self.n_vars;
        self.n_vars += 1;
        self.lb.push(0.0);
        self.ub.push(f64::INFINITY);
        self.q.push(weight);

        // slack >= expr  <=>  expr - slack <= 0
        let mut coeffs: Vec<(usize, f64)> = expr
            .coeffs
            .iter()
            .zip(expr.vars.iter())
            .map(|(c, v)| (v.index(), *c))
            .collect();
        coeffs.push((slack_idx, -1.0));
        self.rows.push(Row {
            coeffs,
            rhs: -expr.constant,
            kind: RowKind::Leq,
        });
        Ok(slack_idx)
    }

    /// Solves the assembled QP with Clarabel and returns the primal
    /// solution and objective value.
    pub fn solve(&self) -> Result<ConvexSolution, ConvexError> {
        let n = self.n_vars;

        let mut a_cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        let mut rhs = Vec::new();
        let mut cones: Vec<SupportedConeT<f64>> = Vec::new();

        let mut push_rows = |kind: RowKind, rows: &[&Row]| {
            for row in rows {
                let row_idx = rhs.len();
                for &(col, coeff) in &row.coeffs {
                    a_cols[col].push((row_idx, coeff));
                }
                rhs.push(row.rhs);
            }
            match (kind, cones.last_mut()) {
                (RowKind::Eq, Some(SupportedConeT::ZeroConeT(count))) => *count += rows.len(),
                (RowKind::Eq, _) if !rows.is_empty() => cones.push(SupportedConeT::ZeroConeT(rows.len())),
                (RowKind::Leq, Some(SupportedConeT::NonnegativeConeT(count))) => *count += rows.len(),
                (RowKind::Leq, _) if !rows.is_empty() => {
                    cones.push(SupportedConeT::NonnegativeConeT(rows.len()))
                }
                _ => {}
            }
        };

        let eq_rows: Vec<&Row> = self.rows.iter().filter(|r| r.kind == RowKind::Eq).collect();
        push_rows(RowKind::Eq, &eq_rows);

        // Bounds and general inequalities both become Ax <= b rows, in the
        // Clarabel convention of `b - Ax >= 0` i.e. `Ax - b <= 0`.
        let mut ineq_rows: Vec<Row> = Vec::new();
        for i in 0..n {
            if self.ub[i].is_finite() {
                ineq_rows.push(Row {
                    coeffs: vec![(i, 1.0)],
                    rhs: self.ub[i],
                    kind: RowKind::Leq,
                });
            }
            if self.lb[i].is_finite() {
                ineq_rows.push(Row {
                    coeffs: vec![(i, -1.0)],
                    rhs: -self.lb[i],
                    kind: RowKind::Leq,
                });
            }
        }
        for row in self.rows.iter().filter(|r| r.kind == RowKind::Leq) {
            ineq_rows.push(Row {
                coeffs: row.coeffs.clone(),
                rhs: row.rhs,
                kind: RowKind::Leq,
            });
        }
        let ineq_refs: Vec<&Row> = ineq_rows.iter().collect();
        push_rows(RowKind::Leq, &ineq_refs);

        let n_con_rows = rhs.len();
        let mut col_ptr = Vec::with_capacity(n + 1);
        let mut row_idx = Vec::new();
        let mut values = Vec::new();
        for col in &mut a_cols {
            col.sort_by_key(|(r, _)| *r);
        }
        let mut nnz = 0;
        for col in &a_cols {
            col_ptr.push(nnz);
            for &(r, v) in col {
                row_idx.push(r);
                values.push(v);
                nnz += 1;
            }
        }
        col_ptr.push(nnz);
        let a_mat = CscMatrix::new(n_con_rows, n, col_ptr, row_idx, values);

        let mut p_cols: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n];
        for (&(r, c), &v) in &self.p_entries {
            p_cols[c].push((r, v));
        }
        let mut p_col_ptr = Vec::with_capacity(n + 1);
        let mut p_row_idx = Vec::new();
        let mut p_values = Vec::new();
        let mut p_nnz = 0;
        for col in &mut p_cols {
            col.sort_by_key(|(r, _)| *r);
        }
        for col in &p_cols {
            p_col_ptr.push(p_nnz);
            for &(r, v) in col {
                p_row_idx.push(r);
                p_values.push(v);
                p_nnz += 1;
            }
        }
        p_col_ptr.push(p_nnz);
        let p_mat = CscMatrix::new(n, n, p_col_ptr, p_row_idx, p_values);

        let settings = DefaultSettingsBuilder::default()
            .verbose(false)
            .build()
            .map_err(|e| ConvexError::Setup(format!("{e:?}")))?;

        let mut solver = DefaultSolver::new(&p_mat, &self.q, &a_mat, &rhs, &cones, settings)
            .map_err(|e| ConvexError::Setup(format!("{e:?}")))?;
        solver.solve();

        let sol = solver.solution;
        if !matches!(
            sol.status,
            SolverStatus::Solved | SolverStatus::AlmostSolved
        ) {
            return Err(ConvexError::Infeasible(sol.status));
        }

        Ok(ConvexSolution {
            x: sol.x[..self.n_vars].to_vec(),
            objective: sol.obj_val,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(i: usize) -> Variable {
        Variable::new(i, format!("x{i}"))
    }

    #[test]
    fn minimizes_unconstrained_quadratic_bowl() {
        // min (x - 3)^2 == x^2 - 6x + 9, drop the constant (doesn't affect argmin)
        let mut model = ConvexModel::new(1);
        model.add_quadratic_objective(&QuadExpr::diagonal_term(1.0, v(0))).unwrap();
        model.add_linear_objective(&AffExpr::term(-6.0, v(0))).unwrap();
        let sol = model.solve().unwrap();
        assert!((sol.x[0] - 3.0).abs() < 1e-4);
    }

    #[test]
    fn respects_box_bounds() {
        let mut model = ConvexModel::new(1);
        model.add_quadratic_objective(&QuadExpr::diagonal_term(1.0, v(0))).unwrap();
        model.add_linear_objective(&AffExpr::term(-6.0, v(0))).unwrap();
        model.set_bounds(&v(0), 0.0, 2.0).unwrap();
        let sol = model.solve().unwrap();
        assert!((sol.x[0] - 2.0).abs() < 1e-4);
    }

    #[test]
    fn hinge_penalty_is_zero_when_expr_is_negative() {
        let mut model = ConvexModel::new(1);
        model.set_bounds(&v(0), -1.0, -1.0).unwrap();
        model.add_quadratic_objective(&QuadExpr::diagonal_term(1.0, v(0))).unwrap();
        let slack = model.add_hinge_penalty(&AffExpr::term(1.0, v(0)), 10.0).unwrap();
        let sol = model.solve().unwrap();
        assert!(sol.x[slack].abs() < 1e-6);
    }

    #[test]
    fn equality_row_is_enforced() {
        let mut model = ConvexModel::new(2);
        model.add_quadratic_objective(&QuadExpr::diagonal_term(1.0, v(0))).unwrap();
        model.add_quadratic_objective(&QuadExpr::diagonal_term(1.0, v(1))).unwrap();
        // x0 + x1 == 4
        let mut eq = AffExpr::term(1.0, v(0));
        eq.inc(&AffExpr::term(1.0, v(1)));
        eq.inc_const(-4.0);
        model.add_equality(&eq).unwrap();
        let sol = model.solve().unwrap();
        assert!((sol.x[0] + sol.x[1] - 4.0).abs() < 1e-4);
    }

    #[test]
    fn out_of_range_variable_is_rejected() {
        let mut model = ConvexModel::new(1);
        let err = model.set_bounds(&v(5), 0.0, 1.0).unwrap_err();
        assert!(matches!(err, ConvexError::VariableOutOfRange(5, 1)));
    }
}

//! `BasicTrustRegionSQP` (§4.7): the ℓ₁ trust-region merit-method outer
//! loop. Every outer pass re-linearizes each cost/constraint around the
//! current primal, solves the resulting convex subproblem, and accepts or
//! rejects the candidate by comparing true merit improvement against the
//! convex model's predicted improvement.

use trajopt_convex::ConvexModel;
use trajopt_core::{AffExpr, QuadExpr, TrajOptResult, Variable};
use trajopt_costs::ConstraintType;
use trajopt_problem::Problem;

/// Tunables for [`optimize`]. Field names and defaults for `max_iter`,
/// `min_approx_improve_frac`, `merit_error_coeff`, and
/// `max_merit_coeff_increases` follow the documented driver parameters;
/// the remaining fields (accept threshold, trust-box clamps, constraint
/// tolerance) are this crate's own choices, recorded alongside their
/// rationale in the workspace's design notes.
#[derive(Debug, Clone)]
pub struct SqpParams {
    /// Hard cap on the total number of inner iterations across every
    /// penalty restart.
    pub max_iter: usize,
    /// Inner loop stops once `approx_improve / |merit(x)|` falls below
    /// this.
    pub min_approx_improve_frac: f64,
    /// Initial `μ`.
    pub merit_error_coeff: f64,
    /// `μ` is multiplied by `merit_coeff_increase_ratio` at most this many
    /// times before giving up.
    pub max_merit_coeff_increases: usize,
    /// Factor `μ` is multiplied by on each penalty restart.
    pub merit_coeff_increase_ratio: f64,
    /// Trust-box radius is multiplied by this (and clamped to
    /// `min_trust_box_size`) on a rejected step.
    pub trust_shrink_ratio: f64,
    /// Trust-box radius is multiplied by this (and clamped to
    /// `max_trust_box_size`) on an accepted step.
    pub trust_expand_ratio: f64,
    /// Initial trust-box radius `Δ`.
    pub trust_box_size: f64,
    pub min_trust_box_size: f64,
    pub max_trust_box_size: f64,
    /// A step is accepted when `true_improve / approx_improve` exceeds
    /// this.
    pub improve_ratio_threshold: f64,
    /// Maximum tolerated constraint violation before the merit coefficient
    /// is allowed to stop growing.
    pub cnt_tolerance: f64,
}

impl Default for SqpParams {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            min_approx_improve_frac: 1e-3,
            merit_error_coeff: 10.0,
            max_merit_coeff_increases: 15,
            merit_coeff_increase_ratio: 10.0,
            trust_shrink_ratio: 0.1,
            trust_expand_ratio: 1.5,
            trust_box_size: 0.1,
            min_trust_box_size: 1e-4,
            max_trust_box_size: 1e1,
            improve_ratio_threshold: 0.25,
            cnt_tolerance: 1e-4,
        }
    }
}

/// How the outer loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationStatus {
    /// The approximate-improvement criterion was hit with constraint
    /// violations within `cnt_tolerance`.
    Converged,
    /// `max_iter` inner iterations elapsed without converging.
    IterationLimit,
    /// `max_merit_coeff_increases` penalty restarts elapsed without
    /// driving violations below `cnt_tolerance`.
    PenaltyIterationLimit,
}

/// Per-run diagnostics: convergence status plus the final per-cost and
/// per-constraint values, so a caller doesn't have to re-evaluate the
/// problem against the returned trajectory to see what drove the result.
#[derive(Debug, Clone)]
pub struct OptimizationReport {
    pub status: TerminationStatus,
    pub iterations: usize,
    pub merit_coeff_increases: usize,
    pub final_merit_coeff: f64,
    pub final_trust_box_size: f64,
    pub cost_values: Vec<(String, f64)>,
    pub constraint_violations: Vec<(String, f64)>,
}

enum InnerOutcome {
    Converged,
    IterationLimit,
}

/// One outer-iteration's convex subproblem, plus the pieces needed to
/// evaluate its predicted ("model") merit at an arbitrary candidate point
/// without re-solving: the quadratic cost surrogates and every hinge term
/// (collision-cost and constraint-violation alike) with its pricing
/// weight already folded in.
struct ConvexSnapshot {
    model: ConvexModel,
    cost_quads: Vec<QuadExpr>,
    hinge_terms: Vec<(AffExpr, f64)>,
}

fn build_convex_snapshot(problem: &mut Problem, x: &[f64], trust_box_size: f64, mu: f64, all_vars: &[Variable]) -> TrajOptResult<ConvexSnapshot> {
    let mut model = ConvexModel::new(problem.n_vars());
    for v in all_vars {
        let i = v.index();
        let lo = problem.lb[i].max(x[i] - trust_box_size);
        let hi = problem.ub[i].min(x[i] + trust_box_size);
        model.set_bounds(v, lo, hi)?;
    }

    let mut cost_quads = Vec::new();
    let mut hinge_terms = Vec::new();

    for cost in problem.costs.iter_mut() {
        if let Some((hinges, weights)) = cost.collision_convex(x) {
            for (hinge, weight) in hinges.into_iter().zip(weights.into_iter()) {
                model.add_hinge_penalty(&hinge, weight)?;
                hinge_terms.push((hinge, weight));
            }
        } else {
            let quad = cost.convex(x);
            model.add_quadratic_objective(&quad)?;
            cost_quads.push(quad);
        }
    }

    for cnt in problem.constraints.iter() {
        let rows = cnt.convex(x);
        match cnt.constraint_type() {
            ConstraintType::Ineq => {
                for row in rows {
                    model.add_hinge_penalty(&row, mu)?;
                    hinge_terms.push((row, mu));
                }
            }
            ConstraintType::Eq => {
                for row in rows {
                    let mut neg = row.clone();
                    neg.scale(-1.0);
                    model.add_hinge_penalty(&row, mu)?;
                    model.add_hinge_penalty(&neg, mu)?;
                    hinge_terms.push((row, mu));
                    hinge_terms.push((neg, mu));
                }
            }
        }
    }

    Ok(ConvexSnapshot { model, cost_quads, hinge_terms })
}

fn model_merit(snapshot: &ConvexSnapshot, x: &[f64]) -> f64 {
    let quad_sum: f64 = snapshot.cost_quads.iter().map(|q| q.value(x)).sum();
    let hinge_sum: f64 = snapshot.hinge_terms.iter().map(|(expr, weight)| weight * expr.value(x).max(0.0)).sum();
    quad_sum + hinge_sum
}

fn constraint_violation_sum(problem: &Problem, x: &[f64]) -> f64 {
    problem
        .constraints
        .iter()
        .map(|c| {
            let vals = c.value(x);
            match c.constraint_type() {
                ConstraintType::Eq => vals.iter().map(|v| v.abs()).sum::<f64>(),
                ConstraintType::Ineq => vals.iter().map(|v| v.max(0.0)).sum::<f64>(),
            }
        })
        .sum()
}

fn max_constraint_violation(problem: &Problem, x: &[f64]) -> f64 {
    problem
        .constraints
        .iter()
        .map(|c| {
            let vals = c.value(x);
            match c.constraint_type() {
                ConstraintType::Eq => vals.iter().map(|v| v.abs()).fold(0.0, f64::max),
                ConstraintType::Ineq => vals.iter().map(|v| v.max(0.0)).fold(0.0, f64::max),
            }
        })
        .fold(0.0, f64::max)
}

fn true_merit(problem: &mut Problem, x: &[f64], mu: f64) -> f64 {
    let cost_sum: f64 = problem.costs.iter_mut().map(|c| c.value(x)).sum();
    cost_sum + mu * constraint_violation_sum(problem, x)
}

/// Runs the trust-region SQP loop to convergence (or a termination limit)
/// starting from `problem.init_x`, returning the final primal and a
/// diagnostics report.
pub fn optimize(problem: &mut Problem, params: &SqpParams) -> TrajOptResult<(Vec<f64>, OptimizationReport)> {
    let n = problem.n_vars();
    let all_vars = problem.layout.all_vars();
    let mut x = problem.init_x.clone();
    let mut mu = params.merit_error_coeff;
    let mut trust_box_size = params.trust_box_size;
    let mut total_iter = 0usize;
    let mut merit_coeff_increases = 0usize;

    let status = loop {
        let inner_outcome = loop {
            total_iter += 1;
            if total_iter > params.max_iter {
                break InnerOutcome::IterationLimit;
            }

            let merit_x = true_merit(problem, &x, mu);
            let snapshot = build_convex_snapshot(problem, &x, trust_box_size, mu, &all_vars)?;

            let x_cand = match snapshot.model.solve() {
                // the solved vector includes every hinge-penalty slack
                // variable appended after the problem's own coordinates;
                // only the first `n` entries are the trajectory's primal.
                Ok(sol) => sol.x[..n].to_vec(),
                Err(err) => {
                    tracing::warn!(iteration = total_iter, mu, trust_box_size, %err, "convex subproblem failed, shrinking trust region");
                    trust_box_size = (trust_box_size * params.trust_shrink_ratio).max(params.min_trust_box_size);
                    continue;
                }
            };

            let model_merit_cand = model_merit(&snapshot, &x_cand);
            let approx_improve = merit_x - model_merit_cand;

            if approx_improve / merit_x.abs().max(1e-10) < params.min_approx_improve_frac {
                tracing::debug!(iteration = total_iter, mu, trust_box_size, merit = merit_x, "model improvement below threshold, ending inner loop");
                break InnerOutcome::Converged;
            }

            let merit_cand = true_merit(problem, &x_cand, mu);
            let true_improve = merit_x - merit_cand;
            let accept = !merit_cand.is_nan() && true_improve / approx_improve > params.improve_ratio_threshold;

            if accept {
                x = x_cand;
                trust_box_size = (trust_box_size * params.trust_expand_ratio).min(params.max_trust_box_size);
                tracing::info!(iteration = total_iter, mu, trust_box_size, merit = merit_cand, "step accepted");
            } else {
                trust_box_size = (trust_box_size * params.trust_shrink_ratio).max(params.min_trust_box_size);
                tracing::debug!(iteration = total_iter, mu, trust_box_size, merit_cand, "step rejected, shrinking trust region");
            }
        };

        match inner_outcome {
            InnerOutcome::IterationLimit => break TerminationStatus::IterationLimit,
            InnerOutcome::Converged => {
                let violation = max_constraint_violation(problem, &x);
                if violation <= params.cnt_tolerance {
                    break TerminationStatus::Converged;
                }
                if merit_coeff_increases >= params.max_merit_coeff_increases {
                    break TerminationStatus::PenaltyIterationLimit;
                }
                merit_coeff_increases += 1;
                mu *= params.merit_coeff_increase_ratio;
                tracing::info!(merit_coeff_increases, mu, violation, "constraint violation exceeds tolerance, growing merit penalty");
            }
        }
    };

    let cost_values: Vec<(String, f64)> = problem.costs.iter_mut().map(|c| (c.name().to_string(), c.value(&x))).collect();
    let constraint_violations: Vec<(String, f64)> = problem
        .constraints
        .iter()
        .map(|c| {
            let vals = c.value(&x);
            let viol = match c.constraint_type() {
                ConstraintType::Eq => vals.iter().map(|v| v.abs()).fold(0.0, f64::max),
                ConstraintType::Ineq => vals.iter().map(|v| v.max(0.0)).fold(0.0, f64::max),
            };
            (c.name().to_string(), viol)
        })
        .collect();

    let report = OptimizationReport {
        status,
        iterations: total_iter,
        merit_coeff_increases,
        final_merit_coeff: mu,
        final_trust_box_size: trust_box_size,
        cost_values,
        constraint_violations,
    };

    Ok((x, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_kinematics::{NullCollisionChecker, PlanarArm};
    use trajopt_problem::ProblemConstructionInfo;

    fn small_joint_vel_problem() -> ProblemConstructionInfo {
        let json = r#"{
            "basic_info": { "n_steps": 5, "start_fixed": true },
            "costs": [{ "type": "joint_vel", "params": { "coeffs": [1.0, 1.0, 1.0] } }],
            "constraints": [{ "type": "joint", "params": { "timestep": 4, "vals": [0.5, -0.3, 0.2] } }],
            "init_info": { "type": "straight_line", "endpoint": [0.5, -0.3, 0.2] }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn converges_on_an_already_straight_line_trajectory() {
        let pci = small_joint_vel_problem();
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let mut problem = Problem::build(&pci, &arm, &checker).unwrap();

        let params = SqpParams::default();
        let (x, report) = optimize(&mut problem, &params).unwrap();

        assert_eq!(report.status, TerminationStatus::Converged);
        assert!(report.constraint_violations.iter().all(|(_, v)| *v < 1e-3));
        let traj = problem.trajectory(&x);
        assert_eq!(traj.len(), 5);
    }

    #[test]
    fn smooths_a_kinked_initial_trajectory_toward_the_straight_line() {
        let json = r#"{
            "basic_info": { "n_steps": 5, "start_fixed": true },
            "costs": [{ "type": "joint_vel", "params": { "coeffs": [1.0, 1.0, 1.0] } }],
            "constraints": [{ "type": "joint", "params": { "timestep": 4, "vals": [0.4, 0.0, 0.0] } }],
            "init_info": { "type": "given_traj", "data": [[0.0,0.0,0.0],[0.4,0.4,0.4],[0.0,0.0,0.0],[0.4,0.4,0.4],[0.4,0.0,0.0]] }
        }"#;
        let pci: ProblemConstructionInfo = serde_json::from_str(json).unwrap();
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let mut problem = Problem::build(&pci, &arm, &checker).unwrap();

        let init_x = problem.init_x.clone();
        let before: f64 = problem.costs[0].value(&init_x);
        let params = SqpParams::default();
        let (x, report) = optimize(&mut problem, &params).unwrap();
        let after = problem.costs[0].value(&x);

        assert!(after < before);
        assert!(report.constraint_violations.iter().all(|(_, v)| *v < 1e-2));
    }
}

//! Turns raw [`Collision`] records into distance values and affine
//! distance expressions linearized around the current trajectory point
//! (§4.8).

use trajopt_core::AffExpr;
use trajopt_kinematics::{Collision, RobotModel};

/// `(distances, weights)` for every collision touching an affected link,
/// with no linearization (used by `CalcDists`, for reporting only).
pub fn collisions_to_distances(collisions: &[Collision], affected: &[String]) -> (Vec<f64>, Vec<f64>) {
    let mut dists = Vec::with_capacity(collisions.len());
    let mut weights = Vec::with_capacity(collisions.len());
    for col in collisions {
        if affected.contains(&col.link_a) || affected.contains(&col.link_b) {
            dists.push(col.distance);
            weights.push(col.weight);
        }
    }
    (dists, weights)
}

/// Linearizes each collision's signed distance around `dof_values` against
/// `vars`, producing one [`AffExpr`] (and matching weight) per collision
/// that touches an affected link.
///
/// `dist(x) ~= col.distance + normal_b2a . J_a(col.pt_a) . (x - dof_values)
///                          - normal_b2a . J_b(col.pt_b) . (x - dof_values)`
/// (only the terms for links the model actually reports are included).
pub fn collisions_to_distance_expressions(
    collisions: &[Collision],
    model: &dyn RobotModel,
    vars: &[trajopt_core::Variable],
    dof_values: &[f64],
) -> (Vec<AffExpr>, Vec<f64>) {
    let affected = model.affected_links();
    let mut exprs = Vec::new();
    let mut weights = Vec::new();

    for col in collisions {
        let mut dist = AffExpr::constant(col.distance);
        let mut touched = false;

        if affected.contains(&col.link_a) {
            if let Ok(jac) = model.position_jacobian(&col.link_a, col.pt_a, dof_values) {
                let grad = jacobian_row_dot_normal(&jac, col.normal_b2a);
                dist.inc(&AffExpr::var_dot(&grad, vars));
                dist.inc_const(-dot3_slice(&grad, dof_values));
                touched = true;
            }
        }
        if affected.contains(&col.link_b) {
            if let Ok(jac) = model.position_jacobian(&col.link_b, col.pt_b, dof_values) {
                let grad: Vec<f64> = jacobian_row_dot_normal(&jac, col.normal_b2a).iter().map(|v| -v).collect();
                dist.inc(&AffExpr::var_dot(&grad, vars));
                dist.inc_const(-dot3_slice(&grad, dof_values));
                touched = true;
            }
        }

        if touched {
            exprs.push(dist);
            weights.push(col.weight);
        }
    }

    (exprs, weights)
}

/// The cast-collision variant: blends the linearization at `dof_values0`
/// and `dof_values1` by each collision's `time`, per the original's
/// `(1 - time) * expr0 + time * expr1` mixing rule.
pub fn collisions_to_distance_expressions_cast(
    collisions: &[Collision],
    model: &dyn RobotModel,
    vars0: &[trajopt_core::Variable],
    vars1: &[trajopt_core::Variable],
    dof_values0: &[f64],
    dof_values1: &[f64],
) -> (Vec<AffExpr>, Vec<f64>) {
    let (exprs0, weights0) = collisions_to_distance_expressions(collisions, model, vars0, dof_values0);
    let (exprs1, weights1) = collisions_to_distance_expressions(collisions, model, vars1, dof_values1);

    let n = exprs0.len().min(exprs1.len());
    let mut exprs = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    for i in 0..n {
        let t = collisions[i].time;
        let mut e0 = exprs0[i].clone();
        e0.scale(1.0 - t);
        let mut e1 = exprs1[i].clone();
        e1.scale(t);
        e0.inc(&e1);
        exprs.push(e0);
        weights.push((weights0[i] + weights1[i]) / 2.0);
    }
    (exprs, weights)
}

/// The belief-space (sigma-point) variant: mixes the linearization at each
/// sigma point `i` by `col.mix_info.alpha[i]`, using `belief_jacobian`
/// instead of `position_jacobian` so the gradient is already expressed in
/// belief-vector coordinates.
pub fn belief_collisions_to_distance_expressions(
    collisions: &[Collision],
    model: &dyn trajopt_belief::BeliefRobotModel,
    vars: &[trajopt_core::Variable],
    theta: &[f64],
) -> (Vec<AffExpr>, Vec<f64>) {
    let affected = model.affected_links();
    let mut exprs = Vec::new();
    let mut weights = Vec::new();

    for col in collisions {
        let Some(mix) = &col.mix_info else { continue };
        let mut dist = AffExpr::default();
        let mut touched = false;

        for (alpha, &instance_ind) in mix.alpha.iter().zip(mix.instance_ind.iter()) {
            let mut dist_a = AffExpr::constant(col.distance);
            let mut any = false;

            if affected.contains(&col.link_a) {
                if let Ok(jac) = model.belief_jacobian(&col.link_a, instance_ind, col.pt_a, theta) {
                    let grad = jacobian_row_dot_normal(&jac, col.normal_b2a);
                    dist_a.inc(&AffExpr::var_dot(&grad, vars));
                    dist_a.inc_const(-dot3_slice(&grad, theta));
                    any = true;
                }
            }
            if affected.contains(&col.link_b) {
                if let Ok(jac) = model.belief_jacobian(&col.link_b, instance_ind, col.pt_b, theta) {
                    let grad: Vec<f64> = jacobian_row_dot_normal(&jac, col.normal_b2a).iter().map(|v| -v).collect();
                    dist_a.inc(&AffExpr::var_dot(&grad, vars));
                    dist_a.inc_const(-dot3_slice(&grad, theta));
                    any = true;
                }
            }

            if any {
                dist_a.scale(*alpha);
                dist.inc(&dist_a);
                touched = true;
            }
        }

        if touched {
            exprs.push(dist);
            weights.push(col.weight);
        }
    }

    (exprs, weights)
}

/// `normal . J`, where `J` is a `3 x n` position Jacobian: the gradient of
/// `normal . position` with respect to each of the `n` coordinates.
fn jacobian_row_dot_normal(jac: &faer::Mat<f64>, normal: [f64; 3]) -> Vec<f64> {
    let n = jac.ncols();
    (0..n)
        .map(|col| (0..3).map(|row| normal[row] * jac.read(row, col)).sum())
        .collect()
}

fn dot3_slice(grad: &[f64], x: &[f64]) -> f64 {
    grad.iter().zip(x.iter()).map(|(g, xi)| g * xi).sum()
}

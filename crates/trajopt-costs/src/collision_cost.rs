//! `CollisionCost` (§4.3, §4.8): the hinge penalty `sum coeff * max(0, dist_pen - dist)`
//! built on any [`CollisionEvaluator`] flavor (single-timestep, cast, sigma-point).

use trajopt_collision::CollisionEvaluator;
use trajopt_core::AffExpr;

/// Wraps a [`CollisionEvaluator`] with the safety margin and the weight
/// applied to every penetration. `Box<dyn ...>` rather than an enum variant
/// here: the evaluator already hides a `&mut` cache behind the trait, and
/// this cost has no other variant-specific state to dispatch on.
pub struct CollisionCost<'a> {
    name: String,
    evaluator: Box<dyn CollisionEvaluator + 'a>,
    dist_pen: f64,
    coeff: f64,
}

impl<'a> CollisionCost<'a> {
    pub fn new(name: impl Into<String>, evaluator: Box<dyn CollisionEvaluator + 'a>, dist_pen: f64, coeff: f64) -> Self {
        Self { name: name.into(), evaluator, dist_pen, coeff }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&mut self, x: &[f64]) -> f64 {
        let (dists, weights) = self.evaluator.calc_dists(x);
        dists
            .iter()
            .zip(weights.iter())
            .map(|(d, w)| self.coeff * w * (self.dist_pen - d).max(0.0))
            .sum()
    }

    /// Returns one hinge-ready affine expression (`dist_pen - dist(theta)`,
    /// to be penalized via `max(0, .)`) per collision, paired with its
    /// total weight (`coeff * collision weight`) for the SQP driver's
    /// `add_hinge_penalty`.
    pub fn convex(&mut self, x: &[f64]) -> (Vec<AffExpr>, Vec<f64>) {
        let (dist_exprs, weights) = self.evaluator.calc_dist_expressions(x);
        let mut hinges = Vec::with_capacity(dist_exprs.len());
        let mut coeffs = Vec::with_capacity(dist_exprs.len());
        for (dist, w) in dist_exprs.into_iter().zip(weights.into_iter()) {
            let hinge = AffExpr::constant(self.dist_pen).sub(&dist);
            hinges.push(hinge);
            coeffs.push(self.coeff * w);
        }
        (hinges, coeffs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_kinematics::{NullCollisionChecker, PlanarArm};

    #[test]
    fn no_collisions_means_zero_cost() {
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let vars = vec![trajopt_core::Variable::new(0, "j_0_0"), trajopt_core::Variable::new(1, "j_0_1"), trajopt_core::Variable::new(2, "j_0_2")];
        let evaluator = trajopt_collision::SingleTimestepCollisionEvaluator::new(&arm, &checker, vars);
        let mut cost = CollisionCost::new("coll", Box::new(evaluator), 0.05, 10.0);
        assert_eq!(cost.value(&[0.0, 0.0, 0.0]), 0.0);
    }
}

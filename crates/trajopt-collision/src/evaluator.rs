//! The three collision-evaluator flavors: single-timestep, continuous-cast,
//! and sigma-point/belief (§4.8).

use trajopt_belief::BeliefRobotModel;
use trajopt_core::{AffExpr, Variable};
use trajopt_kinematics::{Collision, CollisionChecker, RobotModel};

use crate::cache::CollisionCache;
use crate::distance_expr::{
    belief_collisions_to_distance_expressions, collisions_to_distance_expressions,
    collisions_to_distance_expressions_cast, collisions_to_distances,
};

/// Common surface every collision evaluator exposes to the cost layer.
pub trait CollisionEvaluator {
    /// Raw collision records at `x`, cached against the last query.
    fn calc_collisions(&mut self, x: &[f64]) -> Vec<Collision>;

    /// `(distances, weights)` at `x`, for reporting.
    fn calc_dists(&mut self, x: &[f64]) -> (Vec<f64>, Vec<f64>);

    /// Linearized `(distance expressions, weights)` at `x`, for building a
    /// hinge penalty in the convex subproblem.
    fn calc_dist_expressions(&mut self, x: &[f64]) -> (Vec<AffExpr>, Vec<f64>);

    /// The collisions a plotting consumer would draw; defaults to
    /// `calc_collisions` since none of this crate's evaluators hide any
    /// collisions from the diagnostic view.
    fn collisions_for_plot(&mut self, x: &[f64]) -> Vec<Collision> {
        self.calc_collisions(x)
    }
}

fn dof_values_at(x: &[f64], vars: &[Variable]) -> Vec<f64> {
    vars.iter().map(|v| x[v.index()]).collect()
}

/// Checks collisions at one trajectory waypoint.
pub struct SingleTimestepCollisionEvaluator<'a> {
    model: &'a dyn RobotModel,
    checker: &'a dyn CollisionChecker,
    vars: Vec<Variable>,
    cache: CollisionCache<Vec<Collision>>,
}

impl<'a> SingleTimestepCollisionEvaluator<'a> {
    pub fn new(model: &'a dyn RobotModel, checker: &'a dyn CollisionChecker, vars: Vec<Variable>) -> Self {
        Self {
            model,
            checker,
            vars,
            cache: CollisionCache::new(),
        }
    }
}

impl<'a> CollisionEvaluator for SingleTimestepCollisionEvaluator<'a> {
    fn calc_collisions(&mut self, x: &[f64]) -> Vec<Collision> {
        let dof_values = dof_values_at(x, &self.vars);
        let affected = self.model.affected_links().to_vec();
        let checker = self.checker;
        self.cache.get_or_compute(x, || checker.links_vs_all(&affected, &dof_values))
    }

    fn calc_dists(&mut self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        collisions_to_distances(&collisions, self.model.affected_links())
    }

    fn calc_dist_expressions(&mut self, x: &[f64]) -> (Vec<AffExpr>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        let dof_values = dof_values_at(x, &self.vars);
        collisions_to_distance_expressions(&collisions, self.model, &self.vars, &dof_values)
    }
}

/// Checks continuous (swept) collisions between consecutive waypoints.
pub struct CastCollisionEvaluator<'a> {
    model: &'a dyn RobotModel,
    checker: &'a dyn CollisionChecker,
    vars0: Vec<Variable>,
    vars1: Vec<Variable>,
    cache: CollisionCache<Vec<Collision>>,
}

impl<'a> CastCollisionEvaluator<'a> {
    pub fn new(
        model: &'a dyn RobotModel,
        checker: &'a dyn CollisionChecker,
        vars0: Vec<Variable>,
        vars1: Vec<Variable>,
    ) -> Self {
        Self {
            model,
            checker,
            vars0,
            vars1,
            cache: CollisionCache::new(),
        }
    }
}

impl<'a> CollisionEvaluator for CastCollisionEvaluator<'a> {
    fn calc_collisions(&mut self, x: &[f64]) -> Vec<Collision> {
        let dof_values0 = dof_values_at(x, &self.vars0);
        let dof_values1 = dof_values_at(x, &self.vars1);
        let affected = self.model.affected_links().to_vec();
        let checker = self.checker;
        self.cache
            .get_or_compute(x, || checker.cast_vs_all(&affected, &dof_values0, &dof_values1))
    }

    fn calc_dists(&mut self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        collisions_to_distances(&collisions, self.model.affected_links())
    }

    fn calc_dist_expressions(&mut self, x: &[f64]) -> (Vec<AffExpr>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        let dof_values0 = dof_values_at(x, &self.vars0);
        let dof_values1 = dof_values_at(x, &self.vars1);
        collisions_to_distance_expressions_cast(&collisions, self.model, &self.vars0, &self.vars1, &dof_values0, &dof_values1)
    }
}

/// Checks collisions against the sigma points of a belief-space waypoint.
pub struct SigmaPtsCollisionEvaluator<'a> {
    model: &'a dyn BeliefRobotModel,
    checker: &'a dyn CollisionChecker,
    theta_vars: Vec<Variable>,
    cache: CollisionCache<Vec<Collision>>,
}

impl<'a> SigmaPtsCollisionEvaluator<'a> {
    pub fn new(model: &'a dyn BeliefRobotModel, checker: &'a dyn CollisionChecker, theta_vars: Vec<Variable>) -> Self {
        Self {
            model,
            checker,
            theta_vars,
            cache: CollisionCache::new(),
        }
    }
}

impl<'a> CollisionEvaluator for SigmaPtsCollisionEvaluator<'a> {
    fn calc_collisions(&mut self, x: &[f64]) -> Vec<Collision> {
        let theta = dof_values_at(x, &self.theta_vars);
        let sigma_pts = self.model.sigma_points(&theta);
        let dof_values: Vec<Vec<f64>> = (0..sigma_pts.ncols())
            .map(|col| (0..sigma_pts.nrows()).map(|row| sigma_pts.read(row, col)).collect())
            .collect();
        let affected = self.model.affected_links().to_vec();
        let checker = self.checker;
        self.cache.get_or_compute(x, || checker.multi_cast_vs_all(&affected, &dof_values))
    }

    fn calc_dists(&mut self, x: &[f64]) -> (Vec<f64>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        collisions_to_distances(&collisions, self.model.affected_links())
    }

    fn calc_dist_expressions(&mut self, x: &[f64]) -> (Vec<AffExpr>, Vec<f64>) {
        let collisions = self.calc_collisions(x);
        let theta = dof_values_at(x, &self.theta_vars);
        belief_collisions_to_distance_expressions(&collisions, self.model, &self.theta_vars, &theta)
    }
}

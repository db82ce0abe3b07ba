//! The cost and constraint catalog (§4.3): one variant per cost/constraint
//! kind, enumerated rather than boxed behind a trait object — the set of
//! kinds is closed and known at problem-construction time, so a tagged
//! union dispatches with a plain `match` and no vtable indirection.

pub mod belief_dynamics;
pub mod cart_pose;
pub mod cart_vel;
pub mod collision_cost;
pub mod control;
pub mod covariance;
pub mod joint_pos;
pub mod joint_vel;

pub use belief_dynamics::{BeliefDynamicsConstraint, BeliefDynamicsConstraintAnalytic};
pub use cart_pose::{CartPoseConstraint, CartPoseCost};
pub use cart_vel::CartVelConstraint;
pub use collision_cost::CollisionCost;
pub use control::{ControlCnt, ControlCost};
pub use covariance::{covariance_weights, CovarianceCost};
pub use joint_pos::JointPosCost;
pub use joint_vel::JointVelCost;

use trajopt_core::{AffExpr, QuadExpr};

/// Whether a constraint row must equal zero or must stay nonpositive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintType {
    Eq,
    Ineq,
}

/// Every cost kind a problem can be built from.
pub enum Cost<'a> {
    JointPos(JointPosCost),
    JointVel(JointVelCost),
    Control(ControlCost),
    Covariance(CovarianceCost),
    CartPose(CartPoseCost<'a>),
    Collision(CollisionCost<'a>),
}

impl<'a> Cost<'a> {
    pub fn name(&self) -> &str {
        match self {
            Cost::JointPos(c) => c.name(),
            Cost::JointVel(c) => c.name(),
            Cost::Control(c) => c.name(),
            Cost::Covariance(c) => c.name(),
            Cost::CartPose(c) => c.name(),
            Cost::Collision(c) => c.name(),
        }
    }

    /// The true (possibly nonconvex) cost value at `x`.
    pub fn value(&mut self, x: &[f64]) -> f64 {
        match self {
            Cost::JointPos(c) => c.value(x),
            Cost::JointVel(c) => c.value(x),
            Cost::Control(c) => c.value(x),
            Cost::Covariance(c) => c.value(x),
            Cost::CartPose(c) => c.value(x),
            Cost::Collision(c) => c.value(x),
        }
    }

    /// The convex surrogate built by linearizing/quadratizing around `x`.
    /// `Collision` has no direct `QuadExpr` representation (it is a hinge
    /// penalty, folded in by the SQP driver via `collision_convex`
    /// instead) so it is excluded from this dispatch.
    pub fn convex(&mut self, x: &[f64]) -> QuadExpr {
        match self {
            Cost::JointPos(c) => c.convex(x),
            Cost::JointVel(c) => c.convex(x),
            Cost::Control(c) => c.convex(x),
            Cost::Covariance(c) => c.convex(x),
            Cost::CartPose(c) => c.convex(x),
            Cost::Collision(_) => QuadExpr::default(),
        }
    }

    /// `Some((hinge_rows, coeffs))` for the one cost kind whose convex
    /// surrogate is a hinge penalty rather than a quadratic, `None`
    /// otherwise.
    pub fn collision_convex(&mut self, x: &[f64]) -> Option<(Vec<AffExpr>, Vec<f64>)> {
        match self {
            Cost::Collision(c) => Some(c.convex(x)),
            _ => None,
        }
    }
}

/// Every constraint kind a problem can be built from.
pub enum Constraint<'a> {
    CartPose(CartPoseConstraint<'a>),
    CartVel(CartVelConstraint<'a>),
    Control(ControlCnt),
    BeliefDynamics(BeliefDynamicsConstraint<'a>),
    BeliefDynamicsAnalytic(BeliefDynamicsConstraintAnalytic<'a>),
    Fixed(crate::FixedConstraint),
    LinearEq(crate::LinearEqConstraint),
}

impl<'a> Constraint<'a> {
    pub fn name(&self) -> &str {
        match self {
            Constraint::CartPose(c) => c.name(),
            Constraint::CartVel(c) => c.name(),
            Constraint::Control(c) => c.name(),
            Constraint::BeliefDynamics(c) => c.name(),
            Constraint::BeliefDynamicsAnalytic(c) => c.name(),
            Constraint::Fixed(c) => c.name(),
            Constraint::LinearEq(c) => c.name(),
        }
    }

    pub fn constraint_type(&self) -> ConstraintType {
        match self {
            Constraint::CartPose(c) => c.constraint_type(),
            Constraint::CartVel(c) => c.constraint_type(),
            Constraint::Control(c) => c.constraint_type(),
            Constraint::BeliefDynamics(c) => c.constraint_type(),
            Constraint::BeliefDynamicsAnalytic(c) => c.constraint_type(),
            Constraint::Fixed(c) => c.constraint_type(),
            Constraint::LinearEq(c) => c.constraint_type(),
        }
    }

    /// The true constraint violation at `x` (zero or negative means
    /// satisfied, per `constraint_type`).
    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        match self {
            Constraint::CartPose(c) => c.value(x),
            Constraint::CartVel(c) => c.value(x),
            Constraint::Control(c) => c.value(x),
            Constraint::BeliefDynamics(c) => c.value(x),
            Constraint::BeliefDynamicsAnalytic(c) => c.value(x),
            Constraint::Fixed(c) => c.value(x),
            Constraint::LinearEq(c) => c.value(x),
        }
    }

    /// The affine linearization around `x`, one row per violation
    /// dimension.
    pub fn convex(&self, x: &[f64]) -> Vec<AffExpr> {
        match self {
            Constraint::CartPose(c) => c.convex(x),
            Constraint::CartVel(c) => c.convex(x),
            Constraint::Control(c) => c.convex(x),
            Constraint::BeliefDynamics(c) => c.convex(x),
            Constraint::BeliefDynamicsAnalytic(c) => c.convex(x),
            Constraint::Fixed(c) => c.convex(x),
            Constraint::LinearEq(c) => c.convex(x),
        }
    }
}

/// A fixed (pinning) equality constraint, `var - target = 0`, used for
/// start-fixed and fixed-DOF wiring in problem construction (§4.6). Exact
/// and affine everywhere, so `convex` never depends on `x`.
#[derive(Debug, Clone)]
pub struct FixedConstraint {
    name: String,
    var: trajopt_core::Variable,
    target: f64,
}

impl FixedConstraint {
    pub fn new(name: impl Into<String>, var: trajopt_core::Variable, target: f64) -> Self {
        Self { name: name.into(), var, target }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Eq
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        vec![x[self.var.index()] - self.target]
    }

    pub fn convex(&self, _x: &[f64]) -> Vec<AffExpr> {
        let mut aff = AffExpr::term(1.0, self.var.clone());
        aff.inc_const(-self.target);
        vec![aff]
    }
}

/// A general linear equality constraint, `expr = 0`, for wiring an
/// [`AffExpr`] built elsewhere (e.g. `var_t - var_0` for fixed-DOF pinning
/// against another timestep rather than a constant, §4.6) straight into a
/// problem's constraint list. `FixedConstraint` is the common var-to-constant
/// case; this is the general var-to-var one.
#[derive(Debug, Clone)]
pub struct LinearEqConstraint {
    name: String,
    expr: AffExpr,
}

impl LinearEqConstraint {
    pub fn new(name: impl Into<String>, expr: AffExpr) -> Self {
        Self { name: name.into(), expr }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn constraint_type(&self) -> ConstraintType {
        ConstraintType::Eq
    }

    pub fn value(&self, x: &[f64]) -> Vec<f64> {
        vec![self.expr.value(x)]
    }

    pub fn convex(&self, _x: &[f64]) -> Vec<AffExpr> {
        vec![self.expr.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_core::Variable;

    #[test]
    fn fixed_constraint_zero_at_target() {
        let v = Variable::new(0, "j_0_0");
        let cnt = FixedConstraint::new("start_0", v, 0.4);
        assert!((cnt.value(&[0.4])[0]).abs() < 1e-12);
        assert!((cnt.convex(&[0.4])[0].value(&[0.4])).abs() < 1e-12);
    }

    #[test]
    fn linear_eq_constraint_pins_one_var_to_another() {
        let v0 = Variable::new(0, "j_0_0");
        let v1 = Variable::new(1, "j_1_0");
        let expr = AffExpr::term(1.0, v1).sub(&AffExpr::term(1.0, v0));
        let cnt = LinearEqConstraint::new("fixed_dof_0", expr);
        assert!((cnt.value(&[0.3, 0.3])[0]).abs() < 1e-12);
        assert!((cnt.value(&[0.3, 0.5])[0] - 0.2).abs() < 1e-12);
    }
}

//! Problem construction (§4.6): turns a [`config::ProblemConstructionInfo`]
//! plus a concrete robot/checker into a fully-wired [`Problem`] — variable
//! layout, bounds, seeded initial trajectory, and the cost/constraint list
//! the SQP driver iterates over.

pub mod config;
pub mod layout;
pub mod registry;
pub mod seed;

pub use config::{BasicInfo, InitInfo, ProblemConstructionInfo, TermInfo};
pub use layout::VariableLayout;

use trajopt_belief::BeliefRobotModel;
use trajopt_core::{AffExpr, TrajOptError, TrajOptResult};
use trajopt_costs::{BeliefDynamicsConstraint, Constraint, Cost, FixedConstraint, LinearEqConstraint};
use trajopt_kinematics::{CollisionChecker, RobotModel};

/// A fully-built optimization problem: the variable layout, its bounds and
/// seeded initial point, and the costs/constraints assembled from a
/// [`ProblemConstructionInfo`]. Borrows the robot model and collision
/// checker it was built against, same as every `trajopt-costs` type.
pub struct Problem<'a> {
    pub layout: VariableLayout,
    pub lb: Vec<f64>,
    pub ub: Vec<f64>,
    pub init_x: Vec<f64>,
    pub costs: Vec<Cost<'a>>,
    pub constraints: Vec<Constraint<'a>>,
}

impl<'a> Problem<'a> {
    pub fn n_vars(&self) -> usize {
        self.layout.n_vars()
    }

    /// Builds a problem in joint-only mode: no `cov`/`control` blocks, no
    /// belief-dynamics wiring, and `collision`/`continuous_collision` costs
    /// resolve to the single-timestep/cast evaluators.
    pub fn build(
        pci: &ProblemConstructionInfo,
        model: &'a dyn RobotModel,
        checker: &'a dyn CollisionChecker,
    ) -> TrajOptResult<Self> {
        Self::build_inner(pci, model, None, checker)
    }

    /// Builds a problem in belief-space mode: adds `cov`/`control` blocks,
    /// seeds them by forward-simulating the EKF, and wires a
    /// `BeliefDynamics` constraint between every consecutive pair of
    /// timesteps.
    pub fn build_belief(
        pci: &ProblemConstructionInfo,
        model: &'a dyn BeliefRobotModel,
        checker: &'a dyn CollisionChecker,
    ) -> TrajOptResult<Self> {
        Self::build_inner(pci, model, Some(model), checker)
    }

    fn build_inner(
        pci: &ProblemConstructionInfo,
        model: &'a dyn RobotModel,
        belief_model: Option<&'a dyn BeliefRobotModel>,
        checker: &'a dyn CollisionChecker,
    ) -> TrajOptResult<Self> {
        let basic = &pci.basic_info;
        if basic.belief_space && belief_model.is_none() {
            return Err(TrajOptError::Config("basic_info.belief_space = true requires a BeliefRobotModel".to_string()));
        }

        let n_dof = model.n_dof();
        let layout = VariableLayout::build(basic.n_steps, n_dof, basic.belief_space);
        let (dof_lb, dof_ub) = model.dof_limits();
        if dof_lb.len() != n_dof || dof_ub.len() != n_dof {
            return Err(TrajOptError::Config("robot model's dof_limits length disagrees with n_dof".to_string()));
        }

        let start = model.get_dof_values();
        if start.len() != n_dof {
            return Err(TrajOptError::Config("robot model's current dof values length disagrees with n_dof".to_string()));
        }
        let joint_traj = seed::seed_joint_trajectory(&pci.init_info, &start, basic.n_steps, basic.start_fixed)?;

        let n_vars = layout.n_vars();
        let mut lb = vec![f64::NEG_INFINITY; n_vars];
        let mut ub = vec![f64::INFINITY; n_vars];
        let mut init_x = vec![0.0; n_vars];

        for t in 0..basic.n_steps {
            for j in 0..n_dof {
                let v = layout.joint.at(t, j);
                lb[v.index()] = dof_lb[j];
                ub[v.index()] = dof_ub[j];
                init_x[v.index()] = joint_traj[t][j];
            }
        }

        if basic.belief_space {
            let belief_model = belief_model.expect("checked above");
            let (rt_sigmas, controls) = seed::belief_seed(belief_model, &joint_traj)?;
            let cov = layout.cov.as_ref().expect("belief_space layout always has a cov block");
            let control = layout.control.as_ref().expect("belief_space layout always has a control block");
            for t in 0..basic.n_steps {
                let belief = belief_model.compose_belief(&joint_traj[t], &rt_sigmas[t]);
                for (k, v) in cov[t].iter().enumerate() {
                    init_x[v.index()] = belief[n_dof + k];
                }
                for (j, v) in control[t].iter().enumerate() {
                    init_x[v.index()] = controls[t][j];
                }
            }
        }

        let mut constraints = Vec::new();
        if basic.start_fixed {
            for j in 0..n_dof {
                let v = layout.joint.at(0, j).clone();
                constraints.push(Constraint::Fixed(FixedConstraint::new(format!("start_fixed_{j}"), v, start[j])));
            }
        }
        for &j in &basic.dofs_fixed {
            if j >= n_dof {
                return Err(TrajOptError::Config(format!("dofs_fixed entry {j} out of range for n_dof={n_dof}")));
            }
            let v0 = layout.joint.at(0, j);
            for t in 1..basic.n_steps {
                let vt = layout.joint.at(t, j);
                let expr = AffExpr::term(1.0, vt.clone()).sub(&AffExpr::term(1.0, v0.clone()));
                constraints.push(Constraint::LinearEq(LinearEqConstraint::new(format!("dof_fixed_{j}_{t}"), expr)));
            }
        }
        if basic.belief_space {
            let belief_model = belief_model.expect("checked above");
            for t in 0..basic.n_steps.saturating_sub(1) {
                let theta_vars = layout.theta_vars(t);
                let next_theta_vars = layout.theta_vars(t + 1);
                let u_vars = layout.control.as_ref().expect("belief_space layout always has a control block")[t].clone();
                constraints.push(Constraint::BeliefDynamics(BeliefDynamicsConstraint::new(
                    format!("belief_dynamics_{t}"),
                    belief_model,
                    theta_vars,
                    u_vars,
                    next_theta_vars,
                )));
            }
        }

        let mut costs = Vec::new();
        for info in &pci.costs {
            costs.push(registry::build_cost(info, &layout, model, belief_model, checker)?);
        }
        for info in &pci.constraints {
            constraints.extend(registry::build_constraint(info, &layout, model)?);
        }

        Ok(Self { layout, lb, ub, init_x, costs, constraints })
    }

    /// Unpacks the optimized primal vector into one joint-angle row per
    /// timestep, in the layout's timestep order.
    pub fn trajectory(&self, x: &[f64]) -> Vec<Vec<f64>> {
        (0..self.layout.n_steps).map(|t| self.layout.joint.row(t).iter().map(|v| x[v.index()]).collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trajopt_kinematics::{NullCollisionChecker, PlanarArm};

    fn joint_only_pci() -> ProblemConstructionInfo {
        let json = r#"{
            "basic_info": { "n_steps": 4, "start_fixed": true },
            "costs": [{ "type": "joint_vel", "params": { "coeffs": [1.0, 1.0, 1.0] } }],
            "constraints": [],
            "init_info": { "type": "straight_line", "endpoint": [0.3, -0.2, 0.1] }
        }"#;
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn builds_joint_only_problem_with_one_cost_and_start_fixed_constraint() {
        let pci = joint_only_pci();
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let problem = Problem::build(&pci, &arm, &checker).unwrap();

        assert_eq!(problem.n_vars(), 4 * 3);
        assert_eq!(problem.costs.len(), 1);
        assert_eq!(problem.constraints.len(), 3);
        assert_eq!(problem.init_x[0], 0.0);
        assert!((problem.init_x[problem.layout.joint.at(3, 0).index()] - 0.3).abs() < 1e-9);
    }

    #[test]
    fn dofs_fixed_pins_later_timesteps_to_timestep_zero() {
        let json = r#"{
            "basic_info": { "n_steps": 3, "start_fixed": true, "dofs_fixed": [1] },
            "costs": [],
            "constraints": [],
            "init_info": { "type": "stationary" }
        }"#;
        let pci: ProblemConstructionInfo = serde_json::from_str(json).unwrap();
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let problem = Problem::build(&pci, &arm, &checker).unwrap();

        // 3 start_fixed rows + 2 dof_fixed rows (timesteps 1 and 2)
        assert_eq!(problem.constraints.len(), 5);
        let linear_eq_rows = problem.constraints.iter().filter(|c| matches!(c, Constraint::LinearEq(_))).count();
        assert_eq!(linear_eq_rows, 2);
    }

    #[test]
    fn trajectory_extracts_one_row_per_timestep() {
        let pci = joint_only_pci();
        let arm = PlanarArm::new();
        let checker = NullCollisionChecker::default();
        let problem = Problem::build(&pci, &arm, &checker).unwrap();
        let traj = problem.trajectory(&problem.init_x);
        assert_eq!(traj.len(), 4);
        assert_eq!(traj[0].len(), 3);
    }
}

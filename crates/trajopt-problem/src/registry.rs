//! The cost/constraint factory registry (§4.6, §6): turns one JSON
//! `{ type, name?, params{} }` entry into the matching `trajopt_costs`
//! variant. Each `kind` string is handled directly by a `match` arm rather
//! than through a dynamic registration table — the set of kinds is fixed
//! by §6's JSON format, so there is nothing to register at runtime.

use serde_json::Value;
use trajopt_belief::BeliefRobotModel;
use trajopt_collision::{CastCollisionEvaluator, SigmaPtsCollisionEvaluator, SingleTimestepCollisionEvaluator};
use trajopt_core::{TrajOptError, TrajOptResult, Variable};
use trajopt_costs::{
    covariance_weights, CartPoseConstraint, CartPoseCost, CartVelConstraint, CollisionCost, Constraint, ControlCnt, ControlCost, Cost, CovarianceCost,
    FixedConstraint, JointPosCost, JointVelCost,
};
use trajopt_kinematics::{CollisionChecker, Quat, RobotModel};

use crate::config::TermInfo;
use crate::layout::VariableLayout;

fn get<'a>(params: &'a Value, key: &str) -> TrajOptResult<&'a Value> {
    params.get(key).ok_or_else(|| TrajOptError::Config(format!("missing param '{key}'")))
}

fn get_usize(params: &Value, key: &str) -> TrajOptResult<usize> {
    get(params, key)?.as_u64().map(|v| v as usize).ok_or_else(|| TrajOptError::Config(format!("param '{key}' must be a non-negative integer")))
}

fn get_f64_vec(params: &Value, key: &str) -> TrajOptResult<Vec<f64>> {
    get(params, key)?
        .as_array()
        .ok_or_else(|| TrajOptError::Config(format!("param '{key}' must be an array")))?
        .iter()
        .map(|v| v.as_f64().ok_or_else(|| TrajOptError::Config(format!("param '{key}' must contain only numbers"))))
        .collect()
}

fn get_f64_array<const N: usize>(params: &Value, key: &str) -> TrajOptResult<[f64; N]> {
    let v = get_f64_vec(params, key)?;
    let len = v.len();
    v.try_into().map_err(|_| TrajOptError::Config(format!("param '{key}' must have exactly {N} entries, got {len}")))
}

fn get_string(params: &Value, key: &str) -> TrajOptResult<String> {
    get(params, key)?.as_str().map(str::to_string).ok_or_else(|| TrajOptError::Config(format!("param '{key}' must be a string")))
}

fn get_f64_default(params: &Value, key: &str, default: f64) -> f64 {
    params.get(key).and_then(Value::as_f64).unwrap_or(default)
}

fn control_vars_and<F: Fn(&[f64]) -> Vec<f64>>(layout: &VariableLayout, per_row: &[f64], repeat: F) -> TrajOptResult<(Vec<Variable>, Vec<f64>)> {
    let control = layout.control.as_ref().ok_or(TrajOptError::Config("this term requires basic_info.belief_space = true".to_string()))?;
    let vars: Vec<Variable> = control.iter().flat_map(|row| row.iter().cloned()).collect();
    let values: Vec<f64> = control.iter().flat_map(|_| repeat(per_row)).collect();
    Ok((vars, values))
}

/// Builds one [`Cost`] from a cost-info entry. `belief_space` decides
/// whether `collision`/`continuous_collision` check single configurations
/// or sigma points — in belief mode the sigma-point evaluator's
/// `multi_cast_vs_all` already sweeps the spread a continuous cast would
/// check, so both JSON kinds resolve to the same evaluator there.
pub fn build_cost<'a>(
    info: &TermInfo,
    layout: &VariableLayout,
    model: &'a dyn RobotModel,
    belief_model: Option<&'a dyn BeliefRobotModel>,
    checker: &'a dyn CollisionChecker,
) -> TrajOptResult<Cost<'a>> {
    let name = info.name.clone().unwrap_or_else(|| info.kind.clone());
    match info.kind.as_str() {
        "joint_pos" => {
            let t = get_usize(&info.params, "timestep")?;
            let vals = get_f64_vec(&info.params, "vals")?;
            let coeffs = get_f64_vec(&info.params, "coeffs")?;
            let vars = layout.joint.row(t).to_vec();
            Ok(Cost::JointPos(JointPosCost::new(name, vars, vals, coeffs)))
        }
        "joint_vel" => {
            let coeffs = get_f64_vec(&info.params, "coeffs")?;
            Ok(Cost::JointVel(JointVelCost::from_joint_block(name, &layout.joint, &coeffs)))
        }
        "control" => {
            let coeffs = get_f64_vec(&info.params, "coeffs")?;
            let (vars, weights) = control_vars_and(layout, &coeffs, |c| c.to_vec())?;
            Ok(Cost::Control(ControlCost::new(name, vars, weights)))
        }
        "covariance" => {
            let q_diag = get_f64_vec(&info.params, "q_diag")?;
            let cov = layout.cov.as_ref().ok_or(TrajOptError::Config("covariance cost requires basic_info.belief_space = true".to_string()))?;
            let weights_one_row = covariance_weights(layout.n_dof, &q_diag);
            let vars: Vec<Variable> = cov.iter().flat_map(|row| row.iter().cloned()).collect();
            let weights: Vec<f64> = cov.iter().flat_map(|_| weights_one_row.clone()).collect();
            Ok(Cost::Covariance(CovarianceCost::new(name, vars, weights)))
        }
        "pose" => {
            let t = get_usize(&info.params, "timestep")?;
            let link = get_string(&info.params, "link")?;
            let xyz = get_f64_array::<3>(&info.params, "xyz")?;
            let wxyz: Quat = get_f64_array::<4>(&info.params, "wxyz")?;
            let coeffs = get_f64_array::<6>(&info.params, "coeffs")?;
            let vars = layout.joint.row(t).to_vec();
            Ok(Cost::CartPose(CartPoseCost::new(name, model, link, vars, xyz, wxyz, coeffs)))
        }
        "collision" if belief_model.is_some() => {
            let dist_pen = get_f64_default(&info.params, "dist_pen", 0.05);
            let coeff = get_f64_default(&info.params, "coeff", 1.0);
            let t = get_usize(&info.params, "timestep")?;
            let theta_vars = layout.theta_vars(t);
            let evaluator = SigmaPtsCollisionEvaluator::new(belief_model.unwrap(), checker, theta_vars);
            Ok(Cost::Collision(CollisionCost::new(name, Box::new(evaluator), dist_pen, coeff)))
        }
        "continuous_collision" if belief_model.is_some() => {
            let dist_pen = get_f64_default(&info.params, "dist_pen", 0.05);
            let coeff = get_f64_default(&info.params, "coeff", 1.0);
            let t = get_usize(&info.params, "timestep")?;
            let theta_vars = layout.theta_vars(t);
            let evaluator = SigmaPtsCollisionEvaluator::new(belief_model.unwrap(), checker, theta_vars);
            Ok(Cost::Collision(CollisionCost::new(name, Box::new(evaluator), dist_pen, coeff)))
        }
        "collision" => {
            let dist_pen = get_f64_default(&info.params, "dist_pen", 0.05);
            let coeff = get_f64_default(&info.params, "coeff", 1.0);
            let t = get_usize(&info.params, "timestep")?;
            let vars = layout.joint.row(t).to_vec();
            let evaluator = SingleTimestepCollisionEvaluator::new(model, checker, vars);
            Ok(Cost::Collision(CollisionCost::new(name, Box::new(evaluator), dist_pen, coeff)))
        }
        "continuous_collision" => {
            let dist_pen = get_f64_default(&info.params, "dist_pen", 0.05);
            let coeff = get_f64_default(&info.params, "coeff", 1.0);
            let t = get_usize(&info.params, "timestep")?;
            if t + 1 >= layout.n_steps {
                return Err(TrajOptError::Config(format!("continuous_collision timestep {t} has no successor")));
            }
            let vars0 = layout.joint.row(t).to_vec();
            let vars1 = layout.joint.row(t + 1).to_vec();
            let evaluator = CastCollisionEvaluator::new(model, checker, vars0, vars1);
            Ok(Cost::Collision(CollisionCost::new(name, Box::new(evaluator), dist_pen, coeff)))
        }
        other => Err(TrajOptError::Config(format!("unknown cost type '{other}'"))),
    }
}

/// Builds the [`Constraint`]s from one constraint-info entry. Most kinds
/// produce exactly one; `joint` pins every coordinate of a timestep's
/// joint block and so produces one [`FixedConstraint`] per dof.
pub fn build_constraint<'a>(
    info: &TermInfo,
    layout: &VariableLayout,
    model: &'a dyn RobotModel,
) -> TrajOptResult<Vec<Constraint<'a>>> {
    let name = info.name.clone().unwrap_or_else(|| info.kind.clone());
    match info.kind.as_str() {
        "pose" => {
            let t = get_usize(&info.params, "timestep")?;
            let link = get_string(&info.params, "link")?;
            let xyz = get_f64_array::<3>(&info.params, "xyz")?;
            let wxyz: Quat = get_f64_array::<4>(&info.params, "wxyz")?;
            let vars = layout.joint.row(t).to_vec();
            Ok(vec![Constraint::CartPose(CartPoseConstraint::new(name, model, link, vars, xyz, wxyz))])
        }
        "cart_vel" => {
            let link = get_string(&info.params, "link")?;
            let d_max = get_f64_default(&info.params, "d_max", 0.05);
            if layout.n_steps < 2 {
                return Err(TrajOptError::Config("cart_vel constraint requires n_steps >= 2".to_string()));
            }
            let pairs = (0..layout.n_steps - 1).map(|t| (layout.joint.row(t).to_vec(), layout.joint.row(t + 1).to_vec())).collect();
            Ok(vec![Constraint::CartVel(CartVelConstraint::new(name, model, link, pairs, d_max))])
        }
        "control" => {
            let u_min = get_f64_vec(&info.params, "u_min")?;
            let u_max = get_f64_vec(&info.params, "u_max")?;
            let (vars, min_rep) = control_vars_and(layout, &u_min, |c| c.to_vec())?;
            let (_, max_rep) = control_vars_and(layout, &u_max, |c| c.to_vec())?;
            Ok(vec![Constraint::Control(ControlCnt::new(name, vars, min_rep, max_rep))])
        }
        "joint" => {
            let t = get_usize(&info.params, "timestep")?;
            let vals = get_f64_vec(&info.params, "vals")?;
            let vars = layout.joint.row(t).to_vec();
            if vars.len() != vals.len() {
                return Err(TrajOptError::Config(format!("joint constraint 'vals' has {} entries, expected n_dof={}", vals.len(), vars.len())));
            }
            Ok(vars
                .into_iter()
                .zip(vals.into_iter())
                .enumerate()
                .map(|(j, (v, target))| Constraint::Fixed(FixedConstraint::new(format!("{name}_{t}_{j}"), v, target)))
                .collect())
        }
        other => Err(TrajOptError::Config(format!("unknown constraint type '{other}'"))),
    }
}

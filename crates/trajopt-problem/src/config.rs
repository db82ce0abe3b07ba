//! The declarative JSON problem format (§4.6, §6): `{ basic_info, costs[],
//! constraints[], init_info }`.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ProblemConstructionInfo {
    pub basic_info: BasicInfo,
    #[serde(default)]
    pub costs: Vec<TermInfo>,
    #[serde(default)]
    pub constraints: Vec<TermInfo>,
    pub init_info: InitInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BasicInfo {
    pub n_steps: usize,
    #[serde(default)]
    pub start_fixed: bool,
    #[serde(default)]
    pub dofs_fixed: Vec<usize>,
    #[serde(default)]
    pub belief_space: bool,
    #[serde(default)]
    pub manip: Option<String>,
    #[serde(default)]
    pub robot: Option<String>,
}

/// One cost or constraint entry: `{ type, name?, params{} }`. `params`
/// stays an untyped JSON value since its shape depends on `kind` — the
/// registry in `registry.rs` decodes it per `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct TermInfo {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "serde_json::Value::default")]
    pub params: serde_json::Value,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InitInfo {
    Stationary,
    GivenTraj { data: Vec<Vec<f64>> },
    StraightLine { endpoint: Vec<f64> },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_minimal_joint_only_problem() {
        let json = r#"{
            "basic_info": { "n_steps": 5, "start_fixed": true, "dofs_fixed": [2] },
            "costs": [{ "type": "joint_vel", "params": { "coeffs": [1.0, 1.0, 1.0] } }],
            "constraints": [],
            "init_info": { "type": "straight_line", "endpoint": [0.5, 0.0, 0.0] }
        }"#;
        let pci: ProblemConstructionInfo = serde_json::from_str(json).unwrap();
        assert_eq!(pci.basic_info.n_steps, 5);
        assert!(pci.basic_info.start_fixed);
        assert_eq!(pci.basic_info.dofs_fixed, vec![2]);
        assert_eq!(pci.costs.len(), 1);
        match pci.init_info {
            InitInfo::StraightLine { endpoint } => assert_eq!(endpoint, vec![0.5, 0.0, 0.0]),
            _ => panic!("expected straight_line"),
        }
    }

    #[test]
    fn belief_space_defaults_to_false() {
        let json = r#"{
            "basic_info": { "n_steps": 3 },
            "init_info": { "type": "stationary" }
        }"#;
        let pci: ProblemConstructionInfo = serde_json::from_str(json).unwrap();
        assert!(!pci.basic_info.belief_space);
    }
}

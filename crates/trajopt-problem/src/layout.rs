//! Variable layout construction and naming (§3, §4.6): `j_i_j` for joints,
//! `cov_i_ii_jj` for lower-triangular √Σ entries, `u_i_j` for controls.

use trajopt_core::{Variable, VariableArray};

/// The full variable layout for one problem. Joint-only mode populates
/// only `joint`; belief mode additionally populates `cov` and `control`,
/// one packed row per timestep (the last timestep's `control` row exists
/// — so every row has the same width, matching §3's single `VariableArray`
/// of width `n_theta + n_dof` — but is never wired to a dynamics
/// constraint, since no transition starts there).
pub struct VariableLayout {
    pub n_steps: usize,
    pub n_dof: usize,
    pub joint: VariableArray,
    pub cov: Option<Vec<Vec<Variable>>>,
    pub control: Option<Vec<Vec<Variable>>>,
}

impl VariableLayout {
    /// Builds the layout, allocating variable indices in the order: every
    /// timestep's joint block, then (belief mode only) every timestep's
    /// covariance block, then every timestep's control block.
    pub fn build(n_steps: usize, n_dof: usize, belief_space: bool) -> Self {
        let mut next_index = 0usize;
        let mut alloc = |name: String| {
            let v = Variable::new(next_index, name);
            next_index += 1;
            v
        };

        let mut joint_data = Vec::with_capacity(n_steps * n_dof);
        for t in 0..n_steps {
            for j in 0..n_dof {
                joint_data.push(alloc(format!("j_{t}_{j}")));
            }
        }
        let joint = VariableArray::from_row_major(n_steps, n_dof, joint_data);

        if !belief_space {
            return Self { n_steps, n_dof, joint, cov: None, control: None };
        }

        let mut cov = Vec::with_capacity(n_steps);
        for t in 0..n_steps {
            let mut row = Vec::with_capacity(n_dof * (n_dof + 1) / 2);
            for jj in 0..n_dof {
                for ii in jj..n_dof {
                    row.push(alloc(format!("cov_{t}_{ii}_{jj}")));
                }
            }
            cov.push(row);
        }

        let mut control = Vec::with_capacity(n_steps);
        for t in 0..n_steps {
            let row: Vec<Variable> = (0..n_dof).map(|j| alloc(format!("u_{t}_{j}"))).collect();
            control.push(row);
        }

        Self { n_steps, n_dof, joint, cov: Some(cov), control: Some(control) }
    }

    pub fn n_vars(&self) -> usize {
        let mut n = self.n_steps * self.n_dof;
        if let Some(cov) = &self.cov {
            n += cov.iter().map(Vec::len).sum::<usize>();
        }
        if let Some(control) = &self.control {
            n += control.iter().map(Vec::len).sum::<usize>();
        }
        n
    }

    /// The packed belief vector `[j_t | cov_t]` for timestep `t`, belief
    /// mode only.
    pub fn theta_vars(&self, t: usize) -> Vec<Variable> {
        let mut theta = self.joint.row(t).to_vec();
        if let Some(cov) = &self.cov {
            theta.extend(cov[t].iter().cloned());
        }
        theta
    }

    /// Every variable this layout allocated, ordered by index (joint block,
    /// then covariance block, then control block, matching the allocation
    /// order in [`VariableLayout::build`]) — the order a primal vector's
    /// bounds and seed values must be written in.
    pub fn all_vars(&self) -> Vec<Variable> {
        let mut vars: Vec<Variable> = self.joint.as_slice().to_vec();
        if let Some(cov) = &self.cov {
            vars.extend(cov.iter().flatten().cloned());
        }
        if let Some(control) = &self.control {
            vars.extend(control.iter().flatten().cloned());
        }
        vars
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joint_only_layout_names_match_convention() {
        let layout = VariableLayout::build(3, 2, false);
        assert_eq!(layout.joint.at(0, 0).name(), "j_0_0");
        assert_eq!(layout.joint.at(2, 1).name(), "j_2_1");
        assert_eq!(layout.n_vars(), 6);
        assert!(layout.cov.is_none());
    }

    #[test]
    fn belief_layout_packs_joint_then_cov_then_control() {
        let layout = VariableLayout::build(2, 3, true);
        // n_theta = 3 + 6 = 9, plus 3 controls, per timestep width 12
        assert_eq!(layout.n_vars(), 2 * (9 + 3));
        let cov = layout.cov.as_ref().unwrap();
        assert_eq!(cov[0][0].name(), "cov_0_0_0");
        assert_eq!(cov[0][1].name(), "cov_0_1_0");
        assert_eq!(cov[0][2].name(), "cov_0_2_0");
        assert_eq!(cov[0][3].name(), "cov_0_1_1");
        let control = layout.control.as_ref().unwrap();
        assert_eq!(control[1][2].name(), "u_1_2");
    }

    #[test]
    fn all_vars_is_sorted_by_index() {
        let layout = VariableLayout::build(2, 3, true);
        let vars = layout.all_vars();
        assert_eq!(vars.len(), layout.n_vars());
        for (i, v) in vars.iter().enumerate() {
            assert_eq!(v.index(), i);
        }
    }

    #[test]
    fn theta_vars_concatenates_joint_and_cov_for_one_timestep() {
        let layout = VariableLayout::build(2, 3, true);
        let theta = layout.theta_vars(1);
        assert_eq!(theta.len(), 9);
        assert_eq!(theta[0].name(), "j_1_0");
        assert_eq!(theta[3].name(), "cov_1_0_0");
    }
}

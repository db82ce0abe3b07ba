//! Collision query records and the [`CollisionChecker`] trait (§4.8, §6).

/// Per-sigma-point mixture weights attached to a collision found against a
/// belief-space (sigma-point) query. `alpha[i]` weights `instance_ind[i]`'s
/// contribution to the collision's Jacobian when the caller builds a
/// distance expression against a belief trajectory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MixInfo {
    pub alpha: Vec<f64>,
    pub instance_ind: Vec<usize>,
}

/// One detected (or near-) collision between two links, or between a link
/// and the static environment (in which case `link_b` is empty).
#[derive(Debug, Clone, PartialEq)]
pub struct Collision {
    pub link_a: String,
    pub link_b: String,
    pub pt_a: [f64; 3],
    pub pt_b: [f64; 3],
    /// Unit normal pointing from B's surface toward A's surface.
    pub normal_b2a: [f64; 3],
    /// Signed distance: negative means penetrating.
    pub distance: f64,
    /// Scalar weight applied by the caller when folding this collision into
    /// a hinge penalty (distinct from the per-sigma-point `mix_info`
    /// weights, which apply only inside belief-space linearization).
    pub weight: f64,
    /// Parametric time in `[0, 1]` along a continuous-cast query; `0.0` for
    /// single-timestep and multi-cast queries.
    pub time: f64,
    /// Present only for multi-cast (sigma-point) queries.
    pub mix_info: Option<MixInfo>,
}

impl Collision {
    /// A single-timestep collision with no cast/mixture metadata.
    pub fn single_timestep(
        link_a: impl Into<String>,
        link_b: impl Into<String>,
        pt_a: [f64; 3],
        pt_b: [f64; 3],
        normal_b2a: [f64; 3],
        distance: f64,
    ) -> Self {
        Self {
            link_a: link_a.into(),
            link_b: link_b.into(),
            pt_a,
            pt_b,
            normal_b2a,
            distance,
            weight: 1.0,
            time: 0.0,
            mix_info: None,
        }
    }
}

/// Collision queries against the static environment and link self-pairs.
///
/// Every method takes the full joint trajectory/endpoints it needs rather
/// than relying on a previously-set robot state, since the SQP driver and
/// the collision-linearization pipeline both need to probe configurations
/// without disturbing each other.
pub trait CollisionChecker {
    /// Checks `links` against everything else at a single configuration.
    fn links_vs_all(&self, links: &[String], dof_values: &[f64]) -> Vec<Collision>;

    /// Continuous (swept) collision check of `links` moving from
    /// `dof_values0` to `dof_values1`. Returned collisions carry a `time`
    /// in `[0, 1]` locating the contact along the sweep.
    fn cast_vs_all(&self, links: &[String], dof_values0: &[f64], dof_values1: &[f64]) -> Vec<Collision>;

    /// Collision check against a mixture of configurations (sigma points
    /// of a belief distribution). Returned collisions carry `mix_info`
    /// weighting each configuration's contribution.
    fn multi_cast_vs_all(&self, links: &[String], dof_values: &[Vec<f64>]) -> Vec<Collision>;

    /// Sets the distance threshold beyond which pairs are not reported.
    fn set_contact_distance(&mut self, distance: f64);
}

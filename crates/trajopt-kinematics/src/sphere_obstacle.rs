//! A single spherical obstacle, for collision-avoidance tests and example
//! configs (§8, scenario 3) that don't need a full geometric collision
//! backend. Checks only the `"finger"` point [`PlanarArm`](crate::PlanarArm)
//! exposes — good enough for the core's collision-linearization pipeline,
//! which only ever asks a [`CollisionChecker`] for per-link contacts.

use crate::collision::{Collision, CollisionChecker};
use crate::planar_arm::PlanarArm;

/// A static sphere obstacle checked against [`PlanarArm`]'s end-effector
/// point. Reports at most one contact per query, with `link_b` left empty
/// (a link-vs-environment contact, per §3's collision record).
#[derive(Debug, Clone)]
pub struct SphereObstacleChecker {
    center: [f64; 3],
    radius: f64,
    contact_distance: f64,
}

impl SphereObstacleChecker {
    pub fn new(center: [f64; 3], radius: f64) -> Self {
        Self {
            center,
            radius,
            contact_distance: 0.25,
        }
    }

    fn contact_at(&self, dof_values: &[f64]) -> Option<Collision> {
        let theta: [f64; 3] = dof_values.try_into().ok()?;
        let (x, y) = PlanarArm::end_effector_xy(&theta);
        let pt = [x, y, 0.0];
        let d = [pt[0] - self.center[0], pt[1] - self.center[1], pt[2] - self.center[2]];
        let dist_to_center = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        let distance = dist_to_center - self.radius;
        if distance > self.contact_distance {
            return None;
        }
        let normal_b2a = if dist_to_center > 1e-9 {
            [d[0] / dist_to_center, d[1] / dist_to_center, d[2] / dist_to_center]
        } else {
            [1.0, 0.0, 0.0]
        };
        Some(Collision {
            link_a: "finger".to_string(),
            link_b: String::new(),
            pt_a: [0.0, 0.0, 0.0],
            pt_b: self.center,
            normal_b2a,
            distance,
            weight: 1.0,
            time: 0.0,
            mix_info: None,
        })
    }
}

impl CollisionChecker for SphereObstacleChecker {
    fn links_vs_all(&self, links: &[String], dof_values: &[f64]) -> Vec<Collision> {
        if !links.iter().any(|l| l == "finger") {
            return Vec::new();
        }
        self.contact_at(dof_values).into_iter().collect()
    }

    fn cast_vs_all(&self, links: &[String], dof_values0: &[f64], dof_values1: &[f64]) -> Vec<Collision> {
        // Sample the sweep at a handful of interior points and keep the
        // deepest contact, tagging it with the parametric `time` it was
        // found at, per §4.8's cast-collision contract.
        if !links.iter().any(|l| l == "finger") {
            return Vec::new();
        }
        const SAMPLES: usize = 5;
        let mut best: Option<Collision> = None;
        for i in 0..=SAMPLES {
            let t = i as f64 / SAMPLES as f64;
            let interp: Vec<f64> = dof_values0.iter().zip(dof_values1.iter()).map(|(a, b)| a + t * (b - a)).collect();
            if let Some(mut col) = self.contact_at(&interp) {
                col.time = t;
                if best.as_ref().map(|b| col.distance < b.distance).unwrap_or(true) {
                    best = Some(col);
                }
            }
        }
        best.into_iter().collect()
    }

    fn multi_cast_vs_all(&self, links: &[String], dof_values: &[Vec<f64>]) -> Vec<Collision> {
        if !links.iter().any(|l| l == "finger") || dof_values.is_empty() {
            return Vec::new();
        }
        let mut alpha = Vec::new();
        let mut instance_ind = Vec::new();
        let weight = 1.0 / dof_values.len() as f64;
        let mut worst_distance = f64::INFINITY;
        let mut worst: Option<Collision> = None;
        for (i, dv) in dof_values.iter().enumerate() {
            if let Some(col) = self.contact_at(dv) {
                alpha.push(weight);
                instance_ind.push(i);
                if col.distance < worst_distance {
                    worst_distance = col.distance;
                    worst = Some(col);
                }
            }
        }
        match worst {
            Some(mut col) => {
                col.mix_info = Some(crate::collision::MixInfo { alpha, instance_ind });
                vec![col]
            }
            None => Vec::new(),
        }
    }

    fn set_contact_distance(&mut self, distance: f64) {
        self.contact_distance = distance;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_contact_when_arm_is_far_from_the_sphere() {
        let checker = SphereObstacleChecker::new([10.0, 10.0, 0.0], 0.05);
        let cols = checker.links_vs_all(&["finger".to_string()], &[0.0, 0.0, 0.0]);
        assert!(cols.is_empty());
    }

    #[test]
    fn reports_penetrating_contact() {
        let theta = [0.0, 0.0, 0.0];
        let (x, y) = PlanarArm::end_effector_xy(&theta);
        let checker = SphereObstacleChecker::new([x, y, 0.0], 0.05);
        let cols = checker.links_vs_all(&["finger".to_string()], &theta);
        assert_eq!(cols.len(), 1);
        assert!(cols[0].distance < 0.0);
    }

    #[test]
    fn cast_reports_a_time_in_unit_interval() {
        let checker = SphereObstacleChecker::new([0.2, 0.0, 0.0], 0.05);
        let cols = checker.cast_vs_all(&["finger".to_string()], &[0.0, 0.0, 0.0], &[0.5, 0.0, 0.0]);
        if let Some(col) = cols.first() {
            assert!((0.0..=1.0).contains(&col.time));
        }
    }
}

//! A [`CollisionChecker`] that never reports collisions, for problems that
//! disable collision avoidance and for unit tests of the cost/constraint
//! layer that don't want a real environment.

use crate::collision::{Collision, CollisionChecker};

#[derive(Debug, Clone, Default)]
pub struct NullCollisionChecker {
    contact_distance: f64,
}

impl CollisionChecker for NullCollisionChecker {
    fn links_vs_all(&self, _links: &[String], _dof_values: &[f64]) -> Vec<Collision> {
        Vec::new()
    }

    fn cast_vs_all(&self, _links: &[String], _dof_values0: &[f64], _dof_values1: &[f64]) -> Vec<Collision> {
        Vec::new()
    }

    fn multi_cast_vs_all(&self, _links: &[String], _dof_values: &[Vec<f64>]) -> Vec<Collision> {
        Vec::new()
    }

    fn set_contact_distance(&mut self, distance: f64) {
        self.contact_distance = distance;
    }
}

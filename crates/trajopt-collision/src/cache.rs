//! Caches the last collision query per evaluator.
//!
//! The original implementation keys its cache on `vecSum(x)` — the sum of
//! the primal vector's entries — which collides whenever two different
//! configurations happen to sum to the same value. Here the cache key is
//! instead a content hash of every coordinate actually queried, so two
//! different configurations never alias to the same cached result.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A single-entry cache: only the most recent query is remembered, which
/// is all `CalcDists` and `CalcDistExpressions` being called back-to-back
/// on the same `x` need.
#[derive(Debug, Default)]
pub struct CollisionCache<T> {
    key: Option<u64>,
    value: Option<T>,
}

fn content_hash(x: &[f64]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for v in x {
        v.to_bits().hash(&mut hasher);
    }
    hasher.finish()
}

impl<T: Clone> CollisionCache<T> {
    pub fn new() -> Self {
        Self {
            key: None,
            value: None,
        }
    }

    /// Returns the cached value for `x` if present, otherwise computes it
    /// with `compute`, caches it, and returns it.
    pub fn get_or_compute(&mut self, x: &[f64], compute: impl FnOnce() -> T) -> T {
        let key = content_hash(x);
        if self.key == Some(key) {
            if let Some(v) = &self.value {
                return v.clone();
            }
        }
        let value = compute();
        self.key = Some(key);
        self.value = Some(value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn repeated_queries_with_the_same_x_hit_the_cache() {
        let mut cache = CollisionCache::new();
        let calls = Cell::new(0);
        let x = vec![1.0, 2.0, 3.0];

        let first = cache.get_or_compute(&x, || {
            calls.set(calls.get() + 1);
            vec![42]
        });
        let second = cache.get_or_compute(&x, || {
            calls.set(calls.get() + 1);
            vec![99]
        });

        assert_eq!(first, second);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn different_x_misses_the_cache() {
        let mut cache = CollisionCache::new();
        let calls = Cell::new(0);

        cache.get_or_compute(&[1.0, 2.0], || {
            calls.set(calls.get() + 1);
            1
        });
        cache.get_or_compute(&[2.0, 1.0], || {
            calls.set(calls.get() + 1);
            2
        });

        assert_eq!(calls.get(), 2);
    }
}

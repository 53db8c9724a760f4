//! BVH build configuration.

use crate::{GeometryError, GeometryResult};
use serde::{Deserialize, Serialize};

/// Hard cap on BVH depth. Traversal sizes its fixed stack from this.
pub const MAX_DEPTH: usize = 64;

/// Upper bound on SAH buckets per axis.
pub const MAX_BUCKETS: usize = 64;

/// Tuning knobs for [`crate::BvhTree`] construction.
///
/// Missing fields fall back to the defaults when deserialized, so a scene
/// description only has to name what it overrides.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BvhConfig {
    /// Ranges at this depth become leaves regardless of size
    pub max_depth: usize,
    /// Ranges with at most this many primitives become leaves
    pub max_leaf_size: usize,
    /// SAH buckets evaluated per axis
    pub bucket_count: usize,
}

impl Default for BvhConfig {
    fn default() -> Self {
        Self {
            max_depth: MAX_DEPTH,
            max_leaf_size: 2,
            bucket_count: 16,
        }
    }
}

impl BvhConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_leaf_size(mut self, max_leaf_size: usize) -> Self {
        self.max_leaf_size = max_leaf_size;
        self
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Check that every field is in range.
    pub fn validate(&self) -> GeometryResult<()> {
        if self.max_depth == 0 || self.max_depth > MAX_DEPTH {
            return Err(GeometryError::InvalidConfig(format!(
                "max_depth must be in 1..={MAX_DEPTH}, got {}",
                self.max_depth
            )));
        }
        if self.max_leaf_size == 0 {
            return Err(GeometryError::InvalidConfig(
                "max_leaf_size must be at least 1".to_string(),
            ));
        }
        if !(2..=MAX_BUCKETS).contains(&self.bucket_count) {
            return Err(GeometryError::InvalidConfig(format!(
                "bucket_count must be in 2..={MAX_BUCKETS}, got {}",
                self.bucket_count
            )));
        }
        Ok(())
    }
}

//! Chunk size policy
//!
//! Maps a dataset's row count to the number of rows sent per bulk call.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// One tier of the policy: datasets with more than `above` rows use `chunk_size`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkTier {
    /// Exclusive lower bound on the row count
    pub above: usize,
    /// Rows per chunk for datasets in this tier
    pub chunk_size: usize,
}

/// Tiered chunk size policy
///
/// Tiers are checked from the largest `above` bound down; the first tier whose
/// bound the row count exceeds wins. Row counts matched by no tier use
/// `default_size`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPolicy {
    /// Row-count tiers
    #[serde(default = "default_tiers")]
    pub tiers: Vec<ChunkTier>,

    /// Chunk size when no tier matches
    #[serde(default = "default_size")]
    pub default_size: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            tiers: default_tiers(),
            default_size: default_size(),
        }
    }
}

fn default_tiers() -> Vec<ChunkTier> {
    vec![
        ChunkTier {
            above: 100_000,
            chunk_size: 3_000,
        },
        ChunkTier {
            above: 10_000,
            chunk_size: 5_000,
        },
    ]
}

fn default_size() -> usize {
    10_000
}

/// Result of planning a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPlan {
    /// Rows per chunk
    pub chunk_size: usize,
    /// Number of chunks (the last may be shorter)
    pub chunk_count: usize,
}

impl ChunkPolicy {
    /// Create a policy from explicit tiers
    pub fn new(tiers: Vec<ChunkTier>, default_size: usize) -> Self {
        Self {
            tiers,
            default_size,
        }
    }

    /// Reject policies that could never make progress
    pub fn validate(&self) -> Result<()> {
        if self.default_size == 0 {
            return Err(Error::invalid_value(
                "chunking.default_size",
                "chunk size must be greater than zero",
            ));
        }
        if let Some(tier) = self.tiers.iter().find(|t| t.chunk_size == 0) {
            return Err(Error::invalid_value(
                "chunking.tiers",
                format!(
                    "tier above {} rows has a chunk size of zero",
                    tier.above
                ),
            ));
        }
        Ok(())
    }

    /// Chunk size for a dataset of `row_count` rows
    pub fn plan(&self, row_count: usize) -> usize {
        self.tiers
            .iter()
            .filter(|tier| row_count > tier.above)
            .max_by_key(|tier| tier.above)
            .map_or(self.default_size, |tier| tier.chunk_size)
    }

    /// Chunk size and chunk count for a dataset of `row_count` rows
    pub fn plan_chunks(&self, row_count: usize) -> ChunkPlan {
        let chunk_size = self.plan(row_count);
        let chunk_count = if row_count == 0 {
            0
        } else {
            row_count.div_ceil(chunk_size.max(1))
        };
        ChunkPlan {
            chunk_size,
            chunk_count,
        }
    }
}

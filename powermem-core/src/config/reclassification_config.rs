//! Type-promotion thresholds consumed by the reclassification pass (§4.4).
//!
//! These mirror `RetentionConfig`'s `*_threshold` fields; kept as a distinct
//! config struct because reclassification can run on a separate cadence
//! (batch sweep) from the inline retention write-back.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReclassificationConfig {
    pub enabled: bool,
    /// Minimum `review_count` before a record is eligible for `long_term` promotion.
    pub min_review_count_for_long_term: u32,
    /// How many records a single sweep batch considers.
    pub batch_size: usize,
}

impl Default for ReclassificationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_review_count_for_long_term: 2,
            batch_size: 500,
        }
    }
}

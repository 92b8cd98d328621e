//! The retention block carried in `metadata` (§4.5). The decay/reinforcement
//! math itself lives in `powermem-retention`; this crate only owns the shape
//! so both the retention engine and the record model agree on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryType {
    Working,
    ShortTerm,
    LongTerm,
}

impl Default for MemoryType {
    fn default() -> Self {
        Self::Working
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionBlock {
    pub memory_type: MemoryType,
    pub initial_retention: f64,
    pub current_retention: f64,
    pub decay_rate: f64,
    pub importance_score: f64,
    pub reinforcement_factor: f64,
    pub review_count: u32,
    pub access_count: u32,
    pub last_reviewed: DateTime<Utc>,
    pub next_review: DateTime<Utc>,
    pub review_schedule: Vec<DateTime<Utc>>,
    /// Set by the reclassification pass when `current_retention` has fallen
    /// below the forget threshold; the record still exists until an explicit
    /// sweep deletes it.
    pub should_forget: bool,
}

impl RetentionBlock {
    /// `initial_retention = 0.5 + 0.5 * importance_score` (§4.4 step 7),
    /// with a 5-point review schedule at `{+1h, +5h, +24h, +72h, +168h}`.
    pub fn new_for_add(
        importance_score: f64,
        decay_rate: f64,
        reinforcement_factor: f64,
        now: DateTime<Utc>,
    ) -> Self {
        let initial_retention = (0.5 + 0.5 * importance_score).clamp(0.0, 1.0);
        let review_schedule = [1i64, 5, 24, 72, 168]
            .into_iter()
            .map(|hours| now + chrono::Duration::hours(hours))
            .collect::<Vec<_>>();
        let next_review = review_schedule[0];
        Self {
            memory_type: MemoryType::Working,
            initial_retention,
            current_retention: initial_retention,
            decay_rate,
            importance_score,
            reinforcement_factor,
            review_count: 0,
            access_count: 0,
            last_reviewed: now,
            next_review,
            review_schedule,
            should_forget: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_retention_follows_importance_score() {
        let block = RetentionBlock::new_for_add(0.0, 0.82, 0.3, Utc::now());
        assert!((block.initial_retention - 0.5).abs() < 1e-9);
        let block = RetentionBlock::new_for_add(1.0, 0.82, 0.3, Utc::now());
        assert!((block.initial_retention - 1.0).abs() < 1e-9);
    }

    #[test]
    fn review_schedule_has_five_entries_in_order() {
        let now = Utc::now();
        let block = RetentionBlock::new_for_add(0.4, 0.82, 0.3, now);
        assert_eq!(block.review_schedule.len(), 5);
        assert_eq!(block.next_review, block.review_schedule[0]);
        assert!(block.review_schedule.windows(2).all(|w| w[0] < w[1]));
    }
}

//! `intelligent.{enabled, initial_retention, decay_rate, reinforcement_factor, *_threshold}` (§6.5).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetentionConfig {
    pub enabled: bool,
    /// Seed retention for freshly-added memories before the importance-score multiplier.
    pub initial_retention: f64,
    /// `decay_constant` in the forgetting-curve formula; default `-ln(0.44)` (~0.82).
    pub decay_rate: f64,
    pub reinforcement_factor: f64,
    pub long_term_threshold: f64,
    pub short_term_threshold: f64,
    pub forget_threshold: f64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            initial_retention: 0.5,
            decay_rate: -(0.44f64).ln(),
            reinforcement_factor: 0.3,
            long_term_threshold: 0.8,
            short_term_threshold: 0.6,
            forget_threshold: 0.2,
        }
    }
}

use serde::{Deserialize, Serialize};

use super::defaults;

/// Adaptive confidence learning parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceConfig {
    /// Recency half-life applied to historical outcomes.
    pub half_life_days: f64,
    /// Cap on how much history may move a fresh estimate.
    pub max_historical_weight: f64,
    /// Bound on the per-strategy multiplicative adjustment.
    pub strategy_adjustment_cap: f64,
    pub baseline_success_rate: f64,
    /// Recompute the global calibration factor every N recorded decisions.
    pub calibration_interval: u64,
    /// Rolling window size of the per-strategy tracker.
    pub strategy_window: usize,
    pub min_strategy_samples: usize,
    /// Effective sample count at which history reaches half its weight.
    pub prior_strength: f64,
    pub outcome_retention_days: u64,
    pub max_outcomes_per_query: usize,
}

impl Default for ConfidenceConfig {
    fn default() -> Self {
        Self {
            half_life_days: defaults::DEFAULT_HALF_LIFE_DAYS,
            max_historical_weight: defaults::DEFAULT_MAX_HISTORICAL_WEIGHT,
            strategy_adjustment_cap: defaults::DEFAULT_STRATEGY_ADJUSTMENT_CAP,
            baseline_success_rate: defaults::DEFAULT_BASELINE_SUCCESS_RATE,
            calibration_interval: defaults::DEFAULT_CALIBRATION_INTERVAL,
            strategy_window: defaults::DEFAULT_STRATEGY_WINDOW,
            min_strategy_samples: defaults::DEFAULT_MIN_STRATEGY_SAMPLES,
            prior_strength: defaults::DEFAULT_PRIOR_STRENGTH,
            outcome_retention_days: defaults::DEFAULT_OUTCOME_RETENTION_DAYS,
            max_outcomes_per_query: defaults::DEFAULT_MAX_OUTCOMES_PER_QUERY,
        }
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::clamp_confidence;

/// Variance reported for a signature with no observations: that of Beta(1, 1).
pub const DEFAULT_VARIANCE: f64 = 1.0 / 12.0;

/// Learned confidence for one bucketed context signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidencePattern {
    pub signature: String,
    /// Always within [0.01, 0.99].
    pub base_confidence: f64,
    pub sample_count: u64,
    pub success_rate: f64,
    pub variance: f64,
    pub last_updated: DateTime<Utc>,
}

impl ConfidencePattern {
    pub fn new(signature: impl Into<String>, initial_confidence: f64) -> Self {
        Self {
            signature: signature.into(),
            base_confidence: clamp_confidence(initial_confidence),
            sample_count: 0,
            success_rate: 0.0,
            variance: DEFAULT_VARIANCE,
            last_updated: Utc::now(),
        }
    }

    /// Fold one observation in with learning rate `1 / sample_count`.
    pub fn observe(&mut self, score: f64, success: bool, at: DateTime<Utc>) {
        self.sample_count += 1;
        let rate = 1.0 / self.sample_count as f64;
        let delta = score - self.base_confidence;

        self.base_confidence = clamp_confidence(self.base_confidence + rate * delta);
        let hit = if success { 1.0 } else { 0.0 };
        self.success_rate += rate * (hit - self.success_rate);
        self.variance = if self.sample_count == 1 {
            DEFAULT_VARIANCE
        } else {
            (1.0 - rate) * (self.variance + rate * delta * delta)
        };
        self.last_updated = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_observation_moves_fully_to_score() {
        let mut p = ConfidencePattern::new("sig", 0.5);
        p.observe(1.0, true, Utc::now());
        assert_eq!(p.sample_count, 1);
        assert!((p.base_confidence - 0.99).abs() < 1e-12);
        assert!((p.success_rate - 1.0).abs() < 1e-12);
    }

    #[test]
    fn learning_rate_decreases_with_samples() {
        let mut p = ConfidencePattern::new("sig", 0.5);
        for _ in 0..9 {
            p.observe(0.5, true, Utc::now());
        }
        let before = p.base_confidence;
        p.observe(1.0, true, Utc::now());
        // Tenth sample moves the estimate by a tenth of the gap.
        assert!((p.base_confidence - (before + 0.05)).abs() < 1e-9);
    }

    #[test]
    fn confidence_never_leaves_bounds() {
        let mut p = ConfidencePattern::new("sig", 0.0);
        assert!(p.base_confidence >= 0.01);
        for _ in 0..20 {
            p.observe(0.0, false, Utc::now());
        }
        assert!(p.base_confidence >= 0.01);
    }
}

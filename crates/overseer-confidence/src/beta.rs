//! Weighted Beta posterior over outcome scores.

use chrono::{DateTime, Utc};

/// Beta(α, β), starting from the uniform prior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BetaPosterior {
    pub alpha: f64,
    pub beta: f64,
    /// Sum of observation weights folded in so far.
    pub effective_samples: f64,
}

impl BetaPosterior {
    pub fn uniform() -> Self {
        Self {
            alpha: 1.0,
            beta: 1.0,
            effective_samples: 0.0,
        }
    }

    /// Fold in a score in [0, 1] with the given weight. Partial scores
    /// split their weight between α and β.
    pub fn observe(&mut self, score: f64, weight: f64) {
        if !weight.is_finite() || weight <= 0.0 {
            return;
        }
        let score = score.clamp(0.0, 1.0);
        self.alpha += weight * score;
        self.beta += weight * (1.0 - score);
        self.effective_samples += weight;
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let sum = self.alpha + self.beta;
        (self.alpha * self.beta) / (sum.powi(2) * (sum + 1.0))
    }
}

impl Default for BetaPosterior {
    fn default() -> Self {
        Self::uniform()
    }
}

/// Exponential decay: an outcome one half-life old counts half.
pub fn recency_weight(recorded_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let age_days = (now - recorded_at).num_seconds().max(0) as f64 / 86_400.0;
    0.5f64.powf(age_days / half_life_days)
}

/// Outcomes whose original confidence proved accurate count more;
/// a completely wrong prediction still counts half.
pub fn accuracy_weight(confidence_accuracy: f64) -> f64 {
    0.5 + 0.5 * confidence_accuracy.clamp(0.0, 1.0)
}

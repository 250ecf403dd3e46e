//! Global calibration factor.

use overseer_core::models::DecisionOutcome;

pub const MIN_FACTOR: f64 = 0.8;
pub const MAX_FACTOR: f64 = 1.2;

/// Scale that nudges predictions towards realized outcomes.
///
/// The ratio of realized score to mean prediction is damped by mean
/// accuracy: a well-calibrated history leaves the factor near 1.0.
pub fn compute_factor(outcomes: &[DecisionOutcome]) -> f64 {
    if outcomes.is_empty() {
        return 1.0;
    }
    let n = outcomes.len() as f64;
    let predicted = outcomes.iter().map(|o| o.predicted_confidence).sum::<f64>() / n;
    let realized = outcomes.iter().map(|o| o.kind.score()).sum::<f64>() / n;
    let accuracy = outcomes.iter().map(|o| o.confidence_accuracy).sum::<f64>() / n;
    if predicted <= f64::EPSILON {
        return 1.0;
    }
    let factor = 1.0 + (realized / predicted - 1.0) * (1.0 - accuracy);
    if factor.is_finite() {
        factor.clamp(MIN_FACTOR, MAX_FACTOR)
    } else {
        1.0
    }
}

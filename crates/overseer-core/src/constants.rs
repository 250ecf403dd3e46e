/// Overseer version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lower bound for any adapted or learned confidence value.
pub const MIN_CONFIDENCE: f64 = 0.01;

/// Upper bound for any adapted or learned confidence value.
pub const MAX_CONFIDENCE: f64 = 0.99;

/// Marker an intervention builder places in its message to request a human.
pub const MANUAL_ESCALATION_MARKER: &str = "[MANUAL_ESCALATION]";

/// Maximum number of controller transitions retained in memory.
pub const MAX_TRANSITION_HISTORY: usize = 1000;

/// The seven TRRDEVS workflow stages, in forward order.
pub const TRRDEVS_STAGES: [&str; 7] = [
    "think", "research", "reflect", "decide", "execute", "validate", "solidify",
];

/// Clamp a confidence value into the supported range.
pub fn clamp_confidence(value: f64) -> f64 {
    if value.is_nan() {
        return MIN_CONFIDENCE;
    }
    value.clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}

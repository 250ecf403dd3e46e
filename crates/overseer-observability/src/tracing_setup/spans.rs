//! Span definitions per supervisory operation.

#[macro_export]
macro_rules! detection_span {
    ($state:expr) => {
        tracing::info_span!("overseer.detection", state = %$state)
    };
}

#[macro_export]
macro_rules! intervention_span {
    ($event_id:expr, $error_type:expr) => {
        tracing::info_span!(
            "overseer.intervention",
            event_id = %$event_id,
            error_type = %$error_type
        )
    };
}

#[macro_export]
macro_rules! rollback_span {
    ($reason:expr) => {
        tracing::info_span!("overseer.rollback", reason = %$reason)
    };
}

#[macro_export]
macro_rules! routing_span {
    ($stage:expr, $decision:expr) => {
        tracing::info_span!("overseer.routing", stage = %$stage, decision = %$decision)
    };
}

#[macro_export]
macro_rules! confidence_span {
    ($strategy:expr) => {
        tracing::debug_span!("overseer.confidence", strategy = %$strategy)
    };
}

#[macro_export]
macro_rules! recall_span {
    ($operation:expr) => {
        tracing::debug_span!("overseer.recall", operation = $operation)
    };
}

/// Span names as constants for programmatic use.
pub mod names {
    pub const DETECTION: &str = "overseer.detection";
    pub const INTERVENTION: &str = "overseer.intervention";
    pub const ROLLBACK: &str = "overseer.rollback";
    pub const ROUTING: &str = "overseer.routing";
    pub const CONFIDENCE: &str = "overseer.confidence";
    pub const RECALL: &str = "overseer.recall";
}

//! Structured log events for supervisor milestones.

pub fn state_transition(from: &str, to: &str, reason: &str) {
    tracing::info!(event = "state_transition", from, to, reason, "controller transition");
}

pub fn intervention_concluded(error_type: &str, strategy: &str, outcome: &str, confidence: f64) {
    tracing::info!(
        event = "intervention_concluded",
        error_type,
        strategy,
        outcome,
        confidence,
        "intervention concluded"
    );
}

pub fn rollback_finished(snapshot_id: Option<&str>, restored: bool) {
    if restored {
        tracing::info!(event = "rollback_finished", snapshot_id, restored, "rollback succeeded");
    } else {
        tracing::error!(event = "rollback_finished", snapshot_id, restored, "rollback failed");
    }
}

pub fn health_check_failed(component: &str, message: &str, restart_attempt: u32) {
    tracing::warn!(
        event = "health_check_failed",
        component,
        message,
        restart_attempt,
        "health check failed"
    );
}

pub fn degradation_triggered(component: &str, failure: &str, fallback: &str) {
    tracing::warn!(
        event = "degradation_triggered",
        component,
        failure,
        fallback,
        "component degraded"
    );
}

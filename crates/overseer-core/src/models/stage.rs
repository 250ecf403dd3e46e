use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A strategic decision about where the workflow goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum StrategicDecision {
    Proceed,
    Retry,
    Reroute(String),
    Abort,
    Escalate,
    Pause,
    /// Any decision the router has no specific rule for.
    Other(String),
}

impl StrategicDecision {
    pub fn label(&self) -> &str {
        match self {
            Self::Proceed => "proceed",
            Self::Retry => "retry",
            Self::Reroute(_) => "reroute",
            Self::Abort => "abort",
            Self::Escalate => "escalate",
            Self::Pause => "pause",
            Self::Other(label) => label,
        }
    }

    /// Retry and reroute count towards bottleneck detection.
    pub fn is_rework(&self) -> bool {
        matches!(self, Self::Retry | Self::Reroute(_))
    }
}

impl fmt::Display for StrategicDecision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reroute(target) => write!(f, "reroute({target})"),
            other => f.write_str(other.label()),
        }
    }
}

/// Classification of a workflow graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Forward,
    Backward,
    /// Staying on the same stage (retry or pause).
    Loop,
}

/// One traversal (or termination) recorded by the stage router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageTransition {
    pub from_stage: String,
    /// `None` when the decision ended the workflow.
    pub to_stage: Option<String>,
    pub reason: String,
    pub decision: StrategicDecision,
    pub kind: Option<TransitionKind>,
    pub timestamp: DateTime<Utc>,
}

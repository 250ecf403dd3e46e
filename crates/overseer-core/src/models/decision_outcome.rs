use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a remediation attempt concluded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Success,
    Failure,
    Partial,
    Timeout,
    Escalated,
    Aborted,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 6] = [
        Self::Success,
        Self::Failure,
        Self::Partial,
        Self::Timeout,
        Self::Escalated,
        Self::Aborted,
    ];

    /// Observed success value fed into the Beta posterior.
    pub fn score(self) -> f64 {
        match self {
            Self::Success => 1.0,
            Self::Partial => 0.5,
            Self::Escalated => 0.25,
            Self::Failure | Self::Timeout | Self::Aborted => 0.0,
        }
    }

    /// Whether the remediation took effect. Partial outcomes count, since
    /// the controller resolves on them; their lower `score` still weighs
    /// them below a full success.
    pub fn is_success(self) -> bool {
        matches!(self, Self::Success | Self::Partial)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Partial => "partial",
            Self::Timeout => "timeout",
            Self::Escalated => "escalated",
            Self::Aborted => "aborted",
        }
    }
}

impl fmt::Display for OutcomeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutcomeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown outcome kind: {s}"))
    }
}

/// Result of one remediation attempt, as fed back into confidence learning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionOutcome {
    pub decision_id: String,
    /// Remediation strategy the decision chose.
    pub strategy: String,
    pub kind: OutcomeKind,
    /// Confidence the engine reported when the decision was made.
    pub predicted_confidence: f64,
    pub cost: f64,
    pub resolution_time_ms: u64,
    /// `1 - |predicted - observed|`, in [0, 1].
    pub confidence_accuracy: f64,
    /// Pattern signature of the context the decision was made in.
    pub context_hash: String,
    pub stage: String,
    pub error_type: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

impl DecisionOutcome {
    /// Build an outcome, deriving `confidence_accuracy` from the prediction.
    pub fn new(
        decision_id: impl Into<String>,
        strategy: impl Into<String>,
        kind: OutcomeKind,
        predicted_confidence: f64,
        context_hash: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        let predicted = predicted_confidence.clamp(0.0, 1.0);
        Self {
            decision_id: decision_id.into(),
            strategy: strategy.into(),
            kind,
            predicted_confidence: predicted,
            cost: 0.0,
            resolution_time_ms: 0,
            confidence_accuracy: accuracy_of(predicted, kind),
            context_hash: context_hash.into(),
            stage: stage.into(),
            error_type: None,
            recorded_at: Utc::now(),
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost.max(0.0);
        self
    }

    pub fn with_resolution_time_ms(mut self, millis: u64) -> Self {
        self.resolution_time_ms = millis;
        self
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}

/// How close a prediction came to what actually happened.
pub fn accuracy_of(predicted: f64, kind: OutcomeKind) -> f64 {
    (1.0 - (predicted - kind.score()).abs()).clamp(0.0, 1.0)
}

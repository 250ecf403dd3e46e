use serde::{Deserialize, Serialize};

use super::error_event::ErrorEvent;
use super::stage::StrategicDecision;
use crate::constants::MANUAL_ESCALATION_MARKER;

/// Why an intervention is being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterventionKind {
    /// First time this signature has been seen in the lookback window.
    FirstOccurrence,
    /// Signature already recorded within the lookback window.
    RepeatError,
    /// Prior fixes for this error type have failed.
    KnownFailingFix,
}

/// A remediation previously tried for a similar error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorAttempt {
    pub command: String,
    pub success: bool,
}

/// A knowledge ledger hit, surfaced verbatim to the intervention builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub title: String,
    pub guidance: String,
    pub confidence: f64,
}

/// Query handed to the knowledge ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeQuery {
    pub domain: String,
    pub stage: String,
    pub error_text: String,
}

/// Structured context for building an intervention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionContext {
    pub kind: InterventionKind,
    pub event: ErrorEvent,
    /// Workflow stage the agent is currently executing.
    pub current_stage: String,
    pub signature: String,
    pub prior_attempts: Vec<PriorAttempt>,
    pub similar_count: usize,
    pub knowledge: Vec<KnowledgeEntry>,
}

/// One executable remediation step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemediationAction {
    /// Strategy name confidence is learned against.
    pub strategy: String,
    pub command: String,
    pub description: String,
}

impl RemediationAction {
    pub fn new(strategy: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            strategy: strategy.into(),
            command: command.into(),
            description: String::new(),
        }
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// What the intervention builder wants done.
///
/// The message is opaque; the controller only looks at `escalate`,
/// the escalation marker, and the structured actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionPlan {
    pub message: String,
    pub actions: Vec<RemediationAction>,
    /// Routing decision to apply once remediation succeeds.
    pub decision: StrategicDecision,
    pub escalate: bool,
    /// Builder's own confidence estimate before adaptation.
    pub base_confidence: f64,
}

impl InterventionPlan {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actions: Vec::new(),
            decision: StrategicDecision::Retry,
            escalate: false,
            base_confidence: 0.5,
        }
    }

    pub fn with_action(mut self, action: RemediationAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_decision(mut self, decision: StrategicDecision) -> Self {
        self.decision = decision;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.base_confidence = confidence;
        self
    }

    pub fn escalated(mut self) -> Self {
        self.escalate = true;
        self
    }

    pub fn requires_manual_escalation(&self) -> bool {
        self.escalate || self.message.contains(MANUAL_ESCALATION_MARKER)
    }

    /// Strategy of the first action, used as the confidence key.
    pub fn primary_strategy(&self) -> Option<&str> {
        self.actions.first().map(|a| a.strategy.as_str())
    }

    /// Distinct strategies in action order, primary first.
    pub fn strategies(&self) -> impl Iterator<Item = &str> + '_ {
        let mut seen = std::collections::HashSet::new();
        self.actions
            .iter()
            .map(|a| a.strategy.as_str())
            .filter(move |s| seen.insert(*s))
    }
}

/// What the remediation executor reports back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemediationOutcome {
    pub success: bool,
    /// True when only some of the actions took effect.
    pub partial: bool,
    pub output: String,
    pub cost: f64,
}

impl RemediationOutcome {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            success: true,
            partial: false,
            output: output.into(),
            cost: 0.0,
        }
    }

    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            partial: false,
            output: output.into(),
            cost: 0.0,
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost;
        self
    }
}

mod confidence_pattern;
mod controller_state;
mod decision_context;
mod decision_outcome;
mod degradation_event;
mod error_event;
mod health;
mod intervention;
mod recall_records;
mod stage;

pub use confidence_pattern::{ConfidencePattern, DEFAULT_VARIANCE};
pub use controller_state::{ControllerState, StateChange};
pub use decision_context::DecisionContext;
pub use decision_outcome::{accuracy_of, DecisionOutcome, OutcomeKind};
pub use degradation_event::DegradationEvent;
pub use error_event::{ErrorEvent, Severity, StreamSource};
pub use health::{ComponentHealth, HealthReport, HealthStatus};
pub use intervention::{
    InterventionContext, InterventionKind, InterventionPlan, KnowledgeEntry, KnowledgeQuery,
    PriorAttempt, RemediationAction, RemediationOutcome,
};
pub use recall_records::{
    CleanupReport, CommandRecord, ErrorRecord, NewCommandRecord, NewErrorRecord,
    NewPatternViolation, PatternViolation, RecallStatistics,
};
pub use stage::{StageTransition, StrategicDecision, TransitionKind};

/// Workflow graph errors.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("unknown stage: {name}")]
    UnknownStage { name: String },

    #[error("stage already registered: {name}")]
    DuplicateStage { name: String },

    #[error("no path from {from} to {to}")]
    NoPath { from: String, to: String },

    #[error("invalid edge weight {weight} on {from} -> {to}")]
    InvalidWeight { from: String, to: String, weight: f64 },

    #[error("router requires at least one stage")]
    EmptyWorkflow,
}

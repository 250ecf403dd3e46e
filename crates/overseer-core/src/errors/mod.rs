mod config_error;
mod router_error;
mod storage_error;

pub use config_error::ConfigError;
pub use router_error::RouterError;
pub use storage_error::StorageError;

/// Top-level error for every overseer crate.
#[derive(Debug, thiserror::Error)]
pub enum OverseerError {
    #[error(transparent)]
    StorageError(#[from] StorageError),

    #[error(transparent)]
    RouterError(#[from] RouterError),

    #[error(transparent)]
    ConfigError(#[from] ConfigError),

    #[error("{step} timed out after {millis}ms")]
    Timeout { step: String, millis: u64 },

    #[error("dependency {component} failed: {reason}")]
    DependencyFailed { component: String, reason: String },

    #[error("invalid context: {reason}")]
    InvalidContext { reason: String },

    #[error("invalid pattern {pattern}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("event channel closed")]
    ChannelClosed,
}

impl OverseerError {
    /// Shorthand for a failed collaborator call.
    pub fn dependency(component: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DependencyFailed {
            component: component.into(),
            reason: reason.into(),
        }
    }

    /// Whether this error came from a step exceeding its deadline.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type OverseerResult<T> = Result<T, OverseerError>;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Operational state of the supervisory controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ControllerState {
    Idle,
    Detecting,
    Intervening,
    Monitoring,
    Rollback,
    /// Terminal. The run loop halts and needs an external restart.
    Error,
}

impl ControllerState {
    pub const ALL: [ControllerState; 6] = [
        Self::Idle,
        Self::Detecting,
        Self::Intervening,
        Self::Monitoring,
        Self::Rollback,
        Self::Error,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Detecting => "DETECTING",
            Self::Intervening => "INTERVENING",
            Self::Monitoring => "MONITORING",
            Self::Rollback => "ROLLBACK",
            Self::Error => "ERROR",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Error)
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded change of controller state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateChange {
    pub from: ControllerState,
    pub to: ControllerState,
    pub reason: String,
    pub at: DateTime<Utc>,
}

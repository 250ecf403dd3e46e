use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::error_event::Severity;

/// A persisted occurrence of an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub id: String,
    pub error_type: String,
    /// Normalized form of `message`; the dedup key.
    pub signature: String,
    pub file_path: Option<String>,
    pub message: String,
    pub attempted_fix: Option<String>,
    pub context: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Input for `RecallDb::record_error`.
#[derive(Debug, Clone, Default)]
pub struct NewErrorRecord {
    pub error_type: String,
    pub message: String,
    pub file_path: Option<String>,
    pub attempted_fix: Option<String>,
    pub context: BTreeMap<String, String>,
    /// Overrides the store's default TTL.
    pub ttl: Option<Duration>,
}

impl NewErrorRecord {
    pub fn new(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_type: error_type.into(),
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_fix(mut self, attempted_fix: impl Into<String>) -> Self {
        self.attempted_fix = Some(attempted_fix.into());
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A recorded breach of a code or workflow pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatternViolation {
    pub id: String,
    pub pattern_name: String,
    pub signature: String,
    pub file_path: Option<String>,
    pub description: String,
    pub severity: Severity,
    /// The error this violation was observed alongside, if any.
    pub error_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewPatternViolation {
    pub pattern_name: String,
    pub description: String,
    pub file_path: Option<String>,
    pub severity: Severity,
    pub error_id: Option<String>,
    pub ttl: Option<Duration>,
}

impl NewPatternViolation {
    pub fn new(pattern_name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            pattern_name: pattern_name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_file(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn linked_to(mut self, error_id: impl Into<String>) -> Self {
        self.error_id = Some(error_id.into());
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// One remediation command that was run against an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandRecord {
    pub id: String,
    pub command: String,
    pub error_type: String,
    pub error_id: Option<String>,
    pub success: bool,
    pub output: Option<String>,
    pub duration_ms: u64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct NewCommandRecord {
    pub command: String,
    pub error_type: String,
    pub error_id: Option<String>,
    pub success: bool,
    pub output: Option<String>,
    pub duration_ms: u64,
    pub ttl: Option<Duration>,
}

impl NewCommandRecord {
    pub fn new(command: impl Into<String>, error_type: impl Into<String>, success: bool) -> Self {
        Self {
            command: command.into(),
            error_type: error_type.into(),
            success,
            ..Self::default()
        }
    }

    pub fn linked_to(mut self, error_id: impl Into<String>) -> Self {
        self.error_id = Some(error_id.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// Rows purged by one expiry sweep, per family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanupReport {
    pub errors: usize,
    pub violations: usize,
    pub commands: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.errors + self.violations + self.commands
    }
}

/// Live-row counts and frequency leaders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecallStatistics {
    pub total_errors: usize,
    pub total_violations: usize,
    pub total_commands: usize,
    pub failed_commands: usize,
    pub unique_signatures: usize,
    /// `(error_type, count)` sorted by descending count.
    pub top_errors: Vec<(String, usize)>,
    /// `(pattern_name, count)` sorted by descending count.
    pub top_patterns: Vec<(String, usize)>,
}

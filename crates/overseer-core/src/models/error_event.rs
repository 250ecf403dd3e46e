use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which stream of a supervised process a line came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamSource {
    Stdout,
    Stderr,
    /// Log files, pipes, or anything else attached by name.
    Named(String),
}

impl fmt::Display for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("stdout"),
            Self::Stderr => f.write_str("stderr"),
            Self::Named(name) => f.write_str(name),
        }
    }
}

/// How disruptive a detected error is.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

/// One pattern match in a monitored stream.
///
/// Created by the watchdog, consumed once by the controller, never persisted as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub id: String,
    /// Label of the rule that matched, e.g. `ModuleNotFoundError`.
    pub error_type: String,
    pub severity: Severity,
    pub file_path: Option<String>,
    pub line: Option<u32>,
    /// The full line that matched.
    pub raw_text: String,
    pub timestamp: DateTime<Utc>,
    pub source: StreamSource,
    /// 1-based position of the line within its stream.
    pub stream_line: u64,
}

impl ErrorEvent {
    pub fn new(
        error_type: impl Into<String>,
        severity: Severity,
        raw_text: impl Into<String>,
        source: StreamSource,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            error_type: error_type.into(),
            severity,
            file_path: None,
            line: None,
            raw_text: raw_text.into(),
            timestamp: Utc::now(),
            source,
            stream_line: 0,
        }
    }

    pub fn with_location(mut self, file_path: Option<String>, line: Option<u32>) -> Self {
        self.file_path = file_path;
        self.line = line;
        self
    }

    pub fn with_stream_line(mut self, stream_line: u64) -> Self {
        self.stream_line = stream_line;
        self
    }
}

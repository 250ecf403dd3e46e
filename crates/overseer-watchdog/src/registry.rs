//! Ordered pattern registry.

use regex::Regex;

use overseer_core::config::WatchdogConfig;
use overseer_core::errors::{OverseerError, OverseerResult};
use overseer_core::models::{ErrorEvent, Severity, StreamSource};

use crate::rules::{extract_location, DEFAULT_RULES};

/// One `(pattern, error type)` rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub regex: Regex,
    pub error_type: String,
    pub severity: Severity,
}

impl PatternRule {
    pub fn new(
        pattern: &str,
        error_type: impl Into<String>,
        severity: Severity,
    ) -> OverseerResult<Self> {
        let regex = Regex::new(pattern).map_err(|e| OverseerError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            regex,
            error_type: error_type.into(),
            severity,
        })
    }
}

/// Rules tested in insertion order; the first match wins.
#[derive(Debug, Clone, Default)]
pub struct PatternRegistry {
    rules: Vec<PatternRule>,
}

impl PatternRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> OverseerResult<Self> {
        let mut registry = Self::empty();
        for (pattern, error_type, severity) in DEFAULT_RULES {
            registry.add(pattern, *error_type, *severity)?;
        }
        Ok(registry)
    }

    /// Defaults (unless disabled) followed by the configured extra rules,
    /// which are treated as high severity.
    pub fn from_config(config: &WatchdogConfig) -> OverseerResult<Self> {
        let mut registry = if config.use_default_rules {
            Self::with_defaults()?
        } else {
            Self::empty()
        };
        for (pattern, error_type) in &config.extra_rules {
            registry.add(pattern, error_type.as_str(), Severity::High)?;
        }
        Ok(registry)
    }

    pub fn add(
        &mut self,
        pattern: &str,
        error_type: impl Into<String>,
        severity: Severity,
    ) -> OverseerResult<()> {
        self.rules.push(PatternRule::new(pattern, error_type, severity)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    pub fn first_match(&self, line: &str) -> Option<&PatternRule> {
        self.rules.iter().find(|rule| rule.regex.is_match(line))
    }

    /// Build the event for `line`, or `None` if no rule matches.
    pub fn scan(&self, line: &str, source: &StreamSource, stream_line: u64) -> Option<ErrorEvent> {
        let rule = self.first_match(line)?;
        let (file_path, line_number) = extract_location(line);
        Some(
            ErrorEvent::new(rule.error_type.clone(), rule.severity, line, source.clone())
                .with_location(file_path, line_number)
                .with_stream_line(stream_line),
        )
    }
}

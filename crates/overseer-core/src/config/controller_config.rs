use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::defaults;
use crate::errors::ConfigError;

/// Controller timeouts, delays, and restart policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    pub detection_timeout_ms: u64,
    pub classification_timeout_ms: u64,
    pub db_timeout_ms: u64,
    pub ledger_timeout_ms: u64,
    pub operator_timeout_ms: u64,
    pub remediation_timeout_ms: u64,
    /// How long DETECTING and MONITORING wait on the event queue.
    pub queue_timeout_ms: u64,
    pub health_check_interval_secs: u64,
    /// Per-component deadline inside a health probe.
    pub health_probe_timeout_ms: u64,
    pub max_restart_attempts: u32,
    pub rollback_timeout_ms: u64,
    pub idle_delay_ms: u64,
    pub error_delay_ms: u64,
    /// Baseline complexity; the controller raises it for larger plans and
    /// errors with a failing fix history.
    pub default_task_complexity: f64,
    /// Remediation spend allowed per run. Zero means unbounded.
    pub cost_budget: f64,
    /// Strategies adapted below this are not executed.
    pub min_remediation_confidence: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            detection_timeout_ms: defaults::DEFAULT_DETECTION_TIMEOUT_MS,
            classification_timeout_ms: defaults::DEFAULT_CLASSIFICATION_TIMEOUT_MS,
            db_timeout_ms: defaults::DEFAULT_DB_TIMEOUT_MS,
            ledger_timeout_ms: defaults::DEFAULT_LEDGER_TIMEOUT_MS,
            operator_timeout_ms: defaults::DEFAULT_OPERATOR_TIMEOUT_MS,
            remediation_timeout_ms: defaults::DEFAULT_REMEDIATION_TIMEOUT_MS,
            queue_timeout_ms: defaults::DEFAULT_QUEUE_TIMEOUT_MS,
            health_check_interval_secs: defaults::DEFAULT_HEALTH_CHECK_INTERVAL_SECS,
            health_probe_timeout_ms: defaults::DEFAULT_HEALTH_PROBE_TIMEOUT_MS,
            max_restart_attempts: defaults::DEFAULT_MAX_RESTART_ATTEMPTS,
            rollback_timeout_ms: defaults::DEFAULT_ROLLBACK_TIMEOUT_MS,
            idle_delay_ms: defaults::DEFAULT_IDLE_DELAY_MS,
            error_delay_ms: defaults::DEFAULT_ERROR_DELAY_MS,
            default_task_complexity: defaults::DEFAULT_TASK_COMPLEXITY,
            cost_budget: defaults::DEFAULT_COST_BUDGET,
            min_remediation_confidence: defaults::DEFAULT_MIN_REMEDIATION_CONFIDENCE,
        }
    }
}

impl ControllerConfig {
    /// Build from flat key/value pairs. Missing keys keep their defaults,
    /// unknown keys are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut config = Self::default();
        for (key, value) in pairs {
            config.set(key.as_ref(), value.as_ref())?;
        }
        Ok(config)
    }

    /// Apply a single flat key. Returns `Ok(false)` for unrecognised keys.
    pub fn set(&mut self, key: &str, value: &str) -> Result<bool, ConfigError> {
        let value = value.trim();
        match key.trim() {
            "detection_timeout_ms" => self.detection_timeout_ms = parse(key, value)?,
            "classification_timeout_ms" => self.classification_timeout_ms = parse(key, value)?,
            "db_timeout_ms" => self.db_timeout_ms = parse(key, value)?,
            "ledger_timeout_ms" => self.ledger_timeout_ms = parse(key, value)?,
            "operator_timeout_ms" => self.operator_timeout_ms = parse(key, value)?,
            "remediation_timeout_ms" => self.remediation_timeout_ms = parse(key, value)?,
            "queue_timeout_ms" => self.queue_timeout_ms = parse(key, value)?,
            "health_check_interval_secs" => self.health_check_interval_secs = parse(key, value)?,
            "health_probe_timeout_ms" => self.health_probe_timeout_ms = parse(key, value)?,
            "max_restart_attempts" => self.max_restart_attempts = parse(key, value)?,
            "rollback_timeout_ms" => self.rollback_timeout_ms = parse(key, value)?,
            "idle_delay_ms" => self.idle_delay_ms = parse(key, value)?,
            "error_delay_ms" => self.error_delay_ms = parse(key, value)?,
            "default_task_complexity" => self.default_task_complexity = parse(key, value)?,
            "cost_budget" => self.cost_budget = parse(key, value)?,
            "min_remediation_confidence" => {
                self.min_remediation_confidence = parse(key, value)?
            }
            other => {
                tracing::warn!(key = other, "ignoring unknown controller config key");
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn detection_timeout(&self) -> Duration {
        Duration::from_millis(self.detection_timeout_ms)
    }

    pub fn classification_timeout(&self) -> Duration {
        Duration::from_millis(self.classification_timeout_ms)
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }

    pub fn ledger_timeout(&self) -> Duration {
        Duration::from_millis(self.ledger_timeout_ms)
    }

    pub fn operator_timeout(&self) -> Duration {
        Duration::from_millis(self.operator_timeout_ms)
    }

    pub fn remediation_timeout(&self) -> Duration {
        Duration::from_millis(self.remediation_timeout_ms)
    }

    pub fn queue_timeout(&self) -> Duration {
        Duration::from_millis(self.queue_timeout_ms)
    }

    pub fn health_check_interval(&self) -> Duration {
        Duration::from_secs(self.health_check_interval_secs)
    }

    pub fn health_probe_timeout(&self) -> Duration {
        Duration::from_millis(self.health_probe_timeout_ms)
    }

    pub fn rollback_timeout(&self) -> Duration {
        Duration::from_millis(self.rollback_timeout_ms)
    }

    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn error_delay(&self) -> Duration {
        Duration::from_millis(self.error_delay_ms)
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::{OverseerError, OverseerResult};

/// Situation a remediation decision is being made in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionContext {
    pub stage: String,
    pub error_type: Option<String>,
    /// Consecutive failures of this error type so far.
    pub failure_count: u32,
    pub cost_spent: f64,
    pub cost_budget: f64,
    /// Estimate in [0, 1].
    pub task_complexity: f64,
    /// Success rate over recent decisions, if any were made.
    pub recent_success_rate: Option<f64>,
    /// Estimate in [0, 1] of host resource pressure.
    pub resource_pressure: f64,
    pub timestamp: DateTime<Utc>,
}

impl DecisionContext {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            error_type: None,
            failure_count: 0,
            cost_spent: 0.0,
            cost_budget: 0.0,
            task_complexity: 0.5,
            recent_success_rate: None,
            resource_pressure: 0.0,
            timestamp: Utc::now(),
        }
    }

    pub fn with_error_type(mut self, error_type: impl Into<String>) -> Self {
        self.error_type = Some(error_type.into());
        self
    }

    pub fn with_failures(mut self, failure_count: u32) -> Self {
        self.failure_count = failure_count;
        self
    }

    pub fn with_cost(mut self, spent: f64, budget: f64) -> Self {
        self.cost_spent = spent;
        self.cost_budget = budget;
        self
    }

    pub fn with_complexity(mut self, complexity: f64) -> Self {
        self.task_complexity = complexity;
        self
    }

    pub fn with_recent_success_rate(mut self, rate: f64) -> Self {
        self.recent_success_rate = Some(rate);
        self
    }

    pub fn with_resource_pressure(mut self, pressure: f64) -> Self {
        self.resource_pressure = pressure;
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Reject contexts the feature extractor cannot bucket.
    pub fn validate(&self) -> OverseerResult<()> {
        if self.stage.trim().is_empty() {
            return Err(invalid("stage must not be empty"));
        }
        let finite = [
            self.cost_spent,
            self.cost_budget,
            self.task_complexity,
            self.resource_pressure,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            return Err(invalid("numeric fields must be finite"));
        }
        if self.cost_spent < 0.0 || self.cost_budget < 0.0 {
            return Err(invalid("costs must be non-negative"));
        }
        if let Some(rate) = self.recent_success_rate {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid("recent_success_rate must be within [0, 1]"));
            }
        }
        Ok(())
    }

    /// Fraction of the budget consumed, or `None` without a budget.
    pub fn cost_ratio(&self) -> Option<f64> {
        (self.cost_budget > 0.0).then(|| self.cost_spent / self.cost_budget)
    }
}

fn invalid(reason: &str) -> OverseerError {
    OverseerError::InvalidContext {
        reason: reason.to_string(),
    }
}

//! Context feature extraction and pattern signatures.

use chrono::Timelike;
use serde::Serialize;

use overseer_core::errors::OverseerResult;
use overseer_core::models::DecisionContext;

const SIGNATURE_HEX_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureBucket {
    None,
    Single,
    Few,
    Many,
}

impl FailureBucket {
    pub fn of(failures: u32) -> Self {
        match failures {
            0 => Self::None,
            1 => Self::Single,
            2..=3 => Self::Few,
            _ => Self::Many,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Single => "single",
            Self::Few => "few",
            Self::Many => "many",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    Medium,
    High,
    /// No budget, so no ratio.
    Unbounded,
}

impl Level {
    fn of_fraction(value: f64) -> Self {
        if value < 0.25 {
            Self::Low
        } else if value < 0.75 {
            Self::Medium
        } else {
            Self::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Unbounded => "unbounded",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    Night,
    Morning,
    Afternoon,
    Evening,
}

impl TimeOfDay {
    pub fn of_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Night,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }
}

/// Bucketed view of a [`DecisionContext`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextFeatures {
    pub stage: String,
    pub error_category: &'static str,
    pub failure_bucket: FailureBucket,
    pub cost_bucket: Level,
    pub complexity_bucket: Level,
    pub time_of_day: TimeOfDay,
    pub recent_success_rate: Option<f64>,
    pub resource_pressure: f64,
}

impl ContextFeatures {
    pub fn extract(ctx: &DecisionContext) -> OverseerResult<Self> {
        ctx.validate()?;
        Ok(Self {
            stage: ctx.stage.trim().to_ascii_lowercase(),
            error_category: error_category(ctx.error_type.as_deref()),
            failure_bucket: FailureBucket::of(ctx.failure_count),
            cost_bucket: ctx.cost_ratio().map_or(Level::Unbounded, Level::of_fraction),
            complexity_bucket: Level::of_fraction(ctx.task_complexity.clamp(0.0, 1.0)),
            time_of_day: TimeOfDay::of_hour(ctx.timestamp.hour()),
            recent_success_rate: ctx.recent_success_rate,
            resource_pressure: ctx.resource_pressure.clamp(0.0, 1.0),
        })
    }

    /// Hash of stage, error category, failure, cost and complexity buckets.
    /// Time of day, recent success and pressure are deliberately left out
    /// so that history accumulates across them.
    pub fn signature(&self) -> String {
        let key = format!(
            "{}|{}|{}|{}|{}",
            self.stage,
            self.error_category,
            self.failure_bucket.as_str(),
            self.cost_bucket.as_str(),
            self.complexity_bucket.as_str(),
        );
        let hash = blake3::hash(key.as_bytes()).to_hex();
        hash.as_str()[..SIGNATURE_HEX_LEN].to_string()
    }
}

/// Coarse family of an error type label.
pub fn error_category(error_type: Option<&str>) -> &'static str {
    let Some(label) = error_type else {
        return "none";
    };
    match label.to_ascii_lowercase().as_str() {
        "modulenotfounderror" | "importerror" | "npmerror" => "dependency",
        "syntaxerror" | "indentationerror" | "rustcompileerror" => "build",
        "typeerror" | "nameerror" | "attributeerror" | "keyerror" | "valueerror" => "runtime",
        "assertionerror" | "testfailure" => "test",
        "outofmemory" | "segfault" | "panic" => "crash",
        "permissiondenied" | "commandnotfound" => "environment",
        "timeout" => "timeout",
        _ => "other",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn ctx() -> DecisionContext {
        DecisionContext::new("execute")
            .with_error_type("ModuleNotFoundError")
            .with_failures(2)
            .with_cost(30.0, 100.0)
            .with_complexity(0.9)
    }

    #[test]
    fn buckets() {
        let f = ContextFeatures::extract(&ctx()).unwrap();
        assert_eq!(f.error_category, "dependency");
        assert_eq!(f.failure_bucket, FailureBucket::Few);
        assert_eq!(f.cost_bucket, Level::Medium);
        assert_eq!(f.complexity_bucket, Level::High);
    }

    #[test]
    fn no_budget_is_unbounded() {
        let f = ContextFeatures::extract(&DecisionContext::new("think")).unwrap();
        assert_eq!(f.cost_bucket, Level::Unbounded);
        assert_eq!(f.error_category, "none");
    }

    #[test]
    fn signature_ignores_time_of_day_and_pressure() {
        let morning = ctx().at(Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap());
        let night = ctx()
            .at(Utc.with_ymd_and_hms(2026, 3, 1, 2, 0, 0).unwrap())
            .with_resource_pressure(0.9);
        let a = ContextFeatures::extract(&morning).unwrap();
        let b = ContextFeatures::extract(&night).unwrap();
        assert_ne!(a.time_of_day, b.time_of_day);
        assert_eq!(a.signature(), b.signature());
        assert_eq!(a.signature().len(), 16);
    }

    #[test]
    fn signature_separates_failure_buckets() {
        let a = ContextFeatures::extract(&ctx().with_failures(0)).unwrap();
        let b = ContextFeatures::extract(&ctx().with_failures(5)).unwrap();
        assert_ne!(a.signature(), b.signature());
    }

    #[test]
    fn invalid_context_rejected() {
        assert!(ContextFeatures::extract(&DecisionContext::new("  ")).is_err());
    }
}

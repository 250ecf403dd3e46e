use chrono::Utc;

use overseer_core::models::{ComponentHealth, HealthReport, HealthStatus};

/// Builds aggregate reports from individual component probes.
#[derive(Debug, Default)]
pub struct HealthReporter {
    last: Option<HealthReport>,
}

impl HealthReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate `components` into a report and keep it as the latest.
    pub fn report(&mut self, components: Vec<ComponentHealth>) -> HealthReport {
        let report = Self::build(components);
        self.last = Some(report.clone());
        report
    }

    pub fn build(components: Vec<ComponentHealth>) -> HealthReport {
        HealthReport {
            overall_status: Self::derive_overall(&components),
            components,
            checked_at: Utc::now(),
        }
    }

    /// The worst component status wins. No components means healthy.
    pub fn derive_overall(components: &[ComponentHealth]) -> HealthStatus {
        components
            .iter()
            .map(|c| c.status)
            .max_by_key(|s| severity_rank(*s))
            .unwrap_or(HealthStatus::Healthy)
    }

    pub fn last_report(&self) -> Option<&HealthReport> {
        self.last.as_ref()
    }

    /// Components that failed in the latest report.
    pub fn unhealthy_components(&self) -> Vec<&str> {
        self.last
            .iter()
            .flat_map(|r| r.components.iter())
            .filter(|c| c.status == HealthStatus::Unhealthy)
            .map(|c| c.name.as_str())
            .collect()
    }
}

fn severity_rank(status: HealthStatus) -> u8 {
    match status {
        HealthStatus::Healthy => 0,
        HealthStatus::Degraded => 1,
        HealthStatus::Unhealthy => 2,
    }
}

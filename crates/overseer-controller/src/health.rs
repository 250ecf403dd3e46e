//! Periodic health probing with a bounded restart policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use overseer_core::config::ControllerConfig;
use overseer_core::models::{ComponentHealth, DegradationEvent, HealthReport, HealthStatus};
use overseer_core::traits::IHealthProbe;
use overseer_observability::tracing_setup::events;
use overseer_observability::{DegradationTracker, HealthReporter};

/// What one health check asks the controller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthVerdict {
    Healthy,
    /// Components were reinitialized; the controller resets to IDLE.
    Restarted { attempt: u32, failed: Vec<String> },
    /// The restart budget is spent; the controller halts.
    Exhausted { attempts: u32, failed: Vec<String> },
}

pub struct HealthMonitor {
    probes: Vec<Arc<dyn IHealthProbe>>,
    interval: Duration,
    probe_timeout: Duration,
    max_restart_attempts: u32,
    restart_attempts: u32,
    last_check: Instant,
    reporter: HealthReporter,
    degradation: DegradationTracker,
}

impl HealthMonitor {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            probes: Vec::new(),
            interval: config.health_check_interval(),
            probe_timeout: config.health_probe_timeout(),
            max_restart_attempts: config.max_restart_attempts,
            restart_attempts: 0,
            last_check: Instant::now(),
            reporter: HealthReporter::new(),
            degradation: DegradationTracker::default(),
        }
    }

    pub fn add_probe(&mut self, probe: Arc<dyn IHealthProbe>) {
        self.probes.push(probe);
    }

    pub fn probe_count(&self) -> usize {
        self.probes.len()
    }

    /// Whether the fixed interval has passed since the last check.
    pub fn is_due(&self) -> bool {
        self.last_check.elapsed() >= self.interval
    }

    pub fn restart_attempts(&self) -> u32 {
        self.restart_attempts
    }

    pub fn reset_restarts(&mut self) {
        self.restart_attempts = 0;
    }

    pub fn last_report(&self) -> Option<&HealthReport> {
        self.reporter.last_report()
    }

    pub fn degradation(&self) -> &DegradationTracker {
        &self.degradation
    }

    pub fn record_degradation(&mut self, event: DegradationEvent) {
        self.degradation.record(event);
    }

    /// Probe every component, each under the probe timeout.
    pub async fn probe_all(&mut self) -> HealthReport {
        self.last_check = Instant::now();
        let mut components = Vec::with_capacity(self.probes.len());
        for probe in &self.probes {
            let health = match tokio::time::timeout(self.probe_timeout, probe.check()).await {
                Ok(health) => health,
                Err(_) => ComponentHealth::unhealthy(
                    probe.name(),
                    format!(
                        "health probe timed out after {}ms",
                        self.probe_timeout.as_millis()
                    ),
                ),
            };
            components.push(health);
        }
        self.reporter.report(components)
    }

    /// Probe, then apply the restart policy. A healthy report resets the
    /// restart counter; an unhealthy one reinitializes the failed
    /// components in place unless the budget is already spent.
    pub async fn check(&mut self) -> HealthVerdict {
        let report = self.probe_all().await;
        let failed: Vec<String> = report
            .components
            .iter()
            .filter(|c| c.status == HealthStatus::Unhealthy)
            .map(|c| c.name.clone())
            .collect();

        if failed.is_empty() {
            for component in &report.components {
                self.degradation.mark_recovered(&component.name);
            }
            if self.restart_attempts > 0 {
                tracing::info!(
                    previous_attempts = self.restart_attempts,
                    "health restored, restart counter reset"
                );
            }
            self.restart_attempts = 0;
            return HealthVerdict::Healthy;
        }

        self.restart_attempts += 1;
        for component in report
            .components
            .iter()
            .filter(|c| c.status == HealthStatus::Unhealthy)
        {
            let message = component.message.as_deref().unwrap_or("unhealthy");
            events::health_check_failed(&component.name, message, self.restart_attempts);
        }

        if self.restart_attempts > self.max_restart_attempts {
            return HealthVerdict::Exhausted {
                attempts: self.restart_attempts,
                failed,
            };
        }

        for probe in self.probes.iter().filter(|p| failed.iter().any(|f| f == p.name())) {
            let outcome = tokio::time::timeout(self.probe_timeout, probe.reinitialize()).await;
            let failure = match outcome {
                Ok(Ok(())) => None,
                Ok(Err(e)) => Some(e.to_string()),
                Err(_) => Some("reinitialization timed out".to_string()),
            };
            match failure {
                None => tracing::info!(component = probe.name(), "component reinitialized"),
                Some(reason) => self.degradation.record(DegradationEvent::now(
                    probe.name(),
                    reason,
                    "continue with existing instance",
                )),
            }
        }
        HealthVerdict::Restarted {
            attempt: self.restart_attempts,
            failed,
        }
    }
}

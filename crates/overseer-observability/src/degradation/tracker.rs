use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use overseer_core::models::DegradationEvent;

use crate::tracing_setup::events;

#[derive(Debug, Clone, Serialize)]
pub struct TrackedDegradation {
    pub event: DegradationEvent,
    pub recovered_at: Option<DateTime<Utc>>,
}

impl TrackedDegradation {
    pub fn is_active(&self) -> bool {
        self.recovered_at.is_none()
    }
}

/// Bounded history of degradation events. Oldest entries fall off once
/// `capacity` is reached.
#[derive(Debug)]
pub struct DegradationTracker {
    entries: VecDeque<TrackedDegradation>,
    capacity: usize,
}

impl Default for DegradationTracker {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl DegradationTracker {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, event: DegradationEvent) {
        events::degradation_triggered(&event.component, &event.failure, &event.fallback_used);
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(TrackedDegradation {
            event,
            recovered_at: None,
        });
    }

    /// Close every active degradation for `component`. Returns how many
    /// were closed.
    pub fn mark_recovered(&mut self, component: &str) -> usize {
        let now = Utc::now();
        let mut closed = 0;
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.is_active() && e.event.component == component)
        {
            entry.recovered_at = Some(now);
            closed += 1;
        }
        if closed > 0 {
            tracing::info!(component, closed, "component recovered");
        }
        closed
    }

    pub fn is_degraded(&self, component: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.is_active() && e.event.component == component)
    }

    /// Distinct components with at least one open degradation.
    pub fn degraded_components(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .entries
            .iter()
            .filter(|e| e.is_active())
            .map(|e| e.event.component.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    pub fn entries(&self) -> impl Iterator<Item = &TrackedDegradation> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Events for `component` raised within `window` of now.
    pub fn count_recent(&self, component: &str, window: Duration) -> usize {
        let cutoff = Utc::now() - window;
        self.entries
            .iter()
            .filter(|e| e.event.component == component && e.event.timestamp >= cutoff)
            .count()
    }

    /// Total time `component` has spent degraded, counting open
    /// degradations up to now.
    pub fn degraded_duration(&self, component: &str) -> Duration {
        let now = Utc::now();
        self.entries
            .iter()
            .filter(|e| e.event.component == component)
            .map(|e| e.recovered_at.unwrap_or(now) - e.event.timestamp)
            .fold(Duration::zero(), |acc, d| acc + d)
    }
}

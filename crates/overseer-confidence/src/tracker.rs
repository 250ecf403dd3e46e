//! Rolling per-strategy performance.

use std::collections::VecDeque;

use dashmap::DashMap;
use serde::Serialize;

use overseer_core::models::DecisionOutcome;

#[derive(Debug, Clone, Copy)]
struct Sample {
    success: bool,
    cost: f64,
    time_ms: u64,
    accuracy: f64,
}

#[derive(Debug, Clone, Default)]
struct Window {
    samples: VecDeque<Sample>,
    total_recorded: u64,
}

/// Summary of a strategy's recent outcomes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StrategyPerformance {
    pub strategy: String,
    /// Outcomes currently inside the rolling window.
    pub samples: usize,
    pub total_recorded: u64,
    pub success_rate: f64,
    pub average_cost: f64,
    pub average_time_ms: f64,
    pub average_accuracy: f64,
    /// Oldest first.
    pub accuracy_history: Vec<f64>,
}

/// Thread-safe rolling windows keyed by strategy name.
#[derive(Debug)]
pub struct StrategyTracker {
    windows: DashMap<String, Window>,
    capacity: usize,
}

impl StrategyTracker {
    pub fn new(capacity: usize) -> Self {
        Self {
            windows: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&self, outcome: &DecisionOutcome) {
        let mut window = self.windows.entry(outcome.strategy.clone()).or_default();
        if window.samples.len() == self.capacity {
            window.samples.pop_front();
        }
        window.samples.push_back(Sample {
            success: outcome.kind.is_success(),
            cost: outcome.cost,
            time_ms: outcome.resolution_time_ms,
            accuracy: outcome.confidence_accuracy,
        });
        window.total_recorded += 1;
    }

    pub fn performance(&self, strategy: &str) -> Option<StrategyPerformance> {
        let window = self.windows.get(strategy)?;
        let n = window.samples.len();
        if n == 0 {
            return None;
        }
        let count = n as f64;
        let mean = |f: fn(&Sample) -> f64| window.samples.iter().map(f).sum::<f64>() / count;
        Some(StrategyPerformance {
            strategy: strategy.to_string(),
            samples: n,
            total_recorded: window.total_recorded,
            success_rate: mean(|s| if s.success { 1.0 } else { 0.0 }),
            average_cost: mean(|s| s.cost),
            average_time_ms: mean(|s| s.time_ms as f64),
            average_accuracy: mean(|s| s.accuracy),
            accuracy_history: window.samples.iter().map(|s| s.accuracy).collect(),
        })
    }

    pub fn strategies(&self) -> Vec<String> {
        let mut names: Vec<String> = self.windows.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn clear(&self) {
        self.windows.clear();
    }
}

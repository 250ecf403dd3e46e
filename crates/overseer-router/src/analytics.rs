//! Transition-history analytics.

use std::collections::HashMap;

use serde::Serialize;

use overseer_core::models::{StageTransition, TransitionKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionCount {
    pub from: String,
    pub to: String,
    pub count: usize,
}

/// Snapshot of routing behaviour over the current history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingAnalytics {
    pub total_transitions: usize,
    pub backward_transitions: usize,
    pub substitutions: u64,
    pub completed_paths: usize,
    pub average_path_length: f64,
    pub most_frequent: Vec<TransitionCount>,
    pub bottlenecks: Vec<String>,
}

impl RoutingAnalytics {
    pub fn from_history(
        history: &[StageTransition],
        stages: &[String],
        substitutions: u64,
        top_n: usize,
    ) -> Self {
        Self {
            total_transitions: history.len(),
            backward_transitions: backward_count(history),
            substitutions,
            completed_paths: completed_paths(history).len(),
            average_path_length: average_completed_path_length(history),
            most_frequent: most_frequent(history, top_n),
            bottlenecks: bottlenecks(history, stages),
        }
    }
}

/// Stage-to-stage edges by traversal count, ties in name order.
/// Terminations are not edges and are not counted.
pub fn most_frequent(history: &[StageTransition], n: usize) -> Vec<TransitionCount> {
    let mut counts: HashMap<(&str, &str), usize> = HashMap::new();
    for t in history {
        if let Some(to) = t.to_stage.as_deref() {
            *counts.entry((t.from_stage.as_str(), to)).or_default() += 1;
        }
    }
    let mut ranked: Vec<TransitionCount> = counts
        .into_iter()
        .map(|((from, to), count)| TransitionCount {
            from: from.to_string(),
            to: to.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.from.cmp(&b.from))
            .then_with(|| a.to.cmp(&b.to))
    });
    ranked.truncate(n);
    ranked
}

pub fn backward_count(history: &[StageTransition]) -> usize {
    history
        .iter()
        .filter(|t| t.kind == Some(TransitionKind::Backward))
        .count()
}

/// Lengths of every path that reached a termination. A path runs from
/// the previous termination (or the start of history) up to and
/// including the terminating transition, so its length is the number of
/// stages visited.
fn completed_paths(history: &[StageTransition]) -> Vec<usize> {
    let mut lengths = Vec::new();
    let mut current = 0usize;
    for t in history {
        current += 1;
        if t.to_stage.is_none() {
            lengths.push(current);
            current = 0;
        }
    }
    lengths
}

pub fn average_completed_path_length(history: &[StageTransition]) -> f64 {
    let lengths = completed_paths(history);
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
}

/// Stages whose outgoing retry/reroute count exceeds the mean over all
/// stages, highest count first.
pub fn bottlenecks(history: &[StageTransition], stages: &[String]) -> Vec<String> {
    if stages.is_empty() {
        return Vec::new();
    }
    let mut rework: HashMap<&str, usize> = stages.iter().map(|s| (s.as_str(), 0)).collect();
    for t in history.iter().filter(|t| t.decision.is_rework()) {
        if let Some(count) = rework.get_mut(t.from_stage.as_str()) {
            *count += 1;
        }
    }
    let mean = rework.values().sum::<usize>() as f64 / stages.len() as f64;

    let mut over: Vec<(&str, usize)> = rework
        .into_iter()
        .filter(|(_, count)| *count as f64 > mean)
        .collect();
    over.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    over.into_iter().map(|(s, _)| s.to_string()).collect()
}

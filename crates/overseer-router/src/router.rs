//! Decision → next-stage routing.

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use overseer_core::errors::{OverseerResult, RouterError};
use overseer_core::models::{StageTransition, StrategicDecision, TransitionKind};

use crate::analytics::{self, RoutingAnalytics, TransitionCount};
use crate::graph::StageGraph;

/// Known recovery paths `(from, to, weight)`. Cheaper weight means a
/// preferred fallback; a validation failure goes back to `execute` more
/// readily than all the way to `reflect`.
pub const CURATED_BACKWARD_EDGES: &[(&str, &str, f64)] = &[
    ("reflect", "research", 0.8),
    ("decide", "reflect", 0.8),
    ("decide", "research", 1.2),
    ("execute", "decide", 0.9),
    ("validate", "execute", 0.5),
    ("validate", "reflect", 1.5),
    ("validate", "research", 1.8),
    ("solidify", "validate", 0.7),
];

const FORWARD_WEIGHT: f64 = 1.0;
const LOOP_WEIGHT: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    /// `None` means the workflow ends here.
    pub next_stage: Option<String>,
    pub paused: bool,
    /// The requested target had no direct edge; `next_stage` is the first
    /// hop of the shortest weighted path instead.
    pub substituted: bool,
    /// Full planned path for substituted reroutes, otherwise empty.
    pub path: Vec<String>,
    pub kind: Option<TransitionKind>,
    pub reason: String,
}

impl RouteResult {
    fn stay(stage: &str, paused: bool, reason: String) -> Self {
        Self {
            next_stage: Some(stage.to_string()),
            paused,
            substituted: false,
            path: Vec::new(),
            kind: Some(TransitionKind::Loop),
            reason,
        }
    }

    fn terminate(reason: String) -> Self {
        Self {
            next_stage: None,
            paused: false,
            substituted: false,
            path: Vec::new(),
            kind: None,
            reason,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StageRouter {
    graph: StageGraph,
    /// Stage names in forward order.
    order: Vec<String>,
    history: Vec<StageTransition>,
    substitutions: u64,
}

impl StageRouter {
    /// Forward edges between consecutive stages, a self-loop on every
    /// stage, and every curated backward edge whose endpoints both exist.
    pub fn new(stages: &[&str]) -> OverseerResult<Self> {
        if stages.is_empty() {
            return Err(RouterError::EmptyWorkflow.into());
        }
        let mut graph = StageGraph::new();
        for stage in stages {
            graph.add_stage(stage)?;
        }
        for pair in stages.windows(2) {
            graph.add_edge(pair[0], pair[1], FORWARD_WEIGHT, TransitionKind::Forward)?;
        }
        for stage in stages {
            graph.add_edge(stage, stage, LOOP_WEIGHT, TransitionKind::Loop)?;
        }
        for (from, to, weight) in CURATED_BACKWARD_EDGES {
            if graph.id(from).is_some() && graph.id(to).is_some() {
                graph.add_edge(from, to, *weight, TransitionKind::Backward)?;
            }
        }
        debug!(
            stages = graph.stage_count(),
            edges = graph.edge_count(),
            "stage graph built"
        );
        Ok(Self {
            graph,
            order: stages.iter().map(|s| s.to_string()).collect(),
            history: Vec::new(),
            substitutions: 0,
        })
    }

    /// The seven-stage TRRDEVS workflow.
    pub fn trrdevs() -> OverseerResult<Self> {
        Self::new(&overseer_core::constants::TRRDEVS_STAGES)
    }

    pub fn graph(&self) -> &StageGraph {
        &self.graph
    }

    pub fn stages(&self) -> &[String] {
        &self.order
    }

    pub fn first_stage(&self) -> &str {
        &self.order[0]
    }

    pub fn add_backward_edge(&mut self, from: &str, to: &str, weight: f64) -> OverseerResult<()> {
        self.graph.add_edge(from, to, weight, TransitionKind::Backward)
    }

    /// Outgoing `(stage, weight, kind)` from `stage`.
    pub fn neighbors(&self, stage: &str) -> OverseerResult<Vec<(String, f64, TransitionKind)>> {
        let id = self.graph.require(stage)?;
        Ok(self
            .graph
            .edges_from(id)
            .iter()
            .map(|e| (self.graph.name(e.to).to_string(), e.weight, e.kind))
            .collect())
    }

    /// Shortest weighted path as stage names, both endpoints included.
    pub fn shortest_path(&self, from: &str, to: &str) -> OverseerResult<(Vec<String>, f64)> {
        let from_id = self.graph.require(from)?;
        let to_id = self.graph.require(to)?;
        let (path, cost) = self
            .graph
            .shortest_path(from_id, to_id)
            .ok_or_else(|| RouterError::NoPath {
                from: from.to_string(),
                to: to.to_string(),
            })?;
        Ok((
            path.into_iter()
                .map(|id| self.graph.name(id).to_string())
                .collect(),
            cost,
        ))
    }

    /// Compute and record the next stage for `decision` taken at `current`.
    pub fn route(
        &mut self,
        current: &str,
        decision: &StrategicDecision,
    ) -> OverseerResult<RouteResult> {
        let current_id = self.graph.require(current)?;

        let result = match decision {
            StrategicDecision::Proceed => {
                let position = current_id.0;
                match self.order.get(position + 1) {
                    Some(next) => RouteResult {
                        next_stage: Some(next.clone()),
                        paused: false,
                        substituted: false,
                        path: Vec::new(),
                        kind: Some(TransitionKind::Forward),
                        reason: format!("proceed from {current} to {next}"),
                    },
                    None => RouteResult::terminate(format!("workflow complete after {current}")),
                }
            }
            StrategicDecision::Retry => {
                RouteResult::stay(current, false, format!("retry {current}"))
            }
            StrategicDecision::Pause => {
                RouteResult::stay(current, true, format!("paused at {current}"))
            }
            StrategicDecision::Other(label) => RouteResult::stay(
                current,
                false,
                format!("no routing rule for decision '{label}', staying at {current}"),
            ),
            StrategicDecision::Abort | StrategicDecision::Escalate => RouteResult::terminate(
                format!("workflow terminated at {current} by {}", decision.label()),
            ),
            StrategicDecision::Reroute(target) => self.reroute(current, target)?,
        };

        self.record(current, decision, &result);
        Ok(result)
    }

    fn reroute(&mut self, current: &str, target: &str) -> OverseerResult<RouteResult> {
        let from = self.graph.require(current)?;
        let to = self.graph.require(target)?;

        if let Some(edge) = self.graph.edge(from, to) {
            return Ok(RouteResult {
                next_stage: Some(target.to_string()),
                paused: false,
                substituted: false,
                path: Vec::new(),
                kind: Some(edge.kind),
                reason: format!("reroute from {current} to {target}"),
            });
        }

        let (path, cost) = self.shortest_path(current, target)?;
        let first_hop = path.get(1).cloned().ok_or_else(|| RouterError::NoPath {
            from: current.to_string(),
            to: target.to_string(),
        })?;
        let hop_id = self.graph.require(&first_hop)?;
        let kind = self.graph.edge(from, hop_id).map(|e| e.kind);
        self.substitutions += 1;
        warn!(
            from = current,
            requested = target,
            substitute = %first_hop,
            path = ?path,
            cost,
            "no direct edge for reroute; taking first hop of shortest path"
        );
        Ok(RouteResult {
            next_stage: Some(first_hop.clone()),
            paused: false,
            substituted: true,
            path,
            kind,
            reason: format!(
                "reroute to {target} substituted: no direct edge from {current}, moving to {first_hop}"
            ),
        })
    }

    fn record(&mut self, current: &str, decision: &StrategicDecision, result: &RouteResult) {
        info!(
            from = current,
            to = result.next_stage.as_deref().unwrap_or("<end>"),
            decision = %decision,
            substituted = result.substituted,
            "stage transition"
        );
        self.history.push(StageTransition {
            from_stage: current.to_string(),
            to_stage: result.next_stage.clone(),
            reason: result.reason.clone(),
            decision: decision.clone(),
            kind: result.kind,
            timestamp: Utc::now(),
        });
    }

    // ── Analytics ───────────────────────────────────────────────────────

    pub fn history(&self) -> &[StageTransition] {
        &self.history
    }

    pub fn reset_history(&mut self) {
        self.history.clear();
        self.substitutions = 0;
    }

    pub fn substitution_count(&self) -> u64 {
        self.substitutions
    }

    pub fn most_frequent_transitions(&self, n: usize) -> Vec<TransitionCount> {
        analytics::most_frequent(&self.history, n)
    }

    pub fn backward_transition_count(&self) -> usize {
        analytics::backward_count(&self.history)
    }

    pub fn average_path_length(&self) -> f64 {
        analytics::average_completed_path_length(&self.history)
    }

    pub fn bottleneck_stages(&self) -> Vec<String> {
        analytics::bottlenecks(&self.history, &self.order)
    }

    pub fn analytics(&self, top_n: usize) -> RoutingAnalytics {
        RoutingAnalytics::from_history(&self.history, &self.order, self.substitutions, top_n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> StageRouter {
        StageRouter::trrdevs().unwrap()
    }

    #[test]
    fn proceed_walks_forward() {
        let mut r = router();
        let result = r.route("think", &StrategicDecision::Proceed).unwrap();
        assert_eq!(result.next_stage.as_deref(), Some("research"));
        assert_eq!(result.kind, Some(TransitionKind::Forward));
    }

    #[test]
    fn proceed_from_last_stage_ends_workflow() {
        let mut r = router();
        let result = r.route("solidify", &StrategicDecision::Proceed).unwrap();
        assert!(result.next_stage.is_none());
    }

    #[test]
    fn retry_and_pause_stay_put() {
        let mut r = router();
        let retry = r.route("execute", &StrategicDecision::Retry).unwrap();
        assert_eq!(retry.next_stage.as_deref(), Some("execute"));
        assert!(!retry.paused);

        let pause = r.route("execute", &StrategicDecision::Pause).unwrap();
        assert_eq!(pause.next_stage.as_deref(), Some("execute"));
        assert!(pause.paused);
    }

    #[test]
    fn abort_and_escalate_terminate() {
        let mut r = router();
        assert!(r.route("decide", &StrategicDecision::Abort).unwrap().next_stage.is_none());
        assert!(r.route("decide", &StrategicDecision::Escalate).unwrap().next_stage.is_none());
    }

    #[test]
    fn unknown_decision_stays() {
        let mut r = router();
        let result = r
            .route("reflect", &StrategicDecision::Other("consult".into()))
            .unwrap();
        assert_eq!(result.next_stage.as_deref(), Some("reflect"));
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let mut r = router();
        assert!(r.route("deploy", &StrategicDecision::Proceed).is_err());
        assert!(r
            .route("think", &StrategicDecision::Reroute("deploy".into()))
            .is_err());
    }

    #[test]
    fn empty_workflow_is_rejected() {
        assert!(StageRouter::new(&[]).is_err());
    }

    #[test]
    fn curated_edges_skip_missing_stages() {
        let r = StageRouter::new(&["execute", "validate"]).unwrap();
        assert!(r.graph().has_edge("validate", "execute"));
        assert!(!r.graph().has_edge("validate", "reflect"));
    }
}

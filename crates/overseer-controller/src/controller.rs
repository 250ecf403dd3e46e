//! The supervisory state machine.
//!
//! `step` runs exactly one loop iteration: the abort flag is checked
//! first, then the health interval, then the handler for the current
//! state. `transition` is the only place the state is written.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn, Instrument};

use overseer_confidence::AdaptiveConfidenceEngine;
use overseer_core::config::ControllerConfig;
use overseer_core::constants::MAX_TRANSITION_HISTORY;
use overseer_core::models::{
    ControllerState, DegradationEvent, ErrorEvent, NewErrorRecord, StateChange,
};
use overseer_core::traits::{
    IHealthProbe, IInterventionBuilder, IKnowledgeLedger, IRemediationExecutor, ISnapshotManager,
};
use overseer_observability::tracing_setup::events;
use overseer_observability::{detection_span, intervention_span, rollback_span};
use overseer_recall::RecallDb;
use overseer_router::StageRouter;
use overseer_watchdog::{EventCallback, Watchdog};

use crate::abort::AbortHandle;
use crate::classify;
use crate::health::{HealthMonitor, HealthVerdict};
use crate::intervention::Conclusion;
use crate::probes::{ConfidenceProbe, RecallProbe};
use crate::stats::{ControllerStats, RunSummary};
use crate::timeouts;

/// External collaborators the controller drives but does not own.
#[derive(Clone)]
pub struct Collaborators {
    pub builder: Arc<dyn IInterventionBuilder>,
    pub executor: Arc<dyn IRemediationExecutor>,
    pub snapshots: Arc<dyn ISnapshotManager>,
    pub ledger: Option<Arc<dyn IKnowledgeLedger>>,
}

pub struct Controller {
    pub(crate) config: ControllerConfig,
    state: ControllerState,
    events_tx: UnboundedSender<ErrorEvent>,
    events_rx: UnboundedReceiver<ErrorEvent>,
    /// Dequeued but not yet classified.
    pending: Option<ErrorEvent>,
    /// The event being intervened on, kept through MONITORING.
    current_event: Option<ErrorEvent>,
    pub(crate) recall: Arc<RecallDb>,
    pub(crate) confidence: Arc<AdaptiveConfidenceEngine>,
    pub(crate) router: Arc<Mutex<StageRouter>>,
    pub(crate) collaborators: Collaborators,
    pub(crate) health: HealthMonitor,
    abort: AbortHandle,
    pub(crate) current_stage: String,
    pub(crate) domain: String,
    history: VecDeque<StateChange>,
    pub(crate) stats: ControllerStats,
    /// Consecutive failed remediations per error type.
    pub(crate) failure_streaks: HashMap<String, u32>,
    pub(crate) cost_spent: f64,
    backoff: bool,
}

impl Controller {
    /// Wire a controller from explicit component instances. The recall
    /// and confidence stores are probed on the health interval.
    pub fn new(
        config: ControllerConfig,
        recall: Arc<RecallDb>,
        confidence: Arc<AdaptiveConfidenceEngine>,
        router: StageRouter,
        collaborators: Collaborators,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let mut health = HealthMonitor::new(&config);
        health.add_probe(Arc::new(RecallProbe::new(Arc::clone(&recall))));
        health.add_probe(Arc::new(ConfidenceProbe::new(Arc::clone(&confidence))));
        let current_stage = router.first_stage().to_string();

        Self {
            config,
            state: ControllerState::Idle,
            events_tx,
            events_rx,
            pending: None,
            current_event: None,
            recall,
            confidence,
            router: Arc::new(Mutex::new(router)),
            collaborators,
            health,
            abort: AbortHandle::new(),
            current_stage,
            domain: "general".to_string(),
            history: VecDeque::new(),
            stats: ControllerStats::default(),
            failure_streaks: HashMap::new(),
            cost_spent: 0.0,
            backoff: false,
        }
    }

    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn add_probe(&mut self, probe: Arc<dyn IHealthProbe>) {
        self.health.add_probe(probe);
    }

    // ── Accessors ───────────────────────────────────────────────────────

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_halted(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Producer side of the event queue. Clone freely.
    pub fn event_sender(&self) -> UnboundedSender<ErrorEvent> {
        self.events_tx.clone()
    }

    /// Register a channel callback on `watchdog` feeding this controller.
    pub fn attach_watchdog(&self, watchdog: &mut Watchdog) {
        watchdog.add_callback(EventCallback::channel(self.event_sender()));
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    /// Request a rollback at the next loop boundary.
    pub fn emergency_abort(&self, reason: impl Into<String>) {
        self.abort.abort(reason);
    }

    pub fn abort_requested(&self) -> bool {
        self.abort.is_requested()
    }

    pub fn restart_attempts(&self) -> u32 {
        self.health.restart_attempts()
    }

    pub fn stats(&self) -> ControllerStats {
        self.stats
    }

    pub fn history(&self) -> impl Iterator<Item = &StateChange> {
        self.history.iter()
    }

    pub fn last_change(&self) -> Option<&StateChange> {
        self.history.back()
    }

    pub fn current_stage(&self) -> &str {
        &self.current_stage
    }

    pub fn current_event(&self) -> Option<&ErrorEvent> {
        self.current_event.as_ref()
    }

    pub fn router(&self) -> Arc<Mutex<StageRouter>> {
        Arc::clone(&self.router)
    }

    pub fn health_monitor(&self) -> &HealthMonitor {
        &self.health
    }

    pub fn recall(&self) -> &Arc<RecallDb> {
        &self.recall
    }

    pub fn confidence(&self) -> &Arc<AdaptiveConfidenceEngine> {
        &self.confidence
    }

    // ── Loop ────────────────────────────────────────────────────────────

    /// Drive the loop until the controller halts in ERROR.
    pub async fn run(&mut self) -> RunSummary {
        info!(state = %self.state, stage = %self.current_stage, "controller run loop started");
        while !self.state.is_terminal() {
            self.step().await;
            if self.backoff {
                self.backoff = false;
                tokio::time::sleep(self.config.error_delay()).await;
            }
        }
        RunSummary {
            final_state: self.state,
            stats: self.stats,
            last_change: self.history.back().cloned(),
        }
    }

    /// One loop iteration. Returns the state after it.
    pub async fn step(&mut self) -> ControllerState {
        if self.state.is_terminal() {
            return self.state;
        }
        self.stats.iterations += 1;

        if self.abort.is_requested() && self.state != ControllerState::Rollback {
            let reason = self
                .abort
                .reason()
                .unwrap_or_else(|| "unspecified".to_string());
            self.stats.aborts += 1;
            self.transition(ControllerState::Rollback, format!("abort requested: {reason}"));
            return self.state;
        }

        // A rollback owed by a failed remediation runs before any restart.
        if self.state != ControllerState::Rollback
            && self.health.is_due()
            && self.check_health().await
        {
            return self.state;
        }

        let (next, reason) = match self.state {
            ControllerState::Idle => self.handle_idle().await,
            ControllerState::Detecting => {
                let span = detection_span!(self.state);
                self.handle_detecting().instrument(span).await
            }
            ControllerState::Intervening => self.handle_intervening().await,
            ControllerState::Monitoring => self.handle_monitoring().await,
            ControllerState::Rollback => self.handle_rollback().await,
            ControllerState::Error => return self.state,
        };
        self.transition(next, reason);
        self.state
    }

    /// Probe every component now and apply the restart policy.
    /// Returns whether the check changed state. Deferred while a rollback
    /// is pending, so the check stays due until the restore has run.
    pub async fn check_health(&mut self) -> bool {
        if self.state.is_terminal() || self.state == ControllerState::Rollback {
            return false;
        }
        self.stats.health_checks += 1;
        match self.health.check().await {
            HealthVerdict::Healthy => {
                debug!("health check passed");
                false
            }
            HealthVerdict::Restarted { attempt, failed } => {
                self.stats.restarts += 1;
                self.pending = None;
                self.current_event = None;
                self.transition(
                    ControllerState::Idle,
                    format!(
                        "restart attempt {attempt} after unhealthy components: {}",
                        failed.join(", ")
                    ),
                );
                true
            }
            HealthVerdict::Exhausted { attempts, failed } => {
                self.transition(
                    ControllerState::Error,
                    format!(
                        "{} still unhealthy after {attempts} checks, restart limit {} exceeded",
                        failed.join(", "),
                        self.config.max_restart_attempts
                    ),
                );
                true
            }
        }
    }

    fn transition(&mut self, to: ControllerState, reason: impl Into<String>) {
        let reason = reason.into();
        let from = self.state;
        events::state_transition(from.as_str(), to.as_str(), &reason);

        if self.history.len() == MAX_TRANSITION_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(StateChange {
            from,
            to,
            reason,
            at: Utc::now(),
        });
        self.state = to;
        self.stats.transitions += 1;

        if to.is_terminal() {
            error!(from = %from, "controller halted; external restart required");
        }
    }

    fn accept(&mut self, event: ErrorEvent) -> ErrorEvent {
        self.stats.events_received += 1;
        event
    }

    // ── Handlers ────────────────────────────────────────────────────────

    async fn handle_idle(&mut self) -> (ControllerState, String) {
        if self.pending.is_none() {
            if let Ok(event) = self.events_rx.try_recv() {
                self.pending = Some(self.accept(event));
            }
        }
        if self.pending.is_some() {
            return (ControllerState::Detecting, "event queued".to_string());
        }
        tokio::time::sleep(self.config.idle_delay()).await;
        (ControllerState::Detecting, "periodic re-check".to_string())
    }

    async fn handle_detecting(&mut self) -> (ControllerState, String) {
        let event = match self.pending.take() {
            Some(event) => event,
            None => {
                let limit = self.config.queue_timeout();
                match tokio::time::timeout(limit, self.events_rx.recv()).await {
                    Ok(Some(event)) => self.accept(event),
                    Ok(None) => {
                        return (ControllerState::Idle, "event queue closed".to_string());
                    }
                    Err(_) => {
                        let millis = limit.as_millis() as u64;
                        debug!(timeout_ms = millis, "no event before queue timeout");
                        return (
                            ControllerState::Idle,
                            format!("queue timeout after {millis}ms with no event"),
                        );
                    }
                }
            }
        };

        if classify::is_critical(&event) {
            let reason = format!(
                "critical {} ({}) on {}",
                event.error_type,
                event.severity.as_str(),
                event.source
            );
            self.current_event = Some(event);
            (ControllerState::Intervening, reason)
        } else {
            let reason = format!("non-critical {} observed", event.error_type);
            self.note_observation(&event).await;
            self.current_event = None;
            (ControllerState::Monitoring, reason)
        }
    }

    /// Remember a non-critical event so a later critical occurrence of the
    /// same signature counts as a repeat.
    async fn note_observation(&mut self, event: &ErrorEvent) {
        let mut input = NewErrorRecord::new(&event.error_type, &event.raw_text)
            .with_context("source", event.source.to_string())
            .with_context("severity", event.severity.as_str());
        input.file_path = event.file_path.clone();

        let recall = Arc::clone(&self.recall);
        let recorded = timeouts::blocking(
            overseer_recall::db::COMPONENT_NAME,
            self.config.detection_timeout(),
            move || recall.record_error(&input),
        )
        .await;
        if let Err(e) = recorded {
            warn!(error = %e, error_type = %event.error_type, "observation not recorded");
            self.health.record_degradation(DegradationEvent::now(
                overseer_recall::db::COMPONENT_NAME,
                e.to_string(),
                "observation dropped",
            ));
        }
    }

    async fn handle_intervening(&mut self) -> (ControllerState, String) {
        let Some(event) = self.current_event.clone() else {
            return (
                ControllerState::Error,
                "entered INTERVENING without an event".to_string(),
            );
        };
        self.stats.interventions += 1;

        let span = intervention_span!(event.id, event.error_type);
        match self.intervene(&event).instrument(span).await {
            Ok(Conclusion::Resolved(reason)) => {
                self.stats.remediations_succeeded += 1;
                (ControllerState::Monitoring, reason)
            }
            Ok(Conclusion::NotNeeded(reason)) | Ok(Conclusion::Escalated(reason)) => {
                (ControllerState::Monitoring, reason)
            }
            Ok(Conclusion::Failed(reason)) => {
                self.stats.remediations_failed += 1;
                self.backoff = true;
                (ControllerState::Rollback, reason)
            }
            Err(e) => {
                warn!(error = %e, error_type = %event.error_type, "intervention step failed");
                self.stats.remediations_failed += 1;
                self.backoff = true;
                (ControllerState::Rollback, format!("intervention failed: {e}"))
            }
        }
    }

    async fn handle_monitoring(&mut self) -> (ControllerState, String) {
        let limit = self.config.queue_timeout();
        let next = match self.pending.take() {
            Some(event) => Some(event),
            None => match tokio::time::timeout(limit, self.events_rx.recv()).await {
                Ok(Some(event)) => Some(self.accept(event)),
                Ok(None) | Err(_) => None,
            },
        };

        match next {
            None => {
                self.current_event = None;
                (
                    ControllerState::Idle,
                    format!("stable: no new errors within {}ms", limit.as_millis()),
                )
            }
            Some(event) if !classify::is_critical(&event) => {
                self.pending = Some(event);
                self.current_event = None;
                (
                    ControllerState::Idle,
                    "stable: only non-critical output".to_string(),
                )
            }
            Some(event) => match self.current_event.take() {
                // The restored snapshot predates the new event, so it is dropped.
                Some(previous) => (
                    ControllerState::Rollback,
                    format!(
                        "unstable: {} after intervening on {}",
                        event.error_type, previous.error_type
                    ),
                ),
                None => {
                    let reason = format!(
                        "unstable: {} with no intervention in progress",
                        event.error_type
                    );
                    self.pending = Some(event);
                    (ControllerState::Detecting, reason)
                }
            },
        }
    }

    async fn handle_rollback(&mut self) -> (ControllerState, String) {
        self.stats.rollbacks += 1;
        let cause = self
            .history
            .back()
            .map(|c| c.reason.clone())
            .unwrap_or_default();

        let span = rollback_span!(cause);
        match self.restore_latest().instrument(span).await {
            Ok(snapshot_id) => {
                events::rollback_finished(Some(&snapshot_id), true);
                self.abort.clear();
                self.health.reset_restarts();
                self.pending = None;
                self.current_event = None;
                (
                    ControllerState::Idle,
                    format!("restored snapshot {snapshot_id}"),
                )
            }
            Err(reason) => {
                events::rollback_finished(None, false);
                self.stats.rollbacks_failed += 1;
                (ControllerState::Error, format!("rollback failed: {reason}"))
            }
        }
    }

    async fn restore_latest(&self) -> Result<String, String> {
        let snapshots = Arc::clone(&self.collaborators.snapshots);
        let limit = self.config.rollback_timeout();

        let snapshot_id =
            match timeouts::bounded("snapshot_lookup", limit, snapshots.latest_snapshot_id()).await
            {
                Ok(Some(id)) => id,
                Ok(None) => return Err("no snapshot available".to_string()),
                Err(e) => return Err(e.to_string()),
            };

        match timeouts::bounded("snapshot_restore", limit, snapshots.restore_snapshot(&snapshot_id))
            .await
        {
            Ok(true) => Ok(snapshot_id),
            Ok(false) => Err(format!("restore of {snapshot_id} was refused")),
            Err(e) => Err(format!("restore of {snapshot_id}: {e}")),
        }
    }
}

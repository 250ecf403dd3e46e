//! ControllerBuilder: wires every component from an `OverseerConfig`.

use std::sync::Arc;

use overseer_confidence::AdaptiveConfidenceEngine;
use overseer_core::config::OverseerConfig;
use overseer_core::constants::TRRDEVS_STAGES;
use overseer_core::errors::{ConfigError, OverseerResult};
use overseer_core::traits::{
    IHealthProbe, IInterventionBuilder, IKnowledgeLedger, IRemediationExecutor, ISnapshotManager,
};
use overseer_recall::RecallDb;
use overseer_router::StageRouter;
use overseer_watchdog::Watchdog;

use crate::controller::{Collaborators, Controller};

/// Builder for a fully wired [`Controller`].
///
/// Stores are opened under `config.storage.root_dir` unless supplied
/// directly or `in_memory` is set. The stage list defaults to TRRDEVS.
pub struct ControllerBuilder {
    config: OverseerConfig,
    in_memory: bool,
    stages: Vec<String>,
    domain: Option<String>,
    recall: Option<Arc<RecallDb>>,
    confidence: Option<Arc<AdaptiveConfidenceEngine>>,
    builder: Option<Arc<dyn IInterventionBuilder>>,
    executor: Option<Arc<dyn IRemediationExecutor>>,
    snapshots: Option<Arc<dyn ISnapshotManager>>,
    ledger: Option<Arc<dyn IKnowledgeLedger>>,
    probes: Vec<Arc<dyn IHealthProbe>>,
}

impl ControllerBuilder {
    pub fn new(config: OverseerConfig) -> Self {
        Self {
            config,
            in_memory: false,
            stages: TRRDEVS_STAGES.iter().map(|s| s.to_string()).collect(),
            domain: None,
            recall: None,
            confidence: None,
            builder: None,
            executor: None,
            snapshots: None,
            ledger: None,
            probes: Vec::new(),
        }
    }

    pub fn in_memory(mut self) -> Self {
        self.in_memory = true;
        self
    }

    pub fn stages(mut self, stages: &[&str]) -> Self {
        self.stages = stages.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    pub fn recall(mut self, recall: Arc<RecallDb>) -> Self {
        self.recall = Some(recall);
        self
    }

    pub fn confidence(mut self, engine: Arc<AdaptiveConfidenceEngine>) -> Self {
        self.confidence = Some(engine);
        self
    }

    pub fn intervention_builder(mut self, builder: Arc<dyn IInterventionBuilder>) -> Self {
        self.builder = Some(builder);
        self
    }

    pub fn executor(mut self, executor: Arc<dyn IRemediationExecutor>) -> Self {
        self.executor = Some(executor);
        self
    }

    pub fn snapshots(mut self, snapshots: Arc<dyn ISnapshotManager>) -> Self {
        self.snapshots = Some(snapshots);
        self
    }

    pub fn ledger(mut self, ledger: Arc<dyn IKnowledgeLedger>) -> Self {
        self.ledger = Some(ledger);
        self
    }

    pub fn probe(mut self, probe: Arc<dyn IHealthProbe>) -> Self {
        self.probes.push(probe);
        self
    }

    pub fn build(self) -> OverseerResult<Controller> {
        let collaborators = Collaborators {
            builder: self.builder.ok_or_else(|| missing("intervention builder"))?,
            executor: self.executor.ok_or_else(|| missing("remediation executor"))?,
            snapshots: self.snapshots.ok_or_else(|| missing("snapshot manager"))?,
            ledger: self.ledger,
        };

        let recall = match self.recall {
            Some(recall) => recall,
            None if self.in_memory => Arc::new(RecallDb::open_in_memory(self.config.recall.clone())?),
            None => Arc::new(RecallDb::open(
                &self.config.storage,
                self.config.recall.clone(),
            )?),
        };
        let confidence = match self.confidence {
            Some(engine) => engine,
            None if self.in_memory => Arc::new(AdaptiveConfidenceEngine::open_in_memory(
                self.config.confidence.clone(),
            )?),
            None => Arc::new(AdaptiveConfidenceEngine::open(
                &self.config.storage,
                self.config.confidence.clone(),
            )?),
        };

        let stage_names: Vec<&str> = self.stages.iter().map(String::as_str).collect();
        let router = StageRouter::new(&stage_names)?;

        let mut controller = Controller::new(
            self.config.controller.clone(),
            recall,
            confidence,
            router,
            collaborators,
        );
        if let Some(domain) = self.domain {
            controller = controller.with_domain(domain);
        }
        for probe in self.probes {
            controller.add_probe(probe);
        }
        tracing::info!(
            stages = stage_names.len(),
            probes = controller.health_monitor().probe_count(),
            in_memory = self.in_memory,
            "controller built"
        );
        Ok(controller)
    }

    /// Build the controller plus a watchdog from `config.watchdog` whose
    /// events feed it. Register extra patterns on the watchdog before
    /// attaching streams.
    pub fn build_with_watchdog(self) -> OverseerResult<(Controller, Watchdog)> {
        let mut watchdog = Watchdog::from_config(&self.config.watchdog)?;
        let controller = self.build()?;
        controller.attach_watchdog(&mut watchdog);
        Ok((controller, watchdog))
    }
}

fn missing(name: &str) -> ConfigError {
    ConfigError::MissingComponent {
        name: name.to_string(),
    }
}

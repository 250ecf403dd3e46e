#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use overseer_controller::{Controller, ControllerBuilder};
use overseer_core::config::{ControllerConfig, OverseerConfig};
use overseer_core::errors::{OverseerError, OverseerResult};
use overseer_core::models::{
    ComponentHealth, ErrorEvent, InterventionContext, InterventionPlan, RemediationAction,
    RemediationOutcome, Severity, StrategicDecision, StreamSource,
};
use overseer_core::traits::{
    IHealthProbe, IInterventionBuilder, IRemediationExecutor, ISnapshotManager,
};

pub fn fast_config() -> ControllerConfig {
    ControllerConfig {
        queue_timeout_ms: 10,
        idle_delay_ms: 1,
        error_delay_ms: 1,
        health_check_interval_secs: 3600,
        health_probe_timeout_ms: 200,
        remediation_timeout_ms: 200,
        ..ControllerConfig::default()
    }
}

pub fn critical(error_type: &str, text: &str) -> ErrorEvent {
    ErrorEvent::new(error_type, Severity::High, text, StreamSource::Stderr)
}

pub fn benign(text: &str) -> ErrorEvent {
    ErrorEvent::new("Traceback", Severity::Low, text, StreamSource::Stderr)
}

/// Returns a fixed plan and remembers every context it was given.
pub struct ScriptedBuilder {
    pub plan: Mutex<InterventionPlan>,
    pub fail: bool,
    pub contexts: Mutex<Vec<InterventionContext>>,
}

impl ScriptedBuilder {
    pub fn with_plan(plan: InterventionPlan) -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(plan),
            fail: false,
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            plan: Mutex::new(InterventionPlan::new("unused")),
            fail: true,
            contexts: Mutex::new(Vec::new()),
        })
    }

    pub fn contexts(&self) -> Vec<InterventionContext> {
        self.contexts.lock().unwrap().clone()
    }
}

pub fn install_plan() -> InterventionPlan {
    InterventionPlan::new("install the missing dependency")
        .with_action(RemediationAction::new("install_dependency", "pip install requests"))
        .with_decision(StrategicDecision::Proceed)
        .with_confidence(0.6)
}

#[async_trait]
impl IInterventionBuilder for ScriptedBuilder {
    async fn build(&self, context: &InterventionContext) -> OverseerResult<InterventionPlan> {
        self.contexts.lock().unwrap().push(context.clone());
        if self.fail {
            return Err(OverseerError::dependency("operator", "template missing"));
        }
        Ok(self.plan.lock().unwrap().clone())
    }
}

pub enum Behaviour {
    Succeed,
    Fail,
    Hang,
}

pub struct ScriptedExecutor {
    pub behaviour: Behaviour,
    pub calls: AtomicUsize,
    pub executed: Mutex<Vec<RemediationAction>>,
}

impl ScriptedExecutor {
    pub fn new(behaviour: Behaviour) -> Arc<Self> {
        Arc::new(Self {
            behaviour,
            calls: AtomicUsize::new(0),
            executed: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn executed_strategies(&self) -> Vec<String> {
        self.executed
            .lock()
            .unwrap()
            .iter()
            .map(|a| a.strategy.clone())
            .collect()
    }
}

#[async_trait]
impl IRemediationExecutor for ScriptedExecutor {
    async fn execute(
        &self,
        actions: &[RemediationAction],
        _context: &InterventionContext,
    ) -> OverseerResult<RemediationOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.executed.lock().unwrap().extend_from_slice(actions);
        match self.behaviour {
            Behaviour::Succeed => Ok(RemediationOutcome::succeeded("installed").with_cost(0.1)),
            Behaviour::Fail => Ok(RemediationOutcome::failed("pip exited with 1")),
            Behaviour::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(RemediationOutcome::succeeded("too late"))
            }
        }
    }
}

pub struct FakeSnapshots {
    pub snapshot: Option<String>,
    pub restore_ok: bool,
    pub restores: AtomicUsize,
}

impl FakeSnapshots {
    pub fn available() -> Arc<Self> {
        Arc::new(Self {
            snapshot: Some("snap-1".to_string()),
            restore_ok: true,
            restores: AtomicUsize::new(0),
        })
    }

    pub fn none() -> Arc<Self> {
        Arc::new(Self {
            snapshot: None,
            restore_ok: true,
            restores: AtomicUsize::new(0),
        })
    }

    pub fn refusing() -> Arc<Self> {
        Arc::new(Self {
            snapshot: Some("snap-1".to_string()),
            restore_ok: false,
            restores: AtomicUsize::new(0),
        })
    }

    pub fn restores(&self) -> usize {
        self.restores.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ISnapshotManager for FakeSnapshots {
    async fn latest_snapshot_id(&self) -> OverseerResult<Option<String>> {
        Ok(self.snapshot.clone())
    }

    async fn restore_snapshot(&self, _snapshot_id: &str) -> OverseerResult<bool> {
        self.restores.fetch_add(1, Ordering::SeqCst);
        Ok(self.restore_ok)
    }
}

/// Unhealthy for the first `failures` checks, healthy afterwards.
pub struct FlakyProbe {
    pub failures: usize,
    pub checks: AtomicUsize,
    pub reinits: AtomicUsize,
}

impl FlakyProbe {
    pub fn failing_for(failures: usize) -> Arc<Self> {
        Arc::new(Self {
            failures,
            checks: AtomicUsize::new(0),
            reinits: AtomicUsize::new(0),
        })
    }

    pub fn reinits(&self) -> usize {
        self.reinits.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IHealthProbe for FlakyProbe {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn check(&self) -> ComponentHealth {
        let n = self.checks.fetch_add(1, Ordering::SeqCst);
        if n < self.failures {
            ComponentHealth::unhealthy("flaky", "not responding")
        } else {
            ComponentHealth::healthy("flaky")
        }
    }

    async fn reinitialize(&self) -> OverseerResult<()> {
        self.reinits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Healthy until switched off by the test.
pub struct SwitchProbe {
    pub healthy: AtomicBool,
}

impl SwitchProbe {
    pub fn healthy() -> Arc<Self> {
        Arc::new(Self {
            healthy: AtomicBool::new(true),
        })
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }
}

#[async_trait]
impl IHealthProbe for SwitchProbe {
    fn name(&self) -> &str {
        "switch"
    }

    async fn check(&self) -> ComponentHealth {
        if self.healthy.load(Ordering::SeqCst) {
            ComponentHealth::healthy("switch")
        } else {
            ComponentHealth::unhealthy("switch", "switched off")
        }
    }

    async fn reinitialize(&self) -> OverseerResult<()> {
        Ok(())
    }
}

pub struct Harness {
    pub controller: Controller,
    pub builder: Arc<ScriptedBuilder>,
    pub executor: Arc<ScriptedExecutor>,
    pub snapshots: Arc<FakeSnapshots>,
}

pub fn harness(
    config: ControllerConfig,
    builder: Arc<ScriptedBuilder>,
    executor: Arc<ScriptedExecutor>,
    snapshots: Arc<FakeSnapshots>,
) -> Harness {
    let controller = ControllerBuilder::new(OverseerConfig {
        controller: config,
        ..OverseerConfig::default()
    })
    .in_memory()
    .intervention_builder(builder.clone())
    .executor(executor.clone())
    .snapshots(snapshots.clone())
    .build()
    .unwrap();
    Harness {
        controller,
        builder,
        executor,
        snapshots,
    }
}

pub fn default_harness() -> Harness {
    harness(
        fast_config(),
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    )
}

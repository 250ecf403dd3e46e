mod common;

use std::time::{Duration, Instant};

use overseer_controller::ControllerBuilder;
use overseer_core::config::{ControllerConfig, OverseerConfig};
use overseer_core::models::{
    ControllerState, DecisionContext, DecisionOutcome, InterventionKind, InterventionPlan,
    OutcomeKind, RemediationAction, StreamSource,
};
use overseer_core::StrategicDecision;

use common::*;

#[tokio::test]
async fn detecting_with_empty_queue_times_out_to_idle() {
    let config = ControllerConfig {
        queue_timeout_ms: 1,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );

    assert_eq!(h.controller.step().await, ControllerState::Detecting);
    let started = Instant::now();
    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert!(started.elapsed() < Duration::from_secs(1));

    let change = h.controller.last_change().unwrap();
    assert_eq!(change.from, ControllerState::Detecting);
    assert!(change.reason.contains("queue timeout after 1ms"), "{}", change.reason);
}

#[tokio::test]
async fn abort_during_monitoring_forces_rollback_and_resets() {
    let mut h = default_harness();
    let probe = FlakyProbe::failing_for(1);
    h.controller.add_probe(probe.clone());

    // One failed health check leaves a non-zero restart counter.
    assert!(h.controller.check_health().await);
    assert_eq!(h.controller.restart_attempts(), 1);
    assert_eq!(probe.reinits(), 1);

    h.controller
        .event_sender()
        .send(benign("Traceback (most recent call last):"))
        .unwrap();
    assert_eq!(h.controller.step().await, ControllerState::Detecting);
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);

    h.controller.emergency_abort("operator pressed stop");
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("operator pressed stop"));
    assert!(h.controller.abort_requested());

    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert!(!h.controller.abort_requested());
    assert_eq!(h.controller.restart_attempts(), 0);
    assert_eq!(h.snapshots.restores(), 1);
    assert_eq!(h.controller.stats().aborts, 1);
}

#[tokio::test]
async fn critical_event_is_remediated_and_learned_from() {
    let mut h = default_harness();
    let mut event = critical("ModuleNotFoundError", "ModuleNotFoundError: No module named 'requests'");
    event.file_path = Some("main.py".to_string());
    h.controller.event_sender().send(event).unwrap();

    assert_eq!(h.controller.step().await, ControllerState::Detecting);
    assert_eq!(h.controller.step().await, ControllerState::Intervening);
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);
    assert_eq!(h.executor.calls(), 1);

    // Proceed moved the workflow on.
    assert_eq!(h.controller.current_stage(), "research");

    let recall = h.controller.recall().clone();
    let similar = recall
        .get_similar_errors("ModuleNotFoundError", Some("main.py"), None, None)
        .unwrap();
    assert_eq!(similar.len(), 1);
    assert_eq!(h.controller.confidence().outcome_count().unwrap(), 1);
    let perf = h
        .controller
        .confidence()
        .strategy_performance("install_dependency")
        .unwrap();
    assert_eq!(perf.samples, 1);

    let contexts = h.builder.contexts();
    assert_eq!(contexts[0].kind, InterventionKind::FirstOccurrence);
    assert_eq!(contexts[0].current_stage, "think");

    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert!(h.controller.last_change().unwrap().reason.starts_with("stable"));
    assert_eq!(h.controller.stats().remediations_succeeded, 1);
}

#[tokio::test]
async fn repeated_error_is_classified_as_repeat() {
    let mut h = default_harness();
    let tx = h.controller.event_sender();
    for _ in 0..2 {
        tx.send(critical("ImportError", "ImportError: cannot import name 'x' from 'y'"))
            .unwrap();
    }

    // First: IDLE -> DETECTING -> INTERVENING -> MONITORING.
    for _ in 0..3 {
        h.controller.step().await;
    }
    // The second event arrives during monitoring with intervention context.
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert_eq!(h.controller.step().await, ControllerState::Idle);

    tx.send(critical("ImportError", "ImportError: cannot import name 'x' from 'y'"))
        .unwrap();
    for _ in 0..3 {
        h.controller.step().await;
    }
    let contexts = h.builder.contexts();
    assert_eq!(contexts.len(), 2);
    assert_eq!(contexts[1].kind, InterventionKind::RepeatError);
    assert!(contexts[1].similar_count >= 1);
}

#[tokio::test]
async fn failed_remediation_rolls_back_and_is_remembered() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Fail),
        FakeSnapshots::available(),
    );
    let tx = h.controller.event_sender();
    tx.send(critical("ModuleNotFoundError", "ModuleNotFoundError: No module named 'requests'"))
        .unwrap();

    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("pip exited with 1"));
    assert_eq!(h.controller.step().await, ControllerState::Idle);

    let failed = h
        .controller
        .recall()
        .get_failed_fixes("ModuleNotFoundError", None)
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].command, "pip install requests");

    tx.send(critical("ModuleNotFoundError", "ModuleNotFoundError: No module named 'requests'"))
        .unwrap();
    for _ in 0..3 {
        h.controller.step().await;
    }
    let contexts = h.builder.contexts();
    assert_eq!(contexts[1].kind, InterventionKind::KnownFailingFix);
    assert_eq!(contexts[1].prior_attempts.len(), 1);
    assert!(!contexts[1].prior_attempts[0].success);
    assert_eq!(h.controller.stats().remediations_failed, 2);
}

#[tokio::test]
async fn hanging_remediation_times_out_into_rollback() {
    let config = ControllerConfig {
        remediation_timeout_ms: 20,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Hang),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("Timeout", "operation timed out"))
        .unwrap();

    for _ in 0..2 {
        h.controller.step().await;
    }
    let started = Instant::now();
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert!(started.elapsed() < Duration::from_secs(5));
    assert!(h.controller.last_change().unwrap().reason.contains("timed out"));
}

#[tokio::test]
async fn builder_failure_is_treated_as_remediation_failure() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::failing(),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("SyntaxError", "SyntaxError: invalid syntax"))
        .unwrap();
    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert!(h.controller.last_change().unwrap().reason.contains("template missing"));
    assert_eq!(h.executor.calls(), 0);
}

#[tokio::test]
async fn escalation_skips_remediation() {
    let plan = InterventionPlan::new("[MANUAL_ESCALATION] needs a human")
        .with_action(RemediationAction::new("ask_operator", "notify"));
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(plan),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("Panic", "thread 'main' panicked at src/main.rs:3:5"))
        .unwrap();
    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);
    assert_eq!(h.executor.calls(), 0);
    assert_eq!(h.controller.stats().escalations, 1);
    assert!(h.controller.last_change().unwrap().reason.contains("escalated"));
}

#[tokio::test]
async fn low_confidence_escalates_instead_of_executing() {
    let config = ControllerConfig {
        min_remediation_confidence: 0.7,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("ModuleNotFoundError", "No module named 'requests'"))
        .unwrap();
    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);
    assert_eq!(h.executor.calls(), 0);
    assert_eq!(h.controller.stats().escalations, 1);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("below confidence 0.70"));

    let outcomes = h.controller.confidence().recent_outcomes(10).unwrap();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].kind, OutcomeKind::Escalated);
    // Escalation ends the workflow where it stood.
    assert_eq!(h.controller.current_stage(), "think");
}

#[tokio::test]
async fn distrusted_primary_falls_back_to_next_strategy() {
    let config = ControllerConfig {
        min_remediation_confidence: 0.5,
        ..fast_config()
    };
    let plan = InterventionPlan::new("try a reinstall, else pin")
        .with_action(RemediationAction::new("reinstall", "pip install --force-reinstall requests"))
        .with_action(RemediationAction::new("pin_version", "pip install requests==2.31"))
        .with_decision(StrategicDecision::Retry)
        .with_confidence(0.6);
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(plan),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );

    // Same buckets the controller derives: think, no streak, nothing spent
    // of the budget, two actions.
    let engine = h.controller.confidence().clone();
    let ctx = DecisionContext::new("think")
        .with_error_type("ModuleNotFoundError")
        .with_cost(0.0, 10.0)
        .with_complexity(0.6);
    let signature = engine.signature_for(&ctx).unwrap();
    for i in 0..12 {
        let outcome = DecisionOutcome::new(
            format!("past-{i}"),
            "reinstall",
            OutcomeKind::Failure,
            0.6,
            signature.clone(),
            "think",
        );
        engine.record_outcome(&outcome).unwrap();
    }
    assert!(engine.adapt(0.6, &ctx, "reinstall").unwrap().value < 0.5);

    h.controller
        .event_sender()
        .send(critical("ModuleNotFoundError", "No module named 'requests'"))
        .unwrap();
    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);
    assert_eq!(h.executor.executed_strategies(), vec!["pin_version".to_string()]);
    assert!(h.controller.last_change().unwrap().reason.starts_with("pin_version success"));
}

#[tokio::test]
async fn spent_budget_changes_the_pattern_signature() {
    let config = ControllerConfig {
        cost_budget: 0.2,
        ..fast_config()
    };
    let plan = install_plan().with_decision(StrategicDecision::Retry);
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(plan),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    let tx = h.controller.event_sender();

    tx.send(critical("ImportError", "ImportError: cannot import name 'a'"))
        .unwrap();
    for _ in 0..3 {
        h.controller.step().await;
    }
    // Nothing else queued: MONITORING settles back to IDLE.
    assert_eq!(h.controller.step().await, ControllerState::Idle);

    tx.send(critical("ImportError", "ImportError: cannot import name 'a'"))
        .unwrap();
    for _ in 0..3 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.stats().remediations_succeeded, 2);
    assert_eq!(h.controller.current_stage(), "think");

    let outcomes = h.controller.confidence().recent_outcomes(10).unwrap();
    assert_eq!(outcomes.len(), 2);
    assert_ne!(outcomes[0].context_hash, outcomes[1].context_hash);
}

#[tokio::test]
async fn empty_plan_is_judged_unnecessary() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(InterventionPlan::new("nothing to do")),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("TypeError", "TypeError: 'NoneType' object is not callable"))
        .unwrap();
    for _ in 0..2 {
        h.controller.step().await;
    }
    assert_eq!(h.controller.step().await, ControllerState::Monitoring);
    assert!(h.controller.last_change().unwrap().reason.contains("no remediation"));
}

#[tokio::test]
async fn reroute_after_remediation_moves_the_stage() {
    let plan = install_plan().with_decision(StrategicDecision::Reroute("think".to_string()));
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(plan),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller
        .event_sender()
        .send(critical("ImportError", "ImportError: no module"))
        .unwrap();
    for _ in 0..3 {
        h.controller.step().await;
    }
    // think -> think is a self loop edge.
    assert_eq!(h.controller.current_stage(), "think");
    let router = h.controller.router();
    let history_len = router.lock().unwrap().history().len();
    assert_eq!(history_len, 1);
}

#[tokio::test]
async fn rollback_without_snapshot_halts() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::none(),
    );
    h.controller.emergency_abort("test");
    assert_eq!(h.controller.step().await, ControllerState::Rollback);
    assert_eq!(h.controller.step().await, ControllerState::Error);
    assert!(h.controller.is_halted());
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("no snapshot available"));

    // Terminal: further steps are no-ops.
    let iterations = h.controller.stats().iterations;
    assert_eq!(h.controller.step().await, ControllerState::Error);
    assert_eq!(h.controller.stats().iterations, iterations);
}

#[tokio::test]
async fn refused_restore_halts() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::refusing(),
    );
    h.controller.emergency_abort("test");
    h.controller.step().await;
    assert_eq!(h.controller.step().await, ControllerState::Error);
    assert!(h.controller.last_change().unwrap().reason.contains("refused"));
    assert_eq!(h.controller.stats().rollbacks_failed, 1);
}

#[tokio::test]
async fn run_returns_only_once_halted() {
    let mut h = harness(
        fast_config(),
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::none(),
    );
    let abort = h.controller.abort_handle();
    let stopper = async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        abort.abort("shutdown");
    };

    let (summary, ()) = tokio::join!(h.controller.run(), stopper);
    assert_eq!(summary.final_state, ControllerState::Error);
    assert!(summary.stats.iterations > 2);
    assert_eq!(
        summary.last_change.unwrap().from,
        ControllerState::Rollback
    );
}

#[tokio::test]
async fn watchdog_events_reach_the_controller() {
    let (mut controller, watchdog) = ControllerBuilder::new(OverseerConfig {
        controller: fast_config(),
        ..OverseerConfig::default()
    })
    .in_memory()
    .intervention_builder(ScriptedBuilder::with_plan(install_plan()))
    .executor(ScriptedExecutor::new(Behaviour::Succeed))
    .snapshots(FakeSnapshots::available())
    .build_with_watchdog()
    .unwrap();

    let output = b"collecting deps\nModuleNotFoundError: No module named 'requests'\n";
    let summary = watchdog
        .scan_reader(&output[..], StreamSource::Named("agent.log".to_string()))
        .await;
    assert_eq!(summary.matches, 1);
    assert_eq!(summary.undelivered, 0);

    assert_eq!(controller.step().await, ControllerState::Detecting);
    assert_eq!(controller.step().await, ControllerState::Intervening);
    assert_eq!(
        controller.current_event().unwrap().error_type,
        "ModuleNotFoundError"
    );
}

#[tokio::test]
async fn builder_requires_collaborators() {
    let err = ControllerBuilder::new(OverseerConfig::default())
        .in_memory()
        .build()
        .err()
        .unwrap();
    assert!(err.to_string().contains("intervention builder"));
}

#[tokio::test]
async fn transitions_are_always_recorded_with_reasons() {
    let mut h = default_harness();
    for _ in 0..4 {
        h.controller.step().await;
    }
    let changes: Vec<_> = h.controller.history().collect();
    assert_eq!(changes.len(), 4);
    assert!(changes.iter().all(|c| !c.reason.is_empty()));
    assert!(changes.windows(2).all(|w| w[0].to == w[1].from));
}

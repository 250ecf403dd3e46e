mod common;

use overseer_controller::HealthVerdict;
use overseer_core::config::ControllerConfig;
use overseer_core::models::{ControllerState, HealthStatus};

use common::*;

#[tokio::test]
async fn healthy_check_changes_nothing() {
    let mut h = default_harness();
    assert!(!h.controller.check_health().await);
    assert_eq!(h.controller.state(), ControllerState::Idle);
    let report = h.controller.health_monitor().last_report().unwrap();
    assert_eq!(report.overall_status, HealthStatus::Healthy);
    assert_eq!(report.components.len(), 2);
}

#[tokio::test]
async fn successful_probe_resets_restart_counter() {
    let mut h = default_harness();
    let probe = FlakyProbe::failing_for(2);
    h.controller.add_probe(probe.clone());

    assert!(h.controller.check_health().await);
    assert!(h.controller.check_health().await);
    assert_eq!(h.controller.restart_attempts(), 2);
    assert_eq!(probe.reinits(), 2);

    assert!(!h.controller.check_health().await);
    assert_eq!(h.controller.restart_attempts(), 0);
    assert_eq!(h.controller.stats().restarts, 2);
}

#[tokio::test]
async fn exceeding_restart_limit_is_terminal() {
    let config = ControllerConfig {
        max_restart_attempts: 1,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    h.controller.add_probe(FlakyProbe::failing_for(usize::MAX));

    assert!(h.controller.check_health().await);
    assert_eq!(h.controller.state(), ControllerState::Idle);
    assert!(h.controller.check_health().await);
    assert_eq!(h.controller.state(), ControllerState::Error);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("restart limit 1 exceeded"));

    // Halted controllers are not probed again.
    assert!(!h.controller.check_health().await);
}

#[tokio::test]
async fn health_runs_inside_the_loop_when_due() {
    let config = ControllerConfig {
        health_check_interval_secs: 0,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Succeed),
        FakeSnapshots::available(),
    );
    let probe = FlakyProbe::failing_for(1);
    h.controller.add_probe(probe.clone());

    // The first iteration is spent restarting.
    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("restart attempt 1"));
    // Healthy afterwards, so the loop proceeds normally.
    assert_eq!(h.controller.step().await, ControllerState::Detecting);
    assert_eq!(h.controller.stats().health_checks, 2);
}

#[tokio::test]
async fn monitor_verdicts_follow_the_policy() {
    let mut monitor = overseer_controller::HealthMonitor::new(&ControllerConfig {
        max_restart_attempts: 0,
        ..fast_config()
    });
    monitor.add_probe(FlakyProbe::failing_for(1));
    match monitor.check().await {
        HealthVerdict::Exhausted { attempts, failed } => {
            assert_eq!(attempts, 1);
            assert_eq!(failed, vec!["flaky".to_string()]);
        }
        other => panic!("expected exhaustion, got {other:?}"),
    }
}

#[tokio::test]
async fn owed_rollback_runs_before_a_restart() {
    let config = ControllerConfig {
        health_check_interval_secs: 0,
        ..fast_config()
    };
    let mut h = harness(
        config,
        ScriptedBuilder::with_plan(install_plan()),
        ScriptedExecutor::new(Behaviour::Fail),
        FakeSnapshots::available(),
    );
    let probe = SwitchProbe::healthy();
    h.controller.add_probe(probe.clone());
    h.controller
        .event_sender()
        .send(critical("ModuleNotFoundError", "No module named 'requests'"))
        .unwrap();

    assert_eq!(h.controller.step().await, ControllerState::Detecting);
    assert_eq!(h.controller.step().await, ControllerState::Intervening);
    assert_eq!(h.controller.step().await, ControllerState::Rollback);

    probe.set_healthy(false);
    assert!(!h.controller.check_health().await);
    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert_eq!(h.snapshots.restores(), 1);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("restored snapshot snap-1"));

    // The deferred check runs on the next iteration.
    assert_eq!(h.controller.step().await, ControllerState::Idle);
    assert!(h
        .controller
        .last_change()
        .unwrap()
        .reason
        .contains("restart attempt 1 after unhealthy components: switch"));
    assert_eq!(h.controller.restart_attempts(), 1);
}

use overseer_core::constants::{clamp_confidence, MANUAL_ESCALATION_MARKER};
use overseer_core::models::*;
use proptest::prelude::*;

#[test]
fn severity_orders_low_to_critical() {
    assert!(Severity::Low < Severity::Medium);
    assert!(Severity::High < Severity::Critical);
    assert_eq!(Severity::parse("HIGH"), Some(Severity::High));
    assert_eq!(Severity::parse("urgent"), None);
}

#[test]
fn outcome_kind_parses_its_own_labels() {
    for kind in OutcomeKind::ALL {
        assert_eq!(kind.as_str().parse::<OutcomeKind>().unwrap(), kind);
    }
    assert!("exploded".parse::<OutcomeKind>().is_err());
}

#[test]
fn partial_outcomes_count_as_resolved() {
    assert!(OutcomeKind::Partial.is_success());
    assert!(OutcomeKind::Partial.score() < OutcomeKind::Success.score());
    for kind in [OutcomeKind::Failure, OutcomeKind::Timeout, OutcomeKind::Escalated, OutcomeKind::Aborted] {
        assert!(!kind.is_success(), "{kind}");
    }
}

#[test]
fn outcome_accuracy_reflects_prediction_error() {
    let confident_hit = DecisionOutcome::new("d1", "reinstall", OutcomeKind::Success, 0.9, "h", "execute");
    assert!((confident_hit.confidence_accuracy - 0.9).abs() < 1e-12);

    let confident_miss = DecisionOutcome::new("d2", "reinstall", OutcomeKind::Failure, 0.9, "h", "execute");
    assert!((confident_miss.confidence_accuracy - 0.1).abs() < 1e-12);
}

#[test]
fn plan_detects_escalation_marker_in_message() {
    let plan = InterventionPlan::new(format!("cannot fix {MANUAL_ESCALATION_MARKER}"));
    assert!(plan.requires_manual_escalation());
    assert!(!InterventionPlan::new("pip install requests").requires_manual_escalation());
    assert!(InterventionPlan::new("x").escalated().requires_manual_escalation());
}

#[test]
fn plan_strategies_are_distinct_in_action_order() {
    let plan = InterventionPlan::new("fix")
        .with_action(RemediationAction::new("reinstall", "pip install x"))
        .with_action(RemediationAction::new("pin_version", "pip install x==1.0"))
        .with_action(RemediationAction::new("reinstall", "pip install --force x"));
    assert_eq!(plan.strategies().collect::<Vec<_>>(), vec!["reinstall", "pin_version"]);
    assert_eq!(plan.primary_strategy(), Some("reinstall"));
}

#[test]
fn decision_context_rejects_bad_numbers() {
    assert!(DecisionContext::new("execute").validate().is_ok());
    assert!(DecisionContext::new("").validate().is_err());
    assert!(DecisionContext::new("execute").with_cost(-1.0, 10.0).validate().is_err());
    assert!(DecisionContext::new("execute").with_complexity(f64::NAN).validate().is_err());
    assert!(DecisionContext::new("execute")
        .with_recent_success_rate(1.5)
        .validate()
        .is_err());
}

#[test]
fn cost_ratio_requires_budget() {
    assert_eq!(DecisionContext::new("x").with_cost(5.0, 0.0).cost_ratio(), None);
    assert_eq!(DecisionContext::new("x").with_cost(5.0, 10.0).cost_ratio(), Some(0.5));
}

#[test]
fn strategic_decision_display_includes_target() {
    assert_eq!(StrategicDecision::Reroute("research".into()).to_string(), "reroute(research)");
    assert_eq!(StrategicDecision::Proceed.to_string(), "proceed");
    assert!(StrategicDecision::Retry.is_rework());
    assert!(!StrategicDecision::Pause.is_rework());
}

#[test]
fn only_error_state_is_terminal() {
    for state in ControllerState::ALL {
        assert_eq!(state.is_terminal(), state == ControllerState::Error);
    }
}

proptest! {
    #[test]
    fn clamp_confidence_stays_in_range(value in proptest::num::f64::ANY) {
        let c = clamp_confidence(value);
        prop_assert!((0.01..=0.99).contains(&c));
    }
}

use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{Duration, Utc};
use proptest::prelude::*;
use tempfile::TempDir;

use overseer_core::config::{ConfidenceConfig, StorageConfig};
use overseer_core::models::{DecisionContext, DecisionOutcome, OutcomeKind, DEFAULT_VARIANCE};
use overseer_confidence::AdaptiveConfidenceEngine;

/// Calibration and strategy adjustment switched off so the Bayesian
/// blend can be observed in isolation.
fn blend_only() -> ConfidenceConfig {
    ConfidenceConfig {
        calibration_interval: 1_000_000,
        min_strategy_samples: 1_000_000,
        ..ConfidenceConfig::default()
    }
}

fn ctx() -> DecisionContext {
    DecisionContext::new("execute")
        .with_error_type("ModuleNotFoundError")
        .with_failures(1)
        .with_cost(10.0, 100.0)
}

fn record_n(
    engine: &AdaptiveConfidenceEngine,
    strategy: &str,
    kind: OutcomeKind,
    predicted: f64,
    n: usize,
) {
    static NEXT_ID: AtomicUsize = AtomicUsize::new(0);
    let sig = engine.signature_for(&ctx()).unwrap();
    for _ in 0..n {
        let id = NEXT_ID.fetch_add(1, Ordering::Relaxed);
        let outcome = DecisionOutcome::new(
            format!("{strategy}-{id}"),
            strategy,
            kind,
            predicted,
            sig.clone(),
            "execute",
        );
        engine.record_outcome(&outcome).unwrap();
    }
}

#[test]
fn no_history_returns_base_unchanged() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(ConfidenceConfig::default()).unwrap();
    let adapted = engine.adapt(0.63, &ctx(), "pip_install").unwrap();
    assert!((adapted.value - 0.63).abs() < 1e-12);
    assert!((adapted.variance - DEFAULT_VARIANCE).abs() < 1e-12);
    assert_eq!(adapted.sample_count, 0);
    assert!(!adapted.reasoning.is_empty());
}

#[test]
fn extreme_bases_are_clamped() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(ConfidenceConfig::default()).unwrap();
    assert_eq!(engine.adapt(0.0, &ctx(), "s").unwrap().value, 0.01);
    assert_eq!(engine.adapt(1.0, &ctx(), "s").unwrap().value, 0.99);
}

#[test]
fn success_history_raises_but_never_fully_overrides() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    record_n(&engine, "pip_install", OutcomeKind::Success, 0.2, 50);

    let adapted = engine.adapt(0.2, &ctx(), "pip_install").unwrap();
    assert_eq!(adapted.sample_count, 50);
    assert!((adapted.historical_weight - 0.8).abs() < 1e-12);
    assert!(adapted.value > 0.6, "value {}", adapted.value);
    assert!(adapted.value <= 0.2 * 0.2 + 0.8 + 1e-9);
    assert!(adapted.variance < DEFAULT_VARIANCE);
    assert!(adapted.reasoning.contains("historical"));
}

#[test]
fn failure_history_lowers_confidence() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    record_n(&engine, "retry", OutcomeKind::Failure, 0.8, 20);
    let adapted = engine.adapt(0.8, &ctx(), "retry").unwrap();
    assert!(adapted.value < 0.4, "value {}", adapted.value);
}

#[test]
fn history_is_per_strategy() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    record_n(&engine, "retry", OutcomeKind::Failure, 0.8, 10);
    let other = engine.adapt(0.7, &ctx(), "pip_install").unwrap();
    assert_eq!(other.sample_count, 0);
    assert!((other.value - 0.7).abs() < 1e-12);
}

#[test]
fn old_outcomes_count_less() {
    let fresh = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    let stale = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    let sig = fresh.signature_for(&ctx()).unwrap();
    for i in 0..4 {
        let base = DecisionOutcome::new(format!("d{i}"), "s", OutcomeKind::Success, 0.9, &sig, "execute");
        fresh.record_outcome(&base).unwrap();
        stale
            .record_outcome(&base.clone().recorded_at(Utc::now() - Duration::days(90)))
            .unwrap();
    }
    let a = fresh.adapt(0.5, &ctx(), "s").unwrap();
    let b = stale.adapt(0.5, &ctx(), "s").unwrap();
    assert!(a.historical_weight > b.historical_weight);
    assert!(a.value > b.value);
}

#[test]
fn calibration_recomputed_every_interval() {
    let config = ConfidenceConfig {
        calibration_interval: 5,
        min_strategy_samples: 1_000_000,
        ..ConfidenceConfig::default()
    };
    let engine = AdaptiveConfidenceEngine::open_in_memory(config).unwrap();
    record_n(&engine, "retry", OutcomeKind::Failure, 0.9, 4);
    assert_eq!(engine.calibration_factor(), 1.0);

    record_n(&engine, "retry", OutcomeKind::Failure, 0.9, 1);
    assert_eq!(engine.decisions_recorded(), 5);
    assert!((engine.calibration_factor() - 0.8).abs() < 1e-12);
}

#[test]
fn strategy_adjustment_is_bounded() {
    let config = ConfidenceConfig {
        calibration_interval: 1_000_000,
        min_strategy_samples: 5,
        ..ConfidenceConfig::default()
    };
    let engine = AdaptiveConfidenceEngine::open_in_memory(config).unwrap();
    record_n(&engine, "pip_install", OutcomeKind::Success, 0.5, 10);

    let adapted = engine.adapt(0.5, &ctx(), "pip_install").unwrap();
    assert!((adapted.strategy_adjustment - 0.2).abs() < 1e-12);

    let perf = engine.strategy_performance("pip_install").unwrap();
    assert_eq!(perf.samples, 10);
    assert_eq!(perf.success_rate, 1.0);
}

#[test]
fn pattern_tracks_observations() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    record_n(&engine, "retry", OutcomeKind::Success, 0.5, 3);
    record_n(&engine, "retry", OutcomeKind::Failure, 0.5, 1);

    let sig = engine.signature_for(&ctx()).unwrap();
    let pattern = engine.pattern(&sig).unwrap().unwrap();
    assert_eq!(pattern.sample_count, 4);
    assert!((pattern.success_rate - 0.75).abs() < 1e-12);
    assert!((0.01..=0.99).contains(&pattern.base_confidence));
}

#[test]
fn partial_outcomes_raise_pattern_success_rate() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    record_n(&engine, "rebuild", OutcomeKind::Partial, 0.5, 2);
    record_n(&engine, "rebuild", OutcomeKind::Failure, 0.5, 2);

    let sig = engine.signature_for(&ctx()).unwrap();
    let pattern = engine.pattern(&sig).unwrap().unwrap();
    assert!((pattern.success_rate - 0.5).abs() < 1e-12);
    let perf = engine.strategy_performance("rebuild").unwrap();
    assert!((perf.success_rate - 0.5).abs() < 1e-12);
}

#[test]
fn state_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig::rooted_at(dir.path());
    let sig;
    {
        let engine = AdaptiveConfidenceEngine::open(&storage, blend_only()).unwrap();
        record_n(&engine, "retry", OutcomeKind::Success, 0.6, 6);
        sig = engine.signature_for(&ctx()).unwrap();
    }
    let engine = AdaptiveConfidenceEngine::open(&storage, blend_only()).unwrap();
    assert_eq!(engine.decisions_recorded(), 6);
    assert_eq!(engine.outcome_count().unwrap(), 6);
    assert_eq!(engine.strategy_performance("retry").unwrap().samples, 6);
    assert_eq!(engine.pattern(&sig).unwrap().unwrap().sample_count, 6);
    assert_eq!(engine.adapt(0.5, &ctx(), "retry").unwrap().sample_count, 6);
}

#[test]
fn retention_purges_old_outcomes() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(blend_only()).unwrap();
    let sig = engine.signature_for(&ctx()).unwrap();
    let old = DecisionOutcome::new("old", "s", OutcomeKind::Success, 0.5, &sig, "execute")
        .recorded_at(Utc::now() - Duration::days(365));
    let new = DecisionOutcome::new("new", "s", OutcomeKind::Success, 0.5, &sig, "execute");
    engine.record_outcome(&old).unwrap();
    engine.record_outcome(&new).unwrap();

    assert_eq!(engine.purge_old_outcomes().unwrap(), 1);
    assert_eq!(engine.purge_old_outcomes().unwrap(), 0);
    assert_eq!(engine.outcome_count().unwrap(), 1);
}

#[test]
fn invalid_context_is_rejected() {
    let engine = AdaptiveConfidenceEngine::open_in_memory(ConfidenceConfig::default()).unwrap();
    let bad = DecisionContext::new("execute").with_cost(-1.0, 10.0);
    assert!(engine.adapt(0.5, &bad, "s").is_err());
}

fn kind_strategy() -> impl Strategy<Value = OutcomeKind> {
    prop::sample::select(OutcomeKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn adapted_value_always_in_bounds(
        base in prop_oneof![Just(0.0), Just(1.0), -5.0f64..5.0, Just(f64::NAN)],
        history in prop::collection::vec((kind_strategy(), 0.0f64..=1.0), 0..25),
        interval in 1u64..6,
    ) {
        let config = ConfidenceConfig {
            calibration_interval: interval,
            min_strategy_samples: 1,
            ..ConfidenceConfig::default()
        };
        let engine = AdaptiveConfidenceEngine::open_in_memory(config).unwrap();
        let sig = engine.signature_for(&ctx()).unwrap();
        for (i, (kind, predicted)) in history.iter().enumerate() {
            let outcome = DecisionOutcome::new(format!("d{i}"), "s", *kind, *predicted, &sig, "execute");
            engine.record_outcome(&outcome).unwrap();
        }
        let adapted = engine.adapt(base, &ctx(), "s").unwrap();
        prop_assert!((0.01..=0.99).contains(&adapted.value), "value {}", adapted.value);
    }
}

//! AdaptiveConfidenceEngine: adapt and learn.

use std::sync::Mutex;
use std::time::Instant;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use overseer_core::config::{ConfidenceConfig, StorageConfig};
use overseer_core::constants::clamp_confidence;
use overseer_core::errors::OverseerResult;
use overseer_core::models::{
    ComponentHealth, ConfidencePattern, DecisionContext, DecisionOutcome, HealthStatus,
    DEFAULT_VARIANCE,
};
use overseer_storage::{to_storage_err, Schema, StorageEngine};

use crate::beta::{accuracy_weight, recency_weight, BetaPosterior};
use crate::calibration;
use crate::features::ContextFeatures;
use crate::store::{self, CalibrationRow};
use crate::tracker::{StrategyPerformance, StrategyTracker};

pub const COMPONENT_NAME: &str = "confidence_engine";

/// An adapted confidence and how it was reached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdaptedConfidence {
    /// Final value, always within [0.01, 0.99].
    pub value: f64,
    pub base: f64,
    pub posterior_mean: f64,
    /// Share of the blend given to history, at most the configured cap.
    pub historical_weight: f64,
    pub calibration_factor: f64,
    /// Relative per-strategy adjustment, within ±cap.
    pub strategy_adjustment: f64,
    pub variance: f64,
    pub sample_count: usize,
    pub signature: String,
    pub reasoning: String,
}

pub struct AdaptiveConfidenceEngine {
    storage: StorageEngine,
    config: ConfidenceConfig,
    tracker: StrategyTracker,
    patterns: DashMap<String, ConfidencePattern>,
    calibration: Mutex<CalibrationRow>,
}

impl AdaptiveConfidenceEngine {
    pub fn open(storage: &StorageConfig, config: ConfidenceConfig) -> OverseerResult<Self> {
        let engine = StorageEngine::open(
            &storage.confidence_db_path(),
            Schema::Confidence,
            storage.read_pool_size,
        )?;
        Self::with_engine(engine, config)
    }

    pub fn open_in_memory(config: ConfidenceConfig) -> OverseerResult<Self> {
        Self::with_engine(StorageEngine::open_in_memory(Schema::Confidence)?, config)
    }

    fn with_engine(storage: StorageEngine, config: ConfidenceConfig) -> OverseerResult<Self> {
        let calibration = storage.with_reader(store::load_calibration)?;
        let tracker = StrategyTracker::new(config.strategy_window);

        // Warm the rolling windows, oldest first.
        let limit = config.max_outcomes_per_query;
        let mut recent = storage.with_reader(|conn| store::recent_outcomes(conn, limit))?;
        recent.reverse();
        for outcome in &recent {
            tracker.record(outcome);
        }
        debug!(
            warmed = recent.len(),
            calibration = calibration.factor,
            "confidence engine opened"
        );

        Ok(Self {
            storage,
            config,
            tracker,
            patterns: DashMap::new(),
            calibration: Mutex::new(calibration),
        })
    }

    pub fn config(&self) -> &ConfidenceConfig {
        &self.config
    }

    /// Pattern signature a context is grouped under.
    pub fn signature_for(&self, ctx: &DecisionContext) -> OverseerResult<String> {
        Ok(ContextFeatures::extract(ctx)?.signature())
    }

    /// Adapt `base` for `strategy` in `ctx`.
    ///
    /// With no prior outcomes for the signature and strategy, the (clamped)
    /// base is returned unchanged with the uniform-prior variance.
    pub fn adapt(
        &self,
        base: f64,
        ctx: &DecisionContext,
        strategy: &str,
    ) -> OverseerResult<AdaptedConfidence> {
        let features = ContextFeatures::extract(ctx)?;
        let signature = features.signature();
        let base = clamp_confidence(base);

        let limit = self.config.max_outcomes_per_query;
        let outcomes = self
            .storage
            .with_reader(|conn| store::outcomes_for(conn, &signature, strategy, limit))?;

        if outcomes.is_empty() {
            return Ok(AdaptedConfidence {
                value: base,
                base,
                posterior_mean: base,
                historical_weight: 0.0,
                calibration_factor: 1.0,
                strategy_adjustment: 0.0,
                variance: DEFAULT_VARIANCE,
                sample_count: 0,
                reasoning: format!(
                    "no history for {strategy} in this context; base confidence {base:.2} kept"
                ),
                signature,
            });
        }

        let now = Utc::now();
        let mut posterior = BetaPosterior::uniform();
        for o in &outcomes {
            let weight = recency_weight(o.recorded_at, now, self.config.half_life_days)
                * accuracy_weight(o.confidence_accuracy);
            posterior.observe(o.kind.score(), weight);
        }

        let n_eff = posterior.effective_samples;
        let historical_weight = (n_eff / (n_eff + self.config.prior_strength.max(f64::EPSILON)))
            .min(self.config.max_historical_weight)
            .clamp(0.0, 1.0);
        let posterior_mean = posterior.mean();
        let blended = (1.0 - historical_weight) * base + historical_weight * posterior_mean;

        let calibration_factor = self.calibration_factor();
        let calibrated = blended * calibration_factor;

        let strategy_adjustment = self.strategy_adjustment(strategy);
        let value = clamp_confidence(calibrated * (1.0 + strategy_adjustment));

        let reasoning = explain(
            strategy,
            base,
            blended,
            calibrated,
            value,
            outcomes.len(),
            historical_weight,
            calibration_factor,
            strategy_adjustment,
        );
        debug!(
            strategy,
            signature = %signature,
            base,
            value,
            samples = outcomes.len(),
            "confidence adapted"
        );

        Ok(AdaptedConfidence {
            value,
            base,
            posterior_mean,
            historical_weight,
            calibration_factor,
            strategy_adjustment,
            variance: posterior.variance(),
            sample_count: outcomes.len(),
            signature,
            reasoning,
        })
    }

    /// Persist an outcome and fold it into the pattern, the strategy
    /// tracker and (every N decisions) the calibration factor.
    pub fn record_outcome(&self, outcome: &DecisionOutcome) -> OverseerResult<()> {
        let pattern = self.storage.with_writer(|conn| {
            let tx = conn
                .unchecked_transaction()
                .map_err(|e| to_storage_err(format!("record_outcome begin: {e}")))?;
            store::insert_outcome(&tx, outcome)?;

            let mut pattern = match self.patterns.get(&outcome.context_hash) {
                Some(cached) => cached.clone(),
                None => store::get_pattern(&tx, &outcome.context_hash)?.unwrap_or_else(|| {
                    ConfidencePattern::new(&outcome.context_hash, outcome.predicted_confidence)
                }),
            };
            pattern.observe(
                outcome.kind.score(),
                outcome.kind.is_success(),
                outcome.recorded_at,
            );
            store::upsert_pattern(&tx, &pattern)?;

            tx.commit()
                .map_err(|e| to_storage_err(format!("record_outcome commit: {e}")))?;
            Ok(pattern)
        })?;
        self.patterns.insert(pattern.signature.clone(), pattern);
        self.tracker.record(outcome);

        let due = {
            let mut calibration = self.lock_calibration();
            calibration.decisions_recorded += 1;
            let row = *calibration;
            self.storage
                .with_writer(|conn| store::save_calibration(conn, row))?;
            let interval = self.config.calibration_interval.max(1);
            row.decisions_recorded % interval == 0
        };
        if due {
            self.recalibrate()?;
        }
        debug!(
            decision = %outcome.decision_id,
            strategy = %outcome.strategy,
            kind = %outcome.kind,
            "outcome recorded"
        );
        Ok(())
    }

    /// Recompute the global calibration factor from recent outcomes.
    pub fn recalibrate(&self) -> OverseerResult<f64> {
        let limit = self.config.max_outcomes_per_query;
        let recent = self
            .storage
            .with_reader(|conn| store::recent_outcomes(conn, limit))?;
        let factor = calibration::compute_factor(&recent);

        let row = {
            let mut calibration = self.lock_calibration();
            calibration.factor = factor;
            *calibration
        };
        self.storage
            .with_writer(|conn| store::save_calibration(conn, row))?;
        info!(factor, sampled = recent.len(), "calibration factor updated");
        Ok(factor)
    }

    pub fn calibration_factor(&self) -> f64 {
        self.lock_calibration().factor
    }

    pub fn decisions_recorded(&self) -> u64 {
        self.lock_calibration().decisions_recorded
    }

    pub fn strategy_performance(&self, strategy: &str) -> Option<StrategyPerformance> {
        self.tracker.performance(strategy)
    }

    pub fn pattern(&self, signature: &str) -> OverseerResult<Option<ConfidencePattern>> {
        if let Some(cached) = self.patterns.get(signature) {
            return Ok(Some(cached.clone()));
        }
        self.storage
            .with_reader(|conn| store::get_pattern(conn, signature))
    }

    /// Most recent outcomes first, across every strategy.
    pub fn recent_outcomes(&self, limit: usize) -> OverseerResult<Vec<DecisionOutcome>> {
        self.storage
            .with_reader(|conn| store::recent_outcomes(conn, limit))
    }

    pub fn outcome_count(&self) -> OverseerResult<u64> {
        self.storage.with_reader(store::outcome_count)
    }

    /// Delete outcomes older than the retention window.
    pub fn purge_old_outcomes(&self) -> OverseerResult<usize> {
        let cutoff = Utc::now() - Duration::days(self.config.outcome_retention_days as i64);
        let purged = self
            .storage
            .with_writer(|conn| store::purge_outcomes_before(conn, cutoff))?;
        if purged > 0 {
            info!(purged, "old decision outcomes purged");
        }
        Ok(purged)
    }

    pub fn health(&self) -> ComponentHealth {
        let started = Instant::now();
        let mut health = match self.storage.integrity_ok() {
            Ok(true) => ComponentHealth::healthy(COMPONENT_NAME),
            Ok(false) => ComponentHealth {
                status: HealthStatus::Degraded,
                ..ComponentHealth::unhealthy(COMPONENT_NAME, "integrity check reported problems")
            },
            Err(e) => ComponentHealth::unhealthy(COMPONENT_NAME, e.to_string()),
        };
        health.latency_ms = started.elapsed().as_millis() as u64;
        health
    }

    /// Relative adjustment from the strategy's rolling success rate
    /// against the baseline, bounded by the cap. Zero until enough samples.
    fn strategy_adjustment(&self, strategy: &str) -> f64 {
        let cap = self.config.strategy_adjustment_cap.abs();
        match self.tracker.performance(strategy) {
            Some(perf) if perf.samples >= self.config.min_strategy_samples => {
                (perf.success_rate - self.config.baseline_success_rate).clamp(-cap, cap)
            }
            _ => 0.0,
        }
    }

    fn lock_calibration(&self) -> std::sync::MutexGuard<'_, CalibrationRow> {
        // A poisoned lock still holds a valid row.
        self.calibration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[allow(clippy::too_many_arguments)]
fn explain(
    strategy: &str,
    base: f64,
    blended: f64,
    calibrated: f64,
    value: f64,
    samples: usize,
    historical_weight: f64,
    calibration_factor: f64,
    strategy_adjustment: f64,
) -> String {
    let history_effect = (blended - base).abs();
    let calibration_effect = (calibrated - blended).abs();
    let strategy_effect = (calibrated * (1.0 + strategy_adjustment) - calibrated).abs();

    let dominant = if history_effect >= calibration_effect && history_effect >= strategy_effect {
        format!(
            "historical outcomes dominated ({samples} samples, weight {historical_weight:.2})"
        )
    } else if calibration_effect >= strategy_effect {
        format!("global calibration dominated (factor {calibration_factor:.2})")
    } else {
        format!(
            "{strategy} track record dominated ({:+.0}%)",
            strategy_adjustment * 100.0
        )
    };
    format!("{dominant}: {base:.2} -> {value:.2}")
}

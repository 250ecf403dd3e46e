//! The INTERVENING pipeline: recall lookup, plan, adapt, remediate, learn.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn, Instrument};

use overseer_confidence::AdaptedConfidence;
use overseer_core::errors::{OverseerError, OverseerResult};
use overseer_core::models::{
    DecisionContext, DecisionOutcome, DegradationEvent, ErrorEvent, InterventionContext,
    InterventionKind, InterventionPlan, KnowledgeEntry, KnowledgeQuery, NewCommandRecord,
    NewErrorRecord, OutcomeKind, PriorAttempt, RemediationAction, StrategicDecision,
};
use overseer_observability::tracing_setup::events;
use overseer_observability::{confidence_span, recall_span, routing_span};
use overseer_router::RouteResult;

use crate::controller::Controller;
use crate::timeouts;

const RECALL: &str = overseer_recall::db::COMPONENT_NAME;
const CONFIDENCE: &str = overseer_confidence::engine::COMPONENT_NAME;
const ROUTER: &str = "stage_router";

/// Prior failed commands passed to the intervention builder.
const PRIOR_ATTEMPT_LIMIT: usize = 5;
const KNOWLEDGE_LIMIT: usize = 5;

/// How an intervention ended, before the controller maps it to a state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Conclusion {
    Resolved(String),
    NotNeeded(String),
    Escalated(String),
    Failed(String),
}

struct RecallFindings {
    seen_before: bool,
    failed_fixes: Vec<PriorAttempt>,
    similar_count: usize,
    error_id: String,
}

impl Controller {
    /// Any `Err` is a dependency failure the caller turns into a rollback.
    pub(crate) async fn intervene(&mut self, event: &ErrorEvent) -> OverseerResult<Conclusion> {
        let signature = self.recall.signature_of(&event.raw_text);
        let findings = self
            .consult_recall(event)
            .instrument(recall_span!("intervention_lookup"))
            .await?;

        let kind = if !findings.failed_fixes.is_empty() {
            InterventionKind::KnownFailingFix
        } else if findings.seen_before {
            InterventionKind::RepeatError
        } else {
            InterventionKind::FirstOccurrence
        };
        debug!(?kind, signature = %signature, similar = findings.similar_count, "intervention classified");

        let knowledge = self.consult_ledger(event).await;
        let context = InterventionContext {
            kind,
            event: event.clone(),
            current_stage: self.current_stage.clone(),
            signature,
            prior_attempts: findings.failed_fixes,
            similar_count: findings.similar_count,
            knowledge,
        };

        let builder = Arc::clone(&self.collaborators.builder);
        let plan = timeouts::bounded(
            "operator",
            self.config.operator_timeout(),
            builder.build(&context),
        )
        .await?;

        let Some(strategy) = plan.primary_strategy().map(str::to_string) else {
            if plan.requires_manual_escalation() {
                self.stats.escalations += 1;
                return Ok(Conclusion::Escalated(format!(
                    "{} escalated to operator",
                    event.error_type
                )));
            }
            return Ok(Conclusion::NotNeeded(format!(
                "no remediation planned for {}",
                event.error_type
            )));
        };

        let decision_ctx = self.decision_context(event, &plan, &context);
        let floor = self.config.min_remediation_confidence;
        let primary = self
            .adapt(plan.base_confidence, &decision_ctx, &strategy)
            .instrument(confidence_span!(strategy))
            .await?;
        if plan.requires_manual_escalation() {
            return self
                .escalate(event, &strategy, &primary, "escalated to operator")
                .await;
        }

        // Fall through the plan's strategies in order until one clears the floor.
        let mut chosen = (primary.value >= floor).then(|| (strategy.clone(), primary.clone()));
        if chosen.is_none() {
            debug!(strategy = %strategy, value = primary.value, floor, "strategy below confidence floor");
            for candidate in plan.strategies().skip(1) {
                let adapted = self
                    .adapt(plan.base_confidence, &decision_ctx, candidate)
                    .instrument(confidence_span!(candidate))
                    .await?;
                if adapted.value >= floor {
                    chosen = Some((candidate.to_string(), adapted));
                    break;
                }
                debug!(strategy = candidate, value = adapted.value, floor, "strategy below confidence floor");
            }
        }
        let Some((strategy, adapted)) = chosen else {
            let reason = format!("escalated, every planned strategy below confidence {floor:.2}");
            return self.escalate(event, &strategy, &primary, &reason).await;
        };
        let actions: Vec<RemediationAction> = plan
            .actions
            .iter()
            .filter(|a| a.strategy == strategy)
            .cloned()
            .collect();

        let started = Instant::now();
        let executor = Arc::clone(&self.collaborators.executor);
        let execution = timeouts::bounded(
            "remediation",
            self.config.remediation_timeout(),
            executor.execute(&actions, &context),
        )
        .await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let (outcome_kind, output, cost) = match &execution {
            Ok(o) if o.partial => (OutcomeKind::Partial, o.output.clone(), o.cost),
            Ok(o) if o.success => (OutcomeKind::Success, o.output.clone(), o.cost),
            Ok(o) => (OutcomeKind::Failure, o.output.clone(), o.cost),
            Err(e) if e.is_timeout() => (OutcomeKind::Timeout, e.to_string(), 0.0),
            Err(e) => (OutcomeKind::Failure, e.to_string(), 0.0),
        };
        let succeeded = outcome_kind.is_success();

        self.record_commands(&actions, event, &findings.error_id, succeeded, &output, elapsed_ms)
            .await;
        self.learn(&strategy, outcome_kind, &adapted, event, cost, elapsed_ms)
            .await;
        events::intervention_concluded(
            &event.error_type,
            &strategy,
            outcome_kind.as_str(),
            adapted.value,
        );

        if succeeded {
            self.failure_streaks.remove(&event.error_type);
            self.cost_spent += cost;
            let routed = self.route(&plan.decision).await?;
            Ok(Conclusion::Resolved(format!(
                "{strategy} {} for {} (confidence {:.2}); {}",
                outcome_kind, event.error_type, adapted.value, routed.reason
            )))
        } else {
            *self
                .failure_streaks
                .entry(event.error_type.clone())
                .or_insert(0) += 1;
            Ok(Conclusion::Failed(format!(
                "{strategy} {} for {}: {output}",
                outcome_kind, event.error_type
            )))
        }
    }

    /// Repeat detection happens before the current occurrence is stored.
    async fn consult_recall(&self, event: &ErrorEvent) -> OverseerResult<RecallFindings> {
        let recall = Arc::clone(&self.recall);
        let raw = event.raw_text.clone();
        let file = event.file_path.clone();
        let error_type = event.error_type.clone();
        let mut input = NewErrorRecord::new(&event.error_type, &event.raw_text)
            .with_context("source", event.source.to_string())
            .with_context("stage", self.current_stage.clone());
        input.file_path = event.file_path.clone();
        if let Some(line) = event.line {
            input = input.with_context("line", line.to_string());
        }

        timeouts::blocking(RECALL, self.config.db_timeout(), move || {
            let seen_before = recall.has_seen_error(&raw, file.as_deref(), None)?;
            let failed_fixes = recall
                .get_failed_fixes(&error_type, Some(PRIOR_ATTEMPT_LIMIT))?
                .into_iter()
                .map(|c| PriorAttempt {
                    command: c.command,
                    success: c.success,
                })
                .collect();
            let similar_count = recall
                .get_similar_errors(&error_type, file.as_deref(), None, None)?
                .len();
            let record = recall.record_error(&input)?;
            Ok(RecallFindings {
                seen_before,
                failed_fixes,
                similar_count,
                error_id: record.id,
            })
        })
        .await
    }

    /// Ledger hits are advisory; a failing ledger yields no entries.
    async fn consult_ledger(&mut self, event: &ErrorEvent) -> Vec<KnowledgeEntry> {
        let Some(ledger) = self.collaborators.ledger.clone() else {
            return Vec::new();
        };
        let query = KnowledgeQuery {
            domain: self.domain.clone(),
            stage: self.current_stage.clone(),
            error_text: event.raw_text.clone(),
        };
        match timeouts::bounded(
            "knowledge_ledger",
            self.config.ledger_timeout(),
            ledger.query(&query, KNOWLEDGE_LIMIT),
        )
        .await
        {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "knowledge ledger unavailable");
                self.health.record_degradation(DegradationEvent::now(
                    "knowledge_ledger",
                    e.to_string(),
                    "intervene without knowledge entries",
                ));
                Vec::new()
            }
        }
    }

    async fn escalate(
        &mut self,
        event: &ErrorEvent,
        strategy: &str,
        adapted: &AdaptedConfidence,
        reason: &str,
    ) -> OverseerResult<Conclusion> {
        self.stats.escalations += 1;
        self.learn(strategy, OutcomeKind::Escalated, adapted, event, 0.0, 0)
            .await;
        self.route(&StrategicDecision::Escalate).await?;
        events::intervention_concluded(
            &event.error_type,
            strategy,
            OutcomeKind::Escalated.as_str(),
            adapted.value,
        );
        Ok(Conclusion::Escalated(format!(
            "{} {reason} (confidence {:.2})",
            event.error_type, adapted.value
        )))
    }

    fn decision_context(
        &self,
        event: &ErrorEvent,
        plan: &InterventionPlan,
        context: &InterventionContext,
    ) -> DecisionContext {
        let streak = self
            .failure_streaks
            .get(&event.error_type)
            .copied()
            .unwrap_or(0);
        let complexity = estimate_complexity(
            self.config.default_task_complexity,
            plan.actions.len(),
            context.prior_attempts.len(),
            context.similar_count,
        );
        let probes = self.health.probe_count().max(1) as f64;
        let degraded = self.health.degradation().degraded_components().len() as f64;

        let mut ctx = DecisionContext::new(&self.current_stage)
            .with_error_type(&event.error_type)
            .with_failures(streak)
            .with_cost(self.cost_spent, self.config.cost_budget.max(0.0))
            .with_complexity(complexity)
            .with_resource_pressure((degraded / probes).min(1.0));
        let concluded = self.stats.remediations_succeeded + self.stats.remediations_failed;
        if concluded > 0 {
            ctx = ctx.with_recent_success_rate(
                self.stats.remediations_succeeded as f64 / concluded as f64,
            );
        }
        ctx
    }

    async fn adapt(
        &self,
        base: f64,
        ctx: &DecisionContext,
        strategy: &str,
    ) -> OverseerResult<AdaptedConfidence> {
        let engine = Arc::clone(&self.confidence);
        let ctx = ctx.clone();
        let strategy = strategy.to_string();
        let adapted = timeouts::blocking(CONFIDENCE, self.config.db_timeout(), move || {
            engine.adapt(base, &ctx, &strategy)
        })
        .await?;
        debug!(base, value = adapted.value, reasoning = %adapted.reasoning, "confidence adapted");
        Ok(adapted)
    }

    /// Feed the outcome back into confidence learning. Failures here are
    /// logged; the remediation already happened.
    async fn learn(
        &mut self,
        strategy: &str,
        kind: OutcomeKind,
        adapted: &AdaptedConfidence,
        event: &ErrorEvent,
        cost: f64,
        elapsed_ms: u64,
    ) {
        let outcome = DecisionOutcome::new(
            uuid::Uuid::new_v4().to_string(),
            strategy,
            kind,
            adapted.value,
            adapted.signature.clone(),
            self.current_stage.clone(),
        )
        .with_cost(cost)
        .with_resolution_time_ms(elapsed_ms)
        .with_error_type(&event.error_type);

        let engine = Arc::clone(&self.confidence);
        let recorded = timeouts::blocking(CONFIDENCE, self.config.db_timeout(), move || {
            engine.record_outcome(&outcome)
        })
        .await;
        if let Err(e) = recorded {
            warn!(error = %e, strategy, "decision outcome not recorded");
            self.health.record_degradation(DegradationEvent::now(
                CONFIDENCE,
                e.to_string(),
                "outcome dropped",
            ));
        }
    }

    async fn record_commands(
        &mut self,
        actions: &[RemediationAction],
        event: &ErrorEvent,
        error_id: &str,
        success: bool,
        output: &str,
        elapsed_ms: u64,
    ) {
        let inputs: Vec<NewCommandRecord> = actions
            .iter()
            .map(|a| {
                NewCommandRecord::new(&a.command, &event.error_type, success)
                    .linked_to(error_id)
                    .with_output(output)
                    .with_duration_ms(elapsed_ms)
            })
            .collect();
        let recall = Arc::clone(&self.recall);
        let recorded = timeouts::blocking(RECALL, self.config.db_timeout(), move || {
            for input in &inputs {
                recall.record_command(input)?;
            }
            Ok(())
        })
        .await;
        if let Err(e) = recorded {
            warn!(error = %e, "remediation commands not recorded");
            self.health.record_degradation(DegradationEvent::now(
                RECALL,
                e.to_string(),
                "command history incomplete",
            ));
        }
    }

    /// Apply `decision` at the current stage and move to the stage it picks.
    pub(crate) async fn route(&mut self, decision: &StrategicDecision) -> OverseerResult<RouteResult> {
        let router = Arc::clone(&self.router);
        let stage = self.current_stage.clone();
        let owned = decision.clone();
        let span = routing_span!(stage, decision);

        let result = timeouts::blocking(ROUTER, self.config.classification_timeout(), move || {
            let mut router = router
                .lock()
                .map_err(|_| OverseerError::dependency(ROUTER, "router lock poisoned"))?;
            router.route(&stage, &owned)
        })
        .instrument(span)
        .await?;

        if result.substituted {
            info!(path = ?result.path, "reroute substituted by shortest path");
        }
        if let Some(next) = &result.next_stage {
            self.current_stage = next.clone();
        }
        Ok(result)
    }
}

/// Baseline complexity raised by plan size, failing fix history and how
/// often the error has recurred. Clamped to [0, 1].
fn estimate_complexity(
    base: f64,
    actions: usize,
    failed_fixes: usize,
    similar: usize,
) -> f64 {
    let extra_actions = actions.saturating_sub(1).min(3) as f64;
    let history = failed_fixes.min(3) as f64;
    let recurring = if similar > 3 { 0.1 } else { 0.0 };
    (base + 0.1 * extra_actions + 0.1 * history + recurring).clamp(0.0, 1.0)
}

//! RecallDb is the time-boxed error memory.
//!
//! Three record families (errors, pattern violations, commands), each with
//! a TTL. Writes go through the storage engine's single writer; reads use
//! the WAL read pool and never wait on the write lock. A record whose
//! `expires_at` has passed is invisible to every query even before the
//! next `cleanup_expired` sweep removes it.

use std::time::Instant;

use chrono::{Duration, Utc};
use tracing::{debug, info};

use overseer_core::config::{RecallConfig, StorageConfig};
use overseer_core::errors::OverseerResult;
use overseer_core::models::{
    CleanupReport, CommandRecord, ComponentHealth, ErrorRecord, HealthStatus, NewCommandRecord,
    NewErrorRecord, NewPatternViolation, PatternViolation, RecallStatistics,
};
use overseer_storage::{Schema, StorageEngine};

use crate::queries;
use crate::signature::SignatureNormalizer;

pub const COMPONENT_NAME: &str = "recall_db";

pub struct RecallDb {
    storage: StorageEngine,
    normalizer: SignatureNormalizer,
    config: RecallConfig,
}

impl RecallDb {
    /// Open the file-backed store under `storage.root_dir`.
    pub fn open(storage: &StorageConfig, config: RecallConfig) -> OverseerResult<Self> {
        let engine = StorageEngine::open(
            &storage.recall_db_path(),
            Schema::Recall,
            storage.read_pool_size,
        )?;
        Ok(Self::with_engine(engine, config))
    }

    pub fn open_in_memory(config: RecallConfig) -> OverseerResult<Self> {
        let engine = StorageEngine::open_in_memory(Schema::Recall)?;
        Ok(Self::with_engine(engine, config))
    }

    fn with_engine(storage: StorageEngine, config: RecallConfig) -> Self {
        Self {
            normalizer: SignatureNormalizer::new(config.signature_max_len),
            storage,
            config,
        }
    }

    pub fn config(&self) -> &RecallConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &SignatureNormalizer {
        &self.normalizer
    }

    /// Signature this store would key `message` under.
    pub fn signature_of(&self, message: &str) -> String {
        self.normalizer.normalize(message)
    }

    // ── Errors ──────────────────────────────────────────────────────────

    pub fn record_error(&self, input: &NewErrorRecord) -> OverseerResult<ErrorRecord> {
        let now = Utc::now();
        let record = ErrorRecord {
            id: new_id(),
            error_type: input.error_type.clone(),
            signature: self.normalizer.normalize(&input.message),
            file_path: input.file_path.clone(),
            message: input.message.clone(),
            attempted_fix: input.attempted_fix.clone(),
            context: input.context.clone(),
            created_at: now,
            expires_at: now + input.ttl.unwrap_or_else(|| self.config.ttl()),
        };
        self.storage
            .with_writer(|conn| queries::errors::insert_error(conn, &record))?;
        debug!(
            id = %record.id,
            error_type = %record.error_type,
            signature = %record.signature,
            "error recorded"
        );
        Ok(record)
    }

    /// Live records of `error_type`, most recent first. `within` limits
    /// the result to records created inside that window; `limit` defaults
    /// to the configured query limit.
    pub fn get_similar_errors(
        &self,
        error_type: &str,
        file_path: Option<&str>,
        within: Option<Duration>,
        limit: Option<usize>,
    ) -> OverseerResult<Vec<ErrorRecord>> {
        let now = Utc::now();
        let since = within.map(|w| now - w);
        let limit = limit.unwrap_or(self.config.query_limit);
        self.storage.with_reader(|conn| {
            queries::errors::similar_errors(conn, error_type, file_path, since, now, limit)
        })
    }

    /// Whether an unexpired record with the same signature was created
    /// inside the lookback window. Accepts a raw message or an already
    /// normalized signature; normalization is idempotent.
    pub fn has_seen_error(
        &self,
        message: &str,
        file_path: Option<&str>,
        lookback: Option<Duration>,
    ) -> OverseerResult<bool> {
        let signature = self.normalizer.normalize(message);
        let now = Utc::now();
        let since = now - lookback.unwrap_or_else(|| self.config.lookback());
        self.storage.with_reader(|conn| {
            queries::errors::signature_seen(conn, &signature, file_path, since, now)
        })
    }

    // ── Pattern violations ──────────────────────────────────────────────

    pub fn record_pattern_violation(
        &self,
        input: &NewPatternViolation,
    ) -> OverseerResult<PatternViolation> {
        let now = Utc::now();
        let violation = PatternViolation {
            id: new_id(),
            pattern_name: input.pattern_name.clone(),
            signature: self.normalizer.normalize(&input.description),
            file_path: input.file_path.clone(),
            description: input.description.clone(),
            severity: input.severity,
            error_id: input.error_id.clone(),
            created_at: now,
            expires_at: now + input.ttl.unwrap_or_else(|| self.config.ttl()),
        };
        self.storage
            .with_writer(|conn| queries::violations::insert_violation(conn, &violation))?;
        debug!(id = %violation.id, pattern = %violation.pattern_name, "pattern violation recorded");
        Ok(violation)
    }

    pub fn get_pattern_violations(
        &self,
        pattern_name: Option<&str>,
        file_path: Option<&str>,
        limit: Option<usize>,
    ) -> OverseerResult<Vec<PatternViolation>> {
        let limit = limit.unwrap_or(self.config.query_limit);
        self.storage.with_reader(|conn| {
            queries::violations::violations(conn, pattern_name, file_path, Utc::now(), limit)
        })
    }

    // ── Commands ────────────────────────────────────────────────────────

    pub fn record_command(&self, input: &NewCommandRecord) -> OverseerResult<CommandRecord> {
        let now = Utc::now();
        let command = CommandRecord {
            id: new_id(),
            command: input.command.clone(),
            error_type: input.error_type.clone(),
            error_id: input.error_id.clone(),
            success: input.success,
            output: input.output.clone(),
            duration_ms: input.duration_ms,
            created_at: now,
            expires_at: now + input.ttl.unwrap_or_else(|| self.config.ttl()),
        };
        self.storage
            .with_writer(|conn| queries::commands::insert_command(conn, &command))?;
        debug!(
            id = %command.id,
            error_type = %command.error_type,
            success = command.success,
            "command recorded"
        );
        Ok(command)
    }

    /// Commands that failed for `error_type`, most recent first.
    pub fn get_failed_fixes(
        &self,
        error_type: &str,
        limit: Option<usize>,
    ) -> OverseerResult<Vec<CommandRecord>> {
        let limit = limit.unwrap_or(self.config.query_limit);
        self.storage.with_reader(|conn| {
            queries::commands::failed_fixes(conn, error_type, Utc::now(), limit)
        })
    }

    // ── Maintenance ─────────────────────────────────────────────────────

    /// Purge every family past its TTL. A second call in immediate
    /// succession purges nothing.
    pub fn cleanup_expired(&self) -> OverseerResult<CleanupReport> {
        let report = self
            .storage
            .with_writer(|conn| queries::cleanup::purge_expired(conn, Utc::now()))?;
        if report.total() > 0 {
            info!(
                errors = report.errors,
                violations = report.violations,
                commands = report.commands,
                "expired recall records purged"
            );
        }
        Ok(report)
    }

    pub fn get_statistics(&self) -> OverseerResult<RecallStatistics> {
        let top_n = self.config.top_n;
        self.storage
            .with_reader(|conn| queries::stats::statistics(conn, Utc::now(), top_n))
    }

    /// Integrity check, reported as component health.
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

    pub fn checkpoint(&self) -> OverseerResult<()> {
        self.storage.checkpoint()
    }

    /// Reclaim file space; worth running after a large sweep.
    pub fn compact(&self) -> OverseerResult<()> {
        self.storage.vacuum()
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

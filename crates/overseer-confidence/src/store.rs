//! SQL for outcomes, patterns and calibration state.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use overseer_core::errors::{OverseerError, OverseerResult, StorageError};
use overseer_core::models::{ConfidencePattern, DecisionOutcome, OutcomeKind};
use overseer_storage::time::{fmt_ts, parse_ts};
use overseer_storage::to_storage_err;

fn sql_err(e: rusqlite::Error) -> OverseerError {
    to_storage_err(e.to_string())
}

const OUTCOME_COLUMNS: &str = "decision_id, strategy, kind, predicted_confidence, cost,
    resolution_time_ms, confidence_accuracy, context_hash, stage, error_type, recorded_at";

// ── Outcomes ────────────────────────────────────────────────────────────

pub fn insert_outcome(conn: &Connection, o: &DecisionOutcome) -> OverseerResult<()> {
    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO decision_outcomes ({OUTCOME_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)"
        ),
        params![
            o.decision_id,
            o.strategy,
            o.kind.as_str(),
            o.predicted_confidence,
            o.cost,
            o.resolution_time_ms as i64,
            o.confidence_accuracy,
            o.context_hash,
            o.stage,
            o.error_type,
            fmt_ts(o.recorded_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Most recent outcomes for one signature and strategy.
pub fn outcomes_for(
    conn: &Connection,
    context_hash: &str,
    strategy: &str,
    limit: usize,
) -> OverseerResult<Vec<DecisionOutcome>> {
    query_outcomes(
        conn,
        &format!(
            "SELECT {OUTCOME_COLUMNS} FROM decision_outcomes
             WHERE context_hash = ?1 AND strategy = ?2
             ORDER BY recorded_at DESC LIMIT ?3"
        ),
        params![context_hash, strategy, limit as i64],
    )
}

/// Most recent outcomes across every strategy.
pub fn recent_outcomes(conn: &Connection, limit: usize) -> OverseerResult<Vec<DecisionOutcome>> {
    query_outcomes(
        conn,
        &format!(
            "SELECT {OUTCOME_COLUMNS} FROM decision_outcomes
             ORDER BY recorded_at DESC LIMIT ?1"
        ),
        params![limit as i64],
    )
}

pub fn outcome_count(conn: &Connection) -> OverseerResult<u64> {
    conn.query_row("SELECT COUNT(*) FROM decision_outcomes", [], |row| {
        row.get::<_, i64>(0)
    })
    .map(|n| n.max(0) as u64)
    .map_err(sql_err)
}

pub fn purge_outcomes_before(conn: &Connection, cutoff: DateTime<Utc>) -> OverseerResult<usize> {
    conn.execute(
        "DELETE FROM decision_outcomes WHERE recorded_at < ?1",
        params![fmt_ts(cutoff)],
    )
    .map_err(sql_err)
}

fn query_outcomes(
    conn: &Connection,
    sql: &str,
    params: impl rusqlite::Params,
) -> OverseerResult<Vec<DecisionOutcome>> {
    let mut stmt = conn.prepare(sql).map_err(sql_err)?;
    let rows = stmt.query_map(params, RawOutcome::from_row).map_err(sql_err)?;
    rows.map(|raw| raw.map_err(sql_err)?.into_outcome())
        .collect()
}

struct RawOutcome {
    decision_id: String,
    strategy: String,
    kind: String,
    predicted_confidence: f64,
    cost: f64,
    resolution_time_ms: i64,
    confidence_accuracy: f64,
    context_hash: String,
    stage: String,
    error_type: Option<String>,
    recorded_at: String,
}

impl RawOutcome {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            decision_id: row.get(0)?,
            strategy: row.get(1)?,
            kind: row.get(2)?,
            predicted_confidence: row.get(3)?,
            cost: row.get(4)?,
            resolution_time_ms: row.get(5)?,
            confidence_accuracy: row.get(6)?,
            context_hash: row.get(7)?,
            stage: row.get(8)?,
            error_type: row.get(9)?,
            recorded_at: row.get(10)?,
        })
    }

    fn into_outcome(self) -> OverseerResult<DecisionOutcome> {
        let kind = self
            .kind
            .parse::<OutcomeKind>()
            .map_err(|_| StorageError::InvalidColumn {
                column: "kind".into(),
                value: self.kind.clone(),
            })?;
        Ok(DecisionOutcome {
            recorded_at: parse_ts("recorded_at", &self.recorded_at)?,
            decision_id: self.decision_id,
            strategy: self.strategy,
            kind,
            predicted_confidence: self.predicted_confidence,
            cost: self.cost,
            resolution_time_ms: self.resolution_time_ms.max(0) as u64,
            confidence_accuracy: self.confidence_accuracy,
            context_hash: self.context_hash,
            stage: self.stage,
            error_type: self.error_type,
        })
    }
}

// ── Patterns ────────────────────────────────────────────────────────────

pub fn get_pattern(conn: &Connection, signature: &str) -> OverseerResult<Option<ConfidencePattern>> {
    let raw = conn
        .query_row(
            "SELECT signature, base_confidence, sample_count, success_rate, variance, last_updated
             FROM confidence_patterns WHERE signature = ?1",
            params![signature],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                ))
            },
        )
        .optional()
        .map_err(sql_err)?;

    raw.map(
        |(signature, base_confidence, sample_count, success_rate, variance, last_updated)|
         -> OverseerResult<ConfidencePattern> {
            Ok(ConfidencePattern {
                signature,
                base_confidence,
                sample_count: sample_count.max(0) as u64,
                success_rate,
                variance,
                last_updated: parse_ts("last_updated", &last_updated)?,
            })
        },
    )
    .transpose()
}

pub fn upsert_pattern(conn: &Connection, p: &ConfidencePattern) -> OverseerResult<()> {
    conn.execute(
        "INSERT INTO confidence_patterns (
            signature, base_confidence, sample_count, success_rate, variance, last_updated
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(signature) DO UPDATE SET
            base_confidence = excluded.base_confidence,
            sample_count = excluded.sample_count,
            success_rate = excluded.success_rate,
            variance = excluded.variance,
            last_updated = excluded.last_updated",
        params![
            p.signature,
            p.base_confidence,
            p.sample_count as i64,
            p.success_rate,
            p.variance,
            fmt_ts(p.last_updated),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

// ── Calibration ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationRow {
    pub factor: f64,
    pub decisions_recorded: u64,
}

pub fn load_calibration(conn: &Connection) -> OverseerResult<CalibrationRow> {
    conn.query_row(
        "SELECT factor, decisions_recorded FROM calibration_state WHERE id = 1",
        [],
        |row| {
            Ok(CalibrationRow {
                factor: row.get(0)?,
                decisions_recorded: row.get::<_, i64>(1)?.max(0) as u64,
            })
        },
    )
    .optional()
    .map_err(sql_err)
    .map(|row| {
        row.unwrap_or(CalibrationRow {
            factor: 1.0,
            decisions_recorded: 0,
        })
    })
}

pub fn save_calibration(conn: &Connection, row: CalibrationRow) -> OverseerResult<()> {
    conn.execute(
        "INSERT INTO calibration_state (id, factor, decisions_recorded, updated_at)
         VALUES (1, ?1, ?2, ?3)
         ON CONFLICT(id) DO UPDATE SET
            factor = excluded.factor,
            decisions_recorded = excluded.decisions_recorded,
            updated_at = excluded.updated_at",
        params![row.factor, row.decisions_recorded as i64, fmt_ts(Utc::now())],
    )
    .map_err(sql_err)?;
    Ok(())
}

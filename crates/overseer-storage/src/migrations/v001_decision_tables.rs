//! v001: decision_outcomes, confidence_patterns.

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> OverseerResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS decision_outcomes (
            decision_id           TEXT PRIMARY KEY,
            strategy              TEXT NOT NULL,
            kind                  TEXT NOT NULL,
            predicted_confidence  REAL NOT NULL,
            cost                  REAL NOT NULL DEFAULT 0,
            resolution_time_ms    INTEGER NOT NULL DEFAULT 0,
            confidence_accuracy   REAL NOT NULL,
            context_hash          TEXT NOT NULL,
            stage                 TEXT NOT NULL,
            error_type            TEXT,
            recorded_at           TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_outcomes_context ON decision_outcomes(context_hash, strategy);
        CREATE INDEX IF NOT EXISTS idx_outcomes_recorded ON decision_outcomes(recorded_at);
        CREATE INDEX IF NOT EXISTS idx_outcomes_strategy ON decision_outcomes(strategy, recorded_at);

        CREATE TABLE IF NOT EXISTS confidence_patterns (
            signature        TEXT PRIMARY KEY,
            base_confidence  REAL NOT NULL CHECK (base_confidence BETWEEN 0.01 AND 0.99),
            sample_count     INTEGER NOT NULL DEFAULT 0,
            success_rate     REAL NOT NULL DEFAULT 0,
            variance         REAL NOT NULL,
            last_updated     TEXT NOT NULL
        );
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

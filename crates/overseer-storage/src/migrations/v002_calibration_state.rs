//! v002: single-row global calibration state.

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> OverseerResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS calibration_state (
            id                  INTEGER PRIMARY KEY CHECK (id = 1),
            factor              REAL NOT NULL DEFAULT 1.0,
            decisions_recorded  INTEGER NOT NULL DEFAULT 0,
            updated_at          TEXT NOT NULL
        );

        INSERT OR IGNORE INTO calibration_state (id, factor, decisions_recorded, updated_at)
        VALUES (1, 1.0, 0, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'));
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

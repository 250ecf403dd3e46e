//! Upkeep run after expiry sweeps and from health probes.

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::to_storage_err;

/// Frame counts reported by a WAL checkpoint. In-memory stores have no
/// log and report `-1` for both counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint {
    pub busy: bool,
    pub log_frames: i64,
    pub checkpointed_frames: i64,
}

/// Fold the WAL back into the main file and truncate it.
pub fn checkpoint(conn: &Connection) -> OverseerResult<Checkpoint> {
    conn.query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |row| {
        Ok(Checkpoint {
            busy: row.get::<_, i64>(0)? != 0,
            log_frames: row.get(1)?,
            checkpointed_frames: row.get(2)?,
        })
    })
    .map_err(|e| to_storage_err(format!("checkpoint: {e}")))
}

pub fn vacuum(conn: &Connection) -> OverseerResult<()> {
    conn.execute_batch("VACUUM")
        .map_err(|e| to_storage_err(format!("vacuum: {e}")))
}

/// Every problem `integrity_check` reports; empty when the file is sound.
pub fn integrity_problems(conn: &Connection) -> OverseerResult<Vec<String>> {
    let mut stmt = conn
        .prepare("PRAGMA integrity_check")
        .map_err(|e| to_storage_err(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(0))
        .map_err(|e| to_storage_err(e.to_string()))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(rows.into_iter().filter(|r| r != "ok").collect())
}

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use overseer_core::errors::OverseerResult;
use overseer_core::models::CleanupReport;
use overseer_storage::time::fmt_ts;

use super::sql_err;

/// Delete every row whose `expires_at` is at or before `now`, in one
/// transaction. Context rows go with their parent via cascade.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> OverseerResult<CleanupReport> {
    let cutoff = fmt_ts(now);
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| overseer_storage::to_storage_err(format!("cleanup begin: {e}")))?;

    let commands = tx
        .execute(
            "DELETE FROM command_records WHERE expires_at <= ?1",
            params![cutoff],
        )
        .map_err(sql_err)?;
    let violations = tx
        .execute(
            "DELETE FROM pattern_violations WHERE expires_at <= ?1",
            params![cutoff],
        )
        .map_err(sql_err)?;
    let errors = tx
        .execute(
            "DELETE FROM error_records WHERE expires_at <= ?1",
            params![cutoff],
        )
        .map_err(sql_err)?;

    tx.commit()
        .map_err(|e| overseer_storage::to_storage_err(format!("cleanup commit: {e}")))?;

    Ok(CleanupReport {
        errors,
        violations,
        commands,
    })
}

//! Connection tuning for the recall and confidence stores.

use std::time::Duration;

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::to_storage_err;

/// How long a statement waits on a locked database before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Which side of the store a connection serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Writer,
    Reader,
}

impl Role {
    /// Page cache in KiB. Both stores hold small rows; the writer also
    /// carries migration and expiry sweeps.
    fn cache_kib(self) -> i64 {
        match self {
            Self::Writer => 32_000,
            Self::Reader => 8_000,
        }
    }
}

/// Tune `conn` for its role. The writer switches the file to WAL so
/// readers keep serving recall lookups while an occurrence is recorded.
pub fn configure(conn: &Connection, role: Role) -> OverseerResult<()> {
    conn.busy_timeout(BUSY_TIMEOUT)
        .map_err(|e| to_storage_err(format!("busy_timeout: {e}")))?;
    set(conn, "cache_size", -role.cache_kib())?;
    match role {
        Role::Writer => {
            let mode: String = conn
                .pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))
                .map_err(|e| to_storage_err(format!("journal_mode: {e}")))?;
            tracing::trace!(mode = %mode, "journal mode set");
            set(conn, "synchronous", "NORMAL")?;
            set(conn, "foreign_keys", true)?;
        }
        Role::Reader => set(conn, "query_only", true)?,
    }
    Ok(())
}

fn set<V: rusqlite::ToSql>(conn: &Connection, name: &str, value: V) -> OverseerResult<()> {
    conn.pragma_update(None, name, value)
        .map_err(|e| to_storage_err(format!("{name}: {e}")))
}

/// Whether the file is journaled in WAL mode. In-memory stores report
/// `memory` and so return false.
pub fn journal_is_wal(conn: &Connection) -> OverseerResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

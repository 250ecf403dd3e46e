use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use overseer_core::errors::OverseerResult;
use overseer_core::models::CommandRecord;
use overseer_storage::time::{fmt_ts, parse_ts};

use super::sql_err;

pub fn insert_command(conn: &Connection, c: &CommandRecord) -> OverseerResult<()> {
    conn.execute(
        "INSERT INTO command_records (
            id, command, error_type, error_id, success, output, duration_ms,
            created_at, expires_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            c.id,
            c.command,
            c.error_type,
            c.error_id,
            c.success as i64,
            c.output,
            c.duration_ms as i64,
            fmt_ts(c.created_at),
            fmt_ts(c.expires_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Live unsuccessful commands for an error type, most recent first.
pub fn failed_fixes(
    conn: &Connection,
    error_type: &str,
    now: DateTime<Utc>,
    limit: usize,
) -> OverseerResult<Vec<CommandRecord>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, command, error_type, error_id, success, output, duration_ms,
                    created_at, expires_at
             FROM command_records
             WHERE error_type = ?1 AND success = 0 AND expires_at > ?2
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?3",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(
            params![error_type, fmt_ts(now), limit as i64],
            RawCommand::from_row,
        )
        .map_err(sql_err)?;

    rows.map(|raw| raw.map_err(sql_err)?.into_command())
        .collect()
}

struct RawCommand {
    id: String,
    command: String,
    error_type: String,
    error_id: Option<String>,
    success: i64,
    output: Option<String>,
    duration_ms: i64,
    created_at: String,
    expires_at: String,
}

impl RawCommand {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            command: row.get(1)?,
            error_type: row.get(2)?,
            error_id: row.get(3)?,
            success: row.get(4)?,
            output: row.get(5)?,
            duration_ms: row.get(6)?,
            created_at: row.get(7)?,
            expires_at: row.get(8)?,
        })
    }

    fn into_command(self) -> OverseerResult<CommandRecord> {
        Ok(CommandRecord {
            created_at: parse_ts("created_at", &self.created_at)?,
            expires_at: parse_ts("expires_at", &self.expires_at)?,
            id: self.id,
            command: self.command,
            error_type: self.error_type,
            error_id: self.error_id,
            success: self.success != 0,
            output: self.output,
            duration_ms: self.duration_ms.max(0) as u64,
        })
    }
}

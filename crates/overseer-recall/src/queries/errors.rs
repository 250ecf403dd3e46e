//! Insert and lookup for error records and their context rows.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use overseer_core::errors::OverseerResult;
use overseer_core::models::ErrorRecord;
use overseer_storage::time::{fmt_ts, parse_ts};

use super::sql_err;

const SELECT_COLUMNS: &str = "SELECT id, error_type, signature, file_path, message, attempted_fix,
        created_at, expires_at FROM error_records";

/// Insert a record and its context map atomically.
pub fn insert_error(conn: &Connection, record: &ErrorRecord) -> OverseerResult<()> {
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| overseer_storage::to_storage_err(format!("insert_error begin: {e}")))?;

    tx.execute(
        "INSERT INTO error_records (
            id, error_type, signature, file_path, message, attempted_fix, created_at, expires_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            record.id,
            record.error_type,
            record.signature,
            record.file_path,
            record.message,
            record.attempted_fix,
            fmt_ts(record.created_at),
            fmt_ts(record.expires_at),
        ],
    )
    .map_err(sql_err)?;

    for (key, value) in &record.context {
        tx.execute(
            "INSERT INTO error_context (error_id, key, value) VALUES (?1, ?2, ?3)",
            params![record.id, key, value],
        )
        .map_err(sql_err)?;
    }

    tx.commit()
        .map_err(|e| overseer_storage::to_storage_err(format!("insert_error commit: {e}")))?;
    Ok(())
}

/// Live records of `error_type`, optionally limited to one file and to
/// records created after `since`. Most recent first.
pub fn similar_errors(
    conn: &Connection,
    error_type: &str,
    file_path: Option<&str>,
    since: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    limit: usize,
) -> OverseerResult<Vec<ErrorRecord>> {
    let sql = format!(
        "{SELECT_COLUMNS}
         WHERE error_type = ?1
           AND (?2 IS NULL OR file_path = ?2)
           AND (?3 IS NULL OR created_at >= ?3)
           AND expires_at > ?4
         ORDER BY created_at DESC, rowid DESC
         LIMIT ?5"
    );
    let mut stmt = conn.prepare(&sql).map_err(sql_err)?;
    let rows = stmt
        .query_map(
            params![
                error_type,
                file_path,
                since.map(fmt_ts),
                fmt_ts(now),
                limit as i64
            ],
            RawError::from_row,
        )
        .map_err(sql_err)?;

    let mut records = Vec::new();
    for raw in rows {
        let mut record = raw.map_err(sql_err)?.into_record()?;
        record.context = load_context(conn, &record.id)?;
        records.push(record);
    }
    Ok(records)
}

/// Whether any live record with this signature exists inside the window.
pub fn signature_seen(
    conn: &Connection,
    signature: &str,
    file_path: Option<&str>,
    since: DateTime<Utc>,
    now: DateTime<Utc>,
) -> OverseerResult<bool> {
    conn.query_row(
        "SELECT EXISTS (
            SELECT 1 FROM error_records
            WHERE signature = ?1
              AND (?2 IS NULL OR file_path = ?2)
              AND created_at >= ?3
              AND expires_at > ?4
        )",
        params![signature, file_path, fmt_ts(since), fmt_ts(now)],
        |row| row.get(0),
    )
    .map_err(sql_err)
}

fn load_context(conn: &Connection, error_id: &str) -> OverseerResult<BTreeMap<String, String>> {
    let mut stmt = conn
        .prepare_cached("SELECT key, value FROM error_context WHERE error_id = ?1")
        .map_err(sql_err)?;
    let pairs = stmt
        .query_map(params![error_id], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(sql_err)?
        .collect::<Result<BTreeMap<_, _>, _>>()
        .map_err(sql_err)?;
    Ok(pairs)
}

/// Column values before timestamp decoding.
struct RawError {
    id: String,
    error_type: String,
    signature: String,
    file_path: Option<String>,
    message: String,
    attempted_fix: Option<String>,
    created_at: String,
    expires_at: String,
}

impl RawError {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            error_type: row.get(1)?,
            signature: row.get(2)?,
            file_path: row.get(3)?,
            message: row.get(4)?,
            attempted_fix: row.get(5)?,
            created_at: row.get(6)?,
            expires_at: row.get(7)?,
        })
    }

    fn into_record(self) -> OverseerResult<ErrorRecord> {
        Ok(ErrorRecord {
            created_at: parse_ts("created_at", &self.created_at)?,
            expires_at: parse_ts("expires_at", &self.expires_at)?,
            id: self.id,
            error_type: self.error_type,
            signature: self.signature,
            file_path: self.file_path,
            message: self.message,
            attempted_fix: self.attempted_fix,
            context: BTreeMap::new(),
        })
    }
}

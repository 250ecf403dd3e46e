use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use overseer_core::errors::{OverseerResult, StorageError};
use overseer_core::models::{PatternViolation, Severity};
use overseer_storage::time::{fmt_ts, parse_ts};

use super::sql_err;

pub fn insert_violation(conn: &Connection, v: &PatternViolation) -> OverseerResult<()> {
    conn.execute(
        "INSERT INTO pattern_violations (
            id, pattern_name, signature, file_path, description, severity, error_id,
            created_at, expires_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            v.id,
            v.pattern_name,
            v.signature,
            v.file_path,
            v.description,
            v.severity.as_str(),
            v.error_id,
            fmt_ts(v.created_at),
            fmt_ts(v.expires_at),
        ],
    )
    .map_err(sql_err)?;
    Ok(())
}

/// Live violations, optionally filtered by pattern name and file.
pub fn violations(
    conn: &Connection,
    pattern_name: Option<&str>,
    file_path: Option<&str>,
    now: DateTime<Utc>,
    limit: usize,
) -> OverseerResult<Vec<PatternViolation>> {
    let mut stmt = conn
        .prepare(
            "SELECT id, pattern_name, signature, file_path, description, severity, error_id,
                    created_at, expires_at
             FROM pattern_violations
             WHERE (?1 IS NULL OR pattern_name = ?1)
               AND (?2 IS NULL OR file_path = ?2)
               AND expires_at > ?3
             ORDER BY created_at DESC, rowid DESC
             LIMIT ?4",
        )
        .map_err(sql_err)?;
    let rows = stmt
        .query_map(
            params![pattern_name, file_path, fmt_ts(now), limit as i64],
            RawViolation::from_row,
        )
        .map_err(sql_err)?;

    rows.map(|raw| raw.map_err(sql_err)?.into_violation())
        .collect()
}

struct RawViolation {
    id: String,
    pattern_name: String,
    signature: String,
    file_path: Option<String>,
    description: String,
    severity: String,
    error_id: Option<String>,
    created_at: String,
    expires_at: String,
}

impl RawViolation {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get(0)?,
            pattern_name: row.get(1)?,
            signature: row.get(2)?,
            file_path: row.get(3)?,
            description: row.get(4)?,
            severity: row.get(5)?,
            error_id: row.get(6)?,
            created_at: row.get(7)?,
            expires_at: row.get(8)?,
        })
    }

    fn into_violation(self) -> OverseerResult<PatternViolation> {
        let severity = Severity::parse(&self.severity).ok_or_else(|| StorageError::InvalidColumn {
            column: "severity".into(),
            value: self.severity.clone(),
        })?;
        Ok(PatternViolation {
            created_at: parse_ts("created_at", &self.created_at)?,
            expires_at: parse_ts("expires_at", &self.expires_at)?,
            id: self.id,
            pattern_name: self.pattern_name,
            signature: self.signature,
            file_path: self.file_path,
            description: self.description,
            severity,
            error_id: self.error_id,
        })
    }
}

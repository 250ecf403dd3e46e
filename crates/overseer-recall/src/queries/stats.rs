use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use overseer_core::errors::OverseerResult;
use overseer_core::models::RecallStatistics;
use overseer_storage::time::fmt_ts;

use super::sql_err;

/// Aggregate counts over live rows only.
pub fn statistics(
    conn: &Connection,
    now: DateTime<Utc>,
    top_n: usize,
) -> OverseerResult<RecallStatistics> {
    let now = fmt_ts(now);
    let count = |sql: &str| -> OverseerResult<usize> {
        conn.query_row(sql, params![now], |row| row.get::<_, i64>(0))
            .map(|n| n.max(0) as usize)
            .map_err(sql_err)
    };

    Ok(RecallStatistics {
        total_errors: count("SELECT COUNT(*) FROM error_records WHERE expires_at > ?1")?,
        total_violations: count("SELECT COUNT(*) FROM pattern_violations WHERE expires_at > ?1")?,
        total_commands: count("SELECT COUNT(*) FROM command_records WHERE expires_at > ?1")?,
        failed_commands: count(
            "SELECT COUNT(*) FROM command_records WHERE success = 0 AND expires_at > ?1",
        )?,
        unique_signatures: count(
            "SELECT COUNT(DISTINCT signature) FROM error_records WHERE expires_at > ?1",
        )?,
        top_errors: top_counts(
            conn,
            "SELECT error_type, COUNT(*) AS n FROM error_records
             WHERE expires_at > ?1 GROUP BY error_type
             ORDER BY n DESC, error_type ASC LIMIT ?2",
            &now,
            top_n,
        )?,
        top_patterns: top_counts(
            conn,
            "SELECT pattern_name, COUNT(*) AS n FROM pattern_violations
             WHERE expires_at > ?1 GROUP BY pattern_name
             ORDER BY n DESC, pattern_name ASC LIMIT ?2",
            &now,
            top_n,
        )?,
    })
}

fn top_counts(
    conn: &Connection,
    sql: &str,
    now: &str,
    top_n: usize,
) -> OverseerResult<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(sql).map_err(sql_err)?;
    let rows = stmt
        .query_map(params![now, top_n as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(sql_err)?;
    rows.map(|r| r.map(|(k, n)| (k, n.max(0) as usize)).map_err(sql_err))
        .collect()
}

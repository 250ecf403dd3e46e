//! v001: error_records, error_context, pattern_violations, command_records.

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::to_storage_err;

pub fn migrate(conn: &Connection) -> OverseerResult<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS error_records (
            id             TEXT PRIMARY KEY,
            error_type     TEXT NOT NULL,
            signature      TEXT NOT NULL,
            file_path      TEXT,
            message        TEXT NOT NULL,
            attempted_fix  TEXT,
            created_at     TEXT NOT NULL,
            expires_at     TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_errors_type_file ON error_records(error_type, file_path);
        CREATE INDEX IF NOT EXISTS idx_errors_expiry ON error_records(expires_at);
        CREATE INDEX IF NOT EXISTS idx_errors_signature ON error_records(signature, file_path);

        CREATE TABLE IF NOT EXISTS error_context (
            error_id  TEXT NOT NULL REFERENCES error_records(id) ON DELETE CASCADE,
            key       TEXT NOT NULL,
            value     TEXT NOT NULL,
            PRIMARY KEY (error_id, key)
        );

        CREATE TABLE IF NOT EXISTS pattern_violations (
            id            TEXT PRIMARY KEY,
            pattern_name  TEXT NOT NULL,
            signature     TEXT NOT NULL,
            file_path     TEXT,
            description   TEXT NOT NULL,
            severity      TEXT NOT NULL,
            error_id      TEXT REFERENCES error_records(id) ON DELETE SET NULL,
            created_at    TEXT NOT NULL,
            expires_at    TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_violations_pattern_file ON pattern_violations(pattern_name, file_path);
        CREATE INDEX IF NOT EXISTS idx_violations_expiry ON pattern_violations(expires_at);
        CREATE INDEX IF NOT EXISTS idx_violations_signature ON pattern_violations(signature);

        CREATE TABLE IF NOT EXISTS command_records (
            id           TEXT PRIMARY KEY,
            command      TEXT NOT NULL,
            error_type   TEXT NOT NULL,
            error_id     TEXT REFERENCES error_records(id) ON DELETE SET NULL,
            success      INTEGER NOT NULL,
            output       TEXT,
            duration_ms  INTEGER NOT NULL DEFAULT 0,
            created_at   TEXT NOT NULL,
            expires_at   TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_commands_type_success ON command_records(error_type, success);
        CREATE INDEX IF NOT EXISTS idx_commands_expiry ON command_records(expires_at);
        ",
    )
    .map_err(|e| to_storage_err(e.to_string()))?;
    Ok(())
}

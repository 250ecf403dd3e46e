//! Versioned schema migrations, one list per store.

mod v001_recall_tables;
mod v001_decision_tables;
mod v002_calibration_state;

use rusqlite::{params, Connection};

use overseer_core::errors::{OverseerResult, StorageError};

use crate::to_storage_err;

/// Which store a database file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schema {
    /// Error, pattern-violation, and command records.
    Recall,
    /// Decision outcomes, confidence patterns, calibration state.
    Confidence,
}

/// A single forward-only migration step.
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub apply: fn(&Connection) -> OverseerResult<()>,
}

const RECALL_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "recall_tables",
    apply: v001_recall_tables::migrate,
}];

const CONFIDENCE_MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "decision_tables",
        apply: v001_decision_tables::migrate,
    },
    Migration {
        version: 2,
        name: "calibration_state",
        apply: v002_calibration_state::migrate,
    },
];

impl Schema {
    pub fn migrations(self) -> &'static [Migration] {
        match self {
            Self::Recall => RECALL_MIGRATIONS,
            Self::Confidence => CONFIDENCE_MIGRATIONS,
        }
    }

    pub fn latest_version(self) -> u32 {
        self.migrations().last().map_or(0, |m| m.version)
    }
}

/// Current schema version recorded in the database (0 if none).
pub fn current_version(conn: &Connection) -> OverseerResult<u32> {
    ensure_version_table(conn)?;
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

/// Apply every pending migration for `schema`. Returns the resulting version.
pub fn run_migrations(conn: &Connection, schema: Schema) -> OverseerResult<u32> {
    let start = current_version(conn)?;
    let mut version = start;

    for migration in schema.migrations().iter().filter(|m| m.version > start) {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| to_storage_err(format!("migration begin: {e}")))?;

        (migration.apply)(&tx).map_err(|e| StorageError::MigrationFailed {
            version: migration.version,
            reason: e.to_string(),
        })?;

        tx.execute(
            "INSERT INTO schema_version (version, name, applied_at)
             VALUES (?1, ?2, strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))",
            params![migration.version, migration.name],
        )
        .map_err(|e| to_storage_err(e.to_string()))?;

        tx.commit().map_err(|e| StorageError::MigrationFailed {
            version: migration.version,
            reason: e.to_string(),
        })?;

        tracing::debug!(
            schema = ?schema,
            version = migration.version,
            name = migration.name,
            "applied migration"
        );
        version = migration.version;
    }

    Ok(version)
}

fn ensure_version_table(conn: &Connection) -> OverseerResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version     INTEGER PRIMARY KEY,
            name        TEXT NOT NULL,
            applied_at  TEXT NOT NULL
        );",
    )
    .map_err(|e| to_storage_err(e.to_string()))
}

//! StorageEngine: owns ConnectionPool, startup pragma configuration,
//! migrations, and read/write routing.

use std::path::Path;

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use crate::maintenance;
use crate::migrations::{self, Schema};
use crate::pool::ConnectionPool;
use crate::to_storage_err;

/// One embedded database: a single writer plus WAL readers.
pub struct StorageEngine {
    pool: ConnectionPool,
    schema: Schema,
}

impl StorageEngine {
    /// Open (creating if needed) a file-backed store and migrate it.
    pub fn open(path: &Path, schema: Schema, read_pool_size: usize) -> OverseerResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| to_storage_err(format!("create {}: {e}", parent.display())))?;
        }
        let mut pool = ConnectionPool::open_writer(path)?;
        pool.writer
            .with_lock(|conn| migrations::run_migrations(conn, schema).map(|_| ()))?;
        pool.attach_readers(read_pool_size)?;
        tracing::info!(path = %path.display(), schema = ?schema, "storage opened");
        Ok(Self { pool, schema })
    }

    /// Open an in-memory store (for testing). Reads are routed through the writer.
    pub fn open_in_memory(schema: Schema) -> OverseerResult<Self> {
        let pool = ConnectionPool::open_in_memory()?;
        pool.writer
            .with_lock(|conn| migrations::run_migrations(conn, schema).map(|_| ()))?;
        Ok(Self { pool, schema })
    }

    pub fn schema(&self) -> Schema {
        self.schema
    }

    pub fn is_file_backed(&self) -> bool {
        self.pool.readers.is_some()
    }

    /// Execute a mutation under the store-wide write lock.
    pub fn with_writer<F, T>(&self, f: F) -> OverseerResult<T>
    where
        F: FnOnce(&Connection) -> OverseerResult<T>,
    {
        self.pool.writer.with_lock(f)
    }

    /// Execute a read-only query on the best available connection.
    /// File-backed: uses the read pool (no writer contention).
    /// In-memory: uses the writer.
    pub fn with_reader<F, T>(&self, f: F) -> OverseerResult<T>
    where
        F: FnOnce(&Connection) -> OverseerResult<T>,
    {
        match &self.pool.readers {
            Some(readers) => readers.with_reader(f),
            None => self.pool.writer.with_lock(f),
        }
    }

    /// Integrity check through a reader.
    pub fn integrity_ok(&self) -> OverseerResult<bool> {
        Ok(self.with_reader(maintenance::integrity_problems)?.is_empty())
    }

    /// Truncating WAL checkpoint through the writer.
    pub fn checkpoint(&self) -> OverseerResult<()> {
        let stats = self.with_writer(maintenance::checkpoint)?;
        if stats.busy {
            tracing::warn!(schema = ?self.schema, "checkpoint could not finish, readers still active");
        } else {
            tracing::debug!(
                schema = ?self.schema,
                frames = stats.checkpointed_frames,
                "checkpoint complete"
            );
        }
        Ok(())
    }

    /// Reclaim space after large expiry sweeps.
    pub fn vacuum(&self) -> OverseerResult<()> {
        self.with_writer(maintenance::vacuum)
    }

    pub fn schema_version(&self) -> OverseerResult<u32> {
        self.with_writer(migrations::current_version)
    }
}

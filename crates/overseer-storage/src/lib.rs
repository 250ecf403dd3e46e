//! # overseer-storage
//!
//! Embedded SQLite stores for the recall database and the confidence
//! pattern store. One mutex-guarded writer serializes every mutation;
//! a pool of read-only connections serves queries concurrently under WAL.

pub mod engine;
pub mod maintenance;
pub mod migrations;
pub mod pool;
pub mod time;

pub use engine::StorageEngine;
pub use migrations::Schema;

use overseer_core::errors::{OverseerError, StorageError};

/// Map any displayable SQLite failure into the workspace error type.
pub fn to_storage_err(message: impl Into<String>) -> OverseerError {
    OverseerError::StorageError(StorageError::SqliteError {
        message: message.into(),
    })
}

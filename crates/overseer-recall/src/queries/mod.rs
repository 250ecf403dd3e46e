//! SQL for each record family. Every function takes an explicit `now`
//! so expiry is evaluated against a single instant per call.

pub mod cleanup;
pub mod commands;
pub mod errors;
pub mod stats;
pub mod violations;

use overseer_core::errors::OverseerError;

pub(crate) fn sql_err(e: rusqlite::Error) -> OverseerError {
    overseer_storage::to_storage_err(e.to_string())
}

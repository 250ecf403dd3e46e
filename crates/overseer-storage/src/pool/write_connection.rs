//! The one connection allowed to mutate a store.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::Connection;

use overseer_core::errors::OverseerResult;

use super::pragmas::{configure, Role};
use crate::to_storage_err;

/// Holding `conn` is holding the store's write lock, so multi-statement
/// record writes never interleave.
pub struct WriteConnection {
    conn: Mutex<Connection>,
}

impl WriteConnection {
    pub fn open(path: &Path) -> OverseerResult<Self> {
        let conn = Connection::open(path)
            .map_err(|e| to_storage_err(format!("open {}: {e}", path.display())))?;
        Self::tuned(conn)
    }

    pub fn open_in_memory() -> OverseerResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| to_storage_err(e.to_string()))?;
        Self::tuned(conn)
    }

    fn tuned(conn: Connection) -> OverseerResult<Self> {
        configure(&conn, Role::Writer)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_lock<F, T>(&self, f: F) -> OverseerResult<T>
    where
        F: FnOnce(&Connection) -> OverseerResult<T>,
    {
        let conn = self
            .conn
            .lock()
            .map_err(|_| to_storage_err("writer poisoned by a panicked write"))?;
        f(&conn)
    }
}

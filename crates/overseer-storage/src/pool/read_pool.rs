//! Read-only connections for recall lookups and confidence history.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, TryLockError};

use rusqlite::{Connection, OpenFlags};

use overseer_core::errors::OverseerResult;

use super::pragmas::{configure, Role};
use crate::to_storage_err;

/// Upper bound on reader connections per store.
const MAX_READERS: usize = 8;

pub struct ReadPool {
    slots: Box<[Mutex<Connection>]>,
    cursor: AtomicUsize,
}

impl ReadPool {
    /// Attach `size` readers (clamped to 1..=8) to an existing file.
    pub fn open(path: &Path, size: usize) -> OverseerResult<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let slots = (0..size.clamp(1, MAX_READERS))
            .map(|_| {
                let conn = Connection::open_with_flags(path, flags)
                    .map_err(|e| to_storage_err(format!("reader {}: {e}", path.display())))?;
                configure(&conn, Role::Reader)?;
                Ok(Mutex::new(conn))
            })
            .collect::<OverseerResult<Vec<_>>>()?;
        Ok(Self {
            slots: slots.into_boxed_slice(),
            cursor: AtomicUsize::new(0),
        })
    }

    /// Run `f` on the first idle reader, starting from a rotating offset.
    /// When every reader is busy, wait on the one at the offset.
    pub fn with_reader<F, T>(&self, f: F) -> OverseerResult<T>
    where
        F: FnOnce(&Connection) -> OverseerResult<T>,
    {
        let n = self.slots.len();
        let start = self.cursor.fetch_add(1, Ordering::Relaxed) % n;
        for offset in 0..n {
            match self.slots[(start + offset) % n].try_lock() {
                Ok(conn) => return f(&conn),
                Err(TryLockError::WouldBlock) => continue,
                Err(TryLockError::Poisoned(_)) => {
                    return Err(to_storage_err("reader poisoned by a panicked query"))
                }
            }
        }
        let conn = self.slots[start]
            .lock()
            .map_err(|_| to_storage_err("reader poisoned by a panicked query"))?;
        f(&conn)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

//! Writer plus optional readers for one store file.

pub mod pragmas;
pub mod read_pool;
pub mod write_connection;

use std::path::{Path, PathBuf};

use overseer_core::errors::OverseerResult;

pub use read_pool::ReadPool;
pub use write_connection::WriteConnection;

pub struct ConnectionPool {
    pub writer: WriteConnection,
    /// Absent for in-memory stores: a second connection would open a
    /// second, empty database.
    pub readers: Option<ReadPool>,
    pub db_path: Option<PathBuf>,
}

impl ConnectionPool {
    /// Writer only; readers need the file the first migration creates.
    pub fn open_writer(path: &Path) -> OverseerResult<Self> {
        Ok(Self {
            writer: WriteConnection::open(path)?,
            readers: None,
            db_path: Some(path.to_path_buf()),
        })
    }

    pub fn attach_readers(&mut self, size: usize) -> OverseerResult<()> {
        if let Some(path) = &self.db_path {
            self.readers = Some(ReadPool::open(path, size)?);
        }
        Ok(())
    }

    pub fn open_in_memory() -> OverseerResult<Self> {
        Ok(Self {
            writer: WriteConnection::open_in_memory()?,
            readers: None,
            db_path: None,
        })
    }
}

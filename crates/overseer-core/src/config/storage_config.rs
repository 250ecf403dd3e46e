use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::defaults;

/// On-disk layout for the two embedded stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory both databases live under.
    pub root_dir: String,
    pub recall_db_file: String,
    pub confidence_db_file: String,
    pub read_pool_size: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root_dir: defaults::DEFAULT_ROOT_DIR.to_string(),
            recall_db_file: defaults::DEFAULT_RECALL_DB_FILE.to_string(),
            confidence_db_file: defaults::DEFAULT_CONFIDENCE_DB_FILE.to_string(),
            read_pool_size: defaults::DEFAULT_READ_POOL_SIZE,
        }
    }
}

impl StorageConfig {
    /// Config rooted at `dir`, other fields default.
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            root_dir: dir.to_string_lossy().into_owned(),
            ..Self::default()
        }
    }

    pub fn recall_db_path(&self) -> PathBuf {
        Path::new(&self.root_dir).join(&self.recall_db_file)
    }

    pub fn confidence_db_path(&self) -> PathBuf {
        Path::new(&self.root_dir).join(&self.confidence_db_file)
    }
}

use async_trait::async_trait;

use crate::errors::OverseerResult;

/// External point-in-time recovery target.
#[async_trait]
pub trait ISnapshotManager: Send + Sync {
    /// Id of the most recent known-good snapshot, if one exists.
    async fn latest_snapshot_id(&self) -> OverseerResult<Option<String>>;

    /// Restore the given snapshot. `Ok(false)` means the restore was refused.
    async fn restore_snapshot(&self, snapshot_id: &str) -> OverseerResult<bool>;
}

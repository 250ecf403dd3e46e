//! Cooperative abort flag shared between the run loop and its callers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// Clonable handle that requests an emergency rollback.
///
/// The controller checks the flag once per loop iteration. In-flight
/// component calls are not preempted; they finish or hit their own timeout.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    requested: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self, reason: impl Into<String>) {
        let reason = reason.into();
        tracing::warn!(reason = %reason, "emergency abort requested");
        *self.lock_reason() = Some(reason);
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.requested.load(Ordering::SeqCst)
    }

    pub fn reason(&self) -> Option<String> {
        self.lock_reason().clone()
    }

    pub(crate) fn clear(&self) {
        self.requested.store(false, Ordering::SeqCst);
        *self.lock_reason() = None;
    }

    fn lock_reason(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.reason
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let handle = AbortHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_requested());
        remote.abort("operator stop");
        assert!(handle.is_requested());
        assert_eq!(handle.reason().as_deref(), Some("operator stop"));
        handle.clear();
        assert!(!remote.is_requested());
        assert!(remote.reason().is_none());
    }
}

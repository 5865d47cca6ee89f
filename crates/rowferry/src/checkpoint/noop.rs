//! No-op checkpoint store for runs without resume capability.
//!
//! Interrupted runs restart from offset 0 and rely on idempotent
//! destination writes to absorb the repeated pages.

use async_trait::async_trait;
use tracing::warn;

use super::CheckpointStore;
use crate::error::Result;

/// Checkpoint store that persists nothing.
///
/// Logs a warning on first use.
pub struct NoopCheckpointStore {
    warned: std::sync::atomic::AtomicBool,
}

impl NoopCheckpointStore {
    /// Create a new no-op checkpoint store.
    pub fn new() -> Self {
        Self {
            warned: std::sync::atomic::AtomicBool::new(false),
        }
    }

    fn warn_once(&self) {
        if !self
            .warned
            .swap(true, std::sync::atomic::Ordering::SeqCst)
        {
            warn!(
                "Using no-op checkpoint store: progress will not be persisted. \
                 An interrupted run restarts from offset 0."
            );
        }
    }
}

impl Default for NoopCheckpointStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CheckpointStore for NoopCheckpointStore {
    async fn load(&self) -> Result<u64> {
        // No prior state by construction
        Ok(0)
    }

    async fn save(&self, _offset: u64) -> Result<()> {
        self.warn_once();
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "noop"
    }
}

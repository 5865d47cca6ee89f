//! Durable offset persistence for resume capability.

mod noop;

pub use noop::NoopCheckpointStore;

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{MigrateError, Result};

/// Persists the next-unread source offset across process restarts.
///
/// The stored value is monotonically non-decreasing over the life of a
/// migration run. The coordinator persists it only after every record of
/// the page it covers has been enqueued. This is an at-least-once tradeoff: a
/// crash between enqueue and write can redeliver that page's records on
/// the next run, so destination writes must be idempotent (see
/// [`TargetWriter`](crate::target::TargetWriter)).
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across async tasks.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    /// Read the saved offset, or 0 when no prior state exists.
    ///
    /// Unreadable prior state (corrupt contents, IO failure other than
    /// absence) is an error, not a silent restart from 0.
    async fn load(&self) -> Result<u64>;

    /// Durably persist `offset` so that a subsequent [`load`](Self::load)
    /// in a new process returns it.
    ///
    /// A failure here is fatal to the run: losing progress tracking would
    /// silently repeat already-migrated pages on every restart.
    async fn save(&self, offset: u64) -> Result<()>;

    /// Backend name for logging.
    fn backend_type(&self) -> &'static str;
}

/// Checkpoint store backed by a single text file holding the offset in
/// decimal.
///
/// Saves are atomic: the offset is written to a temp file which is then
/// renamed over the real one, so a crash mid-save leaves the previous
/// checkpoint intact.
pub struct FileCheckpointStore {
    path: PathBuf,
}

impl FileCheckpointStore {
    /// Create a store persisting to `path`. The file is created on first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file this store persists to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn load(&self) -> Result<u64> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No checkpoint file at {:?}, starting from 0", self.path);
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        content.trim().parse::<u64>().map_err(|e| {
            MigrateError::Checkpoint(format!(
                "corrupt checkpoint file {:?} ({:?}): {}",
                self.path,
                content.trim(),
                e
            ))
        })
    }

    async fn save(&self, offset: u64) -> Result<()> {
        // Atomic write: write to temp file, then rename
        let temp_path = self.path.with_extension("tmp");
        std::fs::write(&temp_path, offset.to_string()).map_err(|e| {
            MigrateError::Checkpoint(format!("failed to write {:?}: {}", temp_path, e))
        })?;
        std::fs::rename(&temp_path, &self.path).map_err(|e| {
            MigrateError::Checkpoint(format!("failed to replace {:?}: {}", self.path, e))
        })?;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "file"
    }
}

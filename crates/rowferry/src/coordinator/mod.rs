//! Migration coordinator - drives the extract → enqueue → checkpoint loop.

use std::sync::atomic::AtomicI64;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointStore;
use crate::config::MigrationConfig;
use crate::deadletter::DeadLetterSink;
use crate::error::{MigrateError, Result};
use crate::pool::WorkerPool;
use crate::source::SourceReader;
use crate::target::TargetWriter;
use crate::transform::{AcceptAll, Transform};

/// Final status of a migration run.
///
/// A failed run surfaces as an `Err` from [`Coordinator::run`], not as a
/// status value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Completed,
    Cancelled,
}

/// Result of a migration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationResult {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: RunStatus,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run finished.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// Non-empty pages fetched from the source.
    pub pages_fetched: u64,

    /// Records handed to the worker pool.
    pub records_enqueued: u64,

    /// Records successfully written to the destination.
    pub records_written: u64,

    /// Records whose write failed and were dead-lettered.
    pub records_failed: u64,

    /// Records rejected by the transform.
    pub records_filtered: u64,

    /// Next unread source offset after the run.
    pub final_offset: u64,

    /// Average write throughput (records/second).
    pub records_per_second: f64,
}

/// Orchestrates one migration run.
///
/// Loads the checkpoint, starts the worker pool, then repeats fetch →
/// enqueue → checkpoint until the source returns an empty page. The
/// checkpoint is persisted only after every record of a page has been
/// enqueued, giving at-least-once delivery: a crash between enqueue and
/// write redelivers that page on the next run, which the destination's
/// idempotent upsert absorbs.
pub struct Coordinator {
    source: Arc<dyn SourceReader>,
    destination: Arc<dyn TargetWriter>,
    checkpoint: Arc<dyn CheckpointStore>,
    dead_letters: Arc<dyn DeadLetterSink>,
    transform: Arc<dyn Transform>,
    workers: usize,
    batch_size: usize,
    progress: Option<Arc<AtomicI64>>,
}

/// What the fetch loop produced before the pool was drained.
struct DriveOutcome {
    status: RunStatus,
    pages: u64,
    enqueued: u64,
    offset: u64,
}

impl Coordinator {
    /// Create a coordinator over the four store seams.
    ///
    /// Worker count and batch size come from `migration`; the batch size
    /// is also the queue capacity, so a full page always fits in flight.
    /// The default transform is [`AcceptAll`].
    pub fn new(
        source: Arc<dyn SourceReader>,
        destination: Arc<dyn TargetWriter>,
        checkpoint: Arc<dyn CheckpointStore>,
        dead_letters: Arc<dyn DeadLetterSink>,
        migration: &MigrationConfig,
    ) -> Self {
        Self {
            source,
            destination,
            checkpoint,
            dead_letters,
            transform: Arc::new(AcceptAll),
            workers: migration.effective_workers().max(1),
            batch_size: migration.effective_batch_size().max(1),
            progress: None,
        }
    }

    /// Replace the inclusion predicate / mapping.
    pub fn with_transform(mut self, transform: Arc<dyn Transform>) -> Self {
        self.transform = transform;
        self
    }

    /// Attach a shared counter incremented once per successful write, for
    /// real-time progress reporting.
    pub fn with_progress_counter(mut self, counter: Arc<AtomicI64>) -> Self {
        self.progress = Some(counter);
        self
    }

    /// Run the migration to completion, cancellation, or fatal error.
    pub async fn run(self, cancel: Option<CancellationToken>) -> Result<MigrationResult> {
        let cancel = cancel.unwrap_or_default();
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();

        let start_offset = self.checkpoint.load().await?;
        if start_offset > 0 {
            info!(
                "Resuming from checkpoint offset {} ({} store)",
                start_offset,
                self.checkpoint.backend_type()
            );
        }
        info!(
            "Starting migration run {} ({} workers, batch size {})",
            run_id, self.workers, self.batch_size
        );

        let pool = WorkerPool::start(
            self.workers,
            self.batch_size,
            self.transform.clone(),
            self.destination.clone(),
            self.dead_letters.clone(),
            cancel.clone(),
            self.progress.clone(),
        );

        let driven = self.drive(&pool, &cancel, start_offset).await;

        // Drain before surfacing any error: records already enqueued are
        // delivered to the pipeline even when the run aborts.
        pool.close();
        let joined = pool.join().await;

        let outcome = driven?;
        let stats = joined?;

        let completed_at = Utc::now();
        let duration_seconds = (completed_at - started_at).num_milliseconds() as f64 / 1000.0;
        let records_per_second = if duration_seconds > 0.0 {
            stats.written as f64 / duration_seconds
        } else {
            0.0
        };

        match outcome.status {
            RunStatus::Completed => info!(
                "Migration run {} completed: {} pages, {} enqueued, {} written, \
                 {} failed, {} filtered, final offset {} ({:.0} records/sec)",
                run_id,
                outcome.pages,
                outcome.enqueued,
                stats.written,
                stats.failed,
                stats.filtered,
                outcome.offset,
                records_per_second
            ),
            RunStatus::Cancelled => warn!(
                "Migration run {} cancelled at offset {} after {} pages",
                run_id, outcome.offset, outcome.pages
            ),
        }

        Ok(MigrationResult {
            run_id,
            status: outcome.status,
            started_at,
            completed_at,
            duration_seconds,
            pages_fetched: outcome.pages,
            records_enqueued: outcome.enqueued,
            records_written: stats.written,
            records_failed: stats.failed,
            records_filtered: stats.filtered,
            final_offset: outcome.offset,
            records_per_second,
        })
    }

    /// The extract → enqueue → checkpoint loop.
    ///
    /// Terminates on the empty-page sentinel, never on a count comparison,
    /// so sources of unknown or changing size are handled (subject to the
    /// ordering-stability precondition on [`SourceReader`]).
    async fn drive(
        &self,
        pool: &WorkerPool,
        cancel: &CancellationToken,
        start_offset: u64,
    ) -> Result<DriveOutcome> {
        let mut offset = start_offset;
        let mut pages = 0u64;
        let mut enqueued = 0u64;

        loop {
            if cancel.is_cancelled() {
                info!("Cancellation requested, stopping fetch loop");
                return Ok(DriveOutcome {
                    status: RunStatus::Cancelled,
                    pages,
                    enqueued,
                    offset,
                });
            }

            let page = self.source.fetch_page(offset, self.batch_size).await?;
            if page.is_empty() {
                debug!("Source exhausted at offset {}", offset);
                return Ok(DriveOutcome {
                    status: RunStatus::Completed,
                    pages,
                    enqueued,
                    offset,
                });
            }

            let page_len = page.len() as u64;
            for record in page {
                match pool.enqueue(record).await {
                    Ok(()) => enqueued += 1,
                    // Mid-page cancellation: the partially-enqueued page is
                    // NOT checkpointed, so the next run refetches it whole.
                    Err(MigrateError::Cancelled) => {
                        info!("Cancellation requested, stopping mid-page");
                        return Ok(DriveOutcome {
                            status: RunStatus::Cancelled,
                            pages,
                            enqueued,
                            offset,
                        });
                    }
                    Err(e) => return Err(e),
                }
            }

            offset += page_len;
            pages += 1;
            self.checkpoint.save(offset).await?;
            debug!(
                "Page {}: {} records enqueued, checkpoint advanced to {}",
                pages, page_len, offset
            );
        }
    }
}

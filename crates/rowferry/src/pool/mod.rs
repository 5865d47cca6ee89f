//! Bounded worker pool: the distributor between extraction and writes.
//!
//! One bounded MPMC queue plus a fixed number of consumer tasks. The queue
//! is the sole synchronization primitive between the coordinator and the
//! workers: it hands records off and, being bounded, blocks the coordinator
//! when the destination cannot keep up (backpressure). Workers never
//! communicate with each other, and no record is ever seen by more than
//! one worker.
//!
//! Ordering across workers is NOT guaranteed: once enqueued, a record's
//! fate is independent of page boundaries, so records from the same page
//! may be written in either order and records from different pages may
//! interleave arbitrarily.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::deadletter::{DeadLetterEntry, DeadLetterSink};
use crate::error::{MigrateError, Result};
use crate::record::Record;
use crate::target::TargetWriter;
use crate::transform::Transform;

/// Aggregated worker counters.
///
/// Each worker keeps its own local copy and returns it from its task;
/// [`WorkerPool::join`] merges them. No shared mutable counters on the
/// record path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Records successfully written to the destination.
    pub written: u64,
    /// Records whose write failed and were dead-lettered.
    pub failed: u64,
    /// Records rejected by the transform (dropped silently).
    pub filtered: u64,
}

impl PoolStats {
    fn merge(&mut self, other: PoolStats) {
        self.written += other.written;
        self.failed += other.failed;
        self.filtered += other.filtered;
    }
}

/// Fixed-size pool of record-processing workers behind a bounded queue.
pub struct WorkerPool {
    tx: async_channel::Sender<Record>,
    handles: Vec<JoinHandle<PoolStats>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Spawn `workers` consumer tasks behind a queue of `queue_capacity`.
    ///
    /// Each worker loops dequeue → accept → apply → write until the queue
    /// is closed and drained or `cancel` fires. An optional shared
    /// `progress` counter is incremented once per successful write for
    /// real-time observation.
    pub fn start(
        workers: usize,
        queue_capacity: usize,
        transform: Arc<dyn Transform>,
        destination: Arc<dyn TargetWriter>,
        dead_letters: Arc<dyn DeadLetterSink>,
        cancel: CancellationToken,
        progress: Option<Arc<AtomicI64>>,
    ) -> Self {
        let (tx, rx) = async_channel::bounded::<Record>(queue_capacity.max(1));

        let mut handles = Vec::with_capacity(workers.max(1));
        for worker_id in 0..workers.max(1) {
            let rx = rx.clone();
            let transform = transform.clone();
            let destination = destination.clone();
            let dead_letters = dead_letters.clone();
            let cancel = cancel.clone();
            let progress = progress.clone();

            handles.push(tokio::spawn(async move {
                worker_loop(
                    worker_id,
                    rx,
                    transform,
                    destination,
                    dead_letters,
                    cancel,
                    progress,
                )
                .await
            }));
        }
        drop(rx);

        Self {
            tx,
            handles,
            cancel,
        }
    }

    /// Number of worker tasks.
    pub fn workers(&self) -> usize {
        self.handles.len()
    }

    /// Hand one record to the pool, blocking while the queue is full.
    ///
    /// This blocking is the system's backpressure: the coordinator cannot
    /// fetch the source faster than the destination absorbs writes.
    pub async fn enqueue(&self, record: Record) -> Result<()> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(MigrateError::Cancelled),
            sent = self.tx.send(record) => sent.map_err(|_| {
                MigrateError::Pool("queue closed before all records were enqueued".into())
            }),
        }
    }

    /// Stop accepting new records. Workers keep draining what is queued.
    pub fn close(&self) {
        self.tx.close();
    }

    /// Wait for every worker to exit and aggregate their counters.
    pub async fn join(self) -> Result<PoolStats> {
        // Idempotent with close(); guarantees the queue drains even if the
        // caller never closed explicitly.
        self.tx.close();

        let results = try_join_all(self.handles)
            .await
            .map_err(|e| MigrateError::Pool(format!("worker task panicked: {}", e)))?;

        let mut total = PoolStats::default();
        for stats in results {
            total.merge(stats);
        }
        Ok(total)
    }
}

async fn worker_loop(
    worker_id: usize,
    rx: async_channel::Receiver<Record>,
    transform: Arc<dyn Transform>,
    destination: Arc<dyn TargetWriter>,
    dead_letters: Arc<dyn DeadLetterSink>,
    cancel: CancellationToken,
    progress: Option<Arc<AtomicI64>>,
) -> PoolStats {
    let mut stats = PoolStats::default();

    loop {
        let record = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Worker {}: cancellation requested, exiting", worker_id);
                break;
            }
            recv = rx.recv() => match recv {
                Ok(record) => record,
                // Queue closed and drained
                Err(_) => break,
            },
        };

        if !transform.accept(&record) {
            stats.filtered += 1;
            continue;
        }
        let record = transform.apply(record);

        match destination.write(&record).await {
            Ok(()) => {
                stats.written += 1;
                if let Some(counter) = &progress {
                    counter.fetch_add(1, Ordering::Relaxed);
                }
            }
            Err(e) => {
                stats.failed += 1;
                error!(
                    "Worker {}: write failed for record {}: {}",
                    worker_id, record.id, e
                );
                let entry = DeadLetterEntry::for_record(&record, &e);
                if let Err(append_err) = dead_letters.record(&entry).await {
                    // Best effort only: the in-flight loop must not stall.
                    error!(
                        "Worker {}: dead-letter append failed for record {}: {}",
                        worker_id, record.id, append_err
                    );
                }
            }
        }
    }

    debug!(
        "Worker {}: exiting ({} written, {} failed, {} filtered)",
        worker_id, stats.written, stats.failed, stats.filtered
    );
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::MemoryTarget;
    use crate::testutil::{records, CollectingSink, FailingTarget};
    use crate::transform::{AcceptAll, FilterFn};

    fn pool_with(
        workers: usize,
        capacity: usize,
        transform: Arc<dyn Transform>,
        destination: Arc<dyn TargetWriter>,
        dead_letters: Arc<dyn DeadLetterSink>,
    ) -> WorkerPool {
        WorkerPool::start(
            workers,
            capacity,
            transform,
            destination,
            dead_letters,
            CancellationToken::new(),
            None,
        )
    }

    #[tokio::test]
    async fn test_drains_queue_and_aggregates_counts() {
        let target = Arc::new(MemoryTarget::new());
        let sink = Arc::new(CollectingSink::new());
        let pool = pool_with(2, 4, Arc::new(AcceptAll), target.clone(), sink.clone());

        for record in records(10) {
            pool.enqueue(record).await.unwrap();
        }
        pool.close();
        let stats = pool.join().await.unwrap();

        assert_eq!(stats.written, 10);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.filtered, 0);
        assert_eq!(target.len(), 10);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_rejected_records_skip_write_and_dead_letter() {
        let target = Arc::new(MemoryTarget::new());
        let sink = Arc::new(CollectingSink::new());
        let even_only = Arc::new(FilterFn(|r: &Record| r.id % 2 == 0));
        let pool = pool_with(3, 4, even_only, target.clone(), sink.clone());

        for record in records(10) {
            pool.enqueue(record).await.unwrap();
        }
        let stats = pool.join().await.unwrap();

        assert_eq!(stats.written, 5);
        assert_eq!(stats.filtered, 5);
        assert_eq!(target.ids(), vec![2, 4, 6, 8, 10]);
        assert!(sink.entries().is_empty());
    }

    #[tokio::test]
    async fn test_write_failure_dead_letters_and_continues() {
        let target = Arc::new(FailingTarget::new([3]));
        let sink = Arc::new(CollectingSink::new());
        let pool = pool_with(2, 4, Arc::new(AcceptAll), target.clone(), sink.clone());

        for record in records(5) {
            pool.enqueue(record).await.unwrap();
        }
        let stats = pool.join().await.unwrap();

        assert_eq!(stats.written, 4);
        assert_eq!(stats.failed, 1);

        let entries = sink.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, 3);
        assert!(entries[0].error.contains("induced write failure"));
    }

    #[tokio::test]
    async fn test_dead_letter_append_failure_does_not_stall_pool() {
        let target = Arc::new(FailingTarget::new([1, 2]));
        let sink = Arc::new(CollectingSink::failing());
        let pool = pool_with(2, 4, Arc::new(AcceptAll), target, sink);

        for record in records(4) {
            pool.enqueue(record).await.unwrap();
        }
        let stats = pool.join().await.unwrap();

        // Both failures are still counted even though the sink lost them.
        assert_eq!(stats.written, 2);
        assert_eq!(stats.failed, 2);
    }

    #[tokio::test]
    async fn test_enqueue_after_close_errors() {
        let pool = pool_with(
            1,
            2,
            Arc::new(AcceptAll),
            Arc::new(MemoryTarget::new()),
            Arc::new(CollectingSink::new()),
        );
        pool.close();

        let err = pool.enqueue(Record::new(1, "", "")).await.unwrap_err();
        assert!(matches!(err, MigrateError::Pool(_)));
    }

    #[tokio::test]
    async fn test_cancellation_stops_workers() {
        let cancel = CancellationToken::new();
        let pool = WorkerPool::start(
            2,
            2,
            Arc::new(AcceptAll),
            Arc::new(MemoryTarget::new()),
            Arc::new(CollectingSink::new()),
            cancel.clone(),
            None,
        );

        cancel.cancel();

        let err = pool.enqueue(Record::new(1, "", "")).await.unwrap_err();
        assert!(matches!(err, MigrateError::Cancelled));

        let stats = pool.join().await.unwrap();
        assert_eq!(stats, PoolStats::default());
    }

    #[tokio::test]
    async fn test_progress_counter_tracks_writes() {
        let progress = Arc::new(AtomicI64::new(0));
        let pool = WorkerPool::start(
            2,
            4,
            Arc::new(AcceptAll),
            Arc::new(MemoryTarget::new()),
            Arc::new(CollectingSink::new()),
            CancellationToken::new(),
            Some(progress.clone()),
        );

        for record in records(6) {
            pool.enqueue(record).await.unwrap();
        }
        pool.join().await.unwrap();

        assert_eq!(progress.load(Ordering::Relaxed), 6);
    }
}

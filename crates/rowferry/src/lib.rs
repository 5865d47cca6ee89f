//! # rowferry
//!
//! Resumable batch data-migration engine.
//!
//! This library moves records from a source relational store to a
//! destination relational store with support for:
//!
//! - **Paginated extraction** via OFFSET/LIMIT range queries
//! - **Bounded worker pools** with queue backpressure
//! - **Resume capability** via a durable offset checkpoint
//! - **Dead-letter capture** of records whose writes fail
//! - **At-least-once delivery** absorbed by idempotent destination upserts
//!
//! The two stores are opaque clients behind the [`SourceReader`] and
//! [`TargetWriter`] traits; wire in whatever drivers reach your databases.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use rowferry::{
//!     Config, Coordinator, CsvDeadLetterSink, FileCheckpointStore, MemorySource,
//!     MemoryTarget, RequireFieldA,
//! };
//!
//! #[tokio::main]
//! async fn main() -> rowferry::Result<()> {
//!     let config = Config::load("config.yaml")?.with_auto_tuning();
//!
//!     // Memory stores stand in for real driver-backed implementations.
//!     let coordinator = Coordinator::new(
//!         Arc::new(MemorySource::new(Vec::new())),
//!         Arc::new(MemoryTarget::new()),
//!         Arc::new(FileCheckpointStore::new(&config.migration.checkpoint_path)),
//!         Arc::new(CsvDeadLetterSink::create(&config.migration.dead_letter_path)?),
//!         &config.migration,
//!     )
//!     .with_transform(Arc::new(RequireFieldA));
//!
//!     let result = coordinator.run(None).await?;
//!     println!("Migrated {} records", result.records_written);
//!     Ok(())
//! }
//! ```

pub mod checkpoint;
pub mod config;
pub mod coordinator;
pub mod deadletter;
pub mod error;
pub mod pool;
pub mod record;
pub mod source;
pub mod target;
pub mod transform;

#[cfg(test)]
mod testutil;

// Re-exports for convenient access
pub use checkpoint::{CheckpointStore, FileCheckpointStore, NoopCheckpointStore};
pub use config::{Config, EndpointConfig, MigrationConfig, SystemResources};
pub use coordinator::{Coordinator, MigrationResult, RunStatus};
pub use deadletter::{CsvDeadLetterSink, DeadLetterEntry, DeadLetterSink};
pub use error::{MigrateError, Result};
pub use pool::{PoolStats, WorkerPool};
pub use record::{Page, Record};
pub use source::{MemorySource, SourceReader};
pub use target::{MemoryTarget, TargetWriter};
pub use transform::{AcceptAll, FilterFn, RequireFieldA, Transform};

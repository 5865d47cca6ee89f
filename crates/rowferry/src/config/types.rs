//! Configuration type definitions with auto-tuning based on system resources.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use sysinfo::System;
use tracing::info;

/// System resource information for auto-tuning.
#[derive(Debug, Clone)]
pub struct SystemResources {
    /// Total RAM in bytes.
    pub total_memory_bytes: u64,
    /// Number of CPU cores.
    pub cpu_cores: usize,
}

impl SystemResources {
    /// Detect system resources.
    pub fn detect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();

        Self {
            total_memory_bytes: sys.total_memory(),
            cpu_cores: sys.cpus().len(),
        }
    }

    /// Log detected system resources.
    pub fn log(&self) {
        info!(
            "System resources: {:.1} GB RAM, {} CPU cores",
            self.total_memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0),
            self.cpu_cores
        );
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Source store connection.
    pub source: EndpointConfig,

    /// Destination store connection.
    pub destination: EndpointConfig,

    /// Migration behavior configuration.
    #[serde(default)]
    pub migration: MigrationConfig,
}

impl Config {
    /// Apply auto-tuned defaults based on system resources.
    /// Only fills in values that weren't explicitly set in the config file.
    pub fn with_auto_tuning(mut self) -> Self {
        let resources = SystemResources::detect();
        resources.log();
        self.migration = self.migration.with_auto_tuning(&resources);
        self
    }
}

/// Connection parameters for one store.
///
/// The engine treats both stores as opaque clients behind the
/// [`SourceReader`](crate::source::SourceReader) and
/// [`TargetWriter`](crate::target::TargetWriter) traits, so the connection
/// string is carried verbatim for whatever driver the embedder wires up.
#[derive(Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Driver-specific connection string (DSN).
    pub dsn: String,
}

impl EndpointConfig {
    /// Create an endpoint config from a connection string.
    pub fn new(dsn: impl Into<String>) -> Self {
        Self { dsn: dsn.into() }
    }
}

// DSNs embed credentials; keep them out of Debug output.
impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("dsn", &"[REDACTED]")
            .finish()
    }
}

/// Migration behavior configuration.
/// Performance-related fields use Option<T> to distinguish between
/// "not set" (use auto-tuned default) and "explicitly set" (use provided value).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Number of concurrent workers. Auto-tuned based on CPU cores if not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,

    /// Records per page. Also the worker queue capacity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    /// Durable checkpoint location.
    #[serde(default = "default_checkpoint_path")]
    pub checkpoint_path: PathBuf,

    /// Durable dead-letter log location.
    #[serde(default = "default_dead_letter_path")]
    pub dead_letter_path: PathBuf,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            workers: None,
            batch_size: None,
            checkpoint_path: default_checkpoint_path(),
            dead_letter_path: default_dead_letter_path(),
        }
    }
}

impl MigrationConfig {
    /// Apply auto-tuned defaults for any knob not explicitly set.
    pub fn with_auto_tuning(mut self, resources: &SystemResources) -> Self {
        if self.workers.is_none() {
            // Write path is IO-bound against the destination pool; cap so a
            // large host does not exhaust destination connections.
            self.workers = Some(resources.cpu_cores.clamp(2, 16));
        }
        if self.batch_size.is_none() {
            self.batch_size = Some(DEFAULT_BATCH_SIZE);
        }
        self
    }

    /// Worker count, falling back to the static default when unset.
    pub fn effective_workers(&self) -> usize {
        self.workers.unwrap_or(DEFAULT_WORKERS)
    }

    /// Page length / queue capacity, falling back to the static default when unset.
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.unwrap_or(DEFAULT_BATCH_SIZE)
    }
}

/// Worker count when neither the config file nor auto-tuning set one.
pub const DEFAULT_WORKERS: usize = 4;

/// Page length when the config file does not set one.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

fn default_checkpoint_path() -> PathBuf {
    PathBuf::from("checkpoint.txt")
}

fn default_dead_letter_path() -> PathBuf {
    PathBuf::from("failed_records.csv")
}

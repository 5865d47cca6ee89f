//! Durable append-only log of records that failed to write.
//!
//! Entries are kept in a field-delimited format readable for manual replay:
//! one `id,field_a,field_b,error_message` row per failed write attempt.
//! Entries are never deleted or rewritten by this system.

use async_trait::async_trait;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

use crate::error::{MigrateError, Result};
use crate::record::Record;

/// One failed-write entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterEntry {
    /// Identifier of the failed record.
    pub id: i64,
    /// Field values at the time of the failed write.
    pub field_a: String,
    /// Field values at the time of the failed write.
    pub field_b: String,
    /// Description of the write error.
    pub error: String,
}

impl DeadLetterEntry {
    /// Build an entry for a record whose write failed with `error`.
    pub fn for_record(record: &Record, error: impl std::fmt::Display) -> Self {
        Self {
            id: record.id,
            field_a: record.field_a.clone(),
            field_b: record.field_b.clone(),
            error: error.to_string(),
        }
    }

    /// Render the entry as one delimited row.
    fn to_row(&self) -> String {
        format!(
            "{},{},{},{}",
            self.id,
            quote_field(&self.field_a),
            quote_field(&self.field_b),
            quote_field(&self.error)
        )
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
/// Embedded quotes are doubled.
fn quote_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Appends failed-record entries to a durable log.
///
/// An append failure must not fail the caller's in-flight processing loop:
/// workers log it and continue, so implementations should not assume the
/// caller handles their errors beyond logging.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Append one entry.
    async fn record(&self, entry: &DeadLetterEntry) -> Result<()>;
}

/// Dead-letter sink appending delimited rows to a file.
///
/// The file is opened in append mode at construction, so successive runs
/// accumulate into the same log.
pub struct CsvDeadLetterSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl CsvDeadLetterSink {
    /// Open (creating if needed) the log at `path`.
    ///
    /// Unlike appends, an open failure here is fatal: starting a run that
    /// silently discards its failed records is worse than not starting.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&path)
            .map_err(|e| MigrateError::DeadLetter(format!("failed to open {:?}: {}", path, e)))?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// The file this sink appends to.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl DeadLetterSink for CsvDeadLetterSink {
    async fn record(&self, entry: &DeadLetterEntry) -> Result<()> {
        let row = entry.to_row();
        let mut file = self.file.lock().expect("dead-letter lock poisoned");
        writeln!(file, "{}", row)
            .and_then(|()| file.flush())
            .map_err(|e| {
                MigrateError::DeadLetter(format!("failed to append to {:?}: {}", self.path, e))
            })
    }
}

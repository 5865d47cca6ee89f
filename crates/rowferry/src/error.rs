//! Error types for the migration engine.

use thiserror::Error;

/// Main error type for migration operations.
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Source store fetch error. Always fatal: continuing past a failed
    /// page fetch would leave a gap in the pagination key and silently
    /// skip records.
    #[error("Source fetch failed at offset {offset}: {message}")]
    Source { offset: u64, message: String },

    /// Destination store write error for a single record. Recoverable at
    /// the pool level: the record is dead-lettered and processing continues.
    #[error("Destination write failed: {0}")]
    Destination(String),

    /// Checkpoint store error (corrupt state on load, failed persist).
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Dead-letter log error.
    #[error("Dead-letter log error: {0}")]
    DeadLetter(String),

    /// Worker pool error (queue closed early, worker task panicked).
    #[error("Worker pool error: {0}")]
    Pool(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Migration was cancelled via the cancellation token.
    #[error("Migration cancelled")]
    Cancelled,
}

impl MigrateError {
    /// Create a Source error for a failed page fetch.
    pub fn source(offset: u64, message: impl Into<String>) -> Self {
        MigrateError::Source {
            offset,
            message: message.into(),
        }
    }

    /// Create a Destination error for a failed record write.
    pub fn destination(message: impl Into<String>) -> Self {
        MigrateError::Destination(message.into())
    }
}

/// Result type alias for migration operations.
pub type Result<T> = std::result::Result<T, MigrateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_error_display() {
        let err = MigrateError::source(2000, "connection reset");
        assert_eq!(
            err.to_string(),
            "Source fetch failed at offset 2000: connection reset"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: MigrateError = io.into();
        assert!(matches!(err, MigrateError::Io(_)));
    }
}

//! Configuration validation.

use super::Config;
use crate::error::{MigrateError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.source.dsn.is_empty() {
        return Err(MigrateError::Config("source.dsn is required".into()));
    }
    if config.destination.dsn.is_empty() {
        return Err(MigrateError::Config("destination.dsn is required".into()));
    }

    // Writing a table back onto itself corrupts the pagination ordering
    // mid-run and can loop forever.
    if config.source.dsn == config.destination.dsn {
        return Err(MigrateError::Config(
            "source and destination cannot be the same store".into(),
        ));
    }

    // Migration config validation - only check if explicitly set
    if let Some(0) = config.migration.workers {
        return Err(MigrateError::Config(
            "migration.workers must be at least 1".into(),
        ));
    }
    if let Some(0) = config.migration.batch_size {
        return Err(MigrateError::Config(
            "migration.batch_size must be at least 1".into(),
        ));
    }

    if config.migration.checkpoint_path.as_os_str().is_empty() {
        return Err(MigrateError::Config(
            "migration.checkpoint_path is required".into(),
        ));
    }
    if config.migration.dead_letter_path.as_os_str().is_empty() {
        return Err(MigrateError::Config(
            "migration.dead_letter_path is required".into(),
        ));
    }

    Ok(())
}

//! In-memory destination keyed by record id.
//!
//! Demonstrates the keyed-upsert semantics the [`TargetWriter`] contract
//! requires and backs the test suite.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::TargetWriter;
use crate::error::Result;
use crate::record::Record;

/// Destination store over a `BTreeMap` keyed by record id.
///
/// Writes are upserts: a second write of the same id replaces the first,
/// so redelivered records do not accumulate.
#[derive(Default)]
pub struct MemoryTarget {
    rows: Mutex<BTreeMap<i64, Record>>,
}

impl MemoryTarget {
    /// Create an empty destination.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct records written.
    pub fn len(&self) -> usize {
        self.rows.lock().expect("target lock poisoned").len()
    }

    /// Whether no records have been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fetch a written record by id.
    pub fn get(&self, id: i64) -> Option<Record> {
        self.rows
            .lock()
            .expect("target lock poisoned")
            .get(&id)
            .cloned()
    }

    /// All written ids in ascending order.
    pub fn ids(&self) -> Vec<i64> {
        self.rows
            .lock()
            .expect("target lock poisoned")
            .keys()
            .copied()
            .collect()
    }
}

#[async_trait]
impl TargetWriter for MemoryTarget {
    async fn write(&self, record: &Record) -> Result<()> {
        self.rows
            .lock()
            .expect("target lock poisoned")
            .insert(record.id, record.clone());
        Ok(())
    }
}

//! In-memory source backed by a pre-loaded record list.
//!
//! Backs the test suite and lets embedders drive the engine from data that
//! is already in memory. Records are served in list order, so the list
//! index is the pagination key offset.

use async_trait::async_trait;

use super::SourceReader;
use crate::error::Result;
use crate::record::{Page, Record};

/// Source store over a fixed, ordered record list.
pub struct MemorySource {
    records: Vec<Record>,
}

impl MemorySource {
    /// Create a source serving `records` in the given order.
    pub fn new(records: Vec<Record>) -> Self {
        Self { records }
    }

    /// Total number of records the source holds.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the source holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SourceReader for MemorySource {
    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Page> {
        let start = (offset as usize).min(self.records.len());
        let end = start.saturating_add(limit).min(self.records.len());
        Ok(self.records[start..end].to_vec())
    }
}

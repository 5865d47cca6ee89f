//! Instrumented store doubles shared by the engine test suites.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::checkpoint::CheckpointStore;
use crate::deadletter::{DeadLetterEntry, DeadLetterSink};
use crate::error::{MigrateError, Result};
use crate::record::{Page, Record};
use crate::source::SourceReader;
use crate::target::{MemoryTarget, TargetWriter};

/// Records with ids 1..=n and per-id field values.
pub(crate) fn records(n: i64) -> Vec<Record> {
    (1..=n)
        .map(|id| Record::new(id, format!("a{id}"), format!("b{id}")))
        .collect()
}

/// Dead-letter sink collecting entries in memory, optionally failing
/// every append.
#[derive(Default)]
pub(crate) struct CollectingSink {
    entries: Mutex<Vec<DeadLetterEntry>>,
    fail_appends: bool,
}

impl CollectingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            fail_appends: true,
        }
    }

    pub(crate) fn entries(&self) -> Vec<DeadLetterEntry> {
        self.entries.lock().unwrap().clone()
    }
}

#[async_trait]
impl DeadLetterSink for CollectingSink {
    async fn record(&self, entry: &DeadLetterEntry) -> Result<()> {
        if self.fail_appends {
            return Err(MigrateError::DeadLetter("induced append failure".into()));
        }
        self.entries.lock().unwrap().push(entry.clone());
        Ok(())
    }
}

/// Destination failing writes for a fixed id set, delegating the rest.
pub(crate) struct FailingTarget {
    inner: MemoryTarget,
    fail_ids: HashSet<i64>,
}

impl FailingTarget {
    pub(crate) fn new(fail_ids: impl IntoIterator<Item = i64>) -> Self {
        Self {
            inner: MemoryTarget::new(),
            fail_ids: fail_ids.into_iter().collect(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }

    pub(crate) fn ids(&self) -> Vec<i64> {
        self.inner.ids()
    }
}

#[async_trait]
impl TargetWriter for FailingTarget {
    async fn write(&self, record: &Record) -> Result<()> {
        if self.fail_ids.contains(&record.id) {
            return Err(MigrateError::destination(format!(
                "induced write failure for record {}",
                record.id
            )));
        }
        self.inner.write(record).await
    }
}

/// In-memory checkpoint store, optionally failing every save.
#[derive(Default)]
pub(crate) struct MemoryCheckpoint {
    offset: Mutex<u64>,
    fail_saves: bool,
}

impl MemoryCheckpoint {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            offset: Mutex::new(0),
            fail_saves: true,
        }
    }

    pub(crate) fn value(&self) -> u64 {
        *self.offset.lock().unwrap()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpoint {
    async fn load(&self) -> Result<u64> {
        Ok(*self.offset.lock().unwrap())
    }

    async fn save(&self, offset: u64) -> Result<()> {
        if self.fail_saves {
            return Err(MigrateError::Checkpoint("induced save failure".into()));
        }
        *self.offset.lock().unwrap() = offset;
        Ok(())
    }

    fn backend_type(&self) -> &'static str {
        "memory"
    }
}

/// Source over a record list that logs every fetch offset and can be
/// scripted to fail once a given offset is reached.
pub(crate) struct ScriptedSource {
    records: Vec<Record>,
    offsets: Mutex<Vec<u64>>,
    fail_at: Option<u64>,
}

impl ScriptedSource {
    pub(crate) fn new(records: Vec<Record>) -> Self {
        Self {
            records,
            offsets: Mutex::new(Vec::new()),
            fail_at: None,
        }
    }

    pub(crate) fn failing_at(records: Vec<Record>, offset: u64) -> Self {
        Self {
            records,
            offsets: Mutex::new(Vec::new()),
            fail_at: Some(offset),
        }
    }

    /// Offsets of every fetch issued so far, in call order.
    pub(crate) fn fetched_offsets(&self) -> Vec<u64> {
        self.offsets.lock().unwrap().clone()
    }
}

#[async_trait]
impl SourceReader for ScriptedSource {
    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Page> {
        self.offsets.lock().unwrap().push(offset);
        if self.fail_at == Some(offset) {
            return Err(MigrateError::source(offset, "induced fetch failure"));
        }
        let start = (offset as usize).min(self.records.len());
        let end = start.saturating_add(limit).min(self.records.len());
        Ok(self.records[start..end].to_vec())
    }
}

//! Source store abstraction: paginated extraction.

mod memory;

pub use memory::MemorySource;

use async_trait::async_trait;

use crate::error::Result;
use crate::record::Page;

/// Read ordered pages of records from the source store.
///
/// Implementations wrap whatever driver talks to the actual store; the
/// engine only needs the one paginated-read operation.
///
/// # Pagination contract
///
/// `fetch_page` uses OFFSET/LIMIT semantics over the source's stable
/// pagination key (`ORDER BY <key> OFFSET <o> LIMIT <n>` or equivalent).
/// The source's ordering must not change between calls: concurrent writes
/// that reorder the key can cause records to be skipped or duplicated.
/// That stability is a caller responsibility; the engine does not enforce it.
#[async_trait]
pub trait SourceReader: Send + Sync {
    /// Fetch the next page of at most `limit` records starting at `offset`.
    ///
    /// Returns an empty page (no error) when the source is exhausted.
    /// Any error is fatal to the run: retrying a failed fetch could leave a
    /// gap in the pagination key, so the coordinator aborts instead.
    async fn fetch_page(&self, offset: u64, limit: usize) -> Result<Page>;
}

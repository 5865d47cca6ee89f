//! The unit of migration.

/// A single row read from the source store.
///
/// The field list is fixed: the engine copies an enumerated set of typed
/// columns, not an open-ended dynamic map. `id` is assigned by the source
/// and is totally ordered by the pagination key, so it doubles as the
/// idempotence key for destination upserts.
///
/// A record is immutable once read from the source; only
/// [`Transform::apply`](crate::transform::Transform::apply) mutates a copy
/// before it is handed to the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Unique, source-assigned identifier (pagination key).
    pub id: i64,

    /// First migrated column.
    pub field_a: String,

    /// Second migrated column.
    pub field_b: String,
}

impl Record {
    /// Create a record.
    pub fn new(id: i64, field_a: impl Into<String>, field_b: impl Into<String>) -> Self {
        Self {
            id,
            field_a: field_a.into(),
            field_b: field_b.into(),
        }
    }
}

/// One bounded batch of records returned by a single paginated fetch.
///
/// An empty page is the sentinel for "source exhausted".
pub type Page = Vec<Record>;

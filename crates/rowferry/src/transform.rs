//! Inclusion predicate and optional record mapping.

use crate::record::Record;

/// Decides whether a record is migrated and optionally reshapes it first.
///
/// Both methods run inline on the worker hot path, so implementations must
/// be pure and must not block: no IO, no locks, no awaiting.
///
/// Records rejected by [`accept`](Transform::accept) are dropped silently:
/// they count as neither success nor failure and are never dead-lettered.
pub trait Transform: Send + Sync {
    /// Whether `record` should be written to the destination.
    fn accept(&self, record: &Record) -> bool;

    /// Reshape an accepted record before it is written. Defaults to identity.
    fn apply(&self, record: Record) -> Record {
        record
    }
}

/// Adapter turning a pure predicate closure into a filter-only transform.
pub struct FilterFn<F>(pub F);

impl<F> Transform for FilterFn<F>
where
    F: Fn(&Record) -> bool + Send + Sync,
{
    fn accept(&self, record: &Record) -> bool {
        (self.0)(record)
    }
}

/// Migrates every record unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl Transform for AcceptAll {
    fn accept(&self, _record: &Record) -> bool {
        true
    }
}

/// Migrates only records whose `field_a` is non-empty.
///
/// Rows with a blank `field_a` are incomplete upstream and are excluded
/// from the destination rather than copied over.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireFieldA;

impl Transform for RequireFieldA {
    fn accept(&self, record: &Record) -> bool {
        !record.field_a.is_empty()
    }
}

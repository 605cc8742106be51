//! Write transactions and their pending state.

use crate::types::{CollectionId, RecordId};
use parking_lot::MutexGuard;
use std::collections::HashMap;
use std::fmt;

/// A unique-key registration for a record.
///
/// Keys are opaque bytes scoped to a logical field name; the store indexes
/// them per collection and rejects commits that would duplicate one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    /// Logical field name, used in conflict reporting.
    pub field: &'static str,
    /// Encoded key bytes.
    pub value: Vec<u8>,
}

impl UniqueKey {
    /// Creates a key over a plain value.
    #[must_use]
    pub fn new(field: &'static str, value: impl Into<Vec<u8>>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }

    /// Creates a key scoped by a prefix, for uniqueness within a parent
    /// record (e.g. a name unique per tenant).
    #[must_use]
    pub fn scoped(field: &'static str, scope: &[u8], value: &[u8]) -> Self {
        let mut bytes = Vec::with_capacity(scope.len() + 1 + value.len());
        bytes.extend_from_slice(scope);
        bytes.push(0);
        bytes.extend_from_slice(value);
        Self {
            field,
            value: bytes,
        }
    }
}

/// A buffered write awaiting commit.
#[derive(Debug, Clone)]
pub enum PendingWrite {
    /// Insert or replace a record.
    Put {
        /// Record payload bytes.
        payload: Vec<u8>,
        /// Unique keys the record claims after this write.
        unique_keys: Vec<UniqueKey>,
    },
    /// Delete a record.
    Delete,
}

/// An exclusive write transaction.
///
/// Holds the store's write lock for its whole lifetime - only one write
/// transaction exists at a time. All writes are buffered; nothing is visible
/// outside the transaction until [`MemoryStore::commit`] applies the buffer
/// as a unit. A live `WriteTransaction` is always active: committing and
/// aborting consume it, so writes after completion are unrepresentable.
///
/// [`MemoryStore::commit`]: crate::MemoryStore::commit
pub struct WriteTransaction<'a> {
    id: u64,
    writes: HashMap<(CollectionId, RecordId), PendingWrite>,
    _guard: MutexGuard<'a, ()>,
}

impl<'a> WriteTransaction<'a> {
    pub(crate) fn new(id: u64, guard: MutexGuard<'a, ()>) -> Self {
        Self {
            id,
            writes: HashMap::new(),
            _guard: guard,
        }
    }

    /// Returns the transaction ID.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Buffers an insert or replace of a record.
    ///
    /// `unique_keys` is the full set of keys the record claims after the
    /// write; keys it held before and no longer claims are released on
    /// commit.
    pub fn put(
        &mut self,
        collection: CollectionId,
        record: RecordId,
        payload: Vec<u8>,
        unique_keys: Vec<UniqueKey>,
    ) {
        self.writes.insert(
            (collection, record),
            PendingWrite::Put {
                payload,
                unique_keys,
            },
        );
    }

    /// Buffers a delete of a record.
    pub fn delete(&mut self, collection: CollectionId, record: RecordId) {
        self.writes
            .insert((collection, record), PendingWrite::Delete);
    }

    /// Returns the buffered write for a record, if any.
    #[must_use]
    pub fn pending(&self, collection: CollectionId, record: RecordId) -> Option<&PendingWrite> {
        self.writes.get(&(collection, record))
    }

    /// Iterates over all buffered writes.
    pub fn pending_writes(
        &self,
    ) -> impl Iterator<Item = (&(CollectionId, RecordId), &PendingWrite)> {
        self.writes.iter()
    }

    /// Returns the number of buffered writes.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.len()
    }
}

impl fmt::Debug for WriteTransaction<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteTransaction")
            .field("id", &self.id)
            .field("write_count", &self.write_count())
            .finish_non_exhaustive()
    }
}

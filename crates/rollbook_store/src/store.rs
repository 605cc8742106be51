//! The in-memory record store.

use crate::error::{StoreError, StoreResult};
use crate::transaction::{PendingWrite, UniqueKey, WriteTransaction};
use crate::types::{CollectionId, RecordId};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};

/// Committed store state. Records, the unique-key index, and the reverse
/// map of keys each record owns are kept under one lock so commits apply
/// to all three as a unit.
#[derive(Debug, Default)]
struct Shared {
    records: HashMap<(CollectionId, RecordId), Vec<u8>>,
    index: HashMap<CollectionId, HashMap<(&'static str, Vec<u8>), RecordId>>,
    owned_keys: HashMap<(CollectionId, RecordId), Vec<UniqueKey>>,
}

/// A transactional, in-memory record store.
///
/// Records are opaque byte payloads grouped into named collections. The
/// store provides:
///
/// - Committed reads (`get_latest`, `list`, `exists`, `count`)
/// - Single-writer transactions (`begin_write`, `commit`, `abort`)
/// - Pending-aware reads inside a transaction (`get`)
/// - The atomic conditional-update primitive (`update_if`)
/// - Unique-key enforcement, violations classified as
///   [`StoreError::UniqueConflict`]
///
/// ## Single-Writer Guarantee
///
/// `begin_write` acquires an exclusive lock that is held until the
/// transaction is committed or aborted. Two conditional updates against the
/// same record therefore never interleave: the second caller observes the
/// first caller's committed state. This is what makes `update_if` a true
/// compare-and-swap without any lock in the calling layer.
///
/// Beginning a second write transaction while the current thread still
/// holds one deadlocks; take one transaction per operation.
pub struct MemoryStore {
    collections: RwLock<Vec<String>>,
    state: RwLock<Shared>,
    write_lock: Mutex<()>,
    next_txn_id: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Creates a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Vec::new()),
            state: RwLock::new(Shared::default()),
            write_lock: Mutex::new(()),
            next_txn_id: AtomicU64::new(1),
        }
    }

    /// Returns the ID for a named collection, registering it on first use.
    pub fn collection(&self, name: &str) -> CollectionId {
        {
            let collections = self.collections.read();
            if let Some(pos) = collections.iter().position(|n| n == name) {
                return CollectionId::new(pos as u32);
            }
        }
        let mut collections = self.collections.write();
        // Re-check: another thread may have registered between the locks.
        if let Some(pos) = collections.iter().position(|n| n == name) {
            return CollectionId::new(pos as u32);
        }
        collections.push(name.to_string());
        CollectionId::new((collections.len() - 1) as u32)
    }

    /// Returns the registered name of a collection.
    #[must_use]
    pub fn collection_name(&self, collection: CollectionId) -> String {
        self.collections
            .read()
            .get(collection.as_u32() as usize)
            .cloned()
            .unwrap_or_else(|| collection.to_string())
    }

    /// Begins a new write transaction.
    ///
    /// Blocks until the exclusive write lock is available; the lock is held
    /// until the returned transaction is committed or aborted.
    pub fn begin_write(&self) -> WriteTransaction<'_> {
        let guard = self.write_lock.lock();
        let id = self.next_txn_id.fetch_add(1, Ordering::SeqCst);
        WriteTransaction::new(id, guard)
    }

    /// Gets a record within a transaction.
    ///
    /// Sees the transaction's own buffered writes before committed state.
    #[must_use]
    pub fn get(
        &self,
        txn: &WriteTransaction<'_>,
        collection: CollectionId,
        record: RecordId,
    ) -> Option<Vec<u8>> {
        match txn.pending(collection, record) {
            Some(PendingWrite::Put { payload, .. }) => Some(payload.clone()),
            Some(PendingWrite::Delete) => None,
            None => self.get_latest(collection, record),
        }
    }

    /// Gets the latest committed version of a record.
    #[must_use]
    pub fn get_latest(&self, collection: CollectionId, record: RecordId) -> Option<Vec<u8>> {
        self.state.read().records.get(&(collection, record)).cloned()
    }

    /// Checks whether a committed record exists.
    #[must_use]
    pub fn exists(&self, collection: CollectionId, record: RecordId) -> bool {
        self.state.read().records.contains_key(&(collection, record))
    }

    /// Returns all committed records in a collection, ordered by record ID.
    #[must_use]
    pub fn list(&self, collection: CollectionId) -> Vec<(RecordId, Vec<u8>)> {
        let state = self.state.read();
        let mut records: Vec<(RecordId, Vec<u8>)> = state
            .records
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .map(|((_, id), payload)| (*id, payload.clone()))
            .collect();
        records.sort_by_key(|(id, _)| *id);
        records
    }

    /// Returns the number of committed records in a collection.
    #[must_use]
    pub fn count(&self, collection: CollectionId) -> usize {
        self.state
            .read()
            .records
            .keys()
            .filter(|(c, _)| *c == collection)
            .count()
    }

    /// Atomically updates a record only if a predicate over its current
    /// state holds.
    ///
    /// Reads the record's current state (the transaction's buffered write
    /// first, committed state otherwise) and applies `f`:
    ///
    /// - `Ok(Some(new))` buffers the replacement and yields `Ok(true)`
    /// - `Ok(None)` (predicate refused) yields `Ok(false)` with no write
    /// - an absent record yields `Ok(false)` without invoking `f`
    ///
    /// The check and the write are a single indivisible step: the exclusive
    /// write lock is held for the transaction's whole lifetime, so no other
    /// writer can interleave between them. Unique keys the record owns are
    /// carried over unchanged.
    pub fn update_if<F>(
        &self,
        txn: &mut WriteTransaction<'_>,
        collection: CollectionId,
        record: RecordId,
        f: F,
    ) -> StoreResult<bool>
    where
        F: FnOnce(&[u8]) -> StoreResult<Option<Vec<u8>>>,
    {
        let current = match self.get(txn, collection, record) {
            Some(payload) => payload,
            None => return Ok(false),
        };

        let Some(new_payload) = f(&current)? else {
            return Ok(false);
        };

        let keys = match txn.pending(collection, record) {
            Some(PendingWrite::Put { unique_keys, .. }) => unique_keys.clone(),
            _ => self
                .state
                .read()
                .owned_keys
                .get(&(collection, record))
                .cloned()
                .unwrap_or_default(),
        };

        txn.put(collection, record, new_payload, keys);
        Ok(true)
    }

    /// Commits a transaction, applying all buffered writes as a unit.
    ///
    /// Unique keys are re-checked against committed state before anything
    /// is applied; on [`StoreError::UniqueConflict`] the whole transaction
    /// is discarded and committed state is untouched.
    pub fn commit(&self, txn: WriteTransaction<'_>) -> StoreResult<()> {
        let mut state = self.state.write();

        let written: HashSet<(CollectionId, RecordId)> =
            txn.pending_writes().map(|(key, _)| *key).collect();

        // Check phase: no key may end up claimed twice, and no claim may
        // collide with a key held by a record this transaction leaves alone.
        let mut claims: HashMap<(CollectionId, &'static str, &[u8]), RecordId> = HashMap::new();
        for ((collection, record), write) in txn.pending_writes() {
            let PendingWrite::Put { unique_keys, .. } = write else {
                continue;
            };
            for key in unique_keys {
                let claim = (*collection, key.field, key.value.as_slice());
                if let Some(prior) = claims.insert(claim, *record) {
                    if prior != *record {
                        return Err(StoreError::unique_conflict(
                            self.collection_name(*collection),
                            key.field,
                        ));
                    }
                }
                let owner = state
                    .index
                    .get(collection)
                    .and_then(|keys| keys.get(&(key.field, key.value.clone())));
                if let Some(owner) = owner {
                    if owner != record && !written.contains(&(*collection, *owner)) {
                        return Err(StoreError::unique_conflict(
                            self.collection_name(*collection),
                            key.field,
                        ));
                    }
                }
            }
        }

        // Apply phase: release every written record's old keys first, so a
        // key moving between records in one transaction is not clobbered.
        for (collection, record) in &written {
            if let Some(old_keys) = state.owned_keys.remove(&(*collection, *record)) {
                if let Some(keys) = state.index.get_mut(collection) {
                    for key in old_keys {
                        keys.remove(&(key.field, key.value));
                    }
                }
            }
        }

        for ((collection, record), write) in txn.pending_writes() {
            match write {
                PendingWrite::Put {
                    payload,
                    unique_keys,
                } => {
                    state.records.insert((*collection, *record), payload.clone());
                    if !unique_keys.is_empty() {
                        let keys = state.index.entry(*collection).or_default();
                        for key in unique_keys {
                            keys.insert((key.field, key.value.clone()), *record);
                        }
                        state
                            .owned_keys
                            .insert((*collection, *record), unique_keys.clone());
                    }
                }
                PendingWrite::Delete => {
                    state.records.remove(&(*collection, *record));
                }
            }
        }

        Ok(())
    }

    /// Aborts a transaction, discarding all buffered writes.
    ///
    /// Committed state is untouched; the write lock is released.
    pub fn abort(&self, txn: WriteTransaction<'_>) {
        drop(txn);
    }

    /// Executes a function within a write transaction.
    ///
    /// Commits on `Ok`, aborts on `Err`. The transaction is released on
    /// every exit path.
    pub fn write_transaction<F, T>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&mut WriteTransaction<'_>) -> StoreResult<T>,
    {
        let mut txn = self.begin_write();
        match f(&mut txn) {
            Ok(value) => {
                self.commit(txn)?;
                Ok(value)
            }
            Err(e) => {
                self.abort(txn);
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("collections", &self.collections.read().len())
            .field("records", &self.state.read().records.len())
            .finish_non_exhaustive()
    }
}

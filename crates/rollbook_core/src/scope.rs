//! Scoped transaction acquisition.

use crate::error::{EngineError, EngineResult};
use rollbook_store::{MemoryStore, StoreError, WriteTransaction};
use tracing::warn;

/// A write transaction with guaranteed release.
///
/// The scope owns the underlying [`WriteTransaction`] for exactly one engine
/// operation. [`commit`](Self::commit) consumes the scope and applies the
/// buffered writes; dropping an uncommitted scope - on early return, error
/// propagation, or panic unwind - aborts them. There is no exit path on
/// which the transaction (and with it the store's write lock) stays held.
pub struct TransactionScope<'a> {
    store: &'a MemoryStore,
    txn: Option<WriteTransaction<'a>>,
}

impl<'a> TransactionScope<'a> {
    /// Opens a scope, acquiring the store's exclusive write transaction.
    #[must_use]
    pub fn begin(store: &'a MemoryStore) -> Self {
        Self {
            store,
            txn: Some(store.begin_write()),
        }
    }

    /// Returns the transaction for issuing reads and writes.
    pub fn txn(&mut self) -> &mut WriteTransaction<'a> {
        match self.txn.as_mut() {
            Some(txn) => txn,
            None => unreachable!("scope outlives its transaction only during drop"),
        }
    }

    /// Commits the scope's transaction.
    ///
    /// Store failures are classified on the way out: duplicate-key
    /// violations become [`EngineError::UniqueConflict`] (an expected
    /// outcome), anything else is logged with its cause and surfaced as an
    /// opaque [`EngineError::Transaction`]. A failed commit applies nothing.
    pub fn commit(mut self) -> EngineResult<()> {
        let Some(txn) = self.txn.take() else {
            return Ok(());
        };
        self.store.commit(txn).map_err(|e| {
            if !matches!(e, StoreError::UniqueConflict { .. }) {
                warn!(error = %e, "transaction commit failed");
            }
            EngineError::from(e)
        })
    }
}

impl Drop for TransactionScope<'_> {
    fn drop(&mut self) {
        if let Some(txn) = self.txn.take() {
            self.store.abort(txn);
        }
    }
}

impl std::fmt::Debug for TransactionScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionScope")
            .field("committed", &self.txn.is_none())
            .finish()
    }
}

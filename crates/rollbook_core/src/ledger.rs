//! The capacity ledger: admission control over classroom occupancy.

use crate::codec;
use crate::error::EngineResult;
use crate::model::{collections, Classroom};
use rollbook_store::{CollectionId, MemoryStore, RecordId, WriteTransaction};
use std::sync::Arc;
use tracing::debug;

/// Guards classroom occupancy with atomic conditional updates.
///
/// The ledger is the only code that writes `occupancy`. Both operations are
/// single conditional updates at the storage layer - the occupancy counter
/// is never read and then written outside the primitive, so concurrent
/// callers are linearized by the store, not by any lock held here.
pub struct CapacityLedger {
    store: Arc<MemoryStore>,
    classrooms: CollectionId,
}

impl CapacityLedger {
    /// Creates a ledger over the store's classroom collection.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let classrooms = store.collection(collections::CLASSROOMS);
        Self { store, classrooms }
    }

    /// Attempts to reserve one seat in a classroom.
    ///
    /// Increments `occupancy` only if the classroom exists, belongs to
    /// `school_id`, and has a free slot. Returns whether the increment
    /// happened. This is the sole admission gate: with K free slots and N
    /// concurrent callers, exactly K observe `true`.
    ///
    /// Deliberately does not distinguish a missing or foreign classroom
    /// from a full one - callers wanting a precise error probe separately.
    pub fn try_reserve(
        &self,
        txn: &mut WriteTransaction<'_>,
        classroom_id: RecordId,
        school_id: RecordId,
    ) -> EngineResult<bool> {
        let reserved = self
            .store
            .update_if(txn, self.classrooms, classroom_id, |bytes| {
                let mut room: Classroom = codec::decode(bytes)?;
                if room.school_id != school_id || !room.has_free_slot() {
                    return Ok(None);
                }
                room.occupancy += 1;
                Ok(Some(codec::encode(&room)?))
            })?;

        if !reserved {
            debug!(classroom = %classroom_id, "seat reservation refused");
        }
        Ok(reserved)
    }

    /// Releases one seat in a classroom.
    ///
    /// Decrements `occupancy` only if it is above zero; an absent classroom
    /// or zero occupancy is a no-op, not an error. The guard is what keeps
    /// a double release from driving the counter negative.
    pub fn release(
        &self,
        txn: &mut WriteTransaction<'_>,
        classroom_id: RecordId,
    ) -> EngineResult<()> {
        let released = self
            .store
            .update_if(txn, self.classrooms, classroom_id, |bytes| {
                let mut room: Classroom = codec::decode(bytes)?;
                if room.occupancy == 0 {
                    return Ok(None);
                }
                room.occupancy -= 1;
                Ok(Some(codec::encode(&room)?))
            })?;

        if !released {
            debug!(classroom = %classroom_id, "seat release was a no-op");
        }
        Ok(())
    }
}

impl std::fmt::Debug for CapacityLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapacityLedger").finish_non_exhaustive()
    }
}

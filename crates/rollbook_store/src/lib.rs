//! # Rollbook Store
//!
//! Transactional record store for Rollbook.
//!
//! This crate provides the persistence layer the enrollment engine is built
//! on. Records are **opaque byte payloads** grouped into named collections;
//! the store does not interpret them. What it does own:
//!
//! - Per-record CRUD inside single-writer transactions
//! - An atomic conditional-update primitive ([`MemoryStore::update_if`])
//! - Unique-key indexes, with duplicate-key violations classified by the
//!   store itself (callers never inspect engine-specific error codes)
//! - All-or-nothing commit: pending writes are applied together or discarded
//!
//! ## Single-Writer Concurrency
//!
//! Only one write transaction exists at a time. [`MemoryStore::begin_write`]
//! acquires an exclusive lock held for the transaction's lifetime, which is
//! what linearizes concurrent conditional updates against the same record  - 
//! correct without any lock in the calling layer.
//!
//! ## Example
//!
//! ```rust
//! use rollbook_store::{MemoryStore, RecordId};
//!
//! let store = MemoryStore::new();
//! let books = store.collection("books");
//! let id = RecordId::new();
//!
//! store.write_transaction(|txn| {
//!     txn.put(books, id, vec![1, 2, 3], Vec::new());
//!     Ok(())
//! }).unwrap();
//!
//! assert_eq!(store.get_latest(books, id), Some(vec![1, 2, 3]));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod store;
mod transaction;
mod types;

pub use error::{StoreError, StoreResult};
pub use store::MemoryStore;
pub use transaction::{PendingWrite, UniqueKey, WriteTransaction};
pub use types::{CollectionId, RecordId};

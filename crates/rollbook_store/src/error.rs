//! Error types for store operations.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in the record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A unique-key constraint was violated.
    ///
    /// The store classifies duplicate-key failures itself so that callers
    /// can branch on this variant instead of inspecting backend-specific
    /// error codes.
    #[error("unique constraint violated on {collection}.{field}")]
    UniqueConflict {
        /// Name of the collection holding the index.
        collection: String,
        /// Logical field name the violated key was registered under.
        field: &'static str,
    },

    /// A stored payload could not be interpreted.
    #[error("record corrupted: {0}")]
    Corrupted(String),
}

impl StoreError {
    /// Creates a corrupted-record error.
    pub fn corrupted(message: impl Into<String>) -> Self {
        Self::Corrupted(message.into())
    }

    /// Creates a unique-conflict error.
    pub fn unique_conflict(collection: impl Into<String>, field: &'static str) -> Self {
        Self::UniqueConflict {
            collection: collection.into(),
            field,
        }
    }
}

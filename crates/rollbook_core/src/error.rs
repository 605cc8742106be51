//! Error types for the enrollment engine.

use rollbook_store::StoreError;
use std::fmt;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// A single failed field check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Name of the offending field.
    pub field: &'static str,
    /// Human-readable reason the check failed.
    pub reason: String,
}

impl FieldError {
    /// Creates a field error.
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

/// Errors surfaced by engine operations.
///
/// Every failure a caller can act on is a distinct variant; callers branch
/// on the variant, never on message text. `Validation` and `Unauthorized`
/// are raised before any transaction is opened. `CapacityExceeded` and
/// `UniqueConflict` are expected, user-facing outcomes. `Transaction` wraps
/// an opaque storage failure; its cause is logged where it is raised.
#[derive(Debug, Error)]
pub enum EngineError {
    /// One or more input fields failed validation.
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// The principal may not act on the targeted tenant.
    #[error("unauthorized: {reason}")]
    Unauthorized {
        /// What the principal attempted.
        reason: String,
    },

    /// The targeted record does not exist for the given tenant.
    #[error("{what} not found")]
    NotFound {
        /// Kind of record that was missing.
        what: &'static str,
    },

    /// A reservation was denied because the classroom is full.
    #[error("classroom {classroom} is at full capacity")]
    CapacityExceeded {
        /// The classroom that refused the reservation.
        classroom: rollbook_store::RecordId,
    },

    /// A duplicate-identity violation on record creation or update.
    #[error("duplicate value for {field}")]
    UniqueConflict {
        /// Logical field name of the violated constraint.
        field: &'static str,
    },

    /// An underlying storage failure; surfaced generically.
    #[error("transaction failed")]
    Transaction(#[source] StoreError),
}

impl EngineError {
    /// Creates an unauthorized error.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        Self::Unauthorized {
            reason: reason.into(),
        }
    }

    /// Creates a not-found error.
    pub fn not_found(what: &'static str) -> Self {
        Self::NotFound { what }
    }
}

impl From<StoreError> for EngineError {
    /// Classifies store failures: duplicate-key violations become the
    /// user-facing [`EngineError::UniqueConflict`], everything else is an
    /// opaque [`EngineError::Transaction`].
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::UniqueConflict { field, .. } => Self::UniqueConflict { field },
            other => Self::Transaction(other),
        }
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! # Rollbook Core
//!
//! Capacity-bounded enrollment engine.
//!
//! Rollbook keeps a bounded container record (a classroom) consistent with
//! the subject records (students) referencing it, under concurrent
//! requests. Occupancy never exceeds capacity, no seat release is lost, and
//! no failure leaves the two records partially updated.
//!
//! This crate provides:
//! - Domain records and their CBOR codec
//! - Input validation and principal/tenancy scoping
//! - [`CapacityLedger`]: atomic conditional occupancy updates
//! - [`TransactionScope`]: scoped transaction acquisition with guaranteed
//!   release on every exit path
//! - [`EnrollmentCoordinator`]: the enroll / transfer / withdraw operations
//! - [`Directory`]: school and classroom management
//!
//! ## Example
//!
//! ```rust
//! use rollbook_core::{
//!     ClassroomDraft, Directory, EnrollmentCoordinator, MemoryStore, Principal, RecordId,
//!     SchoolDraft, StudentDraft,
//! };
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let directory = Directory::new(Arc::clone(&store));
//! let coordinator = EnrollmentCoordinator::new(Arc::clone(&store));
//! let root = Principal::super_admin(RecordId::new());
//!
//! let school = directory.create_school(&root, SchoolDraft {
//!     name: "School 1".into(),
//!     address: "123 Fake St".into(),
//!     phone: "555-1234".into(),
//!     email: "s1@test.com".into(),
//! })?;
//! let room = directory.create_classroom(&root, ClassroomDraft {
//!     school_id: school.id,
//!     name: "Room A".into(),
//!     capacity: 30,
//! })?;
//!
//! let student = coordinator.enroll(&root, StudentDraft {
//!     school_id: school.id,
//!     first_name: "John".into(),
//!     last_name: "Doe".into(),
//!     age: 15,
//!     classroom_id: Some(room.id),
//! })?;
//! assert_eq!(student.classroom_id, Some(room.id));
//! # Ok::<(), rollbook_core::EngineError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod auth;
mod codec;
pub mod directory;
pub mod enrollment;
mod error;
pub mod ledger;
pub mod model;
pub mod scope;
pub mod validate;

pub use auth::{Principal, Role};
pub use directory::Directory;
pub use enrollment::{ClassroomIntent, EnrollmentCoordinator, TransferRequest};
pub use error::{EngineError, EngineResult, FieldError};
pub use ledger::CapacityLedger;
pub use model::{
    Classroom, ClassroomDraft, ClassroomPatch, School, SchoolDraft, SchoolPatch, Student,
    StudentDraft,
};
pub use scope::TransactionScope;

// Callers hold the store and ids; re-exported so the engine is usable from
// this crate alone.
pub use rollbook_store::{MemoryStore, RecordId};

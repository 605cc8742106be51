//! Domain records: schools, classrooms, students.

use rollbook_store::{RecordId, UniqueKey};
use serde::{Deserialize, Serialize};

/// Collection names used by the engine.
pub mod collections {
    /// Schools (tenant roots).
    pub const SCHOOLS: &str = "schools";
    /// Classrooms (capacity-bounded containers).
    pub const CLASSROOMS: &str = "classrooms";
    /// Students (enrollment subjects).
    pub const STUDENTS: &str = "students";
}

/// A school: the tenant boundary every other record is scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct School {
    /// Record identity.
    pub id: RecordId,
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Contact phone; unique across schools.
    pub phone: String,
    /// Contact email; unique across schools.
    pub email: String,
}

impl School {
    pub(crate) fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![
            UniqueKey::new("phone", self.phone.as_bytes().to_vec()),
            UniqueKey::new("email", self.email.as_bytes().to_vec()),
        ]
    }
}

/// Input for creating a school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchoolDraft {
    /// Display name.
    pub name: String,
    /// Postal address.
    pub address: String,
    /// Contact phone.
    pub phone: String,
    /// Contact email.
    pub email: String,
}

/// Partial update for a school; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchoolPatch {
    /// New display name.
    pub name: Option<String>,
    /// New postal address.
    pub address: Option<String>,
    /// New contact phone.
    pub phone: Option<String>,
    /// New contact email.
    pub email: Option<String>,
}

/// A classroom: a capacity-bounded container of students.
///
/// `occupancy` is maintained incrementally through reservations and
/// releases - it is never recomputed by counting students, and it is never
/// written by anything other than the capacity ledger. The invariant
/// `0 <= occupancy <= capacity` holds at all times, including after aborted
/// transactions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classroom {
    /// Record identity.
    pub id: RecordId,
    /// Owning school.
    pub school_id: RecordId,
    /// Display name; unique within the school.
    pub name: String,
    /// Business ceiling on occupancy. Immutable in spirit: it may only be
    /// raised, or lowered to no less than the current occupancy.
    pub capacity: u32,
    /// Number of students currently seated.
    pub occupancy: u32,
}

impl Classroom {
    /// Whether the classroom can admit one more student.
    #[must_use]
    pub fn has_free_slot(&self) -> bool {
        self.occupancy < self.capacity
    }

    pub(crate) fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::scoped(
            "name",
            self.school_id.as_bytes(),
            self.name.as_bytes(),
        )]
    }
}

/// Input for creating a classroom. Occupancy always starts at zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomDraft {
    /// Owning school.
    pub school_id: RecordId,
    /// Display name.
    pub name: String,
    /// Business ceiling on occupancy.
    pub capacity: u32,
}

/// Partial update for a classroom; `None` leaves a field unchanged.
///
/// Occupancy is deliberately absent: it is only reachable through the
/// capacity ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassroomPatch {
    /// New display name.
    pub name: Option<String>,
    /// New capacity; refused below the current occupancy.
    pub capacity: Option<u32>,
}

/// A student: the enrollment subject.
///
/// `classroom_id` is the weak reference to at most one classroom; the
/// classroom stores no back-reference, so membership is inferred only
/// through this field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    /// Record identity.
    pub id: RecordId,
    /// Owning school.
    pub school_id: RecordId,
    /// Human-facing admission number; unique within the school.
    pub admission_no: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Age in years.
    pub age: u8,
    /// The classroom this student is seated in, if any.
    pub classroom_id: Option<RecordId>,
}

impl Student {
    pub(crate) fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey::scoped(
            "admission_no",
            self.school_id.as_bytes(),
            self.admission_no.as_bytes(),
        )]
    }
}

/// Input for enrolling a student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentDraft {
    /// School the student enrolls into.
    pub school_id: RecordId,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Age in years.
    pub age: u8,
    /// Classroom to seat the student in, if any. Seating is admission
    /// controlled; enrollment without a classroom is unconditional.
    pub classroom_id: Option<RecordId>,
}

//! The enrollment coordinator: enroll, transfer, withdraw.

use crate::auth::Principal;
use crate::codec;
use crate::error::{EngineError, EngineResult};
use crate::ledger::CapacityLedger;
use crate::model::{collections, Classroom, Student, StudentDraft};
use crate::scope::TransactionScope;
use crate::validate;
use rand::Rng;
use rollbook_store::{CollectionId, MemoryStore, RecordId, WriteTransaction};
use std::sync::Arc;
use tracing::{debug, instrument};

/// What a transfer should do with the student's classroom reference.
///
/// The three intents are distinct on the wire and in behavior: leaving the
/// reference alone, clearing it, and pointing it at a classroom are
/// different requests, and only the last one is admission controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassroomIntent {
    /// Leave the classroom reference unchanged.
    Unchanged,
    /// Clear the classroom reference, releasing the seat. Never fails on
    /// capacity grounds.
    Detach,
    /// Seat the student in the given classroom.
    Attach(RecordId),
}

/// Input for transferring a student.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRequest {
    /// Move the student to this school; `None` keeps the current one.
    pub school_id: Option<RecordId>,
    /// What to do with the classroom reference.
    pub classroom: ClassroomIntent,
}

/// Orchestrates enrollment operations over the capacity ledger.
///
/// Each operation validates input and checks tenancy first, then runs
/// entirely inside one [`TransactionScope`]: conditional occupancy updates
/// and the student write commit together or not at all. A reservation made
/// by a transaction that later fails is discarded with the transaction  - 
/// rollback is the abort itself, not a compensating call.
pub struct EnrollmentCoordinator {
    store: Arc<MemoryStore>,
    ledger: CapacityLedger,
    classrooms: CollectionId,
    students: CollectionId,
}

impl EnrollmentCoordinator {
    /// Creates a coordinator over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let ledger = CapacityLedger::new(Arc::clone(&store));
        let classrooms = store.collection(collections::CLASSROOMS);
        let students = store.collection(collections::STUDENTS);
        Self {
            store,
            ledger,
            classrooms,
            students,
        }
    }

    /// Enrolls a new student.
    ///
    /// Without a classroom the creation is unconditional. With one, the
    /// seat is reserved first; the student record is only ever created
    /// together with a successful reservation. A refused reservation aborts
    /// the transaction and reports [`EngineError::NotFound`] for a missing
    /// or foreign classroom, [`EngineError::CapacityExceeded`] for a full
    /// one.
    #[instrument(skip_all, fields(school = %draft.school_id))]
    pub fn enroll(&self, principal: &Principal, draft: StudentDraft) -> EngineResult<Student> {
        validate::student_draft(&draft)?;
        principal.require_school(draft.school_id, "enroll a student")?;

        let mut scope = TransactionScope::begin(&self.store);

        if let Some(classroom_id) = draft.classroom_id {
            if !self
                .ledger
                .try_reserve(scope.txn(), classroom_id, draft.school_id)?
            {
                let refusal = self.admission_refusal(scope.txn(), classroom_id, draft.school_id);
                return Err(refusal);
            }
        }

        let student = Student {
            id: RecordId::new(),
            school_id: draft.school_id,
            admission_no: new_admission_no(),
            first_name: draft.first_name,
            last_name: draft.last_name,
            age: draft.age,
            classroom_id: draft.classroom_id,
        };
        scope.txn().put(
            self.students,
            student.id,
            codec::encode(&student)?,
            student.unique_keys(),
        );
        scope.commit()?;

        debug!(student = %student.id, admission_no = %student.admission_no, "student enrolled");
        Ok(student)
    }

    /// Transfers a student between schools and/or classrooms.
    ///
    /// When attaching to a new classroom the destination seat is reserved
    /// strictly before the source seat is released, so a refused
    /// reservation leaves the student seated exactly where they were.
    /// Attaching to the classroom the student is already in is an occupancy
    /// no-op. All paths run in a single transaction.
    #[instrument(skip_all, fields(student = %student_id))]
    pub fn transfer(
        &self,
        principal: &Principal,
        student_id: RecordId,
        request: TransferRequest,
    ) -> EngineResult<Student> {
        let current = self
            .student_latest(student_id)?
            .ok_or_else(|| EngineError::not_found("student"))?;
        principal.require_school(current.school_id, "transfer a student")?;
        if let Some(school_id) = request.school_id {
            principal.require_school(school_id, "transfer a student into a school")?;
        }

        let mut scope = TransactionScope::begin(&self.store);

        let Some(mut student) = self.student_in_txn(scope.txn(), student_id)? else {
            return Err(EngineError::not_found("student"));
        };
        let target_school = request.school_id.unwrap_or(student.school_id);

        match request.classroom {
            ClassroomIntent::Unchanged => {}
            ClassroomIntent::Attach(destination) if student.classroom_id == Some(destination) => {
                // Already seated there; re-running the reservation would
                // double count.
            }
            ClassroomIntent::Attach(destination) => {
                if !self
                    .ledger
                    .try_reserve(scope.txn(), destination, target_school)?
                {
                    let refusal =
                        self.admission_refusal(scope.txn(), destination, target_school);
                    return Err(refusal);
                }
                if let Some(previous) = student.classroom_id {
                    self.ledger.release(scope.txn(), previous)?;
                }
                student.classroom_id = Some(destination);
            }
            ClassroomIntent::Detach => {
                if let Some(previous) = student.classroom_id {
                    self.ledger.release(scope.txn(), previous)?;
                }
                student.classroom_id = None;
            }
        }

        student.school_id = target_school;
        scope.txn().put(
            self.students,
            student.id,
            codec::encode(&student)?,
            student.unique_keys(),
        );
        scope.commit()?;

        debug!(student = %student.id, "student transferred");
        Ok(student)
    }

    /// Withdraws a student.
    ///
    /// Releases the student's seat (if any) and deletes the record in the
    /// same transaction. Withdrawing an unknown student reports
    /// [`EngineError::NotFound`] and mutates nothing.
    #[instrument(skip_all, fields(student = %student_id))]
    pub fn withdraw(&self, principal: &Principal, student_id: RecordId) -> EngineResult<()> {
        let current = self
            .student_latest(student_id)?
            .ok_or_else(|| EngineError::not_found("student"))?;
        principal.require_school(current.school_id, "withdraw a student")?;

        let mut scope = TransactionScope::begin(&self.store);

        let Some(student) = self.student_in_txn(scope.txn(), student_id)? else {
            return Err(EngineError::not_found("student"));
        };
        if let Some(classroom_id) = student.classroom_id {
            self.ledger.release(scope.txn(), classroom_id)?;
        }
        scope.txn().delete(self.students, student_id);
        scope.commit()?;

        debug!(student = %student_id, "student withdrawn");
        Ok(())
    }

    /// Returns a student visible to the principal.
    pub fn student(&self, principal: &Principal, student_id: RecordId) -> EngineResult<Student> {
        let student = self
            .student_latest(student_id)?
            .ok_or_else(|| EngineError::not_found("student"))?;
        principal.require_school(student.school_id, "view a student")?;
        Ok(student)
    }

    /// Returns all students of a school.
    pub fn students(&self, principal: &Principal, school_id: RecordId) -> EngineResult<Vec<Student>> {
        principal.require_school(school_id, "list students")?;
        let mut students = Vec::new();
        for (_, bytes) in self.store.list(self.students) {
            let student: Student = codec::decode(&bytes)?;
            if student.school_id == school_id {
                students.push(student);
            }
        }
        Ok(students)
    }

    /// Produces the precise error for a refused reservation: one probe read
    /// inside the already-open transaction distinguishes a missing or
    /// foreign classroom from a full one.
    fn admission_refusal(
        &self,
        txn: &WriteTransaction<'_>,
        classroom_id: RecordId,
        school_id: RecordId,
    ) -> EngineError {
        match self.store.get(txn, self.classrooms, classroom_id) {
            None => EngineError::not_found("classroom"),
            Some(bytes) => match codec::decode::<Classroom>(&bytes) {
                Ok(room) if room.school_id == school_id => EngineError::CapacityExceeded {
                    classroom: classroom_id,
                },
                Ok(_) => EngineError::not_found("classroom"),
                Err(e) => EngineError::from(e),
            },
        }
    }

    fn student_latest(&self, student_id: RecordId) -> EngineResult<Option<Student>> {
        match self.store.get_latest(self.students, student_id) {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn student_in_txn(
        &self,
        txn: &WriteTransaction<'_>,
        student_id: RecordId,
    ) -> EngineResult<Option<Student>> {
        match self.store.get(txn, self.students, student_id) {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for EnrollmentCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrollmentCoordinator").finish_non_exhaustive()
    }
}

const ADMISSION_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Generates a human-facing admission number, `STU-` plus six characters
/// from an unambiguous alphabet.
fn new_admission_no() -> String {
    let mut rng = rand::thread_rng();
    let code: String = (0..6)
        .map(|_| ADMISSION_ALPHABET[rng.gen_range(0..ADMISSION_ALPHABET.len())] as char)
        .collect();
    format!("STU-{code}")
}

//! Integration tests for the enrollment engine.
//!
//! These exercise the full stack - directory, ledger, coordinator - over
//! one shared store, the way a calling service would.

use rollbook_core::{
    ClassroomDraft, ClassroomIntent, Directory, EngineError, EnrollmentCoordinator, MemoryStore,
    Principal, RecordId, SchoolDraft, StudentDraft, TransferRequest,
};
use std::sync::Arc;
use std::thread;

struct Harness {
    directory: Directory,
    coordinator: Arc<EnrollmentCoordinator>,
    root: Principal,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            directory: Directory::new(Arc::clone(&store)),
            coordinator: Arc::new(EnrollmentCoordinator::new(store)),
            root: Principal::super_admin(RecordId::new()),
        }
    }

    fn school(&self, tag: &str) -> RecordId {
        self.directory
            .create_school(
                &self.root,
                SchoolDraft {
                    name: format!("School {tag}"),
                    address: "123 Fake St".into(),
                    phone: format!("555-{tag}"),
                    email: format!("{tag}@test.com"),
                },
            )
            .unwrap()
            .id
    }

    fn classroom(&self, school_id: RecordId, name: &str, capacity: u32) -> RecordId {
        self.directory
            .create_classroom(
                &self.root,
                ClassroomDraft {
                    school_id,
                    name: name.into(),
                    capacity,
                },
            )
            .unwrap()
            .id
    }

    fn occupancy(&self, classroom_id: RecordId) -> u32 {
        self.directory
            .classroom(&self.root, classroom_id)
            .unwrap()
            .occupancy
    }

    fn draft(&self, school_id: RecordId, classroom_id: Option<RecordId>) -> StudentDraft {
        StudentDraft {
            school_id,
            first_name: "John".into(),
            last_name: "Doe".into(),
            age: 15,
            classroom_id,
        }
    }
}

fn attach(classroom: RecordId) -> TransferRequest {
    TransferRequest {
        school_id: None,
        classroom: ClassroomIntent::Attach(classroom),
    }
}

// Scenario A: capacity 1, two concurrent enrollments - one wins, one gets
// CapacityExceeded, final occupancy is 1.
#[test]
fn two_racers_one_seat() {
    let h = Harness::new();
    let school = h.school("1000");
    let room = h.classroom(school, "Small Room", 1);

    let mut handles = Vec::new();
    for _ in 0..2 {
        let coordinator = Arc::clone(&h.coordinator);
        let principal = h.root.clone();
        let draft = h.draft(school, Some(room));
        handles.push(thread::spawn(move || coordinator.enroll(&principal, draft)));
    }
    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_ok()).count();
    let refused = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::CapacityExceeded { .. })))
        .count();
    assert_eq!(winners, 1);
    assert_eq!(refused, 1);
    assert_eq!(h.occupancy(room), 1);
}

// With k free slots and m > k concurrent attempts, exactly k succeed and
// the container ends exactly full.
#[test]
fn concurrent_enrollment_admits_exactly_the_free_slots() {
    let h = Harness::new();
    let school = h.school("1001");
    let capacity = 5;
    let racers = 12;
    let room = h.classroom(school, "Room A", capacity);

    let mut handles = Vec::new();
    for _ in 0..racers {
        let coordinator = Arc::clone(&h.coordinator);
        let principal = h.root.clone();
        let draft = h.draft(school, Some(room));
        handles.push(thread::spawn(move || coordinator.enroll(&principal, draft)));
    }
    let results: Vec<_> = handles.into_iter().map(|t| t.join().unwrap()).collect();

    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, capacity as usize);
    for refused in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(refused, Err(EngineError::CapacityExceeded { .. })));
    }
    assert_eq!(h.occupancy(room), capacity);

    // Occupancy agrees with the students actually referencing the room.
    let seated = h
        .coordinator
        .students(&h.root, school)
        .unwrap()
        .into_iter()
        .filter(|s| s.classroom_id == Some(room))
        .count();
    assert_eq!(seated, capacity as usize);
}

// Scenario B: transfer into a full room fails and changes nothing anywhere.
#[test]
fn transfer_to_full_room_changes_nothing() {
    let h = Harness::new();
    let school = h.school("1002");
    let room_a = h.classroom(school, "Room A", 1);
    let room_b = h.classroom(school, "Room B", 1);

    let moving = h
        .coordinator
        .enroll(&h.root, h.draft(school, Some(room_a)))
        .unwrap();
    let blocker = h
        .coordinator
        .enroll(&h.root, h.draft(school, Some(room_b)))
        .unwrap();

    let result = h.coordinator.transfer(&h.root, moving.id, attach(room_b));
    assert!(matches!(result, Err(EngineError::CapacityExceeded { .. })));

    // Source, destination, and both students are exactly as they were.
    assert_eq!(h.occupancy(room_a), 1);
    assert_eq!(h.occupancy(room_b), 1);
    let unchanged = h.coordinator.student(&h.root, moving.id).unwrap();
    assert_eq!(unchanged.classroom_id, Some(room_a));
    let blocker_after = h.coordinator.student(&h.root, blocker.id).unwrap();
    assert_eq!(blocker_after.classroom_id, Some(room_b));
}

// Conservation: a successful transfer moves one seat, never creates or
// destroys one.
#[test]
fn transfer_conserves_total_occupancy() {
    let h = Harness::new();
    let school = h.school("1003");
    let room_a = h.classroom(school, "Room A", 2);
    let room_b = h.classroom(school, "Room B", 2);

    let student = h
        .coordinator
        .enroll(&h.root, h.draft(school, Some(room_a)))
        .unwrap();
    assert_eq!(h.occupancy(room_a) + h.occupancy(room_b), 1);

    let moved = h
        .coordinator
        .transfer(&h.root, student.id, attach(room_b))
        .unwrap();
    assert_eq!(moved.classroom_id, Some(room_b));
    assert_eq!(h.occupancy(room_a), 0);
    assert_eq!(h.occupancy(room_b), 1);
}

// Scenario C: withdrawal frees the seat and removes the student.
#[test]
fn withdraw_frees_the_seat() {
    let h = Harness::new();
    let school = h.school("1004");
    let room = h.classroom(school, "Room A", 1);

    let student = h
        .coordinator
        .enroll(&h.root, h.draft(school, Some(room)))
        .unwrap();
    assert_eq!(h.occupancy(room), 1);

    h.coordinator.withdraw(&h.root, student.id).unwrap();
    assert_eq!(h.occupancy(room), 0);
    assert!(matches!(
        h.coordinator.student(&h.root, student.id),
        Err(EngineError::NotFound { .. })
    ));

    // The freed seat is usable again.
    h.coordinator
        .enroll(&h.root, h.draft(school, Some(room)))
        .unwrap();
    assert_eq!(h.occupancy(room), 1);
}

// Scenario D: attaching an unseated student to a room with space.
#[test]
fn attach_unseated_student() {
    let h = Harness::new();
    let school = h.school("1005");
    let room = h.classroom(school, "Room A", 2);

    let student = h.coordinator.enroll(&h.root, h.draft(school, None)).unwrap();
    assert!(student.classroom_id.is_none());

    let seated = h
        .coordinator
        .transfer(&h.root, student.id, attach(room))
        .unwrap();
    assert_eq!(seated.classroom_id, Some(room));
    assert_eq!(h.occupancy(room), 1);
}

#[test]
fn idempotent_withdraw_of_unknown_student() {
    let h = Harness::new();
    let school = h.school("1006");
    let room = h.classroom(school, "Room A", 1);
    h.coordinator
        .enroll(&h.root, h.draft(school, Some(room)))
        .unwrap();

    let result = h.coordinator.withdraw(&h.root, RecordId::new());
    assert!(matches!(result, Err(EngineError::NotFound { .. })));
    assert_eq!(h.occupancy(room), 1);
}

#[test]
fn school_admin_is_fenced_into_their_school() {
    let h = Harness::new();
    let home = h.school("1007");
    let foreign = h.school("1008");
    let foreign_room = h.classroom(foreign, "Room A", 5);
    let admin = Principal::school_admin(RecordId::new(), home);

    // Enrolling into the foreign school is rejected before any write.
    assert!(matches!(
        h.coordinator.enroll(&admin, h.draft(foreign, None)),
        Err(EngineError::Unauthorized { .. })
    ));
    assert_eq!(h.occupancy(foreign_room), 0);

    // A foreign student is invisible and untouchable.
    let outsider = h
        .coordinator
        .enroll(&h.root, h.draft(foreign, Some(foreign_room)))
        .unwrap();
    assert!(matches!(
        h.coordinator.student(&admin, outsider.id),
        Err(EngineError::Unauthorized { .. })
    ));
    assert!(matches!(
        h.coordinator.withdraw(&admin, outsider.id),
        Err(EngineError::Unauthorized { .. })
    ));
    assert_eq!(h.occupancy(foreign_room), 1);
}

#[test]
fn super_admin_moves_student_across_schools() {
    let h = Harness::new();
    let old_school = h.school("1009");
    let new_school = h.school("1010");
    let new_room = h.classroom(new_school, "Room A", 1);

    let student = h
        .coordinator
        .enroll(&h.root, h.draft(old_school, None))
        .unwrap();

    let moved = h
        .coordinator
        .transfer(
            &h.root,
            student.id,
            TransferRequest {
                school_id: Some(new_school),
                classroom: ClassroomIntent::Attach(new_room),
            },
        )
        .unwrap();

    assert_eq!(moved.school_id, new_school);
    assert_eq!(moved.classroom_id, Some(new_room));
    assert_eq!(h.occupancy(new_room), 1);
}

// The reservation check runs against the destination's own school: pointing
// a transfer at a room of a different school is a NotFound, not a capacity
// problem.
#[test]
fn transfer_into_foreign_room_is_not_found() {
    let h = Harness::new();
    let school = h.school("1011");
    let other = h.school("1012");
    let other_room = h.classroom(other, "Room A", 5);

    let student = h.coordinator.enroll(&h.root, h.draft(school, None)).unwrap();
    let result = h.coordinator.transfer(&h.root, student.id, attach(other_room));

    assert!(matches!(result, Err(EngineError::NotFound { .. })));
    assert_eq!(h.occupancy(other_room), 0);
}

#[test]
fn detach_is_unconditional_even_when_room_is_gone() {
    let h = Harness::new();
    let school = h.school("1013");
    let room = h.classroom(school, "Room A", 1);

    let student = h
        .coordinator
        .enroll(&h.root, h.draft(school, Some(room)))
        .unwrap();
    h.directory.delete_classroom(&h.root, room).unwrap();

    // Releasing a seat of a deleted classroom is a no-op, not an error.
    let detached = h
        .coordinator
        .transfer(
            &h.root,
            student.id,
            TransferRequest {
                school_id: None,
                classroom: ClassroomIntent::Detach,
            },
        )
        .unwrap();
    assert!(detached.classroom_id.is_none());
}

#[test]
fn students_of_one_school_get_distinct_admission_numbers() {
    let h = Harness::new();
    let school = h.school("1014");

    let first = h.coordinator.enroll(&h.root, h.draft(school, None)).unwrap();
    let second = h.coordinator.enroll(&h.root, h.draft(school, None)).unwrap();
    assert_ne!(first.admission_no, second.admission_no);
}

#[test]
fn mixed_workload_keeps_every_counter_in_bounds() {
    let h = Harness::new();
    let school = h.school("1015");
    let capacity = 3;
    let room_a = h.classroom(school, "Room A", capacity);
    let room_b = h.classroom(school, "Room B", capacity);

    let mut handles = Vec::new();
    for worker in 0..8 {
        let coordinator = Arc::clone(&h.coordinator);
        let principal = h.root.clone();
        let draft = h.draft(school, Some(if worker % 2 == 0 { room_a } else { room_b }));
        let target = if worker % 2 == 0 { room_b } else { room_a };
        handles.push(thread::spawn(move || {
            if let Ok(student) = coordinator.enroll(&principal, draft) {
                let _ = coordinator.transfer(&principal, student.id, attach(target));
                if worker % 4 == 0 {
                    let _ = coordinator.withdraw(&principal, student.id);
                }
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }

    let occupancy_a = h.occupancy(room_a);
    let occupancy_b = h.occupancy(room_b);
    assert!(occupancy_a <= capacity);
    assert!(occupancy_b <= capacity);

    // Counters agree with actual membership after the dust settles.
    let students = h.coordinator.students(&h.root, school).unwrap();
    let seated_a = students
        .iter()
        .filter(|s| s.classroom_id == Some(room_a))
        .count() as u32;
    let seated_b = students
        .iter()
        .filter(|s| s.classroom_id == Some(room_b))
        .count() as u32;
    assert_eq!(occupancy_a, seated_a);
    assert_eq!(occupancy_b, seated_b);
}

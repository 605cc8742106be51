//! Declarative input validation.
//!
//! Every engine operation validates its input fields before any transaction
//! is opened: invalid input carries zero transactional cost, and a caller
//! gets the full list of failing fields, not just the first.

use crate::error::{EngineError, EngineResult, FieldError};
use crate::model::{ClassroomDraft, ClassroomPatch, SchoolDraft, SchoolPatch, StudentDraft};

/// Accumulator for field checks.
#[derive(Debug, Default)]
struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    fn new() -> Self {
        Self::default()
    }

    fn text(&mut self, field: &'static str, value: &str, min: usize, max: usize) {
        let len = value.chars().count();
        if len < min || len > max {
            self.errors.push(FieldError::new(
                field,
                format!("must be between {min} and {max} characters"),
            ));
        }
    }

    fn optional_text(&mut self, field: &'static str, value: Option<&str>, min: usize, max: usize) {
        if let Some(value) = value {
            self.text(field, value, min, max);
        }
    }

    fn range(&mut self, field: &'static str, value: u32, min: u32, max: u32) {
        if value < min || value > max {
            self.errors.push(FieldError::new(
                field,
                format!("must be between {min} and {max}"),
            ));
        }
    }

    fn email(&mut self, field: &'static str, value: &str) {
        let well_formed = match value.split_once('@') {
            Some((local, domain)) => !local.is_empty() && domain.contains('.'),
            None => false,
        };
        if !well_formed {
            self.errors
                .push(FieldError::new(field, "must be a valid email address"));
        }
    }

    fn finish(self) -> EngineResult<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Validation(self.errors))
        }
    }
}

/// Validates a student enrollment draft.
pub fn student_draft(draft: &StudentDraft) -> EngineResult<()> {
    let mut checks = Checks::new();
    checks.text("first_name", &draft.first_name, 2, 50);
    checks.text("last_name", &draft.last_name, 2, 50);
    checks.range("age", u32::from(draft.age), 1, 80);
    checks.finish()
}

/// Validates a school creation draft.
pub fn school_draft(draft: &SchoolDraft) -> EngineResult<()> {
    let mut checks = Checks::new();
    checks.text("name", &draft.name, 3, 100);
    checks.text("address", &draft.address, 5, 200);
    checks.text("phone", &draft.phone, 7, 15);
    checks.email("email", &draft.email);
    checks.finish()
}

/// Validates a school patch.
pub fn school_patch(patch: &SchoolPatch) -> EngineResult<()> {
    let mut checks = Checks::new();
    checks.optional_text("name", patch.name.as_deref(), 3, 100);
    checks.optional_text("address", patch.address.as_deref(), 5, 200);
    checks.optional_text("phone", patch.phone.as_deref(), 7, 15);
    if let Some(email) = patch.email.as_deref() {
        checks.email("email", email);
    }
    checks.finish()
}

/// Validates a classroom creation draft.
pub fn classroom_draft(draft: &ClassroomDraft) -> EngineResult<()> {
    let mut checks = Checks::new();
    checks.text("name", &draft.name, 2, 50);
    checks.range("capacity", draft.capacity, 1, 500);
    checks.finish()
}

/// Validates a classroom patch.
pub fn classroom_patch(patch: &ClassroomPatch) -> EngineResult<()> {
    let mut checks = Checks::new();
    checks.optional_text("name", patch.name.as_deref(), 2, 50);
    if let Some(capacity) = patch.capacity {
        checks.range("capacity", capacity, 1, 500);
    }
    checks.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rollbook_store::RecordId;

    fn draft() -> StudentDraft {
        StudentDraft {
            school_id: RecordId::new(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            age: 15,
            classroom_id: None,
        }
    }

    #[test]
    fn valid_student_draft_passes() {
        assert!(student_draft(&draft()).is_ok());
    }

    #[test]
    fn all_failures_are_reported_together() {
        let mut bad = draft();
        bad.first_name = "J".into();
        bad.age = 0;

        match student_draft(&bad) {
            Err(EngineError::Validation(errors)) => {
                let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
                assert_eq!(fields, vec!["first_name", "age"]);
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }

    #[test]
    fn length_bounds_count_characters_not_bytes() {
        let mut two_chars = draft();
        two_chars.first_name = "Æø".into();
        assert!(student_draft(&two_chars).is_ok());
    }

    #[test]
    fn capacity_bounds() {
        let mut d = ClassroomDraft {
            school_id: RecordId::new(),
            name: "Room A".into(),
            capacity: 0,
        };
        assert!(classroom_draft(&d).is_err());
        d.capacity = 501;
        assert!(classroom_draft(&d).is_err());
        d.capacity = 500;
        assert!(classroom_draft(&d).is_ok());
    }

    #[test]
    fn email_shape() {
        let mut d = SchoolDraft {
            name: "School 1".into(),
            address: "123 Fake St".into(),
            phone: "555-1234".into(),
            email: "not-an-email".into(),
        };
        assert!(school_draft(&d).is_err());
        d.email = "s1@test.com".into();
        assert!(school_draft(&d).is_ok());
    }

    #[test]
    fn empty_patch_is_valid() {
        assert!(school_patch(&SchoolPatch::default()).is_ok());
        assert!(classroom_patch(&ClassroomPatch::default()).is_ok());
    }
}

//! School and classroom management.
//!
//! Plain record CRUD with tenancy scoping - none of it touches occupancy,
//! which belongs exclusively to the capacity ledger. Identity collisions
//! (school phone/email, classroom name within a school) are enforced by the
//! store's unique indexes and surface as
//! [`EngineError::UniqueConflict`](crate::EngineError::UniqueConflict).

use crate::auth::Principal;
use crate::codec;
use crate::error::{EngineError, EngineResult, FieldError};
use crate::model::{
    collections, Classroom, ClassroomDraft, ClassroomPatch, School, SchoolDraft, SchoolPatch,
};
use crate::scope::TransactionScope;
use crate::validate;
use rollbook_store::{CollectionId, MemoryStore, RecordId};
use std::sync::Arc;
use tracing::debug;

/// Manages schools and classrooms.
pub struct Directory {
    store: Arc<MemoryStore>,
    schools: CollectionId,
    classrooms: CollectionId,
}

impl Directory {
    /// Creates a directory over the given store.
    #[must_use]
    pub fn new(store: Arc<MemoryStore>) -> Self {
        let schools = store.collection(collections::SCHOOLS);
        let classrooms = store.collection(collections::CLASSROOMS);
        Self {
            store,
            schools,
            classrooms,
        }
    }

    /// Creates a school. Super admin only.
    pub fn create_school(&self, principal: &Principal, draft: SchoolDraft) -> EngineResult<School> {
        validate::school_draft(&draft)?;
        principal.require_super_admin("create a school")?;

        let school = School {
            id: RecordId::new(),
            name: draft.name,
            address: draft.address,
            phone: draft.phone,
            email: draft.email,
        };

        let mut scope = TransactionScope::begin(&self.store);
        scope.txn().put(
            self.schools,
            school.id,
            codec::encode(&school)?,
            school.unique_keys(),
        );
        scope.commit()?;

        debug!(school = %school.id, "school created");
        Ok(school)
    }

    /// Returns a school visible to the principal.
    pub fn school(&self, principal: &Principal, school_id: RecordId) -> EngineResult<School> {
        let school = self
            .school_latest(school_id)?
            .ok_or_else(|| EngineError::not_found("school"))?;
        principal.require_school(school.id, "view a school")?;
        Ok(school)
    }

    /// Returns all schools. Super admin only.
    pub fn schools(&self, principal: &Principal) -> EngineResult<Vec<School>> {
        principal.require_super_admin("list schools")?;
        self.store
            .list(self.schools)
            .iter()
            .map(|(_, bytes)| Ok(codec::decode(bytes)?))
            .collect()
    }

    /// Applies a partial update to a school. Super admin only.
    pub fn update_school(
        &self,
        principal: &Principal,
        school_id: RecordId,
        patch: SchoolPatch,
    ) -> EngineResult<School> {
        validate::school_patch(&patch)?;
        principal.require_super_admin("update a school")?;

        let mut scope = TransactionScope::begin(&self.store);
        let Some(bytes) = self.store.get(scope.txn(), self.schools, school_id) else {
            return Err(EngineError::not_found("school"));
        };
        let mut school: School = codec::decode(&bytes)?;
        if let Some(name) = patch.name {
            school.name = name;
        }
        if let Some(address) = patch.address {
            school.address = address;
        }
        if let Some(phone) = patch.phone {
            school.phone = phone;
        }
        if let Some(email) = patch.email {
            school.email = email;
        }
        scope.txn().put(
            self.schools,
            school.id,
            codec::encode(&school)?,
            school.unique_keys(),
        );
        scope.commit()?;
        Ok(school)
    }

    /// Deletes a school. Super admin only.
    ///
    /// Classrooms and students of the school are not cascaded; protecting
    /// still-referenced records is outside this engine.
    pub fn delete_school(&self, principal: &Principal, school_id: RecordId) -> EngineResult<()> {
        principal.require_super_admin("delete a school")?;

        if !self.store.exists(self.schools, school_id) {
            return Err(EngineError::not_found("school"));
        }
        let mut scope = TransactionScope::begin(&self.store);
        scope.txn().delete(self.schools, school_id);
        scope.commit()?;

        debug!(school = %school_id, "school deleted");
        Ok(())
    }

    /// Creates a classroom in a school the principal may act for.
    ///
    /// Occupancy always starts at zero.
    pub fn create_classroom(
        &self,
        principal: &Principal,
        draft: ClassroomDraft,
    ) -> EngineResult<Classroom> {
        validate::classroom_draft(&draft)?;
        principal.require_school(draft.school_id, "create a classroom")?;
        if !self.store.exists(self.schools, draft.school_id) {
            return Err(EngineError::not_found("school"));
        }

        let classroom = Classroom {
            id: RecordId::new(),
            school_id: draft.school_id,
            name: draft.name,
            capacity: draft.capacity,
            occupancy: 0,
        };

        let mut scope = TransactionScope::begin(&self.store);
        scope.txn().put(
            self.classrooms,
            classroom.id,
            codec::encode(&classroom)?,
            classroom.unique_keys(),
        );
        scope.commit()?;

        debug!(classroom = %classroom.id, school = %classroom.school_id, "classroom created");
        Ok(classroom)
    }

    /// Returns a classroom visible to the principal.
    pub fn classroom(
        &self,
        principal: &Principal,
        classroom_id: RecordId,
    ) -> EngineResult<Classroom> {
        let classroom = self
            .classroom_latest(classroom_id)?
            .ok_or_else(|| EngineError::not_found("classroom"))?;
        principal.require_school(classroom.school_id, "view a classroom")?;
        Ok(classroom)
    }

    /// Returns all classrooms of a school.
    pub fn classrooms(
        &self,
        principal: &Principal,
        school_id: RecordId,
    ) -> EngineResult<Vec<Classroom>> {
        principal.require_school(school_id, "list classrooms")?;
        let mut classrooms = Vec::new();
        for (_, bytes) in self.store.list(self.classrooms) {
            let classroom: Classroom = codec::decode(&bytes)?;
            if classroom.school_id == school_id {
                classrooms.push(classroom);
            }
        }
        Ok(classrooms)
    }

    /// Applies a partial update to a classroom.
    ///
    /// Capacity may not drop below the current occupancy - that would break
    /// the occupancy invariant for every student already seated.
    pub fn update_classroom(
        &self,
        principal: &Principal,
        classroom_id: RecordId,
        patch: ClassroomPatch,
    ) -> EngineResult<Classroom> {
        validate::classroom_patch(&patch)?;

        let current = self
            .classroom_latest(classroom_id)?
            .ok_or_else(|| EngineError::not_found("classroom"))?;
        principal.require_school(current.school_id, "update a classroom")?;

        let mut scope = TransactionScope::begin(&self.store);
        let Some(bytes) = self.store.get(scope.txn(), self.classrooms, classroom_id) else {
            return Err(EngineError::not_found("classroom"));
        };
        let mut classroom: Classroom = codec::decode(&bytes)?;
        if let Some(name) = patch.name {
            classroom.name = name;
        }
        if let Some(capacity) = patch.capacity {
            if capacity < classroom.occupancy {
                return Err(EngineError::Validation(vec![FieldError::new(
                    "capacity",
                    format!(
                        "cannot be lower than the current occupancy of {}",
                        classroom.occupancy
                    ),
                )]));
            }
            classroom.capacity = capacity;
        }
        scope.txn().put(
            self.classrooms,
            classroom.id,
            codec::encode(&classroom)?,
            classroom.unique_keys(),
        );
        scope.commit()?;
        Ok(classroom)
    }

    /// Deletes a classroom.
    ///
    /// Seated students keep their (now dangling) reference; releasing a
    /// seat of a deleted classroom is a no-op by design.
    pub fn delete_classroom(
        &self,
        principal: &Principal,
        classroom_id: RecordId,
    ) -> EngineResult<()> {
        let current = self
            .classroom_latest(classroom_id)?
            .ok_or_else(|| EngineError::not_found("classroom"))?;
        principal.require_school(current.school_id, "delete a classroom")?;

        let mut scope = TransactionScope::begin(&self.store);
        scope.txn().delete(self.classrooms, classroom_id);
        scope.commit()?;

        debug!(classroom = %classroom_id, "classroom deleted");
        Ok(())
    }

    fn school_latest(&self, school_id: RecordId) -> EngineResult<Option<School>> {
        match self.store.get_latest(self.schools, school_id) {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }

    fn classroom_latest(&self, classroom_id: RecordId) -> EngineResult<Option<Classroom>> {
        match self.store.get_latest(self.classrooms, classroom_id) {
            Some(bytes) => Ok(Some(codec::decode(&bytes)?)),
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for Directory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Directory").finish_non_exhaustive()
    }
}

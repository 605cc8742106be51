//! Principals and tenancy scoping.
//!
//! Authentication itself is an external collaborator: a token service
//! verifies credentials and hands the engine an already-authenticated
//! [`Principal`]. What lives here is the tenancy decision - which schools a
//! principal may act on - checked before any transaction is opened.

use crate::error::{EngineError, EngineResult};
use rollbook_store::RecordId;
use serde::{Deserialize, Serialize};

/// Role carried by an authenticated principal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Unrestricted across all schools.
    SuperAdmin,
    /// Restricted to a single school.
    SchoolAdmin,
}

/// An authenticated principal, as produced by the external token service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity of the authenticated user.
    pub user_id: RecordId,
    /// The principal's role.
    pub role: Role,
    /// The school a school admin is scoped to; `None` for super admins.
    pub school_id: Option<RecordId>,
}

impl Principal {
    /// Creates an unrestricted principal.
    #[must_use]
    pub fn super_admin(user_id: RecordId) -> Self {
        Self {
            user_id,
            role: Role::SuperAdmin,
            school_id: None,
        }
    }

    /// Creates a principal scoped to one school.
    #[must_use]
    pub fn school_admin(user_id: RecordId, school_id: RecordId) -> Self {
        Self {
            user_id,
            role: Role::SchoolAdmin,
            school_id: Some(school_id),
        }
    }

    /// Whether this principal may act on records of the given school.
    #[must_use]
    pub fn can_act_for(&self, school_id: RecordId) -> bool {
        match self.role {
            Role::SuperAdmin => true,
            Role::SchoolAdmin => self.school_id == Some(school_id),
        }
    }

    /// Rejects cross-tenant access with [`EngineError::Unauthorized`].
    pub fn require_school(&self, school_id: RecordId, action: &str) -> EngineResult<()> {
        if self.can_act_for(school_id) {
            Ok(())
        } else {
            Err(EngineError::unauthorized(format!(
                "{action} outside the principal's school"
            )))
        }
    }

    /// Rejects anything but a super admin.
    pub fn require_super_admin(&self, action: &str) -> EngineResult<()> {
        if self.role == Role::SuperAdmin {
            Ok(())
        } else {
            Err(EngineError::unauthorized(format!(
                "{action} requires a super admin"
            )))
        }
    }
}

//! Scope: second hierarchy level, owned by one department.

use super::department::DepartmentId;
use super::{AuditFields, CreatorId};
use serde::{Deserialize, Serialize};

pub type ScopeId = i64;

pub const SCOPE_NAME_MAX_CHARS: usize = 250;

/// Scope record. Name is unique among non-deleted scopes of one department.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Zero until persisted.
    pub id: ScopeId,
    pub name: String,
    pub department_id: DepartmentId,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

/// Scope joined with its department name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeView {
    pub scope: Scope,
    pub department_name: String,
}

//! Department: root of the reference-data hierarchy.

use super::{AuditFields, CreatorId};
use serde::{Deserialize, Serialize};

pub type DepartmentId = i64;

pub const DEPARTMENT_NAME_MAX_CHARS: usize = 50;

/// Department record. Name is unique among non-deleted departments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Department {
    /// Zero until persisted.
    pub id: DepartmentId,
    pub name: String,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

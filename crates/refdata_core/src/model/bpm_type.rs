//! BPM process type referenced by main titles.

use super::{AuditFields, CreatorId};
use serde::{Deserialize, Serialize};

pub type BpmTypeId = i64;

pub const BPM_TYPE_NAME_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BpmType {
    /// Zero until persisted.
    pub id: BpmTypeId,
    pub name: String,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

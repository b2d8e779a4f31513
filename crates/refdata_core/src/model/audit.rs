//! Audit and BPM shadow fields embedded by value in every entity.
//!
//! # Invariants
//! - `sequence_tag`, `created_at_epoch_ms`, `correlation_id` and
//!   `created_at` are written once at creation.
//! - `created_at_epoch_ms == created_at.timestamp_millis()`.
//! - `is_deleted` never goes back to `false` once set.
//!
//! # See also
//! - `crate::shadow` for the stamping functions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFields {
    /// Fixed per entity type; identifies the record type to the BPM engine.
    pub sequence_tag: i32,
    /// Creation instant in Unix epoch milliseconds.
    pub created_at_epoch_ms: i64,
    /// Globally unique, never reused.
    pub correlation_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub is_deleted: bool,
}

impl AuditFields {
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }
}

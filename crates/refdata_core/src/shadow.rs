//! Shadow-field stamping for create, update and soft delete.
//!
//! # Responsibility
//! - Populate [`AuditFields`] the way the external BPM engine expects.
//! - Keep time and GUID sources injectable so stamping is deterministic
//!   under test.
//!
//! # Invariants
//! - Stamping functions only mutate the audit value they are given.
//! - `created_at_epoch_ms` and `created_at` come from the same instant.
//! - `stamp_on_update` never touches creation fields or `is_deleted`.

use crate::model::AuditFields;
use chrono::{DateTime, Utc};
use std::fmt::Debug;
use std::sync::Arc;
use uuid::Uuid;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh correlation GUIDs.
pub trait CorrelationIdSource: Send + Sync + Debug {
    fn next_id(&self) -> Uuid;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Random v4 GUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomCorrelationIds;

impl CorrelationIdSource for RandomCorrelationIds {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Builds the audit value of a record being created.
pub fn stamp_on_create(sequence_tag: i32, now: DateTime<Utc>, correlation_id: Uuid) -> AuditFields {
    AuditFields {
        sequence_tag,
        created_at_epoch_ms: now.timestamp_millis(),
        correlation_id,
        created_at: now,
        modified_at: now,
        is_deleted: false,
    }
}

pub fn stamp_on_update(audit: &mut AuditFields, now: DateTime<Utc>) {
    audit.modified_at = now;
}

pub fn stamp_on_soft_delete(audit: &mut AuditFields, now: DateTime<Utc>) {
    audit.is_deleted = true;
    audit.modified_at = now;
}

/// Converts a stored epoch-millisecond shadow value back to a UTC instant.
///
/// Returns `None` for non-positive or out-of-range values.
pub fn created_at_from_epoch_ms(epoch_ms: i64) -> Option<DateTime<Utc>> {
    if epoch_ms <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(epoch_ms)
}

/// Clock and GUID source bundle handed to every mutating service.
#[derive(Debug, Clone)]
pub struct ShadowSync {
    clock: Arc<dyn Clock>,
    ids: Arc<dyn CorrelationIdSource>,
}

impl Default for ShadowSync {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock), Arc::new(RandomCorrelationIds))
    }
}

impl ShadowSync {
    pub fn new(clock: Arc<dyn Clock>, ids: Arc<dyn CorrelationIdSource>) -> Self {
        Self { clock, ids }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Fresh audit value for a new record of the given tag.
    pub fn on_create(&self, sequence_tag: i32) -> AuditFields {
        stamp_on_create(sequence_tag, self.clock.now(), self.ids.next_id())
    }

    pub fn on_update(&self, audit: &mut AuditFields) {
        stamp_on_update(audit, self.clock.now());
    }

    pub fn on_soft_delete(&self, audit: &mut AuditFields) {
        stamp_on_soft_delete(audit, self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::{
        created_at_from_epoch_ms, stamp_on_create, stamp_on_soft_delete, stamp_on_update,
        ShadowSync,
    };
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn create_stamp_sets_every_shadow_field() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let id = Uuid::new_v4();
        let audit = stamp_on_create(10008, now, id);

        assert_eq!(audit.sequence_tag, 10008);
        assert_eq!(audit.correlation_id, id);
        assert_eq!(audit.created_at_epoch_ms, 1_700_000_000_123);
        assert_eq!(audit.created_at, now);
        assert_eq!(audit.modified_at, now);
        assert!(!audit.is_deleted);
        assert_eq!(created_at_from_epoch_ms(audit.created_at_epoch_ms), Some(now));
    }

    #[test]
    fn update_stamp_only_moves_modified_at() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut audit = stamp_on_create(10009, created, Uuid::new_v4());
        let before = audit.clone();

        let later = created + Duration::minutes(5);
        stamp_on_update(&mut audit, later);

        assert_eq!(audit.modified_at, later);
        assert_eq!(audit.created_at, before.created_at);
        assert_eq!(audit.created_at_epoch_ms, before.created_at_epoch_ms);
        assert_eq!(audit.correlation_id, before.correlation_id);
        assert!(!audit.is_deleted);
    }

    #[test]
    fn soft_delete_stamp_marks_deleted() {
        let created = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        let mut audit = stamp_on_create(10012, created, Uuid::new_v4());
        let later = created + Duration::seconds(1);
        stamp_on_soft_delete(&mut audit, later);

        assert!(audit.is_deleted);
        assert_eq!(audit.modified_at, later);
    }

    #[test]
    fn default_sync_issues_distinct_correlation_ids() {
        let sync = ShadowSync::default();
        let first = sync.on_create(10008);
        let second = sync.on_create(10008);
        assert_ne!(first.correlation_id, second.correlation_id);
    }

    #[test]
    fn epoch_conversion_rejects_non_positive_values() {
        assert_eq!(created_at_from_epoch_ms(0), None);
        assert_eq!(created_at_from_epoch_ms(-5), None);
    }
}

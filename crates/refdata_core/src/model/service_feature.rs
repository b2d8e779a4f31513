//! Service features and their association with main titles.
//!
//! # Responsibility
//! - Define the service feature catalogue record.
//! - Define the main title / service feature link and its activation
//!   state machine.
//!
//! # Invariants
//! - A non-null `code` is unique among non-deleted service features.
//! - At most one non-deleted link exists per (main title, service feature).
//! - `activated_at` is kept as history when a link is deactivated.

use super::main_title::MainTitleId;
use super::{AuditFields, CreatorId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type ServiceFeatureId = i64;
pub type LinkId = i64;

pub const SERVICE_FEATURE_NAME_MAX_CHARS: usize = 200;
pub const SERVICE_FEATURE_DESCRIPTION_MAX_CHARS: usize = 500;
pub const SERVICE_FEATURE_CODE_MAX_CHARS: usize = 50;
pub const SERVICE_FEATURE_ICON_MAX_CHARS: usize = 100;
pub const SERVICE_FEATURE_COLOR_MAX_CHARS: usize = 20;
pub const LINK_NOTES_MAX_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceFeature {
    /// Zero until persisted.
    pub id: ServiceFeatureId,
    pub name: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

/// Create/update payload for service features.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceFeatureInput {
    pub name: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

impl ServiceFeatureInput {
    /// Active feature with only a name; every optional field empty.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            code: None,
            icon: None,
            color: None,
            display_order: 0,
            is_active: true,
        }
    }
}

/// Non-deleted link state. A soft-deleted link has no state; the pair is
/// back to "no link" and may be assigned again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkState {
    Active,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTitleServiceFeature {
    /// Zero until persisted.
    pub id: LinkId,
    pub main_title_id: MainTitleId,
    pub service_feature_id: ServiceFeatureId,
    pub is_active: bool,
    pub display_order: i32,
    pub notes: Option<String>,
    pub activated_at: Option<DateTime<Utc>>,
    pub deactivated_at: Option<DateTime<Utc>>,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

impl MainTitleServiceFeature {
    pub fn state(&self) -> LinkState {
        if self.is_active {
            LinkState::Active
        } else {
            LinkState::Inactive
        }
    }

    /// Applies a requested activation flag.
    ///
    /// Returns `true` when the state changed. An unchanged flag leaves both
    /// timestamps untouched.
    pub fn set_active(&mut self, is_active: bool, now: DateTime<Utc>) -> bool {
        if self.is_active == is_active {
            return false;
        }
        self.is_active = is_active;
        if is_active {
            self.activated_at = Some(now);
            self.deactivated_at = None;
        } else {
            self.deactivated_at = Some(now);
        }
        true
    }
}

/// Assign payload. [`NewLink::new`] gives the defaults: active, order 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub main_title_id: MainTitleId,
    pub service_feature_id: ServiceFeatureId,
    pub is_active: bool,
    pub display_order: i32,
    pub notes: Option<String>,
}

impl NewLink {
    pub fn new(main_title_id: MainTitleId, service_feature_id: ServiceFeatureId) -> Self {
        Self {
            main_title_id,
            service_feature_id,
            is_active: true,
            display_order: 0,
            notes: None,
        }
    }
}

/// Update payload. `display_order: None` keeps the stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkChanges {
    pub is_active: bool,
    pub display_order: Option<i32>,
    pub notes: Option<String>,
}

/// Link joined with both endpoint names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkView {
    pub link: MainTitleServiceFeature,
    pub main_title_name: String,
    pub service_feature_name: String,
    pub service_feature_code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::{LinkState, MainTitleServiceFeature};
    use crate::model::AuditFields;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + seconds, 0).unwrap()
    }

    fn link(is_active: bool) -> MainTitleServiceFeature {
        MainTitleServiceFeature {
            id: 1,
            main_title_id: 1,
            service_feature_id: 1,
            is_active,
            display_order: 0,
            notes: None,
            activated_at: is_active.then(|| at(0)),
            deactivated_at: None,
            creator_id: "u-1".to_string(),
            audit: AuditFields {
                sequence_tag: 10014,
                created_at_epoch_ms: at(0).timestamp_millis(),
                correlation_id: Uuid::new_v4(),
                created_at: at(0),
                modified_at: at(0),
                is_deleted: false,
            },
        }
    }

    #[test]
    fn deactivation_keeps_activation_history() {
        let mut value = link(true);
        assert!(value.set_active(false, at(10)));
        assert_eq!(value.state(), LinkState::Inactive);
        assert_eq!(value.activated_at, Some(at(0)));
        assert_eq!(value.deactivated_at, Some(at(10)));
    }

    #[test]
    fn reactivation_clears_deactivation() {
        let mut value = link(true);
        value.set_active(false, at(10));
        assert!(value.set_active(true, at(20)));
        assert_eq!(value.activated_at, Some(at(20)));
        assert_eq!(value.deactivated_at, None);
    }

    #[test]
    fn unchanged_flag_does_not_touch_timestamps() {
        let mut value = link(false);
        assert!(!value.set_active(false, at(0) + Duration::hours(1)));
        assert_eq!(value.activated_at, None);
        assert_eq!(value.deactivated_at, None);
    }
}

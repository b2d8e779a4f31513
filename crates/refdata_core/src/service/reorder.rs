//! Bulk display-order updates.
//!
//! # Responsibility
//! - Apply a caller-supplied `(id, display_order)` list to main titles or
//!   service features in one unit of work.
//!
//! # Invariants
//! - The batch size is within `1..=reorder.max_items`.
//! - Ids are unique within a batch and orders are non-negative.
//! - Ids that are missing or soft-deleted are skipped, not rejected.
//! - A batch where every id is skipped fails with
//!   [`ServiceError::NothingToUpdate`] and writes nothing.

use super::integrity::{validate_range, validate_unique_ids};
use super::{log_outcome, ServiceError, ServiceResult};
use crate::config::CoreConfig;
use crate::model::kind::ReorderTarget;
use crate::repo::ReferenceStore;
use crate::shadow::ShadowSync;
use std::collections::HashSet;
use std::fmt::{Display, Formatter};

const MODULE: &str = "reorder";

/// Result of a bulk reorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReorderOutcome {
    pub updated: usize,
    /// Requested ids that were missing or soft-deleted.
    pub skipped: Vec<i64>,
}

impl Display for ReorderOutcome {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "updated={} skipped={}", self.updated, self.skipped.len())
    }
}

pub struct ReorderService<S> {
    store: S,
    shadow: ShadowSync,
    config: CoreConfig,
}

impl<S: ReferenceStore> ReorderService<S> {
    pub fn new(store: S, shadow: ShadowSync, config: CoreConfig) -> Self {
        Self {
            store,
            shadow,
            config,
        }
    }

    /// Sets `display_order` for each listed id of `target`.
    pub fn bulk_reorder(
        &self,
        target: ReorderTarget,
        items: &[(i64, i32)],
    ) -> ServiceResult<ReorderOutcome> {
        let result = self.validate_batch(items).and_then(|()| {
            let ids: Vec<i64> = items.iter().map(|(id, _)| *id).collect();
            self.store.unit_of_work(|store| -> ServiceResult<_> {
                let found: HashSet<i64> = store.find_active_ids(target, &ids)?.into_iter().collect();
                if found.is_empty() {
                    return Err(ServiceError::NothingToUpdate);
                }

                let (apply, skipped): (Vec<(i64, i32)>, Vec<(i64, i32)>) =
                    items.iter().copied().partition(|(id, _)| found.contains(id));
                let updated = store.apply_display_orders(target, &apply, self.shadow.now())?;
                Ok(ReorderOutcome {
                    updated,
                    skipped: skipped.into_iter().map(|(id, _)| id).collect(),
                })
            })
        });
        log_outcome(MODULE, target.event(), None, &result);
        result
    }

    fn validate_batch(&self, items: &[(i64, i32)]) -> ServiceResult<()> {
        let max_items = i64::try_from(self.config.reorder.max_items).unwrap_or(i64::MAX);
        let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
        validate_range("items", len, 1, max_items)?;
        validate_unique_ids(items.iter().map(|(id, _)| *id))?;
        for (_, order) in items {
            validate_range("display_order", i64::from(*order), 0, i64::from(i32::MAX))?;
        }
        Ok(())
    }
}

impl ReorderTarget {
    fn event(self) -> &'static str {
        match self {
            Self::MainTitles => "main_title_reorder",
            Self::ServiceFeatures => "service_feature_reorder",
        }
    }
}

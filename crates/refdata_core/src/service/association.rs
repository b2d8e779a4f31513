//! Main title / service feature assignment.
//!
//! # Responsibility
//! - Assign a service feature to a main title, toggle the link's activation
//!   and remove it again.
//!
//! # Invariants
//! - Both ends of a new link exist and are not soft-deleted.
//! - At most one non-deleted link exists per pair; removing a link frees
//!   the pair for a fresh assignment.
//! - Activation transitions stamp `activated_at`/`deactivated_at` only when
//!   the flag actually changes.
//!
//! # See also
//! - `crate::model::service_feature::MainTitleServiceFeature::set_active`

use super::integrity::{
    validate_link_unique, validate_optional_text_length, validate_parent_exists, validate_range,
    IntegrityViolation,
};
use super::lifecycle::unique_backstop;
use super::{log_outcome, ServiceError, ServiceResult};
use crate::config::CoreConfig;
use crate::identity::IdentityLookup;
use crate::model::service_feature::{
    LinkChanges, LinkId, MainTitleServiceFeature, NewLink, LINK_NOTES_MAX_CHARS,
};
use crate::model::{normalize_optional_text, EntityKind};
use crate::repo::ReferenceStore;
use crate::shadow::ShadowSync;

const MODULE: &str = "association";

pub struct AssociationService<S, I> {
    store: S,
    identity: I,
    shadow: ShadowSync,
    config: CoreConfig,
}

impl<S: ReferenceStore, I: IdentityLookup> AssociationService<S, I> {
    pub fn new(store: S, identity: I, shadow: ShadowSync, config: CoreConfig) -> Self {
        Self {
            store,
            identity,
            shadow,
            config,
        }
    }

    /// Links a service feature to a main title.
    pub fn assign(&self, session_token: &str, input: &NewLink) -> ServiceResult<LinkId> {
        let notes = normalize_optional_text(input.notes.as_deref());
        let result = self
            .identity
            .current_user(session_token)
            .map_err(ServiceError::from)
            .and_then(|creator_id| {
                self.store.unit_of_work(|store| -> ServiceResult<_> {
                    validate_parent_exists(store, EntityKind::MainTitle, input.main_title_id)?;
                    validate_parent_exists(
                        store,
                        EntityKind::ServiceFeature,
                        input.service_feature_id,
                    )?;
                    validate_link_unique(store, input.main_title_id, input.service_feature_id)?;
                    validate_link_fields(notes.as_deref(), input.display_order)?;

                    let tag = self
                        .config
                        .sequence_tags
                        .for_kind(EntityKind::MainTitleServiceFeature);
                    let audit = self.shadow.on_create(tag);
                    let link = MainTitleServiceFeature {
                        id: 0,
                        main_title_id: input.main_title_id,
                        service_feature_id: input.service_feature_id,
                        is_active: input.is_active,
                        display_order: input.display_order,
                        notes: notes.clone(),
                        activated_at: input.is_active.then_some(audit.created_at),
                        deactivated_at: None,
                        creator_id,
                        audit,
                    };
                    store.insert_link(&link).map_err(unique_backstop(
                        IntegrityViolation::DuplicateAssignment {
                            main_title_id: input.main_title_id,
                            service_feature_id: input.service_feature_id,
                        },
                    ))
                })
            });
        log_outcome(MODULE, "link_assign", None, &result);
        result
    }

    /// Applies activation, order and notes to a non-deleted link.
    pub fn update_link(&self, id: LinkId, changes: &LinkChanges) -> ServiceResult<bool> {
        let notes = normalize_optional_text(changes.notes.as_deref());
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut link) = store.find_link(id)? else {
                return Ok(false);
            };
            let display_order = changes.display_order.unwrap_or(link.display_order);
            validate_link_fields(notes.as_deref(), display_order)?;

            let now = self.shadow.now();
            link.set_active(changes.is_active, now);
            link.display_order = display_order;
            link.notes = notes.clone();
            self.shadow.on_update(&mut link.audit);
            store.update_link(&link)?;
            Ok(true)
        });
        log_outcome(MODULE, "link_update", Some(id), &result);
        result
    }

    /// Soft-deletes a link and records when it was deactivated.
    pub fn remove(&self, id: LinkId) -> ServiceResult<bool> {
        let result = self.store.unit_of_work(|store| -> ServiceResult<_> {
            let Some(mut link) = store.find_link(id)? else {
                return Ok(false);
            };
            link.deactivated_at = Some(self.shadow.now());
            self.shadow.on_soft_delete(&mut link.audit);
            store.update_link(&link)?;
            Ok(true)
        });
        log_outcome(MODULE, "link_remove", Some(id), &result);
        result
    }
}

fn validate_link_fields(notes: Option<&str>, display_order: i32) -> Result<(), IntegrityViolation> {
    validate_optional_text_length("notes", notes, LINK_NOTES_MAX_CHARS)?;
    validate_range("display_order", i64::from(display_order), 0, i64::from(i32::MAX))
}

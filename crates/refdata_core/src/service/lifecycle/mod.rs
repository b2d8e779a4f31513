//! Create, update and soft-delete use cases for every reference entity.
//!
//! # Responsibility
//! - Run integrity rules in a fixed order: parent existence, then
//!   uniqueness, then numeric and range checks.
//! - Stamp shadow fields and persist inside one unit of work.
//!
//! # Invariants
//! - The first failing rule short-circuits; nothing is written.
//! - `update_*`/`soft_delete_*` return `Ok(false)` when the target is absent
//!   or already soft-deleted.
//! - Soft delete does not cascade to children.
//! - A unique index violation from the store maps to the same rejection the
//!   matching integrity rule would have produced.
//!
//! # See also
//! - `crate::service::integrity`
//! - `crate::shadow`

mod catalog;
mod hierarchy;

use super::integrity::IntegrityViolation;
use super::{ServiceError, ServiceResult};
use crate::config::CoreConfig;
use crate::identity::IdentityLookup;
use crate::model::{CreatorId, EntityKind};
use crate::repo::{ReferenceStore, RepoError};
use crate::shadow::ShadowSync;

const MODULE: &str = "lifecycle";

/// Lifecycle facade over a reference store and an identity collaborator.
pub struct LifecycleService<S, I> {
    store: S,
    identity: I,
    shadow: ShadowSync,
    config: CoreConfig,
}

impl<S: ReferenceStore, I: IdentityLookup> LifecycleService<S, I> {
    pub fn new(store: S, identity: I, shadow: ShadowSync, config: CoreConfig) -> Self {
        Self {
            store,
            identity,
            shadow,
            config,
        }
    }

    fn sequence_tag(&self, kind: EntityKind) -> i32 {
        self.config.sequence_tags.for_kind(kind)
    }

    /// Resolved before the unit of work opens so no write lock is held
    /// across the identity call.
    fn resolve_creator(&self, session_token: &str) -> ServiceResult<CreatorId> {
        Ok(self.identity.current_user(session_token)?)
    }
}

/// Maps a store-level unique violation to `violation`; other failures pass
/// through as internal errors.
pub(crate) fn unique_backstop(violation: IntegrityViolation) -> impl FnOnce(RepoError) -> ServiceError {
    move |err| match err {
        RepoError::UniqueViolation(_) => ServiceError::Integrity(violation),
        other => ServiceError::Repo(other),
    }
}

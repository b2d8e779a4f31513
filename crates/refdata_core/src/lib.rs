//! Core domain logic for the reference-data hierarchy.
//! This crate is the single source of truth for hierarchy invariants.

pub mod config;
pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod shadow;

pub use config::{ConfigError, CoreConfig, NameMatchMode};
pub use db::{open_db, open_db_in_memory, DbError};
pub use identity::{IdentityError, IdentityLookup, StaticIdentityLookup};
pub use logging::{default_log_level, init_logging, init_logging_from_config, logging_status};
pub use model::kind::ReorderTarget;
pub use model::{AuditFields, EntityKind};
pub use repo::{ReferenceStore, RepoError, RepoResult, SqliteReferenceStore};
pub use service::association::AssociationService;
pub use service::integrity::IntegrityViolation;
pub use service::lifecycle::LifecycleService;
pub use service::paging::{Page, PageRequest};
pub use service::query::QueryService;
pub use service::reorder::{ReorderOutcome, ReorderService};
pub use service::{ServiceError, ServiceResult};
pub use shadow::ShadowSync;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}

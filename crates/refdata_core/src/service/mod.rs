//! Reference-data use-case services.
//!
//! # Responsibility
//! - Orchestrate integrity rules, shadow stamping and repository calls into
//!   the lifecycle, reorder, association and query use cases.
//! - Separate business rejections from internal failures.
//!
//! # Invariants
//! - Every mutating call runs its read-validate-write sequence inside one
//!   store unit of work.
//! - "Target not found" on update/delete is reported as `Ok(false)`, never
//!   as an error.

pub mod association;
pub mod integrity;
pub mod lifecycle;
pub mod paging;
pub mod query;
pub mod reorder;

use crate::identity::IdentityError;
use crate::repo::RepoError;
use integrity::IntegrityViolation;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by every reference-data service.
#[derive(Debug)]
pub enum ServiceError {
    /// Input broke an integrity rule. Retrying unchanged input fails again.
    Integrity(IntegrityViolation),
    /// Bulk operation matched no existing record.
    NothingToUpdate,
    /// Acting user could not be resolved.
    Identity(IdentityError),
    /// Persistence failure.
    Repo(RepoError),
}

impl ServiceError {
    /// `true` for caller-correctable rejections, `false` for internal
    /// failures.
    pub fn is_rejection(&self) -> bool {
        !matches!(self, Self::Repo(_))
    }

    /// Stable identifier for log lines.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Integrity(violation) => violation.code(),
            Self::NothingToUpdate => "nothing_to_update",
            Self::Identity(IdentityError::MissingSession) => "missing_session",
            Self::Identity(IdentityError::UserNotFound) => "user_not_found",
            Self::Identity(IdentityError::Unavailable(_)) => "identity_unavailable",
            Self::Repo(_) => "store_failed",
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integrity(err) => write!(f, "{err}"),
            Self::NothingToUpdate => write!(f, "no matching records to update"),
            Self::Identity(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Integrity(err) => Some(err),
            Self::NothingToUpdate => None,
            Self::Identity(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<IntegrityViolation> for ServiceError {
    fn from(value: IntegrityViolation) -> Self {
        Self::Integrity(value)
    }
}

impl From<IdentityError> for ServiceError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Emits one structured outcome line for a service call.
pub(crate) fn log_outcome<T: Display>(
    module: &'static str,
    event: &'static str,
    target_id: Option<i64>,
    result: &ServiceResult<T>,
) {
    let target = target_id.map_or_else(|| "none".to_string(), |id| id.to_string());
    match result {
        Ok(value) => info!(
            "event={event} module={module} status=ok target_id={target} result={value}"
        ),
        // Rejection text can echo names and codes, so only the code is logged.
        Err(err) if err.is_rejection() => warn!(
            "event={event} module={module} status=rejected target_id={target} error_code={}",
            err.code()
        ),
        Err(err) => error!(
            "event={event} module={module} status=error target_id={target} error_code={} error={err}",
            err.code()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{IntegrityViolation, ServiceError};
    use crate::identity::IdentityError;
    use crate::model::EntityKind;
    use crate::repo::RepoError;

    #[test]
    fn error_codes_do_not_echo_user_text() {
        let err = ServiceError::Integrity(IntegrityViolation::DuplicateName {
            kind: EntityKind::Department,
            name: "Secret Plans".to_string(),
        });
        assert!(err.to_string().contains("Secret Plans"));
        assert_eq!(err.code(), "duplicate_name");

        let err = ServiceError::Integrity(IntegrityViolation::DuplicateCode {
            code: "X-1".to_string(),
        });
        assert_eq!(err.code(), "duplicate_code");
    }

    #[test]
    fn codes_follow_rejection_split() {
        let missing = ServiceError::Identity(IdentityError::MissingSession);
        assert!(missing.is_rejection());
        assert_eq!(missing.code(), "missing_session");

        let store = ServiceError::Repo(RepoError::InvalidData("bad row".to_string()));
        assert!(!store.is_rejection());
        assert_eq!(store.code(), "store_failed");
        assert_eq!(ServiceError::NothingToUpdate.code(), "nothing_to_update");
    }
}

//! Integrity rules evaluated before every reference-data write.
//!
//! # Responsibility
//! - Decide parent existence, scoped name uniqueness, code and link
//!   uniqueness against the store.
//! - Decide amount and range validity without touching the store.
//!
//! # Invariants
//! - Rules never mutate state.
//! - Callers evaluate store-backed rules inside the same unit of work as
//!   the write that depends on them.
//! - Lengths are counted in characters, not bytes.

use super::{ServiceError, ServiceResult};
use crate::model::main_title::{amount_to_minor, MainTitleId};
use crate::model::service_feature::ServiceFeatureId;
use crate::model::EntityKind;
use crate::repo::{IntegrityLookup, NameScope};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Business-rule rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Referenced parent is missing or soft-deleted.
    ParentNotFound { kind: EntityKind, id: i64 },
    /// A non-deleted sibling already has this name.
    DuplicateName { kind: EntityKind, name: String },
    /// A non-deleted service feature already has this code.
    DuplicateCode { code: String },
    /// A non-deleted link already exists for the pair.
    DuplicateAssignment {
        main_title_id: MainTitleId,
        service_feature_id: ServiceFeatureId,
    },
    /// Same id listed twice in one reorder batch.
    DuplicateReorderItem { id: i64 },
    /// Amount is negative.
    InvalidAmount { amount: Decimal },
    /// Amount has more than two decimal places or too many digits.
    AmountPrecision { amount: Decimal },
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },
}

impl IntegrityViolation {
    /// Stable identifier for log lines; carries no user-supplied text.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ParentNotFound { .. } => "parent_not_found",
            Self::DuplicateName { .. } => "duplicate_name",
            Self::DuplicateCode { .. } => "duplicate_code",
            Self::DuplicateAssignment { .. } => "duplicate_assignment",
            Self::DuplicateReorderItem { .. } => "duplicate_reorder_item",
            Self::InvalidAmount { .. } => "invalid_amount",
            Self::AmountPrecision { .. } => "amount_precision",
            Self::OutOfRange { .. } => "out_of_range",
        }
    }
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ParentNotFound { kind, id } => write!(f, "{kind} {id} does not exist"),
            Self::DuplicateName { kind, name } => {
                write!(f, "a {kind} named `{name}` already exists")
            }
            Self::DuplicateCode { code } => {
                write!(f, "a service feature with code `{code}` already exists")
            }
            Self::DuplicateAssignment {
                main_title_id,
                service_feature_id,
            } => write!(
                f,
                "service feature {service_feature_id} is already assigned to main title {main_title_id}"
            ),
            Self::DuplicateReorderItem { id } => {
                write!(f, "id {id} appears more than once in the reorder list")
            }
            Self::InvalidAmount { amount } => write!(f, "amount {amount} must not be negative"),
            Self::AmountPrecision { amount } => write!(
                f,
                "amount {amount} must have at most 16 integer digits and 2 decimal places"
            ),
            Self::OutOfRange {
                field,
                min,
                max,
                actual,
            } => write!(f, "{field} must be within {min}..={max}, got {actual}"),
        }
    }
}

impl Error for IntegrityViolation {}

pub fn validate_parent_exists<L: IntegrityLookup + ?Sized>(
    lookup: &L,
    kind: EntityKind,
    id: i64,
) -> ServiceResult<()> {
    if lookup.is_active(kind, id)? {
        Ok(())
    } else {
        Err(IntegrityViolation::ParentNotFound { kind, id }.into())
    }
}

pub fn validate_scoped_name_unique<L: IntegrityLookup + ?Sized>(
    lookup: &L,
    kind: EntityKind,
    name: &str,
    scope: NameScope,
    exclude_id: Option<i64>,
) -> ServiceResult<()> {
    if lookup.name_in_use(kind, name, scope, exclude_id)? {
        return Err(IntegrityViolation::DuplicateName {
            kind,
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn validate_code_unique<L: IntegrityLookup + ?Sized>(
    lookup: &L,
    code: &str,
    exclude_id: Option<ServiceFeatureId>,
) -> ServiceResult<()> {
    if lookup.code_in_use(code, exclude_id)? {
        return Err(IntegrityViolation::DuplicateCode {
            code: code.to_string(),
        }
        .into());
    }
    Ok(())
}

pub fn validate_link_unique<L: IntegrityLookup + ?Sized>(
    lookup: &L,
    main_title_id: MainTitleId,
    service_feature_id: ServiceFeatureId,
) -> ServiceResult<()> {
    if lookup.active_link_exists(main_title_id, service_feature_id)? {
        return Err(ServiceError::Integrity(
            IntegrityViolation::DuplicateAssignment {
                main_title_id,
                service_feature_id,
            },
        ));
    }
    Ok(())
}

pub fn validate_non_negative(amount: Decimal) -> Result<(), IntegrityViolation> {
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(IntegrityViolation::InvalidAmount { amount });
    }
    Ok(())
}

pub fn validate_amount_precision(amount: Decimal) -> Result<(), IntegrityViolation> {
    match amount_to_minor(amount) {
        Some(_) => Ok(()),
        None => Err(IntegrityViolation::AmountPrecision { amount }),
    }
}

pub fn validate_range(
    field: &'static str,
    value: i64,
    min: i64,
    max: i64,
) -> Result<(), IntegrityViolation> {
    if value < min || value > max {
        return Err(IntegrityViolation::OutOfRange {
            field,
            min,
            max,
            actual: value,
        });
    }
    Ok(())
}

/// Checks the character length of a required text value.
pub fn validate_text_length(
    field: &'static str,
    value: &str,
    min_chars: usize,
    max_chars: usize,
) -> Result<(), IntegrityViolation> {
    validate_range(
        field,
        char_count(value),
        to_i64(min_chars),
        to_i64(max_chars),
    )
}

/// Checks the character length of an optional text value; `None` passes.
pub fn validate_optional_text_length(
    field: &'static str,
    value: Option<&str>,
    max_chars: usize,
) -> Result<(), IntegrityViolation> {
    match value {
        Some(value) => validate_text_length(field, value, 0, max_chars),
        None => Ok(()),
    }
}

/// Rejects the first id that appears twice.
pub fn validate_unique_ids(ids: impl IntoIterator<Item = i64>) -> Result<(), IntegrityViolation> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(IntegrityViolation::DuplicateReorderItem { id });
        }
    }
    Ok(())
}

fn char_count(value: &str) -> i64 {
    to_i64(value.chars().count())
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::{
        validate_amount_precision, validate_non_negative, validate_optional_text_length,
        validate_range, validate_text_length, validate_unique_ids, IntegrityViolation,
    };
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn negative_amounts_are_rejected_and_zero_is_allowed() {
        assert!(validate_non_negative(Decimal::ZERO).is_ok());
        assert!(validate_non_negative(Decimal::from_str("-0.00").unwrap()).is_ok());
        assert_eq!(
            validate_non_negative(Decimal::from(-1)),
            Err(IntegrityViolation::InvalidAmount {
                amount: Decimal::from(-1)
            })
        );
    }

    #[test]
    fn amounts_with_three_places_fail_precision_check() {
        assert!(validate_amount_precision(Decimal::from_str("10.25").unwrap()).is_ok());
        assert!(matches!(
            validate_amount_precision(Decimal::from_str("10.255").unwrap()),
            Err(IntegrityViolation::AmountPrecision { .. })
        ));
    }

    #[test]
    fn range_reports_bounds_and_actual_value() {
        let err = validate_range("display_order", -1, 0, 10).unwrap_err();
        assert_eq!(
            err,
            IntegrityViolation::OutOfRange {
                field: "display_order",
                min: 0,
                max: 10,
                actual: -1
            }
        );
        assert!(err.to_string().contains("display_order"));
    }

    #[test]
    fn text_length_counts_characters() {
        assert!(validate_text_length("name", "åäö", 2, 3).is_ok());
        assert!(validate_text_length("name", "a", 2, 3).is_err());
        assert!(validate_optional_text_length("notes", None, 0).is_ok());
        assert!(validate_optional_text_length("notes", Some("ab"), 1).is_err());
    }

    #[test]
    fn duplicate_ids_are_reported() {
        assert!(validate_unique_ids([1, 2, 3]).is_ok());
        assert_eq!(
            validate_unique_ids([4, 5, 4]),
            Err(IntegrityViolation::DuplicateReorderItem { id: 4 })
        );
    }
}

//! Main title: priced catalogue entry owned by one scope.
//!
//! # Invariants
//! - `amount` is never negative and carries at most two decimal places.
//! - `amount` has at most [`AMOUNT_MAX_INTEGER_DIGITS`] integer digits, so
//!   its minor-unit form always fits an `i64`.

use super::bpm_type::BpmTypeId;
use super::department::DepartmentId;
use super::scope::ScopeId;
use super::{AuditFields, CreatorId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type MainTitleId = i64;

pub const MAIN_TITLE_NAME_MAX_CHARS: usize = 50;
pub const MAIN_TITLE_DESCRIPTION_MAX_CHARS: usize = 150;
pub const AMOUNT_SCALE: u32 = 2;
pub const AMOUNT_MAX_INTEGER_DIGITS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTitle {
    /// Zero until persisted.
    pub id: MainTitleId,
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub scope_id: ScopeId,
    pub display_order: i32,
    pub bpm_type_id: Option<BpmTypeId>,
    pub creator_id: CreatorId,
    pub audit: AuditFields,
}

/// Create payload. `display_order` defaults to 0.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewMainTitle {
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub scope_id: ScopeId,
    pub display_order: Option<i32>,
    pub bpm_type_id: Option<BpmTypeId>,
}

/// Update payload. The owning scope cannot change; `display_order: None`
/// keeps the stored order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct MainTitleChanges {
    pub name: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub display_order: Option<i32>,
    pub bpm_type_id: Option<BpmTypeId>,
}

/// Main title joined with its scope and department names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainTitleView {
    pub main_title: MainTitle,
    pub scope_name: String,
    pub department_id: DepartmentId,
    pub department_name: String,
}

/// Amount statistics of the non-deleted main titles of one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeAmountSummary {
    pub scope_id: ScopeId,
    pub scope_name: String,
    pub department_name: String,
    pub count: u64,
    pub total: Decimal,
    /// Rounded to [`AMOUNT_SCALE`] places.
    pub average: Decimal,
    pub min: Decimal,
    pub max: Decimal,
}

/// Largest storable amount: sixteen integer nines and two decimal nines.
pub fn max_amount() -> Decimal {
    Decimal::new(999_999_999_999_999_999, AMOUNT_SCALE)
}

/// Converts an amount to integer minor units (cents).
///
/// Returns `None` when the amount has more than two significant decimal
/// places or exceeds [`max_amount`] in magnitude.
pub fn amount_to_minor(amount: Decimal) -> Option<i64> {
    let normalized = amount.normalize();
    if normalized.scale() > AMOUNT_SCALE || normalized.abs() > max_amount() {
        return None;
    }
    let mut scaled = normalized;
    scaled.rescale(AMOUNT_SCALE);
    i64::try_from(scaled.mantissa()).ok()
}

/// Inverse of [`amount_to_minor`].
pub fn amount_from_minor(minor: i64) -> Decimal {
    Decimal::new(minor, AMOUNT_SCALE)
}

#[cfg(test)]
mod tests {
    use super::{amount_from_minor, amount_to_minor, max_amount};
    use rust_decimal::Decimal;
    use std::str::FromStr;

    #[test]
    fn amount_to_minor_accepts_two_places() {
        assert_eq!(amount_to_minor(Decimal::from_str("12.34").unwrap()), Some(1234));
        assert_eq!(amount_to_minor(Decimal::from_str("7").unwrap()), Some(700));
        assert_eq!(amount_to_minor(Decimal::from_str("1.500").unwrap()), Some(150));
        assert_eq!(amount_from_minor(1234), Decimal::from_str("12.34").unwrap());
    }

    #[test]
    fn amount_to_minor_rejects_extra_precision_and_overflow() {
        assert_eq!(amount_to_minor(Decimal::from_str("0.001").unwrap()), None);
        let too_big = max_amount() + Decimal::from_str("0.01").unwrap();
        assert_eq!(amount_to_minor(too_big), None);
        assert_eq!(
            amount_to_minor(max_amount()),
            Some(999_999_999_999_999_999)
        );
    }
}

//! Reference-data domain model.
//!
//! # Responsibility
//! - Define the entity records of the Department > Scope > MainTitle >
//!   ProductType hierarchy and the MainTitle/ServiceFeature association.
//! - Hold field limits and name normalization shared by every write path.
//!
//! # Invariants
//! - Every entity embeds one [`AuditFields`] value carrying soft-delete
//!   state, timestamps and BPM shadow fields.
//! - Identifiers are 64-bit integers assigned by the store.

pub mod audit;
pub mod bpm_type;
pub mod department;
pub mod kind;
pub mod main_title;
pub mod product_type;
pub mod scope;
pub mod service_feature;

pub use audit::AuditFields;
pub use kind::EntityKind;

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Opaque identifier of the acting user, as returned by identity lookup.
pub type CreatorId = String;

/// Shortest accepted name, in characters, for every named entity.
pub const NAME_MIN_CHARS: usize = 2;

/// Trims a user-supplied name and collapses inner whitespace runs.
pub fn normalize_name(raw: &str) -> String {
    WHITESPACE_RE.replace_all(raw.trim(), " ").into_owned()
}

/// Trims optional free text; blank input becomes `None`.
pub fn normalize_optional_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

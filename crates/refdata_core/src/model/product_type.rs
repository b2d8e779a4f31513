//! Product type, optionally attached to a main title.

use super::main_title::MainTitleId;
use super::AuditFields;
use serde::{Deserialize, Serialize};

pub type ProductTypeId = i64;

pub const PRODUCT_TYPE_NAME_MAX_CHARS: usize = 50;

/// Product type record. Name is unique among non-deleted product types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductType {
    /// Zero until persisted.
    pub id: ProductTypeId,
    pub name: String,
    pub main_title_id: Option<MainTitleId>,
    pub audit: AuditFields,
}

/// Create/update payload for product types.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductTypeInput {
    pub name: String,
    pub main_title_id: Option<MainTitleId>,
}

/// Product type joined with its main title name, when one is attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductTypeView {
    pub product_type: ProductType,
    pub main_title_name: Option<String>,
}

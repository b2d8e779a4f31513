//! Entity type discriminator shared by integrity lookups and shadow tagging.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Department,
    Scope,
    BpmType,
    MainTitle,
    ProductType,
    ServiceFeature,
    MainTitleServiceFeature,
}

impl EntityKind {
    /// Backing table name.
    pub fn table(self) -> &'static str {
        match self {
            Self::Department => "departments",
            Self::Scope => "scopes",
            Self::BpmType => "bpm_types",
            Self::MainTitle => "main_titles",
            Self::ProductType => "product_types",
            Self::ServiceFeature => "service_features",
            Self::MainTitleServiceFeature => "main_title_service_features",
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Department => "department",
            Self::Scope => "scope",
            Self::BpmType => "bpm type",
            Self::MainTitle => "main title",
            Self::ProductType => "product type",
            Self::ServiceFeature => "service feature",
            Self::MainTitleServiceFeature => "main title service feature",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Entity sets that carry a user-controlled `display_order`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReorderTarget {
    MainTitles,
    ServiceFeatures,
}

impl ReorderTarget {
    pub fn kind(self) -> EntityKind {
        match self {
            Self::MainTitles => EntityKind::MainTitle,
            Self::ServiceFeatures => EntityKind::ServiceFeature,
        }
    }
}

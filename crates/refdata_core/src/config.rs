//! Core configuration loading and validation.
//!
//! # Responsibility
//! - Describe every tunable of the reference-data core in one value.
//! - Load it from TOML and reject inconsistent settings before use.
//!
//! # Invariants
//! - Every field has a default; an empty document is a valid config.
//! - Configuration is passed explicitly to stores, services and
//!   collaborators. Nothing here is process-global.

use crate::model::EntityKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// Upper bound accepted for `reorder.max_items`.
///
/// Keeps a reorder batch well inside SQLite's bound parameter limit.
pub const REORDER_HARD_LIMIT: usize = 1_000;

/// Root configuration for the reference-data core.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CoreConfig {
    pub naming: NamingConfig,
    pub reorder: ReorderConfig,
    pub paging: PagingConfig,
    pub sequence_tags: SequenceTags,
    pub identity: IdentityConfig,
    pub logging: LoggingConfig,
}

/// How names are compared for uniqueness and searched by substring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameMatchMode {
    /// Byte-exact comparison.
    #[default]
    Exact,
    /// ASCII case folding (`COLLATE NOCASE` semantics).
    CaseInsensitive,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NamingConfig {
    pub match_mode: NameMatchMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReorderConfig {
    /// Largest accepted bulk reorder batch.
    pub max_items: usize,
}

impl Default for ReorderConfig {
    fn default() -> Self {
        Self { max_items: 100 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagingConfig {
    /// Page size used when the caller asks for a size below 1.
    pub default_page_size: u32,
    /// Requested page sizes are capped to this value.
    pub max_page_size: u32,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            default_page_size: 10,
            max_page_size: 100,
        }
    }
}

/// Fixed BPM sequence tag per entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SequenceTags {
    pub department: i32,
    pub scope: i32,
    pub bpm_type: i32,
    pub product_type: i32,
    pub main_title: i32,
    pub service_feature: i32,
    pub main_title_service_feature: i32,
}

impl Default for SequenceTags {
    fn default() -> Self {
        Self {
            department: 10008,
            scope: 10009,
            bpm_type: 10010,
            product_type: 10011,
            main_title: 10012,
            service_feature: 10013,
            main_title_service_feature: 10014,
        }
    }
}

impl SequenceTags {
    /// Returns the tag stamped on records of `kind`.
    pub fn for_kind(&self, kind: EntityKind) -> i32 {
        match kind {
            EntityKind::Department => self.department,
            EntityKind::Scope => self.scope,
            EntityKind::BpmType => self.bpm_type,
            EntityKind::ProductType => self.product_type,
            EntityKind::MainTitle => self.main_title,
            EntityKind::ServiceFeature => self.service_feature,
            EntityKind::MainTitleServiceFeature => self.main_title_service_feature,
        }
    }
}

/// Settings for the identity collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IdentityConfig {
    /// Cookie name the session token is presented under.
    pub session_cookie_name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            session_cookie_name: "refdata_session".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    /// `None` means the build-mode default level.
    pub level: Option<String>,
    /// Absolute directory for rolling log files. `None` disables file logging.
    pub dir: Option<String>,
}

/// Configuration loading/validation error.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    InvalidValue { field: &'static str, reason: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "failed to read config file: {err}"),
            Self::Parse(err) => write!(f, "failed to parse config TOML: {err}"),
            Self::InvalidValue { field, reason } => {
                write!(f, "invalid config value for {field}: {reason}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::Parse(err) => Some(err),
            Self::InvalidValue { .. } => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

impl CoreConfig {
    /// Reads, parses and validates a TOML config file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reorder.max_items == 0 || self.reorder.max_items > REORDER_HARD_LIMIT {
            return Err(ConfigError::InvalidValue {
                field: "reorder.max_items",
                reason: format!("must be within 1..={REORDER_HARD_LIMIT}"),
            });
        }
        if self.paging.default_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "paging.default_page_size",
                reason: "must be > 0".to_string(),
            });
        }
        if self.paging.max_page_size < self.paging.default_page_size {
            return Err(ConfigError::InvalidValue {
                field: "paging.max_page_size",
                reason: "must be >= paging.default_page_size".to_string(),
            });
        }

        let tags = [
            self.sequence_tags.department,
            self.sequence_tags.scope,
            self.sequence_tags.bpm_type,
            self.sequence_tags.product_type,
            self.sequence_tags.main_title,
            self.sequence_tags.service_feature,
            self.sequence_tags.main_title_service_feature,
        ];
        if tags.iter().any(|tag| *tag <= 0) {
            return Err(ConfigError::InvalidValue {
                field: "sequence_tags",
                reason: "tags must be positive".to_string(),
            });
        }
        if tags.iter().collect::<HashSet<_>>().len() != tags.len() {
            return Err(ConfigError::InvalidValue {
                field: "sequence_tags",
                reason: "each entity type needs a distinct tag".to_string(),
            });
        }

        let cookie = self.identity.session_cookie_name.trim();
        if cookie.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "identity.session_cookie_name",
                reason: "must not be empty".to_string(),
            });
        }
        if cookie.contains(['=', ';', ' ']) {
            return Err(ConfigError::InvalidValue {
                field: "identity.session_cookie_name",
                reason: "must not contain `=`, `;` or spaces".to_string(),
            });
        }

        if let Some(dir) = self.logging.dir.as_deref() {
            if !Path::new(dir.trim()).is_absolute() {
                return Err(ConfigError::InvalidValue {
                    field: "logging.dir",
                    reason: format!("must be an absolute path, got `{dir}`"),
                });
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, CoreConfig, NameMatchMode};
    use crate::model::EntityKind;

    #[test]
    fn empty_document_yields_defaults() {
        let config = CoreConfig::from_toml_str("").unwrap();
        assert_eq!(config, CoreConfig::default());
        assert_eq!(config.naming.match_mode, NameMatchMode::Exact);
        assert_eq!(config.reorder.max_items, 100);
        assert_eq!(config.sequence_tags.for_kind(EntityKind::Department), 10008);
        assert_eq!(config.sequence_tags.for_kind(EntityKind::MainTitle), 10012);
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CoreConfig::from_toml_str(
            r#"
            [naming]
            match_mode = "case_insensitive"

            [paging]
            max_page_size = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.naming.match_mode, NameMatchMode::CaseInsensitive);
        assert_eq!(config.paging.max_page_size, 50);
        assert_eq!(config.paging.default_page_size, 10);
    }

    #[test]
    fn duplicate_sequence_tags_are_rejected() {
        let err = CoreConfig::from_toml_str(
            r#"
            [sequence_tags]
            scope = 10008
            "#,
        )
        .unwrap_err();

        match err {
            ConfigError::InvalidValue { field, .. } => assert_eq!(field, "sequence_tags"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_keys_fail_to_parse() {
        let err = CoreConfig::from_toml_str("[reorder]\nmax = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn cookie_name_with_separator_is_rejected() {
        let err = CoreConfig::from_toml_str("[identity]\nsession_cookie_name = \"a=b\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("identity.session_cookie_name"));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        let err = CoreConfig::from_toml_str("[logging]\ndir = \"logs\"\n").unwrap_err();
        assert!(err.to_string().contains("logging.dir"));
    }
}

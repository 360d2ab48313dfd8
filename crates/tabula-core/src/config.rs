use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ident::validate_identifier;
use crate::CoreError;

pub const DEFAULT_PARENT_COLUMN: &str = "__parent__";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Replace whatever is at the path with a freshly stamped store.
    Create,
    /// Open an existing store and gate on its version.
    #[default]
    Open,
}

/// Everything needed to open a store handle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub path: PathBuf,
    #[serde(default)]
    pub mode: OpenMode,
    #[serde(default)]
    pub expected_version: Option<i64>,
    #[serde(default)]
    pub ignore_version: bool,
    /// Tables whose first column is not required to be unique.
    #[serde(default)]
    pub exempt_tables: BTreeSet<String>,
    #[serde(default = "default_parent_column")]
    pub parent_column: String,
}

fn default_parent_column() -> String {
    DEFAULT_PARENT_COLUMN.to_string()
}

impl StoreConfig {
    /// Configuration for creating a new store stamped with `version`.
    pub fn create(path: impl Into<PathBuf>, version: i64) -> Self {
        Self {
            path: path.into(),
            mode: OpenMode::Create,
            expected_version: Some(version),
            ignore_version: false,
            exempt_tables: BTreeSet::new(),
            parent_column: default_parent_column(),
        }
    }

    /// Configuration for opening an existing store that should be at `version`.
    pub fn open(path: impl Into<PathBuf>, version: i64) -> Self {
        Self { mode: OpenMode::Open, ..Self::create(path, version) }
    }

    /// Configuration for opening an existing store at whatever version it carries.
    pub fn open_any_version(path: impl Into<PathBuf>) -> Self {
        Self { expected_version: None, ignore_version: true, ..Self::open(path, 0) }
    }

    #[must_use]
    pub fn ignore_version(mut self, ignore: bool) -> Self {
        self.ignore_version = ignore;
        self
    }

    #[must_use]
    pub fn exempt_table(mut self, table: impl Into<String>) -> Self {
        self.exempt_tables.insert(table.into());
        self
    }

    #[must_use]
    pub fn parent_column(mut self, column: impl Into<String>) -> Self {
        self.parent_column = column.into();
        self
    }

    #[must_use]
    pub fn is_exempt(&self, table: &str) -> bool {
        self.exempt_tables.contains(table)
    }

    /// Parse and validate a JSON configuration document.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`] when the document does not parse or fails
    /// validation.
    pub fn from_json_str(raw: &str) -> Result<Self, CoreError> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|err| CoreError::InvalidConfig(format!("malformed configuration: {err}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the field combinations a handle relies on.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidConfig`] describing the first problem found.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.path.as_os_str().is_empty() {
            return Err(CoreError::InvalidConfig("path MUST NOT be empty".to_string()));
        }
        match self.mode {
            OpenMode::Create if self.expected_version.is_none() => {
                return Err(CoreError::InvalidConfig(
                    "a version MUST be provided when creating a store".to_string(),
                ));
            }
            OpenMode::Open if self.expected_version.is_none() && !self.ignore_version => {
                return Err(CoreError::InvalidConfig(
                    "an expected version MUST be provided unless ignore_version is set"
                        .to_string(),
                ));
            }
            _ => {}
        }
        validate_identifier(&self.parent_column).map_err(|_| {
            CoreError::InvalidConfig(format!("invalid parent column name: {}", self.parent_column))
        })?;
        for table in &self.exempt_tables {
            validate_identifier(table).map_err(|_| {
                CoreError::InvalidConfig(format!("invalid exempt table name: {table}"))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_defaults_fill_optional_fields() -> Result<(), CoreError> {
        let config =
            StoreConfig::from_json_str(r#"{"path": "profile.db", "expected_version": 5}"#)?;
        assert_eq!(config.mode, OpenMode::Open);
        assert_eq!(config.expected_version, Some(5));
        assert!(!config.ignore_version);
        assert!(config.exempt_tables.is_empty());
        assert_eq!(config.parent_column, DEFAULT_PARENT_COLUMN);
        Ok(())
    }

    #[test]
    fn json_accepts_mode_and_exemptions() -> Result<(), CoreError> {
        let config = StoreConfig::from_json_str(
            r#"{"path": "p.db", "mode": "create", "expected_version": 2,
                "exempt_tables": ["hits_log"], "parent_column": "parent"}"#,
        )?;
        assert_eq!(config.mode, OpenMode::Create);
        assert!(config.is_exempt("hits_log"));
        assert!(!config.is_exempt("genes"));
        assert_eq!(config.parent_column, "parent");
        Ok(())
    }

    #[test]
    fn create_without_version_is_rejected() {
        let config = StoreConfig { expected_version: None, ..StoreConfig::create("a.db", 1) };
        assert!(matches!(config.validate(), Err(CoreError::InvalidConfig(_))));
    }

    #[test]
    fn open_without_version_requires_ignore_flag() -> Result<(), CoreError> {
        let strict = StoreConfig { expected_version: None, ..StoreConfig::open("a.db", 1) };
        assert!(strict.validate().is_err());
        StoreConfig::open_any_version("a.db").validate()?;
        Ok(())
    }

    #[test]
    fn bad_names_and_malformed_json_are_rejected() {
        assert!(StoreConfig::open("a.db", 1).exempt_table("bad name").validate().is_err());
        assert!(StoreConfig::open("a.db", 1).parent_column("").validate().is_err());
        assert!(StoreConfig::from_json_str("{not json").is_err());
        assert!(StoreConfig::from_json_str(r#"{"path": ""}"#).is_err());
    }
}

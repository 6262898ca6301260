//! Record store configuration.
//!
//! # Responsibility
//! - Hold the per-store switches (auto-save, validation, capacity).
//! - Name the key-value entry a store persists under.
//!
//! # Invariants
//! - `max_items >= 1`.
//! - `storage_key` matches `[A-Za-z0-9_.:-]{1,128}`.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub const DEFAULT_MAX_ITEMS: usize = 1000;
pub const DEFAULT_STORAGE_KEY: &str = "records";

static STORAGE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_.:-]{1,128}$").expect("valid storage key regex"));

/// Configuration rejected by [`StoreConfig::validate`] or JSON loading.
#[derive(Debug)]
pub enum ConfigError {
    ZeroMaxItems,
    InvalidStorageKey(String),
    Parse(serde_json::Error),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroMaxItems => write!(f, "maxItems must be at least 1"),
            Self::InvalidStorageKey(key) => write!(
                f,
                "invalid storage key `{key}`; expected 1-128 chars of [A-Za-z0-9_.:-]"
            ),
            Self::Parse(err) => write!(f, "invalid store config: {err}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::ZeroMaxItems | Self::InvalidStorageKey(_) => None,
        }
    }
}

/// Per-store behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Persist after every successful mutation.
    pub auto_save: bool,
    /// Reject non-object items on insertion.
    pub validate_data: bool,
    /// Upper bound on the number of stored records.
    pub max_items: usize,
    /// Key-value entry used by `save`/`load`.
    pub storage_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            auto_save: true,
            validate_data: true,
            max_items: DEFAULT_MAX_ITEMS,
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
        }
    }
}

impl StoreConfig {
    /// Parses camelCase JSON; absent fields keep their defaults.
    ///
    /// # Errors
    /// - `ConfigError::Parse` on malformed JSON.
    /// - Any error from [`StoreConfig::validate`].
    pub fn from_json_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(input).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_items == 0 {
            return Err(ConfigError::ZeroMaxItems);
        }
        if !STORAGE_KEY_RE.is_match(&self.storage_key) {
            return Err(ConfigError::InvalidStorageKey(self.storage_key.clone()));
        }
        Ok(())
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    pub fn with_validate_data(mut self, validate_data: bool) -> Self {
        self.validate_data = validate_data;
        self
    }

    pub fn with_storage_key(mut self, storage_key: impl Into<String>) -> Self {
        self.storage_key = storage_key.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StoreConfig, DEFAULT_MAX_ITEMS, DEFAULT_STORAGE_KEY};

    #[test]
    fn default_config_matches_documented_values() {
        let config = StoreConfig::default();
        assert!(config.auto_save);
        assert!(config.validate_data);
        assert_eq!(config.max_items, DEFAULT_MAX_ITEMS);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        config.validate().unwrap();
    }

    #[test]
    fn from_json_str_fills_missing_fields_with_defaults() {
        let config = StoreConfig::from_json_str(r#"{"maxItems": 5, "autoSave": false}"#).unwrap();
        assert_eq!(config.max_items, 5);
        assert!(!config.auto_save);
        assert!(config.validate_data);
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
    }

    #[test]
    fn from_json_str_rejects_invalid_values() {
        assert!(matches!(
            StoreConfig::from_json_str(r#"{"maxItems": 0}"#),
            Err(ConfigError::ZeroMaxItems)
        ));
        assert!(matches!(
            StoreConfig::from_json_str(r#"{"storageKey": "has space"}"#),
            Err(ConfigError::InvalidStorageKey(_))
        ));
        assert!(matches!(
            StoreConfig::from_json_str("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn storage_key_length_is_bounded() {
        let too_long = StoreConfig::default().with_storage_key("k".repeat(129));
        assert!(too_long.validate().is_err());
        let max_len = StoreConfig::default().with_storage_key("k".repeat(128));
        max_len.validate().unwrap();
        let empty = StoreConfig::default().with_storage_key("");
        assert!(empty.validate().is_err());
    }
}

//! # Settings Snapshots
//!
//! Read-only key/value views of persisted settings. The runtime only queries
//! them for activation decisions and hands them to component constructors
//! unmodified.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ConfigError;

/// Setting keys the activation policy reads.
pub mod keys {
    /// Primary settings: fingerprint launcher feature flag.
    pub const FINGERPRINT_LAUNCHER_ENABLE: &str = "pref_fingerprint_launcher_enable";
    /// Primary settings: quick settings management feature flag.
    pub const QUICK_SETTINGS_ENABLE: &str = "pref_qs_management_enable";
    /// Tuner settings: tuner feature enabled.
    pub const TUNER_ENABLED: &str = "pref_tuner_enabled";
    /// Tuner settings: tuner feature locked.
    pub const TUNER_LOCKED: &str = "pref_tuner_locked";
}

/// A single stored value.
///
/// Integers are tried before floats, so `15` is an `Int` and `1.5` a `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    StrSet(Vec<String>),
}

/// Read-only snapshot of one settings scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SettingsSnapshot {
    values: BTreeMap<String, SettingValue>,
}

impl SettingsSnapshot {
    /// Create an empty snapshot. Every lookup returns its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert of a boolean.
    #[must_use]
    pub fn with_bool(mut self, key: &str, value: bool) -> Self {
        self.values.insert(key.to_string(), SettingValue::Bool(value));
        self
    }

    /// Builder-style insert of a string.
    #[must_use]
    pub fn with_string(mut self, key: &str, value: impl Into<String>) -> Self {
        self.values
            .insert(key.to_string(), SettingValue::Str(value.into()));
        self
    }

    /// Builder-style insert of an integer.
    #[must_use]
    pub fn with_int(mut self, key: &str, value: i64) -> Self {
        self.values.insert(key.to_string(), SettingValue::Int(value));
        self
    }

    /// Parse a snapshot from a flat JSON object.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Load a snapshot from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Look up a boolean, falling back to `default` when missing.
    ///
    /// A value of another type also yields `default`.
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.values.get(key) {
            Some(SettingValue::Bool(b)) => *b,
            Some(other) => {
                warn!(key, value = ?other, "Setting is not a boolean, using default");
                default
            }
            None => default,
        }
    }

    /// Look up a string.
    #[must_use]
    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            Some(SettingValue::Str(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Look up an integer, falling back to `default` when missing.
    #[must_use]
    pub fn get_int(&self, key: &str, default: i64) -> i64 {
        match self.values.get(key) {
            Some(SettingValue::Int(i)) => *i,
            _ => default,
        }
    }

    /// Look up a float, falling back to `default` when missing. Integer
    /// values are widened.
    #[must_use]
    pub fn get_float(&self, key: &str, default: f64) -> f64 {
        match self.values.get(key) {
            Some(SettingValue::Float(f)) => *f,
            Some(SettingValue::Int(i)) => *i as f64,
            _ => default,
        }
    }

    /// Look up a string set.
    #[must_use]
    pub fn get_string_set(&self, key: &str) -> Option<&[String]> {
        match self.values.get(key) {
            Some(SettingValue::StrSet(set)) => Some(set.as_slice()),
            _ => None,
        }
    }

    /// Check whether a key is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Number of stored keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the snapshot holds no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

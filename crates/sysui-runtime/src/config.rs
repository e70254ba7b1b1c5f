//! # Runtime Configuration
//!
//! Where the composition root finds its settings snapshots and what it
//! reports for device capabilities.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SYSUI_SETTINGS` | unset | Primary settings JSON file |
//! | `SYSUI_QH_SETTINGS` | unset | Quiet hours settings JSON file |
//! | `SYSUI_TUNER_SETTINGS` | unset | Tuner settings JSON file |
//! | `SYSUI_MULTI_SIM` | `false` | Device supports multiple active SIMs |
//! | `SYSUI_LOG_LEVEL` | `info` | Log level filter |

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::settings::SettingsSnapshot;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A settings file could not be read.
    #[error("Failed to read settings file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A settings file is not a flat JSON object.
    #[error("Failed to parse settings file {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Runtime configuration for the composition root.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Primary settings file. Absent means an empty snapshot.
    pub settings_path: Option<PathBuf>,
    /// Quiet hours settings file.
    pub quiet_hours_settings_path: Option<PathBuf>,
    /// Tuner settings file.
    pub tuner_settings_path: Option<PathBuf>,
    /// Device capability: multiple active SIMs.
    pub multi_sim: bool,
    /// Log level filter (trace, debug, info, warn, error).
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            settings_path: None,
            quiet_hours_settings_path: None,
            tuner_settings_path: None,
            multi_sim: false,
            log_level: "info".to_string(),
        }
    }
}

/// All snapshots `init` takes, loaded in one go.
#[derive(Debug, Clone, Default)]
pub struct LoadedSettings {
    pub settings: SettingsSnapshot,
    pub quiet_hours: Option<SettingsSnapshot>,
    pub tuner: Option<SettingsSnapshot>,
}

impl RuntimeConfig {
    /// Load from environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            settings_path: lookup("SYSUI_SETTINGS").map(PathBuf::from),
            quiet_hours_settings_path: lookup("SYSUI_QH_SETTINGS").map(PathBuf::from),
            tuner_settings_path: lookup("SYSUI_TUNER_SETTINGS").map(PathBuf::from),
            multi_sim: lookup("SYSUI_MULTI_SIM")
                .map_or(defaults.multi_sim, |val| {
                    val == "1" || val.eq_ignore_ascii_case("true")
                }),
            log_level: lookup("SYSUI_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Read every configured settings file.
    pub fn load_settings(&self) -> Result<LoadedSettings, ConfigError> {
        let settings = match &self.settings_path {
            Some(path) => load_logged("settings", path)?,
            None => SettingsSnapshot::new(),
        };
        let quiet_hours = self
            .quiet_hours_settings_path
            .as_deref()
            .map(|path| load_logged("quiet hours settings", path))
            .transpose()?;
        let tuner = self
            .tuner_settings_path
            .as_deref()
            .map(|path| load_logged("tuner settings", path))
            .transpose()?;

        Ok(LoadedSettings {
            settings,
            quiet_hours,
            tuner,
        })
    }
}

fn load_logged(scope: &str, path: &Path) -> Result<SettingsSnapshot, ConfigError> {
    let snapshot = SettingsSnapshot::load(path)?;
    info!(scope, path = %path.display(), keys = snapshot.len(), "Loaded settings");
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert!(config.settings_path.is_none());
        assert!(!config.multi_sim);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_from_lookup() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[
            ("SYSUI_SETTINGS", "/data/prefs.json"),
            ("SYSUI_MULTI_SIM", "TRUE"),
            ("SYSUI_LOG_LEVEL", "debug"),
        ]));

        assert_eq!(config.settings_path, Some(PathBuf::from("/data/prefs.json")));
        assert!(config.quiet_hours_settings_path.is_none());
        assert!(config.multi_sim);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_from_lookup_without_variables_keeps_defaults() {
        let config = RuntimeConfig::from_lookup(|_| None);
        let defaults = RuntimeConfig::default();

        assert_eq!(config.settings_path, defaults.settings_path);
        assert_eq!(config.tuner_settings_path, defaults.tuner_settings_path);
        assert_eq!(config.multi_sim, defaults.multi_sim);
        assert_eq!(config.log_level, defaults.log_level);
    }

    #[test]
    fn test_multi_sim_rejects_garbage() {
        let config = RuntimeConfig::from_lookup(lookup_from(&[("SYSUI_MULTI_SIM", "maybe")]));
        assert!(!config.multi_sim);
    }

    #[test]
    fn test_load_settings_without_files() {
        let loaded = RuntimeConfig::default().load_settings().unwrap();
        assert!(loaded.settings.is_empty());
        assert!(loaded.quiet_hours.is_none());
        assert!(loaded.tuner.is_none());
    }

    #[test]
    fn test_load_settings_from_files() {
        let mut prefs = tempfile::NamedTempFile::new().unwrap();
        write!(prefs, r#"{{"pref_qs_management_enable": true}}"#).unwrap();
        let mut tuner = tempfile::NamedTempFile::new().unwrap();
        write!(tuner, r#"{{"pref_tuner_enabled": true, "pref_tuner_locked": false}}"#).unwrap();

        let config = RuntimeConfig {
            settings_path: Some(prefs.path().to_path_buf()),
            tuner_settings_path: Some(tuner.path().to_path_buf()),
            ..RuntimeConfig::default()
        };
        let loaded = config.load_settings().unwrap();

        assert_eq!(loaded.settings.len(), 1);
        assert_eq!(loaded.tuner.map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_load_settings_propagates_errors() {
        let config = RuntimeConfig {
            tuner_settings_path: Some(PathBuf::from("/nonexistent/tuner.json")),
            ..RuntimeConfig::default()
        };
        assert!(matches!(config.load_settings(), Err(ConfigError::Io { .. })));
    }
}

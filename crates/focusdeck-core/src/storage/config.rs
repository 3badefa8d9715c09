//! TOML-based application configuration.
//!
//! Stores user preferences:
//! - Default preset applied when no timer record exists
//! - Notification behavior for the watch loop
//! - Task sync endpoint
//!
//! Configuration is stored at `~/.config/focusdeck/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::data_dir;
use crate::error::ConfigError;

/// Timer preferences.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Preset name used for a fresh state. Unknown names degrade to
    /// pomodoro, same as everywhere else.
    #[serde(default = "default_preset")]
    pub default_preset: String,
}

/// Notification preferences for the watch loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Path to a custom notification sound file (optional).
    #[serde(default)]
    pub custom_sound: Option<String>,
}

/// Task sync endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/focusdeck/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub notifications: NotificationsConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

fn default_preset() -> String {
    "pomodoro".into()
}
fn default_true() -> bool {
    true
}
fn default_base_url() -> String {
    "http://localhost:8000".into()
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            default_preset: default_preset(),
        }
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            custom_sound: None,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timer: TimerConfig::default(),
            notifications: NotificationsConfig::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl Config {
    fn path() -> Result<PathBuf, ConfigError> {
        data_dir()
            .map(|dir| dir.join("config.toml"))
            .map_err(|e| ConfigError::LoadFailed {
                path: PathBuf::from("~/.config"),
                message: e.to_string(),
            })
    }

    /// Load from disk; a missing file is written back with defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        match std::fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                path,
                message: e.to_string(),
            }),
            Err(_) => {
                let cfg = Self::default();
                cfg.save()?;
                Ok(cfg)
            }
        }
    }

    /// Load from disk, returning defaults on any error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written.
    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::path()?;
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::SaveFailed {
            path: path.clone(),
            message: e.to_string(),
        })?;
        std::fs::write(&path, content).map_err(|e| ConfigError::SaveFailed {
            path,
            message: e.to_string(),
        })
    }

    /// Get a config value as a string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        if key.is_empty() {
            return None;
        }
        let root = toml::Value::try_from(self).ok()?;
        let mut current = &root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(match current {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }

    /// Set a config value by dot-separated key and persist.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed
    /// as the key's type, or the config cannot be saved.
    pub fn set(&mut self, key: &str, raw: &str) -> Result<(), ConfigError> {
        let mut root = toml::Value::try_from(&*self).map_err(|e| ConfigError::SaveFailed {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;

        let mut parts: Vec<&str> = key.split('.').collect();
        let leaf = match parts.pop() {
            Some(leaf) if !leaf.is_empty() => leaf,
            _ => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        let mut current = &mut root;
        for part in parts {
            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }
        let table = current
            .as_table_mut()
            .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        let new_value = match table.get(leaf) {
            Some(toml::Value::Boolean(_)) => {
                toml::Value::Boolean(raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{raw}' as bool"),
                })?)
            }
            Some(toml::Value::Integer(_)) => {
                toml::Value::Integer(raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{raw}' as integer"),
                })?)
            }
            Some(toml::Value::Float(_)) => {
                toml::Value::Float(raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("cannot parse '{raw}' as float"),
                })?)
            }
            Some(_) => toml::Value::String(raw.to_string()),
            None => return Err(ConfigError::UnknownKey(key.to_string())),
        };
        table.insert(leaf.to_string(), new_value);

        *self = root.try_into().map_err(|e: toml::de::Error| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        self.save()
    }
}

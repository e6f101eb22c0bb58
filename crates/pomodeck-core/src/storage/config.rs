//! TOML-based application configuration.
//!
//! Stores:
//! - Timer settings (phase durations, cycles before a long break,
//!   pause-at-boundary policy, sound preferences, completion hold)
//! - Terminal presentation settings for the CLI host
//!
//! Configuration is stored at `~/.config/pomodeck/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::{ConfigError, Result};
use crate::workflow::DurationSetting;

/// Hold used for completion effects when none is configured.
pub const DEFAULT_COMPLETION_HOLD_SECS: u32 = 3;

/// The timer configuration a control surface runs with.
///
/// Read-only to the workflow; hosts replace it wholesale on every change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_work_duration")]
    pub work_duration: DurationSetting,
    #[serde(default = "default_short_break")]
    pub short_break_duration: DurationSetting,
    #[serde(default = "default_long_break")]
    pub long_break_duration: DurationSetting,
    #[serde(default = "default_cycles_before_long_break")]
    pub cycles_before_long_break: u32,
    /// Wait for a press before starting the next phase.
    #[serde(default = "default_true")]
    pub pause_at_phase_boundary: bool,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    /// Sound played when a work phase completes.
    #[serde(default)]
    pub work_sound: Option<String>,
    /// Sound played when a break completes.
    #[serde(default)]
    pub break_sound: Option<String>,
    #[serde(default)]
    pub completion_hold_secs: Option<u32>,
}

/// Terminal presentation for the CLI host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalConfig {
    #[serde(default = "default_bar_width")]
    pub bar_width: u32,
    /// Draw the bar with plain ASCII instead of block glyphs.
    #[serde(default)]
    pub ascii: bool,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/pomodeck/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timer: Settings,
    #[serde(default)]
    pub terminal: TerminalConfig,
}

fn default_work_duration() -> DurationSetting {
    DurationSetting::minutes(25)
}
fn default_short_break() -> DurationSetting {
    DurationSetting::minutes(5)
}
fn default_long_break() -> DurationSetting {
    DurationSetting::minutes(15)
}
fn default_cycles_before_long_break() -> u32 {
    4
}
fn default_true() -> bool {
    true
}
fn default_bar_width() -> u32 {
    30
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            work_duration: default_work_duration(),
            short_break_duration: default_short_break(),
            long_break_duration: default_long_break(),
            cycles_before_long_break: default_cycles_before_long_break(),
            pause_at_phase_boundary: true,
            sound_enabled: true,
            work_sound: None,
            break_sound: None,
            completion_hold_secs: None,
        }
    }
}

impl Settings {
    /// Completion hold in milliseconds, falling back to the library default.
    pub fn completion_hold_ms(&self) -> u64 {
        u64::from(
            self.completion_hold_secs
                .unwrap_or(DEFAULT_COMPLETION_HOLD_SECS),
        ) * 1000
    }
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            bar_width: default_bar_width(),
            ascii: false,
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let mut parts = key.split('.').peekable();
        if parts.peek().is_none() || key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_some() {
                current = current.get_mut(part).ok_or_else(unknown)?;
                continue;
            }

            let obj = current.as_object_mut().ok_or_else(unknown)?;
            let existing = obj.get(part).ok_or_else(unknown)?;
            let invalid = |message: String| ConfigError::InvalidValue {
                key: key.to_string(),
                message,
            };

            let new_value = match existing {
                serde_json::Value::Bool(_) => value
                    .parse::<bool>()
                    .map(serde_json::Value::Bool)
                    .map_err(|e| invalid(e.to_string()))?,
                // Numbers may be replaced by text so durations accept `mm:ss`.
                serde_json::Value::Number(_) | serde_json::Value::Null => parse_scalar(value),
                serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                    serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                }
                serde_json::Value::String(_) => serde_json::Value::String(value.into()),
            };

            obj.insert(part.to_string(), new_value);
            return Ok(());
        }

        Err(unknown())
    }

    /// `config.toml` inside [`data_dir`].
    pub fn path() -> Result<PathBuf> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::path()?)
    }

    /// Load from `path`, writing defaults there if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                Ok(cfg)
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
            Err(err) => Err(ConfigError::LoadFailed {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
            .into()),
        }
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::path()?)
    }

    /// Persist to `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key in memory. Returns error if key is unknown
    /// or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }
}

fn parse_scalar(value: &str) -> serde_json::Value {
    if let Ok(n) = value.parse::<u64>() {
        return serde_json::Value::Number(n.into());
    }
    if let Some(n) = value.parse::<f64>().ok().and_then(serde_json::Number::from_f64) {
        return serde_json::Value::Number(n);
    }
    if let Ok(b) = value.parse::<bool>() {
        return serde_json::Value::Bool(b);
    }
    serde_json::Value::String(value.into())
}

mod config;

pub use config::{Config, Settings, TerminalConfig, DEFAULT_COMPLETION_HOLD_SECS};

use std::path::PathBuf;

use crate::error::Result;

/// Returns the configuration directory.
///
/// `POMODECK_CONFIG_DIR` wins when set. Otherwise `~/.config/pomodeck[-dev]/`
/// based on POMODECK_ENV; set POMODECK_ENV=dev to use the development
/// directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf> {
    let dir = match std::env::var_os("POMODECK_CONFIG_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("POMODECK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("pomodeck-dev")
            } else {
                base_dir.join("pomodeck")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

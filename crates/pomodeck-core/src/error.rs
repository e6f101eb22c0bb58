//! Core error types for pomodeck-core.
//!
//! The workflow itself never fails: malformed durations degrade to zero and
//! unexpected events are ignored. These types cover the edges around it --
//! configuration files, table construction and host port adapters.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for pomodeck-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Transition table errors
    #[error("State machine error: {0}")]
    Machine(#[from] MachineError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The session loop has stopped and no longer accepts signals
    #[error("session has stopped")]
    SessionClosed,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Dot-path key does not exist
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors raised while building a state machine from its table.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum MachineError {
    /// A transition points at a state that has no node in the table
    #[error("transition from '{from}' targets unknown state '{target}'")]
    UnknownState { from: String, target: String },

    /// The initial state has no node in the table
    #[error("initial state '{0}' is not defined")]
    MissingState(String),
}

/// Failure reported by a host port adapter (display, timer, effects).
///
/// The controller logs these and carries on; they never reach the machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The port is not attached (e.g. the surface is gone)
    #[error("{port} port is unavailable")]
    Unavailable { port: &'static str },

    /// The port call itself failed
    #[error("{port} port failed: {message}")]
    Failed { port: &'static str, message: String },
}

impl PortError {
    pub fn failed(port: &'static str, message: impl Into<String>) -> Self {
        PortError::Failed {
            port,
            message: message.into(),
        }
    }

    pub fn port(&self) -> &'static str {
        match self {
            PortError::Unavailable { port } | PortError::Failed { port, .. } => port,
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

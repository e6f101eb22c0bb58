//! # Pomodeck Core Library
//!
//! This library provides the core logic for Pomodeck, a Pomodoro timer driven
//! by a single button. Short press starts and pauses, double press skips to
//! the next phase, long press resets. A standalone CLI binary drives the
//! same library.
//!
//! ## Architecture
//!
//! - **State machine engine**: a generic, table-driven interpreter with
//!   guarded and immediate (`always`) transitions
//! - **Workflow**: the Pomodoro transition table, runtime context, guards and
//!   the port traits hosts implement
//! - **Controller**: binds the workflow to host ports and lifecycle
//! - **Runtime**: tokio-backed timer and effects ports plus a serialized
//!   session loop
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`WorkflowController`]: one control surface instance
//! - [`Session`]: async driver around a controller
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod runtime;
pub mod storage;
pub mod workflow;

pub use error::{ConfigError, CoreError, MachineError, PortError, Result};
pub use events::Event;
pub use runtime::{Gesture, Session, SessionHandle, Signal};
pub use storage::{Config, Settings};
pub use workflow::{
    seconds_for, CompletionKind, Countdown, DurationSetting, Phase, Snapshot, WorkflowController,
    WorkflowEvent, WorkflowState,
};

//! Single-button Pomodoro workflow.
//!
//! - [`machine`]: a generic table-driven state machine engine
//! - [`table`]: the Pomodoro transition table built on it
//! - [`controller`]: binds the table to host ports and lifecycle

pub mod context;
pub mod controller;
pub mod duration;
pub mod guards;
pub mod machine;
pub mod phase;
pub mod ports;
pub mod table;

pub use context::RuntimeContext;
pub use controller::{GuardedPorts, Snapshot, WorkflowController};
pub use duration::{seconds_for, DurationSetting};
pub use machine::{Executor, Guard, Machine, StateNode, Transition, MAX_ALWAYS_HOPS};
pub use phase::{CompletionKind, Phase};
pub use ports::{Countdown, Display, Effects, PortResult, Ports, Timer};
pub use table::{workflow_machine, Action, WorkflowEvent, WorkflowMachine, WorkflowState};

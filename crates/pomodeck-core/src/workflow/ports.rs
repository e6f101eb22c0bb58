//! The capability set the workflow drives.
//!
//! Two layers:
//!
//! - [`Display`], [`Timer`] and [`Effects`] are what a host implements. Every
//!   call may fail with a [`PortError`].
//! - [`Ports`] is what the transition table's actions see. It is infallible;
//!   the controller adapts the host traits to it and swallows (logs)
//!   failures, so a broken presentation never blocks a transition.

use serde::{Deserialize, Serialize};

use super::phase::{CompletionKind, Phase};
use crate::error::PortError;
use crate::storage::Settings;

pub type PortResult<T = ()> = Result<T, PortError>;

/// A countdown the timer port reports as live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Countdown {
    pub phase: Phase,
    pub remaining_secs: u64,
}

/// Renders the control surface.
pub trait Display {
    /// Phase at rest, showing its whole duration.
    fn show_full(&mut self, phase: Phase, total_secs: u64) -> PortResult;
    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult;
    fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult;
}

/// Schedules countdowns.
///
/// Completion is reported back to the workflow as a `TimerDone` event,
/// exactly once per started countdown and never for a stopped one.
pub trait Timer {
    fn start_timer(&mut self, phase: Phase, duration_secs: u64) -> PortResult;
    /// Idempotent; cancels any pending completion.
    fn stop_timer(&mut self) -> PortResult;
    /// The live countdown, if one is ticking.
    fn status(&self) -> Option<Countdown>;
}

/// Completion and reset feedback.
pub trait Effects {
    /// Play the completion animation and sound together. Must eventually
    /// yield one `CompleteAnimDone` event, after at least `hold_ms`.
    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) -> PortResult;
    /// Fire-and-continue flash plus optional sound.
    fn show_reset_feedback(&mut self) -> PortResult;
    /// New settings were pushed by the host.
    fn settings_changed(&mut self, _settings: &Settings) {}
}

/// Infallible view of the ports used by workflow actions.
pub trait Ports {
    fn show_full(&mut self, phase: Phase, total_secs: u64);
    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase);
    fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase);
    fn start_timer(&mut self, phase: Phase, duration_secs: u64);
    fn stop_timer(&mut self);
    /// Seconds left on the live countdown.
    fn live_remaining(&self) -> Option<u64>;
    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64);
    fn show_reset_feedback(&mut self);
}

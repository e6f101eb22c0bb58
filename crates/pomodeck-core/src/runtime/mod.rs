//! Tokio host runtime for a control surface.
//!
//! A [`Session`] owns one [`WorkflowController`](crate::workflow::WorkflowController)
//! and consumes a single queue of [`Signal`]s, so every dispatch for an
//! instance is serialized. The [`TickTimer`] and [`TaskEffects`] ports run
//! as tokio tasks and report back through the same queue.

mod effects;
mod session;
mod timer;

pub use effects::{Animator, Chime, Cue, TaskEffects};
pub use session::{Session, SessionController, SessionHandle};
pub use timer::{TickTimer, DEFAULT_TICK};

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::storage::Settings;
use crate::workflow::{Snapshot, WorkflowEvent};

/// Button gestures a host recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gesture {
    Short,
    Double,
    Long,
}

impl From<Gesture> for WorkflowEvent {
    fn from(gesture: Gesture) -> Self {
        match gesture {
            Gesture::Short => WorkflowEvent::ShortPress,
            Gesture::Double => WorkflowEvent::DoublePress,
            Gesture::Long => WorkflowEvent::LongPress,
        }
    }
}

/// A message on a session's input queue.
///
/// `token` fields identify the countdown or completion effect that produced
/// the signal; the session drops any whose token is no longer current.
#[derive(Debug)]
pub enum Signal {
    Press(Gesture),
    Tick { token: u64, remaining_secs: u64 },
    TimerDone { token: u64 },
    EffectsDone { token: u64 },
    Settings(Box<Settings>),
    Appear,
    Disappear,
    Snapshot(oneshot::Sender<Snapshot>),
    Shutdown,
}

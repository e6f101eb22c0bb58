use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::workflow::{Phase, WorkflowEvent, WorkflowState};

/// Every observable change in a control surface produces an Event.
/// Hosts drain them from the controller to log or print.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    StateEntered {
        state: WorkflowState,
        phase: Phase,
        cycle_index: u32,
        pending_next: Option<Phase>,
        at: DateTime<Utc>,
    },
    /// An input arrived that the current state has no transition for.
    EventIgnored {
        event: WorkflowEvent,
        state: WorkflowState,
        at: DateTime<Utc>,
    },
    /// The instance re-appeared and the controller re-derived its state.
    Restored {
        state: WorkflowState,
        at: DateTime<Utc>,
    },
    SettingsChanged {
        at: DateTime<Utc>,
    },
    /// A display, timer or effects call failed; the transition went ahead.
    PortFailed {
        port: String,
        message: String,
        at: DateTime<Utc>,
    },
}

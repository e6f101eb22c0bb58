use serde::Serialize;

use super::phase::Phase;
use crate::storage::Settings;

/// Mutable per-instance state the workflow actions operate on.
///
/// Lives only as long as the control surface instance; nothing here is
/// persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeContext {
    pub phase: Phase,
    /// Completed work sessions since the last long break.
    pub cycle_index: u32,
    pub running: bool,
    /// Seconds left in a countdown paused mid-way.
    pub remaining: Option<u64>,
    /// Phase a forthcoming press will start, while sitting at a boundary.
    pub pending_next: Option<Phase>,
    #[serde(skip)]
    pub settings: Settings,
}

impl RuntimeContext {
    pub fn new(settings: Settings) -> Self {
        Self {
            phase: Phase::Work,
            cycle_index: 0,
            running: false,
            remaining: None,
            pending_next: None,
            settings,
        }
    }

    /// Cycles before a long break, never below one.
    pub fn cycles_before_long_break(&self) -> u32 {
        self.settings.cycles_before_long_break.max(1)
    }

    /// Move the cycle counter past `from` and return the phase that follows.
    ///
    /// Work increments the counter and yields a long break once it reaches
    /// the configured cycle count; leaving a long break resets it.
    pub(crate) fn advance_from(&mut self, from: Phase) -> Phase {
        match from {
            Phase::Work => {
                self.cycle_index = self.cycle_index.saturating_add(1);
                if self.cycle_index >= self.cycles_before_long_break() {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak => Phase::Work,
            Phase::LongBreak => {
                self.cycle_index = 0;
                Phase::Work
            }
        }
    }
}

//! Recording ports shared by the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use pomodeck_core::error::PortError;
use pomodeck_core::runtime::{Animator, Chime, Cue};
use pomodeck_core::workflow::{Countdown, Display, Effects, PortResult, Timer, WorkflowController};
use pomodeck_core::{CompletionKind, Phase, Settings};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Full(Phase, u64),
    Running(u64, u64, Phase),
    Paused(u64, u64, Phase),
    Start(Phase, u64),
    Stop,
    Completion(CompletionKind, u64),
    Frame(CompletionKind, f32),
    ResetFeedback,
    ResetFrame,
    Sound(Cue),
}

/// Ordered record of every port call.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<Mutex<Vec<Call>>>);

impl Calls {
    pub fn push(&self, call: Call) {
        self.0.lock().unwrap().push(call);
    }

    pub fn all(&self) -> Vec<Call> {
        self.0.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.0.lock().unwrap().clear();
    }

    pub fn last(&self) -> Option<Call> {
        self.0.lock().unwrap().last().cloned()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.0.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    pub fn completions(&self) -> usize {
        self.count(|c| matches!(c, Call::Completion(..)))
    }

    /// Progress of the last completion animation frame drawn.
    pub fn last_frame(&self) -> Option<f32> {
        self.0.lock().unwrap().iter().rev().find_map(|c| match c {
            Call::Frame(_, progress) => Some(*progress),
            _ => None,
        })
    }

    pub fn resets(&self) -> usize {
        self.count(|c| matches!(c, Call::ResetFeedback))
    }
}

pub struct RecordingDisplay(pub Calls);

impl Display for RecordingDisplay {
    fn show_full(&mut self, phase: Phase, total_secs: u64) -> PortResult {
        self.0.push(Call::Full(phase, total_secs));
        Ok(())
    }

    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult {
        self.0.push(Call::Running(remaining_secs, total_secs, phase));
        Ok(())
    }

    fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult {
        self.0.push(Call::Paused(remaining_secs, total_secs, phase));
        Ok(())
    }
}

/// Live countdown the test can wind forward by hand.
#[derive(Debug, Clone, Default)]
pub struct Clock(Arc<Mutex<Option<Countdown>>>);

impl Clock {
    pub fn set_remaining(&self, secs: u64) {
        if let Some(live) = self.0.lock().unwrap().as_mut() {
            live.remaining_secs = secs;
        }
    }

    pub fn get(&self) -> Option<Countdown> {
        *self.0.lock().unwrap()
    }
}

pub struct ManualTimer {
    pub calls: Calls,
    pub clock: Clock,
}

impl Timer for ManualTimer {
    fn start_timer(&mut self, phase: Phase, duration_secs: u64) -> PortResult {
        self.calls.push(Call::Start(phase, duration_secs));
        *self.clock.0.lock().unwrap() = Some(Countdown {
            phase,
            remaining_secs: duration_secs,
        });
        Ok(())
    }

    fn stop_timer(&mut self) -> PortResult {
        self.calls.push(Call::Stop);
        *self.clock.0.lock().unwrap() = None;
        Ok(())
    }

    fn status(&self) -> Option<Countdown> {
        self.clock.get()
    }
}

pub struct RecordingEffects(pub Calls);

impl Effects for RecordingEffects {
    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) -> PortResult {
        self.0.push(Call::Completion(kind, hold_ms));
        Ok(())
    }

    fn show_reset_feedback(&mut self) -> PortResult {
        self.0.push(Call::ResetFeedback);
        Ok(())
    }
}

pub type Controller = WorkflowController<RecordingDisplay, ManualTimer, RecordingEffects>;

/// A controller over recording ports, plus handles to inspect them.
pub fn controller(settings: Settings) -> (Controller, Calls, Clock) {
    let calls = Calls::default();
    let clock = Clock::default();
    let controller = WorkflowController::new(
        settings,
        RecordingDisplay(calls.clone()),
        ManualTimer {
            calls: calls.clone(),
            clock: clock.clone(),
        },
        RecordingEffects(calls.clone()),
    )
    .unwrap();
    (controller, calls, clock)
}

pub struct RecordingAnimator(pub Calls);

impl Animator for RecordingAnimator {
    fn completion_frame(&self, kind: CompletionKind, progress: f32) {
        self.0.push(Call::Frame(kind, progress));
    }

    fn reset_frame(&self) {
        self.0.push(Call::ResetFrame);
    }
}

pub struct RecordingChime(pub Calls);

impl Chime for RecordingChime {
    fn play(&self, cue: &Cue) -> Result<(), PortError> {
        self.0.push(Call::Sound(cue.clone()));
        Ok(())
    }
}

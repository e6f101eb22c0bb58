//! Binds the workflow machine to a concrete set of ports and to the host
//! lifecycle of one control surface instance.
//!
//! One controller per instance. It owns the machine, the runtime context and
//! the ports, and is dropped with the instance. Callers must serialize calls
//! into it (see [`crate::runtime::Session`]).

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::context::RuntimeContext;
use super::duration::seconds_for;
use super::phase::{CompletionKind, Phase};
use super::ports::{Countdown, Display, Effects, PortResult, Ports, Timer};
use super::table::{workflow_machine, WorkflowEvent, WorkflowMachine, WorkflowState};
use crate::error::{PortError, Result};
use crate::events::Event;
use crate::storage::Settings;

/// Adapts fallible host ports to the infallible [`Ports`] the actions use.
///
/// Failures are logged and parked for the controller's journal. Display calls
/// are dropped while the instance is hidden. A completion effect that fails
/// to start is flagged so the controller can finish the phase itself.
pub struct GuardedPorts<D, T, F> {
    display: D,
    timer: T,
    effects: F,
    visible: bool,
    failures: Vec<PortError>,
    completion_failed: bool,
}

impl<D, T, F> GuardedPorts<D, T, F> {
    fn new(display: D, timer: T, effects: F) -> Self {
        Self {
            display,
            timer,
            effects,
            visible: true,
            failures: Vec::new(),
            completion_failed: false,
        }
    }

    fn check(&mut self, result: PortResult) {
        if let Err(err) = result {
            warn!(port = err.port(), error = %err, "port call failed; continuing");
            self.failures.push(err);
        }
    }
}

impl<D: Display, T: Timer, F: Effects> Ports for GuardedPorts<D, T, F> {
    fn show_full(&mut self, phase: Phase, total_secs: u64) {
        if self.visible {
            let result = self.display.show_full(phase, total_secs);
            self.check(result);
        }
    }

    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) {
        if self.visible {
            let result = self.display.update_running(remaining_secs, total_secs, phase);
            self.check(result);
        }
    }

    fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) {
        if self.visible {
            let result = self.display.show_paused(remaining_secs, total_secs, phase);
            self.check(result);
        }
    }

    fn start_timer(&mut self, phase: Phase, duration_secs: u64) {
        let result = self.timer.start_timer(phase, duration_secs);
        self.check(result);
    }

    fn stop_timer(&mut self) {
        let result = self.timer.stop_timer();
        self.check(result);
    }

    fn live_remaining(&self) -> Option<u64> {
        self.timer.status().map(|c| c.remaining_secs)
    }

    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) {
        let result = self.effects.show_completion_with_sound(kind, hold_ms);
        if result.is_err() {
            self.completion_failed = true;
        }
        self.check(result);
    }

    fn show_reset_feedback(&mut self) {
        let result = self.effects.show_reset_feedback();
        self.check(result);
    }
}

/// Serializable view of a controller.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub state: WorkflowState,
    pub phase: Phase,
    pub cycle_index: u32,
    pub running: bool,
    pub remaining: Option<u64>,
    pub pending_next: Option<Phase>,
    pub countdown: Option<Countdown>,
    pub visible: bool,
}

pub struct WorkflowController<D, T, F> {
    machine: WorkflowMachine,
    ctx: RuntimeContext,
    ports: GuardedPorts<D, T, F>,
    journal: Vec<Event>,
}

impl<D: Display, T: Timer, F: Effects> WorkflowController<D, T, F> {
    /// Create the instance: fresh context, machine entered at `Idle`.
    pub fn new(settings: Settings, display: D, timer: T, mut effects: F) -> Result<Self> {
        let settings = normalize(settings);
        effects.settings_changed(&settings);
        let mut controller = Self {
            machine: workflow_machine()?,
            ctx: RuntimeContext::new(settings),
            ports: GuardedPorts::new(display, timer, effects),
            journal: Vec::new(),
        };
        let path = controller
            .machine
            .start(&mut controller.ctx, &mut controller.ports);
        controller.record(&path);
        info!("control surface created");
        Ok(controller)
    }

    pub fn state(&self) -> WorkflowState {
        self.machine.current()
    }

    pub fn context(&self) -> &RuntimeContext {
        &self.ctx
    }

    pub fn is_visible(&self) -> bool {
        self.ports.visible
    }

    pub fn display(&self) -> &D {
        &self.ports.display
    }

    pub fn timer(&self) -> &T {
        &self.ports.timer
    }

    pub fn effects(&self) -> &F {
        &self.ports.effects
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state(),
            phase: self.ctx.phase,
            cycle_index: self.ctx.cycle_index,
            running: self.ctx.running,
            remaining: self.ctx.remaining,
            pending_next: self.ctx.pending_next,
            countdown: self.ports.timer.status(),
            visible: self.ports.visible,
        }
    }

    /// Take everything journaled since the last drain.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.journal)
    }

    /// Feed one event through the machine, to quiescence.
    ///
    /// If the completion effects could not be started, the `CompleteAnimDone`
    /// they would have posted is dispatched here once the event has settled.
    pub fn dispatch(&mut self, event: WorkflowEvent) -> Vec<WorkflowState> {
        let from = self.machine.current();
        let mut path = self.machine.dispatch(event, &mut self.ctx, &mut self.ports);
        while std::mem::take(&mut self.ports.completion_failed) {
            debug!(state = ?self.machine.current(), "completion effects failed; finishing phase");
            let rest = self.machine.dispatch(
                WorkflowEvent::CompleteAnimDone,
                &mut self.ctx,
                &mut self.ports,
            );
            path.extend(rest);
        }
        if path.is_empty() {
            debug!(state = ?from, event = ?event, "event ignored");
            self.journal.push(Event::EventIgnored {
                event,
                state: from,
                at: Utc::now(),
            });
        } else {
            debug!(from = ?from, event = ?event, path = ?path, "transition");
        }
        self.record(&path);
        path
    }

    /// A 1 Hz tick from the live countdown.
    pub fn tick(&mut self, remaining_secs: u64) {
        if !self.state().is_running() {
            return;
        }
        let total = seconds_for(self.ctx.phase, &self.ctx.settings);
        self.ports.update_running(remaining_secs, total, self.ctx.phase);
        self.collect_failures();
    }

    /// Replace the settings snapshot wholesale.
    ///
    /// A countdown already ticking keeps its length; the new durations apply
    /// from the next countdown start or full-duration display.
    pub fn update_settings(&mut self, settings: Settings) {
        let settings = normalize(settings);
        self.ports.effects.settings_changed(&settings);
        self.ctx.settings = settings;
        info!("settings updated");
        self.journal.push(Event::SettingsChanged { at: Utc::now() });
        self.repaint();
        self.collect_failures();
    }

    /// The surface went out of view. Countdowns and effects keep running.
    pub fn disappear(&mut self) {
        self.ports.visible = false;
        debug!(state = ?self.state(), "control surface hidden");
    }

    /// The surface is back in view: re-derive the state from what the timer
    /// port reports and what the context still holds, then repaint.
    pub fn appear(&mut self) -> WorkflowState {
        if self.ports.visible {
            return self.state();
        }
        self.ports.visible = true;

        let state = self.derive_state();
        if let Err(err) = self.machine.restore(state) {
            warn!(error = %err, "could not restore derived state");
        }
        info!(state = ?state, "control surface restored");
        self.journal.push(Event::Restored {
            state,
            at: Utc::now(),
        });
        self.repaint();
        self.collect_failures();
        state
    }

    /// Stop any countdown ahead of dropping the instance.
    pub fn shutdown(&mut self) {
        self.ports.stop_timer();
        self.ctx.running = false;
        self.collect_failures();
    }

    fn derive_state(&mut self) -> WorkflowState {
        let current = self.state();
        if current.is_complete() {
            // Effects are still in flight; their completion will move us on.
            return current;
        }

        if let Some(countdown) = self.ports.timer.status() {
            self.ctx.phase = countdown.phase;
            self.ctx.remaining = None;
            self.ctx.pending_next = None;
            self.ctx.running = true;
            return WorkflowState::running(countdown.phase);
        }

        self.ctx.running = false;
        if self.ctx.remaining.is_some() {
            self.ctx.pending_next = None;
            return WorkflowState::PausedInFlight;
        }
        if self.ctx.pending_next.is_some() {
            return WorkflowState::PausedNext;
        }
        if self.ctx.phase == Phase::Work && current == WorkflowState::Idle {
            return WorkflowState::Idle;
        }
        self.ctx.pending_next = Some(self.ctx.phase);
        WorkflowState::PausedNext
    }

    fn repaint(&mut self) {
        let ctx = &self.ctx;
        match self.machine.current() {
            WorkflowState::Idle => {
                let total = seconds_for(Phase::Work, &ctx.settings);
                self.ports.show_full(Phase::Work, total);
            }
            WorkflowState::PausedInFlight => {
                let total = seconds_for(ctx.phase, &ctx.settings);
                let remaining = ctx.remaining.unwrap_or(total);
                let phase = ctx.phase;
                self.ports.show_paused(remaining, total, phase);
            }
            WorkflowState::PausedNext => {
                let phase = ctx.pending_next.unwrap_or(ctx.phase);
                let total = seconds_for(phase, &ctx.settings);
                self.ports.show_full(phase, total);
            }
            state if state.is_running() => {
                let total = seconds_for(ctx.phase, &ctx.settings);
                let remaining = self.ports.live_remaining().unwrap_or(total);
                let phase = ctx.phase;
                self.ports.update_running(remaining, total, phase);
            }
            _ => {}
        }
    }

    fn record(&mut self, path: &[WorkflowState]) {
        let at = Utc::now();
        for state in path {
            self.journal.push(Event::StateEntered {
                state: *state,
                phase: self.ctx.phase,
                cycle_index: self.ctx.cycle_index,
                pending_next: self.ctx.pending_next,
                at,
            });
        }
        self.collect_failures();
    }

    fn collect_failures(&mut self) {
        let at = Utc::now();
        for err in self.ports.failures.drain(..) {
            self.journal.push(Event::PortFailed {
                port: err.port().to_string(),
                message: err.to_string(),
                at,
            });
        }
    }
}

fn normalize(mut settings: Settings) -> Settings {
    if settings.cycles_before_long_break == 0 {
        warn!("cycles_before_long_break must be at least 1; using 1");
        settings.cycles_before_long_break = 1;
    }
    settings
}

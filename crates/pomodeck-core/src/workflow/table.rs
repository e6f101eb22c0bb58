//! The Pomodoro workflow as a transition table.
//!
//! ## States
//!
//! ```text
//!            SHORT                 TIMER_DONE              COMPLETE_ANIM_DONE
//! Idle ───────────────> *Running ────────────> *Complete ───────────────────> PausedNext
//!                        │    ^                                                  │
//!                  SHORT │    │ SHORT                                            │ SHORT
//!                        v    │                                                  v
//!                     PausedInFlight                                         *Running
//!
//! DOUBLE on *Running / PausedInFlight / PausedNext skips to the next phase.
//! LONG from anywhere resets to Idle.
//! ```
//!
//! With the pause-at-boundary policy off, every edge into `PausedNext` goes
//! straight to the `*Running` state of the pending phase instead.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::context::RuntimeContext;
use super::duration::seconds_for;
use super::guards::{
    in_short_break, in_work, in_work_long_break_due, long_break_due, pause_at_boundary,
    pending_long_break, pending_short_break, pending_work, pending_work_long_break_due,
};
use super::machine::{Executor, Machine, StateNode, Transition};
use super::phase::Phase;
use super::ports::Ports;
use crate::error::MachineError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WorkflowState {
    Idle,
    WorkRunning,
    ShortBreakRunning,
    LongBreakRunning,
    PausedInFlight,
    WorkComplete,
    ShortBreakComplete,
    LongBreakComplete,
    PausedNext,
}

impl WorkflowState {
    pub const ALL: [WorkflowState; 9] = [
        WorkflowState::Idle,
        WorkflowState::WorkRunning,
        WorkflowState::ShortBreakRunning,
        WorkflowState::LongBreakRunning,
        WorkflowState::PausedInFlight,
        WorkflowState::WorkComplete,
        WorkflowState::ShortBreakComplete,
        WorkflowState::LongBreakComplete,
        WorkflowState::PausedNext,
    ];

    pub fn running(phase: Phase) -> Self {
        match phase {
            Phase::Work => WorkflowState::WorkRunning,
            Phase::ShortBreak => WorkflowState::ShortBreakRunning,
            Phase::LongBreak => WorkflowState::LongBreakRunning,
        }
    }

    pub fn complete(phase: Phase) -> Self {
        match phase {
            Phase::Work => WorkflowState::WorkComplete,
            Phase::ShortBreak => WorkflowState::ShortBreakComplete,
            Phase::LongBreak => WorkflowState::LongBreakComplete,
        }
    }

    pub fn is_running(self) -> bool {
        matches!(
            self,
            WorkflowState::WorkRunning
                | WorkflowState::ShortBreakRunning
                | WorkflowState::LongBreakRunning
        )
    }

    pub fn is_complete(self) -> bool {
        matches!(
            self,
            WorkflowState::WorkComplete
                | WorkflowState::ShortBreakComplete
                | WorkflowState::LongBreakComplete
        )
    }
}

/// Inputs the workflow reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkflowEvent {
    ShortPress,
    DoublePress,
    LongPress,
    TimerDone,
    CompleteAnimDone,
}

/// Side effects and context updates referenced by the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Work phase at full duration, nothing pending or paused.
    ShowIdle,
    ResetCycle,
    ResetFeedback,
    StopCountdown,
    /// Start (or resume from the paused snapshot) a countdown for the phase.
    StartCountdown(Phase),
    CaptureRemaining,
    ShowPaused,
    /// Step the cycle past the current phase and make the next one pending.
    AdvancePhase,
    /// Step the cycle past the pending phase.
    AdvancePending,
    ShowPendingNext,
    PlayCompletion,
}

impl Action {
    pub fn run<P: Ports + ?Sized>(&self, ctx: &mut RuntimeContext, ports: &mut P) {
        match *self {
            Action::ShowIdle => {
                ctx.phase = Phase::Work;
                ctx.running = false;
                ctx.remaining = None;
                ctx.pending_next = None;
                ports.show_full(Phase::Work, seconds_for(Phase::Work, &ctx.settings));
            }
            Action::ResetCycle => ctx.cycle_index = 0,
            Action::ResetFeedback => ports.show_reset_feedback(),
            Action::StopCountdown => {
                ports.stop_timer();
                ctx.running = false;
            }
            Action::StartCountdown(phase) => {
                let total = seconds_for(phase, &ctx.settings);
                let resumed = ctx.remaining.take().filter(|_| ctx.phase == phase);
                let secs = resumed.unwrap_or(total);
                if phase == Phase::LongBreak {
                    ctx.cycle_index = 0;
                }
                ctx.phase = phase;
                ctx.pending_next = None;
                ctx.running = true;
                ports.start_timer(phase, secs);
                ports.update_running(secs, total, phase);
            }
            Action::CaptureRemaining => {
                let live = ports.live_remaining();
                ctx.remaining = Some(live.unwrap_or_else(|| seconds_for(ctx.phase, &ctx.settings)));
            }
            Action::ShowPaused => {
                if let Some(remaining) = ctx.remaining {
                    let total = seconds_for(ctx.phase, &ctx.settings);
                    ports.show_paused(remaining, total, ctx.phase);
                }
            }
            Action::AdvancePhase => {
                ctx.remaining = None;
                let next = ctx.advance_from(ctx.phase);
                ctx.pending_next = Some(next);
            }
            Action::AdvancePending => {
                let from = ctx.pending_next.unwrap_or(ctx.phase);
                let next = ctx.advance_from(from);
                ctx.pending_next = Some(next);
            }
            Action::ShowPendingNext => {
                let phase = ctx.pending_next.unwrap_or(ctx.phase);
                ports.show_full(phase, seconds_for(phase, &ctx.settings));
            }
            Action::PlayCompletion => {
                ports.show_completion_with_sound(
                    ctx.phase.completion_kind(),
                    ctx.settings.completion_hold_ms(),
                );
            }
        }
    }
}

impl<P: Ports> Executor<RuntimeContext, Action> for P {
    fn execute(&mut self, action: &Action, ctx: &mut RuntimeContext) {
        action.run(ctx, self);
    }
}

pub type WorkflowMachine = Machine<WorkflowState, WorkflowEvent, RuntimeContext, Action>;

type Node = StateNode<WorkflowState, WorkflowEvent, RuntimeContext, Action>;
type Edge = Transition<WorkflowState, RuntimeContext, Action>;

/// Build the Pomodoro workflow, starting in `Idle`.
pub fn workflow_machine() -> Result<WorkflowMachine, MachineError> {
    let mut nodes = HashMap::new();
    let mut insert = |state: WorkflowState, node: Node| {
        nodes.insert(state, node.on(WorkflowEvent::LongPress, reset()));
    };

    insert(
        WorkflowState::Idle,
        Node::new()
            .entry([Action::ShowIdle])
            .on(WorkflowEvent::ShortPress, Edge::to(WorkflowState::WorkRunning)),
    );
    for phase in Phase::ALL {
        insert(WorkflowState::running(phase), running(phase));
        insert(WorkflowState::complete(phase), complete());
    }
    insert(WorkflowState::PausedInFlight, paused_in_flight());
    insert(WorkflowState::PausedNext, paused_next());

    Machine::new(WorkflowState::Idle, nodes)
}

fn reset() -> Edge {
    Edge::to(WorkflowState::Idle).run([
        Action::StopCountdown,
        Action::ResetCycle,
        Action::ResetFeedback,
    ])
}

fn skip(target: WorkflowState) -> Edge {
    Edge::to(target).run([Action::StopCountdown, Action::AdvancePhase])
}

fn running(phase: Phase) -> Node {
    let node = Node::new()
        .entry([Action::StartCountdown(phase)])
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::PausedInFlight)
                .run([Action::CaptureRemaining, Action::StopCountdown]),
        )
        .on(
            WorkflowEvent::DoublePress,
            skip(WorkflowState::PausedNext).when(pause_at_boundary),
        )
        .on(WorkflowEvent::TimerDone, Edge::to(WorkflowState::complete(phase)));

    match phase {
        Phase::Work => node
            .on(
                WorkflowEvent::DoublePress,
                skip(WorkflowState::LongBreakRunning).when(long_break_due),
            )
            .on(
                WorkflowEvent::DoublePress,
                skip(WorkflowState::ShortBreakRunning),
            ),
        Phase::ShortBreak | Phase::LongBreak => {
            node.on(WorkflowEvent::DoublePress, skip(WorkflowState::WorkRunning))
        }
    }
}

fn complete() -> Node {
    Node::new()
        .entry([
            Action::StopCountdown,
            Action::AdvancePhase,
            Action::PlayCompletion,
        ])
        .on(
            WorkflowEvent::CompleteAnimDone,
            Edge::to(WorkflowState::PausedNext).when(pause_at_boundary),
        )
        .on(
            WorkflowEvent::CompleteAnimDone,
            Edge::to(WorkflowState::WorkRunning).when(pending_work),
        )
        .on(
            WorkflowEvent::CompleteAnimDone,
            Edge::to(WorkflowState::ShortBreakRunning).when(pending_short_break),
        )
        .on(
            WorkflowEvent::CompleteAnimDone,
            Edge::to(WorkflowState::LongBreakRunning).when(pending_long_break),
        )
}

fn paused_in_flight() -> Node {
    Node::new()
        .entry([Action::ShowPaused])
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::WorkRunning).when(in_work),
        )
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::ShortBreakRunning).when(in_short_break),
        )
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::LongBreakRunning),
        )
        .on(
            WorkflowEvent::DoublePress,
            skip(WorkflowState::PausedNext).when(pause_at_boundary),
        )
        .on(
            WorkflowEvent::DoublePress,
            skip(WorkflowState::LongBreakRunning).when(in_work_long_break_due),
        )
        .on(
            WorkflowEvent::DoublePress,
            skip(WorkflowState::ShortBreakRunning).when(in_work),
        )
        .on(WorkflowEvent::DoublePress, skip(WorkflowState::WorkRunning))
}

fn paused_next() -> Node {
    let advance = |target: WorkflowState| Edge::to(target).run([Action::AdvancePending]);
    Node::new()
        .entry([Action::ShowPendingNext])
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::WorkRunning).when(pending_work),
        )
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::ShortBreakRunning).when(pending_short_break),
        )
        .on(
            WorkflowEvent::ShortPress,
            Edge::to(WorkflowState::LongBreakRunning).when(pending_long_break),
        )
        .on(
            WorkflowEvent::DoublePress,
            advance(WorkflowState::PausedNext).when(pause_at_boundary),
        )
        .on(
            WorkflowEvent::DoublePress,
            advance(WorkflowState::LongBreakRunning).when(pending_work_long_break_due),
        )
        .on(
            WorkflowEvent::DoublePress,
            advance(WorkflowState::ShortBreakRunning).when(pending_work),
        )
        .on(
            WorkflowEvent::DoublePress,
            advance(WorkflowState::WorkRunning),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Settings;
    use crate::workflow::phase::CompletionKind;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Full(Phase, u64),
        Running(u64, u64, Phase),
        Paused(u64, u64, Phase),
        Start(Phase, u64),
        Stop,
        Completion(CompletionKind, u64),
        ResetFeedback,
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        live: Option<u64>,
    }

    impl Ports for Recorder {
        fn show_full(&mut self, phase: Phase, total_secs: u64) {
            self.calls.push(Call::Full(phase, total_secs));
        }
        fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) {
            self.calls.push(Call::Running(remaining_secs, total_secs, phase));
        }
        fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) {
            self.calls.push(Call::Paused(remaining_secs, total_secs, phase));
        }
        fn start_timer(&mut self, phase: Phase, duration_secs: u64) {
            self.live = Some(duration_secs);
            self.calls.push(Call::Start(phase, duration_secs));
        }
        fn stop_timer(&mut self) {
            self.live = None;
            self.calls.push(Call::Stop);
        }
        fn live_remaining(&self) -> Option<u64> {
            self.live
        }
        fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) {
            self.calls.push(Call::Completion(kind, hold_ms));
        }
        fn show_reset_feedback(&mut self) {
            self.calls.push(Call::ResetFeedback);
        }
    }

    struct Rig {
        machine: WorkflowMachine,
        ctx: RuntimeContext,
        ports: Recorder,
    }

    impl Rig {
        fn new(settings: Settings) -> Self {
            let mut rig = Self {
                machine: workflow_machine().unwrap(),
                ctx: RuntimeContext::new(settings),
                ports: Recorder::default(),
            };
            rig.machine.start(&mut rig.ctx, &mut rig.ports);
            rig
        }

        fn send(&mut self, event: WorkflowEvent) -> Vec<WorkflowState> {
            self.machine.dispatch(event, &mut self.ctx, &mut self.ports)
        }

        fn state(&self) -> WorkflowState {
            self.machine.current()
        }
    }

    #[test]
    fn table_is_complete() {
        let machine = workflow_machine().unwrap();
        for state in WorkflowState::ALL {
            assert!(
                machine
                    .transitions()
                    .any(|(from, event, _)| from == state
                        && event == Some(WorkflowEvent::LongPress)),
                "{state:?} has no reset"
            );
        }
    }

    #[test]
    fn complete_states_only_react_to_anim_done_and_reset() {
        let machine = workflow_machine().unwrap();
        for (from, event, _) in machine.transitions() {
            if from.is_complete() {
                assert!(matches!(
                    event,
                    Some(WorkflowEvent::CompleteAnimDone) | Some(WorkflowEvent::LongPress)
                ));
            }
        }
    }

    #[test]
    fn start_shows_full_work_duration() {
        let rig = Rig::new(Settings::default());
        assert_eq!(rig.state(), WorkflowState::Idle);
        assert_eq!(rig.ports.calls, vec![Call::Full(Phase::Work, 1500)]);
    }

    #[test]
    fn short_press_starts_work() {
        let mut rig = Rig::new(Settings::default());
        assert_eq!(rig.send(WorkflowEvent::ShortPress), vec![WorkflowState::WorkRunning]);
        assert!(rig.ctx.running);
        assert!(rig.ports.calls.contains(&Call::Start(Phase::Work, 1500)));
        assert!(rig.ports.calls.contains(&Call::Running(1500, 1500, Phase::Work)));
    }

    #[test]
    fn pause_captures_live_remaining_and_resume_uses_it() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        rig.ports.live = Some(930);
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.state(), WorkflowState::PausedInFlight);
        assert_eq!(rig.ctx.remaining, Some(930));
        assert!(!rig.ctx.running);
        assert!(rig.ports.calls.contains(&Call::Paused(930, 1500, Phase::Work)));

        rig.ports.calls.clear();
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.state(), WorkflowState::WorkRunning);
        assert_eq!(rig.ctx.remaining, None);
        assert_eq!(
            rig.ports.calls,
            vec![Call::Start(Phase::Work, 930), Call::Running(930, 1500, Phase::Work)]
        );
    }

    #[test]
    fn timer_done_plays_completion_once() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.send(WorkflowEvent::TimerDone), vec![WorkflowState::WorkComplete]);
        assert_eq!(rig.ctx.pending_next, Some(Phase::ShortBreak));
        assert_eq!(rig.ctx.cycle_index, 1);
        let completions = rig
            .ports
            .calls
            .iter()
            .filter(|c| matches!(c, Call::Completion(..)))
            .count();
        assert_eq!(completions, 1);
        assert!(rig.ports.calls.contains(&Call::Completion(CompletionKind::Work, 3000)));

        // Gestures other than reset are ignored while effects play.
        assert!(rig.send(WorkflowEvent::ShortPress).is_empty());
        assert!(rig.send(WorkflowEvent::DoublePress).is_empty());
        assert_eq!(rig.send(WorkflowEvent::CompleteAnimDone), vec![WorkflowState::PausedNext]);
        assert!(rig.ports.calls.contains(&Call::Full(Phase::ShortBreak, 300)));
    }

    #[test]
    fn break_completion_uses_break_cue() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        rig.send(WorkflowEvent::TimerDone);
        rig.send(WorkflowEvent::CompleteAnimDone);
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.state(), WorkflowState::ShortBreakRunning);
        rig.send(WorkflowEvent::TimerDone);
        assert_eq!(rig.state(), WorkflowState::ShortBreakComplete);
        assert_eq!(rig.ctx.pending_next, Some(Phase::Work));
        assert!(rig.ports.calls.contains(&Call::Completion(CompletionKind::Break, 3000)));
    }

    #[test]
    fn skip_never_plays_completion() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.send(WorkflowEvent::DoublePress), vec![WorkflowState::PausedNext]);
        assert_eq!(rig.ctx.pending_next, Some(Phase::ShortBreak));
        assert!(!rig.ports.calls.iter().any(|c| matches!(c, Call::Completion(..))));
    }

    #[test]
    fn skip_without_pause_runs_next_phase() {
        let mut rig = Rig::new(Settings {
            pause_at_phase_boundary: false,
            ..Settings::default()
        });
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(
            rig.send(WorkflowEvent::DoublePress),
            vec![WorkflowState::ShortBreakRunning]
        );
        assert_eq!(rig.ctx.pending_next, None);
        assert_eq!(
            rig.send(WorkflowEvent::DoublePress),
            vec![WorkflowState::WorkRunning]
        );
    }

    #[test]
    fn skip_from_paused_in_flight_clears_snapshot() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        rig.send(WorkflowEvent::ShortPress);
        assert!(rig.ctx.remaining.is_some());
        rig.send(WorkflowEvent::DoublePress);
        assert_eq!(rig.state(), WorkflowState::PausedNext);
        assert_eq!(rig.ctx.remaining, None);
        assert_eq!(rig.ctx.pending_next, Some(Phase::ShortBreak));
    }

    #[test]
    fn double_press_at_boundary_skips_pending() {
        let mut rig = Rig::new(Settings {
            cycles_before_long_break: 2,
            ..Settings::default()
        });
        rig.send(WorkflowEvent::ShortPress);
        rig.send(WorkflowEvent::DoublePress);
        assert_eq!(rig.ctx.pending_next, Some(Phase::ShortBreak));
        assert_eq!(rig.ctx.cycle_index, 1);

        assert_eq!(rig.send(WorkflowEvent::DoublePress), vec![WorkflowState::PausedNext]);
        assert_eq!(rig.ctx.pending_next, Some(Phase::Work));

        rig.send(WorkflowEvent::DoublePress);
        assert_eq!(rig.ctx.pending_next, Some(Phase::LongBreak));
        assert_eq!(rig.ctx.cycle_index, 2);

        rig.send(WorkflowEvent::DoublePress);
        assert_eq!(rig.ctx.pending_next, Some(Phase::Work));
        assert_eq!(rig.ctx.cycle_index, 0);
    }

    #[test]
    fn long_break_resets_cycle_on_entry() {
        let mut rig = Rig::new(Settings {
            cycles_before_long_break: 1,
            ..Settings::default()
        });
        rig.send(WorkflowEvent::ShortPress);
        rig.send(WorkflowEvent::TimerDone);
        assert_eq!(rig.ctx.pending_next, Some(Phase::LongBreak));
        rig.send(WorkflowEvent::CompleteAnimDone);
        rig.send(WorkflowEvent::ShortPress);
        assert_eq!(rig.state(), WorkflowState::LongBreakRunning);
        assert_eq!(rig.ctx.cycle_index, 0);
    }

    #[test]
    fn reset_from_running_stops_and_flashes() {
        let mut rig = Rig::new(Settings::default());
        rig.send(WorkflowEvent::ShortPress);
        rig.ports.calls.clear();
        assert_eq!(rig.send(WorkflowEvent::LongPress), vec![WorkflowState::Idle]);
        assert_eq!(
            rig.ports.calls,
            vec![Call::Stop, Call::ResetFeedback, Call::Full(Phase::Work, 1500)]
        );
        assert!(!rig.ctx.running);
    }

    #[test]
    fn stray_timer_done_is_ignored() {
        let mut rig = Rig::new(Settings::default());
        assert!(rig.send(WorkflowEvent::TimerDone).is_empty());
        assert!(rig.send(WorkflowEvent::CompleteAnimDone).is_empty());
        rig.send(WorkflowEvent::ShortPress);
        rig.send(WorkflowEvent::ShortPress);
        assert!(rig.send(WorkflowEvent::TimerDone).is_empty());
        assert_eq!(rig.state(), WorkflowState::PausedInFlight);
    }
}

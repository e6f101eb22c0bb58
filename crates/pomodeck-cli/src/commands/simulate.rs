//! Offline replay of a gesture sequence.
//!
//! Runs the real workflow controller over in-memory ports, so the same
//! sequence always prints the same states.

use std::cell::RefCell;
use std::rc::Rc;
use std::str::FromStr;

use clap::Args;
use pomodeck_core::workflow::{Countdown, Display, Effects, PortResult, Timer, WorkflowController};
use pomodeck_core::{CompletionKind, Config, Phase, WorkflowEvent, WorkflowState};

use crate::terminal::clock;

#[derive(Args)]
pub struct SimulateArgs {
    /// Steps: short, double, long, done, anim, or wait:N (seconds)
    #[arg(required = true)]
    steps: Vec<Step>,
    /// Work sessions before a long break (overrides config)
    #[arg(long)]
    cycles: Option<u32>,
    /// Start the next phase without waiting for a press
    #[arg(long)]
    no_pause: bool,
    /// Also print every port call
    #[arg(long, short)]
    verbose: bool,
    /// Print journal events as JSON lines
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Event(WorkflowEvent),
    /// Let the live countdown run for this many seconds.
    Wait(u64),
}

impl FromStr for Step {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let event = match s {
            "short" => WorkflowEvent::ShortPress,
            "double" => WorkflowEvent::DoublePress,
            "long" => WorkflowEvent::LongPress,
            "done" => WorkflowEvent::TimerDone,
            "anim" => WorkflowEvent::CompleteAnimDone,
            other => {
                return match other.strip_prefix("wait:").map(str::parse::<u64>) {
                    Some(Ok(secs)) => Ok(Step::Wait(secs)),
                    _ => Err(format!(
                        "unknown step '{other}' (expected short, double, long, done, anim or wait:N)"
                    )),
                };
            }
        };
        Ok(Step::Event(event))
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Step::Event(WorkflowEvent::ShortPress) => f.write_str("short"),
            Step::Event(WorkflowEvent::DoublePress) => f.write_str("double"),
            Step::Event(WorkflowEvent::LongPress) => f.write_str("long"),
            Step::Event(WorkflowEvent::TimerDone) => f.write_str("done"),
            Step::Event(WorkflowEvent::CompleteAnimDone) => f.write_str("anim"),
            Step::Wait(secs) => write!(f, "wait:{secs}"),
        }
    }
}

type Log = Rc<RefCell<Vec<String>>>;
type Clock = Rc<RefCell<Option<Countdown>>>;

struct SimDisplay(Log);

impl Display for SimDisplay {
    fn show_full(&mut self, phase: Phase, total_secs: u64) -> PortResult {
        self.0
            .borrow_mut()
            .push(format!("display: {} {} ready", phase.label(), clock(total_secs)));
        Ok(())
    }

    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult {
        self.0.borrow_mut().push(format!(
            "display: {} {} / {}",
            phase.label(),
            clock(remaining_secs),
            clock(total_secs)
        ));
        Ok(())
    }

    fn show_paused(&mut self, remaining_secs: u64, _total_secs: u64, phase: Phase) -> PortResult {
        self.0.borrow_mut().push(format!(
            "display: {} {} paused",
            phase.label(),
            clock(remaining_secs)
        ));
        Ok(())
    }
}

struct SimTimer {
    log: Log,
    clock: Clock,
}

impl Timer for SimTimer {
    fn start_timer(&mut self, phase: Phase, duration_secs: u64) -> PortResult {
        self.log
            .borrow_mut()
            .push(format!("timer: start {} {duration_secs}s", phase.label()));
        *self.clock.borrow_mut() = Some(Countdown {
            phase,
            remaining_secs: duration_secs,
        });
        Ok(())
    }

    fn stop_timer(&mut self) -> PortResult {
        if self.clock.borrow_mut().take().is_some() {
            self.log.borrow_mut().push("timer: stop".to_string());
        }
        Ok(())
    }

    fn status(&self) -> Option<Countdown> {
        *self.clock.borrow()
    }
}

struct SimEffects(Log);

impl Effects for SimEffects {
    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) -> PortResult {
        let kind = match kind {
            CompletionKind::Work => "work",
            CompletionKind::Break => "break",
        };
        self.0
            .borrow_mut()
            .push(format!("effects: {kind} completion, hold {hold_ms}ms"));
        Ok(())
    }

    fn show_reset_feedback(&mut self) -> PortResult {
        self.0.borrow_mut().push("effects: reset".to_string());
        Ok(())
    }
}

fn state_name(state: WorkflowState) -> String {
    serde_json::to_value(state)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| format!("{state:?}"))
}

pub fn run(args: SimulateArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = Config::load()?.timer;
    if let Some(cycles) = args.cycles {
        settings.cycles_before_long_break = cycles;
    }
    if args.no_pause {
        settings.pause_at_phase_boundary = false;
    }

    let log = Log::default();
    let clock_state = Clock::default();
    let mut controller = WorkflowController::new(
        settings,
        SimDisplay(log.clone()),
        SimTimer {
            log: log.clone(),
            clock: clock_state.clone(),
        },
        SimEffects(log.clone()),
    )?;

    let emit = |controller: &mut WorkflowController<_, _, _>, label: &str, detail: String| {
        if args.json {
            for event in controller.drain_events() {
                println!("{}", serde_json::to_string(&event)?);
            }
        } else {
            println!("{label:<10} {detail}");
            if args.verbose {
                for call in log.borrow().iter() {
                    println!("           {call}");
                }
            }
        }
        log.borrow_mut().clear();
        Ok::<_, serde_json::Error>(())
    };

    let initial = state_name(controller.state());
    emit(&mut controller, "start", initial)?;

    for step in &args.steps {
        let detail = match *step {
            Step::Event(event) => {
                let path = controller.dispatch(event);
                if path.is_empty() {
                    format!("(ignored in {})", state_name(controller.state()))
                } else {
                    path.into_iter()
                        .map(state_name)
                        .collect::<Vec<_>>()
                        .join(" -> ")
                }
            }
            Step::Wait(secs) => {
                let live = *clock_state.borrow();
                match live {
                    Some(live) if controller.state().is_running() => {
                        let left = live.remaining_secs.saturating_sub(secs);
                        if let Some(countdown) = clock_state.borrow_mut().as_mut() {
                            countdown.remaining_secs = left;
                        }
                        controller.tick(left);
                        if left == 0 {
                            let path = controller.dispatch(WorkflowEvent::TimerDone);
                            let states: Vec<_> = path.into_iter().map(state_name).collect();
                            format!("{} left -> {}", clock(left), states.join(" -> "))
                        } else {
                            format!("{} left", clock(left))
                        }
                    }
                    _ => "(no countdown running)".to_string(),
                }
            }
        };
        emit(&mut controller, &step.to_string(), detail)?;
    }

    if !args.json {
        let ctx = controller.context();
        println!(
            "final      {} phase={} cycle={}",
            state_name(controller.state()),
            ctx.phase.label(),
            ctx.cycle_index
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_steps() {
        assert_eq!("short".parse::<Step>(), Ok(Step::Event(WorkflowEvent::ShortPress)));
        assert_eq!("anim".parse::<Step>(), Ok(Step::Event(WorkflowEvent::CompleteAnimDone)));
        assert_eq!("wait:570".parse::<Step>(), Ok(Step::Wait(570)));
        assert!("wait:soon".parse::<Step>().is_err());
        assert!("press".parse::<Step>().is_err());
    }

    #[test]
    fn steps_print_as_parsed() {
        for text in ["short", "double", "long", "done", "anim", "wait:3"] {
            assert_eq!(text.parse::<Step>().unwrap().to_string(), text);
        }
    }
}

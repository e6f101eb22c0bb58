//! Guard predicates over the runtime context.
//!
//! All guards are pure and cheap; the transition table references them by
//! function pointer.

use super::context::RuntimeContext;
use super::phase::Phase;

/// Finishing the current work session would reach the long-break cycle.
pub fn long_break_due(ctx: &RuntimeContext) -> bool {
    ctx.cycle_index.saturating_add(1) >= ctx.cycles_before_long_break()
}

/// Wait for a press at every phase boundary.
pub fn pause_at_boundary(ctx: &RuntimeContext) -> bool {
    ctx.settings.pause_at_phase_boundary
}

pub fn in_work(ctx: &RuntimeContext) -> bool {
    ctx.phase == Phase::Work
}

pub fn in_short_break(ctx: &RuntimeContext) -> bool {
    ctx.phase == Phase::ShortBreak
}

/// Skipping out of the current work phase lands on a long break.
pub fn in_work_long_break_due(ctx: &RuntimeContext) -> bool {
    in_work(ctx) && long_break_due(ctx)
}

pub fn pending_work(ctx: &RuntimeContext) -> bool {
    ctx.pending_next == Some(Phase::Work)
}

pub fn pending_short_break(ctx: &RuntimeContext) -> bool {
    ctx.pending_next == Some(Phase::ShortBreak)
}

pub fn pending_long_break(ctx: &RuntimeContext) -> bool {
    ctx.pending_next == Some(Phase::LongBreak)
}

/// Skipping over a pending work phase lands on a long break.
pub fn pending_work_long_break_due(ctx: &RuntimeContext) -> bool {
    pending_work(ctx) && long_break_due(ctx)
}

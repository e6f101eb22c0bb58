//! Generic table-driven state machine.
//!
//! The machine holds only the active state key. Context lives outside and is
//! passed into every call, and actions are opaque values handed to an
//! [`Executor`], so the same engine can drive any transition table.
//!
//! ## Evaluation order
//!
//! ```text
//! dispatch(event)
//!   -> first transition on (state, event) whose guard passes
//!   -> run transition actions
//!   -> enter target: run entry actions
//!   -> resolve `always` transitions until none passes
//! ```
//!
//! Guards are evaluated against the context as it is *before* the
//! transition's actions run.

use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

use crate::error::MachineError;

/// Upper bound on chained `always` transitions in a single settle.
pub const MAX_ALWAYS_HOPS: usize = 32;

/// Pure predicate over the context.
pub type Guard<C> = fn(&C) -> bool;

/// Runs actions against the outside world.
pub trait Executor<C, A> {
    fn execute(&mut self, action: &A, ctx: &mut C);
}

/// A guarded edge to `target`, carrying the actions to run on the way.
#[derive(Debug, Clone)]
pub struct Transition<S, C, A> {
    pub guard: Option<Guard<C>>,
    pub actions: Vec<A>,
    pub target: S,
}

impl<S, C, A> Transition<S, C, A> {
    pub fn to(target: S) -> Self {
        Self {
            guard: None,
            actions: Vec::new(),
            target,
        }
    }

    pub fn when(mut self, guard: Guard<C>) -> Self {
        self.guard = Some(guard);
        self
    }

    pub fn run(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.actions.extend(actions);
        self
    }

    pub fn allows(&self, ctx: &C) -> bool {
        self.guard.map_or(true, |guard| guard(ctx))
    }
}

/// One row of the table: what happens on entry, instantly, and per event.
#[derive(Debug, Clone)]
pub struct StateNode<S, E, C, A> {
    pub entry: Vec<A>,
    pub always: Vec<Transition<S, C, A>>,
    pub on: HashMap<E, Vec<Transition<S, C, A>>>,
}

impl<S, E: Eq + Hash, C, A> Default for StateNode<S, E, C, A> {
    fn default() -> Self {
        Self {
            entry: Vec::new(),
            always: Vec::new(),
            on: HashMap::new(),
        }
    }
}

impl<S, E: Eq + Hash, C, A> StateNode<S, E, C, A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(mut self, actions: impl IntoIterator<Item = A>) -> Self {
        self.entry.extend(actions);
        self
    }

    pub fn always(mut self, transition: Transition<S, C, A>) -> Self {
        self.always.push(transition);
        self
    }

    /// Append a transition for `event`; earlier ones take precedence.
    pub fn on(mut self, event: E, transition: Transition<S, C, A>) -> Self {
        self.on.entry(event).or_default().push(transition);
        self
    }
}

/// Interpreter over a validated table.
#[derive(Debug, Clone)]
pub struct Machine<S, E, C, A> {
    nodes: HashMap<S, StateNode<S, E, C, A>>,
    initial: S,
    current: S,
}

impl<S, E, C, A> Machine<S, E, C, A>
where
    S: Copy + Eq + Hash + Debug,
    E: Copy + Eq + Hash + Debug,
{
    /// Build a machine, checking that every target names a known state.
    pub fn new(initial: S, nodes: HashMap<S, StateNode<S, E, C, A>>) -> Result<Self, MachineError> {
        if !nodes.contains_key(&initial) {
            return Err(MachineError::MissingState(format!("{initial:?}")));
        }
        for (state, node) in &nodes {
            let targets = node
                .always
                .iter()
                .chain(node.on.values().flatten())
                .map(|t| t.target);
            for target in targets {
                if !nodes.contains_key(&target) {
                    return Err(MachineError::UnknownState {
                        from: format!("{state:?}"),
                        target: format!("{target:?}"),
                    });
                }
            }
        }
        Ok(Self {
            nodes,
            initial,
            current: initial,
        })
    }

    pub fn current(&self) -> S {
        self.current
    }

    /// Every transition in the table as `(from, event, transition)`; `event`
    /// is `None` for `always` transitions.
    pub fn transitions(&self) -> impl Iterator<Item = (S, Option<E>, &Transition<S, C, A>)> {
        self.nodes.iter().flat_map(|(state, node)| {
            let always = node.always.iter().map(move |t| (*state, None, t));
            let on = node
                .on
                .iter()
                .flat_map(move |(event, ts)| ts.iter().map(move |t| (*state, Some(*event), t)));
            always.chain(on)
        })
    }

    /// Enter the initial state, running its entry actions.
    ///
    /// Returns the states entered, in order.
    pub fn start<X: Executor<C, A>>(&mut self, ctx: &mut C, exec: &mut X) -> Vec<S> {
        let mut path = Vec::new();
        self.enter(self.initial, ctx, exec, &mut path);
        self.settle(ctx, exec, &mut path);
        path
    }

    /// Make `state` active without running any actions.
    pub fn restore(&mut self, state: S) -> Result<(), MachineError> {
        if !self.nodes.contains_key(&state) {
            return Err(MachineError::MissingState(format!("{state:?}")));
        }
        self.current = state;
        Ok(())
    }

    /// Whether some transition on `event` would fire right now.
    pub fn accepts(&self, event: E, ctx: &C) -> bool {
        self.find(event, ctx).is_some()
    }

    /// Feed one event and run to quiescence.
    ///
    /// Returns the states entered, in order; empty when no transition
    /// matched and the event was ignored.
    pub fn dispatch<X: Executor<C, A>>(&mut self, event: E, ctx: &mut C, exec: &mut X) -> Vec<S> {
        let mut path = Vec::new();
        let Some(transition) = self.find(event, ctx) else {
            tracing::trace!(state = ?self.current, event = ?event, "event ignored");
            return path;
        };
        for action in &transition.actions {
            exec.execute(action, ctx);
        }
        let target = transition.target;
        self.enter(target, ctx, exec, &mut path);
        self.settle(ctx, exec, &mut path);
        path
    }

    fn find(&self, event: E, ctx: &C) -> Option<&Transition<S, C, A>> {
        self.nodes
            .get(&self.current)?
            .on
            .get(&event)?
            .iter()
            .find(|t| t.allows(ctx))
    }

    fn enter<X: Executor<C, A>>(&mut self, target: S, ctx: &mut C, exec: &mut X, path: &mut Vec<S>) {
        self.current = target;
        path.push(target);
        if let Some(node) = self.nodes.get(&target) {
            for action in &node.entry {
                exec.execute(action, ctx);
            }
        }
    }

    fn settle<X: Executor<C, A>>(&mut self, ctx: &mut C, exec: &mut X, path: &mut Vec<S>) {
        for _ in 0..MAX_ALWAYS_HOPS {
            let next = self
                .nodes
                .get(&self.current)
                .and_then(|node| node.always.iter().find(|t| t.allows(ctx)));
            let Some(transition) = next else {
                return;
            };
            for action in &transition.actions {
                exec.execute(action, ctx);
            }
            let target = transition.target;
            self.enter(target, ctx, exec, path);
        }
        tracing::warn!(
            state = ?self.current,
            hops = MAX_ALWAYS_HOPS,
            "always transitions did not settle; stopping"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Door {
        Closed,
        Open,
        Locked,
        Alarm,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Input {
        Push,
        Lock,
        Kick,
    }

    #[derive(Debug, Default)]
    struct Ctx {
        has_key: bool,
        kicks: u32,
        log: Vec<&'static str>,
    }

    #[derive(Debug, Clone, Copy)]
    enum Act {
        Log(&'static str),
        Kick,
    }

    struct Exec;

    impl Executor<Ctx, Act> for Exec {
        fn execute(&mut self, action: &Act, ctx: &mut Ctx) {
            match action {
                Act::Log(msg) => ctx.log.push(msg),
                Act::Kick => ctx.kicks += 1,
            }
        }
    }

    fn has_key(ctx: &Ctx) -> bool {
        ctx.has_key
    }

    fn kicked_twice(ctx: &Ctx) -> bool {
        ctx.kicks >= 2
    }

    fn door() -> Machine<Door, Input, Ctx, Act> {
        let mut nodes = HashMap::new();
        nodes.insert(
            Door::Closed,
            StateNode::new()
                .entry([Act::Log("closed")])
                .on(Input::Push, Transition::to(Door::Open).run([Act::Log("creak")]))
                .on(Input::Lock, Transition::to(Door::Locked).when(has_key))
                .on(Input::Kick, Transition::to(Door::Closed).run([Act::Kick])),
        );
        nodes.insert(
            Door::Open,
            StateNode::new()
                .entry([Act::Log("open")])
                .on(Input::Push, Transition::to(Door::Closed)),
        );
        // Two kicks on a locked door trip the alarm without another event.
        nodes.insert(
            Door::Locked,
            StateNode::new()
                .entry([Act::Log("locked")])
                .always(Transition::to(Door::Alarm).when(kicked_twice))
                .on(Input::Kick, Transition::to(Door::Locked).run([Act::Kick])),
        );
        nodes.insert(Door::Alarm, StateNode::new().entry([Act::Log("alarm")]));
        Machine::new(Door::Closed, nodes).unwrap()
    }

    #[test]
    fn start_enters_initial_state() {
        let mut m = door();
        let mut ctx = Ctx::default();
        assert_eq!(m.start(&mut ctx, &mut Exec), vec![Door::Closed]);
        assert_eq!(ctx.log, vec!["closed"]);
    }

    #[test]
    fn transition_actions_run_before_entry() {
        let mut m = door();
        let mut ctx = Ctx::default();
        m.start(&mut ctx, &mut Exec);
        assert_eq!(m.dispatch(Input::Push, &mut ctx, &mut Exec), vec![Door::Open]);
        assert_eq!(ctx.log, vec!["closed", "creak", "open"]);
    }

    #[test]
    fn unmatched_event_is_ignored() {
        let mut m = door();
        let mut ctx = Ctx::default();
        m.start(&mut ctx, &mut Exec);
        m.dispatch(Input::Push, &mut ctx, &mut Exec);
        assert!(m.dispatch(Input::Lock, &mut ctx, &mut Exec).is_empty());
        assert_eq!(m.current(), Door::Open);
    }

    #[test]
    fn failing_guard_blocks_transition() {
        let mut m = door();
        let mut ctx = Ctx::default();
        m.start(&mut ctx, &mut Exec);
        assert!(!m.accepts(Input::Lock, &ctx));
        assert!(m.dispatch(Input::Lock, &mut ctx, &mut Exec).is_empty());
        ctx.has_key = true;
        assert_eq!(m.dispatch(Input::Lock, &mut ctx, &mut Exec), vec![Door::Locked]);
    }

    #[test]
    fn self_transition_reenters() {
        let mut m = door();
        let mut ctx = Ctx::default();
        m.start(&mut ctx, &mut Exec);
        assert_eq!(m.dispatch(Input::Kick, &mut ctx, &mut Exec), vec![Door::Closed]);
        assert_eq!(ctx.log, vec!["closed", "closed"]);
    }

    #[test]
    fn always_resolves_within_the_same_dispatch() {
        let mut m = door();
        let mut ctx = Ctx {
            has_key: true,
            ..Ctx::default()
        };
        m.start(&mut ctx, &mut Exec);
        m.dispatch(Input::Lock, &mut ctx, &mut Exec);
        m.dispatch(Input::Kick, &mut ctx, &mut Exec);
        assert_eq!(m.current(), Door::Locked);
        let path = m.dispatch(Input::Kick, &mut ctx, &mut Exec);
        assert_eq!(path, vec![Door::Locked, Door::Alarm]);
        assert_eq!(m.current(), Door::Alarm);
    }

    #[test]
    fn always_loops_are_bounded() {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        enum S {
            A,
            B,
        }
        let mut nodes: HashMap<S, StateNode<S, Input, Ctx, Act>> = HashMap::new();
        nodes.insert(S::A, StateNode::new().always(Transition::to(S::B)));
        nodes.insert(S::B, StateNode::new().always(Transition::to(S::A)));
        let mut m = Machine::new(S::A, nodes).unwrap();
        let path = m.start(&mut Ctx::default(), &mut Exec);
        assert_eq!(path.len(), MAX_ALWAYS_HOPS + 1);
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut nodes: HashMap<Door, StateNode<Door, Input, Ctx, Act>> = HashMap::new();
        nodes.insert(
            Door::Closed,
            StateNode::new().on(Input::Push, Transition::to(Door::Open)),
        );
        let err = Machine::new(Door::Closed, nodes).unwrap_err();
        assert_eq!(
            err,
            MachineError::UnknownState {
                from: "Closed".into(),
                target: "Open".into()
            }
        );
    }

    #[test]
    fn missing_initial_is_rejected() {
        let nodes: HashMap<Door, StateNode<Door, Input, Ctx, Act>> = HashMap::new();
        assert_eq!(
            Machine::new(Door::Open, nodes).unwrap_err(),
            MachineError::MissingState("Open".into())
        );
    }

    #[test]
    fn restore_skips_entry_actions() {
        let mut m = door();
        let mut ctx = Ctx::default();
        m.restore(Door::Open).unwrap();
        assert_eq!(m.current(), Door::Open);
        assert!(ctx.log.is_empty());
        m.dispatch(Input::Push, &mut ctx, &mut Exec);
        assert_eq!(ctx.log, vec!["closed"]);
    }

    #[test]
    fn transitions_are_enumerable() {
        let m = door();
        let count = m.transitions().count();
        assert_eq!(count, 6);
        assert!(m
            .transitions()
            .any(|(from, event, t)| from == Door::Locked && event.is_none() && t.target == Door::Alarm));
    }
}

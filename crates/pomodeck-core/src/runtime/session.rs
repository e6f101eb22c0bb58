use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace};

use super::effects::{Animator, Chime, TaskEffects};
use super::timer::{TickTimer, DEFAULT_TICK};
use super::{Gesture, Signal};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::storage::Settings;
use crate::workflow::{Display, Snapshot, WorkflowController, WorkflowEvent};

/// Cloneable sender side of a session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    tx: mpsc::UnboundedSender<Signal>,
}

impl SessionHandle {
    pub fn send(&self, signal: Signal) -> Result<()> {
        self.tx.send(signal).map_err(|_| CoreError::SessionClosed)
    }

    pub fn press(&self, gesture: Gesture) -> Result<()> {
        self.send(Signal::Press(gesture))
    }

    pub fn update_settings(&self, settings: Settings) -> Result<()> {
        self.send(Signal::Settings(Box::new(settings)))
    }

    pub fn appear(&self) -> Result<()> {
        self.send(Signal::Appear)
    }

    pub fn disappear(&self) -> Result<()> {
        self.send(Signal::Disappear)
    }

    pub async fn snapshot(&self) -> Result<Snapshot> {
        let (reply, rx) = oneshot::channel();
        self.send(Signal::Snapshot(reply))?;
        rx.await.map_err(|_| CoreError::SessionClosed)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(Signal::Shutdown)
    }
}

/// The controller a session drives: tokio-backed timer and effects ports.
pub type SessionController<D, A, C> = WorkflowController<D, TickTimer, TaskEffects<A, C>>;

/// The single consumer of a control surface's signal queue.
pub struct Session<D, A, C> {
    controller: SessionController<D, A, C>,
    rx: mpsc::UnboundedReceiver<Signal>,
    events: Option<mpsc::UnboundedSender<Event>>,
}

impl<D, A, C> Session<D, A, C>
where
    D: Display,
    A: Animator,
    C: Chime,
{
    pub fn new(settings: Settings, display: D, animator: A, chime: C) -> Result<(Self, SessionHandle)> {
        Self::with_tick(settings, display, animator, chime, DEFAULT_TICK)
    }

    /// Like [`Session::new`], with a custom length for one countdown second.
    pub fn with_tick(
        settings: Settings,
        display: D,
        animator: A,
        chime: C,
        tick: Duration,
    ) -> Result<(Self, SessionHandle)> {
        let (tx, rx) = mpsc::unbounded_channel();
        let timer = TickTimer::new(tx.clone()).with_tick(tick);
        let effects = TaskEffects::new(tx.clone(), animator, chime);
        let controller = WorkflowController::new(settings, display, timer, effects)?;
        let session = Self {
            controller,
            rx,
            events: None,
        };
        Ok((session, SessionHandle { tx }))
    }

    /// Forward journal events to `sink` as they happen.
    pub fn with_events(mut self, sink: mpsc::UnboundedSender<Event>) -> Self {
        self.events = Some(sink);
        self
    }

    pub fn controller(&self) -> &SessionController<D, A, C> {
        &self.controller
    }

    /// Process signals until `Shutdown`, then stop any countdown.
    pub async fn run(mut self) -> SessionController<D, A, C> {
        info!(state = ?self.controller.state(), "session started");
        self.flush();
        while let Some(signal) = self.rx.recv().await {
            if matches!(signal, Signal::Shutdown) {
                break;
            }
            self.handle(signal);
            self.flush();
        }
        self.controller.shutdown();
        self.flush();
        info!("session stopped");
        self.controller
    }

    fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::Press(gesture) => {
                self.controller.dispatch(gesture.into());
            }
            Signal::Tick {
                token,
                remaining_secs,
            } => {
                if self.controller.timer().is_current(token) {
                    self.controller.tick(remaining_secs);
                } else {
                    trace!(token, "stale tick dropped");
                }
            }
            Signal::TimerDone { token } => {
                if self.controller.timer().is_current(token) {
                    self.controller.dispatch(WorkflowEvent::TimerDone);
                } else {
                    debug!(token, "stale countdown completion dropped");
                }
            }
            Signal::EffectsDone { token } => {
                if self.controller.effects().is_current(token) {
                    self.controller.dispatch(WorkflowEvent::CompleteAnimDone);
                } else {
                    debug!(token, "stale effects completion dropped");
                }
            }
            Signal::Settings(settings) => self.controller.update_settings(*settings),
            Signal::Appear => {
                self.controller.appear();
            }
            Signal::Disappear => self.controller.disappear(),
            Signal::Snapshot(reply) => {
                let _ = reply.send(self.controller.snapshot());
            }
            Signal::Shutdown => {}
        }
    }

    fn flush(&mut self) {
        let events = self.controller.drain_events();
        let closed = match &self.events {
            Some(sink) => events.into_iter().any(|event| sink.send(event).is_err()),
            None => false,
        };
        if closed {
            debug!("event sink closed");
            self.events = None;
        }
    }
}

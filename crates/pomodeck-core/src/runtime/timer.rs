use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, trace};

use super::Signal;
use crate::error::PortError;
use crate::workflow::{Countdown, Phase, PortResult, Timer};

/// Length of one countdown second.
pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

struct Live {
    phase: Phase,
    remaining: Arc<AtomicU64>,
    handle: JoinHandle<()>,
}

/// Countdown port backed by a tokio task per run.
///
/// Each run posts one `Tick` per elapsed second and then exactly one
/// `TimerDone`. Starting or stopping bumps the token, which is how the
/// session recognizes signals from a run that no longer exists.
pub struct TickTimer {
    tx: UnboundedSender<Signal>,
    tick: Duration,
    token: u64,
    live: Option<Live>,
}

impl TickTimer {
    pub fn new(tx: UnboundedSender<Signal>) -> Self {
        Self {
            tx,
            tick: DEFAULT_TICK,
            token: 0,
            live: None,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Whether `token` belongs to the countdown that is ticking now.
    pub fn is_current(&self, token: u64) -> bool {
        self.live.is_some() && self.token == token
    }

    fn cancel(&mut self) {
        if let Some(live) = self.live.take() {
            live.handle.abort();
            trace!(token = self.token, "countdown cancelled");
        }
        self.token += 1;
    }
}

impl Timer for TickTimer {
    fn start_timer(&mut self, phase: Phase, duration_secs: u64) -> PortResult {
        self.cancel();
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PortError::Unavailable { port: "timer" })?;

        let token = self.token;
        let remaining = Arc::new(AtomicU64::new(duration_secs));
        let counter = Arc::clone(&remaining);
        let tx = self.tx.clone();
        let tick = self.tick;

        let handle = runtime.spawn(async move {
            let mut interval = interval_at(Instant::now() + tick, tick);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let left = counter.load(Ordering::Acquire).saturating_sub(1);
                counter.store(left, Ordering::Release);
                if tx.send(Signal::Tick { token, remaining_secs: left }).is_err() {
                    return;
                }
                if left == 0 {
                    let _ = tx.send(Signal::TimerDone { token });
                    return;
                }
            }
        });

        debug!(phase = %phase, secs = duration_secs, token, "countdown started");
        self.live = Some(Live {
            phase,
            remaining,
            handle,
        });
        Ok(())
    }

    fn stop_timer(&mut self) -> PortResult {
        self.cancel();
        Ok(())
    }

    fn status(&self) -> Option<Countdown> {
        self.live.as_ref().map(|live| Countdown {
            phase: live.phase,
            remaining_secs: live.remaining.load(Ordering::Acquire),
        })
    }
}

impl Drop for TickTimer {
    fn drop(&mut self) {
        if let Some(live) = self.live.take() {
            live.handle.abort();
        }
    }
}

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::{sleep, Instant};
use tracing::{debug, warn};

use super::Signal;
use crate::error::PortError;
use crate::storage::Settings;
use crate::workflow::{CompletionKind, Effects, PortResult};

const FRAME: Duration = Duration::from_millis(100);

/// Draws completion and reset feedback.
pub trait Animator: Send + Sync + 'static {
    /// One frame of the completion animation. `progress` runs from 0.0 on
    /// the first frame to 1.0 once the hold has passed.
    fn completion_frame(&self, kind: CompletionKind, progress: f32);
    fn reset_frame(&self);
}

/// What to play.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cue {
    Completion {
        kind: CompletionKind,
        file: Option<String>,
    },
    Reset,
}

/// Plays a sound, blocking until it has finished.
pub trait Chime: Send + Sync + 'static {
    fn play(&self, cue: &Cue) -> Result<(), PortError>;
}

#[derive(Debug, Clone, Default)]
struct SoundPrefs {
    enabled: bool,
    work: Option<String>,
    brk: Option<String>,
}

impl SoundPrefs {
    fn completion(&self, kind: CompletionKind) -> Option<Cue> {
        if !self.enabled {
            return None;
        }
        let file = match kind {
            CompletionKind::Work => self.work.clone(),
            CompletionKind::Break => self.brk.clone(),
        };
        Some(Cue::Completion { kind, file })
    }
}

/// Effects port running animation and sound as tokio tasks.
///
/// The completion animation lasts at least the hold; the sound plays on the
/// blocking pool until it ends. Both are awaited before a single
/// `EffectsDone` is posted, so the hold stretches to the longer of the two.
/// Once started, a completion always plays out; a reset only retires its
/// token so the late `EffectsDone` is dropped.
pub struct TaskEffects<A, C> {
    tx: UnboundedSender<Signal>,
    animator: Arc<A>,
    chime: Arc<C>,
    sound: SoundPrefs,
    token: u64,
}

impl<A: Animator, C: Chime> TaskEffects<A, C> {
    pub fn new(tx: UnboundedSender<Signal>, animator: A, chime: C) -> Self {
        Self {
            tx,
            animator: Arc::new(animator),
            chime: Arc::new(chime),
            sound: SoundPrefs {
                enabled: true,
                ..SoundPrefs::default()
            },
            token: 0,
        }
    }

    /// Whether `token` belongs to the latest completion effect.
    pub fn is_current(&self, token: u64) -> bool {
        self.token == token
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn chime(&self) -> &C {
        &self.chime
    }
}

impl<A: Animator, C: Chime> Effects for TaskEffects<A, C> {
    fn show_completion_with_sound(&mut self, kind: CompletionKind, hold_ms: u64) -> PortResult {
        if self.tx.is_closed() {
            return Err(PortError::Unavailable { port: "effects" });
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|_| PortError::Unavailable { port: "effects" })?;

        self.token += 1;
        let token = self.token;
        let tx = self.tx.clone();
        let animator = Arc::clone(&self.animator);
        let chime = Arc::clone(&self.chime);
        let cue = self.sound.completion(kind);
        let hold = Duration::from_millis(hold_ms);

        runtime.spawn(async move {
            let animation = async move {
                animator.completion_frame(kind, 0.0);
                let start = Instant::now();
                while start.elapsed() < hold {
                    sleep(FRAME.min(hold.saturating_sub(start.elapsed()))).await;
                    let progress = start.elapsed().as_secs_f32() / hold.as_secs_f32();
                    animator.completion_frame(kind, progress.min(1.0));
                }
            };
            let sound = async move {
                let Some(cue) = cue else {
                    return;
                };
                match tokio::task::spawn_blocking(move || chime.play(&cue)).await {
                    Ok(Ok(())) => {}
                    Ok(Err(err)) => warn!(error = %err, "completion sound failed"),
                    Err(err) => warn!(error = %err, "completion sound task aborted"),
                }
            };
            tokio::join!(animation, sound);
            let _ = tx.send(Signal::EffectsDone { token });
        });

        debug!(?kind, hold_ms, token, "completion effects started");
        Ok(())
    }

    fn show_reset_feedback(&mut self) -> PortResult {
        self.token += 1;
        self.animator.reset_frame();

        if self.sound.enabled {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|_| PortError::Unavailable { port: "effects" })?;
            let chime = Arc::clone(&self.chime);
            runtime.spawn_blocking(move || {
                if let Err(err) = chime.play(&Cue::Reset) {
                    warn!(error = %err, "reset sound failed");
                }
            });
        }
        Ok(())
    }

    fn settings_changed(&mut self, settings: &Settings) {
        self.sound = SoundPrefs {
            enabled: settings.sound_enabled,
            work: settings.work_sound.clone(),
            brk: settings.break_sound.clone(),
        };
    }
}

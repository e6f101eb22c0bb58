//! Terminal rendering of the control surface.

use std::io::Write;
use std::time::Duration;

use pomodeck_core::error::PortError;
use pomodeck_core::runtime::{Animator, Chime, Cue};
use pomodeck_core::storage::TerminalConfig;
use pomodeck_core::workflow::{Display, PortResult};
use pomodeck_core::{CompletionKind, Phase};
use tracing::debug;

/// Which stream a surface writes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Out {
    Stdout,
    Stderr,
}

impl Out {
    fn line(self, text: &str) -> PortResult {
        let result = match self {
            Out::Stdout => writeln!(std::io::stdout(), "{text}"),
            Out::Stderr => writeln!(std::io::stderr(), "{text}"),
        };
        result.map_err(|e| PortError::failed("display", e.to_string()))
    }
}

/// `mm:ss`; minutes grow past 59 rather than rolling into hours.
pub fn clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Progress bar filled by elapsed time.
pub fn bar(remaining: u64, total: u64, width: u32, ascii: bool) -> String {
    let width = u64::from(width.max(1));
    let filled = if total == 0 {
        width
    } else {
        let elapsed = total - remaining.min(total);
        (elapsed * width + total / 2) / total
    };
    let (on, off) = if ascii { ('#', '-') } else { ('█', '░') };
    (0..width)
        .map(|i| if i < filled { on } else { off })
        .collect()
}

pub struct TerminalDisplay {
    out: Out,
    width: u32,
    ascii: bool,
    last: Option<String>,
}

impl TerminalDisplay {
    pub fn new(config: &TerminalConfig, out: Out) -> Self {
        Self {
            out,
            width: config.bar_width,
            ascii: config.ascii,
            last: None,
        }
    }

    fn draw(&mut self, text: String) -> PortResult {
        if self.last.as_deref() == Some(text.as_str()) {
            return Ok(());
        }
        self.out.line(&text)?;
        self.last = Some(text);
        Ok(())
    }
}

impl Display for TerminalDisplay {
    fn show_full(&mut self, phase: Phase, total_secs: u64) -> PortResult {
        let bar = bar(total_secs, total_secs, self.width, self.ascii);
        self.draw(format!("{:<11} {bar} {}  ready", phase.label(), clock(total_secs)))
    }

    fn update_running(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult {
        let bar = bar(remaining_secs, total_secs, self.width, self.ascii);
        self.draw(format!(
            "{:<11} {bar} {} / {}",
            phase.label(),
            clock(remaining_secs),
            clock(total_secs)
        ))
    }

    fn show_paused(&mut self, remaining_secs: u64, total_secs: u64, phase: Phase) -> PortResult {
        let bar = bar(remaining_secs, total_secs, self.width, self.ascii);
        self.draw(format!(
            "{:<11} {bar} {}  paused",
            phase.label(),
            clock(remaining_secs)
        ))
    }
}

pub struct TerminalAnimator {
    out: Out,
}

impl TerminalAnimator {
    pub fn new(out: Out) -> Self {
        Self { out }
    }
}

impl Animator for TerminalAnimator {
    fn completion_frame(&self, kind: CompletionKind, progress: f32) {
        if progress > 0.0 {
            return;
        }
        let text = match kind {
            CompletionKind::Work => "*** work complete ***",
            CompletionKind::Break => "*** break over ***",
        };
        let _ = self.out.line(text);
    }

    fn reset_frame(&self) {
        let _ = self.out.line("--- reset ---");
    }
}

/// Rings the terminal bell. Sound files are not decoded.
pub struct TerminalChime;

impl TerminalChime {
    fn ring(&self) -> Result<(), PortError> {
        let mut err = std::io::stderr();
        err.write_all(b"\x07")
            .and_then(|_| err.flush())
            .map_err(|e| PortError::failed("effects", e.to_string()))
    }
}

impl Chime for TerminalChime {
    fn play(&self, cue: &Cue) -> Result<(), PortError> {
        match cue {
            Cue::Completion { file, .. } => {
                if let Some(file) = file {
                    debug!(file = %file, "sound files are not decoded; ringing the bell");
                }
                self.ring()
            }
            Cue::Reset => {
                self.ring()?;
                std::thread::sleep(Duration::from_millis(150));
                self.ring()
            }
        }
    }
}

//! Interactive session on stdin.
//!
//! Each input line is one command:
//!
//! | key | action          |
//! |-----|-----------------|
//! | `s` | short press     |
//! | `d` | double press    |
//! | `l` | long press      |
//! | `h` | hide surface    |
//! | `v` | show surface    |
//! | `?` | print snapshot  |
//! | `r` | reload config   |
//! | `q` | quit            |

use std::time::Duration;

use pomodeck_core::{Config, Gesture, Session};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::info;

use crate::terminal::{Out, TerminalAnimator, TerminalChime, TerminalDisplay};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Press(Gesture),
    Hide,
    Show,
    Status,
    Reload,
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let input = match line {
        "s" => Input::Press(Gesture::Short),
        "d" => Input::Press(Gesture::Double),
        "l" => Input::Press(Gesture::Long),
        "h" => Input::Hide,
        "v" => Input::Show,
        "?" => Input::Status,
        "r" => Input::Reload,
        "q" => Input::Quit,
        _ => return None,
    };
    Some(input)
}

pub fn run(json: bool, tick_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(interactive(config, json, Duration::from_millis(tick_ms.max(1))));
    // A pending stdin read must not hold the process open.
    runtime.shutdown_timeout(Duration::from_millis(100));
    result
}

async fn interactive(
    config: Config,
    json: bool,
    tick: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let out = if json { Out::Stderr } else { Out::Stdout };
    let (session, handle) = Session::with_tick(
        config.timer.clone(),
        TerminalDisplay::new(&config.terminal, out),
        TerminalAnimator::new(out),
        TerminalChime,
        tick,
    )?;

    let (sink, mut events) = mpsc::unbounded_channel();
    let session = tokio::spawn(session.with_events(sink).run());
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            if json {
                match serde_json::to_string(&event) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!(error = %e, "could not encode event"),
                }
            }
        }
    });

    if !json {
        println!("keys: s short, d double, l long, h hide, v show, ? status, r reload, q quit");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match parse_input(line) {
            Some(Input::Press(gesture)) => handle.press(gesture)?,
            Some(Input::Hide) => handle.disappear()?,
            Some(Input::Show) => handle.appear()?,
            Some(Input::Status) => {
                let snapshot = handle.snapshot().await?;
                println!("{}", serde_json::to_string(&snapshot)?);
            }
            Some(Input::Reload) => {
                let config = Config::load()?;
                handle.update_settings(config.timer)?;
                info!("configuration reloaded");
            }
            Some(Input::Quit) => break,
            None => eprintln!("unknown input: {line}"),
        }
    }

    handle.shutdown()?;
    session.await?;
    printer.await?;
    Ok(())
}

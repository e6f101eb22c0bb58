use pomodeck_core::{seconds_for, Config, Phase};

use crate::terminal::clock;

pub fn run(json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let settings = &config.timer;

    if json {
        let mut map = serde_json::Map::new();
        for phase in Phase::ALL {
            let key = serde_json::to_value(phase)?
                .as_str()
                .map(str::to_string)
                .unwrap_or_else(|| phase.label().to_string());
            map.insert(key, seconds_for(phase, settings).into());
        }
        println!("{}", serde_json::to_string_pretty(&map)?);
        return Ok(());
    }

    for phase in Phase::ALL {
        let secs = seconds_for(phase, settings);
        println!("{:<11} {}  ({secs}s)", phase.label(), clock(secs));
    }
    println!(
        "long break after {} work sessions",
        settings.cycles_before_long_break.max(1)
    );
    Ok(())
}

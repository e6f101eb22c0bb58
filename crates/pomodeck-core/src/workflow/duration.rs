//! Duration resolution.
//!
//! Configured durations are either a plain number of minutes or a `mm:ss`
//! string. Anything that does not parse resolves to zero seconds, so a
//! misconfigured phase shows an immediately-expiring countdown instead of
//! failing.

use serde::{Deserialize, Serialize};

use super::phase::Phase;
use crate::storage::Settings;

/// A configured phase length as written by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DurationSetting {
    /// Whole (or fractional) minutes.
    Minutes(f64),
    /// `mm:ss`, or a number written as a string.
    Text(String),
}

impl DurationSetting {
    pub fn minutes(minutes: u32) -> Self {
        DurationSetting::Minutes(f64::from(minutes))
    }

    /// Resolve to whole seconds.
    pub fn to_seconds(&self) -> u64 {
        match self {
            DurationSetting::Minutes(minutes) => minutes_to_seconds(*minutes),
            DurationSetting::Text(text) => parse_text(text),
        }
    }
}

impl From<u32> for DurationSetting {
    fn from(minutes: u32) -> Self {
        DurationSetting::minutes(minutes)
    }
}

impl From<&str> for DurationSetting {
    fn from(text: &str) -> Self {
        DurationSetting::Text(text.to_string())
    }
}

/// Seconds for `phase` under `settings`.
pub fn seconds_for(phase: Phase, settings: &Settings) -> u64 {
    let setting = match phase {
        Phase::Work => &settings.work_duration,
        Phase::ShortBreak => &settings.short_break_duration,
        Phase::LongBreak => &settings.long_break_duration,
    };
    setting.to_seconds()
}

fn minutes_to_seconds(minutes: f64) -> u64 {
    if !minutes.is_finite() || minutes <= 0.0 {
        return 0;
    }
    (minutes * 60.0).round() as u64
}

fn parse_text(text: &str) -> u64 {
    let text = text.trim();
    match text.split_once(':') {
        Some((minutes, seconds)) => {
            let minutes = minutes.trim().parse::<u64>();
            let seconds = seconds.trim().parse::<u64>();
            match (minutes, seconds) {
                (Ok(m), Ok(s)) => m.saturating_mul(60).saturating_add(s),
                _ => 0,
            }
        }
        None => text.parse::<f64>().map(minutes_to_seconds).unwrap_or(0),
    }
}

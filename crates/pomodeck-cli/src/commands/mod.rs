pub mod config;
pub mod durations;
pub mod run;
pub mod simulate;

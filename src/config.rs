//! Configuration and CLI argument handling

use std::{path::PathBuf, time::Duration};
use clap::Parser;

use crate::state::CoordinatorSettings;

/// CLI argument parsing structure
#[derive(Parser, Debug, Clone)]
#[command(name = "workout-timer")]
#[command(about = "Workout and rest timer coordinator with background-safe rest alerts")]
#[command(version)]
pub struct Config {
    /// Port to bind the control server to
    #[arg(short, long, default_value = "20554")]
    pub port: u16,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Seconds added by the alert's "add time" action
    #[arg(long, default_value = "30")]
    pub add_time: i64,

    /// Ceiling of a background grace grant, in seconds
    #[arg(short, long, default_value = "30")]
    pub grace: u64,

    /// Hold a systemd sleep inhibitor for the length of each grace grant
    #[arg(long)]
    pub inhibit_sleep: bool,

    /// Raise desktop notifications through notify-send when a rest ends
    #[arg(long)]
    pub desktop_alerts: bool,

    /// Seconds between scheduling-gap checks
    #[arg(long, default_value = "15")]
    pub reconcile_interval: u64,

    /// Save timer state here when backgrounded, and restore it at startup
    #[arg(long)]
    pub state_file: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Config {
    /// Parse configuration from command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Get the server address as a formatted string
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the appropriate log level based on verbose flag
    pub fn log_level(&self) -> &'static str {
        if self.verbose { "debug" } else { "info" }
    }

    pub fn grace_ceiling(&self) -> Duration {
        Duration::from_secs(self.grace)
    }

    pub fn reconcile_period(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval.max(1))
    }

    pub fn coordinator_settings(&self) -> CoordinatorSettings {
        CoordinatorSettings {
            add_time_seconds: self.add_time,
        }
    }
}

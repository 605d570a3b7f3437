//! CLI definitions for hostwarden.

use std::path::PathBuf;

use clap::{ArgGroup, Parser};

/// Hostwarden CLI.
#[derive(Debug, Parser)]
#[command(name = "hostwarden")]
#[command(about = "Host monitor: CPU, memory and process checks with mail alerts")]
#[command(version)]
#[command(group(ArgGroup::new("action").args(["load", "clear", "monitor", "test"])))]
pub(crate) struct Cli {
    /// Register the monitoring pass in the system crontab
    #[arg(short, long)]
    pub load: bool,

    /// Remove the monitoring pass from the system crontab
    #[arg(short, long)]
    pub clear: bool,

    /// Run one monitoring pass
    #[arg(short, long)]
    pub monitor: bool,

    /// Send a test mail
    #[arg(short, long)]
    pub test: bool,

    /// Configuration file path (YAML, or TOML by extension)
    #[arg(long, default_value = "config.yaml", env = "HOSTWARDEN_CONFIG")]
    pub config: PathBuf,
}

/// The one thing an invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Action {
    Load,
    Clear,
    Monitor,
    Test,
}

impl Cli {
    pub fn action(&self) -> Option<Action> {
        if self.load {
            Some(Action::Load)
        } else if self.clear {
            Some(Action::Clear)
        } else if self.monitor {
            Some(Action::Monitor)
        } else if self.test {
            Some(Action::Test)
        } else {
            None
        }
    }
}

//! Hostwarden - host monitor with mail alerts
//!
//! Main entry point for the hostwarden CLI. Each invocation performs one
//! action; the system crontab provides periodicity.

mod cli;
mod commands;

use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use hostwarden_config::{ConfigLoader, LoggingSection};

use crate::cli::Cli;
use crate::commands::handle_action;

/// Daily log files are named `monitor.YYYY-MM-DD.log`.
const LOG_FILE_PREFIX: &str = "monitor";
const LOG_FILE_SUFFIX: &str = "log";

/// `logs` next to the executable.
fn default_log_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("logs")))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn init_tracing(logging: &LoggingSection, log_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(LOG_FILE_PREFIX)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(30)
        .build(log_dir)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    // Flushes the file writer when the process exits.
    static GUARD: std::sync::OnceLock<tracing_appender::non_blocking::WorkerGuard> =
        std::sync::OnceLock::new();
    let _ = GUARD.set(guard);

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false),
        )
        .init();

    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(action) = cli.action() else {
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config_path = PathBuf::from(ConfigLoader::expand_path(&cli.config.to_string_lossy()));
    let config = ConfigLoader::load(&config_path)?;

    let log_dir = config
        .logging
        .dir
        .as_deref()
        .map(|dir| PathBuf::from(ConfigLoader::expand_path(dir)))
        .unwrap_or_else(default_log_dir);
    init_tracing(&config.logging, &log_dir)?;

    tracing::debug!("Loaded configuration from {}", config_path.display());
    handle_action(action, &config, &config_path, &log_dir)
}

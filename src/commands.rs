//! Action handlers for hostwarden.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{error, info, warn};

use hostwarden_config::{Config, ConfigValidator};
use hostwarden_mail::status_code;
use hostwarden_monitor::Monitor;
use hostwarden_protocols::{Reporter, TracingReporter};
use hostwarden_schedule::{CrontabFile, ScheduleCommand, ScheduleStore, build_and_validate_schedule};

use crate::cli::Action;

/// File next to the daily logs that collects the scheduled runs' output.
const CRON_LOG_FILE: &str = "cron.log";

/// Run one action against a loaded configuration.
pub(crate) fn handle_action(
    action: Action,
    config: &Config,
    config_path: &Path,
    log_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let reporter: Arc<dyn Reporter> = Arc::new(TracingReporter);

    match action {
        Action::Load => load_schedule(config, config_path, log_dir, reporter),
        Action::Clear => clear_schedule(config, reporter),
        Action::Monitor => {
            report_validation(config)?;
            run_monitor(config, reporter)
        }
        Action::Test => {
            report_validation(config)?;
            send_test(config, reporter)
        }
    }
}

/// Log configuration problems; mail validation still decides the outcome.
fn report_validation(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let result = ConfigValidator::validate(config)?;
    for issue in &result.errors {
        error!("Config error at {}: {}", issue.path, issue.message);
    }
    for issue in &result.warnings {
        warn!("Config warning at {}: {}", issue.path, issue.message);
    }
    Ok(())
}

fn crontab_store(config: &Config, reporter: Arc<dyn Reporter>) -> CrontabFile {
    CrontabFile::new(&config.crontab.file, reporter).with_service(config.crontab.service.clone())
}

fn program_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
    Ok(std::env::current_exe()?)
}

/// Register the monitoring pass in the crontab.
fn load_schedule(
    config: &Config,
    config_path: &Path,
    log_dir: &Path,
    reporter: Arc<dyn Reporter>,
) -> Result<(), Box<dyn std::error::Error>> {
    let command = ScheduleCommand {
        launcher: config.launcher.clone(),
        program: program_path()?,
        config: std::fs::canonicalize(config_path)?,
        log_file: log_dir.join(CRON_LOG_FILE),
    };
    let line = build_and_validate_schedule(&config.crontab, &command)?;

    info!("Loading monitor into {}", config.crontab.file);
    crontab_store(config, reporter).upsert(&line)?;

    if let Some(next) = line.next_run() {
        info!("Next monitoring pass at {}", next.format("%Y-%m-%d %H:%M %Z"));
    }
    println!("{}", line);
    Ok(())
}

/// Remove every crontab line that runs this program.
fn clear_schedule(config: &Config, reporter: Arc<dyn Reporter>) -> Result<(), Box<dyn std::error::Error>> {
    let marker = program_path()?.display().to_string();
    info!("Clearing monitor from {}", config.crontab.file);
    let removed = crontab_store(config, reporter).remove(&marker)?;
    println!("removed {} schedule line(s)", removed);
    Ok(())
}

/// One monitoring pass. A failed alert mail is logged, not returned.
fn run_monitor(config: &Config, reporter: Arc<dyn Reporter>) -> Result<(), Box<dyn std::error::Error>> {
    let monitor = Monitor::for_host(config, reporter)?;
    let outcome = monitor.run_pass()?;

    match outcome.alert_status() {
        Some(status) => println!("{}", status),
        None => info!("All {} check(s) passed", monitor.checks().len()),
    }
    Ok(())
}

fn send_test(config: &Config, reporter: Arc<dyn Reporter>) -> Result<(), Box<dyn std::error::Error>> {
    let monitor = Monitor::for_host(config, reporter)?;
    let result = monitor.send_test_mail();
    println!("{}", status_code(&result));
    result?;
    Ok(())
}

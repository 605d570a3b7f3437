//! Job table registration.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;

use hostwarden_protocols::{Event, Reporter};
use tracing::{debug, info};

use crate::error::ScheduleError;
use crate::expression::ScheduleLine;

/// Where schedule lines live.
pub trait ScheduleStore {
    /// Replace this program's lines with `line`.
    fn upsert(&self, line: &ScheduleLine) -> Result<(), ScheduleError>;

    /// Remove every line containing `pattern`; returns how many went.
    fn remove(&self, pattern: &str) -> Result<usize, ScheduleError>;
}

/// A system crontab file such as `/etc/crontab`.
pub struct CrontabFile {
    path: PathBuf,
    service: Option<String>,
    reporter: Arc<dyn Reporter>,
}

impl CrontabFile {
    pub fn new(path: impl Into<PathBuf>, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            path: path.into(),
            service: None,
            reporter,
        }
    }

    /// Restart this systemd unit after every change.
    pub fn with_service(mut self, service: Option<String>) -> Self {
        self.service = service.filter(|s| !s.trim().is_empty());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<String, ScheduleError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
            Err(source) => Err(ScheduleError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, lines: &[&str]) -> Result<(), ScheduleError> {
        let mut content = lines.join("\n");
        if !content.is_empty() {
            content.push('\n');
        }
        fs::write(&self.path, content).map_err(|source| ScheduleError::Io {
            path: self.path.clone(),
            source,
        })?;
        debug!("Wrote {}", self.path.display());
        self.restart_service()
    }

    fn restart_service(&self) -> Result<(), ScheduleError> {
        let Some(service) = &self.service else {
            return Ok(());
        };

        let output = Command::new("systemctl")
            .args(["restart", service.as_str()])
            .output()
            .map_err(|e| ScheduleError::ServiceRestart {
                service: service.clone(),
                reason: format!("Failed to execute systemctl: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ScheduleError::ServiceRestart {
                service: service.clone(),
                reason: stderr.trim().to_string(),
            });
        }

        info!("Restarted service: {}", service);
        Ok(())
    }
}

/// Lines that stay when `pattern` is removed. Comments are never touched.
fn retained<'a>(content: &'a str, pattern: &str) -> (Vec<&'a str>, usize) {
    let mut kept = Vec::new();
    let mut removed = 0;
    for line in content.lines() {
        if !line.trim_start().starts_with('#') && line.contains(pattern) {
            removed += 1;
        } else {
            kept.push(line);
        }
    }
    (kept, removed)
}

impl ScheduleStore for CrontabFile {
    fn upsert(&self, line: &ScheduleLine) -> Result<(), ScheduleError> {
        let content = self.read()?;
        let (mut lines, replaced) = retained(&content, &line.command.marker());
        let rendered = line.to_string();
        lines.push(&rendered);
        self.write(&lines)?;

        if replaced > 0 {
            debug!("Replaced {} existing schedule line(s)", replaced);
        }
        self.reporter.record(Event::ScheduleRegistered { line: rendered.clone() });
        Ok(())
    }

    fn remove(&self, pattern: &str) -> Result<usize, ScheduleError> {
        let content = self.read()?;
        let (lines, removed) = retained(&content, pattern);
        if removed > 0 {
            self.write(&lines)?;
        }

        self.reporter.record(Event::ScheduleRemoved {
            pattern: pattern.to_string(),
            removed,
        });
        Ok(removed)
    }
}

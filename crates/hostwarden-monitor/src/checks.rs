//! Metric checks.
//!
//! Each check samples one metric, compares it against its limit and, on a
//! breach, renders the diagnostic text that ends up in the alert mail. The
//! text is stable for identical samples.

use std::time::Duration;

use hostwarden_config::{CheckConfig, CpuCheckConfig, MemoryCheckConfig, ProcessCheckConfig};
use hostwarden_protocols::{Event, Reporter};

use crate::error::MonitorError;
use crate::probe::{CpuSample, MemorySample, ProcessLister, SystemProbe};

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Outcome of one check. `message` is set iff the check failed.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub passed: bool,
    pub message: Option<String>,
}

impl CheckResult {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// What a check may sample, plus where it reports.
#[derive(Clone, Copy)]
pub struct CheckContext<'a> {
    pub system: &'a dyn SystemProbe,
    pub processes: &'a dyn ProcessLister,
    pub reporter: &'a dyn Reporter,
}

/// A configured check.
#[derive(Debug, Clone, PartialEq)]
pub enum Check {
    Cpu(CpuCheckConfig),
    Memory(MemoryCheckConfig),
    Process(ProcessCheckConfig),
}

impl From<CheckConfig> for Check {
    fn from(config: CheckConfig) -> Self {
        match config {
            CheckConfig::Cpu(c) => Check::Cpu(c),
            CheckConfig::Memory(c) => Check::Memory(c),
            CheckConfig::Process(c) => Check::Process(c),
        }
    }
}

impl Check {
    /// The configuration key of this check.
    pub fn name(&self) -> &'static str {
        match self {
            Check::Cpu(_) => "cpu",
            Check::Memory(_) => "mem",
            Check::Process(_) => "process",
        }
    }

    /// Sample and compare. Limits are inclusive: a sample equal to the
    /// limit fails.
    pub fn evaluate(&self, ctx: CheckContext<'_>) -> Result<CheckResult, MonitorError> {
        match self {
            Check::Cpu(config) => {
                let sample = ctx.system.cpu(Duration::from_secs(config.interval_secs))?;
                Ok(if sample.percent >= config.limit {
                    CheckResult::fail(format_cpu_message(config.interval_secs, &sample))
                } else {
                    CheckResult::pass()
                })
            }
            Check::Memory(config) => {
                let sample = ctx.system.memory()?;
                Ok(if sample.percent >= config.limit {
                    CheckResult::fail(format_memory_message(&sample))
                } else {
                    CheckResult::pass()
                })
            }
            Check::Process(config) => {
                if config.names.is_empty() {
                    ctx.reporter.record(Event::CheckWarning {
                        check: self.name().to_string(),
                        detail: "no process names configured".to_string(),
                    });
                    return Ok(CheckResult::pass());
                }
                let missing: Vec<&str> = config
                    .names
                    .iter()
                    .map(String::as_str)
                    .filter(|name| !ctx.processes.is_running(name))
                    .collect();
                Ok(if missing.is_empty() {
                    CheckResult::pass()
                } else {
                    CheckResult::fail(format_process_message(&missing))
                })
            }
        }
    }
}

pub fn format_cpu_message(interval_secs: u64, sample: &CpuSample) -> String {
    let states = if sample.states.is_empty() {
        "unavailable".to_string()
    } else {
        sample
            .states
            .iter()
            .map(|(state, share)| format!("{}={:.2}%", state, share))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "CPU usage over the last {}s:\ncpu_percent: {:.2}\ncpu_times: {}",
        interval_secs, sample.percent, states
    )
}

pub fn format_memory_message(sample: &MemorySample) -> String {
    format!(
        "Memory usage:\n\
         percent: {:.2}\n\
         total: {:.2} GB\n\
         available: {:.2} GB\n\
         used: {:.2} GB\n\
         free: {:.2} GB\n\
         buffers: {:.2} GB\n\
         cached: {:.2} GB",
        sample.percent,
        gib(sample.total),
        gib(sample.available),
        gib(sample.used),
        gib(sample.free),
        gib(sample.buffers),
        gib(sample.cached),
    )
}

pub fn format_process_message(missing: &[&str]) -> String {
    missing
        .iter()
        .map(|name| format!("process {} is not active", name))
        .collect::<Vec<_>>()
        .join("\n")
}

fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

#[cfg(test)]
#[path = "checks_tests.rs"]
mod tests;

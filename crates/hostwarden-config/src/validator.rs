//! Configuration validation.

use crate::error::ConfigError;
use crate::schema::{CheckConfig, Config};

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate everything a mail-sending run needs.
    ///
    /// Returns `Err` only when the `monitor` section cannot be resolved; every
    /// other problem is collected into the result.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_server(config, &mut result);
        Self::validate_mail(config, &mut result);
        Self::validate_account(config, &mut result);
        Self::validate_monitor(config, &mut result)?;

        Ok(result)
    }

    fn validate_server(config: &Config, result: &mut ValidationResult) {
        let Some(server) = &config.server else {
            result.add_error(ValidationError::new("server", "there is no server info"));
            return;
        };

        if server.host.trim().is_empty() {
            result.add_error(ValidationError::new("server.host", "host is required"));
        }

        if server.port.trim().is_empty() {
            result.add_error(ValidationError::new("server.port", "port is required"));
        } else if server.port.trim().parse::<u16>().is_err() {
            result.add_error(ValidationError::new(
                "server.port",
                format!("'{}' is not a valid port", server.port),
            ));
        }
    }

    fn validate_mail(config: &Config, result: &mut ValidationResult) {
        let Some(mail) = &config.mail else {
            result.add_error(ValidationError::new("mail", "there is no mail info"));
            return;
        };

        if mail.from.trim().is_empty() {
            result.add_error(ValidationError::new("mail.from", "sender address is required"));
        }

        if mail.to.iter().all(|addr| addr.trim().is_empty()) {
            result.add_error(ValidationError::new(
                "mail.to",
                "at least one recipient is required",
            ));
        }

        if mail.subject.trim().is_empty() {
            result.add_warning(ValidationWarning::new(
                "mail.subject",
                "empty subject, alerts will be refused by the mailer",
            ));
        }
    }

    fn validate_account(config: &Config, result: &mut ValidationResult) {
        let Some(account) = &config.account else {
            result.add_error(ValidationError::new("account", "there is no account info"));
            return;
        };

        if account.user.is_empty() {
            result.add_error(ValidationError::new("account.user", "user is required"));
        }

        if account.pass.is_empty() {
            result.add_error(ValidationError::new("account.pass", "pass is required"));
        }
    }

    fn validate_monitor(config: &Config, result: &mut ValidationResult) -> Result<(), ConfigError> {
        if config.monitor.is_empty() {
            result.add_warning(ValidationWarning::new(
                "monitor",
                "no checks configured, a monitoring pass does nothing",
            ));
            return Ok(());
        }

        for check in config.monitor.checks()? {
            let path = format!("monitor.{}", check.name());
            match check {
                CheckConfig::Cpu(cpu) => {
                    Self::warn_percent_limit(&path, cpu.limit, result);
                    if cpu.interval_secs > 60 {
                        result.add_warning(ValidationWarning::new(
                            format!("{}.interval", path),
                            format!(
                                "sampling window of {}s delays every pass by that long",
                                cpu.interval_secs
                            ),
                        ));
                    }
                }
                CheckConfig::Memory(mem) => Self::warn_percent_limit(&path, mem.limit, result),
                CheckConfig::Process(process) => {
                    if process.names.is_empty() {
                        result.add_warning(ValidationWarning::new(
                            format!("{}.names", path),
                            "no process names listed, the check always passes",
                        ));
                    }
                }
            }
        }

        Ok(())
    }

    fn warn_percent_limit(path: &str, limit: f64, result: &mut ValidationResult) {
        if limit <= 0.0 || limit > 100.0 {
            result.add_warning(ValidationWarning::new(
                format!("{}.limit", path),
                format!(
                    "limit {} is outside 0-100, the check always {}",
                    limit,
                    if limit <= 0.0 { "fails" } else { "passes" }
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

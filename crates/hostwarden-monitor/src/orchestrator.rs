//! One monitoring pass: run the configured checks, mail the failures.

use std::sync::Arc;

use hostwarden_config::Config;
use hostwarden_mail::{MailError, MailRequest, MailServerConfig, MailTransport, Mailer, SmtpsTransport, status_code};
use hostwarden_protocols::{Event, Reporter};
use tracing::{error, info};

use crate::checks::{Check, CheckContext};
use crate::error::MonitorError;
use crate::probe::{HostProbe, ProcessLister, SystemProbe};

/// Body of the `--test` mail.
pub const TEST_MAIL_BODY: &str = "Mail delivery test succeeded.";

/// Result of [`Monitor::run_pass`].
#[derive(Debug, Clone, PartialEq)]
pub struct PassOutcome {
    /// Messages of the failing checks, in configuration order.
    pub failures: Vec<String>,
    /// Send result, `None` when every check passed.
    pub alert: Option<Result<(), MailError>>,
}

impl PassOutcome {
    pub fn is_healthy(&self) -> bool {
        self.failures.is_empty()
    }

    /// Numeric mail status, if an alert was attempted.
    pub fn alert_status(&self) -> Option<i32> {
        self.alert.as_ref().map(status_code)
    }
}

/// Addressing shared by every alert of one monitor.
#[derive(Debug, Clone)]
struct AlertTemplate {
    server: Option<MailServerConfig>,
    from: String,
    to: Vec<String>,
    cc: Vec<String>,
    subject: String,
}

impl AlertTemplate {
    fn from_config(config: &Config) -> Result<Self, MonitorError> {
        let mail = config.require_mail()?;
        // A missing server or account is left for mail validation to report.
        let server = config.server.as_ref().map(|server| {
            let (username, password) = config
                .account
                .as_ref()
                .map(|account| (account.user.clone(), account.pass.clone()))
                .unwrap_or_default();
            MailServerConfig {
                host: server.host.clone(),
                port: server.port.clone(),
                from_address: mail.from.clone(),
                username,
                password,
            }
        });

        Ok(Self {
            server,
            from: mail.from.clone(),
            to: mail.to.clone(),
            cc: mail.cc.clone(),
            subject: mail.subject.clone(),
        })
    }

    fn request(&self, body: String) -> MailRequest {
        MailRequest::new(
            self.server.clone(),
            self.from.clone(),
            self.to.clone(),
            self.subject.clone(),
            body,
        )
        .with_cc(self.cc.clone())
    }
}

/// Runs checks and dispatches the alert mail.
pub struct Monitor<T: MailTransport = SmtpsTransport> {
    checks: Vec<Check>,
    alert: AlertTemplate,
    system: Arc<dyn SystemProbe>,
    processes: Arc<dyn ProcessLister>,
    mailer: Mailer<T>,
    reporter: Arc<dyn Reporter>,
}

impl Monitor<SmtpsTransport> {
    /// Monitor sampling this host and mailing over SMTPS.
    pub fn for_host(config: &Config, reporter: Arc<dyn Reporter>) -> Result<Self, MonitorError> {
        let probe = Arc::new(HostProbe::new());
        Self::from_config(
            config,
            probe.clone(),
            probe,
            Mailer::smtps(reporter.clone()),
            reporter,
        )
    }
}

impl<T: MailTransport> Monitor<T> {
    /// Resolve checks and alert addressing.
    ///
    /// An unknown check key or a missing `mail` section is an error here,
    /// before anything is sampled.
    pub fn from_config(
        config: &Config,
        system: Arc<dyn SystemProbe>,
        processes: Arc<dyn ProcessLister>,
        mailer: Mailer<T>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, MonitorError> {
        let checks = config
            .monitor
            .checks()?
            .into_iter()
            .map(Check::from)
            .collect();

        Ok(Self {
            checks,
            alert: AlertTemplate::from_config(config)?,
            system,
            processes,
            mailer,
            reporter,
        })
    }

    pub fn checks(&self) -> &[Check] {
        &self.checks
    }

    pub fn mailer(&self) -> &Mailer<T> {
        &self.mailer
    }

    /// Run every check in order and collect the failure messages.
    pub fn evaluate(&self) -> Result<Vec<String>, MonitorError> {
        let ctx = CheckContext {
            system: self.system.as_ref(),
            processes: self.processes.as_ref(),
            reporter: self.reporter.as_ref(),
        };

        let mut failures = Vec::new();
        for check in &self.checks {
            let result = check.evaluate(ctx)?;
            match result.message {
                Some(message) if !result.passed => {
                    self.reporter.record(Event::CheckFailed {
                        check: check.name().to_string(),
                        message: message.clone(),
                    });
                    failures.push(message);
                }
                _ => self.reporter.record(Event::CheckPassed {
                    check: check.name().to_string(),
                }),
            }
        }
        Ok(failures)
    }

    /// Evaluate, then send one alert if anything failed.
    ///
    /// A failed send is part of the outcome, not an error of the pass.
    pub fn run_pass(&self) -> Result<PassOutcome, MonitorError> {
        let failures = self.evaluate()?;
        if failures.is_empty() {
            self.reporter.record(Event::AlertSkipped);
            return Ok(PassOutcome {
                failures,
                alert: None,
            });
        }

        self.reporter.record(Event::AlertDispatched {
            failures: failures.len(),
        });
        let request = self.alert.request(render_alert_body(&failures));
        let result = self.mailer.send_instant_mail(&request);
        match &result {
            Ok(()) => info!("Alert sent for {} failing check(s)", failures.len()),
            Err(e) => error!("Alert mail failed with status {}: {}", e.code(), e),
        }

        Ok(PassOutcome {
            failures,
            alert: Some(result),
        })
    }

    /// Send the confirmation mail without running any check.
    pub fn send_test_mail(&self) -> Result<(), MailError> {
        self.mailer
            .send_instant_mail(&self.alert.request(TEST_MAIL_BODY.to_string()))
    }
}

/// HTML body for a list of failure messages.
///
/// Each message is escaped and its line breaks become `<br>`; messages are
/// separated by an empty line.
pub fn render_alert_body(messages: &[String]) -> String {
    messages
        .iter()
        .map(|message| escape_html(message).replace('\n', "<br>"))
        .collect::<Vec<_>>()
        .join("<br><br>")
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;

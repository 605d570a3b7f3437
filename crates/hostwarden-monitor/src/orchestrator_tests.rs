use super::*;
use crate::probe::{CpuSample, MemorySample};
use hostwarden_config::{ConfigError, ConfigFormat, ConfigLoader};
use hostwarden_mail::Envelope;
use hostwarden_protocols::RecordingReporter;
use std::sync::Mutex;
use std::time::Duration;

const CONFIG: &str = r#"
server:
  host: smtp.example.com
  port: 465
mail:
  from: monitor@example.com
  to: [ops@example.com, ops@example.com, lead@example.com]
  cc: [audit@example.com]
  subject: Host monitor alert
account:
  user: monitor@example.com
  pass: secret
monitor:
  mem:
    limit: 90
  cpu:
    limit: 50
    interval: 1
"#;

struct FixedProbe {
    cpu_percent: f64,
    memory_percent: f64,
}

impl SystemProbe for FixedProbe {
    fn cpu(&self, _window: Duration) -> Result<CpuSample, MonitorError> {
        Ok(CpuSample {
            percent: self.cpu_percent,
            states: Vec::new(),
        })
    }

    fn memory(&self) -> Result<MemorySample, MonitorError> {
        Ok(MemorySample {
            percent: self.memory_percent,
            total: 1024 * 1024 * 1024,
            available: 1024 * 1024 * 1024,
            used: 0,
            free: 0,
            buffers: 0,
            cached: 0,
        })
    }
}

struct BrokenProbe;

impl SystemProbe for BrokenProbe {
    fn cpu(&self, _window: Duration) -> Result<CpuSample, MonitorError> {
        Err(MonitorError::collection("cpu", "no /proc"))
    }

    fn memory(&self) -> Result<MemorySample, MonitorError> {
        Err(MonitorError::collection("memory", "no /proc"))
    }
}

struct NothingRunning;

impl ProcessLister for NothingRunning {
    fn is_running(&self, _pattern: &str) -> bool {
        false
    }
}

#[derive(Default)]
struct MockTransport {
    sent: Mutex<Vec<(MailServerConfig, Vec<String>, String)>>,
    fail_with: Option<MailError>,
}

impl MockTransport {
    fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

impl MailTransport for MockTransport {
    fn deliver(
        &self,
        server: &MailServerConfig,
        envelope: &Envelope,
        message: &[u8],
        _reporter: &dyn Reporter,
    ) -> Result<(), MailError> {
        self.sent.lock().unwrap().push((
            server.clone(),
            envelope.to().iter().map(|a| a.to_string()).collect(),
            String::from_utf8_lossy(message).into_owned(),
        ));
        match &self.fail_with {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

fn config(yaml: &str) -> Config {
    ConfigLoader::load_str(yaml, ConfigFormat::Yaml).unwrap()
}

fn monitor_with(
    config: &Config,
    system: Arc<dyn SystemProbe>,
    transport: MockTransport,
) -> (Monitor<MockTransport>, Arc<RecordingReporter>) {
    let reporter = Arc::new(RecordingReporter::new());
    let mailer = Mailer::new(transport, reporter.clone());
    let monitor = Monitor::from_config(
        config,
        system,
        Arc::new(NothingRunning),
        mailer,
        reporter.clone(),
    )
    .unwrap();
    (monitor, reporter)
}

fn monitor(cpu: f64, mem: f64) -> (Monitor<MockTransport>, Arc<RecordingReporter>) {
    monitor_with(
        &config(CONFIG),
        Arc::new(FixedProbe {
            cpu_percent: cpu,
            memory_percent: mem,
        }),
        MockTransport::default(),
    )
}

#[test]
fn test_checks_follow_config_order() {
    let (monitor, _) = monitor(0.0, 0.0);
    let names: Vec<&str> = monitor.checks().iter().map(|c| c.name()).collect();
    assert_eq!(names, vec!["mem", "cpu"]);
}

#[test]
fn test_one_failing_check_sends_one_alert() {
    let (monitor, reporter) = monitor(50.0, 10.0);

    let outcome = monitor.run_pass().unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert!(outcome.failures[0].starts_with("CPU usage over the last 1s:"));
    assert_eq!(outcome.alert_status(), Some(1));
    assert!(!outcome.is_healthy());
    assert_eq!(monitor.mailer().transport().calls(), 1);

    let events = reporter.events();
    assert!(events.contains(&Event::CheckPassed {
        check: "mem".to_string()
    }));
    assert!(events.contains(&Event::AlertDispatched { failures: 1 }));
}

#[test]
fn test_alert_addressing_comes_from_config() {
    let (monitor, _) = monitor(99.0, 99.0);
    monitor.run_pass().unwrap();

    let sent = monitor.mailer().transport().sent.lock().unwrap();
    let (server, recipients, message) = &sent[0];
    assert_eq!(server.host, "smtp.example.com");
    assert_eq!(server.port, "465");
    assert_eq!(server.username, "monitor@example.com");
    assert_eq!(server.password, "secret");
    assert_eq!(recipients, &vec!["ops@example.com", "lead@example.com"]);
    assert!(message.contains("Cc: audit@example.com"));
    assert!(message.contains("Subject: Host monitor alert"));
    assert!(message.contains("percent: 99.00<br>total: 1.00 GB"));
    assert!(message.contains("<br><br>CPU usage over the last 1s:"));
}

#[test]
fn test_all_passing_sends_nothing() {
    let (monitor, reporter) = monitor(10.0, 10.0);

    let outcome = monitor.run_pass().unwrap();

    assert!(outcome.is_healthy());
    assert_eq!(outcome.alert, None);
    assert_eq!(monitor.mailer().transport().calls(), 0);
    assert!(reporter.events().contains(&Event::AlertSkipped));
}

#[test]
fn test_failed_alert_does_not_fail_pass() {
    let transport = MockTransport {
        fail_with: Some(MailError::AllRecipientsRejected("550 no such user".to_string())),
        ..MockTransport::default()
    };
    let (monitor, _) = monitor_with(
        &config(CONFIG),
        Arc::new(FixedProbe {
            cpu_percent: 99.0,
            memory_percent: 0.0,
        }),
        transport,
    );

    let outcome = monitor.run_pass().unwrap();

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.alert_status(), Some(15));
}

#[test]
fn test_missing_account_is_reported_by_mail_validation() {
    let yaml = CONFIG.replace("account:\n  user: monitor@example.com\n  pass: secret\n", "");
    let (monitor, _) = monitor_with(
        &config(&yaml),
        Arc::new(FixedProbe {
            cpu_percent: 99.0,
            memory_percent: 0.0,
        }),
        MockTransport::default(),
    );

    let outcome = monitor.run_pass().unwrap();

    assert_eq!(outcome.alert, Some(Err(MailError::UsernameMissing)));
    assert_eq!(monitor.mailer().transport().calls(), 0);
}

#[test]
fn test_missing_mail_section_is_fatal() {
    let yaml = "monitor:\n  mem:\n    limit: 90\n";
    let reporter = Arc::new(RecordingReporter::new());
    let result = Monitor::from_config(
        &config(yaml),
        Arc::new(BrokenProbe),
        Arc::new(NothingRunning),
        Mailer::new(MockTransport::default(), reporter.clone()),
        reporter,
    );

    assert!(matches!(
        result,
        Err(MonitorError::Config(ConfigError::MissingField(ref field))) if field == "mail"
    ));
}

#[test]
fn test_probe_failure_aborts_pass_before_mail() {
    let (monitor, _) = monitor_with(&config(CONFIG), Arc::new(BrokenProbe), MockTransport::default());

    let result = monitor.run_pass();

    assert!(matches!(result, Err(MonitorError::MetricsCollection { metric: "memory", .. })));
    assert_eq!(monitor.mailer().transport().calls(), 0);
}

#[test]
fn test_send_test_mail() {
    let (monitor, reporter) = monitor(99.0, 99.0);

    monitor.send_test_mail().unwrap();

    let sent = monitor.mailer().transport().sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].2.contains(TEST_MAIL_BODY));
    assert!(!reporter
        .events()
        .iter()
        .any(|e| matches!(e, Event::CheckFailed { .. } | Event::CheckPassed { .. })));
}

#[test]
fn test_render_alert_body() {
    let messages = vec![
        "process a<b> is not active\nprocess c&d is not active".to_string(),
        "Memory usage:\npercent: 95.00".to_string(),
    ];
    assert_eq!(
        render_alert_body(&messages),
        "process a&lt;b&gt; is not active<br>process c&amp;d is not active\
         <br><br>Memory usage:<br>percent: 95.00"
    );
    assert_eq!(render_alert_body(&[]), "");
}

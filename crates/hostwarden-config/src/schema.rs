//! Configuration schema definitions.

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ConfigError;

/// Root configuration.
///
/// The mail-related sections are optional at parse time so that a `--clear`
/// or `--load` run does not need SMTP credentials; the components that need
/// them ask through the `require_*` accessors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: Option<ServerSection>,

    #[serde(default)]
    pub mail: Option<MailSection>,

    #[serde(default)]
    pub account: Option<AccountSection>,

    #[serde(default)]
    pub monitor: MonitorSection,

    #[serde(default)]
    pub crontab: CrontabSection,

    /// Interpreter placed before the program path in the crontab line.
    #[serde(default, alias = "python")]
    pub launcher: Option<String>,

    #[serde(default)]
    pub logging: LoggingSection,
}

impl Config {
    pub fn require_server(&self) -> Result<&ServerSection, ConfigError> {
        self.server
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("server".to_string()))
    }

    pub fn require_mail(&self) -> Result<&MailSection, ConfigError> {
        self.mail
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("mail".to_string()))
    }

    pub fn require_account(&self) -> Result<&AccountSection, ConfigError> {
        self.account
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField("account".to_string()))
    }
}

/// Mail server location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerSection {
    #[serde(default)]
    pub host: String,

    /// Kept as text: YAML files write it either as `465` or `"465"`.
    #[serde(default, deserialize_with = "string_or_number")]
    pub port: String,
}

/// Alert envelope and headers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSection {
    #[serde(default)]
    pub from: String,

    #[serde(default)]
    pub to: Vec<String>,

    #[serde(default)]
    pub cc: Vec<String>,

    #[serde(default = "default_subject")]
    pub subject: String,
}

impl Default for MailSection {
    fn default() -> Self {
        Self {
            from: String::new(),
            to: Vec::new(),
            cc: Vec::new(),
            subject: default_subject(),
        }
    }
}

fn default_subject() -> String {
    "Host monitor alert".to_string()
}

/// SMTP login.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSection {
    #[serde(default)]
    pub user: String,

    #[serde(default)]
    pub pass: String,
}

/// Names accepted as keys of the `monitor` section.
pub const KNOWN_CHECKS: [&str; 3] = ["cpu", "mem", "process"];

/// Default CPU sampling window in seconds.
pub const DEFAULT_CPU_INTERVAL_SECS: u64 = 5;

/// Raw per-check settings, in the order they appear in the file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitorSection {
    pub entries: IndexMap<String, CheckSettings>,
}

/// Settings shared by every check kind; each kind reads what it needs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckSettings {
    #[serde(default)]
    pub limit: Option<f64>,

    /// CPU sampling window in seconds.
    #[serde(default)]
    pub interval: Option<u64>,

    /// Process name substrings expected to be running.
    #[serde(default, alias = "processes")]
    pub names: Vec<String>,
}

impl MonitorSection {
    /// Resolve every entry into a typed [`CheckConfig`], keeping file order.
    ///
    /// Fails on the first unknown key or missing limit.
    pub fn checks(&self) -> Result<Vec<CheckConfig>, ConfigError> {
        self.entries
            .iter()
            .map(|(name, settings)| CheckConfig::resolve(name, settings))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A check resolved from its configuration key.
#[derive(Debug, Clone, PartialEq)]
pub enum CheckConfig {
    Cpu(CpuCheckConfig),
    Memory(MemoryCheckConfig),
    Process(ProcessCheckConfig),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CpuCheckConfig {
    pub limit: f64,
    pub interval_secs: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryCheckConfig {
    pub limit: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProcessCheckConfig {
    pub names: Vec<String>,
    /// Accepted for symmetry with the other checks; not compared.
    pub limit: Option<f64>,
}

impl CheckConfig {
    /// Map a `monitor` key and its settings onto a check.
    pub fn resolve(name: &str, settings: &CheckSettings) -> Result<Self, ConfigError> {
        match name {
            "cpu" => Ok(CheckConfig::Cpu(CpuCheckConfig {
                limit: required_limit(name, settings)?,
                interval_secs: settings
                    .interval
                    .filter(|secs| *secs > 0)
                    .unwrap_or(DEFAULT_CPU_INTERVAL_SECS),
            })),
            "mem" => Ok(CheckConfig::Memory(MemoryCheckConfig {
                limit: required_limit(name, settings)?,
            })),
            "process" => Ok(CheckConfig::Process(ProcessCheckConfig {
                names: settings.names.clone(),
                limit: settings.limit,
            })),
            other => Err(ConfigError::UnknownCheck(other.to_string())),
        }
    }

    /// The configuration key this check was resolved from.
    pub fn name(&self) -> &'static str {
        match self {
            CheckConfig::Cpu(_) => "cpu",
            CheckConfig::Memory(_) => "mem",
            CheckConfig::Process(_) => "process",
        }
    }
}

fn required_limit(name: &str, settings: &CheckSettings) -> Result<f64, ConfigError> {
    let limit = settings
        .limit
        .ok_or_else(|| ConfigError::MissingField(format!("monitor.{}.limit", name)))?;
    if !limit.is_finite() {
        return Err(ConfigError::InvalidValue {
            field: format!("monitor.{}.limit", name),
            message: "must be a finite number".to_string(),
        });
    }
    Ok(limit)
}

/// Schedule fields and crontab location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrontabSection {
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub minute: Option<String>,

    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub hour: Option<String>,

    #[serde(default, alias = "day_of_month", deserialize_with = "optional_string_or_number")]
    pub dayofmonth: Option<String>,

    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub month: Option<String>,

    #[serde(default, alias = "day_of_week", deserialize_with = "optional_string_or_number")]
    pub dayofweek: Option<String>,

    /// System crontab file the schedule line is written to.
    #[serde(default = "default_crontab_file")]
    pub file: String,

    /// Scheduler service restarted after the file changes.
    #[serde(default)]
    pub service: Option<String>,

    /// User column of the crontab line.
    #[serde(default = "default_crontab_user")]
    pub user: String,
}

impl Default for CrontabSection {
    fn default() -> Self {
        Self {
            minute: None,
            hour: None,
            dayofmonth: None,
            month: None,
            dayofweek: None,
            file: default_crontab_file(),
            service: None,
            user: default_crontab_user(),
        }
    }
}

fn default_crontab_file() -> String {
    "/etc/crontab".to_string()
}

fn default_crontab_user() -> String {
    "root".to_string()
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Directory for the daily log files; defaults to `logs` next to the
    /// executable.
    #[serde(default)]
    pub dir: Option<String>,

    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            dir: None,
            level: default_level(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StringOrNumber {
    Text(String),
    Integer(i64),
    Float(f64),
}

impl From<StringOrNumber> for String {
    fn from(value: StringOrNumber) -> Self {
        match value {
            StringOrNumber::Text(s) => s,
            StringOrNumber::Integer(n) => n.to_string(),
            StringOrNumber::Float(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    StringOrNumber::deserialize(deserializer).map(String::from)
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<StringOrNumber>::deserialize(deserializer)?.map(String::from))
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;

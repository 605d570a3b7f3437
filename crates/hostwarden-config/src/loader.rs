//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Yaml,
    Toml,
}

impl ConfigFormat {
    /// Pick the format from the file extension; anything but `.toml` is YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("toml") => ConfigFormat::Toml,
            _ => ConfigFormat::Yaml,
        }
    }
}

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML or TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content, ConfigFormat::from_path(path))
    }

    /// Load configuration from a string.
    ///
    /// The `monitor` entries are resolved here, so an unknown check fails
    /// the load instead of the monitoring pass.
    pub fn load_str(content: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = match format {
            ConfigFormat::Toml => toml::from_str(&expanded)?,
            // An empty YAML document deserializes to unit, not to a map.
            ConfigFormat::Yaml if expanded.trim().is_empty() => Config::default(),
            ConfigFormat::Yaml => serde_yml::from_str(&expanded)?,
        };
        config.monitor.checks()?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}")
            .map_err(|e| ConfigError::InvalidFormat(e.to_string()))?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.config`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::CheckConfig;
    use std::io::Write;

    const FULL_YAML: &str = r#"
server:
  host: smtp.example.com
  port: 465
mail:
  from: monitor@example.com
  to:
    - ops@example.com
    - oncall@example.com
  cc:
    - lead@example.com
  subject: "[host01] resource alert"
account:
  user: monitor@example.com
  pass: secret
monitor:
  mem:
    limit: 90
  cpu:
    limit: 80
    interval: 3
  process:
    names: [nginx, redis-server]
crontab:
  minute: "*/5"
  hour: 3
python: /usr/bin/env
"#;

    #[test]
    fn test_load_empty_yaml() {
        let config = ConfigLoader::load_str("", ConfigFormat::Yaml).unwrap();
        assert!(config.monitor.is_empty());
        assert!(config.server.is_none());
    }

    #[test]
    fn test_load_full_yaml() {
        let config = ConfigLoader::load_str(FULL_YAML, ConfigFormat::Yaml).unwrap();

        let server = config.require_server().unwrap();
        assert_eq!(server.host, "smtp.example.com");
        assert_eq!(server.port, "465");

        let mail = config.require_mail().unwrap();
        assert_eq!(mail.to.len(), 2);
        assert_eq!(mail.cc, vec!["lead@example.com"]);
        assert_eq!(mail.subject, "[host01] resource alert");

        assert_eq!(config.require_account().unwrap().pass, "secret");
        assert_eq!(config.crontab.minute.as_deref(), Some("*/5"));
        assert_eq!(config.crontab.hour.as_deref(), Some("3"));
        assert_eq!(config.launcher.as_deref(), Some("/usr/bin/env"));
    }

    #[test]
    fn test_yaml_monitor_order_follows_file() {
        let config = ConfigLoader::load_str(FULL_YAML, ConfigFormat::Yaml).unwrap();
        let checks = config.monitor.checks().unwrap();
        let names: Vec<_> = checks.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["mem", "cpu", "process"]);

        match &checks[1] {
            CheckConfig::Cpu(cpu) => {
                assert_eq!(cpu.limit, 80.0);
                assert_eq!(cpu.interval_secs, 3);
            }
            other => panic!("Expected Cpu, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_check_fails_load() {
        let content = "monitor:\n  cpu:\n    limit: 80\n  disk:\n    limit: 90\n";
        let result = ConfigLoader::load_str(content, ConfigFormat::Yaml);
        match result {
            Err(ConfigError::UnknownCheck(name)) => assert_eq!(name, "disk"),
            other => panic!("Expected UnknownCheck, got {:?}", other),
        }
    }

    #[test]
    fn test_load_toml() {
        let content = r#"
            [server]
            host = "smtp.example.com"
            port = "465"

            [monitor.cpu]
            limit = 75.5

            [crontab]
            minute = "0"
        "#;
        let config = ConfigLoader::load_str(content, ConfigFormat::Toml).unwrap();
        assert_eq!(config.require_server().unwrap().port, "465");
        assert_eq!(config.monitor.entries["cpu"].limit, Some(75.5));
        assert_eq!(config.crontab.minute.as_deref(), Some("0"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ConfigFormat::from_path(Path::new("a/config.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("config.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("config.yml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("config")), ConfigFormat::Yaml);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "server:").unwrap();
        writeln!(file, "  host: mail.example.org").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.require_server().unwrap().host, "mail.example.org");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/config.yaml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_yaml() {
        let result = ConfigLoader::load_str("server: [unclosed", ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::YamlParse(_))));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("HOSTWARDEN_TEST_SMTP_PASS", "from-env");
        }
        let content = "account:\n  user: me\n  pass: \"${HOSTWARDEN_TEST_SMTP_PASS}\"\n";
        let config = ConfigLoader::load_str(content, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.require_account().unwrap().pass, "from-env");
        unsafe {
            std::env::remove_var("HOSTWARDEN_TEST_SMTP_PASS");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value: \"${NONEXISTENT_HOSTWARDEN_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/hostwarden/logs");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/hostwarden/logs"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/var/log/hostwarden"), "/var/log/hostwarden");
    }
}

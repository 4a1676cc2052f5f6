// config.rs - client configuration: loading, defaults, validation.
//
// Construction failures here (missing secret, bad TOML, unparseable regex)
// are faults: they come back as `ClientError`, never silently defaulted.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Logging configuration consumed only by the `radius-probe` demo binary;
/// the library itself never installs a global subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), format: default_log_format() }
    }
}

/// Client configuration: host pool, shared secret, timeouts, health-check
/// credentials, and the assignment-attribute extraction rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Primary server identifier; also the sole fallback when `hosts` is absent.
    pub host: String,

    /// Ordered failover pool. Defaults to `[host]` when absent.
    #[serde(default)]
    pub hosts: Vec<String>,

    /// Shared secret. Construction fails if empty.
    pub secret: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_health_check_interval_ms")]
    pub health_check_interval_ms: u64,

    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,

    pub health_check_user: String,
    pub health_check_password: String,

    #[serde(default = "default_assignment_attribute_id")]
    pub assignment_attribute_id: u8,

    #[serde(default)]
    pub vendor_id: Option<u32>,

    #[serde(default)]
    pub vendor_type: Option<u8>,

    #[serde(default)]
    pub value_pattern: Option<String>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_port() -> u16 {
    1812
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_health_check_interval_ms() -> u64 {
    1_800_000
}

fn default_health_check_timeout_ms() -> u64 {
    5000
}

fn default_assignment_attribute_id() -> u8 {
    25
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl ClientConfig {
    /// Loads and validates configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ClientError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(ClientError::Io)?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| ClientError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// The ordered host pool: `hosts` filtered of empty entries, or
    /// `[host]` if `hosts` is empty.
    pub fn host_pool(&self) -> Vec<String> {
        let filtered: Vec<String> = self.hosts.iter().filter(|h| !h.is_empty()).cloned().collect();
        if filtered.is_empty() {
            vec![self.host.clone()]
        } else {
            filtered
        }
    }

    /// Background health-cycle period, floored at 5000ms so a misconfigured
    /// interval can't turn into a busy-loop of probes.
    pub fn effective_health_check_interval_ms(&self) -> u64 {
        self.health_check_interval_ms.max(5000)
    }

    /// Validates required fields and option consistency. Called by
    /// `from_file`, and again by `Client::new` for configs built directly.
    pub(crate) fn validate(&self) -> Result<(), ClientError> {
        if self.secret.is_empty() {
            return Err(ClientError::MissingSecret);
        }

        if self.host_pool().iter().all(|h| h.is_empty()) {
            return Err(ClientError::InvalidConfig(
                "at least one non-empty host is required".to_string(),
            ));
        }

        if self.health_check_user.is_empty() || self.health_check_password.is_empty() {
            return Err(ClientError::InvalidConfig(
                "healthCheckUser and healthCheckPassword are required".to_string(),
            ));
        }

        if let Some(pattern) = &self.value_pattern {
            regex::Regex::new(pattern)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> ClientConfig {
        ClientConfig {
            host: "10.0.0.1".to_string(),
            hosts: vec![],
            secret: "s3cret-s3cret-s3cret".to_string(),
            port: default_port(),
            timeout_ms: default_timeout_ms(),
            health_check_interval_ms: default_health_check_interval_ms(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            health_check_user: "probe".to_string(),
            health_check_password: "probe-pass".to_string(),
            assignment_attribute_id: default_assignment_attribute_id(),
            vendor_id: None,
            vendor_type: None,
            value_pattern: None,
            logging: LoggingConfig::default(),
        }
    }

    #[test]
    fn host_pool_falls_back_to_host_when_hosts_empty() {
        let config = base_config();
        assert_eq!(config.host_pool(), vec!["10.0.0.1".to_string()]);
    }

    #[test]
    fn host_pool_filters_empty_entries() {
        let mut config = base_config();
        config.hosts = vec!["10.0.0.1".to_string(), "".to_string(), "10.0.0.2".to_string()];
        assert_eq!(config.host_pool(), vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
    }

    #[test]
    fn empty_secret_fails_validation() {
        let mut config = base_config();
        config.secret = String::new();
        assert!(matches!(config.validate(), Err(ClientError::MissingSecret)));
    }

    #[test]
    fn health_check_interval_is_floored() {
        let mut config = base_config();
        config.health_check_interval_ms = 10;
        assert_eq!(config.effective_health_check_interval_ms(), 5000);
    }

    #[test]
    fn invalid_value_pattern_fails_validation() {
        let mut config = base_config();
        config.value_pattern = Some("(unclosed".to_string());
        assert!(config.validate().is_err());
    }
}

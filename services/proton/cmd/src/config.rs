//! Configuration for the send driver.
//!
//! Values come from an optional YAML file, then `PROTON_*` environment
//! variables, then command line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Send driver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SendConfig {
    /// Addresses to open a sender on
    pub addresses: Vec<String>,
    /// Hostname announced in the open frame
    pub hostname: String,
    /// Client container id; random when absent
    pub container_id: Option<String>,
    /// Local idle timeout, e.g. `30s`
    pub idle_timeout: Option<String>,
    /// Pump rounds allowed for attaching and for closing
    pub max_rounds: usize,
    /// Pause between pump rounds, e.g. `10ms`
    pub round_interval: String,
}

impl Default for SendConfig {
    fn default() -> Self {
        Self {
            addresses: vec!["examples".to_string()],
            hostname: "localhost".to_string(),
            container_id: None,
            idle_timeout: None,
            max_rounds: 32,
            round_interval: "10ms".to_string(),
        }
    }
}

impl SendConfig {
    /// Load from `path` (defaults when absent) and apply environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::default(),
        };
        config.apply_environment_overrides();
        Ok(config)
    }

    /// Read a YAML file. A missing file falls back to defaults.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Config file {:?} not found, using defaults", path);
                return Ok(Self::default());
            }
            Err(e) => return Err(e).with_context(|| format!("failed to read {:?}", path)),
        };

        let config: Self =
            serde_yaml::from_str(&content).with_context(|| format!("failed to parse config file {:?}", path))?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Apply `PROTON_*` environment variables
    pub fn apply_environment_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(addresses) = lookup("PROTON_ADDRESS") {
            self.addresses = split_list(&addresses);
            info!("Addresses overridden by environment: {:?}", self.addresses);
        }
        if let Some(hostname) = lookup("PROTON_HOSTNAME") {
            self.hostname = hostname;
            info!("Hostname overridden by environment: {}", self.hostname);
        }
        if let Some(container_id) = lookup("PROTON_CONTAINER_ID") {
            info!("Container id overridden by environment: {}", container_id);
            self.container_id = Some(container_id);
        }
        if let Some(idle_timeout) = lookup("PROTON_IDLE_TIMEOUT") {
            info!("Idle timeout overridden by environment: {}", idle_timeout);
            self.idle_timeout = Some(idle_timeout);
        }
    }

    /// Check values that are only parsed on use
    pub fn validate(&self) -> Result<()> {
        if self.addresses.is_empty() {
            anyhow::bail!("at least one address is required");
        }
        if self.max_rounds == 0 {
            anyhow::bail!("max_rounds must be positive");
        }
        self.idle_timeout()?;
        self.round_interval()?;
        Ok(())
    }

    /// Parsed idle timeout
    pub fn idle_timeout(&self) -> Result<Option<Duration>> {
        self.idle_timeout
            .as_deref()
            .map(|text| humantime::parse_duration(text).with_context(|| format!("invalid idle_timeout {:?}", text)))
            .transpose()
    }

    /// Parsed pause between pump rounds
    pub fn round_interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.round_interval)
            .with_context(|| format!("invalid round_interval {:?}", self.round_interval))
    }
}

fn split_list(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = SendConfig::default();
        assert_eq!(config.addresses, vec!["examples".to_string()]);
        assert_eq!(config.hostname, "localhost");
        assert_eq!(config.max_rounds, 32);
        assert_eq!(config.idle_timeout().unwrap(), None);
        assert_eq!(config.round_interval().unwrap(), Duration::from_millis(10));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_file() {
        let yaml_content = r#"
addresses:
  - queue/a
  - queue/b
hostname: broker.example
idle_timeout: 30s
max_rounds: 8
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(yaml_content.as_bytes()).unwrap();

        let config = SendConfig::load_from_file(temp_file.path()).unwrap();
        assert_eq!(config.addresses, vec!["queue/a", "queue/b"]);
        assert_eq!(config.hostname, "broker.example");
        assert_eq!(config.idle_timeout().unwrap(), Some(Duration::from_secs(30)));
        assert_eq!(config.max_rounds, 8);
        assert_eq!(config.round_interval, "10ms");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = SendConfig::load_from_file(dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, SendConfig::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(b"addresses: [unterminated\n").unwrap();
        assert!(SendConfig::load_from_file(temp_file.path()).is_err());
    }

    #[test]
    fn test_environment_overrides() {
        let env: HashMap<&str, &str> = [
            ("PROTON_ADDRESS", "x, y,,z"),
            ("PROTON_HOSTNAME", "peer.example"),
            ("PROTON_CONTAINER_ID", "sender-1"),
            ("PROTON_IDLE_TIMEOUT", "2m"),
        ]
        .into_iter()
        .collect();

        let mut config = SendConfig::default();
        config.apply_overrides(|key| env.get(key).map(|value| value.to_string()));

        assert_eq!(config.addresses, vec!["x", "y", "z"]);
        assert_eq!(config.hostname, "peer.example");
        assert_eq!(config.container_id.as_deref(), Some("sender-1"));
        assert_eq!(config.idle_timeout().unwrap(), Some(Duration::from_secs(120)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let config = SendConfig {
            idle_timeout: Some("later".to_string()),
            ..SendConfig::default()
        };
        assert!(config.validate().is_err());

        let config = SendConfig {
            addresses: Vec::new(),
            ..SendConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

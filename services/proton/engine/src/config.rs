//! Container and transport configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default highest channel number a transport will allocate
pub const DEFAULT_CHANNEL_MAX: u16 = 32767;

/// Default largest frame advertised in the open frame
pub const DEFAULT_MAX_FRAME_SIZE: u32 = 32 * 1024;

/// Container configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// Container id announced in open frames; a random UUID when absent
    pub id: Option<String>,
}

/// Transport configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Close the connection when nothing is received for this long
    #[serde(with = "humantime_opt")]
    pub idle_timeout: Option<Duration>,
    /// Highest channel number to allocate for local sessions
    pub channel_max: u16,
    /// Largest frame size advertised to the peer
    pub max_frame_size: u32,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            idle_timeout: None,
            channel_max: DEFAULT_CHANNEL_MAX,
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
        }
    }
}

/// Optional durations written as humantime strings, e.g. `"30s"`
mod humantime_opt {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(duration) => serializer.serialize_str(&humantime::format_duration(*duration).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Duration>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        raw.map(|text| humantime::parse_duration(&text).map_err(D::Error::custom))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_defaults() {
        let config = TransportConfig::default();
        assert_eq!(config.idle_timeout, None);
        assert_eq!(config.channel_max, DEFAULT_CHANNEL_MAX);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_transport_from_yaml() {
        let config: TransportConfig = serde_yaml::from_str("idle_timeout: 30s\nchannel_max: 8\n").unwrap();
        assert_eq!(config.idle_timeout, Some(Duration::from_secs(30)));
        assert_eq!(config.channel_max, 8);
        assert_eq!(config.max_frame_size, DEFAULT_MAX_FRAME_SIZE);
    }

    #[test]
    fn test_transport_rejects_bad_duration() {
        let result: Result<TransportConfig, _> = serde_yaml::from_str("idle_timeout: soon\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_container_from_yaml() {
        let config: ContainerConfig = serde_yaml::from_str("id: broker-1\n").unwrap();
        assert_eq!(config.id.as_deref(), Some("broker-1"));

        let config: ContainerConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.id, None);
    }
}

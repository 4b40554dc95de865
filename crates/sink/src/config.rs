//! Sink configuration loaded from environment variables.

use broker::{NatsConfig, ReaderConfig};
use common::{env_or, env_parse};

/// Sink configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `BROKER_URL`: NATS server (default: `"nats://localhost:4222"`)
/// - `FRIENDLY_NAME`: name stamped on every log record (default: `"sink"`)
/// - `SUBJECT_PREFIX`: optional prefix for channel subjects
/// - `METRICS_PORT`: Prometheus listener port (default: `9101`)
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_url: String,
    pub friendly_name: String,
    pub subject_prefix: String,
    pub metrics_port: u16,
}

impl Config {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            broker_url: env_or("BROKER_URL", &defaults.broker_url),
            friendly_name: env_or("FRIENDLY_NAME", &defaults.friendly_name),
            subject_prefix: env_or("SUBJECT_PREFIX", &defaults.subject_prefix),
            metrics_port: env_parse("METRICS_PORT", defaults.metrics_port),
        }
    }

    pub fn nats(&self) -> NatsConfig {
        NatsConfig {
            url: self.broker_url.clone(),
            name: Some(self.friendly_name.clone()),
            subject_prefix: Some(self.subject_prefix.clone()),
        }
    }

    pub fn reader(&self) -> ReaderConfig {
        ReaderConfig::default()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_url: "nats://localhost:4222".to_string(),
            friendly_name: "sink".to_string(),
            subject_prefix: String::new(),
            metrics_port: 9101,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.friendly_name, "sink");
        assert_eq!(config.metrics_port, 9101);
        assert_eq!(config.nats().subject(broker::Channel::Event), "event");
    }
}

//! Coordinator configuration loaded from environment variables.

use std::time::Duration;

use broker::{NatsConfig, ReaderConfig};
use common::{env_or, env_parse};

/// Coordinator configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `BROKER_URL`: NATS server (default: `"nats://localhost:4222"`)
/// - `FRIENDLY_NAME`: name stamped on every log record (default: `"coordinator"`)
/// - `SUBJECT_PREFIX`: optional prefix for channel subjects
/// - `METRICS_PORT`: Prometheus listener port (default: `9100`)
/// - `READ_RETRY_DELAY_MS`: pause before resubscribing (default: `1000`)
/// - `BUFFER_CAPACITY`: messages buffered per channel (default: `1000`)
#[derive(Debug, Clone)]
pub struct Config {
    pub broker_url: String,
    pub friendly_name: String,
    pub subject_prefix: String,
    pub metrics_port: u16,
    pub read_retry_delay_ms: u64,
    pub buffer_capacity: usize,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            broker_url: env_or("BROKER_URL", &defaults.broker_url),
            friendly_name: env_or("FRIENDLY_NAME", &defaults.friendly_name),
            subject_prefix: env_or("SUBJECT_PREFIX", &defaults.subject_prefix),
            metrics_port: env_parse("METRICS_PORT", defaults.metrics_port),
            read_retry_delay_ms: env_parse("READ_RETRY_DELAY_MS", defaults.read_retry_delay_ms),
            buffer_capacity: env_parse("BUFFER_CAPACITY", defaults.buffer_capacity),
        }
    }

    /// Broker connection settings for this process.
    pub fn nats(&self) -> NatsConfig {
        NatsConfig {
            url: self.broker_url.clone(),
            name: Some(self.friendly_name.clone()),
            subject_prefix: Some(self.subject_prefix.clone()),
        }
    }

    /// Reader tuning shared by both channels.
    pub fn reader(&self) -> ReaderConfig {
        ReaderConfig {
            buffer_capacity: self.buffer_capacity,
            error_capacity: self.buffer_capacity,
            retry_delay: Duration::from_millis(self.read_retry_delay_ms),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            broker_url: "nats://localhost:4222".to_string(),
            friendly_name: "coordinator".to_string(),
            subject_prefix: String::new(),
            metrics_port: 9100,
            read_retry_delay_ms: 1000,
            buffer_capacity: 1000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.broker_url, "nats://localhost:4222");
        assert_eq!(config.friendly_name, "coordinator");
        assert_eq!(config.metrics_port, 9100);
    }

    #[test]
    fn test_reader_config() {
        let config = Config {
            read_retry_delay_ms: 250,
            buffer_capacity: 16,
            ..Config::default()
        };
        let reader = config.reader();
        assert_eq!(reader.buffer_capacity, 16);
        assert_eq!(reader.retry_delay, Duration::from_millis(250));
    }
}

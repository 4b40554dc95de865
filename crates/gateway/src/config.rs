//! Application configuration loaded from environment variables.

use broker::NatsConfig;
use common::{env_or, env_parse};

/// Gateway configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `PORT`: listen port (default: `3000`)
/// - `BROKER_URL`: NATS server (default: `"nats://localhost:4222"`)
/// - `FRIENDLY_NAME`: name stamped on every log record (default: `"gateway"`)
/// - `SUBJECT_PREFIX`: optional prefix for channel subjects
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub broker_url: String,
    pub friendly_name: String,
    pub subject_prefix: String,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", &defaults.host),
            port: env_parse("PORT", defaults.port),
            broker_url: env_or("BROKER_URL", &defaults.broker_url),
            friendly_name: env_or("FRIENDLY_NAME", &defaults.friendly_name),
            subject_prefix: env_or("SUBJECT_PREFIX", &defaults.subject_prefix),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Broker connection settings for this process.
    pub fn nats(&self) -> NatsConfig {
        NatsConfig {
            url: self.broker_url.clone(),
            name: Some(self.friendly_name.clone()),
            subject_prefix: Some(self.subject_prefix.clone()),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            broker_url: "nats://localhost:4222".to_string(),
            friendly_name: "gateway".to_string(),
            subject_prefix: String::new(),
        }
    }
}

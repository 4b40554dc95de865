//! Participant configuration loaded from environment variables.

use std::time::Duration;

use common::{env_or, env_parse};

use crate::decision::DecisionMode;

/// Participant configuration with sensible defaults.
///
/// Reads from environment variables:
/// - `HOST`: bind address (default: `"0.0.0.0"`)
/// - `GATEWAY_URL`: gateway base URL (default: `"http://localhost:3000"`)
/// - `EXTERNAL_NAME`: host the coordinator calls back on, also the origin
///   service name (default: `"localhost"`)
/// - `EXTERNAL_PORT`: listen and callback port (default: `8888`)
/// - `FRIENDLY_NAME`: name stamped on every log record (default: `"participant"`)
/// - `TICK_INTERVAL_SECS`: seconds between work requests (default: `5`)
/// - `DECISION`: `random`, `commit` or `cancel` (default: `random`)
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub gateway_url: String,
    pub external_name: String,
    pub external_port: u16,
    pub friendly_name: String,
    pub tick_interval_secs: u64,
    pub decision: DecisionMode,
}

impl Config {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_or("HOST", &defaults.host),
            gateway_url: env_or("GATEWAY_URL", &defaults.gateway_url),
            external_name: env_or("EXTERNAL_NAME", &defaults.external_name),
            external_port: env_parse("EXTERNAL_PORT", defaults.external_port),
            friendly_name: env_or("FRIENDLY_NAME", &defaults.friendly_name),
            tick_interval_secs: env_parse("TICK_INTERVAL_SECS", defaults.tick_interval_secs),
            decision: env_parse("DECISION", defaults.decision),
        }
    }

    /// Returns the `"host:port"` bind address string.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.external_port)
    }

    /// Address the coordinator uses to call this participant back.
    pub fn callback_url(&self) -> String {
        format!(
            "http://{}:{}/callback",
            self.external_name, self.external_port
        )
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            gateway_url: "http://localhost:3000".to_string(),
            external_name: "localhost".to_string(),
            external_port: 8888,
            friendly_name: "participant".to_string(),
            tick_interval_secs: 5,
            decision: DecisionMode::Random,
        }
    }
}

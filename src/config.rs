//! Configuration management for oxide-finder

use crate::{Error, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;

/// Finder configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Chrome remote debugging endpoint
    pub cdp_endpoint: String,

    /// Protocol used to build page URLs from paths
    pub protocol: String,

    /// Host used to build page URLs from paths
    pub host: String,

    /// Port used to build page URLs from paths
    pub port: u16,

    /// Wait budget for every polling phase, in milliseconds
    pub timeout_ms: u64,

    /// Delay between two poll ticks, in milliseconds
    pub poll_interval_ms: u64,

    /// Run the element-condition wait a second time before the final fetch
    pub stability_recheck: bool,

    /// Open a new browser even if one is already open
    pub allow_multiple_browsers: bool,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cdp_endpoint: "ws://localhost:9222".to_string(),
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 8080,
            timeout_ms: 10_000,
            poll_interval_ms: 100,
            stability_recheck: true,
            allow_multiple_browsers: false,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let mut config = Config::default();

        if let Ok(endpoint) = env::var("FINDER_CDP_ENDPOINT") {
            config.cdp_endpoint = endpoint;
        }

        if let Ok(protocol) = env::var("FINDER_PROTOCOL") {
            config.protocol = protocol;
        }

        if let Ok(host) = env::var("FINDER_HOST") {
            config.host = host;
        }

        if let Ok(port) = env::var("FINDER_PORT") {
            config.port = port
                .parse()
                .map_err(|_| Error::configuration("Invalid FINDER_PORT"))?;
        }

        if let Ok(timeout) = env::var("FINDER_TIMEOUT_MS") {
            config.timeout_ms = timeout
                .parse()
                .map_err(|_| Error::configuration("Invalid FINDER_TIMEOUT_MS"))?;
        }

        if let Ok(interval) = env::var("FINDER_POLL_INTERVAL_MS") {
            config.poll_interval_ms = interval
                .parse()
                .map_err(|_| Error::configuration("Invalid FINDER_POLL_INTERVAL_MS"))?;
        }

        if let Ok(recheck) = env::var("FINDER_STABILITY_RECHECK") {
            config.stability_recheck = recheck
                .parse()
                .map_err(|_| Error::configuration("Invalid FINDER_STABILITY_RECHECK"))?;
        }

        if let Ok(multiple) = env::var("FINDER_ALLOW_MULTIPLE_BROWSERS") {
            config.allow_multiple_browsers = multiple
                .parse()
                .map_err(|_| Error::configuration("Invalid FINDER_ALLOW_MULTIPLE_BROWSERS"))?;
        }

        if let Ok(log_level) = env::var("FINDER_LOG_LEVEL") {
            config.log_level = log_level;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::configuration(format!("Failed to read config file: {}", e)))?;

        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Wait budget as a duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_ms == 0 {
            return Err(Error::configuration("poll_interval_ms must be greater than zero"));
        }
        Ok(())
    }
}

//! Service configuration: defaults, optional YAML file, env overrides.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::market::RetryConfig;
use crate::screening::ScreeningConfig;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    /// The config file is not valid YAML for this schema.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml_bw::Error),

    /// A value is out of range or inconsistent.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// Top-level service configuration.
///
/// Every field has a default, so an absent file yields a runnable
/// config. Environment variables override file values for the knobs an
/// operator most often changes.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP listener.
    pub server: ServerConfig,
    /// Exchange adapter.
    pub market: MarketConfig,
    /// Screening worker pool.
    pub screening: ScreeningSettings,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Exchange adapter settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    /// Exchange REST base URL.
    pub base_url: String,
    /// Quote asset the screening universe is filtered to.
    pub quote_asset: String,
    /// Attempts before a request is surfaced as failed.
    pub retry_max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub retry_initial_backoff_ms: u64,
    /// Ceiling on the retry delay, in milliseconds.
    pub retry_max_backoff_ms: u64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.binance.com".to_string(),
            quote_asset: "USDC".to_string(),
            retry_max_attempts: 3,
            retry_initial_backoff_ms: 250,
            retry_max_backoff_ms: 2000,
        }
    }
}

/// Screening worker pool settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScreeningSettings {
    /// Symbols screened concurrently.
    pub max_concurrency: usize,
    /// Per-symbol wall-clock cap, in seconds.
    pub symbol_timeout_secs: u64,
    /// Symbols with fewer bars are skipped.
    pub min_bars: usize,
}

impl Default for ScreeningSettings {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            symbol_timeout_secs: 60,
            min_bars: 200,
        }
    }
}

impl Config {
    /// Load from an optional YAML file, then apply environment
    /// overrides and validate.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] on unreadable files, malformed YAML, bad env
    /// values, or out-of-range settings.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML document into a config (no env, no validation).
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml_bw::from_str(yaml)?)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = std::env::var("GRID_ENGINE_HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("GRID_ENGINE_PORT") {
            self.server.port = port.parse().map_err(|_| {
                ConfigError::Validation(format!("GRID_ENGINE_PORT is not a port: {port}"))
            })?;
        }
        if let Ok(url) = std::env::var("GRID_ENGINE_BINANCE_URL") {
            self.market.base_url = url;
        }
        if let Ok(asset) = std::env::var("GRID_ENGINE_QUOTE_ASSET") {
            self.market.quote_asset = asset;
        }
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Validation("server.port must be non-zero".into()));
        }
        if self.market.base_url.is_empty() {
            return Err(ConfigError::Validation("market.base_url must be set".into()));
        }
        if self.market.quote_asset.is_empty() {
            return Err(ConfigError::Validation(
                "market.quote_asset must be set".into(),
            ));
        }
        if self.market.retry_max_attempts == 0 {
            return Err(ConfigError::Validation(
                "market.retry_max_attempts must be at least 1".into(),
            ));
        }
        if self.screening.max_concurrency == 0 {
            return Err(ConfigError::Validation(
                "screening.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Bind address for the HTTP listener.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Retry policy for the exchange adapter.
    #[must_use]
    pub fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.market.retry_max_attempts,
            initial_backoff: Duration::from_millis(self.market.retry_initial_backoff_ms),
            max_backoff: Duration::from_millis(self.market.retry_max_backoff_ms),
            multiplier: 2.0,
        }
    }

    /// Worker pool settings for the screening orchestrator.
    #[must_use]
    pub fn screening(&self) -> ScreeningConfig {
        ScreeningConfig {
            max_concurrency: self.screening.max_concurrency,
            symbol_timeout: Duration::from_secs(self.screening.symbol_timeout_secs),
            min_bars: self.screening.min_bars,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.market.quote_asset, "USDC");
        assert_eq!(config.screening().max_concurrency, 4);
        assert_eq!(config.retry().max_attempts, 3);
    }

    #[test]
    fn partial_yaml_overrides_defaults() {
        let config = Config::from_yaml(
            "server:\n  port: 9000\nmarket:\n  quote_asset: USDT\n",
        )
        .unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.market.quote_asset, "USDT");
        assert_eq!(config.market.base_url, "https://api.binance.com");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(Config::from_yaml("server:\n  prot: 9000\n").is_err());
    }

    #[test]
    fn zero_concurrency_fails_validation() {
        let config = Config::from_yaml("screening:\n  max_concurrency: 0\n").unwrap();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn zero_port_fails_validation() {
        let config = Config::from_yaml("server:\n  port: 0\n").unwrap();
        assert!(config.validate().is_err());
    }
}

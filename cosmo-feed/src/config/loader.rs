use std::path::Path;
use thiserror::Error;
use url::Url;

use super::types::{FeedConfigFile, ReconnectStrategy};
use crate::application::FeedConfig;

/// Environment variable overriding `transport.ws_url`
pub const ENDPOINT_ENV_VAR: &str = "COSMO_FEED_WS_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] serde_json::Error),
    #[error("Invalid endpoint {url}: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: &'static str,
    },
}

/// Load feed configuration from a JSON file, applying environment overrides
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FeedConfigFile, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: FeedConfigFile = serde_json::from_str(&content)?;
    config.apply_env_overrides();
    Ok(config)
}

/// Load configuration from a JSON string
pub fn load_config_from_str(json: &str) -> Result<FeedConfigFile, ConfigError> {
    let config: FeedConfigFile = serde_json::from_str(json)?;
    Ok(config)
}

/// Load the default embedded configuration, applying environment overrides
pub fn load_default_config() -> Result<FeedConfigFile, ConfigError> {
    let default_config = include_str!("feed_config.json");
    let mut config = load_config_from_str(default_config)?;
    config.apply_env_overrides();
    Ok(config)
}

/// Parse the stream endpoint, upgrading ws:// to wss:// in a secure context
pub fn resolve_endpoint(raw: &str, secure_context: bool) -> Result<Url, ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidEndpoint {
        url: raw.to_string(),
        reason: reason.to_string(),
    };

    let mut url = Url::parse(raw).map_err(|e| invalid(&e.to_string()))?;

    match url.scheme() {
        "wss" => {}
        "ws" if secure_context => {
            url.set_scheme("wss")
                .map_err(|_| invalid("cannot upgrade scheme"))?;
        }
        "ws" => {}
        _ => return Err(invalid("scheme must be ws or wss")),
    }

    Ok(url)
}

impl FeedConfigFile {
    /// Apply overrides from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENDPOINT_ENV_VAR).filter(|u| !u.trim().is_empty()) {
            tracing::info!("Using stream endpoint from {}", ENDPOINT_ENV_VAR);
            self.transport.ws_url = url.trim().to_string();
        }
    }

    /// The endpoint the transport should connect to
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        resolve_endpoint(&self.transport.ws_url, self.transport.secure_context)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.endpoint()?;

        if self.transport.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.channel_capacity",
                reason: "must be greater than zero",
            });
        }
        if self.transport.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "transport.connect_timeout_ms",
                reason: "must be greater than zero",
            });
        }
        if self.enrichment.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.timeout_ms",
                reason: "must be greater than zero",
            });
        }
        if self.enrichment.max_concurrent == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "enrichment.max_concurrent",
                reason: "must be greater than zero or null",
            });
        }
        if self.store.capacity == 0 {
            return Err(ConfigError::InvalidValue {
                field: "store.capacity",
                reason: "must be greater than zero",
            });
        }
        if self.reconnect.strategy == ReconnectStrategy::Exponential
            && self.reconnect.max_delay_ms < self.reconnect.delay_ms
        {
            return Err(ConfigError::InvalidValue {
                field: "reconnect.max_delay_ms",
                reason: "must not be below reconnect.delay_ms",
            });
        }
        Ok(())
    }

    /// Validate and convert into the runtime configuration
    pub fn resolve(&self) -> Result<FeedConfig, ConfigError> {
        self.validate()?;
        let endpoint = self.endpoint()?;
        Ok(self.to_feed_config(endpoint.as_str()))
    }
}

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::application::FeedConfig;

/// Root configuration for the feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedConfigFile {
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub enrichment: EnrichmentConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

/// Event stream endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// WebSocket URL of the token-creation stream
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Hosted behind HTTPS: upgrade ws:// to wss://
    #[serde(default)]
    pub secure_context: bool,
    /// Buffered inbound messages per connection
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Give up on a connection attempt (TCP + upgrade) after this long
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            ws_url: default_ws_url(),
            secure_context: false,
            channel_capacity: default_channel_capacity(),
            connect_timeout_ms: default_connect_timeout(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectStrategy {
    #[default]
    Fixed,
    Exponential,
}

/// Reconnection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    #[serde(default)]
    pub strategy: ReconnectStrategy,
    /// Delay before a reconnection attempt (base delay for exponential)
    #[serde(default = "default_reconnect_delay")]
    pub delay_ms: u64,
    /// Upper bound for the exponential strategy
    #[serde(default = "default_max_reconnect_delay")]
    pub max_delay_ms: u64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            strategy: ReconnectStrategy::default(),
            delay_ms: default_reconnect_delay(),
            max_delay_ms: default_max_reconnect_delay(),
        }
    }
}

/// Metadata lookup configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentConfig {
    #[serde(default = "default_enrichment_timeout")]
    pub timeout_ms: u64,
    /// Bound on outstanding lookups; `null` leaves them unbounded
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        EnrichmentConfig {
            timeout_ms: default_enrichment_timeout(),
            max_concurrent: None,
        }
    }
}

/// Feed store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Records retained before the oldest are evicted
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    /// Count shown as "N+" above this many records
    #[serde(default = "default_display_threshold")]
    pub display_threshold: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            capacity: default_capacity(),
            display_threshold: default_display_threshold(),
        }
    }
}

impl FeedConfigFile {
    /// Convert to application-layer FeedConfig, using an already resolved endpoint
    pub fn to_feed_config(&self, endpoint: impl Into<String>) -> FeedConfig {
        let mut config = FeedConfig::new(endpoint)
            .with_channel_capacity(self.transport.channel_capacity)
            .with_connect_timeout(Duration::from_millis(self.transport.connect_timeout_ms))
            .with_reconnect_delay(Duration::from_millis(self.reconnect.delay_ms))
            .with_enrichment_timeout(Duration::from_millis(self.enrichment.timeout_ms))
            .with_store_capacity(self.store.capacity)
            .with_display_threshold(self.store.display_threshold);

        if self.reconnect.strategy == ReconnectStrategy::Exponential {
            config = config
                .with_exponential_backoff(Duration::from_millis(self.reconnect.max_delay_ms));
        }
        if let Some(limit) = self.enrichment.max_concurrent {
            config = config.with_max_concurrent_lookups(limit);
        }
        config
    }
}

// Default value functions for serde
fn default_ws_url() -> String {
    "ws://127.0.0.1:8080/connect".to_string()
}

fn default_channel_capacity() -> usize {
    1024
}

fn default_connect_timeout() -> u64 {
    10000
}

fn default_reconnect_delay() -> u64 {
    3000
}

fn default_max_reconnect_delay() -> u64 {
    30000
}

fn default_enrichment_timeout() -> u64 {
    10000
}

fn default_capacity() -> usize {
    1000
}

fn default_display_threshold() -> usize {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_full_config() {
        let json = r#"{
            "transport": { "ws_url": "wss://feed.example.com/connect", "secure_context": true },
            "reconnect": { "strategy": "exponential", "delay_ms": 500, "max_delay_ms": 8000 },
            "enrichment": { "timeout_ms": 2500, "max_concurrent": 16 },
            "store": { "capacity": 250 }
        }"#;

        let config: FeedConfigFile = serde_json::from_str(json).unwrap();
        assert!(config.transport.secure_context);
        assert_eq!(config.reconnect.strategy, ReconnectStrategy::Exponential);
        assert_eq!(config.enrichment.max_concurrent, Some(16));
        assert_eq!(config.store.capacity, 250);
        assert_eq!(config.store.display_threshold, 100);
    }

    #[test]
    fn test_defaults() {
        let config: FeedConfigFile = serde_json::from_str("{}").unwrap();
        assert_eq!(config.transport.ws_url, "ws://127.0.0.1:8080/connect");
        assert_eq!(config.transport.connect_timeout_ms, 10000);
        assert_eq!(config.reconnect.strategy, ReconnectStrategy::Fixed);
        assert_eq!(config.reconnect.delay_ms, 3000);
        assert_eq!(config.enrichment.timeout_ms, 10000);
        assert_eq!(config.enrichment.max_concurrent, None);
        assert_eq!(config.store.capacity, 1000);
    }

    #[test]
    fn test_to_feed_config() {
        let mut file = FeedConfigFile::default();
        file.enrichment.max_concurrent = Some(4);
        file.reconnect.delay_ms = 250;
        file.transport.connect_timeout_ms = 1500;

        let config = file.to_feed_config("ws://localhost/connect");
        assert_eq!(config.endpoint, "ws://localhost/connect");
        assert_eq!(config.reconnect_delay, Duration::from_millis(250));
        assert_eq!(config.connect_timeout, Duration::from_millis(1500));
        assert_eq!(config.enrichment_timeout, Duration::from_secs(10));
        assert_eq!(config.max_concurrent_lookups, Some(4));
        assert_eq!(config.max_reconnect_delay, None);
    }
}

use std::sync::Arc;
use std::time::Duration;

use super::lifecycle::{ExponentialBackoff, FixedDelay, ReconnectPolicy};
use crate::feed::DEFAULT_CAPACITY;
use crate::feed::display::DEFAULT_DISPLAY_THRESHOLD;

/// Runtime configuration for the feed pipeline
/// Application-level configuration
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// Resolved stream endpoint
    pub endpoint: String,
    /// Buffered inbound messages per connection
    pub channel_capacity: usize,
    /// Bound on opening the stream, handshake included
    pub connect_timeout: Duration,
    /// Delay before reconnecting (base delay when backing off)
    pub reconnect_delay: Duration,
    /// Set to back off exponentially up to this delay
    pub max_reconnect_delay: Option<Duration>,
    /// Per-lookup timeout
    pub enrichment_timeout: Duration,
    /// Bound on outstanding lookups; `None` leaves them unbounded
    pub max_concurrent_lookups: Option<usize>,
    /// Records retained by the feed store
    pub store_capacity: usize,
    /// Count shown as "N+" above this many records
    pub display_threshold: usize,
}

impl FeedConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        FeedConfig {
            endpoint: endpoint.into(),
            channel_capacity: 1024,
            connect_timeout: Duration::from_secs(10),
            reconnect_delay: Duration::from_secs(3),
            max_reconnect_delay: None,
            enrichment_timeout: Duration::from_secs(10),
            max_concurrent_lookups: None,
            store_capacity: DEFAULT_CAPACITY,
            display_threshold: DEFAULT_DISPLAY_THRESHOLD,
        }
    }

    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_exponential_backoff(mut self, max_delay: Duration) -> Self {
        self.max_reconnect_delay = Some(max_delay);
        self
    }

    pub fn with_enrichment_timeout(mut self, timeout: Duration) -> Self {
        self.enrichment_timeout = timeout;
        self
    }

    pub fn with_max_concurrent_lookups(mut self, limit: usize) -> Self {
        self.max_concurrent_lookups = Some(limit);
        self
    }

    pub fn with_store_capacity(mut self, capacity: usize) -> Self {
        self.store_capacity = capacity;
        self
    }

    pub fn with_display_threshold(mut self, threshold: usize) -> Self {
        self.display_threshold = threshold;
        self
    }

    /// Build the reconnect policy described by this configuration
    pub fn reconnect_policy(&self) -> Arc<dyn ReconnectPolicy> {
        match self.max_reconnect_delay {
            Some(max) => Arc::new(ExponentialBackoff::new(self.reconnect_delay, max)),
            None => Arc::new(FixedDelay::new(self.reconnect_delay)),
        }
    }
}

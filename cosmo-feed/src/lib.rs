//! Cosmo Feed
//!
//! Live feed of newly created tokens. Events arrive over a websocket stream;
//! every event becomes a record immediately, and its metadata document is
//! fetched in the background and merged back when it arrives.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Supervisor                        │
//! │  Disconnected -> Connecting -> Connected -> (close/error)│
//! │        ^                                        │        │
//! │        └──────────── retry after delay ─────────┘        │
//! └───────────────────────────┬──────────────────────────────┘
//!                             │ raw messages, in order
//!                             ▼
//! ┌──────────────────────────────────────────────────────────┐
//! │  FeedIngestor: decode -> insert pending record           │
//! └──────────────┬───────────────────────────────┬───────────┘
//!                │ one lookup per record         │
//!                ▼                               ▼
//! ┌───────────────────────────┐     ┌────────────────────────┐
//! │      EnrichmentPool       │────▶│       FeedStore        │
//! │ (concurrent, timeout-bound)│merge│ (newest first, bounded)│
//! └───────────────────────────┘     └────────────────────────┘
//! ```
//!
//! Layers follow the gateway layout:
//! - **Config**: JSON configuration with serde defaults
//! - **Domain**: records, events, connection status, ports
//! - **Application**: lifecycle state machine, supervisor, enrichment, pipeline
//! - **Infrastructure**: websocket transport, HTTP metadata client, decoder
//! - **Feed**: the shared store and display helpers

pub mod application;
pub mod config;
pub mod domain;
pub mod feed;
pub mod infrastructure;

// Re-export commonly used types for convenience
pub use application::{
    EnrichmentPool, FeedConfig, FeedPipeline, PipelineHandle, ReconnectPolicy, Supervisor,
    SupervisorHandle,
};
pub use config::{ConfigError, FeedConfigFile, load_config, load_default_config};
pub use domain::{
    ConnectionState, ConnectionStatus, EnrichmentOutcome, EnrichmentState, FeedEvent, FeedRecord,
    FetchError, MetadataFetcher, TokenMetadata, Transport, TransportEvent, TransportSession,
};
pub use feed::{FeedStore, MergeResult, RecordKey};
pub use infrastructure::{HttpMetadataClient, JsonEventDecoder, WsTransport};

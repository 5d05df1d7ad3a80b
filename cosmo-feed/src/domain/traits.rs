use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use super::events::{FeedEvent, TransportSession};
use super::record::TokenMetadata;

/// Domain error for metadata lookups
///
/// Infrastructure implementations convert their specific errors to this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network or communication failure
    Network(String),
    /// Server answered with a non-success status
    Status(u16),
    /// Body was not a metadata document
    Parse(String),
    /// Body was a JSON `null`
    Empty,
    /// No answer within the lookup timeout
    Timeout,
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Network(msg) => write!(f, "Network error: {}", msg),
            FetchError::Status(code) => write!(f, "HTTP status {}", code),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::Empty => write!(f, "Empty metadata document"),
            FetchError::Timeout => write!(f, "Lookup timed out"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Error opening the event stream
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    Connect(String),
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
}

/// Error decoding one inbound message
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("Message is not a JSON object")]
    NotAnObject,
    #[error("Message has no mint address")]
    MissingIdentity,
}

/// Trait for fetching token metadata documents
///
/// Uses domain-level FetchError to avoid infrastructure leakage.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<TokenMetadata, FetchError>;
}

/// Trait for opening the event stream
///
/// A successful `connect` is the "open" notification; the session then
/// reports messages, close and error.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn connect(&self) -> Result<TransportSession, TransportError>;
}

/// Trait for decoding raw inbound messages
///
/// Open/Closed - swap the wire format without touching the pipeline.
pub trait EventDecoder: Send + Sync {
    fn decode(&self, raw: &str) -> Result<FeedEvent, DecodeError>;
}

/// Receiver of raw messages, called sequentially in arrival order
pub trait MessageSink: Send + Sync {
    fn on_message(&self, raw: &str);
}

mod connection;
mod events;
mod record;
mod traits;

pub use connection::{ConnectionState, ConnectionStatus};
pub use events::{FeedEvent, TransportEvent, TransportSession};
pub use record::{
    EnrichmentOutcome, EnrichmentState, FeedRecord, MetadataAttribute, RecordLink, TokenMetadata,
};
pub use traits::{
    DecodeError, EventDecoder, FetchError, MessageSink, MetadataFetcher, Transport, TransportError,
};

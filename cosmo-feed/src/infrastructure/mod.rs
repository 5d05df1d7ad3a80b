//! Infrastructure Layer - adapters to the outside world
//!
//! - WsTransport: websocket connection to the token-creation stream
//! - HttpMetadataClient: HTTP lookups of token metadata documents
//! - JsonEventDecoder: parsing of stream messages

mod decoder;
mod metadata_client;
mod ws_transport;

pub use decoder::JsonEventDecoder;
pub use metadata_client::{HttpError, HttpMetadataClient};
pub use ws_transport::{WsError, WsTransport};

use serde::Deserialize;
use serde_json::Value;

use crate::domain::{DecodeError, EventDecoder, FeedEvent};

/// Wire shape of a "token created" message
#[derive(Deserialize)]
struct MintCreatedMessage {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    symbol: Option<String>,
    #[serde(default)]
    uri: Option<String>,
    #[serde(default)]
    mint: Option<String>,
}

/// Decoder for `{name, symbol, uri, mint}` JSON messages
/// Infrastructure component - `mint` is the identity key
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEventDecoder;

impl EventDecoder for JsonEventDecoder {
    fn decode(&self, raw: &str) -> Result<FeedEvent, DecodeError> {
        let value: Value = serde_json::from_str(raw)?;
        if !value.is_object() {
            return Err(DecodeError::NotAnObject);
        }
        let message: MintCreatedMessage = serde_json::from_value(value)?;

        let identity = non_empty(message.mint).ok_or(DecodeError::MissingIdentity)?;

        Ok(FeedEvent {
            identity,
            display_name: message.name.unwrap_or_default(),
            symbol: message.symbol.unwrap_or_default(),
            descriptor_uri: non_empty(message.uri),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::events::FeedEvent;

/// Enrichment state of a record
///
/// Moves `Pending -> Loaded` or `Pending -> Failed` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EnrichmentState {
    Pending,
    Loaded,
    Failed,
}

impl EnrichmentState {
    /// Check if the state can no longer change
    pub fn is_settled(&self) -> bool {
        !matches!(self, EnrichmentState::Pending)
    }
}

/// Metadata document fetched from a token's descriptor URI
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: Option<String>,
    pub symbol: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub twitter: Option<String>,
    pub telegram: Option<String>,
    pub website: Option<String>,
    #[serde(rename = "showName")]
    pub show_name: Option<bool>,
    pub attributes: Option<Vec<MetadataAttribute>>,
}

/// Custom attribute attached to token metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataAttribute {
    #[serde(default)]
    pub trait_type: String,
    #[serde(default)]
    pub value: Value,
}

/// Result of one enrichment attempt
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    Loaded(TokenMetadata),
    Failed { reason: String },
}

impl EnrichmentOutcome {
    pub fn failed(reason: impl Into<String>) -> Self {
        EnrichmentOutcome::Failed {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, EnrichmentOutcome::Loaded(_))
    }
}

/// Social link of a record, for rendering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLink<'a> {
    Twitter(&'a str),
    Telegram(&'a str),
    Website(&'a str),
}

/// One entry of the feed
///
/// Event fields are copied verbatim and never change. Only the enrichment
/// part is mutated, and only through the feed store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedRecord {
    pub identity: String,
    pub display_name: String,
    pub symbol: String,
    pub descriptor_uri: Option<String>,
    pub received_at: DateTime<Utc>,
    revision: u64,
    enrichment: Option<TokenMetadata>,
    state: EnrichmentState,
    failure: Option<String>,
}

impl FeedRecord {
    /// Create a pending record for a freshly decoded event
    pub fn pending(event: FeedEvent) -> Self {
        FeedRecord {
            identity: event.identity,
            display_name: event.display_name,
            symbol: event.symbol,
            descriptor_uri: event.descriptor_uri,
            received_at: Utc::now(),
            revision: 0,
            enrichment: None,
            state: EnrichmentState::Pending,
            failure: None,
        }
    }

    pub fn state(&self) -> EnrichmentState {
        self.state
    }

    pub fn enrichment(&self) -> Option<&TokenMetadata> {
        self.enrichment.as_ref()
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    /// Store-assigned insertion revision
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn set_revision(&mut self, revision: u64) {
        self.revision = revision;
    }

    /// Apply an enrichment outcome. Returns false if already settled.
    pub(crate) fn settle(&mut self, outcome: EnrichmentOutcome) -> bool {
        if self.state.is_settled() {
            return false;
        }

        match outcome {
            EnrichmentOutcome::Loaded(metadata) => {
                self.enrichment = Some(metadata);
                self.state = EnrichmentState::Loaded;
            }
            EnrichmentOutcome::Failed { reason } => {
                self.failure = Some(reason);
                self.state = EnrichmentState::Failed;
            }
        }
        true
    }

    /// Name to render: metadata name, then event name, then a placeholder
    pub fn title(&self) -> &str {
        self.enrichment
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .filter(|s| !s.is_empty())
            .or(Some(self.display_name.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or("Unnamed Token")
    }

    /// Ticker to render: metadata symbol, then event symbol, then "N/A"
    pub fn ticker(&self) -> &str {
        self.enrichment
            .as_ref()
            .and_then(|m| m.symbol.as_deref())
            .filter(|s| !s.is_empty())
            .or(Some(self.symbol.as_str()).filter(|s| !s.is_empty()))
            .unwrap_or("N/A")
    }

    /// Image to render, only once enrichment loaded one
    pub fn image(&self) -> Option<&str> {
        match self.state {
            EnrichmentState::Loaded => self.enrichment.as_ref()?.image.as_deref(),
            _ => None,
        }
    }

    pub fn links(&self) -> Vec<RecordLink<'_>> {
        let Some(metadata) = self.enrichment.as_ref() else {
            return Vec::new();
        };

        let mut links = Vec::with_capacity(3);
        if let Some(url) = metadata.twitter.as_deref() {
            links.push(RecordLink::Twitter(url));
        }
        if let Some(url) = metadata.telegram.as_deref() {
            links.push(RecordLink::Telegram(url));
        }
        if let Some(url) = metadata.website.as_deref() {
            links.push(RecordLink::Website(url));
        }
        links
    }
}

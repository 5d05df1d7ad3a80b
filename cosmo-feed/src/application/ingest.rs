use std::sync::Arc;

use crate::domain::{EnrichmentOutcome, EventDecoder, FeedRecord, MessageSink, MetadataFetcher};
use crate::feed::{FeedStore, MergeResult, RecordKey};

use super::enrichment::EnrichmentPool;
use super::stats::PipelineStats;

/// Turns raw stream messages into feed records
///
/// Runs on the supervisor task, one message at a time in arrival order:
/// decode, insert a pending record, then hand the lookup to the pool.
pub struct FeedIngestor<D, F>
where
    D: EventDecoder,
    F: MetadataFetcher + 'static,
{
    decoder: D,
    store: FeedStore,
    pool: EnrichmentPool<F>,
    stats: Arc<PipelineStats>,
}

impl<D, F> FeedIngestor<D, F>
where
    D: EventDecoder,
    F: MetadataFetcher + 'static,
{
    pub fn new(
        decoder: D,
        store: FeedStore,
        pool: EnrichmentPool<F>,
        stats: Arc<PipelineStats>,
    ) -> Self {
        FeedIngestor {
            decoder,
            store,
            pool,
            stats,
        }
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn pool(&self) -> &EnrichmentPool<F> {
        &self.pool
    }

    /// Process one raw message. Returns the inserted record's key, or `None`
    /// if the message was discarded.
    pub fn ingest(&self, raw: &str) -> Option<RecordKey> {
        self.stats.record_message();

        let event = match self.decoder.decode(raw) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!("Discarding stream message: {}", e);
                tracing::trace!("Discarded message: {}", raw);
                self.stats.record_decode_failure();
                return None;
            }
        };

        let uri = event.descriptor_uri.clone();
        let key = self.store.insert(FeedRecord::pending(event))?;
        self.stats.record_insert();
        tracing::debug!("New token {}", key.identity);

        match uri {
            Some(uri) => {
                self.pool.submit(key.clone(), uri);
            }
            None => {
                let result = self
                    .store
                    .merge(&key, EnrichmentOutcome::failed("No metadata URI"));
                if result == MergeResult::Applied {
                    self.stats.record_missing_uri();
                }
            }
        }

        Some(key)
    }
}

impl<D, F> MessageSink for FeedIngestor<D, F>
where
    D: EventDecoder,
    F: MetadataFetcher + 'static,
{
    fn on_message(&self, raw: &str) {
        self.ingest(raw);
    }
}

use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{ConnectionState, FeedRecord, MetadataFetcher, Transport};
use crate::feed::{FeedStore, count_label};
use crate::infrastructure::{HttpError, HttpMetadataClient, JsonEventDecoder, WsTransport};

use super::config::FeedConfig;
use super::enrichment::EnrichmentPool;
use super::ingest::FeedIngestor;
use super::stats::{PipelineStats, StatsSnapshot};
use super::supervisor::{Supervisor, SupervisorHandle};

/// Feed pipeline facade - wires transport, decoder, store and enrichment
///
/// ```text
/// Transport -> Supervisor -> FeedIngestor -> FeedStore (pending)
///                                 |
///                                 v
///                           EnrichmentPool -> FeedStore (merge)
/// ```
pub struct FeedPipeline<T, F>
where
    T: Transport + 'static,
    F: MetadataFetcher + 'static,
{
    config: FeedConfig,
    transport: Arc<T>,
    fetcher: Arc<F>,
}

impl FeedPipeline<WsTransport, HttpMetadataClient> {
    /// Pipeline over the websocket stream and HTTP metadata lookups
    pub fn websocket(config: FeedConfig) -> Result<Self, HttpError> {
        let transport = WsTransport::new(config.endpoint.clone())
            .with_channel_capacity(config.channel_capacity)
            .with_connect_timeout(config.connect_timeout);
        let fetcher = HttpMetadataClient::new(config.enrichment_timeout)?;
        Ok(FeedPipeline::new(config, transport, fetcher))
    }
}

impl<T, F> FeedPipeline<T, F>
where
    T: Transport + 'static,
    F: MetadataFetcher + 'static,
{
    pub fn new(config: FeedConfig, transport: T, fetcher: F) -> Self {
        FeedPipeline {
            config,
            transport: Arc::new(transport),
            fetcher: Arc::new(fetcher),
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Start supervising the stream. Must be called inside a tokio runtime.
    pub fn start(self) -> PipelineHandle {
        let store = FeedStore::new(self.config.store_capacity);
        let stats = Arc::new(PipelineStats::new());

        let mut pool = EnrichmentPool::new(
            self.fetcher,
            store.clone(),
            self.config.enrichment_timeout,
        )
        .with_stats(Arc::clone(&stats));
        if let Some(limit) = self.config.max_concurrent_lookups {
            pool = pool.with_concurrency_limit(limit);
        }

        let ingestor = Arc::new(FeedIngestor::new(
            JsonEventDecoder,
            store.clone(),
            pool,
            Arc::clone(&stats),
        ));

        tracing::info!("Starting feed from {}", self.config.endpoint);
        let supervisor =
            Supervisor::new(self.transport, ingestor, self.config.reconnect_policy()).start();

        PipelineHandle {
            store,
            stats,
            supervisor,
            display_threshold: self.config.display_threshold,
        }
    }
}

/// Handle to a running pipeline, read by the renderer
pub struct PipelineHandle {
    store: FeedStore,
    stats: Arc<PipelineStats>,
    supervisor: SupervisorHandle,
    display_threshold: usize,
}

impl PipelineHandle {
    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    /// Current records, newest first
    pub fn snapshot(&self) -> Vec<FeedRecord> {
        self.store.snapshot()
    }

    pub fn state(&self) -> ConnectionState {
        self.supervisor.state()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.supervisor.subscribe()
    }

    /// Version bumped on every feed mutation
    pub fn subscribe_feed(&self) -> watch::Receiver<u64> {
        self.store.subscribe()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// "N tokens received" count, capped for display
    pub fn count_label(&self) -> String {
        count_label(self.store.len(), self.display_threshold)
    }

    /// Stop the stream and close the store. Lookups still in flight finish
    /// or time out; their results are discarded.
    pub async fn shutdown(self) {
        self.supervisor.shutdown().await;
        self.store.close();
        tracing::info!("Feed stopped");
    }
}

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::domain::{EnrichmentOutcome, FetchError, MetadataFetcher};
use crate::feed::{FeedStore, MergeResult, RecordKey};

use super::stats::PipelineStats;

/// Runs one metadata lookup per record, concurrently and independently
///
/// Every lookup is bounded by `timeout` and never retried. Its outcome is
/// merged into the store by record key; a failure only affects that record.
///
/// Generic over:
/// - `F`: MetadataFetcher - for fetching metadata documents
pub struct EnrichmentPool<F>
where
    F: MetadataFetcher + 'static,
{
    fetcher: Arc<F>,
    store: FeedStore,
    timeout: Duration,
    limiter: Option<Arc<Semaphore>>,
    stats: Arc<PipelineStats>,
    in_flight: Arc<AtomicUsize>,
}

impl<F> EnrichmentPool<F>
where
    F: MetadataFetcher + 'static,
{
    pub fn new(fetcher: Arc<F>, store: FeedStore, timeout: Duration) -> Self {
        EnrichmentPool {
            fetcher,
            store,
            timeout,
            limiter: None,
            stats: Arc::new(PipelineStats::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bound the number of lookups running at once. Extra lookups wait for
    /// a slot; their timeout starts once they get one.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(limit.max(1))));
        self
    }

    pub fn with_stats(mut self, stats: Arc<PipelineStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Lookups submitted and not yet merged
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Spawn the lookup for `key`. Returns immediately.
    pub fn submit(&self, key: RecordKey, uri: String) -> JoinHandle<MergeResult> {
        let fetcher = Arc::clone(&self.fetcher);
        let store = self.store.clone();
        let timeout = self.timeout;
        let limiter = self.limiter.clone();
        let stats = Arc::clone(&self.stats);
        let in_flight = Arc::clone(&self.in_flight);

        in_flight.fetch_add(1, Ordering::SeqCst);
        stats.record_lookup();

        tokio::spawn(async move {
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };

            let outcome = lookup(fetcher.as_ref(), &uri, timeout).await;
            match &outcome {
                EnrichmentOutcome::Loaded(_) => {
                    tracing::debug!("Metadata loaded for {}", key.identity);
                    stats.record_loaded();
                }
                EnrichmentOutcome::Failed { reason } => {
                    tracing::warn!("Metadata lookup failed for {}: {}", key.identity, reason);
                    stats.record_failed();
                }
            }

            let result = store.merge(&key, outcome);
            if result != MergeResult::Applied {
                tracing::debug!("Discarded lookup for {}: {:?}", key.identity, result);
            }

            in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        })
    }
}

/// One bounded lookup; every error and the timeout become a failure
pub async fn lookup<F>(fetcher: &F, uri: &str, timeout: Duration) -> EnrichmentOutcome
where
    F: MetadataFetcher + ?Sized,
{
    match tokio::time::timeout(timeout, fetcher.fetch(uri)).await {
        Ok(Ok(metadata)) => EnrichmentOutcome::Loaded(metadata),
        Ok(Err(e)) => EnrichmentOutcome::failed(e.to_string()),
        Err(_) => EnrichmentOutcome::failed(FetchError::Timeout.to_string()),
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Pipeline counters, shared between the ingest path and enrichment tasks
#[derive(Debug, Default)]
pub struct PipelineStats {
    messages_received: AtomicU64,
    decode_failures: AtomicU64,
    records_inserted: AtomicU64,
    lookups_started: AtomicU64,
    enrichments_loaded: AtomicU64,
    enrichments_failed: AtomicU64,
    records_without_uri: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatsSnapshot {
    pub messages_received: u64,
    pub decode_failures: u64,
    pub records_inserted: u64,
    pub lookups_started: u64,
    pub enrichments_loaded: u64,
    /// Every Failed record, including those that never had a lookup
    pub enrichments_failed: u64,
    /// Records failed up front for lack of a metadata URI
    pub records_without_uri: u64,
}

impl PipelineStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a raw message received
    pub fn record_message(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a message that failed to decode
    pub fn record_decode_failure(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.records_inserted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_lookup(&self) {
        self.lookups_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_loaded(&self) {
        self.enrichments_loaded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failed(&self) {
        self.enrichments_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a record settled Failed without a lookup
    pub fn record_missing_uri(&self) {
        self.records_without_uri.fetch_add(1, Ordering::Relaxed);
        self.enrichments_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            messages_received: self.messages_received.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            records_inserted: self.records_inserted.load(Ordering::Relaxed),
            lookups_started: self.lookups_started.load(Ordering::Relaxed),
            enrichments_loaded: self.enrichments_loaded.load(Ordering::Relaxed),
            enrichments_failed: self.enrichments_failed.load(Ordering::Relaxed),
            records_without_uri: self.records_without_uri.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Lookups started but not yet settled
    pub fn lookups_outstanding(&self) -> u64 {
        let lookup_failures = self
            .enrichments_failed
            .saturating_sub(self.records_without_uri);
        self.lookups_started
            .saturating_sub(self.enrichments_loaded + lookup_failures)
    }
}

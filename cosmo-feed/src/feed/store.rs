use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::watch;

use crate::domain::{EnrichmentOutcome, FeedRecord};

/// Default number of records retained before the oldest are evicted
pub const DEFAULT_CAPACITY: usize = 1000;

/// Identifies one inserted generation of a record
///
/// A newer event for the same identity gets a new revision, so a lookup
/// started for the older event cannot settle the newer record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey {
    pub identity: String,
    pub revision: u64,
}

/// What a merge did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeResult {
    Applied,
    /// No record with that identity (evicted, or store closed)
    NotFound,
    /// Record already Loaded or Failed
    AlreadySettled,
    /// A newer event replaced the record the lookup was started for
    Superseded,
}

/// Ordered, bounded feed of records keyed by identity
/// Thread-safe, can be cloned and shared across tasks
///
/// All mutations go through one mutex, so an insert that replaces a record
/// and a merge that looks it up never interleave.
#[derive(Clone)]
pub struct FeedStore {
    state: Arc<Mutex<StoreState>>,
    changes: Arc<watch::Sender<u64>>,
    capacity: usize,
}

struct StoreState {
    /// Keyed by insertion revision; ascending = oldest first
    records: BTreeMap<u64, FeedRecord>,
    index: HashMap<String, u64>,
    next_revision: u64,
    version: u64,
    evicted: u64,
    closed: bool,
}

impl StoreState {
    fn bump(&mut self) -> u64 {
        self.version += 1;
        self.version
    }
}

impl FeedStore {
    pub fn new(capacity: usize) -> Self {
        let (changes, _) = watch::channel(0);

        FeedStore {
            state: Arc::new(Mutex::new(StoreState {
                records: BTreeMap::new(),
                index: HashMap::new(),
                next_revision: 0,
                version: 0,
                evicted: 0,
                closed: false,
            })),
            changes: Arc::new(changes),
            capacity: capacity.max(1),
        }
    }

    /// Prepend a record, replacing any record with the same identity
    ///
    /// Returns `None` once the store is closed.
    pub fn insert(&self, mut record: FeedRecord) -> Option<RecordKey> {
        let (key, version) = {
            let mut state = self.state.lock();
            if state.closed {
                return None;
            }

            state.next_revision += 1;
            let revision = state.next_revision;

            if let Some(previous) = state.index.remove(&record.identity) {
                state.records.remove(&previous);
                tracing::debug!("Replacing record {}", record.identity);
            }

            record.set_revision(revision);
            let key = RecordKey {
                identity: record.identity.clone(),
                revision,
            };
            state.index.insert(record.identity.clone(), revision);
            state.records.insert(revision, record);

            while state.records.len() > self.capacity {
                let Some((_, evicted)) = state.records.pop_first() else {
                    break;
                };
                state.index.remove(&evicted.identity);
                state.evicted += 1;
                tracing::trace!("Evicted record {}", evicted.identity);
            }

            (key, state.bump())
        };

        self.notify(version);
        Some(key)
    }

    /// Merge a lookup outcome into the record generation it was started for
    pub fn merge(&self, key: &RecordKey, outcome: EnrichmentOutcome) -> MergeResult {
        let version = {
            let mut state = self.state.lock();
            if state.closed {
                return MergeResult::NotFound;
            }

            let Some(&revision) = state.index.get(&key.identity) else {
                return MergeResult::NotFound;
            };
            if revision != key.revision {
                return MergeResult::Superseded;
            }
            let Some(record) = state.records.get_mut(&revision) else {
                return MergeResult::NotFound;
            };
            if !record.settle(outcome) {
                return MergeResult::AlreadySettled;
            }

            state.bump()
        };

        self.notify(version);
        MergeResult::Applied
    }

    /// Merge a lookup outcome into whatever record currently holds `identity`
    pub fn merge_enrichment(&self, identity: &str, outcome: EnrichmentOutcome) -> MergeResult {
        let revision = {
            let state = self.state.lock();
            match state.index.get(identity) {
                Some(&revision) => revision,
                None => return MergeResult::NotFound,
            }
        };

        // A concurrent insert between the two locks yields Superseded,
        // never a write to the wrong generation.
        let key = RecordKey {
            identity: identity.to_string(),
            revision,
        };
        self.merge(&key, outcome)
    }

    /// Current records, newest first
    pub fn snapshot(&self) -> Vec<FeedRecord> {
        self.state.lock().records.values().rev().cloned().collect()
    }

    pub fn get(&self, identity: &str) -> Option<FeedRecord> {
        let state = self.state.lock();
        let revision = state.index.get(identity)?;
        state.records.get(revision).cloned()
    }

    pub fn len(&self) -> usize {
        self.state.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Records dropped to stay within capacity
    pub fn evicted(&self) -> u64 {
        self.state.lock().evicted
    }

    /// Watch channel carrying a version bumped on every mutation
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Stop accepting mutations. Later inserts and merges are no-ops.
    pub fn close(&self) {
        self.state.lock().closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn notify(&self, version: u64) {
        self.changes.send_modify(|current| *current = (*current).max(version));
    }
}

impl Default for FeedStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

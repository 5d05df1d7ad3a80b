//! Feed store and rendering helpers.
//!
//! The store is the only shared mutable state of the pipeline: the ingest
//! path prepends records, enrichment tasks merge lookup outcomes, and the
//! renderer reads snapshots.

pub mod display;
mod store;

pub use display::{count_label, short_address};
pub use store::{DEFAULT_CAPACITY, FeedStore, MergeResult, RecordKey};

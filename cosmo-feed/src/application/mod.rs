mod config;
mod enrichment;
mod ingest;
mod lifecycle;
mod pipeline;
mod stats;
mod supervisor;

pub use config::FeedConfig;
pub use enrichment::{EnrichmentPool, lookup};
pub use ingest::FeedIngestor;
pub use lifecycle::{
    ConnectionLifecycle, ExponentialBackoff, FixedDelay, LifecycleAction, LifecycleEvent,
    ReconnectPolicy,
};
pub use pipeline::{FeedPipeline, PipelineHandle};
pub use stats::{PipelineStats, StatsSnapshot};
pub use supervisor::{Supervisor, SupervisorHandle};

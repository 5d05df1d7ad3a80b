pub mod loader;
pub mod types;

pub use loader::{
    ConfigError, ENDPOINT_ENV_VAR, load_config, load_config_from_str, load_default_config,
    resolve_endpoint,
};
pub use types::{
    EnrichmentConfig, FeedConfigFile, ReconnectConfig, ReconnectStrategy, StoreConfig,
    TransportConfig,
};

use cosmo_feed::feed::short_address;
use cosmo_feed::{FeedPipeline, load_config, load_default_config};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("cosmo_feed=info".parse()?))
        .init();

    let config_file = match std::env::args().nth(1) {
        Some(path) => {
            tracing::info!("Loading config from {}", path);
            load_config(&path)?
        }
        None => load_default_config()?,
    };
    let config = config_file.resolve()?;

    let handle = FeedPipeline::websocket(config)?.start();
    let mut state_rx = handle.subscribe_state();
    let mut feed_rx = handle.subscribe_feed();
    let mut head: Option<(String, u64)> = None;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Shutting down...");
                break;
            }
            changed = state_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = state_rx.borrow_and_update().clone();
                match state.last_error {
                    Some(error) => tracing::info!("{} to stream ({})", state.status.label(), error),
                    None => tracing::info!("{} to stream", state.status.label()),
                }
            }
            changed = feed_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                feed_rx.borrow_and_update();

                let Some(record) = handle.snapshot().into_iter().next() else {
                    continue;
                };
                let current = (record.identity.clone(), record.revision());
                if head.as_ref() != Some(&current) {
                    tracing::info!(
                        "{} ({}) mint {} - {} tokens received",
                        record.title(),
                        record.ticker(),
                        short_address(&record.identity),
                        handle.count_label()
                    );
                    head = Some(current);
                }
            }
        }
    }

    let stats = handle.stats();
    tracing::info!(
        "Received {} messages, {} records, {} enriched, {} failed",
        stats.messages_received,
        stats.records_inserted,
        stats.enrichments_loaded,
        stats.enrichments_failed
    );
    handle.shutdown().await;

    Ok(())
}

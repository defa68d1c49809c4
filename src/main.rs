use anyhow::{Context, Result};
use board_arbitrage::{
    aggregator::BoardAggregator,
    arbitrage::ArbitrageConfig,
    cex,
    config::AppConfig,
    poller::{PollerConfig, PollingLoop},
    utils,
};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = AppConfig::load().context("invalid configuration")?;
    utils::init_logging(config.log_json);

    tracing::info!(
        pair = %config.pair,
        trade_size = %config.trade_size,
        external_cost = %config.external_cost,
        threshold = %config.return_threshold,
        "[INIT] board-arbitrage starting"
    );

    let clients = config
        .venues
        .iter()
        .map(|venue| {
            let signed = venue.credentials.is_some();
            tracing::info!(venue = venue.kind.name(), base_url = %venue.base_url, signed, "[INIT] venue configured");
            cex::build_client(venue)
        })
        .collect::<board_arbitrage::errors::Result<Vec<_>>>()?;

    let aggregator = BoardAggregator::new(clients, config.fetch_timeout);
    let poller = PollingLoop::new(
        aggregator,
        PollerConfig {
            pair: config.pair.clone(),
            depth: config.depth,
            interval: config.poll_interval,
        },
        ArbitrageConfig {
            trade_size: config.trade_size.clone(),
            external_cost: config.external_cost.clone(),
            threshold: config.return_threshold.clone(),
        },
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("[SHUTDOWN] ctrl-c received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                // Sender must outlive the poller; a dropped channel stops it.
                tracing::warn!(error = %e, "[SHUTDOWN] cannot listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        }
    });

    poller.run(shutdown_rx).await;
    Ok(())
}

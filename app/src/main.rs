//! Depeg Swap backend
//!
//! Loads configuration, probes the fullnode once and serves the HTTP API on
//! the configured address (localhost unless `DEPEG_API_HOST` says otherwise).

use anyhow::Context;
use depeg_api::{start_server, AppState};
use depeg_core::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("depeg_swap=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .init();

    let config = AppConfig::load().context("failed to load configuration")?;
    let addr = config.api_addr().context("invalid API address")?;
    tracing::info!(
        network = %config.network,
        rpc = %config.rpc_url(),
        %addr,
        "Starting Depeg Swap"
    );

    let state = AppState::with_config(config);

    // Startup probe only; the API works offline and reports status on demand
    match state.client().await {
        Ok(client) => {
            let status = client.refresh_status().await;
            if status.is_online {
                tracing::info!(
                    chain = status.chain_identifier.as_deref().unwrap_or("unknown"),
                    checkpoint = status.latest_checkpoint.unwrap_or(0),
                    "Fullnode reachable"
                );
            } else {
                tracing::warn!(url = %status.url, "Fullnode not reachable at startup");
            }
        }
        Err(e) => tracing::warn!("Fullnode client unavailable: {}", e),
    }

    start_server(state, addr)
        .await
        .with_context(|| format!("API server on {} failed", addr))?;
    Ok(())
}

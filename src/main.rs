mod api;
mod config;
mod disclosure;
mod dom;
mod error;
mod format;
mod loader;
mod models;
mod page;
mod render;
mod snapshot;

use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // RUST_LOG wins; default to info without module targets
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    info!("Vault dashboard starting...");

    // Load configuration
    let cfg = config::load()?;
    info!("  Snapshots: {}", cfg.data_base_url);
    info!("  Vault candidates: {:?}", cfg.vault_candidates);
    info!("  Swap wallet: {}", cfg.swap_wallet);
    info!("  Port: {}", cfg.port);

    let snapshots = snapshot::SnapshotClient::new(&cfg.data_base_url)?;

    // Disclosure panels live for the whole process
    let panels = disclosure::DisclosurePanels::wire(&page::markup(), cfg.hover_hide_delay);

    let state = api::AppState::new(cfg.clone(), snapshots, panels);

    let api_handle = tokio::spawn({
        let cfg = cfg.clone();
        async move { api::serve(cfg, state).await }
    });

    // Graceful shutdown
    tokio::select! {
        res = api_handle => match res {
            Ok(Ok(_)) => info!("API exited cleanly"),
            Ok(Err(e)) => error!("API error: {:?}", e),
            Err(e) => error!("API task panicked: {:?}", e),
        },
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping...");
        }
    }

    info!("Vault dashboard stopped.");
    Ok(())
}

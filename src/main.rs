// =============================================================================
// Sentix Engine — Main Entry Point
// =============================================================================
//
// Serves the sentiment dashboard API. Without a configured gateway the engine
// runs in demo mode on fixture reports.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod chart;
mod indicators;
mod market_data;
mod runtime_config;
mod sentiment;
mod types;

use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::{RuntimeConfig, CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Sentix Engine — Starting Up                       ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let (mut config, config_store) = RuntimeConfig::load_or_default(CONFIG_PATH);
    config.apply_env_overrides();
    match &config_store {
        Some(store) => info!(path = %store.path().display(), "Config changes will be persisted"),
        None => warn!("Config file is unreadable — runtime changes will not be persisted"),
    }

    // ── 2. Sentiment provider ────────────────────────────────────────────
    let provider = sentiment::build_provider(&config)?;
    info!(provider = provider.name(), default_ticker = %config.default_ticker, "Provider ready");

    // ── 3. Build shared state ────────────────────────────────────────────
    let bind_addr = config.bind_addr.clone();
    let default_ticker = config.default_ticker.clone();
    let state = Arc::new(AppState::new(config, provider)?.with_config_store(config_store));

    // ── 4. Initial analysis, like the dashboard's first load ─────────────
    let startup_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = analysis::run_analysis(&startup_state, &default_ticker).await {
            warn!(ticker = %default_ticker, error = %format!("{e:#}"), "Startup analysis failed");
        }
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let app = api::rest::router(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Some(store) = &state.config_store {
        if let Err(e) = store.save() {
            error!(error = %e, "Failed to save runtime config on shutdown");
        }
    }

    info!("Sentix Engine shut down complete.");
    Ok(())
}

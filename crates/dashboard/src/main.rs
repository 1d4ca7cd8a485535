mod config;
mod state;
mod web;

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::EnvFilter;

use palm_telemetry::TelemetryStore;
use state::DashboardState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── Config ──────────────────────────────────────────────────────
    let cfg = config::load_or_default()?;

    // ── Telemetry snapshot ──────────────────────────────────────────
    let store = TelemetryStore::generate(cfg.farm.tree_count, cfg.farm.seed)?;
    tracing::info!(
        farm = %cfg.farm.name,
        trees = store.len(),
        seeded = cfg.farm.seed.is_some(),
        "telemetry ready"
    );

    // ── Shared state (ephemeral, for the web UI) ────────────────────
    let shared = Arc::new(RwLock::new(DashboardState::new(cfg, store)));
    {
        let mut st = shared.write().await;
        st.record_system("dashboard started".to_string());
    }

    // ── Web server ──────────────────────────────────────────────────
    web::serve(shared).await;

    Ok(())
}

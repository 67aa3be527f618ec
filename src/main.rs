use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};

use bookswap::logging::init_tracing;
use bookswap::metrics::{init_metrics, metrics_app};
use bookswap::router::init_router;
use bookswap::state::init_app_state;
use bookswap_config::server::ServerConfig;

fn run_migrations_enabled() -> bool {
    std::env::var("RUN_MIGRATIONS")
        .map(|v| v.to_lowercase() != "false" && v != "0")
        .unwrap_or(true)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    init_tracing()?;
    let metrics_handle = init_metrics();

    let state = init_app_state().await?;

    if run_migrations_enabled() {
        sqlx::migrate!("./migrations")
            .run(&state.db)
            .await
            .context("Failed to run database migrations")?;
        info!("Database migrations applied");
    }

    let mut app = init_router(state);
    if let Some(handle) = metrics_handle {
        app = app.merge(metrics_app(handle));
    }

    let server_config = ServerConfig::from_env();
    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!(address = %address, "Server running");
    info!("Scalar UI available at http://{address}/scalar");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

use std::net::SocketAddr;

use anyhow::Context;
use dotenvy::dotenv;
use lms::logging::init_tracing;
use lms::metrics::{init_metrics, metrics_app};
use lms::router::init_router;
use lms::state::init_app_state;
use lms_config::AppConfig;
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_tracing().context("failed to initialize logging")?;

    let config = AppConfig::from_env().context("DATABASE_URL must be set")?;
    let addr = config.server.addr();

    let state = init_app_state(config)
        .await
        .context("failed to connect to database")?;
    lms_db::run_migrations(&state.db).await?;

    let mut app = init_router(state);
    if let Some(handle) = init_metrics() {
        app = app.merge(metrics_app(handle));
    }

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!(addr = %addr, "Server running");
    info!("Swagger UI available at /swagger-ui, Scalar at /scalar");

    // Peer addresses feed the auth rate limiter
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}

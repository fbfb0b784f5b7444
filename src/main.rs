mod api_doc;
mod app;
mod config;
mod error;
mod handlers;
mod metrics;
mod middleware;
mod models;
mod routes;
mod state;
mod store;
mod telemetry;
#[cfg(test)]
mod test_support;

use anyhow::Context;
use config::Config;
use metrics::Metrics;
use state::AppState;
use std::sync::Arc;
use store::InstrumentedStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    let _log_guard = telemetry::init(&config)?;

    tracing::info!("kv-gateway starting");
    config.log_startup();

    // An unreachable backend is fatal at startup
    let backend = store::connect(&config)
        .await
        .context("Failed to connect to backend")?;

    let metrics = Arc::new(Metrics::new());
    let state = AppState {
        store: Arc::new(InstrumentedStore::new(backend, metrics.clone())),
        metrics,
    };
    let router = app::router(state, &config.cors_origins);

    let listener = tokio::net::TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    tracing::info!("Listening on {}", config.bind_address());

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("kv-gateway stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

//! Gestion PV server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

use gestion_pv::config::{Cli, PvConfig, StoreConfig};
use gestion_pv::routes::{self, PvState};
use gestion_pv::session::SessionSettings;
use gestion_pv::store::{JsonStore, PgStore, PvStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info".into()),
            )
            .init();
    }

    let config = PvConfig::from_cli(Cli::parse())?;

    tracing::info!("Starting Gestion PV server...");

    let store: Arc<dyn PvStore> = match &config.store {
        StoreConfig::Json { path } => Arc::new(JsonStore::open(path.clone()).await?),
        StoreConfig::Postgres {
            url,
            max_connections,
        } => {
            let store = PgStore::connect(url, *max_connections)?;
            store.migrate().await?;
            Arc::new(store)
        }
    };

    let sessions = SessionSettings::new(&config.secret_key, config.session_ttl)?;

    tracing::info!(
        users = config.credentials.len(),
        "Loaded admin credentials"
    );

    let state = PvState {
        store,
        credentials: Arc::new(config.credentials),
        sessions,
    };
    let app = routes::pv_router(state);

    // Initialize metrics
    gestion_pv::metrics::init_metrics();

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Gestion PV server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received SIGINT, shutting down..."),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down..."),
    }
}

//! # Planboard API Server
//!
//! Serves the project-management API over HTTP.
//!
//! ## Usage
//!
//! ```bash
//! TOKEN_SECRET=$(openssl rand -hex 32) DATABASE_URL=postgresql://... cargo run -p planboard-api
//! TOKEN_SECRET=$(openssl rand -hex 32) STORE=memory cargo run -p planboard-api
//! ```

use std::sync::Arc;

use anyhow::Context;
use planboard_api::{
    app::{build_router, AppState},
    config::{Config, LogFormat, StoreKind},
};
use planboard_shared::{
    auth::password::HashingConfig,
    db::{
        migrations::run_migrations,
        pool::{create_pool, DatabaseConfig},
    },
    store::{MemoryStore, PgStore, SharedStore},
    Services,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(config.log_format);

    tracing::info!(
        "Planboard API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let store = open_store(&config).await?;
    let services = Services::new(
        store.clone(),
        HashingConfig::default(),
        config.token_config()?,
    )?;

    let bind_address = config.bind_address();
    let app = build_router(AppState::new(services, store, config));

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;
    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "planboard_api=debug,planboard_shared=debug,tower_http=debug".into()
    });

    let json = format == LogFormat::Json;

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(fmt::layer))
        .init();
}

async fn open_store(config: &Config) -> anyhow::Result<SharedStore> {
    match config.store {
        StoreKind::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreKind::Postgres => {
            let url = config
                .database
                .url
                .clone()
                .context("DATABASE_URL is required for the postgres store")?;

            let pool = create_pool(DatabaseConfig {
                max_connections: config.database.max_connections,
                ..DatabaseConfig::new(url)
            })
            .await
            .context("failed to connect to database")?;

            run_migrations(&pool).await?;

            Ok(Arc::new(PgStore::new(pool)))
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received, exiting...");
}

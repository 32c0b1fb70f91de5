use anyhow::{bail, Context};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use globetrek_api::app::{app, AppState};
use globetrek_api::auth::{JwtCredentialResolver, JwtKeys};
use globetrek_api::config::{self, StoreBackend};
use globetrek_api::database::{DatabaseManager, ItineraryStore, MemoryItineraryStore, PgItineraryStore};
use globetrek_api::services::{ItineraryService, OwnershipGuard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("globetrek_api=info,tower_http=info")),
        )
        .init();

    // Initialize configuration (this loads the config singleton)
    let config = config::config();
    tracing::info!("Starting GlobeTrek API in {:?} mode", config.environment);

    if globetrek_api::is_production!() && config.security.jwt_secret.is_empty() {
        bail!("JWT_SECRET must be set in production");
    }
    let keys = JwtKeys::from_config(&config.security).context("invalid JWT configuration")?;

    let mut database = None;
    let store: Arc<dyn ItineraryStore> = match config.store {
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory itinerary store; data is lost on exit");
            Arc::new(MemoryItineraryStore::new())
        }
        StoreBackend::Postgres => {
            let manager = DatabaseManager::connect(&config.database).await?;
            if config.database.run_migrations {
                manager.migrate().await?;
            }
            let store = PgItineraryStore::new(manager.pool());
            database = Some(manager);
            Arc::new(store)
        }
    };

    let guard = OwnershipGuard::new(Arc::new(JwtCredentialResolver::new(keys)));
    let state = AppState::new(ItineraryService::new(store, guard));
    let router = app(state, config);

    let bind_addr = format!("0.0.0.0:{}", config.api.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("GlobeTrek API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(manager) = database {
        manager.close().await;
    }
    tracing::info!("GlobeTrek API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

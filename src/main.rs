use jobboard::{
    config::AppConfig,
    db,
    router::build_router,
    services::{BlobStore, FsBlobStore},
    AppState,
};

use anyhow::{bail, Context};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "jobboard=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;
    tracing::info!(
        environment = %config.environment,
        upload_dir = %config.upload_dir.display(),
        "Configuration loaded"
    );

    // Database connection
    let pool = db::create_pool(&config.database_url)
        .await
        .context("failed to open database")?;

    // Migrations are a deployment step; only apply them here when asked to
    let pending = db::pending_migrations(&pool).await?;
    if !pending.is_empty() {
        if config.auto_migrate {
            tracing::info!(count = pending.len(), "Applying pending migrations");
            db::run_migrations(&pool).await?;
        } else {
            bail!(
                "database has {} pending migration(s) {:?}; run `jobboard-cli migrate` or set AUTO_MIGRATE=true",
                pending.len(),
                pending
            );
        }
    }

    let blob_store: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(config.upload_dir.clone()));
    let app_state = AppState::new(
        pool,
        &config.token,
        blob_store,
        config.max_upload_bytes,
    );

    let app = build_router(app_state);

    tracing::info!("Server listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}

//! Dealership back office - HTTP server entry point.
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool and run migrations
//! 3. Build the MercadoPago client and, when configured, the S3 client
//! 4. Build the router and serve on the configured port

use tracing_subscriber::EnvFilter;

use moto_backoffice::{
    clients::{mercadopago::MercadoPagoClient, storage::FileStorage},
    config::Config,
    db, routes,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database_url, config.database_max_connections).await?;
    tracing::info!("Database pool created");

    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    let mercadopago = MercadoPagoClient::new(&config)?;
    if config.mercadopago_app().is_none() {
        tracing::warn!("MercadoPago OAuth is not configured; account linking is disabled");
    }
    if config.mercadopago_webhook_secret.is_none() {
        tracing::warn!("MERCADOPAGO_WEBHOOK_SECRET is not set; notifications will be rejected");
    }

    let storage = FileStorage::from_config(&config).await;
    if storage.is_none() {
        tracing::warn!("AWS_S3_BUCKET is not set; file uploads are disabled");
    }

    let addr = format!("0.0.0.0:{}", config.server_port);
    let app = routes::build_router(AppState::new(pool, config, mercadopago, storage));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

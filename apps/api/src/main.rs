mod admin;
mod auth;
mod campaigns;
mod compose;
mod config;
mod crypto;
mod db;
mod email;
mod errors;
mod llm_client;
mod messages;
mod models;
mod prospects;
mod routes;
mod state;
#[cfg(test)]
mod test_support;
mod unipile;
mod users;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::crypto::Encryptor;
use crate::db::create_pool;
use crate::routes::build_router;
use crate::state::AppState;
use crate::unipile::UnipileClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting outreach API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize Unipile relay
    let unipile = UnipileClient::new(&config.unipile_dsn, config.unipile_api_key.clone())?;
    info!("Unipile client initialized (dsn: {})", config.unipile_dsn);

    // Secrets at rest
    let encryptor = Arc::new(Encryptor::from_base64(&config.encryption_key)?);

    let state = AppState {
        db,
        config: config.clone(),
        unipile,
        encryptor,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

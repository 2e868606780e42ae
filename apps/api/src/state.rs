use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::crypto::Encryptor;
use crate::unipile::UnipileClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    /// Relay for every LinkedIn operation. One API key for the whole service.
    pub unipile: UnipileClient,
    /// Seals mailbox passwords and provider API keys stored on user rows.
    pub encryptor: Arc<Encryptor>,
}

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// HS256 secret shared with the identity provider that issues user JWTs.
    pub jwt_secret: String,
    pub jwt_audience: Option<String>,
    /// Unipile DSN, e.g. `api8.unipile.com:13851`.
    pub unipile_dsn: String,
    pub unipile_api_key: String,
    /// Base64-encoded 32-byte key for account secrets.
    pub encryption_key: String,
    pub default_daily_limit: i64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            jwt_secret: require_env("JWT_SECRET")?,
            jwt_audience: std::env::var("JWT_AUDIENCE").ok().filter(|s| !s.is_empty()),
            unipile_dsn: require_env("UNIPILE_DSN")?,
            unipile_api_key: require_env("UNIPILE_API_KEY")?,
            encryption_key: require_env("ENCRYPTION_KEY")?,
            default_daily_limit: std::env::var("DEFAULT_DAILY_LIMIT")
                .unwrap_or_else(|_| "50".to_string())
                .parse::<i64>()
                .context("DEFAULT_DAILY_LIMIT must be an integer")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

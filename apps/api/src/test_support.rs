//! Shared fixtures for tests. Tests that need real SQL call `pool()`, which
//! connects to `TEST_DATABASE_URL` (or `DATABASE_URL`) and applies the
//! migrations; without either variable those tests return early.

use std::sync::Arc;

use serde_json::json;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::campaigns::store as campaigns;
use crate::config::Config;
use crate::crypto::Encryptor;
use crate::models::prospect::ProspectRow;
use crate::models::user::{EmailAccount, LinkedInAccount, User};
use crate::state::AppState;
use crate::unipile::UnipileClient;

pub const ENCRYPTION_KEY: [u8; 32] = [3u8; 32];

pub fn config() -> Config {
    Config {
        database_url: "postgres://localhost/outreach_test".into(),
        jwt_secret: "test-secret".into(),
        jwt_audience: None,
        unipile_dsn: "127.0.0.1:1".into(),
        unipile_api_key: "key".into(),
        encryption_key: String::new(),
        default_daily_limit: 50,
        port: 0,
        rust_log: "info".into(),
    }
}

pub fn state(db: PgPool) -> AppState {
    let config = config();
    AppState {
        db,
        unipile: UnipileClient::new(&config.unipile_dsn, config.unipile_api_key.clone()).unwrap(),
        encryptor: Arc::new(Encryptor::new(&ENCRYPTION_KEY).unwrap()),
        config,
    }
}

/// Router state whose pool never connects; for paths that fail before SQL.
pub fn lazy_state() -> AppState {
    state(
        PgPoolOptions::new()
            .connect_lazy(&config().database_url)
            .unwrap(),
    )
}

pub async fn pool() -> Option<PgPool> {
    let url = match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => url,
        Err(_) => {
            eprintln!("TEST_DATABASE_URL not set; skipping database test");
            return None;
        }
    };
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&url)
        .await
        .expect("connect to test database");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("apply migrations");
    Some(pool)
}

pub async fn seed_user(
    pool: &PgPool,
    linkedin_accounts: Vec<LinkedInAccount>,
    email_accounts: Vec<EmailAccount>,
) -> User {
    let id = Uuid::new_v4();
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, email, full_name, linkedin_accounts, email_accounts)
        VALUES ($1, $2, 'Test Owner', $3, $4)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(format!("{id}@test.local"))
    .bind(Json(linkedin_accounts))
    .bind(Json(email_accounts))
    .fetch_one(pool)
    .await
    .unwrap()
}

pub async fn seed_campaign(pool: &PgPool, user_id: Uuid) -> Uuid {
    campaigns::create(pool, user_id, "Test campaign", None, &json!({}))
        .await
        .unwrap()
        .id
}

pub async fn seed_prospect(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
    status: &str,
) -> ProspectRow {
    let slug = Uuid::new_v4().simple().to_string();
    sqlx::query_as::<_, ProspectRow>(
        r#"
        INSERT INTO prospects (user_id, campaign_id, linkedin_data, status)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(campaign_id)
    .bind(json!({
        "name": "Ada Lovelace",
        "profile_url": format!("https://www.linkedin.com/in/{slug}"),
        "provider_id": format!("ACo{slug}"),
    }))
    .bind(status)
    .fetch_one(pool)
    .await
    .unwrap()
}

pub fn linkedin_account(account_id: &str, daily_limit: Option<i64>) -> LinkedInAccount {
    LinkedInAccount {
        account_id: account_id.into(),
        username: format!("{account_id}@example.com"),
        status: crate::models::user::LinkedInAccountStatus::Connected,
        checkpoint_type: None,
        daily_limit,
        connected_at: None,
    }
}

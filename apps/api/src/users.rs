//! Persistence for the `users` table. Account arrays are rewritten whole,
//! under a row lock.

use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::user::{AiSettings, EmailAccount, LinkedInAccount, User};

pub async fn find_by_id(pool: &PgPool, user_id: Uuid) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Applies `apply` to the stored LinkedIn accounts under a row lock and
/// writes the result back, so concurrent edits see each other's changes.
pub async fn update_linkedin_accounts<T, E, F>(
    pool: &PgPool,
    user_id: Uuid,
    apply: F,
) -> Result<T, E>
where
    F: FnOnce(&mut Vec<LinkedInAccount>) -> Result<T, E>,
    E: From<sqlx::Error>,
{
    let mut tx = pool.begin().await?;
    let Json(mut accounts) = sqlx::query_scalar::<_, Json<Vec<LinkedInAccount>>>(
        "SELECT linkedin_accounts FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let out = apply(&mut accounts)?;

    sqlx::query("UPDATE users SET linkedin_accounts = $1, updated_at = NOW() WHERE id = $2")
        .bind(Json(&accounts))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(out)
}

/// Same as `update_linkedin_accounts`, for the e-mail account list.
pub async fn update_email_accounts<T, E, F>(
    pool: &PgPool,
    user_id: Uuid,
    apply: F,
) -> Result<T, E>
where
    F: FnOnce(&mut Vec<EmailAccount>) -> Result<T, E>,
    E: From<sqlx::Error>,
{
    let mut tx = pool.begin().await?;
    let Json(mut accounts) = sqlx::query_scalar::<_, Json<Vec<EmailAccount>>>(
        "SELECT email_accounts FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    let out = apply(&mut accounts)?;

    sqlx::query("UPDATE users SET email_accounts = $1, updated_at = NOW() WHERE id = $2")
        .bind(Json(&accounts))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;
    Ok(out)
}

pub async fn save_ai_settings(
    pool: &PgPool,
    user_id: Uuid,
    settings: &AiSettings,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE users SET ai_settings = $1, updated_at = NOW() WHERE id = $2")
        .bind(Json(settings))
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(())
}

/// Admin update of role and/or active flag. Returns the updated row, if any.
pub async fn update_access(
    pool: &PgPool,
    user_id: Uuid,
    is_active: Option<bool>,
    role: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        UPDATE users
        SET is_active = COALESCE($1, is_active),
            role = COALESCE($2, role),
            updated_at = NOW()
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(is_active)
    .bind(role)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

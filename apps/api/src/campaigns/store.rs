use serde_json::Value;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::models::campaign::CampaignRow;

/// Aggregate counters kept on each campaign row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CampaignCounter {
    TotalProspects,
    MessagesSent,
    EmailsSent,
    Replies,
}

impl CampaignCounter {
    pub fn column(&self) -> &'static str {
        match self {
            CampaignCounter::TotalProspects => "total_prospects",
            CampaignCounter::MessagesSent => "messages_sent",
            CampaignCounter::EmailsSent => "emails_sent",
            CampaignCounter::Replies => "replies",
        }
    }
}

/// Atomically adds `delta` (may be negative) to a counter, never going below zero.
/// Scoped to the owner so a foreign campaign id is a no-op.
pub async fn increment<'e, E>(
    executor: E,
    user_id: Uuid,
    campaign_id: Uuid,
    counter: CampaignCounter,
    delta: i32,
) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    let column = counter.column();
    let sql = format!(
        "UPDATE campaigns SET {column} = GREATEST({column} + $1, 0), updated_at = NOW() \
         WHERE id = $2 AND user_id = $3"
    );
    sqlx::query(&sql)
        .bind(delta)
        .bind(campaign_id)
        .bind(user_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn list(pool: &PgPool, user_id: Uuid) -> Result<Vec<CampaignRow>, sqlx::Error> {
    sqlx::query_as::<_, CampaignRow>(
        "SELECT * FROM campaigns WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Uuid,
) -> Result<Option<CampaignRow>, sqlx::Error> {
    sqlx::query_as::<_, CampaignRow>("SELECT * FROM campaigns WHERE id = $1 AND user_id = $2")
        .bind(campaign_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn exists(pool: &PgPool, user_id: Uuid, campaign_id: Uuid) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM campaigns WHERE id = $1 AND user_id = $2)",
    )
    .bind(campaign_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    user_id: Uuid,
    name: &str,
    description: Option<&str>,
    search_criteria: &Value,
) -> Result<CampaignRow, sqlx::Error> {
    sqlx::query_as::<_, CampaignRow>(
        r#"
        INSERT INTO campaigns (user_id, name, description, search_criteria)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(name)
    .bind(description)
    .bind(search_criteria)
    .fetch_one(pool)
    .await
}

pub struct CampaignPatch<'a> {
    pub name: Option<&'a str>,
    pub description: Option<&'a str>,
    pub status: Option<&'a str>,
    pub search_criteria: Option<&'a Value>,
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Uuid,
    patch: CampaignPatch<'_>,
) -> Result<Option<CampaignRow>, sqlx::Error> {
    sqlx::query_as::<_, CampaignRow>(
        r#"
        UPDATE campaigns
        SET name = COALESCE($1, name),
            description = COALESCE($2, description),
            status = COALESCE($3, status),
            search_criteria = COALESCE($4, search_criteria),
            updated_at = NOW()
        WHERE id = $5 AND user_id = $6
        RETURNING *
        "#,
    )
    .bind(patch.name)
    .bind(patch.description)
    .bind(patch.status)
    .bind(patch.search_criteria)
    .bind(campaign_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub async fn delete(pool: &PgPool, user_id: Uuid, campaign_id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM campaigns WHERE id = $1 AND user_id = $2")
        .bind(campaign_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

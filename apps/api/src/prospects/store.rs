use std::collections::HashSet;

use sqlx::types::Json;
use sqlx::{PgPool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use crate::campaigns::store as campaigns;
use crate::campaigns::CampaignCounter;
use crate::models::prospect::{ContactInfo, ProspectRow};
use crate::prospects::status::ProspectStatus;
use crate::prospects::validation::NewProspect;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 500;

#[derive(Debug, Clone, Default)]
pub struct ProspectFilter {
    pub campaign_id: Option<Uuid>,
    pub status: Option<ProspectStatus>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub async fn list(
    pool: &PgPool,
    user_id: Uuid,
    filter: &ProspectFilter,
) -> Result<Vec<ProspectRow>, sqlx::Error> {
    let limit = filter
        .limit
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);
    let offset = filter.offset.unwrap_or(0).max(0);

    sqlx::query_as::<_, ProspectRow>(
        r#"
        SELECT * FROM prospects
        WHERE user_id = $1
          AND ($2::uuid IS NULL OR campaign_id = $2)
          AND ($3::text IS NULL OR status = $3)
        ORDER BY created_at DESC
        LIMIT $4 OFFSET $5
        "#,
    )
    .bind(user_id)
    .bind(filter.campaign_id)
    .bind(filter.status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn get(
    pool: &PgPool,
    user_id: Uuid,
    prospect_id: Uuid,
) -> Result<Option<ProspectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProspectRow>("SELECT * FROM prospects WHERE id = $1 AND user_id = $2")
        .bind(prospect_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Returns which of `profile_urls` the user already tracks.
pub async fn existing_profile_urls(
    pool: &PgPool,
    user_id: Uuid,
    profile_urls: &[String],
) -> Result<HashSet<String>, sqlx::Error> {
    if profile_urls.is_empty() {
        return Ok(HashSet::new());
    }
    let found: Vec<String> = sqlx::query_scalar(
        r#"
        SELECT linkedin_data->>'profile_url'
        FROM prospects
        WHERE user_id = $1 AND linkedin_data->>'profile_url' = ANY($2)
        "#,
    )
    .bind(user_id)
    .bind(profile_urls)
    .fetch_all(pool)
    .await?;
    Ok(found.into_iter().collect())
}

async fn insert_one<'e, E>(
    executor: E,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
    prospect: &NewProspect,
) -> Result<ProspectRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, ProspectRow>(
        r#"
        INSERT INTO prospects (user_id, campaign_id, linkedin_data, contact_info, status, notes)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(campaign_id)
    .bind(Json(&prospect.linkedin_data))
    .bind(Json(&prospect.contact_info))
    .bind(prospect.status.as_str())
    .bind(prospect.notes.as_deref())
    .fetch_one(executor)
    .await
}

/// Inserts prospects and bumps the campaign's `total_prospects` in one transaction.
pub async fn insert_many(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
    prospects: &[NewProspect],
) -> Result<Vec<ProspectRow>, sqlx::Error> {
    if prospects.is_empty() {
        return Ok(Vec::new());
    }

    let mut tx = pool.begin().await?;
    let mut rows = Vec::with_capacity(prospects.len());
    for prospect in prospects {
        rows.push(insert_one(&mut *tx, user_id, campaign_id, prospect).await?);
    }
    if let Some(campaign_id) = campaign_id {
        campaigns::increment(
            &mut *tx,
            user_id,
            campaign_id,
            CampaignCounter::TotalProspects,
            rows.len() as i32,
        )
        .await?;
    }
    tx.commit().await?;

    info!(
        "Inserted {} prospects for user {user_id} (campaign {:?})",
        rows.len(),
        campaign_id
    );
    Ok(rows)
}

pub struct ProspectPatch<'a> {
    pub status: Option<ProspectStatus>,
    pub notes: Option<&'a str>,
    pub contact_info: Option<&'a ContactInfo>,
}

pub async fn update(
    pool: &PgPool,
    user_id: Uuid,
    prospect_id: Uuid,
    patch: ProspectPatch<'_>,
) -> Result<Option<ProspectRow>, sqlx::Error> {
    sqlx::query_as::<_, ProspectRow>(
        r#"
        UPDATE prospects
        SET status = COALESCE($1, status),
            notes = COALESCE($2, notes),
            contact_info = COALESCE($3, contact_info),
            updated_at = NOW()
        WHERE id = $4 AND user_id = $5
        RETURNING *
        "#,
    )
    .bind(patch.status.map(|s| s.as_str()))
    .bind(patch.notes)
    .bind(patch.contact_info.map(Json))
    .bind(prospect_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Deletes a prospect and decrements its campaign counter. Returns false when
/// no such prospect exists for the user.
pub async fn delete(pool: &PgPool, user_id: Uuid, prospect_id: Uuid) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let deleted: Option<Option<Uuid>> = sqlx::query_scalar(
        "DELETE FROM prospects WHERE id = $1 AND user_id = $2 RETURNING campaign_id",
    )
    .bind(prospect_id)
    .bind(user_id)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(campaign_id) = deleted else {
        return Ok(false);
    };
    if let Some(campaign_id) = campaign_id {
        campaigns::increment(
            &mut *tx,
            user_id,
            campaign_id,
            CampaignCounter::TotalProspects,
            -1,
        )
        .await?;
    }
    tx.commit().await?;
    Ok(true)
}

/// Status a prospect holds after outreach. Moves forward to `next` when the
/// transition is legal; a prospect further along keeps its status. Free-text
/// legacy statuses are replaced.
pub fn status_after_contact(current: &str, next: ProspectStatus) -> ProspectStatus {
    match current.parse::<ProspectStatus>() {
        Ok(current) if current.can_transition_to(next) => next,
        Ok(current) => current,
        Err(_) => next,
    }
}

/// Stamps `last_contacted_at` and applies `status_after_contact`.
pub async fn record_contact(
    pool: &PgPool,
    prospect: &ProspectRow,
    next: ProspectStatus,
) -> Result<(), sqlx::Error> {
    let status = status_after_contact(&prospect.status, next);
    if status != next {
        debug!(
            "Prospect {} stays {status}; {next} would move it backwards",
            prospect.id
        );
    }

    sqlx::query(
        "UPDATE prospects SET status = $1, last_contacted_at = NOW(), updated_at = NOW() WHERE id = $2",
    )
    .bind(status.as_str())
    .bind(prospect.id)
    .execute(pool)
    .await?;
    Ok(())
}

/// Caches the LinkedIn member id resolved from Unipile on the prospect.
pub async fn set_provider_id(
    pool: &PgPool,
    prospect_id: Uuid,
    provider_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE prospects
        SET linkedin_data = jsonb_set(linkedin_data, '{provider_id}', to_jsonb($1::text)),
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(provider_id)
    .bind(prospect_id)
    .execute(pool)
    .await?;
    Ok(())
}

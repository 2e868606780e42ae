//! Bulk prospect ingestion shared by `POST /api/prospects/bulk` and the
//! Unipile search import.

use std::collections::HashSet;

use serde::Serialize;
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::campaigns;
use crate::errors::AppError;
use crate::models::prospect::ProspectRow;
use crate::prospects::store;
use crate::prospects::validation::{
    plan_bulk, BulkItemError, BulkPlan, NewProspect, MAX_BULK_PROSPECTS,
};

#[derive(Debug, Serialize)]
pub struct BulkInsertResponse {
    pub inserted: usize,
    pub skipped: usize,
    pub errors: Vec<BulkItemError>,
    pub prospects: Vec<ProspectRow>,
}

pub fn check_batch_size(len: usize) -> Result<(), AppError> {
    if len == 0 {
        return Err(AppError::Validation("prospects cannot be empty".to_string()));
    }
    if len > MAX_BULK_PROSPECTS {
        return Err(AppError::Validation(format!(
            "at most {MAX_BULK_PROSPECTS} prospects per request, got {len}"
        )));
    }
    Ok(())
}

/// Prospects from a validated plan that still need inserting, plus how many
/// were skipped as duplicates of the payload or of stored rows.
#[derive(Debug)]
pub struct BulkSplit {
    pub fresh: Vec<NewProspect>,
    pub skipped: usize,
}

pub fn split_against_existing(
    valid: Vec<NewProspect>,
    duplicates_in_payload: usize,
    existing: &HashSet<String>,
) -> BulkSplit {
    let (fresh, already_tracked): (Vec<_>, Vec<_>) = valid
        .into_iter()
        .partition(|p| !existing.contains(&p.linkedin_data.profile_url));
    BulkSplit {
        fresh,
        skipped: already_tracked.len() + duplicates_in_payload,
    }
}

/// Validates, de-duplicates against the payload and the user's existing
/// prospects, then inserts the remainder.
pub async fn ingest(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
    items: &[Value],
) -> Result<BulkInsertResponse, AppError> {
    check_batch_size(items.len())?;

    campaigns::require_owned(pool, user_id, campaign_id).await?;

    let plan = plan_bulk(items);
    let urls: Vec<String> = plan
        .valid
        .iter()
        .map(|p| p.linkedin_data.profile_url.clone())
        .collect();
    let existing = store::existing_profile_urls(pool, user_id, &urls).await?;

    let BulkPlan {
        valid,
        errors,
        duplicates_in_payload,
    } = plan;
    let BulkSplit { fresh, skipped } =
        split_against_existing(valid, duplicates_in_payload, &existing);

    let rows = store::insert_many(pool, user_id, campaign_id, &fresh).await?;

    info!(
        "Bulk ingest for user {user_id}: {} inserted, {skipped} skipped, {} invalid",
        rows.len(),
        errors.len()
    );

    Ok(BulkInsertResponse {
        inserted: rows.len(),
        skipped,
        errors,
        prospects: rows,
    })
}

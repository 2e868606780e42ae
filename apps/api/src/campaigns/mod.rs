// Campaigns: named outreach efforts with search criteria and aggregate counters.

pub mod handlers;
pub mod store;

pub use store::CampaignCounter;

use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;

/// 404 unless `campaign_id` is absent or names one of the user's campaigns.
/// Callers check this before any external send so a bad id can't fail the
/// row write afterwards.
pub async fn require_owned(
    pool: &PgPool,
    user_id: Uuid,
    campaign_id: Option<Uuid>,
) -> Result<(), AppError> {
    match campaign_id {
        Some(id) if !store::exists(pool, user_id, id).await? => {
            Err(AppError::NotFound(format!("Campaign {id} not found")))
        }
        _ => Ok(()),
    }
}

//! Axum route handlers for campaigns.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::campaigns::store::{self, CampaignPatch};
use crate::errors::AppError;
use crate::models::campaign::CampaignRow;
use crate::state::AppState;

const CAMPAIGN_STATUSES: &[&str] = &["draft", "active", "paused", "completed", "archived"];

#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub search_criteria: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub search_criteria: Option<Value>,
}

fn validate_status(status: Option<&str>) -> Result<(), AppError> {
    match status {
        Some(s) if !CAMPAIGN_STATUSES.contains(&s) => Err(AppError::Validation(format!(
            "status must be one of {}",
            CAMPAIGN_STATUSES.join(", ")
        ))),
        _ => Ok(()),
    }
}

/// GET /api/campaigns
pub async fn handle_list_campaigns(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<CampaignRow>>, AppError> {
    Ok(Json(store::list(&state.db, user.id).await?))
}

/// POST /api/campaigns
pub async fn handle_create_campaign(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignRow>), AppError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }
    let criteria = req.search_criteria.unwrap_or_else(|| Value::Object(Default::default()));
    if !criteria.is_object() {
        return Err(AppError::Validation(
            "search_criteria must be an object".to_string(),
        ));
    }

    let campaign =
        store::create(&state.db, user.id, name, req.description.as_deref(), &criteria).await?;
    info!("Created campaign {} for user {}", campaign.id, user.id);
    Ok((StatusCode::CREATED, Json(campaign)))
}

/// GET /api/campaigns/:id
pub async fn handle_get_campaign(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<CampaignRow>, AppError> {
    store::get(&state.db, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Campaign {id} not found")))
}

/// PATCH /api/campaigns/:id
pub async fn handle_update_campaign(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignRow>, AppError> {
    validate_status(req.status.as_deref())?;
    if matches!(req.name.as_deref(), Some(n) if n.trim().is_empty()) {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let patch = CampaignPatch {
        name: req.name.as_deref().map(str::trim),
        description: req.description.as_deref(),
        status: req.status.as_deref(),
        search_criteria: req.search_criteria.as_ref(),
    };
    store::update(&state.db, user.id, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Campaign {id} not found")))
}

/// DELETE /api/campaigns/:id
pub async fn handle_delete_campaign(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound(format!("Campaign {id} not found")));
    }
    info!("Deleted campaign {id} for user {}", user.id);
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_campaign_status_validation() {
        assert!(validate_status(None).is_ok());
        assert!(validate_status(Some("active")).is_ok());
        assert!(matches!(
            validate_status(Some("running")),
            Err(AppError::Validation(_))
        ));
    }
}

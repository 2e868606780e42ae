//! Axum route handlers for the prospect store.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::prospect::{ContactInfo, ProspectRow};
use crate::prospects::bulk::{self, BulkInsertResponse};
use crate::prospects::status::ProspectStatus;
use crate::prospects::store::{self, ProspectFilter, ProspectPatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListProspectsQuery {
    pub campaign_id: Option<Uuid>,
    pub status: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProspectRequest {
    pub campaign_id: Option<Uuid>,
    #[serde(flatten)]
    pub prospect: Value,
}

#[derive(Debug, Deserialize)]
pub struct BulkProspectsRequest {
    pub campaign_id: Option<Uuid>,
    pub prospects: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProspectRequest {
    pub status: Option<String>,
    pub notes: Option<String>,
    pub contact_info: Option<ContactInfo>,
}

fn parse_status(raw: Option<&str>) -> Result<Option<ProspectStatus>, AppError> {
    raw.map(|s| s.parse::<ProspectStatus>())
        .transpose()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// GET /api/prospects
pub async fn handle_list_prospects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<ListProspectsQuery>,
) -> Result<Json<Vec<ProspectRow>>, AppError> {
    let filter = ProspectFilter {
        campaign_id: params.campaign_id,
        status: parse_status(params.status.as_deref())?,
        limit: params.limit,
        offset: params.offset,
    };
    Ok(Json(store::list(&state.db, user.id, &filter).await?))
}

/// POST /api/prospects
pub async fn handle_create_prospect(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<CreateProspectRequest>,
) -> Result<(StatusCode, Json<ProspectRow>), AppError> {
    let result = bulk::ingest(
        &state.db,
        user.id,
        req.campaign_id,
        std::slice::from_ref(&req.prospect),
    )
    .await?;

    if let Some(err) = result.errors.into_iter().next() {
        return Err(AppError::Validation(err.message));
    }
    result
        .prospects
        .into_iter()
        .next()
        .map(|row| (StatusCode::CREATED, Json(row)))
        .ok_or_else(|| AppError::Conflict("Prospect with this profile_url already exists".to_string()))
}

/// POST /api/prospects/bulk
pub async fn handle_bulk_prospects(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<BulkProspectsRequest>,
) -> Result<Json<BulkInsertResponse>, AppError> {
    let response = bulk::ingest(&state.db, user.id, req.campaign_id, &req.prospects).await?;
    Ok(Json(response))
}

/// GET /api/prospects/:id
pub async fn handle_get_prospect(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<ProspectRow>, AppError> {
    store::get(&state.db, user.id, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))
}

/// PATCH /api/prospects/:id
pub async fn handle_update_prospect(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProspectRequest>,
) -> Result<Json<ProspectRow>, AppError> {
    let next = parse_status(req.status.as_deref())?;

    let existing = store::get(&state.db, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))?;

    if let Some(next) = next {
        // Rows written before statuses were validated may hold free text; let
        // those move anywhere.
        if let Ok(current) = existing.status.parse::<ProspectStatus>() {
            if !current.can_transition_to(next) {
                return Err(AppError::Validation(format!(
                    "cannot move prospect from {current} to {next}"
                )));
            }
        }
    }

    let patch = ProspectPatch {
        status: next,
        notes: req.notes.as_deref(),
        contact_info: req.contact_info.as_ref(),
    };
    store::update(&state.db, user.id, id, patch)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))
}

/// DELETE /api/prospects/:id
pub async fn handle_delete_prospect(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    if !store::delete(&state.db, user.id, id).await? {
        return Err(AppError::NotFound(format!("Prospect {id} not found")));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_status_query() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(
            parse_status(Some("connected")).unwrap(),
            Some(ProspectStatus::Connected)
        );
        assert!(matches!(
            parse_status(Some("lost")),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_create_request_flattens_prospect_fields() {
        let req: CreateProspectRequest = serde_json::from_value(serde_json::json!({
            "campaign_id": null,
            "linkedin_data": {"name": "Ada", "profile_url": "https://linkedin.com/in/ada"}
        }))
        .unwrap();
        assert!(req.campaign_id.is_none());
        assert_eq!(req.prospect["linkedin_data"]["name"], "Ada");
    }
}

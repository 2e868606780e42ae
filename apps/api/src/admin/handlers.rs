use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::admin::is_valid_role;
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::user::UserSummary;
use crate::state::AppState;
use crate::users;

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub is_active: Option<bool>,
    pub role: Option<String>,
}

impl UpdateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.is_active.is_none() && self.role.is_none() {
            return Err(AppError::Validation(
                "Nothing to update: provide is_active or role".to_string(),
            ));
        }
        match self.role.as_deref() {
            Some(role) if !is_valid_role(role) => {
                Err(AppError::Validation(format!("Unknown role '{role}'")))
            }
            _ => Ok(()),
        }
    }
}

/// GET /api/admin/users
pub async fn handle_list_users(
    State(state): State<AppState>,
    caller: AuthUser,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    caller.require_admin()?;
    let rows = users::list_all(&state.db).await?;
    Ok(Json(rows.iter().map(UserSummary::from).collect()))
}

/// PATCH /api/admin/users/:id
pub async fn handle_update_user(
    State(state): State<AppState>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<UserSummary>, AppError> {
    caller.require_admin()?;
    req.validate()?;

    if id == caller.0.id && (req.is_active == Some(false) || req.role.as_deref() == Some("user")) {
        return Err(AppError::Validation(
            "Admins cannot deactivate or demote themselves".to_string(),
        ));
    }

    let user = users::update_access(&state.db, id, req.is_active, req.role.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    info!(
        "Admin {} updated user {id}: active={}, role={}",
        caller.0.id, user.is_active, user.role
    );
    Ok(Json(UserSummary::from(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures;

    #[test]
    fn test_update_request_validation() {
        let empty = UpdateUserRequest { is_active: None, role: None };
        assert!(empty.validate().is_err());

        let bad_role = UpdateUserRequest { is_active: None, role: Some("owner".into()) };
        assert!(matches!(bad_role.validate(), Err(AppError::Validation(_))));

        let ok = UpdateUserRequest { is_active: Some(false), role: Some("admin".into()) };
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn test_require_admin() {
        let mut user = fixtures::user();
        assert!(matches!(
            AuthUser(user.clone()).require_admin(),
            Err(AppError::Forbidden(_))
        ));
        user.role = "admin".into();
        assert!(AuthUser(user).require_admin().is_ok());
    }
}

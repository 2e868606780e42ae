use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use tracing::{debug, warn};

use crate::auth::{bearer_token, verify_token};
use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;
use crate::users;

/// The authenticated, active caller. Add as a handler argument to guard a route.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin access required".to_string()))
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok());

        let token = bearer_token(header).map_err(|e| {
            debug!("Rejecting request: {e}");
            AppError::Unauthorized
        })?;

        let user_id = verify_token(
            token,
            &state.config.jwt_secret,
            state.config.jwt_audience.as_deref(),
        )
        .map_err(|e| {
            warn!("Rejecting bearer token: {e}");
            AppError::Unauthorized
        })?;

        let user = users::find_by_id(&state.db, user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        if !user.is_active {
            return Err(AppError::Forbidden("Account is inactive".to_string()));
        }

        Ok(AuthUser(user))
    }
}

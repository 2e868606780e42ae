//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs issued by the identity provider; `sub` carries the
//! user id. The `AuthUser` extractor loads the matching `users` row and
//! rejects inactive accounts.

mod extractor;

pub use extractor::AuthUser;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),
    #[error("token subject is not a user id")]
    InvalidSubject,
}

/// Decodes and validates a bearer token, returning the user id it names.
pub fn verify_token(token: &str, secret: &str, audience: Option<&str>) -> Result<Uuid, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    match audience {
        Some(aud) => validation.set_audience(&[aud]),
        None => validation.validate_aud = false,
    }

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )?;

    Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header: Option<&str>) -> Result<&str, AuthError> {
    header
        .and_then(|h| {
            h.strip_prefix("Bearer ")
                .or_else(|| h.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(AuthError::MissingToken)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_valid_token_yields_user_id() {
        let id = Uuid::new_v4();
        let token = token_for(&id.to_string(), 3600, None);
        assert_eq!(verify_token(&token, SECRET, None).unwrap(), id);
    }

    #[test]
    fn test_expired_token_rejected() {
        let token = token_for(&Uuid::new_v4().to_string(), -3600, None);
        assert!(matches!(
            verify_token(&token, SECRET, None),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = token_for(&Uuid::new_v4().to_string(), 3600, None);
        assert!(verify_token(&token, "another-secret", None).is_err());
    }

    #[test]
    fn test_non_uuid_subject_rejected() {
        let token = token_for("service-account", 3600, None);
        assert!(matches!(
            verify_token(&token, SECRET, None),
            Err(AuthError::InvalidSubject)
        ));
    }

    #[test]
    fn test_audience_checked_when_configured() {
        let id = Uuid::new_v4();
        let good = token_for(&id.to_string(), 3600, Some("authenticated"));
        let bad = token_for(&id.to_string(), 3600, Some("anon"));
        assert!(verify_token(&good, SECRET, Some("authenticated")).is_ok());
        assert!(verify_token(&bad, SECRET, Some("authenticated")).is_err());
    }

    #[test]
    fn test_audience_array_accepted() {
        let id = Uuid::new_v4();
        let token = token_with_aud(
            &id.to_string(),
            3600,
            Some(serde_json::json!(["authenticated", "api"])),
        );
        assert_eq!(verify_token(&token, SECRET, Some("authenticated")).unwrap(), id);
        assert_eq!(verify_token(&token, SECRET, None).unwrap(), id);
        assert!(verify_token(&token, SECRET, Some("anon")).is_err());
    }

    #[test]
    fn test_bearer_token_parsing() {
        assert_eq!(bearer_token(Some("Bearer abc.def")).unwrap(), "abc.def");
        assert!(bearer_token(Some("Basic xyz")).is_err());
        assert!(bearer_token(Some("Bearer   ")).is_err());
        assert!(bearer_token(None).is_err());
    }
}

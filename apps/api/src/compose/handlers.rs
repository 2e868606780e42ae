use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::compose::{
    composer_for_user, ComposeRequest, ComposedMessage, MessageKind, Personalization, Tone,
};
use crate::crypto::Encryptor;
use crate::errors::AppError;
use crate::models::user::{AiProvider, AiSettings, User};
use crate::prospects::store as prospects;
use crate::state::AppState;
use crate::users;

#[derive(Debug, Deserialize)]
pub struct GenerateMessageRequest {
    pub prospect_id: Option<Uuid>,
    pub kind: MessageKind,
    pub tone: Option<Tone>,
    pub context: Option<String>,
    /// Ad-hoc recipient details, used when no prospect is given.
    pub name: Option<String>,
    pub company: Option<String>,
    pub headline: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveAiSettingsRequest {
    pub provider: AiProvider,
    /// Plaintext key; omit to keep the stored one.
    pub api_key: Option<String>,
    pub default_tone: Option<Tone>,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct AiSettingsView {
    pub provider: AiProvider,
    pub has_api_key: bool,
    pub default_tone: Option<Tone>,
}

impl From<&AiSettings> for AiSettingsView {
    fn from(s: &AiSettings) -> Self {
        Self {
            provider: s.provider,
            has_api_key: s.encrypted_api_key.is_some(),
            default_tone: s.default_tone,
        }
    }
}

fn adhoc_personalization(req: &GenerateMessageRequest, user: &User) -> Personalization {
    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(String::from);
    Personalization {
        first_name: name
            .as_deref()
            .and_then(|n| n.split_whitespace().next())
            .map(String::from),
        name,
        company: req.company.clone().filter(|c| !c.trim().is_empty()),
        headline: req.headline.clone().filter(|h| !h.trim().is_empty()),
        sender_name: Some(user.display_name().to_string()),
    }
}

fn merge_ai_settings(
    existing: &AiSettings,
    req: SaveAiSettingsRequest,
    encryptor: &Encryptor,
) -> Result<AiSettings, AppError> {
    let encrypted_api_key = match req.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty()) {
        Some(key) => Some(encryptor.encrypt(key)?),
        None => existing.encrypted_api_key.clone(),
    };
    if req.provider == AiProvider::Anthropic && encrypted_api_key.is_none() {
        return Err(AppError::Validation(
            "An API key is required for the anthropic provider".to_string(),
        ));
    }
    Ok(AiSettings {
        provider: req.provider,
        encrypted_api_key,
        default_tone: req.default_tone,
    })
}

/// POST /api/ai/generate-message
pub async fn handle_generate_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<GenerateMessageRequest>,
) -> Result<Json<ComposedMessage>, AppError> {
    let personalization = match req.prospect_id {
        Some(id) => {
            let prospect = prospects::get(&state.db, user.id, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))?;
            Personalization::from_profile(&prospect.linkedin_data.0, Some(user.display_name()))
        }
        None => adhoc_personalization(&req, &user),
    };

    let request = ComposeRequest {
        kind: req.kind,
        tone: req
            .tone
            .or(user.ai_settings.0.default_tone)
            .unwrap_or_default(),
        personalization,
        context: req.context.filter(|c| !c.trim().is_empty()),
    };

    let composer = composer_for_user(&user, &state.encryptor)?;
    let message = composer.compose(&request).await?;
    info!(
        "Composed {:?} message for user {} via {}",
        request.kind, user.id, message.composer
    );
    Ok(Json(message))
}

/// GET /api/settings/ai
pub async fn handle_get_ai_settings(AuthUser(user): AuthUser) -> Json<AiSettingsView> {
    Json(AiSettingsView::from(&user.ai_settings.0))
}

/// PUT /api/settings/ai
pub async fn handle_save_ai_settings(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SaveAiSettingsRequest>,
) -> Result<Json<AiSettingsView>, AppError> {
    let settings = merge_ai_settings(&user.ai_settings.0, req, &state.encryptor)?;
    users::save_ai_settings(&state.db, user.id, &settings).await?;
    Ok(Json(AiSettingsView::from(&settings)))
}

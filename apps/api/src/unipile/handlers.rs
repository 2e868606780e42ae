//! Axum route handlers for the Unipile relay.
//!
//! Each handler: validate request → call Unipile → persist the outcome.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::campaigns::store as campaigns;
use crate::campaigns::{self as campaign_rules, CampaignCounter};
use crate::compose::templates::CONNECTION_NOTE_LIMIT;
use crate::compose::{composer_for_user, ComposeRequest, MessageKind, Personalization, Tone};
use crate::errors::AppError;
use crate::messages::{self, NewMessage};
use crate::models::message::{MessageChannel, MessageRow};
use crate::models::prospect::ProspectRow;
use crate::models::user::{LinkedInAccount, LinkedInAccountStatus, User};
use crate::prospects::bulk::{self, BulkInsertResponse};
use crate::prospects::store as prospects;
use crate::prospects::ProspectStatus;
use crate::state::AppState;
use crate::unipile::types::{AccountConnection, SearchPerson, SearchQuery, UnipileAccount};
use crate::unipile::UnipileError;
use crate::users;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ConnectRequest {
    pub username: String,
    pub password: String,
    pub daily_limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub account_id: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct ConnectResponse {
    pub account_id: String,
    pub status: LinkedInAccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkpoint_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AccountsQuery {
    #[serde(default)]
    pub refresh: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub account_id: String,
    #[serde(default)]
    pub cursor: Option<String>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub save: bool,
    #[serde(flatten)]
    pub query: SearchQuery,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub items: Vec<SearchPerson>,
    pub cursor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub import: Option<BulkInsertResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub account_id: String,
    pub prospect_id: Uuid,
    pub text: Option<String>,
    pub tone: Option<Tone>,
    pub kind: Option<MessageKind>,
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    pub account_id: String,
    pub prospect_id: Uuid,
    pub message: Option<String>,
    pub campaign_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct RelayResponse {
    pub message: MessageRow,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessagesQuery {
    pub prospect_id: Option<Uuid>,
}

// ────────────────────────────────────────────────────────────────────────────
// Helpers
// ────────────────────────────────────────────────────────────────────────────

/// Applies a connect/checkpoint outcome to the user's stored accounts.
fn apply_connection(
    accounts: &mut Vec<LinkedInAccount>,
    outcome: &AccountConnection,
    username: Option<&str>,
    daily_limit: Option<i64>,
) -> LinkedInAccount {
    let account_id = outcome.account_id().to_string();
    let idx = match accounts.iter().position(|a| a.account_id == account_id) {
        Some(idx) => idx,
        None => {
            accounts.push(LinkedInAccount {
                account_id: account_id.clone(),
                username: String::new(),
                status: LinkedInAccountStatus::PendingCheckpoint,
                checkpoint_type: None,
                daily_limit: None,
                connected_at: None,
            });
            accounts.len() - 1
        }
    };

    let account = &mut accounts[idx];
    if let Some(username) = username {
        account.username = username.to_string();
    }
    if daily_limit.is_some() {
        account.daily_limit = daily_limit;
    }
    match outcome.checkpoint_type() {
        Some(kind) => {
            account.status = LinkedInAccountStatus::PendingCheckpoint;
            account.checkpoint_type = Some(kind.to_string());
        }
        None => {
            account.status = LinkedInAccountStatus::Connected;
            account.checkpoint_type = None;
            account.connected_at = Some(Utc::now());
        }
    }
    account.clone()
}

fn owned_account<'a>(user: &'a User, account_id: &str) -> Result<&'a LinkedInAccount, AppError> {
    user.linkedin_account(account_id)
        .ok_or_else(|| AppError::NotFound(format!("LinkedIn account {account_id} not found")))
}

fn connected_account<'a>(
    user: &'a User,
    account_id: &str,
) -> Result<&'a LinkedInAccount, AppError> {
    let account = owned_account(user, account_id)?;
    if account.status != LinkedInAccountStatus::Connected {
        return Err(AppError::Validation(format!(
            "LinkedIn account {account_id} is not connected"
        )));
    }
    Ok(account)
}

/// Marks each stored account by the health Unipile reports for it.
fn apply_upstream_health(accounts: &mut [LinkedInAccount], upstream: &[UnipileAccount]) {
    for account in accounts.iter_mut() {
        let remote = upstream.iter().find(|u| u.id == account.account_id);
        account.status = match remote {
            Some(r) if r.is_healthy() => LinkedInAccountStatus::Connected,
            Some(_) if account.status == LinkedInAccountStatus::PendingCheckpoint => {
                LinkedInAccountStatus::PendingCheckpoint
            }
            _ => LinkedInAccountStatus::Disconnected,
        };
    }
}

fn check_daily_limit(sent_today: i64, limit: i64) -> Result<(), AppError> {
    if sent_today >= limit {
        return Err(AppError::RateLimited(format!(
            "Daily limit of {limit} LinkedIn actions reached for this account"
        )));
    }
    Ok(())
}

/// Opens a transaction holding the account's advisory lock and checks the
/// daily limit inside it. The caller relays, writes its `messages` row on
/// the returned transaction and commits; dropping it releases the slot.
async fn reserve_daily_slot(
    pool: &PgPool,
    account_id: &str,
    limit: i64,
) -> Result<Transaction<'static, Postgres>, AppError> {
    let mut tx = pool.begin().await?;
    messages::lock_account(&mut *tx, account_id).await?;
    let since = messages::daily_window_start(Utc::now());
    let sent = messages::count_sent_since(&mut *tx, account_id, since).await?;
    check_daily_limit(sent, limit)?;
    Ok(tx)
}

fn daily_limit(state: &AppState, account: &LinkedInAccount) -> i64 {
    account
        .daily_limit
        .unwrap_or(state.config.default_daily_limit)
}

async fn load_prospect(state: &AppState, user: &User, id: Uuid) -> Result<ProspectRow, AppError> {
    prospects::get(&state.db, user.id, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))
}

/// Returns the prospect's LinkedIn member id, looking it up through Unipile
/// (and caching it) when only a profile URL is known.
async fn resolve_provider_id(
    state: &AppState,
    account_id: &str,
    prospect: &ProspectRow,
) -> Result<String, AppError> {
    let profile = &prospect.linkedin_data.0;
    if let Some(id) = profile.provider_id.as_deref().filter(|s| !s.is_empty()) {
        return Ok(id.to_string());
    }

    let identifier = profile.lookup_identifier().ok_or_else(|| {
        AppError::Validation(format!(
            "Prospect {} has no LinkedIn identifier to message",
            prospect.id
        ))
    })?;

    let resolved = state.unipile.get_profile(account_id, &identifier).await?;
    prospects::set_provider_id(&state.db, prospect.id, &resolved.provider_id).await?;
    Ok(resolved.provider_id)
}

/// Prospect status and campaign counter touched by each relayed channel.
/// Invitations are not messages, so they leave `messages_sent` alone.
fn outreach_effects(channel: MessageChannel) -> (ProspectStatus, Option<CampaignCounter>) {
    match channel {
        MessageChannel::LinkedinMessage => {
            (ProspectStatus::Contacted, Some(CampaignCounter::MessagesSent))
        }
        MessageChannel::LinkedinInvitation => (ProspectStatus::InvitationSent, None),
    }
}

/// Bookkeeping after a successful relay: prospect status and campaign counter.
async fn record_outreach(
    state: &AppState,
    user: &User,
    prospect: &ProspectRow,
    campaign_id: Option<Uuid>,
    channel: MessageChannel,
) -> Result<(), AppError> {
    let (next, counter) = outreach_effects(channel);
    prospects::record_contact(&state.db, prospect, next).await?;
    if let (Some(campaign_id), Some(counter)) = (campaign_id, counter) {
        campaigns::increment(&state.db, user.id, campaign_id, counter, 1).await?;
    }
    Ok(())
}

/// Writes the relayed row and releases the daily-limit slot. The upstream
/// call already succeeded, so a failure here is logged with its ids.
async fn commit_relay(
    mut tx: Transaction<'static, Postgres>,
    record: NewMessage<'_>,
    upstream_ref: &str,
) -> Result<MessageRow, AppError> {
    let prospect_id = record.prospect_id;
    let written = match messages::insert_message(&mut *tx, record).await {
        Ok(row) => tx.commit().await.map(|_| row),
        Err(e) => Err(e),
    };
    written.map_err(|e| {
        error!("Relayed {upstream_ref} but not recorded for prospect {prospect_id:?}: {e}");
        AppError::Database(e)
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/unipile/connect
pub async fn handle_connect(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<ConnectRequest>,
) -> Result<Json<ConnectResponse>, AppError> {
    let username = req.username.trim();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "username and password are required".to_string(),
        ));
    }
    if matches!(req.daily_limit, Some(l) if l <= 0) {
        return Err(AppError::Validation("daily_limit must be positive".to_string()));
    }

    let outcome = state.unipile.connect_linkedin(username, &req.password).await?;

    let account = users::update_linkedin_accounts(&state.db, user.id, |accounts| {
        Ok::<_, AppError>(apply_connection(
            accounts,
            &outcome,
            Some(username),
            req.daily_limit,
        ))
    })
    .await?;

    Ok(Json(ConnectResponse {
        account_id: account.account_id,
        status: account.status,
        checkpoint_type: account.checkpoint_type,
    }))
}

/// POST /api/unipile/verify
pub async fn handle_verify(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<ConnectResponse>, AppError> {
    let code = req.code.trim();
    if code.is_empty() {
        return Err(AppError::Validation("code is required".to_string()));
    }
    owned_account(&user, &req.account_id)?;

    let outcome = state.unipile.solve_checkpoint(&req.account_id, code).await?;

    let account = users::update_linkedin_accounts(&state.db, user.id, |accounts| {
        Ok::<_, AppError>(apply_connection(accounts, &outcome, None, None))
    })
    .await?;
    info!(
        "Checkpoint for account {} -> {:?}",
        account.account_id, account.status
    );

    Ok(Json(ConnectResponse {
        account_id: account.account_id,
        status: account.status,
        checkpoint_type: account.checkpoint_type,
    }))
}

/// GET /api/unipile/accounts
pub async fn handle_list_accounts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<AccountsQuery>,
) -> Result<Json<Vec<LinkedInAccount>>, AppError> {
    if !params.refresh || user.linkedin_accounts.0.is_empty() {
        return Ok(Json(user.linkedin_accounts.0));
    }

    let upstream = state.unipile.list_accounts().await?;
    let accounts = users::update_linkedin_accounts(&state.db, user.id, |accounts| {
        apply_upstream_health(accounts, &upstream);
        Ok::<_, AppError>(accounts.clone())
    })
    .await?;
    Ok(Json(accounts))
}

/// DELETE /api/unipile/accounts/:account_id
pub async fn handle_delete_account(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Path(account_id): Path<String>,
) -> Result<StatusCode, AppError> {
    owned_account(&user, &account_id)?;

    match state.unipile.delete_account(&account_id).await {
        Ok(()) => {}
        Err(UnipileError::Api { status: 404, .. }) => {
            warn!("Account {account_id} already gone upstream; removing locally");
        }
        Err(e) => return Err(e.into()),
    }

    users::update_linkedin_accounts(&state.db, user.id, |accounts| {
        accounts.retain(|a| a.account_id != account_id);
        Ok::<_, AppError>(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/unipile/search
pub async fn handle_search(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, AppError> {
    connected_account(&user, &req.account_id)?;
    if req.query.keywords.as_deref().map_or(true, |k| k.trim().is_empty())
        && req.query.filters.is_empty()
    {
        return Err(AppError::Validation(
            "keywords or at least one filter is required".to_string(),
        ));
    }

    let results = state
        .unipile
        .search_people(&req.account_id, &req.query, req.cursor.as_deref(), req.limit)
        .await?;

    let import = if req.save && !results.items.is_empty() {
        let items: Vec<_> = results.items.iter().map(SearchPerson::to_prospect_value).collect();
        Some(bulk::ingest(&state.db, user.id, req.campaign_id, &items).await?)
    } else {
        None
    };

    Ok(Json(SearchResponse {
        items: results.items,
        cursor: results.cursor,
        import,
    }))
}

/// POST /api/unipile/send-message
pub async fn handle_send_message(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<RelayResponse>, AppError> {
    let account = connected_account(&user, &req.account_id)?;
    let prospect = load_prospect(&state, &user, req.prospect_id).await?;
    campaign_rules::require_owned(&state.db, user.id, req.campaign_id).await?;
    let campaign_id = req.campaign_id.or(prospect.campaign_id);

    let text = match req.text.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        Some(text) => text.to_string(),
        None => {
            let composer = composer_for_user(&user, &state.encryptor)?;
            let request = ComposeRequest {
                kind: req.kind.unwrap_or(MessageKind::Introduction),
                tone: req
                    .tone
                    .or(user.ai_settings.0.default_tone)
                    .unwrap_or_default(),
                personalization: Personalization::from_profile(
                    &prospect.linkedin_data.0,
                    Some(user.display_name()),
                ),
                context: None,
            };
            composer.compose(&request).await?.content
        }
    };

    let provider_id = resolve_provider_id(&state, &req.account_id, &prospect).await?;
    let slot = reserve_daily_slot(&state.db, &req.account_id, daily_limit(&state, account)).await?;
    let chat = state
        .unipile
        .start_chat(&req.account_id, &provider_id, &text)
        .await?;

    let row = commit_relay(
        slot,
        NewMessage {
            user_id: user.id,
            prospect_id: Some(prospect.id),
            campaign_id,
            channel: MessageChannel::LinkedinMessage,
            account_id: &req.account_id,
            content: &text,
            unipile_chat_id: Some(&chat.chat_id),
            unipile_message_id: chat.message_id.as_deref(),
        },
        &format!("chat {}", chat.chat_id),
    )
    .await?;

    record_outreach(&state, &user, &prospect, campaign_id, MessageChannel::LinkedinMessage).await?;
    info!(
        "Relayed LinkedIn message to prospect {} via account {}",
        prospect.id, req.account_id
    );

    Ok(Json(RelayResponse {
        message: row,
        chat_id: Some(chat.chat_id),
    }))
}

/// POST /api/unipile/invite
pub async fn handle_invite(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<InviteRequest>,
) -> Result<Json<RelayResponse>, AppError> {
    let note = req.message.as_deref().map(str::trim).filter(|m| !m.is_empty());
    if let Some(note) = note {
        if note.chars().count() > CONNECTION_NOTE_LIMIT {
            return Err(AppError::Validation(format!(
                "invitation note must be at most {CONNECTION_NOTE_LIMIT} characters"
            )));
        }
    }

    let account = connected_account(&user, &req.account_id)?;
    let prospect = load_prospect(&state, &user, req.prospect_id).await?;
    campaign_rules::require_owned(&state.db, user.id, req.campaign_id).await?;
    let campaign_id = req.campaign_id.or(prospect.campaign_id);

    let provider_id = resolve_provider_id(&state, &req.account_id, &prospect).await?;
    let slot = reserve_daily_slot(&state.db, &req.account_id, daily_limit(&state, account)).await?;
    let invitation = state
        .unipile
        .send_invitation(&req.account_id, &provider_id, note)
        .await?;

    let row = commit_relay(
        slot,
        NewMessage {
            user_id: user.id,
            prospect_id: Some(prospect.id),
            campaign_id,
            channel: MessageChannel::LinkedinInvitation,
            account_id: &req.account_id,
            content: note.unwrap_or_default(),
            unipile_chat_id: None,
            unipile_message_id: None,
        },
        &format!(
            "invitation {}",
            invitation.invitation_id.as_deref().unwrap_or("(no id)")
        ),
    )
    .await?;

    record_outreach(
        &state,
        &user,
        &prospect,
        campaign_id,
        MessageChannel::LinkedinInvitation,
    )
    .await?;

    Ok(Json(RelayResponse {
        message: row,
        chat_id: None,
    }))
}

/// GET /api/messages
pub async fn handle_list_messages(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<MessagesQuery>,
) -> Result<Json<Vec<MessageRow>>, AppError> {
    Ok(Json(
        messages::list_messages(&state.db, user.id, params.prospect_id).await?,
    ))
}

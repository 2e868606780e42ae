//! Axum route handlers for e-mail sending and mailbox settings.

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::campaigns::store as campaigns;
use crate::campaigns::{self as campaign_rules, CampaignCounter};
use crate::crypto::Encryptor;
use crate::email::{build_message, deliver, smtp_settings, OutgoingEmail};
use crate::errors::AppError;
use crate::messages::{self, NewSentEmail};
use crate::models::message::SentEmailRow;
use crate::models::user::{EmailAccount, EmailProvider};
use crate::prospects::store as prospects;
use crate::prospects::ProspectStatus;
use crate::state::AppState;
use crate::users;

#[derive(Debug, Deserialize)]
pub struct SendEmailRequest {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub account_id: Option<String>,
    pub prospect_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    #[serde(default)]
    pub is_html: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailAccountInput {
    #[serde(flatten)]
    pub account: EmailAccount,
    /// Plaintext password; encrypted before storage. Omit to keep the stored one.
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SaveEmailAccountsRequest {
    pub accounts: Vec<EmailAccountInput>,
}

/// Account as returned to clients. The sealed password is never included.
#[derive(Debug, Serialize, PartialEq)]
pub struct EmailAccountView {
    pub id: String,
    pub email: String,
    pub provider: EmailProvider,
    pub smtp_host: Option<String>,
    pub smtp_port: Option<u16>,
    pub username: Option<String>,
    pub from_name: Option<String>,
    pub is_default: bool,
    pub has_password: bool,
}

impl From<&EmailAccount> for EmailAccountView {
    fn from(a: &EmailAccount) -> Self {
        Self {
            id: a.id.clone(),
            email: a.email.clone(),
            provider: a.provider,
            smtp_host: a.smtp_host.clone(),
            smtp_port: a.smtp_port,
            username: a.username.clone(),
            from_name: a.from_name.clone(),
            is_default: a.is_default,
            has_password: a.encrypted_password.is_some(),
        }
    }
}

/// Validates submitted accounts, seals new passwords and carries stored ones
/// forward. Exactly one account ends up default when any exist.
fn merge_email_accounts(
    existing: &[EmailAccount],
    inputs: Vec<EmailAccountInput>,
    encryptor: &Encryptor,
) -> Result<Vec<EmailAccount>, AppError> {
    let mut merged: Vec<EmailAccount> = Vec::with_capacity(inputs.len());

    for input in inputs {
        let mut account = input.account;
        account.email = account.email.trim().to_string();
        if !account.email.contains('@') {
            return Err(AppError::Validation(format!(
                "'{}' is not an email address",
                account.email
            )));
        }
        smtp_settings(&account)?;

        if account.id.trim().is_empty() {
            account.id = Uuid::new_v4().to_string();
        }
        if merged.iter().any(|a| a.id == account.id) {
            return Err(AppError::Validation(format!(
                "duplicate account id {}",
                account.id
            )));
        }

        account.encrypted_password = match input.password.as_deref().filter(|p| !p.is_empty()) {
            Some(password) => Some(encryptor.encrypt(password)?),
            None => existing
                .iter()
                .find(|a| a.id == account.id)
                .and_then(|a| a.encrypted_password.clone()),
        };
        merged.push(account);
    }

    let first_default = merged.iter().position(|a| a.is_default).unwrap_or(0);
    for (i, account) in merged.iter_mut().enumerate() {
        account.is_default = i == first_default;
    }
    Ok(merged)
}

/// GET /api/settings/email-accounts
pub async fn handle_get_email_accounts(
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<EmailAccountView>>, AppError> {
    Ok(Json(
        user.email_accounts.0.iter().map(EmailAccountView::from).collect(),
    ))
}

/// PUT /api/settings/email-accounts
pub async fn handle_save_email_accounts(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SaveEmailAccountsRequest>,
) -> Result<Json<Vec<EmailAccountView>>, AppError> {
    let views = users::update_email_accounts(&state.db, user.id, |accounts| {
        *accounts = merge_email_accounts(accounts, req.accounts, &state.encryptor)?;
        Ok::<_, AppError>(accounts.iter().map(EmailAccountView::from).collect())
    })
    .await?;
    Ok(Json(views))
}

/// POST /api/messages/send-email
pub async fn handle_send_email(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(req): Json<SendEmailRequest>,
) -> Result<Json<SentEmailRow>, AppError> {
    if req.to.trim().is_empty() || req.subject.trim().is_empty() || req.body.trim().is_empty() {
        return Err(AppError::Validation(
            "to, subject and body are required".to_string(),
        ));
    }

    let account = match user.email_account(req.account_id.as_deref()) {
        Some(account) => account,
        None if req.account_id.is_some() => {
            return Err(AppError::NotFound("Email account not found".to_string()))
        }
        None => {
            return Err(AppError::Validation(
                "No email account configured".to_string(),
            ))
        }
    };
    let sealed = account.encrypted_password.as_deref().ok_or_else(|| {
        AppError::Validation(format!("Email account {} has no stored password", account.email))
    })?;
    let password = state.encryptor.decrypt(sealed)?;

    let prospect = match req.prospect_id {
        Some(id) => Some(
            prospects::get(&state.db, user.id, id)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Prospect {id} not found")))?,
        ),
        None => None,
    };
    campaign_rules::require_owned(&state.db, user.id, req.campaign_id).await?;

    let outgoing = OutgoingEmail {
        to: &req.to,
        subject: &req.subject,
        body: &req.body,
        is_html: req.is_html,
    };
    let message = build_message(account, &outgoing)?;
    let outcome = deliver(account, password, message).await;

    let campaign_id = req
        .campaign_id
        .or_else(|| prospect.as_ref().and_then(|p| p.campaign_id));
    let row = messages::insert_sent_email(
        &state.db,
        NewSentEmail {
            user_id: user.id,
            prospect_id: prospect.as_ref().map(|p| p.id),
            campaign_id,
            from_email: &account.email,
            to_email: req.to.trim(),
            subject: &req.subject,
            body: &req.body,
            error: outcome.as_ref().err().map(String::as_str),
        },
    )
    .await?;

    if let Err(reason) = outcome {
        warn!("Email to {} failed: {reason}", req.to);
        return Err(AppError::Email(reason));
    }

    if let Some(prospect) = &prospect {
        prospects::record_contact(&state.db, prospect, ProspectStatus::Contacted).await?;
    }
    if let Some(campaign_id) = campaign_id {
        campaigns::increment(&state.db, user.id, campaign_id, CampaignCounter::EmailsSent, 1)
            .await?;
    }

    Ok(Json(row))
}

/// GET /api/messages/sent-emails
pub async fn handle_list_sent_emails(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<SentEmailRow>>, AppError> {
    Ok(Json(messages::list_sent_emails(&state.db, user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures;
    use crate::test_support::{self, pool};
    use sqlx::PgPool;

    fn encryptor() -> Encryptor {
        Encryptor::new(&[5u8; 32]).unwrap()
    }

    fn input(id: &str, password: Option<&str>, is_default: bool) -> EmailAccountInput {
        EmailAccountInput {
            account: fixtures::email_account(id, is_default),
            password: password.map(String::from),
        }
    }

    #[test]
    fn test_new_password_is_sealed() {
        let enc = encryptor();
        let merged = merge_email_accounts(&[], vec![input("a", Some("pw"), true)], &enc).unwrap();
        let sealed = merged[0].encrypted_password.as_deref().unwrap();
        assert_ne!(sealed, "pw");
        assert_eq!(enc.decrypt(sealed).unwrap(), "pw");
    }

    #[test]
    fn test_omitted_password_keeps_stored_secret() {
        let enc = encryptor();
        let mut stored = fixtures::email_account("a", true);
        stored.encrypted_password = Some(enc.encrypt("old").unwrap());
        let merged =
            merge_email_accounts(&[stored.clone()], vec![input("a", None, true)], &enc).unwrap();
        assert_eq!(merged[0].encrypted_password, stored.encrypted_password);
    }

    #[test]
    fn test_single_default_and_generated_ids() {
        let enc = encryptor();
        let merged = merge_email_accounts(
            &[],
            vec![input("", None, false), input("b", None, true), input("c", None, true)],
            &enc,
        )
        .unwrap();
        assert!(!merged[0].id.is_empty());
        let defaults: Vec<_> = merged.iter().filter(|a| a.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, "b");
    }

    #[test]
    fn test_invalid_accounts_rejected() {
        let enc = encryptor();
        let mut bad = input("a", None, true);
        bad.account.email = "nope".into();
        assert!(merge_email_accounts(&[], vec![bad], &enc).is_err());

        let mut smtp = input("b", None, true);
        smtp.account.provider = EmailProvider::Smtp;
        assert!(merge_email_accounts(&[], vec![smtp], &enc).is_err());

        assert!(merge_email_accounts(
            &[],
            vec![input("dup", None, true), input("dup", None, false)],
            &enc
        )
        .is_err());
    }

    #[test]
    fn test_view_hides_sealed_password() {
        let mut account = fixtures::email_account("a", true);
        account.encrypted_password = Some("sealed".into());
        let view = serde_json::to_value(EmailAccountView::from(&account)).unwrap();
        assert_eq!(view["has_password"], true);
        assert!(view.get("encrypted_password").is_none());
    }

    fn unreachable_smtp_account(enc: &Encryptor) -> EmailAccount {
        let mut account = fixtures::email_account("relay", true);
        account.provider = EmailProvider::Smtp;
        account.smtp_host = Some("127.0.0.1".into());
        account.smtp_port = Some(1);
        account.encrypted_password = Some(enc.encrypt("pw").unwrap());
        account
    }

    fn send_request(campaign_id: Option<Uuid>) -> SendEmailRequest {
        SendEmailRequest {
            to: "ada@example.com".into(),
            subject: "Hello".into(),
            body: "Hi Ada".into(),
            account_id: None,
            prospect_id: None,
            campaign_id,
            is_html: false,
        }
    }

    async fn sent_email_statuses(pool: &PgPool, user_id: Uuid) -> Vec<String> {
        sqlx::query_scalar("SELECT status FROM sent_emails WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_unknown_campaign_rejected_before_delivery() {
        let Some(pool) = pool().await else { return };
        let enc = Encryptor::new(&test_support::ENCRYPTION_KEY).unwrap();
        let user =
            test_support::seed_user(&pool, vec![], vec![unreachable_smtp_account(&enc)]).await;
        let other = test_support::seed_user(&pool, vec![], vec![]).await;
        let foreign_campaign = test_support::seed_campaign(&pool, other.id).await;
        let state = test_support::state(pool.clone());

        for campaign_id in [foreign_campaign, Uuid::new_v4()] {
            let result = handle_send_email(
                State(state.clone()),
                AuthUser(user.clone()),
                Json(send_request(Some(campaign_id))),
            )
            .await;
            assert!(matches!(result, Err(AppError::NotFound(_))));
        }
        assert!(sent_email_statuses(&pool, user.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_recorded() {
        let Some(pool) = pool().await else { return };
        let enc = Encryptor::new(&test_support::ENCRYPTION_KEY).unwrap();
        let user =
            test_support::seed_user(&pool, vec![], vec![unreachable_smtp_account(&enc)]).await;
        let campaign_id = test_support::seed_campaign(&pool, user.id).await;
        let state = test_support::state(pool.clone());

        let result = handle_send_email(
            State(state),
            AuthUser(user.clone()),
            Json(send_request(Some(campaign_id))),
        )
        .await;
        assert!(matches!(result, Err(AppError::Email(_))));
        assert_eq!(sent_email_statuses(&pool, user.id).await, vec!["failed".to_string()]);
    }

    #[tokio::test]
    async fn test_saving_accounts_merges_with_locked_row() {
        let Some(pool) = pool().await else { return };
        let enc = Encryptor::new(&test_support::ENCRYPTION_KEY).unwrap();
        let mut stored = fixtures::email_account("a", true);
        stored.encrypted_password = Some(enc.encrypt("old").unwrap());
        let user = test_support::seed_user(&pool, vec![], vec![stored.clone()]).await;

        // A stale copy of the user must not drop the stored password.
        let mut stale = user.clone();
        stale.email_accounts.0.clear();
        let Json(views) = handle_save_email_accounts(
            State(test_support::state(pool.clone())),
            AuthUser(stale),
            Json(SaveEmailAccountsRequest {
                accounts: vec![input("a", None, true)],
            }),
        )
        .await
        .unwrap();
        assert!(views[0].has_password);

        let reloaded = users::find_by_id(&pool, user.id).await.unwrap().unwrap();
        assert_eq!(
            reloaded.email_accounts.0[0].encrypted_password,
            stored.encrypted_password
        );
    }
}

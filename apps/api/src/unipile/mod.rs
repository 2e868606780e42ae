/// Unipile client: the single point of entry for LinkedIn account
/// connection, search, invitations and messaging.
///
/// Every call is a stateless forward: no retries, no queueing. Non-2xx
/// responses surface as `UnipileError::Api` with the upstream status.
use reqwest::{multipart::Form, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, info};

pub mod handlers;
pub mod types;

use types::{
    AccountConnection, AccountList, ApiErrorBody, ChatStarted, CheckpointBody,
    ConnectAccountBody, InvitationSent, InviteBody, SearchQuery, SearchResults, UnipileAccount,
    UserProfile, PROVIDER_LINKEDIN,
};

#[derive(Debug, Error)]
pub enum UnipileError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Clone)]
pub struct UnipileClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl UnipileClient {
    pub fn new(dsn: &str, api_key: String) -> Result<Self, UnipileError> {
        Ok(Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()?,
            base_url: base_url_from_dsn(dsn),
            api_key,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, UnipileError> {
        let response = request
            .header("X-API-KEY", &self.api_key)
            .header("accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(UnipileError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        debug!("Unipile responded {status}");
        Ok(serde_json::from_str(&body)?)
    }

    /// POST /accounts: connects a LinkedIn account with username/password.
    pub async fn connect_linkedin(
        &self,
        username: &str,
        password: &str,
    ) -> Result<AccountConnection, UnipileError> {
        let body = ConnectAccountBody {
            provider: PROVIDER_LINKEDIN,
            username,
            password,
        };
        let result: AccountConnection = self
            .send(self.client.post(self.url("/accounts")).json(&body))
            .await?;
        info!(
            "Unipile connect for {username}: account {} (checkpoint: {:?})",
            result.account_id(),
            result.checkpoint_type()
        );
        Ok(result)
    }

    /// POST /accounts/checkpoint: submits a 2FA/OTP code.
    pub async fn solve_checkpoint(
        &self,
        account_id: &str,
        code: &str,
    ) -> Result<AccountConnection, UnipileError> {
        let body = CheckpointBody {
            provider: PROVIDER_LINKEDIN,
            account_id,
            code,
        };
        self.send(self.client.post(self.url("/accounts/checkpoint")).json(&body))
            .await
    }

    /// GET /accounts
    pub async fn list_accounts(&self) -> Result<Vec<UnipileAccount>, UnipileError> {
        let list: AccountList = self.send(self.client.get(self.url("/accounts"))).await?;
        Ok(list.items)
    }

    /// DELETE /accounts/:id
    pub async fn delete_account(&self, account_id: &str) -> Result<(), UnipileError> {
        let _: serde_json::Value = self
            .send(
                self.client
                    .delete(self.url(&format!("/accounts/{account_id}"))),
            )
            .await?;
        Ok(())
    }

    /// POST /linkedin/search: people search through the given account.
    pub async fn search_people(
        &self,
        account_id: &str,
        query: &SearchQuery,
        cursor: Option<&str>,
        limit: Option<u32>,
    ) -> Result<SearchResults, UnipileError> {
        let mut params: Vec<(&str, String)> = vec![("account_id", account_id.to_string())];
        if let Some(cursor) = cursor {
            params.push(("cursor", cursor.to_string()));
        }
        if let Some(limit) = limit {
            params.push(("limit", limit.to_string()));
        }
        self.send(
            self.client
                .post(self.url("/linkedin/search"))
                .query(&params)
                .json(&query.to_body()),
        )
        .await
    }

    /// GET /users/:identifier: resolves a public identifier to a profile.
    pub async fn get_profile(
        &self,
        account_id: &str,
        identifier: &str,
    ) -> Result<UserProfile, UnipileError> {
        self.send(
            self.client
                .get(self.url(&format!("/users/{identifier}")))
                .query(&[("account_id", account_id)]),
        )
        .await
    }

    /// POST /users/invite: sends a connection request with an optional note.
    pub async fn send_invitation(
        &self,
        account_id: &str,
        provider_id: &str,
        message: Option<&str>,
    ) -> Result<InvitationSent, UnipileError> {
        let body = InviteBody {
            provider_id,
            account_id,
            message,
        };
        self.send(self.client.post(self.url("/users/invite")).json(&body))
            .await
    }

    /// POST /chats: starts (or reuses) a 1:1 chat and sends `text`.
    pub async fn start_chat(
        &self,
        account_id: &str,
        attendee_provider_id: &str,
        text: &str,
    ) -> Result<ChatStarted, UnipileError> {
        let form = Form::new()
            .text("account_id", account_id.to_string())
            .text("attendees_ids", attendee_provider_id.to_string())
            .text("text", text.to_string());
        self.send(self.client.post(self.url("/chats")).multipart(form))
            .await
    }
}

/// `api8.unipile.com:13851` → `https://api8.unipile.com:13851/api/v1`.
fn base_url_from_dsn(dsn: &str) -> String {
    let dsn = dsn.trim().trim_end_matches('/');
    let dsn = dsn.strip_suffix("/api/v1").unwrap_or(dsn);
    if dsn.starts_with("http://") || dsn.starts_with("https://") {
        format!("{dsn}/api/v1")
    } else {
        format!("https://{dsn}/api/v1")
    }
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            detail: Some(detail),
            ..
        }) => detail,
        Ok(ApiErrorBody {
            title: Some(title),
            ..
        }) => title,
        _ if body.trim().is_empty() => "empty response body".to_string(),
        _ => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_from_bare_dsn() {
        assert_eq!(
            base_url_from_dsn("api8.unipile.com:13851"),
            "https://api8.unipile.com:13851/api/v1"
        );
    }

    #[test]
    fn test_base_url_keeps_explicit_scheme() {
        assert_eq!(
            base_url_from_dsn("http://localhost:4010/"),
            "http://localhost:4010/api/v1"
        );
        assert_eq!(
            base_url_from_dsn("https://api1.unipile.com:13111/api/v1"),
            "https://api1.unipile.com:13111/api/v1"
        );
    }

    #[test]
    fn test_api_error_message_prefers_detail() {
        let body = r#"{"status":401,"type":"errors/missing_credentials","title":"Missing credentials","detail":"The API key is missing."}"#;
        assert_eq!(api_error_message(body), "The API key is missing.");
        let title_only = r#"{"status":404,"title":"Not found"}"#;
        assert_eq!(api_error_message(title_only), "Not found");
        assert_eq!(api_error_message("Bad Gateway"), "Bad Gateway");
        assert_eq!(api_error_message(""), "empty response body");
    }
}

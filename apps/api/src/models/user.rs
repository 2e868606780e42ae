use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use crate::compose::Tone;

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub linkedin_accounts: Json<Vec<LinkedInAccount>>,
    pub email_accounts: Json<Vec<EmailAccount>>,
    pub ai_settings: Json<AiSettings>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }

    pub fn linkedin_account(&self, account_id: &str) -> Option<&LinkedInAccount> {
        self.linkedin_accounts
            .0
            .iter()
            .find(|a| a.account_id == account_id)
    }

    /// Picks the requested e-mail account, else the default, else the first.
    pub fn email_account(&self, requested: Option<&str>) -> Option<&EmailAccount> {
        let accounts = &self.email_accounts.0;
        match requested {
            Some(id) => accounts.iter().find(|a| a.id == id || a.email == id),
            None => accounts
                .iter()
                .find(|a| a.is_default)
                .or_else(|| accounts.first()),
        }
    }

    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.email)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkedInAccountStatus {
    Connected,
    #[default]
    PendingCheckpoint,
    Disconnected,
}

/// A LinkedIn account connected through Unipile. Credentials are never stored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkedInAccount {
    pub account_id: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub status: LinkedInAccountStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailProvider {
    Gmail,
    Outlook,
    Smtp,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailAccount {
    #[serde(default)]
    pub id: String,
    pub email: String,
    pub provider: EmailProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smtp_port: Option<u16>,
    /// Login name when it differs from `email`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_name: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AiProvider {
    #[default]
    Template,
    Anthropic,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AiSettings {
    #[serde(default)]
    pub provider: AiProvider,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encrypted_api_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_tone: Option<Tone>,
}

/// Public view of a user row, without stored secrets.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub full_name: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub linkedin_accounts: usize,
    pub email_accounts: usize,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role.clone(),
            is_active: user.is_active,
            linkedin_accounts: user.linkedin_accounts.0.len(),
            email_accounts: user.email_accounts.0.len(),
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "owner@example.com".into(),
            full_name: Some("Sam Owner".into()),
            role: "user".into(),
            is_active: true,
            linkedin_accounts: Json(vec![]),
            email_accounts: Json(vec![]),
            ai_settings: Json(AiSettings::default()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    pub fn email_account(id: &str, is_default: bool) -> EmailAccount {
        EmailAccount {
            id: id.into(),
            email: format!("{id}@example.com"),
            provider: EmailProvider::Gmail,
            smtp_host: None,
            smtp_port: None,
            username: None,
            encrypted_password: None,
            from_name: None,
            is_default,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_email_account_selection_prefers_default() {
        let mut u = user();
        u.email_accounts = Json(vec![email_account("a", false), email_account("b", true)]);
        assert_eq!(u.email_account(None).map(|a| a.id.as_str()), Some("b"));
        assert_eq!(u.email_account(Some("a")).map(|a| a.id.as_str()), Some("a"));
        assert_eq!(
            u.email_account(Some("a@example.com")).map(|a| a.id.as_str()),
            Some("a")
        );
        assert!(u.email_account(Some("missing")).is_none());
    }

    #[test]
    fn test_email_account_selection_falls_back_to_first() {
        let mut u = user();
        u.email_accounts = Json(vec![email_account("a", false), email_account("b", false)]);
        assert_eq!(u.email_account(None).map(|a| a.id.as_str()), Some("a"));
    }

    #[test]
    fn test_loose_linkedin_account_json_parses() {
        let accounts: Vec<LinkedInAccount> =
            serde_json::from_str(r#"[{"account_id": "acc_1"}]"#).unwrap();
        assert_eq!(accounts[0].status, LinkedInAccountStatus::PendingCheckpoint);
        assert!(accounts[0].daily_limit.is_none());
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let mut u = user();
        u.full_name = Some("  ".into());
        assert_eq!(u.display_name(), "owner@example.com");
    }
}

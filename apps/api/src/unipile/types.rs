//! Wire shapes for the Unipile REST API (v1).

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

pub const PROVIDER_LINKEDIN: &str = "LINKEDIN";

#[derive(Debug, Serialize)]
pub(crate) struct ConnectAccountBody<'a> {
    pub provider: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckpointBody<'a> {
    pub provider: &'a str,
    pub account_id: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct InviteBody<'a> {
    pub provider_id: &'a str,
    pub account_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'a str>,
}

/// Result of a connect or checkpoint call. A checkpoint means LinkedIn asked
/// for a second factor and the caller must submit a code.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "object")]
pub enum AccountConnection {
    #[serde(rename = "AccountCreated")]
    Created { account_id: String },
    #[serde(rename = "AccountReconnected")]
    Reconnected { account_id: String },
    #[serde(rename = "Checkpoint")]
    Checkpoint {
        account_id: String,
        checkpoint: Checkpoint,
    },
}

impl AccountConnection {
    pub fn account_id(&self) -> &str {
        match self {
            AccountConnection::Created { account_id }
            | AccountConnection::Reconnected { account_id }
            | AccountConnection::Checkpoint { account_id, .. } => account_id,
        }
    }

    pub fn checkpoint_type(&self) -> Option<&str> {
        match self {
            AccountConnection::Checkpoint { checkpoint, .. } => Some(&checkpoint.kind),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct Checkpoint {
    /// `2FA`, `OTP`, `IN_APP_VALIDATION`, `CAPTCHA`, `PHONE_REGISTER`...
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AccountSource {
    #[serde(default)]
    pub id: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UnipileAccount {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub sources: Vec<AccountSource>,
}

impl UnipileAccount {
    /// Unipile reports `OK` on each healthy source.
    pub fn is_healthy(&self) -> bool {
        !self.sources.is_empty() && self.sources.iter().all(|s| s.status == "OK")
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct AccountList {
    #[serde(default)]
    pub items: Vec<UnipileAccount>,
}

/// People search parameters. Extra LinkedIn filters pass through untouched.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keywords: Option<String>,
    #[serde(flatten)]
    pub filters: Map<String, Value>,
}

impl SearchQuery {
    pub(crate) fn to_body(&self) -> Value {
        let mut body = json!({
            "api": "classic",
            "category": "people",
        });
        if let Value::Object(map) = &mut body {
            if let Some(k) = self.keywords.as_deref().filter(|k| !k.trim().is_empty()) {
                map.insert("keywords".into(), Value::String(k.trim().to_string()));
            }
            for (key, value) in &self.filters {
                map.entry(key.clone()).or_insert_with(|| value.clone());
            }
        }
        body
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchPerson {
    /// LinkedIn member id (`ACoAA...`), usable as `provider_id`.
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub public_identifier: Option<String>,
    #[serde(default)]
    pub network_distance: Option<String>,
}

impl SearchPerson {
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim().to_string();
        }
        [self.first_name.as_deref(), self.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Shapes the result as a prospect payload for bulk ingestion.
    pub fn to_prospect_value(&self) -> Value {
        let profile_url = self
            .profile_url
            .clone()
            .or_else(|| {
                self.public_identifier
                    .as_ref()
                    .map(|id| format!("https://www.linkedin.com/in/{id}"))
            })
            .unwrap_or_default();
        json!({
            "linkedin_data": {
                "name": self.display_name(),
                "first_name": self.first_name,
                "last_name": self.last_name,
                "headline": self.headline,
                "location": self.location,
                "profile_url": profile_url,
                "provider_id": self.id,
                "public_identifier": self.public_identifier,
                "network_distance": self.network_distance,
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResults {
    #[serde(default)]
    pub items: Vec<SearchPerson>,
    #[serde(default)]
    pub cursor: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UserProfile {
    pub provider_id: String,
    #[serde(default)]
    pub public_identifier: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InvitationSent {
    #[serde(default)]
    pub invitation_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChatStarted {
    pub chat_id: String,
    #[serde(default)]
    pub message_id: Option<String>,
}

/// Unipile error envelope (RFC 7807 style).
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub detail: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_created_parses() {
        let conn: AccountConnection =
            serde_json::from_str(r#"{"object":"AccountCreated","account_id":"acc_1"}"#).unwrap();
        assert_eq!(conn.account_id(), "acc_1");
        assert_eq!(conn.checkpoint_type(), None);
    }

    #[test]
    fn test_checkpoint_parses() {
        let conn: AccountConnection = serde_json::from_str(
            r#"{"object":"Checkpoint","account_id":"acc_2","checkpoint":{"type":"2FA"}}"#,
        )
        .unwrap();
        assert_eq!(conn.account_id(), "acc_2");
        assert_eq!(conn.checkpoint_type(), Some("2FA"));
    }

    #[test]
    fn test_search_body_keeps_fixed_fields() {
        let mut filters = Map::new();
        filters.insert("network_distance".into(), json!([1, 2]));
        filters.insert("category".into(), json!("companies"));
        let query = SearchQuery {
            keywords: Some("  rust engineer ".into()),
            filters,
        };
        let body = query.to_body();
        assert_eq!(body["category"], "people");
        assert_eq!(body["api"], "classic");
        assert_eq!(body["keywords"], "rust engineer");
        assert_eq!(body["network_distance"], json!([1, 2]));
    }

    #[test]
    fn test_search_person_to_prospect_value() {
        let person: SearchPerson = serde_json::from_value(json!({
            "type": "PEOPLE",
            "id": "ACoAAB123",
            "first_name": "Ada",
            "last_name": "Lovelace",
            "public_identifier": "ada-l",
            "headline": "Mathematician"
        }))
        .unwrap();
        let value = person.to_prospect_value();
        assert_eq!(value["linkedin_data"]["name"], "Ada Lovelace");
        assert_eq!(value["linkedin_data"]["provider_id"], "ACoAAB123");
        assert_eq!(
            value["linkedin_data"]["profile_url"],
            "https://www.linkedin.com/in/ada-l"
        );
    }

    #[test]
    fn test_account_health_from_sources() {
        let account: UnipileAccount = serde_json::from_value(json!({
            "id": "acc_1",
            "type": "LINKEDIN",
            "sources": [{"id": "s1", "status": "OK"}]
        }))
        .unwrap();
        assert!(account.is_healthy());

        let broken: UnipileAccount = serde_json::from_value(json!({
            "id": "acc_2",
            "sources": [{"status": "CREDENTIALS"}]
        }))
        .unwrap();
        assert!(!broken.is_healthy());
    }
}

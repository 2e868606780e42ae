use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// LinkedIn profile snapshot captured when the prospect was added.
/// Unknown keys from upstream payloads are preserved in `extra`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LinkedInProfile {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headline: Option<String>,
    #[serde(default)]
    pub profile_url: String,
    /// Unipile/LinkedIn internal member id, required to message or invite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LinkedInProfile {
    /// First name, falling back to the first word of the display name.
    pub fn first_name(&self) -> Option<&str> {
        self.first_name
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or_else(|| self.name.split_whitespace().next())
    }

    /// Identifier Unipile accepts for profile lookups.
    pub fn lookup_identifier(&self) -> Option<String> {
        if let Some(id) = self.public_identifier.as_deref().filter(|s| !s.is_empty()) {
            return Some(id.to_string());
        }
        public_identifier_from_url(&self.profile_url)
    }
}

/// Extracts `jane-doe` from `https://www.linkedin.com/in/jane-doe/`.
pub fn public_identifier_from_url(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/in/")?;
    let slug = rest.split(['/', '?', '#']).next()?.trim();
    (!slug.is_empty()).then(|| slug.to_string())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContactInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ProspectRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub linkedin_data: Json<LinkedInProfile>,
    pub contact_info: Json<ContactInfo>,
    pub status: String,
    pub notes: Option<String>,
    pub automation: Value,
    pub score: Value,
    pub last_contacted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_identifier_from_profile_url() {
        assert_eq!(
            public_identifier_from_url("https://www.linkedin.com/in/jane-doe/").as_deref(),
            Some("jane-doe")
        );
        assert_eq!(
            public_identifier_from_url("https://linkedin.com/in/jdoe?trk=abc").as_deref(),
            Some("jdoe")
        );
        assert_eq!(public_identifier_from_url("https://example.com/jane"), None);
        assert_eq!(public_identifier_from_url("https://linkedin.com/in/"), None);
    }

    #[test]
    fn test_first_name_falls_back_to_display_name() {
        let profile = LinkedInProfile {
            name: "Ada Lovelace".into(),
            ..Default::default()
        };
        assert_eq!(profile.first_name(), Some("Ada"));

        let explicit = LinkedInProfile {
            name: "Ada Lovelace".into(),
            first_name: Some("Augusta".into()),
            ..Default::default()
        };
        assert_eq!(explicit.first_name(), Some("Augusta"));
    }

    #[test]
    fn test_unknown_profile_fields_survive() {
        let json = serde_json::json!({
            "name": "Grace Hopper",
            "profile_url": "https://linkedin.com/in/grace",
            "connections": 500
        });
        let profile: LinkedInProfile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.extra.get("connections"), Some(&Value::from(500)));
        let back = serde_json::to_value(&profile).unwrap();
        assert_eq!(back["connections"], 500);
    }
}

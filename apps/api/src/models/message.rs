use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Outbound LinkedIn message or invitation relayed through Unipile.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MessageRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prospect_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub channel: String,
    pub account_id: String,
    pub content: String,
    pub unipile_chat_id: Option<String>,
    pub unipile_message_id: Option<String>,
    pub status: String,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SentEmailRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub prospect_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
    pub body: String,
    pub status: String,
    pub error: Option<String>,
    pub sent_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageChannel {
    LinkedinMessage,
    LinkedinInvitation,
}

impl MessageChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageChannel::LinkedinMessage => "linkedin_message",
            MessageChannel::LinkedinInvitation => "linkedin_invitation",
        }
    }
}

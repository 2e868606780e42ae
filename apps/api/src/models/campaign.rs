use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CampaignRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub status: String,
    pub search_criteria: Value,
    pub total_prospects: i32,
    pub messages_sent: i32,
    pub emails_sent: i32,
    pub replies: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//! Records of outbound communication: relayed LinkedIn messages/invitations
//! (`messages`) and SMTP deliveries (`sent_emails`). Rows are written after
//! the external call returns.

use chrono::{DateTime, NaiveTime, Utc};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use crate::models::message::{MessageChannel, MessageRow, SentEmailRow};

pub struct NewMessage<'a> {
    pub user_id: Uuid,
    pub prospect_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub channel: MessageChannel,
    pub account_id: &'a str,
    pub content: &'a str,
    pub unipile_chat_id: Option<&'a str>,
    pub unipile_message_id: Option<&'a str>,
}

pub async fn insert_message<'e, E>(executor: E, msg: NewMessage<'_>) -> Result<MessageRow, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, MessageRow>(
        r#"
        INSERT INTO messages
            (user_id, prospect_id, campaign_id, channel, account_id, content,
             unipile_chat_id, unipile_message_id, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'sent')
        RETURNING *
        "#,
    )
    .bind(msg.user_id)
    .bind(msg.prospect_id)
    .bind(msg.campaign_id)
    .bind(msg.channel.as_str())
    .bind(msg.account_id)
    .bind(msg.content)
    .bind(msg.unipile_chat_id)
    .bind(msg.unipile_message_id)
    .fetch_one(executor)
    .await
}

/// Start of the current daily sending window (midnight UTC).
pub fn daily_window_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Serialises sends through one Unipile account until the surrounding
/// transaction ends.
pub async fn lock_account<'e, E>(executor: E, account_id: &str) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(account_id)
        .execute(executor)
        .await?;
    Ok(())
}

/// Messages and invitations relayed through `account_id` since `since`.
pub async fn count_sent_since<'e, E>(
    executor: E,
    account_id: &str,
    since: DateTime<Utc>,
) -> Result<i64, sqlx::Error>
where
    E: sqlx::Executor<'e, Database = Postgres>,
{
    sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE account_id = $1 AND sent_at >= $2")
        .bind(account_id)
        .bind(since)
        .fetch_one(executor)
        .await
}

pub async fn list_messages(
    pool: &PgPool,
    user_id: Uuid,
    prospect_id: Option<Uuid>,
) -> Result<Vec<MessageRow>, sqlx::Error> {
    sqlx::query_as::<_, MessageRow>(
        r#"
        SELECT * FROM messages
        WHERE user_id = $1 AND ($2::uuid IS NULL OR prospect_id = $2)
        ORDER BY sent_at DESC
        LIMIT 200
        "#,
    )
    .bind(user_id)
    .bind(prospect_id)
    .fetch_all(pool)
    .await
}

pub struct NewSentEmail<'a> {
    pub user_id: Uuid,
    pub prospect_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub from_email: &'a str,
    pub to_email: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub error: Option<&'a str>,
}

pub async fn insert_sent_email(
    pool: &PgPool,
    email: NewSentEmail<'_>,
) -> Result<SentEmailRow, sqlx::Error> {
    let status = if email.error.is_some() { "failed" } else { "sent" };
    sqlx::query_as::<_, SentEmailRow>(
        r#"
        INSERT INTO sent_emails
            (user_id, prospect_id, campaign_id, from_email, to_email, subject, body, status, error)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(email.user_id)
    .bind(email.prospect_id)
    .bind(email.campaign_id)
    .bind(email.from_email)
    .bind(email.to_email)
    .bind(email.subject)
    .bind(email.body)
    .bind(status)
    .bind(email.error)
    .fetch_one(pool)
    .await
}

pub async fn list_sent_emails(pool: &PgPool, user_id: Uuid) -> Result<Vec<SentEmailRow>, sqlx::Error> {
    sqlx::query_as::<_, SentEmailRow>(
        "SELECT * FROM sent_emails WHERE user_id = $1 ORDER BY sent_at DESC LIMIT 200",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

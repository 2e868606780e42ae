//! SMTP delivery through the user's own mailbox provider.
//!
//! A transport is built per send from the stored account; nothing is pooled
//! across users.

pub mod handlers;

use std::time::Duration;

use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::errors::AppError;
use crate::models::user::{EmailAccount, EmailProvider};

const SMTP_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SUBMISSION_PORT: u16 = 587;
const IMPLICIT_TLS_PORT: u16 = 465;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TlsMode {
    StartTls,
    Implicit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
}

/// Resolves host, port and TLS mode for an account's provider.
pub fn smtp_settings(account: &EmailAccount) -> Result<SmtpSettings, AppError> {
    let (host, port) = match account.provider {
        EmailProvider::Gmail => (
            "smtp.gmail.com".to_string(),
            account.smtp_port.unwrap_or(DEFAULT_SUBMISSION_PORT),
        ),
        EmailProvider::Outlook => (
            "smtp.office365.com".to_string(),
            account.smtp_port.unwrap_or(DEFAULT_SUBMISSION_PORT),
        ),
        EmailProvider::Smtp => {
            let host = account
                .smtp_host
                .as_deref()
                .map(str::trim)
                .filter(|h| !h.is_empty())
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "Email account {} has no smtp_host configured",
                        account.email
                    ))
                })?;
            (
                host.to_string(),
                account.smtp_port.unwrap_or(DEFAULT_SUBMISSION_PORT),
            )
        }
    };

    let tls = if port == IMPLICIT_TLS_PORT {
        TlsMode::Implicit
    } else {
        TlsMode::StartTls
    };
    Ok(SmtpSettings { host, port, tls })
}

pub struct OutgoingEmail<'a> {
    pub to: &'a str,
    pub subject: &'a str,
    pub body: &'a str,
    pub is_html: bool,
}

/// Builds the MIME message sent from `account`.
pub fn build_message(account: &EmailAccount, email: &OutgoingEmail<'_>) -> Result<Message, AppError> {
    let from_address: Address = account
        .email
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid sender address '{}': {e}", account.email)))?;
    let from = Mailbox::new(account.from_name.clone(), from_address);
    let to: Mailbox = email
        .to
        .trim()
        .parse()
        .map_err(|e| AppError::Validation(format!("Invalid recipient '{}': {e}", email.to)))?;

    let content_type = if email.is_html {
        ContentType::TEXT_HTML
    } else {
        ContentType::TEXT_PLAIN
    };

    Message::builder()
        .from(from)
        .to(to)
        .subject(email.subject)
        .header(content_type)
        .body(email.body.to_string())
        .map_err(|e| AppError::Validation(format!("Could not build email: {e}")))
}

fn build_transport(
    settings: &SmtpSettings,
    username: &str,
    password: String,
) -> Result<AsyncSmtpTransport<Tokio1Executor>, lettre::transport::smtp::Error> {
    let builder = match settings.tls {
        TlsMode::Implicit => AsyncSmtpTransport::<Tokio1Executor>::relay(&settings.host)?,
        TlsMode::StartTls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.host)?,
    };
    Ok(builder
        .port(settings.port)
        .credentials(Credentials::new(username.to_string(), password))
        .timeout(Some(SMTP_TIMEOUT))
        .build())
}

/// Sends `message` through the account's SMTP server. Errors are returned as
/// text so the caller can record them on the `sent_emails` row.
pub async fn deliver(account: &EmailAccount, password: String, message: Message) -> Result<(), String> {
    let settings = smtp_settings(account).map_err(|e| e.to_string())?;
    let username = account.username.as_deref().unwrap_or(&account.email);
    let transport = build_transport(&settings, username, password).map_err(|e| e.to_string())?;

    transport.send(message).await.map_err(|e| e.to_string())?;
    info!(
        "Email sent from {} via {}:{}",
        account.email, settings.host, settings.port
    );
    Ok(())
}

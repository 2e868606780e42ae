//! Message composers: pluggable backends producing outreach copy.
//!
//! Default: `TemplateComposer` (deterministic, no network).
//! `LlmComposer` is selected per user when their AI settings pick Anthropic
//! and carry an encrypted API key.

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use crate::compose::prompts::{
    COMPOSE_PROMPT_TEMPLATE, COMPOSE_SYSTEM, CONNECTION_LENGTH_RULE, DEFAULT_LENGTH_RULE,
};
use crate::compose::templates::{
    clip_to_limit, render_template, MessageKind, Personalization, Tone, CONNECTION_NOTE_LIMIT,
};
use crate::crypto::Encryptor;
use crate::errors::AppError;
use crate::llm_client::LlmClient;
use crate::models::user::{AiProvider, User};

#[derive(Debug, Clone)]
pub struct ComposeRequest {
    pub kind: MessageKind,
    pub tone: Tone,
    pub personalization: Personalization,
    pub context: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComposedMessage {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub content: String,
    pub composer: &'static str,
}

#[async_trait]
pub trait MessageComposer: Send + Sync {
    async fn compose(&self, request: &ComposeRequest) -> Result<ComposedMessage, AppError>;
}

pub struct TemplateComposer;

#[async_trait]
impl MessageComposer for TemplateComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<ComposedMessage, AppError> {
        let (subject, content) =
            render_template(request.kind, request.tone, &request.personalization);
        Ok(ComposedMessage {
            subject,
            content,
            composer: "template",
        })
    }
}

pub struct LlmComposer {
    llm: LlmClient,
}

impl LlmComposer {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl MessageComposer for LlmComposer {
    async fn compose(&self, request: &ComposeRequest) -> Result<ComposedMessage, AppError> {
        // Subject lines stay template-driven; only the body is generated.
        let (subject, example) =
            render_template(request.kind, request.tone, &request.personalization);
        let prompt = build_prompt(request, &example);
        let text = self.llm.complete_text(&prompt, COMPOSE_SYSTEM).await?;

        let content = if request.kind == MessageKind::ConnectionRequest {
            clip_to_limit(&text, CONNECTION_NOTE_LIMIT)
        } else {
            text
        };

        Ok(ComposedMessage {
            subject,
            content,
            composer: "anthropic",
        })
    }
}

fn kind_label(kind: MessageKind) -> &'static str {
    match kind {
        MessageKind::ConnectionRequest => "LinkedIn connection request note",
        MessageKind::FollowUp => "LinkedIn follow-up message",
        MessageKind::Introduction => "LinkedIn introduction message after connecting",
        MessageKind::Email => "cold outreach email body",
    }
}

fn tone_label(tone: Tone) -> &'static str {
    match tone {
        Tone::Professional => "professional",
        Tone::Friendly => "friendly",
        Tone::Casual => "casual",
        Tone::Direct => "direct, concise",
    }
}

fn build_prompt(request: &ComposeRequest, example: &str) -> String {
    let p = &request.personalization;
    let mut recipient = String::new();
    for (label, value) in [
        ("Name", p.name.as_deref().or(p.first_name.as_deref())),
        ("Headline", p.headline.as_deref()),
        ("Company", p.company.as_deref()),
    ] {
        if let Some(v) = value {
            recipient.push_str(&format!("- {label}: {v}\n"));
        }
    }
    if recipient.is_empty() {
        recipient.push_str("- (no profile details available)\n");
    }

    let length_rule = if request.kind == MessageKind::ConnectionRequest {
        CONNECTION_LENGTH_RULE
    } else {
        DEFAULT_LENGTH_RULE
    };

    COMPOSE_PROMPT_TEMPLATE
        .replace("{kind}", kind_label(request.kind))
        .replace("{tone}", tone_label(request.tone))
        .replace("{recipient}", recipient.trim_end())
        .replace("{sender_name}", p.sender_name.as_deref().unwrap_or("(not given)"))
        .replace("{context}", request.context.as_deref().unwrap_or("(none)"))
        .replace("{length_rule}", length_rule)
        .replace("{example}", example)
}

/// Selects the composer configured in the user's AI settings.
pub fn composer_for_user(
    user: &User,
    encryptor: &Encryptor,
) -> Result<Box<dyn MessageComposer>, AppError> {
    let settings = &user.ai_settings.0;
    match (settings.provider, settings.encrypted_api_key.as_deref()) {
        (AiProvider::Anthropic, Some(sealed)) => {
            let api_key = encryptor.decrypt(sealed)?;
            debug!("Using LLM composer for user {}", user.id);
            Ok(Box::new(LlmComposer::new(LlmClient::new(api_key)?)))
        }
        _ => Ok(Box::new(TemplateComposer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::fixtures;
    use crate::models::user::AiSettings;
    use sqlx::types::Json;

    fn request(kind: MessageKind) -> ComposeRequest {
        ComposeRequest {
            kind,
            tone: Tone::Friendly,
            personalization: Personalization {
                first_name: Some("Linus".into()),
                name: Some("Linus T".into()),
                company: Some("Kernel Co".into()),
                headline: None,
                sender_name: Some("Sam".into()),
            },
            context: Some("We met at RustConf".into()),
        }
    }

    #[tokio::test]
    async fn test_template_composer_renders_request() {
        let msg = TemplateComposer
            .compose(&request(MessageKind::Email))
            .await
            .unwrap();
        assert_eq!(msg.composer, "template");
        assert!(msg.content.contains("Linus"));
        assert!(msg.subject.is_some());
    }

    #[test]
    fn test_prompt_contains_recipient_and_rules() {
        let req = request(MessageKind::ConnectionRequest);
        let prompt = build_prompt(&req, "example text");
        assert!(prompt.contains("- Name: Linus T"));
        assert!(prompt.contains("- Company: Kernel Co"));
        assert!(!prompt.contains("Headline"));
        assert!(prompt.contains(CONNECTION_LENGTH_RULE));
        assert!(prompt.contains("We met at RustConf"));
        assert!(prompt.contains("example text"));
        assert!(!prompt.contains("{tone}"));
    }

    #[test]
    fn test_template_selected_without_provider_key() {
        let encryptor = Encryptor::new(&[1u8; 32]).unwrap();
        let mut user = fixtures::user();
        user.ai_settings = Json(AiSettings {
            provider: AiProvider::Anthropic,
            encrypted_api_key: None,
            default_tone: None,
        });
        assert!(composer_for_user(&user, &encryptor).is_ok());
    }

    #[test]
    fn test_undecryptable_key_is_an_error() {
        let encryptor = Encryptor::new(&[1u8; 32]).unwrap();
        let mut user = fixtures::user();
        user.ai_settings = Json(AiSettings {
            provider: AiProvider::Anthropic,
            encrypted_api_key: Some("garbage".into()),
            default_tone: None,
        });
        assert!(matches!(
            composer_for_user(&user, &encryptor),
            Err(AppError::Crypto(_))
        ));
    }
}

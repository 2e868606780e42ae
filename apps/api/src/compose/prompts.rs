// Prompt constants for the LLM-backed message composer.

/// System prompt for outreach copy. Plain text only.
pub const COMPOSE_SYSTEM: &str = "You write short, personal B2B outreach messages. \
    Respond with the message text only. \
    Do NOT add explanations, markdown, or placeholder brackets. \
    Never invent facts about the recipient beyond what is provided.";

/// Replace `{kind}`, `{tone}`, `{recipient}`, `{sender_name}`, `{context}`,
/// `{length_rule}` and `{example}` before sending.
pub const COMPOSE_PROMPT_TEMPLATE: &str = r#"Write a {kind} in a {tone} tone.

Recipient:
{recipient}

Sender: {sender_name}

Additional context from the sender:
{context}

Rules:
- {length_rule}
- Address the recipient by first name.
- Do not include a subject line.

A template version for reference (improve on it, do not copy it verbatim):
{example}"#;

pub const CONNECTION_LENGTH_RULE: &str =
    "Stay under 280 characters; it is a LinkedIn invitation note.";
pub const DEFAULT_LENGTH_RULE: &str = "Keep it under 120 words.";

// Outreach copy generation: deterministic templates by default, with an
// optional LLM-backed composer when the user has configured a provider key.

pub mod composer;
pub mod handlers;
pub mod prompts;
pub mod templates;

pub use composer::{composer_for_user, ComposeRequest, ComposedMessage};
pub use templates::{MessageKind, Personalization, Tone};

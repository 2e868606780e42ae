//! Outreach copy templates keyed by message kind and tone.
//!
//! Placeholders: `{first_name}`, `{name}`, `{company}`, `{headline}`,
//! `{sender_name}`. Missing values fall back to neutral wording so a rendered
//! message never contains a raw placeholder.

use serde::{Deserialize, Serialize};

use crate::models::prospect::LinkedInProfile;

/// LinkedIn caps invitation notes at 300 characters.
pub const CONNECTION_NOTE_LIMIT: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    ConnectionRequest,
    FollowUp,
    Introduction,
    Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    #[default]
    Professional,
    Friendly,
    Casual,
    Direct,
}

/// Values substituted into a template.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Personalization {
    pub first_name: Option<String>,
    pub name: Option<String>,
    pub company: Option<String>,
    pub headline: Option<String>,
    pub sender_name: Option<String>,
}

impl Personalization {
    pub fn from_profile(profile: &LinkedInProfile, sender_name: Option<&str>) -> Self {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());
        Self {
            first_name: profile.first_name().and_then(non_empty),
            name: non_empty(&profile.name),
            company: profile.company.as_deref().and_then(non_empty),
            headline: profile.headline.as_deref().and_then(non_empty),
            sender_name: sender_name.and_then(non_empty),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub subject: Option<&'static str>,
    pub body: &'static str,
}

/// Returns the template for a message kind in the requested tone.
pub fn get_template(kind: MessageKind, tone: Tone) -> Template {
    let body = match (kind, tone) {
        (MessageKind::ConnectionRequest, Tone::Professional) => {
            "Hi {first_name}, I came across your profile and was impressed by your work at {company}. \
             I'd welcome the chance to connect and exchange ideas."
        }
        (MessageKind::ConnectionRequest, Tone::Friendly) => {
            "Hi {first_name}! Your work at {company} caught my eye. \
             Would love to connect and keep up with what you're building."
        }
        (MessageKind::ConnectionRequest, Tone::Casual) => {
            "Hey {first_name}, saw what you're doing at {company}. Let's connect!"
        }
        (MessageKind::ConnectionRequest, Tone::Direct) => {
            "Hi {first_name}, I work with teams like {company} and think a connection would be useful for both of us."
        }
        (MessageKind::FollowUp, Tone::Professional) => {
            "Hi {first_name},\n\nI wanted to follow up on my previous note. \
             If improving outreach at {company} is on your agenda, I'd be glad to share what has worked for similar teams.\n\n\
             Best regards,\n{sender_name}"
        }
        (MessageKind::FollowUp, Tone::Friendly) => {
            "Hi {first_name}, just circling back in case my last message got buried. \
             Happy to share a few ideas for {company} whenever suits you.\n\n{sender_name}"
        }
        (MessageKind::FollowUp, Tone::Casual) => {
            "Hey {first_name}, bumping this up in case you missed it. Up for a quick chat?\n\n{sender_name}"
        }
        (MessageKind::FollowUp, Tone::Direct) => {
            "Hi {first_name}, following up. Is a 15-minute call next week possible?\n\n{sender_name}"
        }
        (MessageKind::Introduction, Tone::Professional) => {
            "Hi {first_name},\n\nThank you for connecting. I noticed your role as {headline} and thought it would be \
             worth introducing myself. I help teams like {company} reach the right people faster.\n\n\
             Best regards,\n{sender_name}"
        }
        (MessageKind::Introduction, Tone::Friendly) => {
            "Thanks for connecting, {first_name}! I'm {sender_name}. \
             I enjoy meeting people working on interesting things at {company}, so I wanted to say hello."
        }
        (MessageKind::Introduction, Tone::Casual) => {
            "Hey {first_name}, thanks for the connect! I'm {sender_name}. Always good to meet folks from {company}."
        }
        (MessageKind::Introduction, Tone::Direct) => {
            "Hi {first_name}, thanks for connecting. I'm {sender_name}; I help teams like {company} with outbound. \
             Would you be open to a short call?"
        }
        (MessageKind::Email, Tone::Professional) => {
            "Dear {first_name},\n\nI hope this message finds you well. I am reaching out because I believe \
             {company} could benefit from a more effective outreach process.\n\n\
             Would you be available for a brief conversation this week?\n\nKind regards,\n{sender_name}"
        }
        (MessageKind::Email, Tone::Friendly) => {
            "Hi {first_name},\n\nI hope your week is going well! I've been following {company} \
             and had a couple of ideas I'd love to share.\n\nWould a quick call work for you?\n\nCheers,\n{sender_name}"
        }
        (MessageKind::Email, Tone::Casual) => {
            "Hey {first_name},\n\nQuick one: I think I can help {company} with outreach. Fancy a chat?\n\n{sender_name}"
        }
        (MessageKind::Email, Tone::Direct) => {
            "Hi {first_name},\n\nI help companies like {company} book more meetings from outbound. \
             Are you free for 15 minutes on Thursday?\n\n{sender_name}"
        }
    };

    let subject = match (kind, tone) {
        (MessageKind::Email, Tone::Professional) => Some("Improving outreach at {company}"),
        (MessageKind::Email, Tone::Friendly) => Some("A few ideas for {company}"),
        (MessageKind::Email, Tone::Casual) => Some("Quick question, {first_name}"),
        (MessageKind::Email, Tone::Direct) => Some("15 minutes next week?"),
        _ => None,
    };

    Template { subject, body }
}

/// Substitutes placeholders in `template` with `values` or neutral fallbacks.
pub fn fill(template: &str, values: &Personalization) -> String {
    let first_name = values
        .first_name
        .as_deref()
        .or_else(|| values.name.as_deref().and_then(|n| n.split_whitespace().next()))
        .unwrap_or("there");
    template
        .replace("{first_name}", first_name)
        .replace("{name}", values.name.as_deref().unwrap_or(first_name))
        .replace("{company}", values.company.as_deref().unwrap_or("your company"))
        .replace("{headline}", values.headline.as_deref().unwrap_or("a professional in your field"))
        .replace("{sender_name}", values.sender_name.as_deref().unwrap_or(""))
        .trim_end()
        .to_string()
}

/// Renders a template into `(subject, body)`. Connection requests are clipped
/// to the invitation-note limit.
pub fn render_template(
    kind: MessageKind,
    tone: Tone,
    values: &Personalization,
) -> (Option<String>, String) {
    let template = get_template(kind, tone);
    let subject = template.subject.map(|s| fill(s, values));
    let mut body = fill(template.body, values);
    if kind == MessageKind::ConnectionRequest {
        body = clip_to_limit(&body, CONNECTION_NOTE_LIMIT);
    }
    (subject, body)
}

/// Truncates to at most `limit` characters, preferring a word boundary.
pub fn clip_to_limit(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit).collect();
    match cut.rfind(char::is_whitespace) {
        Some(idx) if idx > limit / 2 => cut[..idx].trim_end().to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KINDS: [MessageKind; 4] = [
        MessageKind::ConnectionRequest,
        MessageKind::FollowUp,
        MessageKind::Introduction,
        MessageKind::Email,
    ];
    const TONES: [Tone; 4] = [Tone::Professional, Tone::Friendly, Tone::Casual, Tone::Direct];

    fn ada() -> Personalization {
        Personalization {
            first_name: Some("Ada".into()),
            name: Some("Ada Lovelace".into()),
            company: Some("Analytical Engines".into()),
            headline: Some("Head of Computing".into()),
            sender_name: Some("Charles".into()),
        }
    }

    #[test]
    fn test_every_template_renders_without_placeholders() {
        for kind in KINDS {
            for tone in TONES {
                let (subject, body) = render_template(kind, tone, &Personalization::default());
                assert!(!body.contains('{'), "{kind:?}/{tone:?} left a placeholder: {body}");
                if let Some(s) = subject {
                    assert!(!s.contains('{'), "{kind:?}/{tone:?} subject: {s}");
                }
            }
        }
    }

    #[test]
    fn test_only_email_has_subject() {
        for tone in TONES {
            assert!(get_template(MessageKind::Email, tone).subject.is_some());
            assert!(get_template(MessageKind::FollowUp, tone).subject.is_none());
        }
    }

    #[test]
    fn test_personalization_is_substituted() {
        let (subject, body) = render_template(MessageKind::Email, Tone::Professional, &ada());
        assert!(body.starts_with("Dear Ada,"));
        assert!(body.contains("Analytical Engines"));
        assert!(body.ends_with("Charles"));
        assert_eq!(subject.as_deref(), Some("Improving outreach at Analytical Engines"));
    }

    #[test]
    fn test_missing_values_use_neutral_fallbacks() {
        let body = fill("Hi {first_name} at {company}", &Personalization::default());
        assert_eq!(body, "Hi there at your company");
    }

    #[test]
    fn test_first_name_derived_from_full_name() {
        let values = Personalization {
            name: Some("Grace Hopper".into()),
            ..Default::default()
        };
        assert_eq!(fill("Hi {first_name}", &values), "Hi Grace");
    }

    #[test]
    fn test_connection_requests_fit_note_limit() {
        let long_company = "Very Long Company Name Incorporated ".repeat(12);
        let values = Personalization {
            company: Some(long_company),
            ..ada()
        };
        for tone in TONES {
            let (_, body) = render_template(MessageKind::ConnectionRequest, tone, &values);
            assert!(body.chars().count() <= CONNECTION_NOTE_LIMIT);
        }
    }

    #[test]
    fn test_clip_prefers_word_boundary() {
        let clipped = clip_to_limit("alpha beta gamma delta", 13);
        assert_eq!(clipped, "alpha beta");
        assert_eq!(clip_to_limit("short", 300), "short");
    }

    #[test]
    fn test_tone_serde_snake_case() {
        let tone: Tone = serde_json::from_str(r#""friendly""#).unwrap();
        assert_eq!(tone, Tone::Friendly);
        let kind: MessageKind = serde_json::from_str(r#""connection_request""#).unwrap();
        assert_eq!(kind, MessageKind::ConnectionRequest);
    }
}

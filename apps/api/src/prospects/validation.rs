//! Input validation for single and bulk prospect creation.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::prospect::{ContactInfo, LinkedInProfile};
use crate::prospects::status::ProspectStatus;

pub const MAX_BULK_PROSPECTS: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct ProspectInput {
    pub linkedin_data: LinkedInProfile,
    #[serde(default)]
    pub contact_info: ContactInfo,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated prospect ready for insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProspect {
    pub linkedin_data: LinkedInProfile,
    pub contact_info: ContactInfo,
    pub status: ProspectStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct BulkItemError {
    pub index: usize,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct BulkPlan {
    pub valid: Vec<NewProspect>,
    pub errors: Vec<BulkItemError>,
    /// Items repeating a profile URL already seen earlier in the same payload.
    pub duplicates_in_payload: usize,
}

const LINKEDIN_HOST: &str = "linkedin.com";

/// Lowercases and strips scheme, query, fragment and trailing slashes so the
/// same profile submitted twice compares equal. Country subdomains
/// (`uk.linkedin.com`) fold into `www.linkedin.com`; other hosts are rejected.
pub fn normalize_profile_url(url: &str) -> Result<String, String> {
    let trimmed = url.trim();
    let cleaned = trimmed.split(['?', '#']).next().unwrap_or(trimmed);
    let cleaned = cleaned.trim_end_matches('/').to_ascii_lowercase();
    let without_scheme = cleaned
        .strip_prefix("https://")
        .or_else(|| cleaned.strip_prefix("http://"))
        .unwrap_or(cleaned.as_str());

    let (host, path) = match without_scheme.find('/') {
        Some(i) => without_scheme.split_at(i),
        None => (without_scheme, ""),
    };
    let host = host.split(':').next().unwrap_or(host);
    let is_linkedin = host == LINKEDIN_HOST
        || host
            .strip_suffix(LINKEDIN_HOST)
            .is_some_and(|sub| sub.ends_with('.') && sub.len() > 1);
    if !is_linkedin {
        return Err(format!("'{trimmed}' is not a LinkedIn profile URL"));
    }
    if path.trim_matches('/').is_empty() {
        return Err(format!("'{trimmed}' has no profile path"));
    }
    Ok(format!("https://www.{LINKEDIN_HOST}{path}"))
}

pub fn validate_input(input: ProspectInput) -> Result<NewProspect, String> {
    let mut linkedin_data = input.linkedin_data;

    if linkedin_data.name.trim().is_empty() {
        return Err("linkedin_data.name is required".to_string());
    }
    if linkedin_data.profile_url.trim().is_empty() {
        return Err("linkedin_data.profile_url is required".to_string());
    }
    linkedin_data.name = linkedin_data.name.trim().to_string();
    linkedin_data.profile_url = normalize_profile_url(&linkedin_data.profile_url)?;

    if let Some(email) = input.contact_info.email.as_deref() {
        if !email.trim().is_empty() && !email.contains('@') {
            return Err(format!("contact_info.email '{email}' is not an email address"));
        }
    }

    let status = match input.status.as_deref() {
        None | Some("") => ProspectStatus::New,
        Some(s) => s.parse::<ProspectStatus>().map_err(|e| e.to_string())?,
    };

    Ok(NewProspect {
        linkedin_data,
        contact_info: input.contact_info,
        status,
        notes: input.notes.filter(|n| !n.trim().is_empty()),
    })
}

pub fn validate_value(value: &Value) -> Result<NewProspect, String> {
    if value.get("linkedin_data").map_or(true, |v| !v.is_object()) {
        return Err("linkedin_data object is required".to_string());
    }
    let input: ProspectInput =
        serde_json::from_value(value.clone()).map_err(|e| format!("invalid prospect: {e}"))?;
    validate_input(input)
}

/// Validates each item independently and drops in-payload duplicates.
pub fn plan_bulk(items: &[Value]) -> BulkPlan {
    let mut plan = BulkPlan::default();
    let mut seen = HashSet::new();

    for (index, item) in items.iter().enumerate() {
        match validate_value(item) {
            Ok(prospect) => {
                if seen.insert(prospect.linkedin_data.profile_url.clone()) {
                    plan.valid.push(prospect);
                } else {
                    plan.duplicates_in_payload += 1;
                }
            }
            Err(message) => plan.errors.push(BulkItemError { index, message }),
        }
    }

    plan
}

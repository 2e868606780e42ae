//! Prospect pipeline status and its legal transitions.
//!
//! Ordering: new → contacted / invitation_sent → connected → replied →
//! interested → converted. `not_interested`, `converted` and `bounced` are
//! terminal; only a reset to `new` leaves them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProspectStatus {
    New,
    Contacted,
    InvitationSent,
    Connected,
    Replied,
    Interested,
    NotInterested,
    Converted,
    Bounced,
}

impl ProspectStatus {
    pub const ALL: [ProspectStatus; 9] = [
        ProspectStatus::New,
        ProspectStatus::Contacted,
        ProspectStatus::InvitationSent,
        ProspectStatus::Connected,
        ProspectStatus::Replied,
        ProspectStatus::Interested,
        ProspectStatus::NotInterested,
        ProspectStatus::Converted,
        ProspectStatus::Bounced,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProspectStatus::New => "new",
            ProspectStatus::Contacted => "contacted",
            ProspectStatus::InvitationSent => "invitation_sent",
            ProspectStatus::Connected => "connected",
            ProspectStatus::Replied => "replied",
            ProspectStatus::Interested => "interested",
            ProspectStatus::NotInterested => "not_interested",
            ProspectStatus::Converted => "converted",
            ProspectStatus::Bounced => "bounced",
        }
    }

    fn rank(&self) -> u8 {
        match self {
            ProspectStatus::New => 0,
            ProspectStatus::Contacted | ProspectStatus::InvitationSent => 1,
            ProspectStatus::Connected => 2,
            ProspectStatus::Replied => 3,
            ProspectStatus::Interested | ProspectStatus::NotInterested => 4,
            ProspectStatus::Converted => 5,
            ProspectStatus::Bounced => 1,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProspectStatus::NotInterested | ProspectStatus::Converted | ProspectStatus::Bounced
        )
    }

    pub fn can_transition_to(&self, next: ProspectStatus) -> bool {
        if *self == next || next == ProspectStatus::New {
            return true;
        }
        if self.is_terminal() {
            return false;
        }
        if next == ProspectStatus::Bounced {
            return true;
        }
        next.rank() >= self.rank()
    }
}

impl fmt::Display for ProspectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown prospect status '{}'", self.0)
    }
}

impl FromStr for ProspectStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_ascii_lowercase();
        ProspectStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == needle)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_known_statuses() {
        for st in ProspectStatus::ALL {
            assert_eq!(st.as_str().parse::<ProspectStatus>().unwrap(), st);
        }
        assert_eq!(
            " Contacted ".parse::<ProspectStatus>().unwrap(),
            ProspectStatus::Contacted
        );
    }

    #[test]
    fn test_parse_rejects_unknown_status() {
        assert!("ghosted".parse::<ProspectStatus>().is_err());
    }

    #[test]
    fn test_forward_moves_allowed() {
        use ProspectStatus::*;
        assert!(New.can_transition_to(Contacted));
        assert!(New.can_transition_to(Converted));
        assert!(Contacted.can_transition_to(InvitationSent));
        assert!(InvitationSent.can_transition_to(Contacted));
        assert!(Connected.can_transition_to(Replied));
        assert!(Replied.can_transition_to(NotInterested));
    }

    #[test]
    fn test_backward_moves_rejected() {
        use ProspectStatus::*;
        assert!(!Replied.can_transition_to(Contacted));
        assert!(!Interested.can_transition_to(Connected));
    }

    #[test]
    fn test_terminal_states_only_reset() {
        use ProspectStatus::*;
        for terminal in [NotInterested, Converted, Bounced] {
            assert!(terminal.can_transition_to(New));
            assert!(terminal.can_transition_to(terminal));
            assert!(!terminal.can_transition_to(Contacted));
        }
        assert!(!Converted.can_transition_to(Bounced));
    }

    #[test]
    fn test_bounce_from_any_open_state() {
        use ProspectStatus::*;
        for st in [New, Contacted, InvitationSent, Connected, Replied, Interested] {
            assert!(st.can_transition_to(Bounced), "{st} -> bounced");
        }
    }
}

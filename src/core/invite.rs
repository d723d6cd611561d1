//! Invite lifecycle state machine
//!
//! Every relationship link (applicator↔worker, applicator↔applicator user,
//! applicator↔grower) moves through the same four states. Transitions are
//! validated here and nowhere else; services only call the edge functions.
//!
//! ```text
//!   NOT_SENT ──send──▶ PENDING ──accept──▶ ACCEPTED
//!                       ▲   │
//!                  send │   └──reject──▶ REJECTED
//!                       └────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::actor::Role;
use crate::core::notification::NotificationType;

/// Invitation status of a relationship link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InviteStatus {
    #[default]
    NotSent,
    Pending,
    Accepted,
    Rejected,
}

impl InviteStatus {
    pub fn all() -> &'static [InviteStatus] {
        &[
            InviteStatus::NotSent,
            InviteStatus::Pending,
            InviteStatus::Accepted,
            InviteStatus::Rejected,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InviteStatus::NotSent => "NOT_SENT",
            InviteStatus::Pending => "PENDING",
            InviteStatus::Accepted => "ACCEPTED",
            InviteStatus::Rejected => "REJECTED",
        }
    }
}

impl std::fmt::Display for InviteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for InviteStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        InviteStatus::all()
            .iter()
            .find(|st| st.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown invite status: {}", s))
    }
}

/// Things that can happen to a link
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InviteAction {
    Send,
    Accept,
    Reject,
}

impl std::fmt::Display for InviteAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InviteAction::Send => write!(f, "send"),
            InviteAction::Accept => write!(f, "accept"),
            InviteAction::Reject => write!(f, "reject"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InviteError {
    #[error("Cannot {action} an invitation that is {from}")]
    InvalidTransition {
        from: InviteStatus,
        action: InviteAction,
    },
}

/// Apply `action` to a link currently in `from`
pub fn transition(from: InviteStatus, action: InviteAction) -> Result<InviteStatus, InviteError> {
    match (from, action) {
        (InviteStatus::NotSent | InviteStatus::Pending | InviteStatus::Rejected, InviteAction::Send) => {
            Ok(InviteStatus::Pending)
        }
        (InviteStatus::Pending, InviteAction::Accept) => Ok(InviteStatus::Accepted),
        (InviteStatus::Pending, InviteAction::Reject) => Ok(InviteStatus::Rejected),
        _ => Err(InviteError::InvalidTransition { from, action }),
    }
}

pub fn send(from: InviteStatus) -> Result<InviteStatus, InviteError> {
    transition(from, InviteAction::Send)
}

pub fn accept(from: InviteStatus) -> Result<InviteStatus, InviteError> {
    transition(from, InviteAction::Accept)
}

pub fn reject(from: InviteStatus) -> Result<InviteStatus, InviteError> {
    transition(from, InviteAction::Reject)
}

/// Actions permitted from the current status
pub fn allowed_actions(current: InviteStatus) -> Vec<InviteAction> {
    match current {
        InviteStatus::NotSent | InviteStatus::Rejected => vec![InviteAction::Send],
        InviteStatus::Pending => vec![InviteAction::Accept, InviteAction::Reject, InviteAction::Send],
        InviteStatus::Accepted => vec![],
    }
}

/// Which relationship a link represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LinkKind {
    Worker,
    ApplicatorUser,
    Grower,
}

impl LinkKind {
    pub fn all() -> &'static [LinkKind] {
        &[LinkKind::Worker, LinkKind::ApplicatorUser, LinkKind::Grower]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkKind::Worker => "WORKER",
            LinkKind::ApplicatorUser => "APPLICATOR_USER",
            LinkKind::Grower => "GROWER",
        }
    }

    /// Human-readable name for messages
    pub fn noun(&self) -> &'static str {
        match self {
            LinkKind::Worker => "worker",
            LinkKind::ApplicatorUser => "applicator user",
            LinkKind::Grower => "grower",
        }
    }

    /// Role the invited account must hold
    pub fn counterpart_role(&self) -> Role {
        match self {
            LinkKind::Worker => Role::Worker,
            LinkKind::ApplicatorUser => Role::ApplicatorUser,
            LinkKind::Grower => Role::Grower,
        }
    }

    /// Notification sent to the counterpart when an invite goes out
    pub fn invite_notification(&self) -> NotificationType {
        match self {
            LinkKind::Worker => NotificationType::PilotInvite,
            LinkKind::ApplicatorUser => NotificationType::ApplicatorUserInvite,
            LinkKind::Grower => NotificationType::GrowerInvite,
        }
    }

    /// Notification sent to the initiator when the counterpart accepts
    pub fn accept_notification(&self) -> NotificationType {
        match self {
            LinkKind::Worker => NotificationType::PilotAcceptInvite,
            LinkKind::ApplicatorUser => NotificationType::ApplicatorUserAcceptInvite,
            LinkKind::Grower => NotificationType::GrowerAcceptInvite,
        }
    }

    /// Notification sent to the initiator when the counterpart rejects
    pub fn reject_notification(&self) -> NotificationType {
        match self {
            LinkKind::Worker => NotificationType::PilotRejectInvite,
            LinkKind::ApplicatorUser => NotificationType::ApplicatorUserRejectInvite,
            LinkKind::Grower => NotificationType::GrowerRejectInvite,
        }
    }
}

impl std::fmt::Display for LinkKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LinkKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_uppercase().replace('-', "_");
        LinkKind::all()
            .iter()
            .find(|k| k.as_str() == normalized)
            .copied()
            .ok_or_else(|| format!("Unknown link kind: {}", s))
    }
}

/// Pricing terms offered with a worker invite
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Terms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_fee: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dollar_per_acre: Option<f64>,
}

/// A counterpart's standing instructions for incoming invites
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoAcceptPreferences {
    pub enabled: bool,
    pub min_percentage_fee: Option<f64>,
    pub min_dollar_per_acre: Option<f64>,
}

impl AutoAcceptPreferences {
    /// Whether an offer should be accepted without a manual response.
    ///
    /// Either term reaching its minimum is enough. An offered term with no
    /// configured minimum counts as reaching it; a term that is not offered
    /// never does.
    pub fn accepts(&self, offer: &Terms) -> bool {
        if !self.enabled {
            return false;
        }

        let meets = |offered: Option<f64>, minimum: Option<f64>| match offered {
            Some(value) => value >= minimum.unwrap_or(0.0),
            None => false,
        };

        meets(offer.percentage_fee, self.min_percentage_fee)
            || meets(offer.dollar_per_acre, self.min_dollar_per_acre)
    }
}

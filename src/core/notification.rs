//! Notification records and their type tags
//!
//! Client applications branch on the literal `type` strings, so the
//! serialized names are fixed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    AccountInvitation,
    PilotInvite,
    PilotAcceptInvite,
    PilotRejectInvite,
    ApplicatorUserInvite,
    ApplicatorUserAcceptInvite,
    ApplicatorUserRejectInvite,
    GrowerInvite,
    GrowerAcceptInvite,
    GrowerRejectInvite,
    FarmPermissionGranted,
}

impl NotificationType {
    pub fn all() -> &'static [NotificationType] {
        &[
            NotificationType::AccountInvitation,
            NotificationType::PilotInvite,
            NotificationType::PilotAcceptInvite,
            NotificationType::PilotRejectInvite,
            NotificationType::ApplicatorUserInvite,
            NotificationType::ApplicatorUserAcceptInvite,
            NotificationType::ApplicatorUserRejectInvite,
            NotificationType::GrowerInvite,
            NotificationType::GrowerAcceptInvite,
            NotificationType::GrowerRejectInvite,
            NotificationType::FarmPermissionGranted,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::AccountInvitation => "ACCOUNT_INVITATION",
            NotificationType::PilotInvite => "PILOT_INVITE",
            NotificationType::PilotAcceptInvite => "PILOT_ACCEPT_INVITE",
            NotificationType::PilotRejectInvite => "PILOT_REJECT_INVITE",
            NotificationType::ApplicatorUserInvite => "APPLICATOR_USER_INVITE",
            NotificationType::ApplicatorUserAcceptInvite => "APPLICATOR_USER_ACCEPT_INVITE",
            NotificationType::ApplicatorUserRejectInvite => "APPLICATOR_USER_REJECT_INVITE",
            NotificationType::GrowerInvite => "GROWER_INVITE",
            NotificationType::GrowerAcceptInvite => "GROWER_ACCEPT_INVITE",
            NotificationType::GrowerRejectInvite => "GROWER_REJECT_INVITE",
            NotificationType::FarmPermissionGranted => "FARM_PERMISSION_GRANTED",
        }
    }

    /// Short title used in mail subjects and list output
    pub fn title(&self) -> &'static str {
        match self {
            NotificationType::AccountInvitation => "You have been invited to join",
            NotificationType::PilotInvite => "New invitation from an applicator",
            NotificationType::PilotAcceptInvite => "A pilot accepted your invitation",
            NotificationType::PilotRejectInvite => "A pilot declined your invitation",
            NotificationType::ApplicatorUserInvite => "You have been added to an applicator team",
            NotificationType::ApplicatorUserAcceptInvite => "A team member accepted your invitation",
            NotificationType::ApplicatorUserRejectInvite => "A team member declined your invitation",
            NotificationType::GrowerInvite => "An applicator wants to work with you",
            NotificationType::GrowerAcceptInvite => "A grower accepted your invitation",
            NotificationType::GrowerRejectInvite => "A grower declined your invitation",
            NotificationType::FarmPermissionGranted => "You were granted access to a farm",
        }
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for NotificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotificationType::all()
            .iter()
            .find(|t| t.as_str() == s)
            .copied()
            .ok_or_else(|| format!("Unknown notification type: {}", s))
    }
}

/// Entity references attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRefs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub farm_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_account_id: Option<i64>,
}

impl NotificationRefs {
    pub fn link(link_id: i64, from_account_id: i64) -> Self {
        Self {
            link_id: Some(link_id),
            farm_id: None,
            from_account_id: Some(from_account_id),
        }
    }

    pub fn farm(farm_id: i64, from_account_id: i64) -> Self {
        Self {
            link_id: None,
            farm_id: Some(farm_id),
            from_account_id: Some(from_account_id),
        }
    }
}

/// A stored notification row
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: i64,
    pub user_id: i64,
    #[serde(rename = "type")]
    pub notification_type: NotificationType,
    #[serde(flatten)]
    pub refs: NotificationRefs,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

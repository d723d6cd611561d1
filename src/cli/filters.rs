//! Search and filter arguments shared by list commands

use clap::{Args, ValueEnum};

use crate::core::filter::SearchOptions;
use crate::core::invite::InviteStatus;
use crate::store::OutboxStatus;

/// `{label, searchValue}` search plus paging
#[derive(Debug, Clone, Default, Args)]
pub struct SearchArgs {
    /// Field to search (`all` searches every text field)
    #[arg(long, short = 'l')]
    pub label: Option<String>,

    /// Value to search for
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Page number, starting at 1
    #[arg(long, short = 'p')]
    pub page: Option<i64>,

    /// Results per page
    #[arg(long, short = 'n')]
    pub limit: Option<i64>,
}

impl SearchArgs {
    /// Search options for the service layer; a bare `--search` means `--label all`
    pub fn options(&self) -> SearchOptions {
        let label = match (&self.label, &self.search) {
            (None, Some(_)) => Some(crate::core::filter::ALL_LABEL.to_string()),
            (label, _) => label.clone(),
        };
        SearchOptions {
            label,
            search_value: self.search.clone(),
            page: self.page,
            limit: self.limit,
        }
    }
}

/// Answer to a pending invite
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Response {
    Accept,
    Reject,
}

impl Response {
    pub fn status(&self) -> InviteStatus {
        match self {
            Response::Accept => InviteStatus::Accepted,
            Response::Reject => InviteStatus::Rejected,
        }
    }
}

/// Outbox status filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutboxFilter {
    Pending,
    Sent,
    Failed,
    #[default]
    All,
}

impl OutboxFilter {
    pub fn status(&self) -> Option<OutboxStatus> {
        match self {
            OutboxFilter::Pending => Some(OutboxStatus::Pending),
            OutboxFilter::Sent => Some(OutboxStatus::Sent),
            OutboxFilter::Failed => Some(OutboxStatus::Failed),
            OutboxFilter::All => None,
        }
    }
}

impl std::fmt::Display for OutboxFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutboxFilter::Pending => write!(f, "pending"),
            OutboxFilter::Sent => write!(f, "sent"),
            OutboxFilter::Failed => write!(f, "failed"),
            OutboxFilter::All => write!(f, "all"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_search_uses_all_label() {
        let args = SearchArgs {
            search: Some("smith".to_string()),
            ..Default::default()
        };
        let options = args.options();
        assert_eq!(options.label.as_deref(), Some("all"));
        assert_eq!(options.search_value.as_deref(), Some("smith"));
    }

    #[test]
    fn test_explicit_label_kept() {
        let args = SearchArgs {
            label: Some("email".to_string()),
            search: Some("@farm".to_string()),
            page: Some(2),
            limit: Some(5),
        };
        let options = args.options();
        assert_eq!(options.label.as_deref(), Some("email"));
        assert_eq!(options.pagination().skip, 5);
    }

    #[test]
    fn test_response_status() {
        assert_eq!(Response::Accept.status(), InviteStatus::Accepted);
        assert_eq!(Response::Reject.status(), InviteStatus::Rejected);
        assert_eq!(OutboxFilter::All.status(), None);
    }
}

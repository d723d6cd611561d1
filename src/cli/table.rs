//! Tabular views of service results

use crate::core::notification::Notification;
use crate::services::EmailMatch;
use crate::store::{
    Account, Chemical, Equipment, Farm, FarmPermission, LinkedAccount, OutboxMessage, Product,
    UsState,
};

/// A record that can be shown as one table or CSV row
pub trait TableRow {
    fn headers() -> Vec<&'static str>;
    fn cells(&self) -> Vec<String>;
}

fn opt<T: ToString>(value: &Option<T>) -> String {
    value.as_ref().map(|v| v.to_string()).unwrap_or_default()
}

fn yes_no(value: bool) -> String {
    if value { "yes" } else { "no" }.to_string()
}

impl TableRow for Account {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "EMAIL", "ROLE", "PROFILE", "AUTO-ACCEPT"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.display_name(),
            self.email.clone(),
            self.role.to_string(),
            self.profile_status.to_string(),
            yes_no(self.auto_accept_invite),
        ]
    }
}

impl TableRow for LinkedAccount {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "EMAIL", "STATUS", "CODE", "TERMS", "LINK", "EXPIRES"]
    }

    fn cells(&self) -> Vec<String> {
        let terms = self.link.terms();
        let mut offered = Vec::new();
        if let Some(pct) = terms.percentage_fee {
            offered.push(format!("{}%", pct));
        }
        if let Some(dollars) = terms.dollar_per_acre {
            offered.push(format!("${}/ac", dollars));
        }
        vec![
            self.account.id.to_string(),
            self.account.display_name(),
            self.account.email.clone(),
            self.link.invite_status.to_string(),
            opt(&self.link.code),
            offered.join(" "),
            self.link.id.to_string(),
            self.link
                .expires_at
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default(),
        ]
    }
}

impl TableRow for EmailMatch {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "EMAIL", "ROLE", "STATUS"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.account.id.to_string(),
            self.account.display_name(),
            self.account.email.clone(),
            self.account.role.to_string(),
            self.invite_status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]
    }
}

impl TableRow for Farm {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "GROWER", "STATE", "COUNTY", "TOWNSHIP"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.grower_id.to_string(),
            opt(&self.state_code),
            opt(&self.county),
            opt(&self.township),
        ]
    }
}

impl TableRow for FarmPermission {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "FARM", "APPLICATOR", "EMAIL", "VIEW", "EDIT"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.farm_id.to_string(),
            self.applicator_name.clone(),
            self.applicator_email.clone(),
            yes_no(self.can_view),
            yes_no(self.can_edit),
        ]
    }
}

impl TableRow for Notification {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TYPE", "TITLE", "FROM", "CREATED", "READ"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.notification_type.to_string(),
            self.notification_type.title().to_string(),
            opt(&self.refs.from_account_id),
            self.created_at.format("%Y-%m-%d %H:%M").to_string(),
            yes_no(self.read_at.is_some()),
        ]
    }
}

impl TableRow for OutboxMessage {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "TO", "SUBJECT", "STATUS", "ATTEMPTS", "ERROR"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.recipient.clone(),
            self.subject.clone(),
            self.status.to_string(),
            self.attempts.to_string(),
            opt(&self.last_error),
        ]
    }
}

impl TableRow for Equipment {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "TYPE", "MANUFACTURER", "MODEL", "SERIAL", "WARRANTY"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.equipment_type.clone(),
            opt(&self.manufacturer),
            opt(&self.model),
            opt(&self.serial_number),
            opt(&self.warranty_expires_on),
        ]
    }
}

impl TableRow for Chemical {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "TYPE", "REGISTRATION", "MANUFACTURER"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            self.chemical_type.clone(),
            opt(&self.registration_number),
            opt(&self.manufacturer),
        ]
    }
}

impl TableRow for Product {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "NAME", "CODE", "UNIT", "PRICE"]
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.name.clone(),
            opt(&self.code),
            opt(&self.unit),
            self.price.map(|p| format!("{:.2}", p)).unwrap_or_default(),
        ]
    }
}

impl TableRow for UsState {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "CODE", "NAME"]
    }

    fn cells(&self) -> Vec<String> {
        vec![self.id.to_string(), self.code.clone(), self.name.clone()]
    }
}

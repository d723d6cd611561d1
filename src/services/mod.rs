//! Business operations
//!
//! Every operation takes an explicit [`EffectiveActor`]; nothing reads the
//! caller from ambient state. Writes that touch more than one table run in a
//! single [`Store::with_transaction`] so notification and outbox rows commit
//! together with the change they describe.

pub mod accounts;
pub mod applicator_users;
pub mod catalog;
pub mod farms;
pub mod growers;
pub mod links;
pub mod notifications;
pub mod workers;

use crate::core::actor::{EffectiveActor, Role};
use crate::core::config::Config;
use crate::core::error::{ApiError, ApiResult};
use crate::core::filter::SearchOptions;
use crate::core::pagination::Pagination;
use crate::core::token::InviteTokenIssuer;
use crate::mail::MailTemplates;
use crate::store::Store;

pub use links::{EmailMatch, InviteOffer, NewCounterpart};

/// Service facade over one store and one configuration
pub struct Services {
    store: Store,
    config: Config,
    issuer: InviteTokenIssuer,
    templates: MailTemplates,
}

impl Services {
    pub fn new(store: Store, config: Config) -> ApiResult<Self> {
        if config.is_production() && config.uses_default_secret() {
            return Err(ApiError::Internal(
                "invites.secret must be configured in production".to_string(),
            ));
        }
        let issuer = InviteTokenIssuer::new(config.invites.secret.clone());
        let templates =
            MailTemplates::new().map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(Self {
            store,
            config,
            issuer,
            templates,
        })
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn issuer(&self) -> &InviteTokenIssuer {
        &self.issuer
    }

    /// Page window honouring the configured default limit
    pub(crate) fn pagination(&self, options: &SearchOptions) -> Pagination {
        Pagination::normalize_with(
            options.limit,
            options.page,
            self.config.pagination.default_limit,
        )
    }
}

pub(crate) fn require_role(actor: &EffectiveActor, role: Role, action: &str) -> ApiResult<()> {
    if actor.role == role {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Only {} accounts can {}",
            role.as_str().to_ascii_lowercase().replace('_', " "),
            action
        )))
    }
}

pub(crate) fn require_admin(actor: &EffectiveActor, action: &str) -> ApiResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(ApiError::forbidden(format!(
            "Only administrators can {}",
            action
        )))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests

    use super::*;
    use crate::store::NewAccount;

    pub fn services() -> Services {
        Services::new(Store::open_in_memory().unwrap(), Config::default()).unwrap()
    }

    pub fn account(svc: &Services, email: &str, role: Role) -> i64 {
        svc.store()
            .insert_account(
                &NewAccount {
                    email: email.to_string(),
                    first_name: "Test".to_string(),
                    last_name: email.split('@').next().unwrap_or("user").to_string(),
                    business_name: None,
                    phone: None,
                    address: None,
                    role,
                },
                chrono::Utc::now(),
            )
            .unwrap()
    }

    pub fn actor(svc: &Services, email: &str, role: Role) -> EffectiveActor {
        EffectiveActor::direct(account(svc, email, role), role)
    }

    pub fn notification_types(svc: &Services, user_id: i64) -> Vec<String> {
        let mut stmt = svc
            .store()
            .conn()
            .prepare("SELECT type FROM notifications WHERE user_id = ?1 ORDER BY id")
            .unwrap();
        let rows = stmt
            .query_map([user_id], |row| row.get::<_, String>(0))
            .unwrap()
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        rows
    }

    pub fn outbox_count(svc: &Services) -> i64 {
        svc.store()
            .conn()
            .query_row("SELECT COUNT(*) FROM outbox", [], |row| row.get(0))
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_requires_secret() {
        let config = Config {
            environment: "production".to_string(),
            ..Config::default()
        };
        let result = Services::new(Store::open_in_memory().unwrap(), config);
        assert!(matches!(result, Err(ApiError::Internal(_))));
    }

    #[test]
    fn test_pagination_uses_configured_default() {
        let mut config = Config::default();
        config.pagination.default_limit = 25;
        let svc = Services::new(Store::open_in_memory().unwrap(), config).unwrap();
        let p = svc.pagination(&SearchOptions::default());
        assert_eq!(p.limit, 25);
        assert_eq!(p.page, 1);
    }

    #[test]
    fn test_role_guard_message() {
        let actor = EffectiveActor::direct(1, Role::Grower);
        let err = require_role(&actor, Role::Applicator, "invite workers").unwrap_err();
        assert_eq!(err.to_string(), "Only applicator accounts can invite workers");
    }
}

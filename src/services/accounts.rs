//! Account registration, lookup and preferences

use chrono::Utc;

use super::{require_admin, Services};
use crate::core::actor::{EffectiveActor, ProfileStatus, Role};
use crate::core::error::{is_valid_email, ApiError, ApiResult, Violations};
use crate::core::filter::{self, registry, SearchOptions};
use crate::core::invite::{AutoAcceptPreferences, LinkKind};
use crate::core::pagination::Paged;
use crate::store::{Account, NewAccount, Store};

impl EffectiveActor {
    /// Resolve who `account_id` acts as.
    ///
    /// An applicator user with an accepted team link acts as that applicator;
    /// every other account acts as itself.
    pub fn resolve(store: &Store, account_id: i64) -> ApiResult<Self> {
        let account = store.get_account(account_id).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => {
                ApiError::Unauthorized(format!("Unknown account {}", account_id))
            }
            other => other.into(),
        })?;

        if account.profile_status == ProfileStatus::Suspended {
            return Err(ApiError::forbidden("Account is suspended"));
        }

        if account.role == Role::ApplicatorUser {
            if let Some(link) = store.accepted_link_for(LinkKind::ApplicatorUser, account.id)? {
                return Ok(EffectiveActor::delegated(link.applicator_id, account.id));
            }
        }

        Ok(EffectiveActor::direct(account.id, account.role))
    }
}

/// Shared shape checks for anything that creates an account
pub(crate) fn validate_new_account(input: &NewAccount, violations: &mut Violations) {
    violations.check(
        is_valid_email(&input.email),
        "\"email\" must be a valid email",
    );
    violations.check(
        !input.first_name.trim().is_empty(),
        "\"firstName\" is required",
    );
    violations.check(!input.last_name.trim().is_empty(), "\"lastName\" is required");
}

impl Services {
    /// Register an account. Administrator roles need an administrator caller,
    /// except for the very first one.
    pub fn register_account(
        &self,
        actor: Option<&EffectiveActor>,
        input: NewAccount,
    ) -> ApiResult<Account> {
        let mut violations = Violations::new();
        validate_new_account(&input, &mut violations);
        violations.finish()?;

        self.store().with_transaction(|tx| {
            if input.role.is_admin() && !actor.is_some_and(|a| a.is_admin()) {
                let admins: i64 = tx.conn().query_row(
                    "SELECT COUNT(*) FROM accounts WHERE role IN ('SUPER_ADMIN', 'SUPER_ADMIN_USER')",
                    [],
                    |row| row.get(0),
                )?;
                if admins > 0 {
                    return Err(ApiError::forbidden(
                        "Only administrators can create administrator accounts",
                    ));
                }
            }

            if tx.find_account_by_email(&input.email)?.is_some() {
                return Err(ApiError::conflict(format!(
                    "An account with email {} already exists",
                    input.email.trim()
                )));
            }

            let id = tx.insert_account(&input, Utc::now())?;
            tracing::info!(account_id = id, role = %input.role, "account registered");
            Ok(tx.get_account(id)?)
        })
    }

    /// Own account, or any account for administrators
    pub fn get_account(&self, actor: &EffectiveActor, id: i64) -> ApiResult<Account> {
        if !(actor.is_admin() || actor.acting_user_id == id || actor.id == id) {
            return Err(ApiError::forbidden("You can only view your own account"));
        }
        self.store().get_account(id).map_err(|e| match e {
            rusqlite::Error::QueryReturnedNoRows => ApiError::not_found("Account not found"),
            other => other.into(),
        })
    }

    pub fn list_accounts(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Account>> {
        require_admin(actor, "list accounts")?;
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::ACCOUNTS, options)?
            .unwrap_or(filter::Predicate::All(Vec::new()));
        let (rows, total) = self.store().list_accounts(&filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    /// Update the caller's own auto-accept preferences
    pub fn update_preferences(
        &self,
        actor: &EffectiveActor,
        prefs: AutoAcceptPreferences,
    ) -> ApiResult<Account> {
        let mut violations = Violations::new();
        violations.check(
            prefs.min_percentage_fee.map_or(true, |v| v >= 0.0),
            "\"minPercentageFee\" must be greater than or equal to 0",
        );
        violations.check(
            prefs.min_dollar_per_acre.map_or(true, |v| v >= 0.0),
            "\"minDollarPerAcre\" must be greater than or equal to 0",
        );
        violations.finish()?;

        let id = actor.acting_user_id;
        if self.store().update_preferences(id, &prefs, Utc::now())? == 0 {
            return Err(ApiError::not_found("Account not found"));
        }
        tracing::info!(account_id = id, enabled = prefs.enabled, "preferences updated");
        Ok(self.store().get_account(id)?)
    }

    /// Administrator delete; relationships, permissions and notifications go with it
    pub fn delete_account(&self, actor: &EffectiveActor, id: i64) -> ApiResult<()> {
        require_admin(actor, "delete accounts")?;
        if self.store().delete_account(id)? == 0 {
            return Err(ApiError::not_found("Account not found"));
        }
        tracing::info!(account_id = id, by = actor.acting_user_id, "account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    fn input(email: &str, role: Role) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            first_name: "Rae".to_string(),
            last_name: "Tiller".to_string(),
            business_name: None,
            phone: None,
            address: None,
            role,
        }
    }

    #[test]
    fn test_register_validates_everything_at_once() {
        let svc = testing::services();
        let mut bad = input("not-an-email", Role::Grower);
        bad.first_name = " ".to_string();
        let err = svc.register_account(None, bad).unwrap_err();
        assert_eq!(
            err.to_string(),
            "\"email\" must be a valid email, \"firstName\" is required"
        );
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let svc = testing::services();
        svc.register_account(None, input("rae@x.example", Role::Grower))
            .unwrap();
        let err = svc
            .register_account(None, input("RAE@x.example", Role::Worker))
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_first_admin_is_free_then_guarded() {
        let svc = testing::services();
        let admin = svc
            .register_account(None, input("root@x.example", Role::SuperAdmin))
            .unwrap();
        assert!(matches!(
            svc.register_account(None, input("second@x.example", Role::SuperAdmin)),
            Err(ApiError::Forbidden(_))
        ));

        let admin_actor = EffectiveActor::direct(admin.id, Role::SuperAdmin);
        assert!(svc
            .register_account(Some(&admin_actor), input("third@x.example", Role::SuperAdminUser))
            .is_ok());
    }

    #[test]
    fn test_resolve_switches_applicator_user_to_applicator() {
        let svc = testing::services();
        let app = testing::account(&svc, "app@x.example", Role::Applicator);
        let member = testing::account(&svc, "member@x.example", Role::ApplicatorUser);

        let before = EffectiveActor::resolve(svc.store(), member).unwrap();
        assert_eq!(before, EffectiveActor::direct(member, Role::ApplicatorUser));

        svc.store()
            .insert_link(
                &crate::store::NewLink {
                    kind: LinkKind::ApplicatorUser,
                    applicator_id: app,
                    counterpart_id: member,
                    invite_status: crate::core::invite::InviteStatus::Accepted,
                    invite_token: None,
                    expires_at: None,
                    terms: Default::default(),
                    code: None,
                    permissions: vec![],
                },
                Utc::now(),
            )
            .unwrap();

        let after = EffectiveActor::resolve(svc.store(), member).unwrap();
        assert_eq!(after, EffectiveActor::delegated(app, member));
    }

    #[test]
    fn test_resolve_unknown_account_is_unauthorized() {
        let svc = testing::services();
        assert!(matches!(
            EffectiveActor::resolve(svc.store(), 404),
            Err(ApiError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_account_visibility_and_admin_delete() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let other = testing::actor(&svc, "o@x.example", Role::Grower);
        let admin = testing::actor(&svc, "root@x.example", Role::SuperAdmin);

        assert!(svc.get_account(&grower, grower.id).is_ok());
        assert!(matches!(
            svc.get_account(&other, grower.id),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            svc.delete_account(&other, grower.id),
            Err(ApiError::Forbidden(_))
        ));

        svc.delete_account(&admin, grower.id).unwrap();
        assert!(matches!(
            svc.get_account(&admin, grower.id),
            Err(ApiError::NotFound(_))
        ));
    }

    #[test]
    fn test_list_accounts_filters_by_role() {
        let svc = testing::services();
        let admin = testing::actor(&svc, "root@x.example", Role::SuperAdmin);
        testing::account(&svc, "g1@x.example", Role::Grower);
        testing::account(&svc, "w1@x.example", Role::Worker);

        let growers = svc
            .list_accounts(&admin, &SearchOptions::search("all", "grower"))
            .unwrap();
        assert_eq!(growers.total_results, 1);
        assert_eq!(growers.result[0].email, "g1@x.example");
    }

    #[test]
    fn test_negative_minimums_rejected() {
        let svc = testing::services();
        let worker = testing::actor(&svc, "w@x.example", Role::Worker);
        let err = svc
            .update_preferences(
                &worker,
                AutoAcceptPreferences {
                    enabled: true,
                    min_percentage_fee: Some(-1.0),
                    min_dollar_per_acre: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}

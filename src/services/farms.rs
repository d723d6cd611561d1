//! Farms and the permissions growers grant applicators on them

use chrono::Utc;

use super::{require_role, Services};
use crate::core::actor::{EffectiveActor, Role};
use crate::core::error::{ApiError, ApiResult, Violations};
use crate::core::filter::SearchOptions;
use crate::core::notification::{NotificationRefs, NotificationType};
use crate::core::pagination::Paged;
use crate::store::{Farm, FarmPermission, NewFarm, Store};

fn farm_or_not_found(tx: &Store, farm_id: i64) -> ApiResult<Farm> {
    tx.find_farm(farm_id)?
        .ok_or_else(|| ApiError::not_found(format!("Farm {} not found", farm_id)))
}

/// Farm owner or an administrator
fn require_owner(actor: &EffectiveActor, farm: &Farm) -> ApiResult<()> {
    if actor.is_admin() || (actor.role == Role::Grower && farm.grower_id == actor.id) {
        Ok(())
    } else {
        Err(ApiError::forbidden(
            "Only the farm's grower can manage this farm",
        ))
    }
}

fn permission_or_not_found(tx: &Store, id: i64) -> ApiResult<FarmPermission> {
    tx.get_farm_permission(id).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => {
            ApiError::not_found(format!("Farm permission {} not found", id))
        }
        other => other.into(),
    })
}

impl Services {
    pub fn create_farm(&self, actor: &EffectiveActor, farm: NewFarm) -> ApiResult<Farm> {
        require_role(actor, Role::Grower, "create farms")?;
        let mut violations = Violations::new();
        violations.check(!farm.name.trim().is_empty(), "\"name\" is required");
        violations.finish()?;

        let id = self.store().insert_farm(actor.id, &farm, Utc::now())?;
        tracing::info!(farm_id = id, grower_id = actor.id, "farm created");
        farm_or_not_found(self.store(), id)
    }

    /// Visible to the owner, administrators and applicators holding view access
    pub fn get_farm(&self, actor: &EffectiveActor, farm_id: i64) -> ApiResult<Farm> {
        let farm = farm_or_not_found(self.store(), farm_id)?;
        if require_owner(actor, &farm).is_ok() {
            return Ok(farm);
        }
        let shared = actor.role == Role::Applicator
            && self
                .store()
                .list_farm_permissions(farm_id)?
                .iter()
                .any(|p| p.applicator_id == actor.id && p.can_view);
        if shared {
            Ok(farm)
        } else {
            Err(ApiError::forbidden("You do not have access to this farm"))
        }
    }

    /// Own farms for growers, shared farms for applicators, all for administrators
    pub fn list_farms(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Farm>> {
        let pagination = self.pagination(options);
        let (rows, total) = match actor.role {
            Role::Grower => self.store().list_farms(Some(actor.id), pagination)?,
            Role::Applicator => self.store().list_shared_farms(actor.id, pagination)?,
            _ if actor.is_admin() => self.store().list_farms(None, pagination)?,
            _ => return Err(ApiError::forbidden("Your account has no farms")),
        };
        Ok(Paged::new(rows, pagination, total))
    }

    /// Delete a farm and, through the cascade, every permission on it
    pub fn delete_farm(&self, actor: &EffectiveActor, farm_id: i64) -> ApiResult<()> {
        let farm = farm_or_not_found(self.store(), farm_id)?;
        require_owner(actor, &farm)?;
        self.store().delete_farm(farm_id)?;
        tracing::info!(farm_id, by = actor.acting_user_id, "farm deleted");
        Ok(())
    }

    /// Grant an applicator access to a farm and tell them about it
    pub fn assign_farm_permission(
        &self,
        actor: &EffectiveActor,
        farm_id: i64,
        applicator_id: i64,
        can_view: bool,
        can_edit: bool,
    ) -> ApiResult<FarmPermission> {
        self.store().with_transaction(|tx| {
            let farm = farm_or_not_found(tx, farm_id)?;
            require_owner(actor, &farm)?;

            let applicator = tx.get_account(applicator_id).map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => {
                    ApiError::bad_request(format!("Applicator {} does not exist", applicator_id))
                }
                other => other.into(),
            })?;
            if applicator.role != Role::Applicator {
                return Err(ApiError::bad_request(format!(
                    "Account {} is not an applicator",
                    applicator_id
                )));
            }

            let id = tx
                .insert_farm_permission(farm_id, applicator_id, can_view, can_edit, Utc::now())
                .map_err(|e| match ApiError::from(e) {
                    ApiError::Conflict(_) => ApiError::conflict(format!(
                        "Applicator {} already has a permission on farm {}",
                        applicator_id, farm_id
                    )),
                    other => other,
                })?;

            self.notify(
                tx,
                applicator_id,
                NotificationType::FarmPermissionGranted,
                &NotificationRefs::farm(farm_id, farm.grower_id),
            )?;
            self.queue_notification_mail(
                tx,
                &applicator,
                NotificationType::FarmPermissionGranted,
                &format!("You can now access the farm \"{}\".", farm.name),
            )?;

            tracing::info!(farm_id, applicator_id, can_view, can_edit, "farm permission granted");
            Ok(tx.get_farm_permission(id)?)
        })
    }

    pub fn update_farm_permission(
        &self,
        actor: &EffectiveActor,
        permission_id: i64,
        can_view: bool,
        can_edit: bool,
    ) -> ApiResult<FarmPermission> {
        let permission = permission_or_not_found(self.store(), permission_id)?;
        let farm = farm_or_not_found(self.store(), permission.farm_id)?;
        require_owner(actor, &farm)?;

        self.store()
            .update_farm_permission(permission_id, can_view, can_edit, Utc::now())?;
        tracing::info!(permission_id, can_view, can_edit, "farm permission updated");
        permission_or_not_found(self.store(), permission_id)
    }

    pub fn delete_farm_permission(&self, actor: &EffectiveActor, permission_id: i64) -> ApiResult<()> {
        let permission = permission_or_not_found(self.store(), permission_id)?;
        let farm = farm_or_not_found(self.store(), permission.farm_id)?;
        require_owner(actor, &farm)?;

        self.store().delete_farm_permission(permission_id)?;
        tracing::info!(permission_id, farm_id = farm.id, "farm permission revoked");
        Ok(())
    }

    pub fn list_farm_permissions(
        &self,
        actor: &EffectiveActor,
        farm_id: i64,
    ) -> ApiResult<Vec<FarmPermission>> {
        let farm = farm_or_not_found(self.store(), farm_id)?;
        require_owner(actor, &farm)?;
        Ok(self.store().list_farm_permissions(farm_id)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing;

    fn farm(name: &str) -> NewFarm {
        NewFarm {
            name: name.to_string(),
            state_id: Some(16),
            county: Some("Story".to_string()),
            township: None,
        }
    }

    #[test]
    fn test_only_growers_create_farms() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);

        let created = svc.create_farm(&grower, farm("North 40")).unwrap();
        assert_eq!(created.state_code.as_deref(), Some("IA"));
        assert!(matches!(
            svc.create_farm(&app, farm("Nope")),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            svc.create_farm(&grower, farm("  ")),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_unknown_state_is_bad_request() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let mut input = farm("Lost");
        input.state_id = Some(99);
        assert!(matches!(
            svc.create_farm(&grower, input),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_grant_checks_farm_then_owner() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let stranger = testing::actor(&svc, "s@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);
        let created = svc.create_farm(&grower, farm("Home")).unwrap();

        assert!(matches!(
            svc.assign_farm_permission(&grower, 404, app.id, true, false),
            Err(ApiError::NotFound(_))
        ));
        assert!(matches!(
            svc.assign_farm_permission(&stranger, created.id, app.id, true, false),
            Err(ApiError::Forbidden(_))
        ));
        assert!(matches!(
            svc.assign_farm_permission(&grower, created.id, stranger.id, true, false),
            Err(ApiError::BadRequest(_))
        ));
    }

    #[test]
    fn test_grant_notifies_and_duplicate_conflicts() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);
        let created = svc.create_farm(&grower, farm("Home")).unwrap();

        let granted = svc
            .assign_farm_permission(&grower, created.id, app.id, true, false)
            .unwrap();
        assert_eq!(granted.applicator_email, "a@x.example");
        assert_eq!(
            testing::notification_types(&svc, app.id),
            vec!["FARM_PERMISSION_GRANTED"]
        );
        assert_eq!(testing::outbox_count(&svc), 1);

        assert!(matches!(
            svc.assign_farm_permission(&grower, created.id, app.id, true, true),
            Err(ApiError::Conflict(_))
        ));
    }

    #[test]
    fn test_shared_farm_visibility_follows_permission() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);
        let created = svc.create_farm(&grower, farm("Home")).unwrap();

        assert!(matches!(
            svc.get_farm(&app, created.id),
            Err(ApiError::Forbidden(_))
        ));

        let granted = svc
            .assign_farm_permission(&grower, created.id, app.id, true, false)
            .unwrap();
        assert_eq!(svc.get_farm(&app, created.id).unwrap().name, "Home");
        assert_eq!(
            svc.list_farms(&app, &SearchOptions::default())
                .unwrap()
                .total_results,
            1
        );

        let updated = svc
            .update_farm_permission(&grower, granted.id, false, false)
            .unwrap();
        assert!(!updated.can_view);
        assert!(svc.get_farm(&app, created.id).is_err());

        svc.delete_farm_permission(&grower, granted.id).unwrap();
        assert!(svc
            .list_farm_permissions(&grower, created.id)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_delete_farm_cascades_permissions() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);
        let created = svc.create_farm(&grower, farm("Home")).unwrap();
        let granted = svc
            .assign_farm_permission(&grower, created.id, app.id, true, true)
            .unwrap();

        svc.delete_farm(&grower, created.id).unwrap();
        assert!(matches!(
            svc.update_farm_permission(&grower, granted.id, true, true),
            Err(ApiError::NotFound(_))
        ));
    }
}

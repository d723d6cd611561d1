//! Applicator ↔ grower relationships

use super::links::InviteOffer;
use super::Services;
use crate::core::actor::EffectiveActor;
use crate::core::error::ApiResult;
use crate::core::filter::SearchOptions;
use crate::core::invite::{InviteStatus, LinkKind};
use crate::core::pagination::Paged;
use crate::store::LinkedAccount;

impl Services {
    pub fn send_invite_to_grower(
        &self,
        actor: &EffectiveActor,
        grower_id: i64,
    ) -> ApiResult<LinkedAccount> {
        self.send_invite(actor, LinkKind::Grower, grower_id, InviteOffer::default())
    }

    pub fn respond_to_grower_invite(
        &self,
        actor: &EffectiveActor,
        applicator_id: i64,
        status: InviteStatus,
    ) -> ApiResult<LinkedAccount> {
        self.update_invite_status(actor, LinkKind::Grower, applicator_id, status)
    }

    pub fn list_growers(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        self.list_links(actor, LinkKind::Grower, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::Role;
    use crate::services::testing;

    #[test]
    fn test_grower_invite_never_auto_accepts() {
        let svc = testing::services();
        let app = testing::actor(&svc, "app@x.example", Role::Applicator);
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        svc.store()
            .update_preferences(
                grower.id,
                &crate::core::invite::AutoAcceptPreferences {
                    enabled: true,
                    ..Default::default()
                },
                chrono::Utc::now(),
            )
            .unwrap();

        let sent = svc.send_invite_to_grower(&app, grower.id).unwrap();
        assert_eq!(sent.link.invite_status, InviteStatus::Pending);
        assert_eq!(testing::notification_types(&svc, grower.id), vec!["GROWER_INVITE"]);

        let page = svc
            .list_growers(&app, &SearchOptions::search("all", "g@x"))
            .unwrap();
        assert_eq!(page.total_results, 1);
    }
}

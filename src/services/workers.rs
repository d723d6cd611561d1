//! Applicator ↔ worker (pilot) relationships

use super::links::{InviteOffer, NewCounterpart};
use super::Services;
use crate::core::actor::EffectiveActor;
use crate::core::error::ApiResult;
use crate::core::filter::SearchOptions;
use crate::core::invite::{InviteStatus, LinkKind, Terms};
use crate::core::pagination::Paged;
use crate::store::LinkedAccount;

impl Services {
    /// Create a worker account already invited by the calling applicator
    pub fn create_worker(
        &self,
        actor: &EffectiveActor,
        input: NewCounterpart,
    ) -> ApiResult<LinkedAccount> {
        self.create_counterpart(actor, LinkKind::Worker, input)
    }

    /// Invite an existing worker with pricing terms
    pub fn send_invite_to_worker(
        &self,
        actor: &EffectiveActor,
        worker_id: i64,
        terms: Terms,
        code: Option<String>,
    ) -> ApiResult<LinkedAccount> {
        self.send_invite(
            actor,
            LinkKind::Worker,
            worker_id,
            InviteOffer {
                terms,
                code,
                permissions: Vec::new(),
            },
        )
    }

    pub fn respond_to_worker_invite(
        &self,
        actor: &EffectiveActor,
        applicator_id: i64,
        status: InviteStatus,
    ) -> ApiResult<LinkedAccount> {
        self.update_invite_status(actor, LinkKind::Worker, applicator_id, status)
    }

    pub fn list_workers(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        self.list_links(actor, LinkKind::Worker, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::Role;
    use crate::services::testing;

    #[test]
    fn test_worker_round_trip() {
        let svc = testing::services();
        let app = testing::actor(&svc, "app@x.example", Role::Applicator);
        let worker = testing::actor(&svc, "pilot@x.example", Role::Worker);

        let sent = svc
            .send_invite_to_worker(
                &app,
                worker.id,
                Terms {
                    percentage_fee: Some(4.5),
                    dollar_per_acre: None,
                },
                Some("PILOT-1".to_string()),
            )
            .unwrap();
        assert_eq!(sent.link.percentage_fee, Some(4.5));

        svc.respond_to_worker_invite(&worker, app.id, InviteStatus::Accepted)
            .unwrap();

        let page = svc
            .list_workers(&app, &SearchOptions::search("code", "pilot-"))
            .unwrap();
        assert_eq!(page.total_results, 1);
        assert_eq!(page.result[0].link.invite_status, InviteStatus::Accepted);
        assert_eq!(
            testing::notification_types(&svc, app.id),
            vec!["PILOT_ACCEPT_INVITE"]
        );
    }
}

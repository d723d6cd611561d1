//! Applicator ↔ applicator user (team member) relationships

use super::links::{InviteOffer, NewCounterpart};
use super::Services;
use crate::core::actor::EffectiveActor;
use crate::core::error::ApiResult;
use crate::core::filter::SearchOptions;
use crate::core::invite::{InviteStatus, LinkKind};
use crate::core::pagination::Paged;
use crate::store::LinkedAccount;

impl Services {
    pub fn create_applicator_user(
        &self,
        actor: &EffectiveActor,
        input: NewCounterpart,
    ) -> ApiResult<LinkedAccount> {
        self.create_counterpart(actor, LinkKind::ApplicatorUser, input)
    }

    /// Invite an existing applicator user; `permissions` replace any previous grant
    pub fn send_invite_to_applicator_user(
        &self,
        actor: &EffectiveActor,
        user_id: i64,
        permissions: Vec<String>,
        code: Option<String>,
    ) -> ApiResult<LinkedAccount> {
        self.send_invite(
            actor,
            LinkKind::ApplicatorUser,
            user_id,
            InviteOffer {
                terms: Default::default(),
                code,
                permissions,
            },
        )
    }

    pub fn respond_to_applicator_user_invite(
        &self,
        actor: &EffectiveActor,
        applicator_id: i64,
        status: InviteStatus,
    ) -> ApiResult<LinkedAccount> {
        self.update_invite_status(actor, LinkKind::ApplicatorUser, applicator_id, status)
    }

    pub fn list_applicator_users(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        self.list_links(actor, LinkKind::ApplicatorUser, options)
    }
}

//! Notification dispatcher
//!
//! `notify` records the in-app row; the `*_mail` helpers render a body and
//! queue it in the outbox. Callers run both inside their own transaction.

use chrono::{DateTime, Utc};
use serde_json::json;

use super::Services;
use crate::core::actor::EffectiveActor;
use crate::core::error::{ApiError, ApiResult};
use crate::core::filter::SearchOptions;
use crate::core::invite::{LinkKind, Terms};
use crate::core::notification::{Notification, NotificationRefs, NotificationType};
use crate::core::pagination::Paged;
use crate::mail::InviteMail;
use crate::store::{Account, Store};

/// What an invite mail needs beyond the two accounts
pub(crate) struct InviteMailRequest<'a> {
    pub kind: LinkKind,
    pub token: &'a str,
    pub expires_at: DateTime<Utc>,
    pub new_account: bool,
    pub terms: Terms,
}

impl Services {
    /// Write one notification row
    pub(crate) fn notify(
        &self,
        tx: &Store,
        user_id: i64,
        notification_type: NotificationType,
        refs: &NotificationRefs,
    ) -> ApiResult<i64> {
        let payload = json!({
            "title": notification_type.title(),
            "refs": refs,
        });
        let id = tx.insert_notification(user_id, notification_type, refs, &payload, Utc::now())?;
        tracing::debug!(user_id, kind = %notification_type, "notification recorded");
        Ok(id)
    }

    /// Queue the invite mail carrying the accept link
    pub(crate) fn queue_invite_mail(
        &self,
        tx: &Store,
        recipient: &Account,
        inviter: &Account,
        request: InviteMailRequest<'_>,
    ) -> ApiResult<i64> {
        let mail = InviteMail {
            recipient_name: recipient.full_name(),
            inviter_name: inviter.display_name(),
            relationship: request.kind.noun().to_string(),
            accept_url: self.config().accept_link(request.token),
            expires_at: request.expires_at,
            new_account: request.new_account,
            terms: request.terms,
        };
        let html = self
            .templates
            .render_invite(&mail)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(tx.enqueue_email(&recipient.email, &mail.subject(), &html, Utc::now())?)
    }

    /// Queue a plain notification mail
    pub(crate) fn queue_notification_mail(
        &self,
        tx: &Store,
        recipient: &Account,
        notification_type: NotificationType,
        message: &str,
    ) -> ApiResult<i64> {
        let subject = notification_type.title();
        let html = self
            .templates
            .render_notification(&recipient.full_name(), subject, message)
            .map_err(|e| ApiError::Internal(e.to_string()))?;
        Ok(tx.enqueue_email(&recipient.email, subject, &html, Utc::now())?)
    }

    /// The actor's notifications, newest first
    pub fn list_notifications(
        &self,
        actor: &EffectiveActor,
        unread_only: bool,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Notification>> {
        let pagination = self.pagination(options);
        let (rows, total) =
            self.store()
                .list_notifications(actor.acting_user_id, unread_only, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    /// Mark one notification, or all of them, as read; returns rows changed
    pub fn mark_notifications_read(
        &self,
        actor: &EffectiveActor,
        id: Option<i64>,
    ) -> ApiResult<usize> {
        let changed = self
            .store()
            .mark_notifications_read(actor.acting_user_id, id, Utc::now())?;
        if id.is_some() && changed == 0 {
            return Err(ApiError::not_found("Unread notification not found"));
        }
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::Role;
    use crate::services::testing;

    #[test]
    fn test_notify_and_mark_read() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let other = testing::actor(&svc, "o@x.example", Role::Grower);

        let id = svc
            .notify(
                svc.store(),
                grower.id,
                NotificationType::GrowerInvite,
                &NotificationRefs::default(),
            )
            .unwrap();

        let unread = svc
            .list_notifications(&grower, true, &SearchOptions::default())
            .unwrap();
        assert_eq!(unread.total_results, 1);
        assert_eq!(unread.result[0].notification_type, NotificationType::GrowerInvite);

        assert!(matches!(
            svc.mark_notifications_read(&other, Some(id)),
            Err(ApiError::NotFound(_))
        ));
        assert_eq!(svc.mark_notifications_read(&grower, Some(id)).unwrap(), 1);

        let unread = svc
            .list_notifications(&grower, true, &SearchOptions::default())
            .unwrap();
        assert_eq!(unread.total_results, 0);
        let all = svc
            .list_notifications(&grower, false, &SearchOptions::default())
            .unwrap();
        assert!(all.result[0].read_at.is_some());
    }

    #[test]
    fn test_payload_carries_title() {
        let svc = testing::services();
        let grower = testing::actor(&svc, "g@x.example", Role::Grower);
        let app = testing::actor(&svc, "a@x.example", Role::Applicator);
        let farm_id = svc
            .store()
            .insert_farm(
                grower.id,
                &crate::store::NewFarm {
                    name: "Home".to_string(),
                    state_id: None,
                    county: None,
                    township: None,
                },
                Utc::now(),
            )
            .unwrap();
        let id = svc
            .notify(
                svc.store(),
                app.id,
                NotificationType::FarmPermissionGranted,
                &NotificationRefs::farm(farm_id, grower.id),
            )
            .unwrap();
        let payload = svc.store().notification_payload(id).unwrap();
        assert_eq!(payload["title"], "You were granted access to a farm");
        assert_eq!(payload["refs"]["farmId"], farm_id);
    }
}

//! Relationship lifecycle shared by workers, applicator users and growers
//!
//! The applicator is always the initiator. Every status change goes through
//! [`crate::core::invite`] and writes its notification and mail inside the
//! same transaction as the link update.

use chrono::Utc;
use serde::Serialize;

use super::accounts::validate_new_account;
use super::notifications::InviteMailRequest;
use super::{require_role, Services};
use crate::core::actor::{EffectiveActor, Role};
use crate::core::error::{is_valid_email, ApiError, ApiResult, Violations};
use crate::core::filter::{self, registry, FilterSchema, SearchOptions};
use crate::core::invite::{self, InviteStatus, LinkKind, Terms};
use crate::core::notification::{NotificationRefs, NotificationType};
use crate::core::pagination::Paged;
use crate::store::{Account, Link, LinkScope, LinkedAccount, NewAccount, NewLink, Store};

/// What the applicator offers with an invite
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InviteOffer {
    pub terms: Terms,
    /// Business identifier for the counterpart, kept on re-send when absent
    pub code: Option<String>,
    pub permissions: Vec<String>,
}

/// Account details for a counterpart created together with its invite
#[derive(Debug, Clone, PartialEq)]
pub struct NewCounterpart {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub offer: InviteOffer,
}

impl NewCounterpart {
    fn into_account(self, role: Role) -> (NewAccount, InviteOffer) {
        (
            NewAccount {
                email: self.email,
                first_name: self.first_name,
                last_name: self.last_name,
                business_name: self.business_name,
                phone: self.phone,
                address: self.address,
                role,
            },
            self.offer,
        )
    }
}

/// Email lookup result with this applicator's link, if any
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailMatch {
    #[serde(flatten)]
    pub account: Account,
    pub invite_status: Option<InviteStatus>,
    pub link_id: Option<i64>,
}

/// Filter schema for the counterparts of `kind`
pub fn schema_for(kind: LinkKind) -> &'static FilterSchema {
    match kind {
        LinkKind::Worker => &registry::WORKERS,
        LinkKind::ApplicatorUser => &registry::APPLICATOR_USERS,
        LinkKind::Grower => &registry::GROWERS,
    }
}

fn validate_offer(offer: &InviteOffer, violations: &mut Violations) {
    violations.check(
        offer.terms.percentage_fee.map_or(true, |v| v >= 0.0),
        "\"percentageFee\" must be greater than or equal to 0",
    );
    violations.check(
        offer.terms.dollar_per_acre.map_or(true, |v| v >= 0.0),
        "\"dollarPerAcre\" must be greater than or equal to 0",
    );
    violations.check(
        offer.permissions.iter().all(|p| !p.trim().is_empty()),
        "\"permissions\" must not contain empty entries",
    );
}

fn require_initiator(actor: &EffectiveActor, kind: LinkKind) -> ApiResult<()> {
    require_role(actor, Role::Applicator, &format!("manage {}s", kind.noun()))
}

/// The account answering invites of `kind` for this actor
fn counterpart_identity(actor: &EffectiveActor, kind: LinkKind) -> ApiResult<i64> {
    if kind == LinkKind::ApplicatorUser && actor.is_delegated {
        return Ok(actor.acting_user_id);
    }
    if actor.role == kind.counterpart_role() {
        Ok(actor.id)
    } else {
        Err(ApiError::forbidden(format!(
            "Only {} accounts can answer {} invitations",
            kind.noun(),
            kind.noun()
        )))
    }
}

fn account_or_not_found(tx: &Store, id: i64, what: &str) -> ApiResult<Account> {
    tx.get_account(id).map_err(|e| match e {
        rusqlite::Error::QueryReturnedNoRows => ApiError::not_found(format!("{} not found", what)),
        other => other.into(),
    })
}

impl Services {
    /// Create the counterpart's account and a PENDING invite in one step
    pub(crate) fn create_counterpart(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        input: NewCounterpart,
    ) -> ApiResult<LinkedAccount> {
        require_initiator(actor, kind)?;
        let (account, offer) = input.into_account(kind.counterpart_role());

        let mut violations = Violations::new();
        validate_new_account(&account, &mut violations);
        validate_offer(&offer, &mut violations);
        violations.finish()?;

        self.store().with_transaction(|tx| {
            if tx.find_account_by_email(&account.email)?.is_some() {
                return Err(ApiError::conflict(format!(
                    "An account with email {} already exists",
                    account.email.trim()
                )));
            }

            let now = Utc::now();
            let counterpart_id = tx.insert_account(&account, now)?;
            let (token, expires_at) = self.issuer().issue(
                kind,
                actor.id,
                counterpart_id,
                self.config().invite_ttl(kind),
                now,
            )?;
            let link_id = tx.insert_link(
                &NewLink {
                    kind,
                    applicator_id: actor.id,
                    counterpart_id,
                    invite_status: invite::send(InviteStatus::NotSent)?,
                    invite_token: Some(token.clone()),
                    expires_at: Some(expires_at),
                    terms: offer.terms,
                    code: offer.code.clone(),
                    permissions: offer.permissions.clone(),
                },
                now,
            )?;

            let counterpart = tx.get_account(counterpart_id)?;
            let inviter = tx.get_account(actor.id)?;
            self.notify(
                tx,
                counterpart_id,
                NotificationType::AccountInvitation,
                &NotificationRefs::link(link_id, actor.id),
            )?;
            self.queue_invite_mail(
                tx,
                &counterpart,
                &inviter,
                InviteMailRequest {
                    kind,
                    token: &token,
                    expires_at,
                    new_account: true,
                    terms: offer.terms,
                },
            )?;
            self.apply_auto_accept(tx, kind, link_id, &counterpart, &inviter, &offer.terms)?;

            tracing::info!(
                kind = %kind,
                applicator_id = actor.id,
                counterpart_id,
                link_id,
                "account created with invite"
            );
            Ok(LinkedAccount {
                account: counterpart,
                link: tx.get_link(link_id)?,
            })
        })
    }

    /// Send or re-send an invite to an existing account.
    ///
    /// A PENDING or REJECTED link is re-issued in place with a fresh token and
    /// the new offer; an ACCEPTED link cannot be invited again.
    pub(crate) fn send_invite(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        counterpart_id: i64,
        offer: InviteOffer,
    ) -> ApiResult<LinkedAccount> {
        require_initiator(actor, kind)?;
        let mut violations = Violations::new();
        validate_offer(&offer, &mut violations);
        violations.finish()?;

        self.store().with_transaction(|tx| {
            let counterpart = account_or_not_found(tx, counterpart_id, "Account")?;
            if counterpart.role != kind.counterpart_role() {
                return Err(ApiError::bad_request(format!(
                    "Account {} is not a {}",
                    counterpart_id,
                    kind.noun()
                )));
            }

            let existing = tx.find_link(kind, actor.id, counterpart_id)?;
            let from = existing
                .as_ref()
                .map(|l| l.invite_status)
                .unwrap_or_default();
            let status = invite::send(from)?;

            let now = Utc::now();
            let (token, expires_at) = self.issuer().issue(
                kind,
                actor.id,
                counterpart_id,
                self.config().invite_ttl(kind),
                now,
            )?;
            let values = NewLink {
                kind,
                applicator_id: actor.id,
                counterpart_id,
                invite_status: status,
                invite_token: Some(token.clone()),
                expires_at: Some(expires_at),
                terms: offer.terms,
                code: offer.code.clone(),
                permissions: offer.permissions.clone(),
            };
            let link_id = match existing {
                Some(link) => {
                    tx.reissue_link(link.id, &values, now)?;
                    link.id
                }
                None => tx.insert_link(&values, now)?,
            };

            let inviter = tx.get_account(actor.id)?;
            self.notify(
                tx,
                counterpart_id,
                kind.invite_notification(),
                &NotificationRefs::link(link_id, actor.id),
            )?;
            self.queue_invite_mail(
                tx,
                &counterpart,
                &inviter,
                InviteMailRequest {
                    kind,
                    token: &token,
                    expires_at,
                    new_account: false,
                    terms: offer.terms,
                },
            )?;
            self.apply_auto_accept(tx, kind, link_id, &counterpart, &inviter, &offer.terms)?;

            tracing::info!(
                kind = %kind,
                applicator_id = actor.id,
                counterpart_id,
                link_id,
                resend = from != InviteStatus::NotSent,
                "invite sent"
            );
            Ok(LinkedAccount {
                account: counterpart,
                link: tx.get_link(link_id)?,
            })
        })
    }

    /// Accept immediately when the counterpart's standing preferences allow it
    fn apply_auto_accept(
        &self,
        tx: &Store,
        kind: LinkKind,
        link_id: i64,
        counterpart: &Account,
        inviter: &Account,
        terms: &Terms,
    ) -> ApiResult<bool> {
        if !counterpart.preferences().accepts(terms) {
            return Ok(false);
        }

        let status = invite::accept(InviteStatus::Pending)?;
        tx.set_link_status(link_id, status, Utc::now())?;
        self.announce_response(tx, kind, link_id, counterpart, inviter, status)?;
        tracing::info!(kind = %kind, link_id, counterpart_id = counterpart.id, "invite auto-accepted");
        Ok(true)
    }

    /// Tell the initiator how the counterpart answered
    fn announce_response(
        &self,
        tx: &Store,
        kind: LinkKind,
        link_id: i64,
        counterpart: &Account,
        inviter: &Account,
        status: InviteStatus,
    ) -> ApiResult<()> {
        let (notification_type, verb) = match status {
            InviteStatus::Accepted => (kind.accept_notification(), "accepted"),
            _ => (kind.reject_notification(), "declined"),
        };
        self.notify(
            tx,
            inviter.id,
            notification_type,
            &NotificationRefs::link(link_id, counterpart.id),
        )?;
        self.queue_notification_mail(
            tx,
            inviter,
            notification_type,
            &format!(
                "{} {} your {} invitation.",
                counterpart.display_name(),
                verb,
                kind.noun()
            ),
        )?;
        Ok(())
    }

    /// Apply the counterpart's answer to a PENDING link
    fn record_response(
        &self,
        tx: &Store,
        link: &Link,
        status: InviteStatus,
    ) -> ApiResult<LinkedAccount> {
        let next = match status {
            InviteStatus::Accepted => invite::accept(link.invite_status)?,
            InviteStatus::Rejected => invite::reject(link.invite_status)?,
            other => {
                return Err(ApiError::bad_request(format!(
                    "\"status\" must be one of [ACCEPTED, REJECTED], got {}",
                    other
                )))
            }
        };

        tx.set_link_status(link.id, next, Utc::now())?;
        let counterpart = tx.get_account(link.counterpart_id)?;
        let applicator = tx.get_account(link.applicator_id)?;
        self.announce_response(tx, link.kind, link.id, &counterpart, &applicator, next)?;

        tracing::info!(
            kind = %link.kind,
            link_id = link.id,
            status = %next,
            "invite answered"
        );
        Ok(LinkedAccount {
            account: applicator,
            link: tx.get_link(link.id)?,
        })
    }

    /// The invited account accepts or rejects the applicator's pending invite
    pub fn update_invite_status(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        applicator_id: i64,
        status: InviteStatus,
    ) -> ApiResult<LinkedAccount> {
        if !matches!(status, InviteStatus::Accepted | InviteStatus::Rejected) {
            return Err(ApiError::bad_request(format!(
                "\"status\" must be one of [ACCEPTED, REJECTED], got {}",
                status
            )));
        }
        let counterpart_id = counterpart_identity(actor, kind)?;

        self.store().with_transaction(|tx| {
            let link = tx
                .find_link(kind, applicator_id, counterpart_id)?
                .ok_or_else(|| ApiError::not_found("No pending invitation found"))?;
            self.record_response(tx, &link, status)
        })
    }

    /// Accept through the link mailed with the invite
    pub fn accept_invite_token(&self, token: &str) -> ApiResult<LinkedAccount> {
        let claims = self.issuer().verify(token)?;

        self.store().with_transaction(|tx| {
            let link = tx
                .find_link_by_token(token.trim())?
                .ok_or_else(|| ApiError::Unauthorized("Invitation token is no longer valid".to_string()))?;
            if link.kind != claims.kind
                || link.applicator_id != claims.applicator_id
                || link.counterpart_id != claims.sub
            {
                return Err(ApiError::Unauthorized(
                    "Invitation token does not match this invitation".to_string(),
                ));
            }
            self.record_response(tx, &link, InviteStatus::Accepted)
        })
    }

    /// Exact, case-insensitive lookup of a prospective counterpart
    pub fn search_by_email(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        email: &str,
    ) -> ApiResult<EmailMatch> {
        require_initiator(actor, kind)?;
        if !is_valid_email(email) {
            return Err(ApiError::bad_request("\"email\" must be a valid email"));
        }

        let account = self
            .store()
            .find_account_by_email(email)?
            .ok_or_else(|| ApiError::not_found(format!("No account found for {}", email.trim())))?;
        if account.role != kind.counterpart_role() {
            return Err(ApiError::forbidden(format!(
                "{} is not a {} account",
                account.email,
                kind.noun()
            )));
        }

        let link = self.store().find_link(kind, actor.id, account.id)?;
        Ok(EmailMatch {
            account,
            invite_status: link.as_ref().map(|l| l.invite_status),
            link_id: link.map(|l| l.id),
        })
    }

    /// The applicator's own links of `kind`
    pub fn list_links(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        require_initiator(actor, kind)?;
        let pagination = self.pagination(options);
        let filter = filter::build(schema_for(kind), options)?;
        let (rows, total) =
            self.store()
                .list_links(&LinkScope::owned_by(kind, actor.id), filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    /// Invites of `kind` waiting on this actor, with the applicator's details
    pub fn pending_invites(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        self.addressed_links(actor, kind, vec![InviteStatus::Pending], options)
    }

    /// Applicators this actor works with or has been invited by
    pub fn list_applicators_for(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        self.addressed_links(
            actor,
            kind,
            vec![InviteStatus::Accepted, InviteStatus::Pending],
            options,
        )
    }

    fn addressed_links(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        statuses: Vec<InviteStatus>,
        options: &SearchOptions,
    ) -> ApiResult<Paged<LinkedAccount>> {
        let counterpart_id = counterpart_identity(actor, kind)?;
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::APPLICATORS, options)?;
        let scope = LinkScope::addressed_to(kind, counterpart_id, statuses);
        let (rows, total) = self.store().list_links(&scope, filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    pub fn get_link(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        counterpart_id: i64,
    ) -> ApiResult<LinkedAccount> {
        require_initiator(actor, kind)?;
        let link = self
            .store()
            .find_link(kind, actor.id, counterpart_id)?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", capitalize(kind.noun()))))?;
        let account = self.store().get_account(counterpart_id)?;
        Ok(LinkedAccount { account, link })
    }

    /// Drop the relationship; the counterpart's account stays
    pub fn remove_link(
        &self,
        actor: &EffectiveActor,
        kind: LinkKind,
        counterpart_id: i64,
    ) -> ApiResult<()> {
        require_initiator(actor, kind)?;
        let link = self
            .store()
            .find_link(kind, actor.id, counterpart_id)?
            .ok_or_else(|| ApiError::not_found(format!("{} not found", capitalize(kind.noun()))))?;
        self.store().delete_link(link.id)?;
        tracing::info!(kind = %kind, link_id = link.id, by = actor.acting_user_id, "link removed");
        Ok(())
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

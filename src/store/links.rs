//! Relationship link queries
//!
//! All three relationship kinds share the `invite_links` table. List queries
//! join the *other* party's account under the `a` alias so the filter
//! registry's column names apply unchanged.

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::accounts::{Account, ACCOUNT_COLUMNS};
use super::Store;
use crate::core::filter::Predicate;
use crate::core::invite::{InviteStatus, LinkKind, Terms};
use crate::core::pagination::Pagination;

/// Link columns, selected through the `l` alias with collision-free names
pub(crate) const LINK_COLUMNS: &str = "l.id AS link_id, l.kind, l.applicator_id, \
     l.counterpart_id, l.invite_status, l.invite_token, l.expires_at, l.percentage_fee, \
     l.dollar_per_acre, l.code, l.permissions, l.created_at AS link_created_at, \
     l.updated_at AS link_updated_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[serde(rename = "linkId")]
    pub id: i64,
    pub kind: LinkKind,
    pub applicator_id: i64,
    pub counterpart_id: i64,
    pub invite_status: InviteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub percentage_fee: Option<f64>,
    pub dollar_per_acre: Option<f64>,
    pub code: Option<String>,
    pub permissions: Vec<String>,
    #[serde(rename = "linkCreatedAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "linkUpdatedAt")]
    pub updated_at: DateTime<Utc>,
}

impl Link {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let permissions_json: String = row.get("permissions")?;
        let permissions = serde_json::from_str(&permissions_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(10, Type::Text, Box::new(e))
        })?;

        Ok(Self {
            id: row.get("link_id")?,
            kind: row.get("kind")?,
            applicator_id: row.get("applicator_id")?,
            counterpart_id: row.get("counterpart_id")?,
            invite_status: row.get("invite_status")?,
            invite_token: row.get("invite_token")?,
            expires_at: row.get("expires_at")?,
            percentage_fee: row.get("percentage_fee")?,
            dollar_per_acre: row.get("dollar_per_acre")?,
            code: row.get("code")?,
            permissions,
            created_at: row.get("link_created_at")?,
            updated_at: row.get("link_updated_at")?,
        })
    }

    pub fn terms(&self) -> Terms {
        Terms {
            percentage_fee: self.percentage_fee,
            dollar_per_acre: self.dollar_per_acre,
        }
    }
}

/// The other party's account merged with the link
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkedAccount {
    #[serde(flatten)]
    pub account: Account,
    #[serde(flatten)]
    pub link: Link,
}

impl LinkedAccount {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            account: Account::from_row(row)?,
            link: Link::from_row(row)?,
        })
    }
}

/// Values written when a link is created or re-issued
#[derive(Debug, Clone, PartialEq)]
pub struct NewLink {
    pub kind: LinkKind,
    pub applicator_id: i64,
    pub counterpart_id: i64,
    pub invite_status: InviteStatus,
    pub invite_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub terms: Terms,
    pub code: Option<String>,
    pub permissions: Vec<String>,
}

/// Which party the list is being viewed from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkSide {
    /// Links the applicator created; rows show the counterpart
    Initiator(i64),
    /// Links addressed to this account; rows show the applicator
    Counterpart(i64),
}

/// Fixed part of a relationship list query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkScope {
    pub kind: LinkKind,
    pub side: LinkSide,
    /// Empty means any status
    pub statuses: Vec<InviteStatus>,
}

impl LinkScope {
    pub fn owned_by(kind: LinkKind, applicator_id: i64) -> Self {
        Self {
            kind,
            side: LinkSide::Initiator(applicator_id),
            statuses: Vec::new(),
        }
    }

    pub fn addressed_to(kind: LinkKind, counterpart_id: i64, statuses: Vec<InviteStatus>) -> Self {
        Self {
            kind,
            side: LinkSide::Counterpart(counterpart_id),
            statuses,
        }
    }

    /// Ownership clause every list query starts from
    pub fn predicate(&self) -> Predicate {
        let owner = match self.side {
            LinkSide::Initiator(id) => Predicate::eq_int("l.applicator_id", id),
            LinkSide::Counterpart(id) => Predicate::eq_int("l.counterpart_id", id),
        };
        let mut pred = Predicate::eq_text("l.kind", self.kind.as_str()).and(owner);
        if !self.statuses.is_empty() {
            pred = pred.and(Predicate::Any(
                self.statuses
                    .iter()
                    .map(|s| Predicate::eq_text("l.invite_status", s.as_str()))
                    .collect(),
            ));
        }
        pred
    }

    fn join_column(&self) -> &'static str {
        match self.side {
            LinkSide::Initiator(_) => "l.counterpart_id",
            LinkSide::Counterpart(_) => "l.applicator_id",
        }
    }
}

impl Store {
    pub fn insert_link(&self, link: &NewLink, now: DateTime<Utc>) -> rusqlite::Result<i64> {
        let permissions = serde_json::to_string(&link.permissions)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.conn().execute(
            "INSERT INTO invite_links (kind, applicator_id, counterpart_id, invite_status, \
             invite_token, expires_at, percentage_fee, dollar_per_acre, code, permissions, \
             created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
            params![
                link.kind,
                link.applicator_id,
                link.counterpart_id,
                link.invite_status,
                link.invite_token,
                link.expires_at,
                link.terms.percentage_fee,
                link.terms.dollar_per_acre,
                link.code,
                permissions,
                now,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Overwrite the invite fields of an existing row, keeping its id
    pub fn reissue_link(&self, id: i64, link: &NewLink, now: DateTime<Utc>) -> rusqlite::Result<usize> {
        let permissions = serde_json::to_string(&link.permissions)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        self.conn().execute(
            "UPDATE invite_links SET invite_status = ?1, invite_token = ?2, expires_at = ?3, \
             percentage_fee = ?4, dollar_per_acre = ?5, code = COALESCE(?6, code), \
             permissions = ?7, updated_at = ?8 WHERE id = ?9",
            params![
                link.invite_status,
                link.invite_token,
                link.expires_at,
                link.terms.percentage_fee,
                link.terms.dollar_per_acre,
                link.code,
                permissions,
                now,
                id,
            ],
        )
    }

    /// Record a response; the token is spent either way
    pub fn set_link_status(
        &self,
        id: i64,
        status: InviteStatus,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE invite_links SET invite_status = ?1, invite_token = NULL, updated_at = ?2 \
             WHERE id = ?3",
            params![status, now, id],
        )
    }

    pub fn get_link(&self, id: i64) -> rusqlite::Result<Link> {
        self.conn().query_row(
            &format!("SELECT {} FROM invite_links l WHERE l.id = ?1", LINK_COLUMNS),
            [id],
            Link::from_row,
        )
    }

    pub fn find_link(
        &self,
        kind: LinkKind,
        applicator_id: i64,
        counterpart_id: i64,
    ) -> rusqlite::Result<Option<Link>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {} FROM invite_links l \
                     WHERE l.kind = ?1 AND l.applicator_id = ?2 AND l.counterpart_id = ?3",
                    LINK_COLUMNS
                ),
                params![kind, applicator_id, counterpart_id],
                Link::from_row,
            )
            .optional()
    }

    pub fn find_link_by_token(&self, token: &str) -> rusqlite::Result<Option<Link>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {} FROM invite_links l WHERE l.invite_token = ?1",
                    LINK_COLUMNS
                ),
                [token],
                Link::from_row,
            )
            .optional()
    }

    /// First ACCEPTED link of `kind` where `counterpart_id` is the invited party
    pub fn accepted_link_for(
        &self,
        kind: LinkKind,
        counterpart_id: i64,
    ) -> rusqlite::Result<Option<Link>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {} FROM invite_links l \
                     WHERE l.kind = ?1 AND l.counterpart_id = ?2 AND l.invite_status = ?3 \
                     ORDER BY l.updated_at DESC, l.id DESC LIMIT 1",
                    LINK_COLUMNS
                ),
                params![kind, counterpart_id, InviteStatus::Accepted],
                Link::from_row,
            )
            .optional()
    }

    pub fn delete_link(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn()
            .execute("DELETE FROM invite_links WHERE id = ?1", [id])
    }

    /// Paged relationship list: the scope's ownership clause AND `filter`
    pub fn list_links(
        &self,
        scope: &LinkScope,
        filter: Option<Predicate>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<LinkedAccount>, i64)> {
        let mut pred = scope.predicate();
        if let Some(extra) = filter {
            pred = pred.and(extra);
        }

        let columns = format!("{}, {}", ACCOUNT_COLUMNS, LINK_COLUMNS);
        let from = format!(
            "FROM invite_links l JOIN accounts a ON a.id = {}",
            scope.join_column()
        );
        self.paged(
            &columns,
            &from,
            &pred,
            "l.updated_at DESC, l.id DESC",
            pagination,
            LinkedAccount::from_row,
        )
    }
}

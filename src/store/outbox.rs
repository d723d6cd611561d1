//! Outgoing mail queue

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};
use serde::Serialize;

use super::Store;
use crate::core::filter::Predicate;
use crate::core::pagination::Pagination;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OutboxStatus {
    Pending,
    Sent,
    Failed,
}

impl OutboxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OutboxStatus::Pending => "PENDING",
            OutboxStatus::Sent => "SENT",
            OutboxStatus::Failed => "FAILED",
        }
    }
}

impl std::fmt::Display for OutboxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for OutboxStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(OutboxStatus::Pending),
            "SENT" => Ok(OutboxStatus::Sent),
            "FAILED" => Ok(OutboxStatus::Failed),
            _ => Err(format!("Unknown outbox status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxMessage {
    pub id: i64,
    pub recipient: String,
    pub subject: String,
    #[serde(skip_serializing)]
    pub html: String,
    pub status: OutboxStatus,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

const OUTBOX_COLUMNS: &str =
    "o.id, o.recipient, o.subject, o.html, o.status, o.attempts, o.last_error, o.created_at, o.sent_at";

fn message_from_row(row: &Row<'_>) -> rusqlite::Result<OutboxMessage> {
    Ok(OutboxMessage {
        id: row.get("id")?,
        recipient: row.get("recipient")?,
        subject: row.get("subject")?,
        html: row.get("html")?,
        status: row.get("status")?,
        attempts: row.get("attempts")?,
        last_error: row.get("last_error")?,
        created_at: row.get("created_at")?,
        sent_at: row.get("sent_at")?,
    })
}

impl Store {
    pub fn enqueue_email(
        &self,
        recipient: &str,
        subject: &str,
        html: &str,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO outbox (recipient, subject, html, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?4)",
            params![recipient, subject, html, now],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    /// Oldest pending messages first
    pub fn pending_outbox(&self, limit: i64) -> rusqlite::Result<Vec<OutboxMessage>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM outbox o WHERE o.status = ?1 ORDER BY o.id LIMIT ?2",
            OUTBOX_COLUMNS
        ))?;
        let rows = stmt
            .query_map(params![OutboxStatus::Pending, limit], message_from_row)?
            .collect();
        rows
    }

    pub fn list_outbox(
        &self,
        status: Option<OutboxStatus>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<OutboxMessage>, i64)> {
        let filter = match status {
            Some(s) => Predicate::eq_text("o.status", s.as_str()),
            None => Predicate::All(Vec::new()),
        };
        self.paged(
            OUTBOX_COLUMNS,
            "FROM outbox o",
            &filter,
            "o.id DESC",
            pagination,
            message_from_row,
        )
    }

    pub fn mark_outbox_sent(&self, id: i64, attempts: u32, now: DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE outbox SET status = ?1, attempts = ?2, last_error = NULL, sent_at = ?3, \
             updated_at = ?3 WHERE id = ?4",
            params![OutboxStatus::Sent, attempts, now, id],
        )
    }

    pub fn mark_outbox_failed(
        &self,
        id: i64,
        attempts: u32,
        error: &str,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE outbox SET status = ?1, attempts = ?2, last_error = ?3, updated_at = ?4 \
             WHERE id = ?5",
            params![OutboxStatus::Failed, attempts, error, now, id],
        )
    }

    /// Put failed messages back in the queue
    pub fn requeue_failed_outbox(&self, now: DateTime<Utc>) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE outbox SET status = ?1, updated_at = ?2 WHERE status = ?3",
            params![OutboxStatus::Pending, now, OutboxStatus::Failed],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_drain() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .enqueue_email("w@x.example", "Invite", "<p>hi</p>", Utc::now())
            .unwrap();

        let pending = store.pending_outbox(10).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].status, OutboxStatus::Pending);
        assert_eq!(pending[0].attempts, 0);

        store.mark_outbox_sent(id, 1, Utc::now()).unwrap();
        assert!(store.pending_outbox(10).unwrap().is_empty());

        let (all, total) = store
            .list_outbox(Some(OutboxStatus::Sent), Pagination::default())
            .unwrap();
        assert_eq!(total, 1);
        assert!(all[0].sent_at.is_some());
    }

    #[test]
    fn test_failed_messages_can_be_requeued() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .enqueue_email("w@x.example", "Invite", "<p>hi</p>", Utc::now())
            .unwrap();
        store.mark_outbox_failed(id, 3, "relay down", Utc::now()).unwrap();
        assert!(store.pending_outbox(10).unwrap().is_empty());

        assert_eq!(store.requeue_failed_outbox(Utc::now()).unwrap(), 1);
        let pending = store.pending_outbox(10).unwrap();
        assert_eq!(pending[0].last_error.as_deref(), Some("relay down"));
    }
}

//! Notification rows

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::Store;
use crate::core::filter::Predicate;
use crate::core::notification::{Notification, NotificationRefs, NotificationType};
use crate::core::pagination::Pagination;

const NOTIFICATION_COLUMNS: &str =
    "n.id, n.user_id, n.type, n.link_id, n.farm_id, n.from_account_id, n.created_at, n.read_at";

fn notification_from_row(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        user_id: row.get("user_id")?,
        notification_type: row.get("type")?,
        refs: NotificationRefs {
            link_id: row.get("link_id")?,
            farm_id: row.get("farm_id")?,
            from_account_id: row.get("from_account_id")?,
        },
        created_at: row.get("created_at")?,
        read_at: row.get("read_at")?,
    })
}

impl Store {
    pub fn insert_notification(
        &self,
        user_id: i64,
        notification_type: NotificationType,
        refs: &NotificationRefs,
        payload: &serde_json::Value,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO notifications (user_id, type, link_id, farm_id, from_account_id, payload, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                notification_type,
                refs.link_id,
                refs.farm_id,
                refs.from_account_id,
                payload.to_string(),
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn list_notifications(
        &self,
        user_id: i64,
        unread_only: bool,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Notification>, i64)> {
        let mut filter = Predicate::eq_int("n.user_id", user_id);
        if unread_only {
            filter = filter.and(Predicate::IsNull { column: "n.read_at" });
        }
        self.paged(
            NOTIFICATION_COLUMNS,
            "FROM notifications n",
            &filter,
            "n.id DESC",
            pagination,
            notification_from_row,
        )
    }

    /// Mark one notification (or all of the user's when `id` is `None`) as read
    pub fn mark_notifications_read(
        &self,
        user_id: i64,
        id: Option<i64>,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        match id {
            Some(id) => self.conn().execute(
                "UPDATE notifications SET read_at = ?1 WHERE id = ?2 AND user_id = ?3 AND read_at IS NULL",
                params![now, id, user_id],
            ),
            None => self.conn().execute(
                "UPDATE notifications SET read_at = ?1 WHERE user_id = ?2 AND read_at IS NULL",
                params![now, user_id],
            ),
        }
    }

    pub fn notification_payload(&self, id: i64) -> rusqlite::Result<serde_json::Value> {
        let raw: String = self.conn().query_row(
            "SELECT payload FROM notifications WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        serde_json::from_str(&raw).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })
    }
}

//! SQLite serialization for typed enums
//!
//! Enums are stored as their SCREAMING_SNAKE_CASE names so the database stays
//! readable and matches the strings clients see.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};

use crate::core::actor::{ProfileStatus, Role};
use crate::core::invite::{InviteStatus, LinkKind};
use crate::core::notification::NotificationType;
use crate::store::outbox::OutboxStatus;

fn invalid(e: String) -> FromSqlError {
    FromSqlError::Other(Box::new(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        e,
    )))
}

macro_rules! sql_text_enum {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.as_str()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value.as_str()?.parse().map_err(invalid)
                }
            }
        )*
    };
}

sql_text_enum!(
    Role,
    ProfileStatus,
    InviteStatus,
    LinkKind,
    NotificationType,
    OutboxStatus,
);

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    fn roundtrip<T: ToSql + FromSql>(conn: &Connection, value: T) -> T {
        conn.query_row("SELECT ?1", [&value], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_enums_roundtrip_through_sqlite() {
        let conn = Connection::open_in_memory().unwrap();
        for role in Role::all() {
            assert_eq!(roundtrip(&conn, *role), *role);
        }
        for status in InviteStatus::all() {
            assert_eq!(roundtrip(&conn, *status), *status);
        }
        for kind in LinkKind::all() {
            assert_eq!(roundtrip(&conn, *kind), *kind);
        }
        assert_eq!(
            roundtrip(&conn, NotificationType::FarmPermissionGranted),
            NotificationType::FarmPermissionGranted
        );
    }

    #[test]
    fn test_stored_text_is_screaming_snake() {
        let conn = Connection::open_in_memory().unwrap();
        let text: String = conn
            .query_row("SELECT ?1", [&InviteStatus::NotSent], |row| row.get(0))
            .unwrap();
        assert_eq!(text, "NOT_SENT");
    }

    #[test]
    fn test_unknown_text_is_a_conversion_error() {
        let conn = Connection::open_in_memory().unwrap();
        let result: rusqlite::Result<InviteStatus> =
            conn.query_row("SELECT 'MAYBE'", [], |row| row.get(0));
        assert!(result.is_err());
    }
}

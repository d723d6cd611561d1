//! SQLite persistence gateway
//!
//! One connection per process. Table-specific queries live in the submodules
//! as `impl Store` blocks; multi-statement writes go through
//! [`Store::with_transaction`].

use std::path::Path;

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, Row};
use thiserror::Error;

use crate::core::filter::Predicate;
use crate::core::pagination::Pagination;

pub mod accounts;
pub mod catalog;
pub mod farms;
pub mod links;
pub mod migrations;
pub mod notifications;
pub mod outbox;
mod serialize;

pub use accounts::{Account, NewAccount};
pub use catalog::{Chemical, Equipment, NewChemical, NewEquipment, NewProduct, Product, UsState};
pub use farms::{Farm, FarmPermission, NewFarm};
pub use links::{Link, LinkScope, LinkSide, LinkedAccount, NewLink};
pub use outbox::{OutboxMessage, OutboxStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (or create) the database at `path` and bring the schema up to date
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(StoreError::CreateDir)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::prepare(conn)
    }

    /// Fresh private database, used by tests
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        let applied = migrations::run_migrations(&conn).map_err(StoreError::Migration)?;
        if applied > 0 {
            tracing::debug!(applied, "database schema updated");
        }
        Ok(Self { conn })
    }

    /// Borrow the underlying connection for ad-hoc queries
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Run `f` inside `BEGIN IMMEDIATE`; commit on `Ok`, roll back on `Err`
    pub fn with_transaction<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: From<rusqlite::Error>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(value) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback) = self.conn.execute_batch("ROLLBACK") {
                    tracing::warn!("rollback failed: {}", rollback);
                }
                Err(e)
            }
        }
    }

    /// Run a paged list query.
    ///
    /// `from` is everything between `SELECT` and `WHERE` minus the column list
    /// (`FROM x JOIN y ...`); `filter` becomes the WHERE clause. Returns the
    /// page of rows plus the unpaged total.
    pub(crate) fn paged<T>(
        &self,
        columns: &str,
        from: &str,
        filter: &Predicate,
        order_by: &str,
        pagination: Pagination,
        map: impl Fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> rusqlite::Result<(Vec<T>, i64)> {
        let (clause, params) = filter.to_sql();

        let count_sql = format!("SELECT COUNT(*) {} WHERE {}", from, clause);
        tracing::debug!(sql = %count_sql, "count query");
        let total: i64 = self
            .conn
            .query_row(&count_sql, params_from_iter(params.iter()), |row| row.get(0))?;

        let list_sql = format!(
            "SELECT {} {} WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            columns, from, clause, order_by
        );
        let mut list_params = params;
        list_params.push(Value::Integer(pagination.limit));
        list_params.push(Value::Integer(pagination.skip));

        let mut stmt = self.conn.prepare(&list_sql)?;
        let rows = stmt
            .query_map(params_from_iter(list_params.iter()), |row| map(row))?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((rows, total))
    }
}

//! Account queries

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::core::actor::{ProfileStatus, Role};
use crate::core::filter::Predicate;
use crate::core::invite::AutoAcceptPreferences;
use crate::core::pagination::Pagination;

/// Account columns, selected through the `a` alias
pub(crate) const ACCOUNT_COLUMNS: &str = "a.id, a.email, a.first_name, a.last_name, \
     a.business_name, a.phone, a.address, a.role, a.profile_status, a.auto_accept_invite, \
     a.min_percentage_fee, a.min_dollar_per_acre, a.created_at, a.updated_at";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
    pub profile_status: ProfileStatus,
    pub auto_accept_invite: bool,
    pub min_percentage_fee: Option<f64>,
    pub min_dollar_per_acre: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub(crate) fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            email: row.get("email")?,
            first_name: row.get("first_name")?,
            last_name: row.get("last_name")?,
            business_name: row.get("business_name")?,
            phone: row.get("phone")?,
            address: row.get("address")?,
            role: row.get("role")?,
            profile_status: row.get("profile_status")?,
            auto_accept_invite: row.get("auto_accept_invite")?,
            min_percentage_fee: row.get("min_percentage_fee")?,
            min_dollar_per_acre: row.get("min_dollar_per_acre")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Name shown to other parties: business name when set
    pub fn display_name(&self) -> String {
        match &self.business_name {
            Some(name) if !name.trim().is_empty() => name.clone(),
            _ => self.full_name(),
        }
    }

    pub fn preferences(&self) -> AutoAcceptPreferences {
        AutoAcceptPreferences {
            enabled: self.auto_accept_invite,
            min_percentage_fee: self.min_percentage_fee,
            min_dollar_per_acre: self.min_dollar_per_acre,
        }
    }
}

/// Fields supplied when registering an account
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAccount {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub business_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub role: Role,
}

impl Store {
    pub fn insert_account(&self, account: &NewAccount, now: DateTime<Utc>) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO accounts (email, first_name, last_name, business_name, phone, address, \
             role, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                account.email.trim(),
                account.first_name.trim(),
                account.last_name.trim(),
                account.business_name,
                account.phone,
                account.address,
                account.role,
                now,
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_account(&self, id: i64) -> rusqlite::Result<Account> {
        self.conn().query_row(
            &format!("SELECT {} FROM accounts a WHERE a.id = ?1", ACCOUNT_COLUMNS),
            [id],
            Account::from_row,
        )
    }

    /// Case-insensitive exact match
    pub fn find_account_by_email(&self, email: &str) -> rusqlite::Result<Option<Account>> {
        self.conn()
            .query_row(
                &format!(
                    "SELECT {} FROM accounts a WHERE a.email = ?1 COLLATE NOCASE",
                    ACCOUNT_COLUMNS
                ),
                [email.trim()],
                Account::from_row,
            )
            .optional()
    }

    pub fn list_accounts(
        &self,
        filter: &Predicate,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Account>, i64)> {
        self.paged(
            ACCOUNT_COLUMNS,
            "FROM accounts a",
            filter,
            "a.id",
            pagination,
            Account::from_row,
        )
    }

    pub fn update_preferences(
        &self,
        id: i64,
        prefs: &AutoAcceptPreferences,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE accounts SET auto_accept_invite = ?1, min_percentage_fee = ?2, \
             min_dollar_per_acre = ?3, updated_at = ?4 WHERE id = ?5",
            params![
                prefs.enabled,
                prefs.min_percentage_fee,
                prefs.min_dollar_per_acre,
                now,
                id
            ],
        )
    }

    pub fn update_profile_status(
        &self,
        id: i64,
        status: ProfileStatus,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE accounts SET profile_status = ?1, updated_at = ?2 WHERE id = ?3",
            params![status, now, id],
        )
    }

    /// Removes the account; links, permissions and notifications cascade
    pub fn delete_account(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn()
            .execute("DELETE FROM accounts WHERE id = ?1", [id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str, role: Role) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            first_name: "Sam".to_string(),
            last_name: "Field".to_string(),
            business_name: None,
            phone: None,
            address: None,
            role,
        }
    }

    #[test]
    fn test_insert_and_get() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .insert_account(&new_account("sam@farm.example", Role::Grower), Utc::now())
            .unwrap();

        let account = store.get_account(id).unwrap();
        assert_eq!(account.email, "sam@farm.example");
        assert_eq!(account.role, Role::Grower);
        assert_eq!(account.profile_status, ProfileStatus::Incomplete);
        assert!(!account.auto_accept_invite);
    }

    #[test]
    fn test_email_lookup_ignores_case() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_account(&new_account("Pilot@Air.example", Role::Worker), Utc::now())
            .unwrap();

        let found = store.find_account_by_email("pilot@air.EXAMPLE").unwrap();
        assert!(found.is_some());
        assert!(store.find_account_by_email("nobody@air.example").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_email_is_unique_violation() {
        let store = Store::open_in_memory().unwrap();
        store
            .insert_account(&new_account("a@b.example", Role::Worker), Utc::now())
            .unwrap();
        let err = store
            .insert_account(&new_account("A@B.example", Role::Grower), Utc::now())
            .unwrap_err();
        assert!(matches!(
            crate::core::error::ApiError::from(err),
            crate::core::error::ApiError::Conflict(_)
        ));
    }

    #[test]
    fn test_preferences_roundtrip() {
        let store = Store::open_in_memory().unwrap();
        let id = store
            .insert_account(&new_account("w@b.example", Role::Worker), Utc::now())
            .unwrap();
        let prefs = AutoAcceptPreferences {
            enabled: true,
            min_percentage_fee: None,
            min_dollar_per_acre: Some(10.0),
        };
        store.update_preferences(id, &prefs, Utc::now()).unwrap();
        assert_eq!(store.get_account(id).unwrap().preferences(), prefs);
    }
}

//! Farm and farm permission queries

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::core::filter::Predicate;
use crate::core::pagination::Pagination;

const FARM_COLUMNS: &str =
    "f.id, f.grower_id, f.name, f.state_id, s.code AS state_code, f.county, f.township, \
     f.created_at, f.updated_at";

const FARM_FROM: &str = "FROM farms f LEFT JOIN us_states s ON s.id = f.state_id";

const PERMISSION_COLUMNS: &str = "p.id, p.farm_id, p.applicator_id, p.can_view, p.can_edit, \
     p.created_at, p.updated_at, a.email AS applicator_email, \
     COALESCE(a.business_name, a.first_name || ' ' || a.last_name) AS applicator_name";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Farm {
    pub id: i64,
    pub grower_id: i64,
    pub name: String,
    pub state_id: Option<i64>,
    pub state_code: Option<String>,
    pub county: Option<String>,
    pub township: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Farm {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            grower_id: row.get("grower_id")?,
            name: row.get("name")?,
            state_id: row.get("state_id")?,
            state_code: row.get("state_code")?,
            county: row.get("county")?,
            township: row.get("township")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFarm {
    pub name: String,
    pub state_id: Option<i64>,
    pub county: Option<String>,
    pub township: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FarmPermission {
    pub id: i64,
    pub farm_id: i64,
    pub applicator_id: i64,
    pub applicator_email: String,
    pub applicator_name: String,
    pub can_view: bool,
    pub can_edit: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FarmPermission {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            farm_id: row.get("farm_id")?,
            applicator_id: row.get("applicator_id")?,
            applicator_email: row.get("applicator_email")?,
            applicator_name: row.get("applicator_name")?,
            can_view: row.get("can_view")?,
            can_edit: row.get("can_edit")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

impl Store {
    pub fn insert_farm(&self, grower_id: i64, farm: &NewFarm, now: DateTime<Utc>) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO farms (grower_id, name, state_id, county, township, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                grower_id,
                farm.name.trim(),
                farm.state_id,
                farm.county,
                farm.township,
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn find_farm(&self, id: i64) -> rusqlite::Result<Option<Farm>> {
        self.conn()
            .query_row(
                &format!("SELECT {} {} WHERE f.id = ?1", FARM_COLUMNS, FARM_FROM),
                [id],
                Farm::from_row,
            )
            .optional()
    }

    /// Farms owned by `grower_id`, or every farm when `None`
    pub fn list_farms(
        &self,
        grower_id: Option<i64>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Farm>, i64)> {
        let filter = match grower_id {
            Some(id) => Predicate::eq_int("f.grower_id", id),
            None => Predicate::All(Vec::new()),
        };
        self.paged(FARM_COLUMNS, FARM_FROM, &filter, "f.name, f.id", pagination, Farm::from_row)
    }

    /// Farms an applicator has been granted access to
    pub fn list_shared_farms(
        &self,
        applicator_id: i64,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Farm>, i64)> {
        let from = format!(
            "{} JOIN farm_permissions p ON p.farm_id = f.id",
            FARM_FROM
        );
        self.paged(
            FARM_COLUMNS,
            &from,
            &Predicate::eq_int("p.applicator_id", applicator_id),
            "f.name, f.id",
            pagination,
            Farm::from_row,
        )
    }

    /// Deletes the farm; its permissions cascade
    pub fn delete_farm(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn().execute("DELETE FROM farms WHERE id = ?1", [id])
    }

    pub fn insert_farm_permission(
        &self,
        farm_id: i64,
        applicator_id: i64,
        can_view: bool,
        can_edit: bool,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO farm_permissions (farm_id, applicator_id, can_view, can_edit, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
            params![farm_id, applicator_id, can_view, can_edit, now],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn get_farm_permission(&self, id: i64) -> rusqlite::Result<FarmPermission> {
        self.conn().query_row(
            &format!(
                "SELECT {} FROM farm_permissions p JOIN accounts a ON a.id = p.applicator_id \
                 WHERE p.id = ?1",
                PERMISSION_COLUMNS
            ),
            [id],
            FarmPermission::from_row,
        )
    }

    pub fn update_farm_permission(
        &self,
        id: i64,
        can_view: bool,
        can_edit: bool,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<usize> {
        self.conn().execute(
            "UPDATE farm_permissions SET can_view = ?1, can_edit = ?2, updated_at = ?3 WHERE id = ?4",
            params![can_view, can_edit, now, id],
        )
    }

    pub fn delete_farm_permission(&self, id: i64) -> rusqlite::Result<usize> {
        self.conn()
            .execute("DELETE FROM farm_permissions WHERE id = ?1", [id])
    }

    pub fn list_farm_permissions(&self, farm_id: i64) -> rusqlite::Result<Vec<FarmPermission>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {} FROM farm_permissions p JOIN accounts a ON a.id = p.applicator_id \
             WHERE p.farm_id = ?1 ORDER BY p.id",
            PERMISSION_COLUMNS
        ))?;
        let rows = stmt
            .query_map([farm_id], FarmPermission::from_row)?
            .collect();
        rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::actor::Role;
    use crate::core::error::ApiError;
    use crate::store::NewAccount;

    fn account(store: &Store, email: &str, role: Role) -> i64 {
        store
            .insert_account(
                &NewAccount {
                    email: email.to_string(),
                    first_name: "Pat".to_string(),
                    last_name: "Acre".to_string(),
                    business_name: None,
                    phone: None,
                    address: None,
                    role,
                },
                Utc::now(),
            )
            .unwrap()
    }

    fn farm(name: &str) -> NewFarm {
        NewFarm {
            name: name.to_string(),
            state_id: Some(16),
            county: Some("Story".to_string()),
            township: None,
        }
    }

    #[test]
    fn test_farm_joins_state_code() {
        let store = Store::open_in_memory().unwrap();
        let grower = account(&store, "g@x.example", Role::Grower);
        let id = store.insert_farm(grower, &farm("North 40"), Utc::now()).unwrap();

        let stored = store.find_farm(id).unwrap().unwrap();
        assert_eq!(stored.state_code.as_deref(), Some("IA"));
        assert!(store.find_farm(id + 1).unwrap().is_none());
    }

    #[test]
    fn test_permission_errors_map_to_taxonomy() {
        let store = Store::open_in_memory().unwrap();
        let grower = account(&store, "g@x.example", Role::Grower);
        let app = account(&store, "a@x.example", Role::Applicator);
        let farm_id = store.insert_farm(grower, &farm("South"), Utc::now()).unwrap();

        store
            .insert_farm_permission(farm_id, app, true, false, Utc::now())
            .unwrap();
        let dup = store
            .insert_farm_permission(farm_id, app, true, true, Utc::now())
            .unwrap_err();
        assert!(matches!(ApiError::from(dup), ApiError::Conflict(_)));

        let missing = store
            .insert_farm_permission(farm_id, 9999, true, false, Utc::now())
            .unwrap_err();
        assert!(matches!(ApiError::from(missing), ApiError::BadRequest(_)));
    }

    #[test]
    fn test_deleting_farm_cascades_permissions() {
        let store = Store::open_in_memory().unwrap();
        let grower = account(&store, "g@x.example", Role::Grower);
        let app = account(&store, "a@x.example", Role::Applicator);
        let farm_id = store.insert_farm(grower, &farm("East"), Utc::now()).unwrap();
        let perm = store
            .insert_farm_permission(farm_id, app, true, false, Utc::now())
            .unwrap();

        store.delete_farm(farm_id).unwrap();
        assert!(matches!(
            store.get_farm_permission(perm),
            Err(rusqlite::Error::QueryReturnedNoRows)
        ));
    }

    #[test]
    fn test_shared_farms_for_applicator() {
        let store = Store::open_in_memory().unwrap();
        let grower = account(&store, "g@x.example", Role::Grower);
        let app = account(&store, "a@x.example", Role::Applicator);
        let shared = store.insert_farm(grower, &farm("Shared"), Utc::now()).unwrap();
        store.insert_farm(grower, &farm("Private"), Utc::now()).unwrap();
        store
            .insert_farm_permission(shared, app, true, false, Utc::now())
            .unwrap();

        let (farms, total) = store.list_shared_farms(app, Pagination::default()).unwrap();
        assert_eq!(total, 1);
        assert_eq!(farms[0].name, "Shared");
    }
}

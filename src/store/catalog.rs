//! Applicator catalog: equipment, chemicals, products; plus US states

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Row};
use serde::{Deserialize, Serialize};

use super::Store;
use crate::core::filter::Predicate;
use crate::core::pagination::Pagination;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: i64,
    pub applicator_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub equipment_type: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub warranty_expires_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEquipment {
    pub name: String,
    pub equipment_type: String,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub warranty_expires_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Chemical {
    pub id: i64,
    pub applicator_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub chemical_type: String,
    pub registration_number: Option<String>,
    pub manufacturer: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChemical {
    pub name: String,
    pub chemical_type: String,
    pub registration_number: Option<String>,
    pub manufacturer: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub applicator_id: i64,
    pub name: String,
    pub code: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    pub code: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsState {
    pub id: i64,
    pub name: String,
    pub code: String,
}

fn equipment_from_row(row: &Row<'_>) -> rusqlite::Result<Equipment> {
    Ok(Equipment {
        id: row.get("id")?,
        applicator_id: row.get("applicator_id")?,
        name: row.get("name")?,
        equipment_type: row.get("equipment_type")?,
        manufacturer: row.get("manufacturer")?,
        model: row.get("model")?,
        serial_number: row.get("serial_number")?,
        warranty_expires_on: row.get("warranty_expires_on")?,
        created_at: row.get("created_at")?,
    })
}

fn chemical_from_row(row: &Row<'_>) -> rusqlite::Result<Chemical> {
    Ok(Chemical {
        id: row.get("id")?,
        applicator_id: row.get("applicator_id")?,
        name: row.get("name")?,
        chemical_type: row.get("chemical_type")?,
        registration_number: row.get("registration_number")?,
        manufacturer: row.get("manufacturer")?,
        created_at: row.get("created_at")?,
    })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get("id")?,
        applicator_id: row.get("applicator_id")?,
        name: row.get("name")?,
        code: row.get("code")?,
        unit: row.get("unit")?,
        price: row.get("price")?,
        created_at: row.get("created_at")?,
    })
}

fn state_from_row(row: &Row<'_>) -> rusqlite::Result<UsState> {
    Ok(UsState {
        id: row.get("id")?,
        name: row.get("name")?,
        code: row.get("code")?,
    })
}

/// AND an applicator ownership clause with an optional search predicate
fn owned(column: &'static str, applicator_id: i64, filter: Option<Predicate>) -> Predicate {
    let owner = Predicate::eq_int(column, applicator_id);
    match filter {
        Some(extra) => owner.and(extra),
        None => owner,
    }
}

impl Store {
    pub fn insert_equipment(
        &self,
        applicator_id: i64,
        item: &NewEquipment,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO equipment (applicator_id, name, equipment_type, manufacturer, model, \
             serial_number, warranty_expires_on, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                applicator_id,
                item.name.trim(),
                item.equipment_type,
                item.manufacturer,
                item.model,
                item.serial_number,
                item.warranty_expires_on,
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn list_equipment(
        &self,
        applicator_id: i64,
        filter: Option<Predicate>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Equipment>, i64)> {
        self.paged(
            "e.id, e.applicator_id, e.name, e.equipment_type, e.manufacturer, e.model, \
             e.serial_number, e.warranty_expires_on, e.created_at",
            "FROM equipment e",
            &owned("e.applicator_id", applicator_id, filter),
            "e.name, e.id",
            pagination,
            equipment_from_row,
        )
    }

    pub fn insert_chemical(
        &self,
        applicator_id: i64,
        item: &NewChemical,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO chemicals (applicator_id, name, chemical_type, registration_number, \
             manufacturer, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                applicator_id,
                item.name.trim(),
                item.chemical_type,
                item.registration_number,
                item.manufacturer,
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn list_chemicals(
        &self,
        applicator_id: i64,
        filter: Option<Predicate>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Chemical>, i64)> {
        self.paged(
            "c.id, c.applicator_id, c.name, c.chemical_type, c.registration_number, \
             c.manufacturer, c.created_at",
            "FROM chemicals c",
            &owned("c.applicator_id", applicator_id, filter),
            "c.name, c.id",
            pagination,
            chemical_from_row,
        )
    }

    pub fn insert_product(
        &self,
        applicator_id: i64,
        item: &NewProduct,
        now: DateTime<Utc>,
    ) -> rusqlite::Result<i64> {
        self.conn().execute(
            "INSERT INTO products (applicator_id, name, code, unit, price, created_at, updated_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                applicator_id,
                item.name.trim(),
                item.code,
                item.unit,
                item.price,
                now
            ],
        )?;
        Ok(self.conn().last_insert_rowid())
    }

    pub fn list_products(
        &self,
        applicator_id: i64,
        filter: Option<Predicate>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<Product>, i64)> {
        self.paged(
            "p.id, p.applicator_id, p.name, p.code, p.unit, p.price, p.created_at",
            "FROM products p",
            &owned("p.applicator_id", applicator_id, filter),
            "p.name, p.id",
            pagination,
            product_from_row,
        )
    }

    pub fn list_states(
        &self,
        filter: Option<Predicate>,
        pagination: Pagination,
    ) -> rusqlite::Result<(Vec<UsState>, i64)> {
        let filter = filter.unwrap_or(Predicate::All(Vec::new()));
        self.paged(
            "s.id, s.name, s.code",
            "FROM us_states s",
            &filter,
            "s.name",
            pagination,
            state_from_row,
        )
    }
}

//! Applicator catalog and reference data

use chrono::Utc;

use super::{require_role, Services};
use crate::core::actor::{EffectiveActor, Role};
use crate::core::error::{ApiResult, Violations};
use crate::core::filter::{self, registry, SearchOptions};
use crate::core::pagination::Paged;
use crate::store::{Chemical, Equipment, NewChemical, NewEquipment, NewProduct, Product, UsState};

/// Canonicalize an enum-typed input in place, recording a violation if it is not a member
fn canonical_type(
    value: &mut String,
    allowed: &'static [&'static str],
    field: &str,
    violations: &mut Violations,
) {
    match filter::match_enum(allowed, value) {
        Some(canonical) => *value = canonical.to_string(),
        None => violations.check(
            false,
            format!("\"{}\" must be one of [{}]", field, allowed.join(", ")),
        ),
    }
}

impl Services {
    pub fn add_equipment(
        &self,
        actor: &EffectiveActor,
        mut item: NewEquipment,
    ) -> ApiResult<Equipment> {
        require_role(actor, Role::Applicator, "manage equipment")?;
        let mut violations = Violations::new();
        violations.check(!item.name.trim().is_empty(), "\"name\" is required");
        canonical_type(
            &mut item.equipment_type,
            registry::EQUIPMENT_TYPES,
            "type",
            &mut violations,
        );
        violations.finish()?;

        let id = self.store().insert_equipment(actor.id, &item, Utc::now())?;
        tracing::info!(applicator_id = actor.id, equipment_id = id, "equipment added");
        let (rows, _) = self.store().list_equipment(
            actor.id,
            Some(filter::Predicate::eq_int("e.id", id)),
            Default::default(),
        )?;
        rows.into_iter()
            .next()
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    pub fn list_equipment(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Equipment>> {
        require_role(actor, Role::Applicator, "view equipment")?;
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::EQUIPMENT, options)?;
        let (rows, total) = self.store().list_equipment(actor.id, filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    pub fn add_chemical(&self, actor: &EffectiveActor, mut item: NewChemical) -> ApiResult<Chemical> {
        require_role(actor, Role::Applicator, "manage chemicals")?;
        let mut violations = Violations::new();
        violations.check(!item.name.trim().is_empty(), "\"name\" is required");
        canonical_type(
            &mut item.chemical_type,
            registry::CHEMICAL_TYPES,
            "type",
            &mut violations,
        );
        violations.finish()?;

        let id = self.store().insert_chemical(actor.id, &item, Utc::now())?;
        tracing::info!(applicator_id = actor.id, chemical_id = id, "chemical added");
        let (rows, _) = self.store().list_chemicals(
            actor.id,
            Some(filter::Predicate::eq_int("c.id", id)),
            Default::default(),
        )?;
        rows.into_iter()
            .next()
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    pub fn list_chemicals(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Chemical>> {
        require_role(actor, Role::Applicator, "view chemicals")?;
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::CHEMICALS, options)?;
        let (rows, total) = self.store().list_chemicals(actor.id, filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    pub fn add_product(&self, actor: &EffectiveActor, item: NewProduct) -> ApiResult<Product> {
        require_role(actor, Role::Applicator, "manage products")?;
        let mut violations = Violations::new();
        violations.check(!item.name.trim().is_empty(), "\"name\" is required");
        violations.check(
            item.price.map_or(true, |p| p >= 0.0),
            "\"price\" must be greater than or equal to 0",
        );
        violations.finish()?;

        let id = self.store().insert_product(actor.id, &item, Utc::now())?;
        tracing::info!(applicator_id = actor.id, product_id = id, "product added");
        let (rows, _) = self.store().list_products(
            actor.id,
            Some(filter::Predicate::eq_int("p.id", id)),
            Default::default(),
        )?;
        rows.into_iter()
            .next()
            .ok_or_else(|| rusqlite::Error::QueryReturnedNoRows.into())
    }

    pub fn list_products(
        &self,
        actor: &EffectiveActor,
        options: &SearchOptions,
    ) -> ApiResult<Paged<Product>> {
        require_role(actor, Role::Applicator, "view products")?;
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::PRODUCTS, options)?;
        let (rows, total) = self.store().list_products(actor.id, filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }

    /// Reference list; open to every caller
    pub fn list_states(&self, options: &SearchOptions) -> ApiResult<Paged<UsState>> {
        let pagination = self.pagination(options);
        let filter = filter::build(&registry::STATES, options)?;
        let (rows, total) = self.store().list_states(filter, pagination)?;
        Ok(Paged::new(rows, pagination, total))
    }
}

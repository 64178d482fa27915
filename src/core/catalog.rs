//! Catalog business logic - parts, labor types and repuestos.
//!
//! Labor types and repuestos carry the authoritative unit cost that budget lines
//! snapshot. Changing a cost here only affects lines priced afterwards.

use crate::{
    core::{amount, auth::Principal, auth::Role, lifecycle},
    entities::{Category, LaborType, Part, Repuesto, labor_type, part, repuesto},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Reference to a priced catalog row that a budget line can quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum CatalogItem {
    /// A [`labor_type`] row, priced by `cost`
    LaborType(i64),
    /// A [`repuesto`] row, priced by `sale_price`
    Repuesto(i64),
}

/// Fields for a new part
#[derive(Debug, Clone, Deserialize)]
pub struct NewPart {
    /// Unique part code
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Optional category lookup
    pub category_id: Option<i64>,
}

/// Fields for a new repuesto
#[derive(Debug, Clone, Deserialize)]
pub struct NewRepuesto {
    /// Display name
    pub name: String,
    /// Stocked part it is drawn from, if any
    pub part_id: Option<i64>,
    /// Sale price per unit
    pub sale_price: Decimal,
}

fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed.to_string())
}

/// Creates a part. The code must be unique; a category, when given, must be visible.
pub async fn create_part(
    db: &DatabaseConnection,
    actor: &Principal,
    new_part: NewPart,
) -> Result<part::Model> {
    actor.require_staff("create part")?;
    let code = required_text("Part code", &new_part.code)?;
    let name = required_text("Part name", &new_part.name)?;

    let taken = Part::find()
        .filter(part::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::validation(format!("Part code `{code}` already exists")));
    }
    if let Some(category_id) = new_part.category_id {
        lifecycle::find_visible::<Category, _>(db, category_id).await?;
    }

    let now = chrono::Utc::now();
    let model = part::ActiveModel {
        code: Set(code),
        name: Set(name),
        description: Set(new_part.description),
        category_id: Set(new_part.category_id),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(id = model.id, code = %model.code, "part created");
    Ok(model)
}

/// Creates a labor type with its current cost.
pub async fn create_labor_type(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
    cost: Decimal,
) -> Result<labor_type::Model> {
    actor.require_staff("create labor type")?;
    let name = required_text("Labor type name", &name)?;
    amount::ensure_price(cost)?;

    let taken = LaborType::find()
        .filter(labor_type::Column::Name.eq(name.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::validation(format!(
            "Labor type `{name}` already exists"
        )));
    }

    let now = chrono::Utc::now();
    labor_type::ActiveModel {
        name: Set(name),
        cost: Set(cost),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Changes a labor type's cost. Existing budget lines keep their snapshot.
pub async fn update_labor_type_cost(
    db: &DatabaseConnection,
    actor: &Principal,
    labor_type_id: i64,
    cost: Decimal,
) -> Result<labor_type::Model> {
    actor.require(Role::Admin, "change labor cost")?;
    amount::ensure_price(cost)?;

    let current = lifecycle::find_any::<LaborType, _>(db, labor_type_id)
        .await?
        .filter(|model| model.deleted_at.is_none())
        .ok_or_else(|| Error::not_found("labor type", labor_type_id))?;

    let previous = current.cost;
    let mut model: labor_type::ActiveModel = current.into();
    model.cost = Set(cost);
    model.updated_at = Set(chrono::Utc::now());
    let updated = model.update(db).await?;

    info!(labor_type_id, %previous, cost = %updated.cost, actor = actor.id, "labor cost changed");
    Ok(updated)
}

/// Creates a repuesto. A linked part, when given, must be visible.
pub async fn create_repuesto(
    db: &DatabaseConnection,
    actor: &Principal,
    new_repuesto: NewRepuesto,
) -> Result<repuesto::Model> {
    actor.require_staff("create repuesto")?;
    let name = required_text("Repuesto name", &new_repuesto.name)?;
    amount::ensure_price(new_repuesto.sale_price)?;
    if let Some(part_id) = new_repuesto.part_id {
        lifecycle::find_visible::<Part, _>(db, part_id).await?;
    }

    let now = chrono::Utc::now();
    repuesto::ActiveModel {
        name: Set(name),
        part_id: Set(new_repuesto.part_id),
        sale_price: Set(new_repuesto.sale_price),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Changes a repuesto's sale price. Existing budget lines keep their snapshot.
pub async fn update_repuesto_price(
    db: &DatabaseConnection,
    actor: &Principal,
    repuesto_id: i64,
    sale_price: Decimal,
) -> Result<repuesto::Model> {
    actor.require(Role::Admin, "change repuesto price")?;
    amount::ensure_price(sale_price)?;

    let current = lifecycle::find_any::<Repuesto, _>(db, repuesto_id)
        .await?
        .filter(|model| model.deleted_at.is_none())
        .ok_or_else(|| Error::not_found("repuesto", repuesto_id))?;

    let mut model: repuesto::ActiveModel = current.into();
    model.sale_price = Set(sale_price);
    model.updated_at = Set(chrono::Utc::now());
    let updated = model.update(db).await?;

    info!(repuesto_id, price = %updated.sale_price, actor = actor.id, "repuesto price changed");
    Ok(updated)
}

/// Current unit cost of a catalog item, as a budget line would snapshot it.
///
/// Fails with `NotFound` when the row does not exist and with `Validation` when
/// it is inactive or soft-deleted.
pub async fn current_unit_cost<C>(db: &C, item: CatalogItem) -> Result<Decimal>
where
    C: ConnectionTrait,
{
    let (active, cost) = match item {
        CatalogItem::LaborType(id) => {
            let labor = lifecycle::find_any::<LaborType, _>(db, id)
                .await?
                .ok_or_else(|| Error::not_found("labor type", id))?;
            (labor.active && labor.deleted_at.is_none(), labor.cost)
        }
        CatalogItem::Repuesto(id) => {
            let repuesto = lifecycle::find_any::<Repuesto, _>(db, id)
                .await?
                .ok_or_else(|| Error::not_found("repuesto", id))?;
            (repuesto.active && repuesto.deleted_at.is_none(), repuesto.sale_price)
        }
    };

    if !active {
        return Err(Error::validation(format!(
            "Catalog item {item:?} is inactive and cannot be quoted"
        )));
    }
    Ok(cost)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::lifecycle::Lookup, test_utils::*};
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_negative_prices_rejected_before_io() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result =
            create_labor_type(&db, &technician(), "Cleaning".to_string(), money(-100)).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_repuesto(
            &db,
            &technician(),
            NewRepuesto {
                name: "Battery".to_string(),
                part_id: None,
                sale_price: money(-1),
            },
        )
        .await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_prices_outside_money_column_rejected_before_io() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();
        let huge = Decimal::from_i128_with_scale(10_i128.pow(28), 0);

        for cost in [huge, Decimal::new(105, 3), money(1_000_000_000_000)] {
            let err = create_labor_type(&db, &technician(), "Cleaning".to_string(), cost)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{cost} accepted");

            let err = update_repuesto_price(&db, &admin(), 1, cost)
                .await
                .unwrap_err();
            assert!(matches!(err, Error::Validation { .. }), "{cost} accepted");
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_cost_changes_require_admin() -> Result<()> {
        let db = setup_test_db().await?;
        let labor = create_test_labor_type(&db, "Cleaning", money(1500)).await?;

        let err = update_labor_type_cost(&db, &technician(), labor.id, money(2000))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        let updated = update_labor_type_cost(&db, &admin(), labor.id, money(2000)).await?;
        assert_eq!(updated.cost, money(2000));
        Ok(())
    }

    #[tokio::test]
    async fn test_part_codes_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_part(&db, "LCD-01").await?;

        let err = create_part(
            &db,
            &technician(),
            NewPart {
                code: "LCD-01".to_string(),
                name: "Another screen".to_string(),
                description: None,
                category_id: None,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_current_unit_cost_refuses_inactive_items() -> Result<()> {
        let db = setup_test_db().await?;
        let repuesto = create_test_repuesto(&db, "Battery", money(3250)).await?;

        let cost = current_unit_cost(&db, CatalogItem::Repuesto(repuesto.id)).await?;
        assert_eq!(cost, money(3250));

        lifecycle::toggle_active::<Repuesto, _>(&db, &technician(), repuesto.id, Lookup::VisibleOnly)
            .await?;
        let err = current_unit_cost(&db, CatalogItem::Repuesto(repuesto.id))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = current_unit_cost(&db, CatalogItem::LaborType(77))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 77, .. }));
        Ok(())
    }
}

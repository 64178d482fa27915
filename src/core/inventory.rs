//! Stock ledger - inventory records and the signed-delta stock movement path.
//!
//! `quantity` changes through [`adjust_stock`], a single conditional UPDATE, so
//! two concurrent movements on the same record cannot lose one another and the
//! quantity stays within `0..=i32::MAX`. [`correct_stock`] is the administrative
//! overwrite, reserved for fixing counts by hand.

use crate::{
    core::{
        auth::{Principal, Role},
        lifecycle::{self, paginate},
        pagination::{Page, PageRequest},
    },
    entities::{Inventory, Part, inventory},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// Fields for a new inventory record
#[derive(Debug, Clone, Deserialize)]
pub struct NewInventory {
    /// Part being stocked
    pub part_id: i64,
    /// Opening quantity
    pub quantity: i32,
    /// Low-stock threshold
    pub minimum_threshold: i32,
    /// Where the units are kept
    pub location: String,
}

/// Snapshot of a record's stock position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockLevel {
    /// Units on hand
    pub quantity: i32,
    /// Low-stock threshold
    pub minimum_threshold: i32,
    /// `quantity <= minimum_threshold`
    pub is_low_stock: bool,
}

impl From<&inventory::Model> for StockLevel {
    fn from(record: &inventory::Model) -> Self {
        Self {
            quantity: record.quantity,
            minimum_threshold: record.minimum_threshold,
            is_low_stock: record.is_low_stock(),
        }
    }
}

/// Creates an inventory record for an active part at one location.
///
/// # Errors
/// `Validation` when a count is negative, the location is blank, the part is
/// missing or inactive, or the part already has a record at that location.
pub async fn create_inventory(
    db: &DatabaseConnection,
    actor: &Principal,
    new_record: NewInventory,
) -> Result<inventory::Model> {
    actor.require_staff("create inventory record")?;

    if new_record.quantity < 0 {
        return Err(Error::validation(format!(
            "Quantity cannot be negative, got {}",
            new_record.quantity
        )));
    }
    if new_record.minimum_threshold < 0 {
        return Err(Error::validation(format!(
            "Minimum threshold cannot be negative, got {}",
            new_record.minimum_threshold
        )));
    }
    let location = new_record.location.trim().to_string();
    if location.is_empty() {
        return Err(Error::validation("Location cannot be empty"));
    }

    let part_is_live = lifecycle::find_any::<Part, _>(db, new_record.part_id)
        .await?
        .is_some_and(|part| part.active && part.deleted_at.is_none());
    if !part_is_live {
        return Err(Error::validation(format!(
            "Part {} does not exist or is inactive",
            new_record.part_id
        )));
    }

    let existing = Inventory::find()
        .filter(inventory::Column::PartId.eq(new_record.part_id))
        .filter(inventory::Column::Location.eq(location.as_str()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::validation(format!(
            "Part {} already has an inventory record at `{location}`",
            new_record.part_id
        )));
    }

    let now = chrono::Utc::now();
    let record = inventory::ActiveModel {
        part_id: Set(new_record.part_id),
        quantity: Set(new_record.quantity),
        minimum_threshold: Set(new_record.minimum_threshold),
        location: Set(location),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = record.id, part_id = record.part_id, quantity = record.quantity, "inventory record created");
    Ok(record)
}

/// Applies a signed stock movement and returns the updated record.
///
/// Uses one conditional statement,
/// `UPDATE inventory SET quantity = quantity + delta WHERE id = ? AND quantity >= -delta`,
/// so concurrent movements serialize on the row instead of overwriting each other.
///
/// # Errors
/// * `Validation` for a zero delta
/// * `NotFound` when the record does not exist or is not active
/// * `InsufficientStock` when the movement would go below zero; the quantity is left unchanged
/// * `Validation` when the movement would push the quantity past `i32::MAX`
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn adjust_stock(
    db: &DatabaseConnection,
    actor: &Principal,
    inventory_id: i64,
    delta: i32,
) -> Result<inventory::Model> {
    actor.require_staff("adjust stock")?;
    if delta == 0 {
        return Err(Error::validation("Stock delta cannot be zero"));
    }

    let txn = db.begin().await?;
    let record = adjust_stock_in(&txn, inventory_id, delta).await?;
    txn.commit().await?;

    if record.is_low_stock() {
        warn!(
            inventory_id,
            quantity = record.quantity,
            minimum = record.minimum_threshold,
            "inventory at or below minimum threshold"
        );
    }
    Ok(record)
}

/// [`adjust_stock`] on an existing connection or transaction, without role checks.
pub async fn adjust_stock_in<C>(db: &C, inventory_id: i64, delta: i32) -> Result<inventory::Model>
where
    C: ConnectionTrait,
{
    // Both bounds are checked inside the UPDATE itself
    let headroom = if delta > 0 {
        inventory::Column::Quantity.lte(i64::from(i32::MAX) - i64::from(delta))
    } else {
        inventory::Column::Quantity.gte(-i64::from(delta))
    };
    let result = Inventory::update_many()
        .col_expr(
            inventory::Column::Quantity,
            Expr::col(inventory::Column::Quantity).add(delta),
        )
        .col_expr(inventory::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(inventory::Column::Id.eq(inventory_id))
        .filter(inventory::Column::Active.eq(true))
        .filter(headroom)
        .exec(db)
        .await?;

    let record = lifecycle::find_visible::<Inventory, _>(db, inventory_id).await?;
    if result.rows_affected == 0 && delta > 0 {
        return Err(Error::validation(format!(
            "Adding {delta} to inventory {inventory_id} would exceed {} units",
            i32::MAX
        )));
    }
    if result.rows_affected == 0 {
        return Err(Error::InsufficientStock {
            inventory_id,
            available: record.quantity,
            delta,
        });
    }

    info!(inventory_id, delta, quantity = record.quantity, "stock adjusted");
    Ok(record)
}

/// Overwrites the quantity on hand. Admin only; bypasses delta bookkeeping.
pub async fn correct_stock(
    db: &DatabaseConnection,
    actor: &Principal,
    inventory_id: i64,
    quantity: i32,
) -> Result<inventory::Model> {
    actor.require(Role::Admin, "correct stock")?;
    if quantity < 0 {
        return Err(Error::validation(format!(
            "Quantity cannot be negative, got {quantity}"
        )));
    }

    let current = lifecycle::find_visible::<Inventory, _>(db, inventory_id).await?;
    let previous = current.quantity;
    let mut record: inventory::ActiveModel = current.into();
    record.quantity = Set(quantity);
    record.updated_at = Set(chrono::Utc::now());
    let updated = record.update(db).await?;

    warn!(inventory_id, previous, quantity, actor = actor.id, "stock corrected by hand");
    Ok(updated)
}

/// Changes the threshold and/or location of a record. Quantity is untouched.
pub async fn update_inventory_settings(
    db: &DatabaseConnection,
    actor: &Principal,
    inventory_id: i64,
    minimum_threshold: Option<i32>,
    location: Option<String>,
) -> Result<inventory::Model> {
    actor.require_staff("update inventory settings")?;

    let current = lifecycle::find_visible::<Inventory, _>(db, inventory_id).await?;
    let mut record: inventory::ActiveModel = current.into();

    if let Some(threshold) = minimum_threshold {
        if threshold < 0 {
            return Err(Error::validation(format!(
                "Minimum threshold cannot be negative, got {threshold}"
            )));
        }
        record.minimum_threshold = Set(threshold);
    }
    if let Some(location) = location {
        let location = location.trim().to_string();
        if location.is_empty() {
            return Err(Error::validation("Location cannot be empty"));
        }
        record.location = Set(location);
    }
    record.updated_at = Set(chrono::Utc::now());

    record.update(db).await.map_err(Into::into)
}

/// Current stock position of a visible record. No side effects.
pub async fn check_stock(db: &DatabaseConnection, inventory_id: i64) -> Result<StockLevel> {
    let record = lifecycle::find_visible::<Inventory, _>(db, inventory_id).await?;
    Ok(StockLevel::from(&record))
}

/// Active records at or below their minimum threshold, lowest quantity first.
pub async fn list_low_stock(
    db: &DatabaseConnection,
    request: &PageRequest,
) -> Result<Page<inventory::Model>> {
    let query = Inventory::find()
        .filter(inventory::Column::Active.eq(true))
        .filter(
            Expr::col(inventory::Column::Quantity)
                .lte(Expr::col(inventory::Column::MinimumThreshold)),
        )
        .order_by_asc(inventory::Column::Quantity)
        .order_by_asc(inventory::Column::Id);

    paginate(db, query, request).await
}

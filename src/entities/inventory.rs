//! Inventory entity - quantity on hand of one part at one location.
//!
//! `quantity` is never overwritten from client input; it moves through the signed
//! delta path in `core::inventory` so concurrent movements cannot lose updates.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inventory record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Part being stocked
    pub part_id: i64,
    /// Units on hand, never negative
    pub quantity: i32,
    /// At or below this level the record is low on stock
    pub minimum_threshold: i32,
    /// Shelf, drawer or store the units sit in
    pub location: String,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// True when the quantity on hand is at or below the minimum threshold
    #[must_use]
    pub const fn is_low_stock(&self) -> bool {
        self.quantity <= self.minimum_threshold
    }
}

/// Defines relationships between Inventory and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each record stocks one part
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Part entity - physical components tracked in inventory.
//!
//! Stock levels live in [`super::inventory`], one record per part per location.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Part database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Supplier or internal part code
    #[sea_orm(unique)]
    pub code: String,
    /// Display name
    pub name: String,
    /// Optional longer description
    pub description: Option<String>,
    /// Category lookup
    pub category_id: Option<i64>,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the part was created
    pub created_at: DateTimeUtc,
    /// When the part was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Part and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One part has stock at many locations
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventory,
    /// Each part may belong to a category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventory.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

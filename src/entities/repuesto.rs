//! Repuesto entity - a replacement part as sold to clients, with its sale price.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Repuesto (part sale item) database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "repuestos")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Stocked part this sale item draws from, if tracked
    pub part_id: Option<i64>,
    /// Current sale price per unit
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub sale_price: Decimal,
    pub active: bool,
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::part::Entity",
        from = "Column::PartId",
        to = "super::part::Column::Id"
    )]
    Part,
    #[sea_orm(has_many = "super::budget_part_line::Entity")]
    BudgetPartLines,
}

impl Related<super::part::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Part.def()
    }
}

impl Related<super::budget_part_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetPartLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

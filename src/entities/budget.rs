//! Budget entity - a quote ("presupuesto") for a service order.
//!
//! `total` is server-computed from the active labor and part lines and is only
//! written by `core::budget`. `version` is bumped on every recomputation and
//! guards the write against concurrent writers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budgets")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Service order being quoted
    pub order_id: i64,
    /// Free-form note shown on the printed quote
    pub description: String,
    /// Sum of the active lines' totals
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub total: Decimal,
    /// Optimistic concurrency token
    pub version: i32,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the budget was created
    pub created_at: DateTimeUtc,
    /// When the budget was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Budget and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each budget quotes one service order
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::OrderId",
        to = "super::service_order::Column::Id"
    )]
    ServiceOrder,
    /// One budget has many labor lines
    #[sea_orm(has_many = "super::budget_labor_line::Entity")]
    LaborLines,
    /// One budget has many part lines
    #[sea_orm(has_many = "super::budget_part_line::Entity")]
    PartLines,
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrder.def()
    }
}

impl Related<super::budget_labor_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LaborLines.def()
    }
}

impl Related<super::budget_part_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PartLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Budget labor line entity - quantity of one labor type quoted on a budget.
//!
//! `unit_cost_snapshot` is copied from the labor type when the line is created and
//! only re-copied when the line is pointed at a different labor type.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget labor line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_labor_lines")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning budget
    pub budget_id: i64,
    /// Labor type being quoted
    pub labor_type_id: i64,
    /// Units of labor, always positive
    pub quantity: i32,
    /// Labor type cost at the time the line was priced
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost_snapshot: Decimal,
    /// `quantity * unit_cost_snapshot`
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub line_total: Decimal,
    /// Counts toward the budget total when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the line was added
    pub created_at: DateTimeUtc,
    /// When the line was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between BudgetLaborLine and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line belongs to one budget
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    /// Each line quotes one labor type
    #[sea_orm(
        belongs_to = "super::labor_type::Entity",
        from = "Column::LaborTypeId",
        to = "super::labor_type::Column::Id"
    )]
    LaborType,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::labor_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LaborType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

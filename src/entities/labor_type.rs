//! Labor type entity - a billable kind of bench work with its current cost.
//!
//! Budget labor lines snapshot `cost` when they are created; later changes here
//! do not reach existing lines.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Labor type database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "labor_types")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, e.g. "Screen replacement"
    #[sea_orm(unique)]
    pub name: String,
    /// Current unit cost
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub cost: Decimal,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the labor type was created
    pub created_at: DateTimeUtc,
    /// When the labor type was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between LaborType and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One labor type is quoted on many budget lines
    #[sea_orm(has_many = "super::budget_labor_line::Entity")]
    BudgetLaborLines,
}

impl Related<super::budget_labor_line::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BudgetLaborLines.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

//! Budget part line entity - quantity of one repuesto quoted on a budget.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Budget part line database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "budget_part_lines")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub budget_id: i64,
    /// Repuesto being quoted
    pub repuesto_id: i64,
    pub quantity: i32,
    /// Repuesto sale price at the time the line was priced
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub unit_cost_snapshot: Decimal,
    #[sea_orm(column_type = "Decimal(Some((12, 2)))")]
    pub line_total: Decimal,
    pub active: bool,
    pub deleted_at: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::budget::Entity",
        from = "Column::BudgetId",
        to = "super::budget::Column::Id"
    )]
    Budget,
    #[sea_orm(
        belongs_to = "super::repuesto::Entity",
        from = "Column::RepuestoId",
        to = "super::repuesto::Column::Id"
    )]
    Repuesto,
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budget.def()
    }
}

impl Related<super::repuesto::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Repuesto.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

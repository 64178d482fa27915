//! Brand entity - Device brand lookup (e.g. "Samsung", "Lenovo").
//!
//! Lookup rows carry no invariant beyond the shared lifecycle.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Brand database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "brands")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across the table
    #[sea_orm(unique)]
    pub name: String,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last modified
    pub updated_at: DateTimeUtc,
}

/// Lookups have no outgoing relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

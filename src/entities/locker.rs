//! Locker entity - a physical casillero that stores a client's device.
//!
//! `occupancy` is stored as text and read through [`OccupancyState`]. The pair
//! (`occupancy`, `order_id`) is only written by `core::locker`, and always together:
//! a locker is occupied exactly when it references an order.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Occupancy of a locker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyState {
    /// Empty and assignable
    Available,
    /// Holding the device of one service order
    Occupied,
}

impl OccupancyState {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Occupied => "occupied",
        }
    }
}

impl fmt::Display for OccupancyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OccupancyState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "available" => Ok(Self::Available),
            "occupied" => Ok(Self::Occupied),
            other => Err(format!("unknown occupancy state `{other}`")),
        }
    }
}

/// Locker database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "lockers")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-chosen code painted on the door, e.g. "A1"
    #[sea_orm(unique)]
    pub code: String,
    /// Where the locker is or what fits in it
    pub description: String,
    /// Stored [`OccupancyState`]
    pub occupancy: String,
    /// Order whose device is inside; a lookup reference, not ownership
    #[sea_orm(unique)]
    pub order_id: Option<i64>,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the locker was registered
    pub created_at: DateTimeUtc,
    /// When the locker was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Parsed occupancy. A locker holding an order always reads as occupied,
    /// and an unreadable stored value reads as occupied so it is never handed out.
    #[must_use]
    pub fn occupancy_state(&self) -> OccupancyState {
        if self.order_id.is_some() {
            return OccupancyState::Occupied;
        }
        self.occupancy.parse().unwrap_or_else(|err| {
            warn!(locker_id = self.id, %err, "unreadable locker occupancy");
            OccupancyState::Occupied
        })
    }

    /// True when the locker holds an order
    #[must_use]
    pub fn is_occupied(&self) -> bool {
        self.occupancy_state() == OccupancyState::Occupied
    }
}

/// Defines relationships between Locker and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A locker may reference the service order it stores
    #[sea_orm(
        belongs_to = "super::service_order::Entity",
        from = "Column::OrderId",
        to = "super::service_order::Column::Id"
    )]
    ServiceOrder,
}

impl Related<super::service_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    fn locker(occupancy: &str, order_id: Option<i64>) -> Model {
        let now = chrono::Utc::now();
        Model {
            id: 1,
            code: "A1".to_string(),
            description: String::new(),
            occupancy: occupancy.to_string(),
            order_id,
            active: true,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_occupancy_state() {
        assert_eq!(locker("available", None).occupancy_state(), OccupancyState::Available);
        assert_eq!(locker("occupied", Some(7)).occupancy_state(), OccupancyState::Occupied);
        assert_eq!(locker("available", Some(7)).occupancy_state(), OccupancyState::Occupied);
    }

    #[test]
    fn test_unreadable_occupancy_is_not_assignable() {
        let corrupt = locker("availble", None);
        assert_eq!(corrupt.occupancy_state(), OccupancyState::Occupied);
        assert!(corrupt.is_occupied());
        assert!(locker("", None).is_occupied());
    }
}

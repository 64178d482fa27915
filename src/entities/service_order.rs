//! Service order entity - one device brought in for repair.
//!
//! The order's `status` is stored as text and read through [`OrderStatus`].
//! Lockers and budgets reference orders; an order never owns a locker.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// Workflow status of a service order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Device checked in, nobody working on it yet
    Received,
    /// A technician is working on the device
    InProgress,
    /// Repair finished, waiting for pickup
    Ready,
    /// Device handed back; terminal
    Closed,
}

impl OrderStatus {
    /// Storage representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::InProgress => "in_progress",
            Self::Ready => "ready",
            Self::Closed => "closed",
        }
    }

    /// Status that follows this one in the regular workflow
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Received => Some(Self::InProgress),
            Self::InProgress => Some(Self::Ready),
            Self::Ready => Some(Self::Closed),
            Self::Closed => None,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "in_progress" => Ok(Self::InProgress),
            "ready" => Ok(Self::Ready),
            "closed" => Ok(Self::Closed),
            other => Err(format!("unknown order status `{other}`")),
        }
    }
}

/// Service order database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_orders")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-facing order code printed on the claim ticket
    #[sea_orm(unique)]
    pub code: String,
    /// Client that owns the device
    pub client_id: i64,
    /// Technician in charge, once assigned
    pub technician_id: Option<i64>,
    /// Equipment type lookup
    pub equipment_type_id: Option<i64>,
    /// Brand lookup
    pub brand_id: Option<i64>,
    /// Free-form description of the device (model, serial, accessories)
    pub device_description: String,
    /// Problem as reported by the client
    pub reported_issue: String,
    /// Stored [`OrderStatus`]
    pub status: String,
    /// When the order was closed
    pub closed_at: Option<DateTimeUtc>,
    /// Visible by default when true
    pub active: bool,
    /// Soft delete timestamp (None = live)
    pub deleted_at: Option<DateTimeUtc>,
    /// When the order was opened
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

impl Model {
    /// Parsed workflow status. An unreadable stored value reads as `Closed`, so
    /// the order refuses further workflow changes until it is repaired.
    #[must_use]
    pub fn order_status(&self) -> OrderStatus {
        self.status.parse().unwrap_or_else(|err| {
            warn!(order_id = self.id, %err, "unreadable order status");
            OrderStatus::Closed
        })
    }
}

/// Defines relationships between ServiceOrder and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one client
    #[sea_orm(
        belongs_to = "super::client::Entity",
        from = "Column::ClientId",
        to = "super::client::Column::Id"
    )]
    Client,
    /// Each order may be assigned to one technician
    #[sea_orm(
        belongs_to = "super::technician::Entity",
        from = "Column::TechnicianId",
        to = "super::technician::Column::Id"
    )]
    Technician,
    /// One order may have many budgets
    #[sea_orm(has_many = "super::budget::Entity")]
    Budgets,
}

impl Related<super::client::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Client.def()
    }
}

impl Related<super::technician::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Technician.def()
    }
}

impl Related<super::budget::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Budgets.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

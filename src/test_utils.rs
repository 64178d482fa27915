//! Shared test utilities for the repair back office.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        auth::{Principal, Role},
        budget,
        catalog::{self, NewPart, NewRepuesto},
        client::{self, NewClient},
        inventory::{self, NewInventory},
        locker,
        order::{self, NewOrder},
    },
    entities,
    errors::Result,
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Admin principal
#[must_use]
pub const fn admin() -> Principal {
    Principal::new(1, Role::Admin)
}

/// Technician principal
#[must_use]
pub const fn technician() -> Principal {
    Principal::new(2, Role::Technician)
}

/// Client principal, not tied to any stored client
#[must_use]
pub const fn client_principal() -> Principal {
    Principal::new(3, Role::Client)
}

/// Money amount from cents: `money(1500)` is 15.00
#[must_use]
pub fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Creates a test part with the given code and no category.
pub async fn create_test_part(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::part::Model> {
    catalog::create_part(
        db,
        &technician(),
        NewPart {
            code: code.to_string(),
            name: format!("Part {code}"),
            description: None,
            category_id: None,
        },
    )
    .await
}

/// Creates a test inventory record.
///
/// # Defaults
/// * `location`: `"Shelf A"`
pub async fn create_test_inventory(
    db: &DatabaseConnection,
    part_id: i64,
    quantity: i32,
    minimum_threshold: i32,
) -> Result<entities::inventory::Model> {
    inventory::create_inventory(
        db,
        &technician(),
        NewInventory {
            part_id,
            quantity,
            minimum_threshold,
            location: "Shelf A".to_string(),
        },
    )
    .await
}

/// Sets up a test environment with one part stocked at one location.
/// Returns (db, inventory record).
pub async fn setup_with_inventory(
    quantity: i32,
    minimum_threshold: i32,
) -> Result<(DatabaseConnection, entities::inventory::Model)> {
    let db = setup_test_db().await?;
    let part = create_test_part(&db, "TEST-PART").await?;
    let record = create_test_inventory(&db, part.id, quantity, minimum_threshold).await?;
    Ok((db, record))
}

/// Creates a test labor type.
pub async fn create_test_labor_type(
    db: &DatabaseConnection,
    name: &str,
    cost: Decimal,
) -> Result<entities::labor_type::Model> {
    catalog::create_labor_type(db, &technician(), name.to_string(), cost).await
}

/// Creates a test repuesto not linked to any part.
pub async fn create_test_repuesto(
    db: &DatabaseConnection,
    name: &str,
    sale_price: Decimal,
) -> Result<entities::repuesto::Model> {
    catalog::create_repuesto(
        db,
        &technician(),
        NewRepuesto {
            name: name.to_string(),
            part_id: None,
            sale_price,
        },
    )
    .await
}

/// Creates a test client without contact details.
pub async fn create_test_client(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::client::Model> {
    client::create_client(
        db,
        &technician(),
        NewClient {
            name: name.to_string(),
            phone: None,
            email: None,
        },
    )
    .await
}

/// Creates a test service order for a fresh client.
pub async fn create_test_order(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::service_order::Model> {
    let owner = create_test_client(db, &format!("Owner of {code}")).await?;
    order::create_order(
        db,
        &technician(),
        NewOrder {
            code: code.to_string(),
            client_id: owner.id,
            equipment_type_id: None,
            brand_id: None,
            device_description: "Test device".to_string(),
            reported_issue: "Does not power on".to_string(),
        },
    )
    .await
}

/// Creates an empty test locker.
pub async fn create_test_locker(
    db: &DatabaseConnection,
    code: &str,
) -> Result<entities::locker::Model> {
    locker::create_locker(db, &technician(), code.to_string(), String::new()).await
}

/// Sets up a test environment with an order and an empty budget for it.
/// Returns (db, budget).
pub async fn setup_with_budget() -> Result<(DatabaseConnection, entities::budget::Model)> {
    let db = setup_test_db().await?;
    let order = create_test_order(&db, "OS-TEST").await?;
    let budget =
        budget::create_budget(&db, &technician(), order.id, "Test budget".to_string()).await?;
    Ok((db, budget))
}

//! Database configuration module for the repair back office.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs. Creation is idempotent and safe to run on every start.

use crate::config::constants::DEFAULT_DATABASE_URL;
use crate::entities::{
    ActivityType, Brand, Budget, BudgetLaborLine, BudgetPartLine, Category, Client, EquipmentType,
    Inventory, InventoryColumn, LaborType, Locker, Part, Repuesto, ServiceOrder, Technician,
};
use crate::errors::{Error, Result};
use sea_orm::{
    ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema, sea_query::Index,
};
use std::path::Path;
use tracing::{debug, info};

/// Gets the database URL from environment variable or returns the default `SQLite` path.
///
/// This function looks for `DATABASE_URL` in the environment and falls back to
/// a local `SQLite` file, created on first use.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or(rest);
    if let Some(parent) = Path::new(file)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent).map_err(|e| Error::Config {
            message: format!("Failed to create {}: {e}", parent.display()),
        })?;
    }
    Ok(())
}

/// Establishes a connection to the database named by [`get_database_url`].
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    ensure_sqlite_dir(&database_url)?;
    debug!(%database_url, "connecting to database");
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<C, E>(db: &C, entity: E) -> Result<()>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table (parents before children) and the composite indexes.
pub async fn create_tables<C>(db: &C) -> Result<()>
where
    C: ConnectionTrait,
{
    // Lookups and catalog
    create_table(db, Brand).await?;
    create_table(db, Category).await?;
    create_table(db, EquipmentType).await?;
    create_table(db, ActivityType).await?;
    create_table(db, Part).await?;
    create_table(db, Inventory).await?;
    create_table(db, LaborType).await?;
    create_table(db, Repuesto).await?;

    // People and orders
    create_table(db, Client).await?;
    create_table(db, Technician).await?;
    create_table(db, ServiceOrder).await?;
    create_table(db, Locker).await?;

    // Budgets
    create_table(db, Budget).await?;
    create_table(db, BudgetLaborLine).await?;
    create_table(db, BudgetPartLine).await?;

    let builder = db.get_database_backend();
    let part_location = Index::create()
        .name("idx_inventory_part_location")
        .table(Inventory)
        .col(InventoryColumn::PartId)
        .col(InventoryColumn::Location)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(builder.build(&part_location)).await?;

    info!("database schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{BudgetModel, InventoryModel, LockerModel, ServiceOrderModel};
    use sea_orm::QuerySelect;

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<InventoryModel> = Inventory::find().limit(1).all(&db).await?;
        let _: Vec<LockerModel> = Locker::find().limit(1).all(&db).await?;
        let _: Vec<ServiceOrderModel> = ServiceOrder::find().limit(1).all(&db).await?;
        let _: Vec<BudgetModel> = Budget::find().limit(1).all(&db).await?;
        Ok(())
    }

    #[test]
    fn test_ensure_sqlite_dir_ignores_other_urls() -> Result<()> {
        ensure_sqlite_dir("sqlite::memory:")?;
        ensure_sqlite_dir("postgres://localhost/shop")?;
        ensure_sqlite_dir("sqlite://shop.sqlite?mode=rwc")?;
        Ok(())
    }

    #[tokio::test]
    async fn test_create_tables_is_idempotent() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;
        create_tables(&db).await?;

        let _: Vec<LockerModel> = Locker::find().limit(1).all(&db).await?;
        Ok(())
    }
}

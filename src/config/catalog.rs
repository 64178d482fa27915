//! Seed catalog loading from catalog.toml
//!
//! The catalog file lists the labor types, lookup names and lockers a fresh shop
//! starts with. [`seed_catalog`] creates whatever is missing and leaves existing
//! rows untouched, so it runs on every start.

use crate::{
    config::constants::{DEFAULT_CATALOG_PATH, SEED_PRINCIPAL_ID},
    core::{
        auth::{Principal, Role},
        catalog, locker, lookup,
    },
    entities::{LaborType, labor_type},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire catalog.toml file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    /// Labor types with their starting cost
    #[serde(default)]
    pub labor_types: Vec<LaborTypeConfig>,
    /// Brand names
    #[serde(default)]
    pub brands: Vec<String>,
    /// Part category names
    #[serde(default)]
    pub categories: Vec<String>,
    /// Equipment type names
    #[serde(default)]
    pub equipment_types: Vec<String>,
    /// Activity type names
    #[serde(default)]
    pub activity_types: Vec<String>,
    /// Physical lockers
    #[serde(default)]
    pub lockers: Vec<LockerConfig>,
}

/// Configuration for a single labor type
#[derive(Debug, Deserialize, Clone)]
pub struct LaborTypeConfig {
    /// Unique name
    pub name: String,
    /// Cost per unit, e.g. `"15.00"`
    pub cost: Decimal,
}

/// Configuration for a single locker
#[derive(Debug, Deserialize, Clone)]
pub struct LockerConfig {
    /// Code painted on the door
    pub code: String,
    /// Optional description
    #[serde(default)]
    pub description: String,
}

/// What a seeding pass did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    /// Rows created
    pub created: usize,
    /// Rows already present
    pub skipped: usize,
}

impl SeedReport {
    fn record(&mut self, created: bool) {
        if created {
            self.created += 1;
        } else {
            self.skipped += 1;
        }
    }
}

/// Loads the seed catalog from a TOML file
///
/// # Errors
/// Returns `Config` if the file cannot be read or is not a valid catalog.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let path = path.as_ref();
    debug!(?path, "loading catalog");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {}: {e}", path.display()),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {}: {e}", path.display()),
    })
}

/// Path named by `CATALOG_PATH`, or `catalog.toml`
#[must_use]
pub fn catalog_path() -> String {
    std::env::var("CATALOG_PATH").unwrap_or_else(|_| DEFAULT_CATALOG_PATH.to_string())
}

/// Creates every catalog entry that does not exist yet.
pub async fn seed_catalog(db: &DatabaseConnection, config: &CatalogConfig) -> Result<SeedReport> {
    let seeder = Principal::new(SEED_PRINCIPAL_ID, Role::Admin);
    let mut report = SeedReport::default();

    for labor in &config.labor_types {
        let exists = LaborType::find()
            .filter(labor_type::Column::Name.eq(labor.name.trim()))
            .one(db)
            .await?
            .is_some();
        if !exists {
            catalog::create_labor_type(db, &seeder, labor.name.clone(), labor.cost).await?;
        }
        report.record(!exists);
    }

    for name in &config.brands {
        let exists = lookup::find_brand_by_name(db, name.trim()).await?.is_some();
        if !exists {
            lookup::create_brand(db, &seeder, name.clone()).await?;
        }
        report.record(!exists);
    }
    for name in &config.categories {
        let exists = lookup::find_category_by_name(db, name.trim()).await?.is_some();
        if !exists {
            lookup::create_category(db, &seeder, name.clone()).await?;
        }
        report.record(!exists);
    }
    for name in &config.equipment_types {
        let exists = lookup::find_equipment_type_by_name(db, name.trim())
            .await?
            .is_some();
        if !exists {
            lookup::create_equipment_type(db, &seeder, name.clone()).await?;
        }
        report.record(!exists);
    }
    for name in &config.activity_types {
        let exists = lookup::find_activity_type_by_name(db, name.trim())
            .await?
            .is_some();
        if !exists {
            lookup::create_activity_type(db, &seeder, name.clone()).await?;
        }
        report.record(!exists);
    }

    for entry in &config.lockers {
        let exists = locker::find_locker_by_code(db, entry.code.trim())
            .await?
            .is_some();
        if !exists {
            locker::create_locker(db, &seeder, entry.code.clone(), entry.description.clone())
                .await?;
        }
        report.record(!exists);
    }

    info!(created = report.created, skipped = report.skipped, "catalog seeded");
    Ok(report)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::{money, setup_test_db};

    const SAMPLE: &str = r#"
        brands = ["Acme", "Globex"]
        equipment_types = ["Laptop", "Phone"]
        activity_types = ["Diagnosis"]

        [[labor_types]]
        name = "Cleaning"
        cost = "15.00"

        [[labor_types]]
        name = "Screen replacement"
        cost = 45.5

        [[lockers]]
        code = "A1"
        description = "Top row, left"

        [[lockers]]
        code = "A2"
    "#;

    #[test]
    fn test_parse_catalog_config() {
        let config: CatalogConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.brands, vec!["Acme", "Globex"]);
        assert!(config.categories.is_empty());
        assert_eq!(config.labor_types.len(), 2);
        assert_eq!(config.labor_types[0].cost, money(1500));
        assert_eq!(config.labor_types[1].cost, money(4550));
        assert_eq!(config.lockers[1].description, "");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = load_config("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[tokio::test]
    async fn test_seeding_is_idempotent() -> Result<()> {
        let db = setup_test_db().await?;
        let config: CatalogConfig = toml::from_str(SAMPLE).unwrap();

        let first = seed_catalog(&db, &config).await?;
        assert_eq!(first, SeedReport { created: 9, skipped: 0 });

        let second = seed_catalog(&db, &config).await?;
        assert_eq!(second, SeedReport { created: 0, skipped: 9 });

        assert_eq!(locker::list_available(&db).await?.len(), 2);
        Ok(())
    }
}

//! Application-wide constants
//!
//! Centralized location for magic values to improve maintainability.

// =============================================================================
// Pagination
// =============================================================================

/// Default number of items per page
pub const DEFAULT_PAGE_SIZE: u64 = 20;

/// Maximum allowed items per page to prevent excessive queries
pub const MAX_PAGE_SIZE: u64 = 100;

/// Default starting page number (1-indexed)
pub const DEFAULT_PAGE_NUMBER: u64 = 1;

// =============================================================================
// Environment
// =============================================================================

/// Store used when `DATABASE_URL` is not set
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/repair_backoffice.sqlite?mode=rwc";

/// Seed catalog read when `CATALOG_PATH` is not set
pub const DEFAULT_CATALOG_PATH: &str = "catalog.toml";

// =============================================================================
// Seeding
// =============================================================================

/// Principal id recorded for rows created by the startup seed
pub const SEED_PRINCIPAL_ID: i64 = 0;

// =============================================================================
// Money
// =============================================================================

/// Decimal places stored for money columns, `Decimal(12, 2)`
pub const MONEY_SCALE: u32 = 2;

/// Digits left of the decimal point for money columns, `Decimal(12, 2)`
pub const MONEY_INTEGER_DIGITS: u32 = 10;

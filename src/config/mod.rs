/// Application-wide constants
pub mod constants;

/// Database configuration and connection management
pub mod database;

/// Seed catalog loading from catalog.toml
pub mod catalog;

use dotenvy::dotenv;
use repair_backoffice::{
    config::{catalog, database},
    core::{inventory, locker, pagination::PageRequest},
    errors::Result,
};
use std::path::Path;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; variables may also come from the environment
    dotenv().ok();

    // 3. Connect and make sure the schema exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 4. Seed the catalog when a catalog file is present
    let catalog_path = catalog::catalog_path();
    if Path::new(&catalog_path).exists() {
        let config = catalog::load_config(&catalog_path)?;
        catalog::seed_catalog(&db, &config)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
    } else {
        warn!(%catalog_path, "catalog file not found, skipping seed");
    }

    // 5. Report the state of the shop floor
    let low_stock = inventory::list_low_stock(&db, &PageRequest::first()).await?;
    let available = locker::list_available(&db).await?;
    info!(
        low_stock = low_stock.total_items,
        available_lockers = available.len(),
        "back office ready"
    );

    Ok(())
}

//! Lookup taxonomies: brands, categories, equipment types, activity types.
//!
//! These tables only need a unique name plus the shared lifecycle from
//! [`crate::core::lifecycle`].

use crate::{
    core::auth::Principal,
    entities::{
        ActivityType, Brand, Category, EquipmentType, activity_type, brand, category,
        equipment_type,
    },
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

fn normalized_name(kind: &str, name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(format!("{kind} name cannot be empty")));
    }
    Ok(trimmed.to_string())
}

fn duplicate(kind: &str, name: &str) -> Error {
    Error::validation(format!("{kind} `{name}` already exists"))
}

/// Creates a brand. Names are unique, deleted rows included.
pub async fn create_brand(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
) -> Result<brand::Model> {
    actor.require_staff("create brand")?;
    let name = normalized_name("Brand", &name)?;
    if find_brand_by_name(db, &name).await?.is_some() {
        return Err(duplicate("Brand", &name));
    }

    let now = chrono::Utc::now();
    let model = brand::ActiveModel {
        name: Set(name),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(id = model.id, name = %model.name, "brand created");
    Ok(model)
}

/// Finds a brand by exact name, deleted rows included.
pub async fn find_brand_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<brand::Model>> {
    Brand::find()
        .filter(brand::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a part category.
pub async fn create_category(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
) -> Result<category::Model> {
    actor.require_staff("create category")?;
    let name = normalized_name("Category", &name)?;
    if find_category_by_name(db, &name).await?.is_some() {
        return Err(duplicate("Category", &name));
    }

    let now = chrono::Utc::now();
    category::ActiveModel {
        name: Set(name),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds a category by exact name, deleted rows included.
pub async fn find_category_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an equipment type.
pub async fn create_equipment_type(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
) -> Result<equipment_type::Model> {
    actor.require_staff("create equipment type")?;
    let name = normalized_name("Equipment type", &name)?;
    if find_equipment_type_by_name(db, &name).await?.is_some() {
        return Err(duplicate("Equipment type", &name));
    }

    let now = chrono::Utc::now();
    equipment_type::ActiveModel {
        name: Set(name),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds an equipment type by exact name, deleted rows included.
pub async fn find_equipment_type_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<equipment_type::Model>> {
    EquipmentType::find()
        .filter(equipment_type::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates an activity type.
pub async fn create_activity_type(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
) -> Result<activity_type::Model> {
    actor.require_staff("create activity type")?;
    let name = normalized_name("Activity type", &name)?;
    if find_activity_type_by_name(db, &name).await?.is_some() {
        return Err(duplicate("Activity type", &name));
    }

    let now = chrono::Utc::now();
    activity_type::ActiveModel {
        name: Set(name),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

/// Finds an activity type by exact name, deleted rows included.
pub async fn find_activity_type_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<activity_type::Model>> {
    ActivityType::find()
        .filter(activity_type::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::lifecycle;
    use crate::test_utils::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    #[tokio::test]
    async fn test_blank_names_are_rejected_before_io() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite).into_connection();

        let result = create_brand(&db, &technician(), "   ".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Validation { .. }));

        let result = create_category(&db, &client_principal(), "Screens".to_string()).await;
        assert!(matches!(result.unwrap_err(), Error::Forbidden { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_names_are_trimmed_and_unique() -> Result<()> {
        let db = setup_test_db().await?;

        let laptop = create_equipment_type(&db, &technician(), "  Laptop ".to_string()).await?;
        assert_eq!(laptop.name, "Laptop");

        let err = create_equipment_type(&db, &technician(), "Laptop".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_names_stay_reserved() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = technician();
        let diag = create_activity_type(&db, &actor, "Diagnosis".to_string()).await?;
        lifecycle::soft_delete::<ActivityType, _>(&db, &actor, diag.id).await?;

        let err = create_activity_type(&db, &actor, "Diagnosis".to_string())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
        assert!(find_activity_type_by_name(&db, "Diagnosis").await?.is_some());
        Ok(())
    }
}

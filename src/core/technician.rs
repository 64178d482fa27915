//! Technician records - the staff members repairs are assigned to.

use crate::{
    core::auth::{Principal, Role},
    entities::technician,
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Registers a technician. Only admins manage staff.
pub async fn create_technician(
    db: &DatabaseConnection,
    actor: &Principal,
    name: String,
    specialty: Option<String>,
) -> Result<technician::Model> {
    actor.require(Role::Admin, "create technician")?;
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Technician name cannot be empty"));
    }

    let now = chrono::Utc::now();
    let model = technician::ActiveModel {
        name: Set(name),
        specialty: Set(specialty
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = model.id, name = %model.name, "technician created");
    Ok(model)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_only_admins_create_technicians() -> Result<()> {
        let db = setup_test_db().await?;

        let err = create_technician(&db, &technician(), "Rita".to_string(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));

        let rita =
            create_technician(&db, &admin(), "Rita".to_string(), Some(" Laptops ".to_string()))
                .await?;
        assert_eq!(rita.specialty.as_deref(), Some("Laptops"));
        assert!(rita.active);
        Ok(())
    }
}

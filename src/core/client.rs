//! Client records - the owners of the devices in the shop.

use crate::{
    core::{auth::Principal, lifecycle},
    entities::{Client, client},
    errors::{Error, Result},
};
use sea_orm::{Set, prelude::*};
use serde::Deserialize;
use tracing::info;

/// Fields for a new client
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewClient {
    /// Full name
    pub name: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
}

/// Blank strings count as absent.
fn optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}

fn checked_email(email: Option<String>) -> Result<Option<String>> {
    match optional_text(email) {
        Some(email) if !email.contains('@') => Err(Error::validation(format!(
            "`{email}` is not an email address"
        ))),
        other => Ok(other),
    }
}

/// Registers a client.
pub async fn create_client(
    db: &DatabaseConnection,
    actor: &Principal,
    new_client: NewClient,
) -> Result<client::Model> {
    actor.require_staff("create client")?;
    let name = new_client.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("Client name cannot be empty"));
    }
    let email = checked_email(new_client.email)?;

    let now = chrono::Utc::now();
    let model = client::ActiveModel {
        name: Set(name),
        phone: Set(optional_text(new_client.phone)),
        email: Set(email),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = model.id, "client created");
    Ok(model)
}

/// Replaces a visible client's phone and email. `None` or blank clears the field.
pub async fn update_client_contact(
    db: &DatabaseConnection,
    actor: &Principal,
    client_id: i64,
    phone: Option<String>,
    email: Option<String>,
) -> Result<client::Model> {
    actor.require_staff("update client contact")?;
    let email = checked_email(email)?;

    let current = lifecycle::find_visible::<Client, _>(db, client_id).await?;
    let mut model: client::ActiveModel = current.into();
    model.phone = Set(optional_text(phone));
    model.email = Set(email);
    model.updated_at = Set(chrono::Utc::now());

    let updated = model.update(db).await?;
    info!(id = client_id, "client contact updated");
    Ok(updated)
}

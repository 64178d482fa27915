//! Service orders - a device checked in for repair and its workflow status.
//!
//! Status moves forward only: received, in progress, ready, closed. Closing an
//! order frees the locker holding its device in the same transaction, and an
//! order that still occupies a locker cannot be soft-deleted.

use crate::{
    core::{
        auth::{Principal, Role},
        lifecycle::{self, Lifecycle, paginate},
        locker,
        pagination::{Page, PageRequest},
    },
    entities::{
        Brand, Client, EquipmentType, OrderStatus, ServiceOrder, Technician, locker as locker_entity,
        service_order,
    },
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, Query},
};
use serde::Deserialize;
use tracing::{info, instrument};

impl Lifecycle for ServiceOrder {
    const KIND: &'static str = "service order";

    fn id_column() -> Self::Column {
        service_order::Column::Id
    }
    fn active_column() -> Self::Column {
        service_order::Column::Active
    }
    fn deleted_at_column() -> Self::Column {
        service_order::Column::DeletedAt
    }
    fn updated_at_column() -> Self::Column {
        service_order::Column::UpdatedAt
    }
    fn search_columns() -> Vec<Self::Column> {
        vec![
            service_order::Column::Code,
            service_order::Column::DeviceDescription,
            service_order::Column::ReportedIssue,
        ]
    }
    fn is_active(model: &Self::Model) -> bool {
        model.active
    }
    fn deleted_at(model: &Self::Model) -> Option<DateTimeUtc> {
        model.deleted_at
    }

    // Not referenced by any locker.
    fn deletable_condition() -> Option<Condition> {
        let occupying = Query::select()
            .column(locker_entity::Column::OrderId)
            .from(locker_entity::Entity)
            .and_where(locker_entity::Column::OrderId.is_not_null())
            .to_owned();
        Some(Condition::all().add(service_order::Column::Id.not_in_subquery(occupying)))
    }

    fn deletion_blocked(id: i64) -> Error {
        Error::CannotDeleteOccupiedResource {
            entity: Self::KIND,
            id,
        }
    }
}

/// Fields for a new service order
#[derive(Debug, Clone, Deserialize)]
pub struct NewOrder {
    /// Claim-ticket code, unique
    pub code: String,
    /// Owner of the device
    pub client_id: i64,
    /// Equipment type lookup
    pub equipment_type_id: Option<i64>,
    /// Brand lookup
    pub brand_id: Option<i64>,
    /// Model, serial, accessories
    pub device_description: String,
    /// Problem as reported at the counter
    pub reported_issue: String,
}

/// Checks in a device. The order starts `received`.
pub async fn create_order(
    db: &DatabaseConnection,
    actor: &Principal,
    new_order: NewOrder,
) -> Result<service_order::Model> {
    actor.require_staff("create service order")?;
    let code = new_order.code.trim().to_string();
    if code.is_empty() {
        return Err(Error::validation("Order code cannot be empty"));
    }

    let taken = ServiceOrder::find()
        .filter(service_order::Column::Code.eq(code.as_str()))
        .one(db)
        .await?;
    if taken.is_some() {
        return Err(Error::validation(format!("Order code `{code}` already exists")));
    }

    lifecycle::find_visible::<Client, _>(db, new_order.client_id).await?;
    if let Some(equipment_type_id) = new_order.equipment_type_id {
        lifecycle::find_visible::<EquipmentType, _>(db, equipment_type_id).await?;
    }
    if let Some(brand_id) = new_order.brand_id {
        lifecycle::find_visible::<Brand, _>(db, brand_id).await?;
    }

    let now = chrono::Utc::now();
    let model = service_order::ActiveModel {
        code: Set(code),
        client_id: Set(new_order.client_id),
        technician_id: Set(None),
        equipment_type_id: Set(new_order.equipment_type_id),
        brand_id: Set(new_order.brand_id),
        device_description: Set(new_order.device_description.trim().to_string()),
        reported_issue: Set(new_order.reported_issue.trim().to_string()),
        status: Set(OrderStatus::Received.as_str().to_string()),
        closed_at: Set(None),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = model.id, code = %model.code, client_id = model.client_id, "service order created");
    Ok(model)
}

fn ensure_open(order: &service_order::Model) -> Result<()> {
    if order.order_status() == OrderStatus::Closed {
        return Err(Error::validation(format!("Order {} is closed", order.id)));
    }
    Ok(())
}

/// Puts a visible technician in charge of an open order.
pub async fn assign_technician(
    db: &DatabaseConnection,
    actor: &Principal,
    order_id: i64,
    technician_id: i64,
) -> Result<service_order::Model> {
    actor.require_staff("assign technician")?;

    let order = lifecycle::find_visible::<ServiceOrder, _>(db, order_id).await?;
    ensure_open(&order)?;
    lifecycle::find_visible::<Technician, _>(db, technician_id).await?;

    let mut model: service_order::ActiveModel = order.into();
    model.technician_id = Set(Some(technician_id));
    model.updated_at = Set(chrono::Utc::now());
    let updated = model.update(db).await?;

    info!(order_id, technician_id, "technician assigned");
    Ok(updated)
}

/// Moves the status from `from` to `to` if nobody else moved it first.
async fn transition<C>(
    db: &C,
    order_id: i64,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<service_order::Model>
where
    C: ConnectionTrait,
{
    let now = chrono::Utc::now();
    let mut update = ServiceOrder::update_many()
        .col_expr(service_order::Column::Status, Expr::value(to.as_str()))
        .col_expr(service_order::Column::UpdatedAt, Expr::value(now))
        .filter(service_order::Column::Id.eq(order_id))
        .filter(service_order::Column::Status.eq(from.as_str()));
    if to == OrderStatus::Closed {
        update = update.col_expr(service_order::Column::ClosedAt, Expr::value(Some(now)));
    }

    if update.exec(db).await?.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: ServiceOrder::KIND,
            id: order_id,
        });
    }
    lifecycle::find_visible::<ServiceOrder, _>(db, order_id).await
}

/// Advances an open order one step along its workflow.
///
/// Advancing a `ready` order closes it, with the same effects as [`close_order`].
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn advance_status(
    db: &DatabaseConnection,
    actor: &Principal,
    order_id: i64,
) -> Result<service_order::Model> {
    actor.require_staff("advance order status")?;

    let order = lifecycle::find_visible::<ServiceOrder, _>(db, order_id).await?;
    let from = order.order_status();
    let Some(to) = from.next() else {
        return Err(Error::validation(format!("Order {order_id} is closed")));
    };
    if to == OrderStatus::Closed {
        return close_order(db, actor, order_id).await;
    }

    let updated = transition(db, order_id, from, to).await?;
    info!(order_id, %from, %to, "order status advanced");
    Ok(updated)
}

/// Closes an order from any open status and frees its locker, atomically.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn close_order(
    db: &DatabaseConnection,
    actor: &Principal,
    order_id: i64,
) -> Result<service_order::Model> {
    actor.require_staff("close service order")?;

    let txn = db.begin().await?;
    let order = lifecycle::find_visible::<ServiceOrder, _>(&txn, order_id).await?;
    ensure_open(&order)?;

    let closed = transition(&txn, order_id, order.order_status(), OrderStatus::Closed).await?;
    let freed = locker::release_for_order_in(&txn, order_id).await?;
    txn.commit().await?;

    info!(
        order_id,
        locker = freed.as_ref().map(|held| held.code.as_str()),
        "service order closed"
    );
    Ok(closed)
}

/// Soft-deletes an order. Refused while it occupies a locker.
pub async fn soft_delete_order(
    db: &DatabaseConnection,
    actor: &Principal,
    order_id: i64,
) -> Result<()> {
    lifecycle::soft_delete::<ServiceOrder, _>(db, actor, order_id).await
}

/// A client's orders, newest first.
///
/// Clients may only list their own orders; staff may list anyone's.
pub async fn list_client_orders(
    db: &DatabaseConnection,
    actor: &Principal,
    client_id: i64,
    request: &PageRequest,
) -> Result<Page<service_order::Model>> {
    if actor.role == Role::Client && actor.id != client_id {
        return Err(Error::Forbidden {
            role: actor.role,
            action: "list another client's orders",
        });
    }

    let mut query = ServiceOrder::find().filter(service_order::Column::ClientId.eq(client_id));
    if !request.include_inactive {
        query = query.filter(service_order::Column::Active.eq(true));
    }
    paginate(db, query.order_by_desc(service_order::Column::Id), request).await
}

//! Locker allocator - exclusive assignment of physical lockers to service orders.
//!
//! A locker is `Available` or `Occupied`. The only transitions are `assign`
//! (available to occupied) and `release` (occupied to available). Both are
//! compare-and-swap updates, and `lockers.order_id` is unique, so neither two
//! orders per locker nor two lockers per order can ever be recorded.

use crate::{
    core::{
        auth::Principal,
        lifecycle::{self, Lifecycle},
    },
    entities::{Locker, OccupancyState, OrderStatus, ServiceOrder, locker},
    errors::{Error, Result},
};
use sea_orm::{
    Condition, QueryOrder, Set, SqlErr, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{info, instrument};

impl Lifecycle for Locker {
    const KIND: &'static str = "locker";

    fn id_column() -> Self::Column {
        locker::Column::Id
    }
    fn active_column() -> Self::Column {
        locker::Column::Active
    }
    fn deleted_at_column() -> Self::Column {
        locker::Column::DeletedAt
    }
    fn updated_at_column() -> Self::Column {
        locker::Column::UpdatedAt
    }
    fn search_columns() -> Vec<Self::Column> {
        vec![locker::Column::Code, locker::Column::Description]
    }
    fn is_active(model: &Self::Model) -> bool {
        model.active
    }
    fn deleted_at(model: &Self::Model) -> Option<DateTimeUtc> {
        model.deleted_at
    }

    // An occupied locker holds a device; it cannot disappear from the floor plan.
    fn deletable_condition() -> Option<Condition> {
        Some(Condition::all().add(locker::Column::OrderId.is_null()))
    }

    fn deletion_blocked(id: i64) -> Error {
        Error::CannotDeleteOccupiedResource {
            entity: Self::KIND,
            id,
        }
    }
}

/// Registers a new, empty locker.
pub async fn create_locker(
    db: &DatabaseConnection,
    actor: &Principal,
    code: String,
    description: String,
) -> Result<locker::Model> {
    actor.require_staff("create locker")?;
    let code = code.trim().to_string();
    if code.is_empty() {
        return Err(Error::validation("Locker code cannot be empty"));
    }
    if find_locker_by_code(db, &code).await?.is_some() {
        return Err(Error::validation(format!("Locker `{code}` already exists")));
    }

    let now = chrono::Utc::now();
    let model = locker::ActiveModel {
        code: Set(code),
        description: Set(description.trim().to_string()),
        occupancy: Set(OccupancyState::Available.as_str().to_string()),
        order_id: Set(None),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = model.id, code = %model.code, "locker created");
    Ok(model)
}

/// Finds a locker by code, deleted rows included.
pub async fn find_locker_by_code<C>(db: &C, code: &str) -> Result<Option<locker::Model>>
where
    C: ConnectionTrait,
{
    Locker::find()
        .filter(locker::Column::Code.eq(code))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Places an order's device in a locker.
///
/// Checks, in order: the locker is visible (`NotFound`) and available
/// (`LockerUnavailable`); the order is visible (`NotFound`) and not closed
/// (`Validation`); the order is not already in another locker
/// (`OrderAlreadyAssigned`). A writer that loses the race for the same locker
/// gets `LockerUnavailable`.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn assign(
    db: &DatabaseConnection,
    actor: &Principal,
    locker_id: i64,
    order_id: i64,
) -> Result<locker::Model> {
    actor.require_staff("assign locker")?;

    let txn = db.begin().await?;
    let assigned = assign_in(&txn, locker_id, order_id).await?;
    txn.commit().await?;

    info!(locker_id, order_id, code = %assigned.code, "locker assigned");
    Ok(assigned)
}

/// [`assign`] on an existing connection or transaction, without role checks.
pub async fn assign_in<C>(db: &C, locker_id: i64, order_id: i64) -> Result<locker::Model>
where
    C: ConnectionTrait,
{
    let current = lifecycle::find_visible::<Locker, _>(db, locker_id).await?;
    if current.is_occupied() {
        return Err(Error::LockerUnavailable { locker_id });
    }

    let order = lifecycle::find_visible::<ServiceOrder, _>(db, order_id).await?;
    if order.order_status() == OrderStatus::Closed {
        return Err(Error::validation(format!(
            "Order {order_id} is closed and cannot be placed in a locker"
        )));
    }
    if let Some(other) = locker_for_order(db, order_id).await? {
        return Err(Error::OrderAlreadyAssigned {
            order_id,
            locker_id: other.id,
        });
    }

    occupy(db, locker_id, order_id).await?;
    lifecycle::find_visible::<Locker, _>(db, locker_id).await
}

/// The available-to-occupied swap itself.
///
/// Applies only while the locker is still active, available and empty, so a
/// writer whose pre-checks raced another assignment gets `LockerUnavailable`.
/// The unique `order_id` turns a second locker for the same order into
/// `OrderAlreadyAssigned`.
async fn occupy<C>(db: &C, locker_id: i64, order_id: i64) -> Result<()>
where
    C: ConnectionTrait,
{
    let update = Locker::update_many()
        .col_expr(
            locker::Column::Occupancy,
            Expr::value(OccupancyState::Occupied.as_str()),
        )
        .col_expr(locker::Column::OrderId, Expr::value(Some(order_id)))
        .col_expr(locker::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(locker::Column::Id.eq(locker_id))
        .filter(locker::Column::Active.eq(true))
        .filter(locker::Column::Occupancy.eq(OccupancyState::Available.as_str()))
        .filter(locker::Column::OrderId.is_null());

    let result = match update.exec(db).await {
        Ok(result) => result,
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            let holder = locker_for_order(db, order_id).await?;
            return Err(Error::OrderAlreadyAssigned {
                order_id,
                locker_id: holder.map_or(locker_id, |held| held.id),
            });
        }
        Err(err) => return Err(err.into()),
    };
    if result.rows_affected == 0 {
        return Err(Error::LockerUnavailable { locker_id });
    }
    Ok(())
}

/// Empties an occupied locker. Releasing an available locker is an
/// `InvalidTransition`.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn release(
    db: &DatabaseConnection,
    actor: &Principal,
    locker_id: i64,
) -> Result<locker::Model> {
    actor.require_staff("release locker")?;

    let txn = db.begin().await?;
    let released = release_in(&txn, locker_id).await?;
    txn.commit().await?;
    Ok(released)
}

/// [`release`] on an existing connection or transaction, without role checks.
pub async fn release_in<C>(db: &C, locker_id: i64) -> Result<locker::Model>
where
    C: ConnectionTrait,
{
    let result = Locker::update_many()
        .col_expr(
            locker::Column::Occupancy,
            Expr::value(OccupancyState::Available.as_str()),
        )
        .col_expr(locker::Column::OrderId, Expr::value(Option::<i64>::None))
        .col_expr(locker::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(locker::Column::Id.eq(locker_id))
        .filter(locker::Column::DeletedAt.is_null())
        .filter(locker::Column::Occupancy.eq(OccupancyState::Occupied.as_str()))
        .exec(db)
        .await?;

    let current = lifecycle::find_any::<Locker, _>(db, locker_id)
        .await?
        .filter(|model| model.deleted_at.is_none())
        .ok_or_else(|| Error::not_found(Locker::KIND, locker_id))?;
    if result.rows_affected == 0 {
        return Err(Error::InvalidTransition {
            locker_id,
            from: current.occupancy_state().as_str(),
            to: OccupancyState::Available.as_str(),
        });
    }

    info!(locker_id, code = %current.code, "locker released");
    Ok(current)
}

/// Releases whatever locker the order occupies. `None` when it occupies none.
pub async fn release_for_order_in<C>(db: &C, order_id: i64) -> Result<Option<locker::Model>>
where
    C: ConnectionTrait,
{
    match locker_for_order(db, order_id).await? {
        Some(held) => release_in(db, held.id).await.map(Some),
        None => Ok(None),
    }
}

/// Active lockers that can take an order, ordered by code.
pub async fn list_available(db: &DatabaseConnection) -> Result<Vec<locker::Model>> {
    Locker::find()
        .filter(locker::Column::Active.eq(true))
        .filter(locker::Column::Occupancy.eq(OccupancyState::Available.as_str()))
        .filter(locker::Column::OrderId.is_null())
        .order_by_asc(locker::Column::Code)
        .all(db)
        .await
        .map_err(Into::into)
}

/// The locker an order currently occupies, if any.
pub async fn locker_for_order<C>(db: &C, order_id: i64) -> Result<Option<locker::Model>>
where
    C: ConnectionTrait,
{
    Locker::find()
        .filter(locker::Column::OrderId.eq(order_id))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{lifecycle::Lookup, order};
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_assign_and_release_cycle() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let first = create_test_order(&db, "OS-0007").await?;
        let second = create_test_order(&db, "OS-0008").await?;
        let actor = technician();

        let occupied = assign(&db, &actor, a1.id, first.id).await?;
        assert_eq!(occupied.occupancy_state(), OccupancyState::Occupied);
        assert_eq!(occupied.order_id, Some(first.id));

        let err = assign(&db, &actor, a1.id, second.id).await.unwrap_err();
        assert!(matches!(err, Error::LockerUnavailable { locker_id } if locker_id == a1.id));

        let released = release(&db, &actor, a1.id).await?;
        assert_eq!(released.occupancy_state(), OccupancyState::Available);
        assert_eq!(released.order_id, None);

        let err = release(&db, &actor, a1.id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidTransition {
                from: "available",
                to: "available",
                ..
            }
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_order_cannot_hold_two_lockers() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let a2 = create_test_locker(&db, "A2").await?;
        let order = create_test_order(&db, "OS-0001").await?;

        assign(&db, &technician(), a1.id, order.id).await?;
        let err = assign(&db, &technician(), a2.id, order.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::OrderAlreadyAssigned { order_id, locker_id }
                if order_id == order.id && locker_id == a1.id
        ));

        let a2_now = lifecycle::find_visible::<Locker, _>(&db, a2.id).await?;
        assert!(!a2_now.is_occupied());
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_requires_visible_locker_and_open_order() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let order = create_test_order(&db, "OS-0001").await?;

        let err = assign(&db, &technician(), 99, order.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "locker", .. }));

        let err = assign(&db, &technician(), a1.id, 99).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 99, .. }));

        order::close_order(&db, &technician(), order.id).await?;
        let err = assign(&db, &technician(), a1.id, order.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        lifecycle::toggle_active::<Locker, _>(&db, &technician(), a1.id, Lookup::VisibleOnly)
            .await?;
        let open = create_test_order(&db, "OS-0002").await?;
        let err = assign(&db, &technician(), a1.id, open.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_occupied_locker_cannot_be_deleted() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let order = create_test_order(&db, "OS-0001").await?;
        assign(&db, &technician(), a1.id, order.id).await?;

        let err = lifecycle::soft_delete::<Locker, _>(&db, &technician(), a1.id)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::CannotDeleteOccupiedResource { entity: "locker", .. }
        ));

        release(&db, &technician(), a1.id).await?;
        lifecycle::soft_delete::<Locker, _>(&db, &technician(), a1.id).await?;
        assert!(list_available(&db).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_swap_refuses_a_locker_taken_after_the_checks() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let first = create_test_order(&db, "OS-0001").await?;
        let second = create_test_order(&db, "OS-0002").await?;

        // Both writers saw A1 available; the first one commits
        assign(&db, &technician(), a1.id, first.id).await?;

        let err = occupy(&db, a1.id, second.id).await.unwrap_err();
        assert!(matches!(err, Error::LockerUnavailable { locker_id } if locker_id == a1.id));

        let holder = lifecycle::find_visible::<Locker, _>(&db, a1.id).await?;
        assert_eq!(holder.order_id, Some(first.id));
        assert!(locker_for_order(&db, second.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_swap_refuses_a_second_locker_for_one_order() -> Result<()> {
        let db = setup_test_db().await?;
        let a1 = create_test_locker(&db, "A1").await?;
        let a2 = create_test_locker(&db, "A2").await?;
        let order = create_test_order(&db, "OS-0001").await?;

        // Both writers saw the order without a locker; the first one commits
        assign(&db, &technician(), a1.id, order.id).await?;

        let err = occupy(&db, a2.id, order.id).await.unwrap_err();
        assert!(matches!(
            err,
            Error::OrderAlreadyAssigned { order_id, locker_id }
                if order_id == order.id && locker_id == a1.id
        ));

        let a2_now = lifecycle::find_visible::<Locker, _>(&db, a2.id).await?;
        assert!(!a2_now.is_occupied());
        assert_eq!(a2_now.occupancy_state(), OccupancyState::Available);
        assert_eq!(list_available(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_available_and_lookup_by_order() -> Result<()> {
        let db = setup_test_db().await?;
        let b2 = create_test_locker(&db, "B2").await?;
        create_test_locker(&db, "A1").await?;
        create_test_locker(&db, "C3").await?;
        let order = create_test_order(&db, "OS-0001").await?;

        assign(&db, &technician(), b2.id, order.id).await?;

        let codes: Vec<String> = list_available(&db)
            .await?
            .into_iter()
            .map(|locker| locker.code)
            .collect();
        assert_eq!(codes, vec!["A1".to_string(), "C3".to_string()]);

        let held = locker_for_order(&db, order.id).await?.unwrap();
        assert_eq!(held.id, b2.id);
        assert!(locker_for_order(&db, 4040).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_locker_codes_are_unique() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_locker(&db, "A1").await?;

        let err = create_locker(&db, &technician(), " A1 ".to_string(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));

        let err = create_locker(&db, &client_principal(), "Z9".to_string(), String::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        Ok(())
    }
}

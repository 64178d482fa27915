//! Shared lifecycle for every entity: active flag, soft delete, restore.
//!
//! Each table binds its columns to [`Lifecycle`] once; the operations below are
//! written a single time against that trait. Rows are never physically removed.
//!
//! State invariant kept by every operation here: a row with `deleted_at` set is
//! never `active`.

use crate::{
    core::{
        auth::Principal,
        pagination::{Page, PageRequest},
    },
    entities,
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{
    ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    Select, prelude::DateTimeUtc, sea_query::Expr,
};
use tracing::{debug, info};

/// How a single-row lookup treats rows that are not active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lookup {
    /// Only `active == true` rows resolve
    #[default]
    VisibleOnly,
    /// Inactive and soft-deleted rows resolve too
    IncludeInactive,
}

/// Binds an entity's lifecycle columns.
///
/// Implemented for every table in this crate. Entities with extra deletion
/// rules (lockers, service orders) narrow [`Lifecycle::deletable_condition`] and
/// report the refusal through [`Lifecycle::deletion_blocked`].
pub trait Lifecycle: EntityTrait {
    /// Name used in errors and logs
    const KIND: &'static str;

    /// Primary key column
    fn id_column() -> Self::Column;
    /// `active` column
    fn active_column() -> Self::Column;
    /// `deleted_at` column
    fn deleted_at_column() -> Self::Column;
    /// `updated_at` column
    fn updated_at_column() -> Self::Column;
    /// Columns matched by a free-text search
    fn search_columns() -> Vec<Self::Column>;

    /// `active` of a row
    fn is_active(model: &Self::Model) -> bool;
    /// `deleted_at` of a row
    fn deleted_at(model: &Self::Model) -> Option<DateTimeUtc>;

    /// Extra predicate a row must satisfy, at write time, to be soft-deleted.
    fn deletable_condition() -> Option<Condition> {
        None
    }

    /// Error reported when a live row fails [`Lifecycle::deletable_condition`].
    fn deletion_blocked(id: i64) -> Error {
        Error::ConcurrentModification {
            entity: Self::KIND,
            id,
        }
    }
}

/// Row by id regardless of its lifecycle state.
pub async fn find_any<E, C>(db: &C, id: i64) -> Result<Option<E::Model>>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::id_column().eq(id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Row by id if it is active, `NotFound` otherwise.
pub async fn find_visible<E, C>(db: &C, id: i64) -> Result<E::Model>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    E::find()
        .filter(E::id_column().eq(id))
        .filter(E::active_column().eq(true))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found(E::KIND, id))
}

/// Row by id under the given [`Lookup`], `NotFound` when it does not resolve.
pub async fn find<E, C>(db: &C, id: i64, lookup: Lookup) -> Result<E::Model>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    match lookup {
        Lookup::VisibleOnly => find_visible::<E, C>(db, id).await,
        Lookup::IncludeInactive => find_any::<E, C>(db, id)
            .await?
            .ok_or_else(|| Error::not_found(E::KIND, id)),
    }
}

/// Flips `active`.
///
/// With [`Lookup::VisibleOnly`] only active rows can be toggled, so the call can
/// only deactivate. Soft-deleted rows must go through [`restore`] instead and
/// fail with `AlreadyDeleted`.
pub async fn toggle_active<E, C>(
    db: &C,
    actor: &Principal,
    id: i64,
    lookup: Lookup,
) -> Result<E::Model>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    actor.require_staff("toggle active state")?;

    let model = find::<E, C>(db, id, lookup).await?;
    if E::deleted_at(&model).is_some() {
        return Err(Error::AlreadyDeleted {
            entity: E::KIND,
            id,
        });
    }

    let next = !E::is_active(&model);
    let result = E::update_many()
        .col_expr(E::active_column(), Expr::value(next))
        .col_expr(E::updated_at_column(), Expr::value(Utc::now()))
        .filter(E::id_column().eq(id))
        .filter(E::deleted_at_column().is_null())
        .filter(E::active_column().eq(!next))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: E::KIND,
            id,
        });
    }

    info!(entity = E::KIND, id, active = next, actor = actor.id, "toggled active state");
    find::<E, C>(db, id, Lookup::IncludeInactive).await
}

/// Marks a row deleted: `active = false`, `deleted_at = now`.
///
/// Deleting twice fails with `AlreadyDeleted`.
pub async fn soft_delete<E, C>(db: &C, actor: &Principal, id: i64) -> Result<()>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    actor.require_staff("soft delete")?;

    let model = find_any::<E, C>(db, id)
        .await?
        .ok_or_else(|| Error::not_found(E::KIND, id))?;
    if E::deleted_at(&model).is_some() {
        return Err(Error::AlreadyDeleted {
            entity: E::KIND,
            id,
        });
    }

    let now = Utc::now();
    let mut update = E::update_many()
        .col_expr(E::active_column(), Expr::value(false))
        .col_expr(E::deleted_at_column(), Expr::value(now))
        .col_expr(E::updated_at_column(), Expr::value(now))
        .filter(E::id_column().eq(id))
        .filter(E::deleted_at_column().is_null());
    if let Some(condition) = E::deletable_condition() {
        update = update.filter(condition);
    }
    let result = update.exec(db).await?;

    if result.rows_affected == 0 {
        // Either another writer deleted it first or the entity's own rule refused.
        let current = find_any::<E, C>(db, id)
            .await?
            .ok_or_else(|| Error::not_found(E::KIND, id))?;
        if E::deleted_at(&current).is_some() {
            return Err(Error::AlreadyDeleted {
                entity: E::KIND,
                id,
            });
        }
        return Err(E::deletion_blocked(id));
    }

    info!(entity = E::KIND, id, actor = actor.id, "soft deleted");
    Ok(())
}

/// Reverses [`soft_delete`]: `active = true`, `deleted_at = None`.
///
/// Fails with `NotRestorable` when the row was never deleted.
pub async fn restore<E, C>(db: &C, actor: &Principal, id: i64) -> Result<E::Model>
where
    E: Lifecycle,
    C: ConnectionTrait,
{
    actor.require_staff("restore")?;

    let model = find_any::<E, C>(db, id)
        .await?
        .ok_or_else(|| Error::not_found(E::KIND, id))?;
    if E::deleted_at(&model).is_none() {
        return Err(Error::NotRestorable {
            entity: E::KIND,
            id,
        });
    }

    let result = E::update_many()
        .col_expr(E::active_column(), Expr::value(true))
        .col_expr(E::deleted_at_column(), Expr::value(Option::<DateTimeUtc>::None))
        .col_expr(E::updated_at_column(), Expr::value(Utc::now()))
        .filter(E::id_column().eq(id))
        .filter(E::deleted_at_column().is_not_null())
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::NotRestorable {
            entity: E::KIND,
            id,
        });
    }

    info!(entity = E::KIND, id, actor = actor.id, "restored");
    find::<E, C>(db, id, Lookup::IncludeInactive).await
}

/// Lists one page of rows, active only unless `include_inactive` is set.
pub async fn list<E, C>(db: &C, request: &PageRequest) -> Result<Page<E::Model>>
where
    E: Lifecycle,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let mut query = E::find();
    if !request.include_inactive {
        query = query.filter(E::active_column().eq(true));
    }
    if let Some(term) = request.search_term() {
        let matches = E::search_columns()
            .into_iter()
            .fold(Condition::any(), |condition, column| {
                condition.add(column.contains(term))
            });
        query = query.filter(matches);
    }

    paginate::<E, C>(db, query.order_by_asc(E::id_column()), request).await
}

/// Runs an already-filtered query one page at a time.
pub(crate) async fn paginate<E, C>(
    db: &C,
    query: Select<E>,
    request: &PageRequest,
) -> Result<Page<E::Model>>
where
    E: EntityTrait,
    E::Model: Send + Sync + 'static,
    C: ConnectionTrait,
{
    let page = request.page();
    let limit = request.limit();

    let paginator = query.paginate(db, limit);
    let total = paginator.num_items().await?;
    let items = paginator.fetch_page(page - 1).await?;
    debug!(page, limit, total, "fetched page");

    Ok(Page::new(items, page, limit, total))
}

/// Binds the standard lifecycle columns of plain tables.
macro_rules! impl_lifecycle {
    ($($module:ident => $kind:literal [$($search:ident),* $(,)?]);+ $(;)?) => {
        $(
            impl Lifecycle for entities::$module::Entity {
                const KIND: &'static str = $kind;

                fn id_column() -> Self::Column {
                    entities::$module::Column::Id
                }
                fn active_column() -> Self::Column {
                    entities::$module::Column::Active
                }
                fn deleted_at_column() -> Self::Column {
                    entities::$module::Column::DeletedAt
                }
                fn updated_at_column() -> Self::Column {
                    entities::$module::Column::UpdatedAt
                }
                fn search_columns() -> Vec<Self::Column> {
                    vec![$(entities::$module::Column::$search),*]
                }
                fn is_active(model: &Self::Model) -> bool {
                    model.active
                }
                fn deleted_at(model: &Self::Model) -> Option<DateTimeUtc> {
                    model.deleted_at
                }
            }
        )+
    };
}

// `locker` and `service_order` carry deletion rules and are bound in their own modules.
impl_lifecycle! {
    activity_type => "activity type" [Name];
    brand => "brand" [Name];
    budget => "budget" [Description];
    budget_labor_line => "budget labor line" [];
    budget_part_line => "budget part line" [];
    category => "category" [Name];
    client => "client" [Name, Phone, Email];
    equipment_type => "equipment type" [Name];
    inventory => "inventory record" [Location];
    labor_type => "labor type" [Name];
    part => "part" [Code, Name];
    repuesto => "repuesto" [Name];
    technician => "technician" [Name, Specialty];
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{core::lookup, entities::Brand, test_utils::*};

    #[tokio::test]
    async fn test_created_rows_start_active() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;

        assert!(brand.active);
        assert!(brand.deleted_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_soft_delete_twice_fails() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;

        soft_delete::<Brand, _>(&db, &technician(), brand.id).await?;
        let deleted = find_any::<Brand, _>(&db, brand.id).await?.unwrap();
        assert!(!deleted.active);
        assert!(deleted.deleted_at.is_some());

        let err = soft_delete::<Brand, _>(&db, &technician(), brand.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyDeleted { entity: "brand", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_restore_requires_prior_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;

        let err = restore::<Brand, _>(&db, &technician(), brand.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotRestorable { .. }));

        soft_delete::<Brand, _>(&db, &technician(), brand.id).await?;
        let restored = restore::<Brand, _>(&db, &technician(), brand.id).await?;
        assert!(restored.active);
        assert!(restored.deleted_at.is_none());

        let err = restore::<Brand, _>(&db, &technician(), brand.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotRestorable { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() -> Result<()> {
        let db = setup_test_db().await?;

        let err = soft_delete::<Brand, _>(&db, &technician(), 404)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { id: 404, .. }));
        let err = restore::<Brand, _>(&db, &technician(), 404)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = toggle_active::<Brand, _>(&db, &technician(), 404, Lookup::IncludeInactive)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_respects_lookup_visibility() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;

        let off = toggle_active::<Brand, _>(&db, &technician(), brand.id, Lookup::VisibleOnly)
            .await?;
        assert!(!off.active);

        // Inactive rows are invisible unless the caller opts in.
        let err = toggle_active::<Brand, _>(&db, &technician(), brand.id, Lookup::VisibleOnly)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));

        let on = toggle_active::<Brand, _>(&db, &technician(), brand.id, Lookup::IncludeInactive)
            .await?;
        assert!(on.active);
        Ok(())
    }

    #[tokio::test]
    async fn test_deleted_rows_cannot_be_toggled() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;
        soft_delete::<Brand, _>(&db, &technician(), brand.id).await?;

        let err = toggle_active::<Brand, _>(&db, &technician(), brand.id, Lookup::IncludeInactive)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyDeleted { .. }));

        let still = find_any::<Brand, _>(&db, brand.id).await?.unwrap();
        assert!(!still.active);
        Ok(())
    }

    #[tokio::test]
    async fn test_clients_cannot_mutate_lifecycle() -> Result<()> {
        let db = setup_test_db().await?;
        let brand = lookup::create_brand(&db, &technician(), "Acme".to_string()).await?;

        let err = soft_delete::<Brand, _>(&db, &client_principal(), brand.id)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
        assert!(find_visible::<Brand, _>(&db, brand.id).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn test_list_defaults_to_active_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = technician();
        let acme = lookup::create_brand(&db, &actor, "Acme".to_string()).await?;
        lookup::create_brand(&db, &actor, "Globex".to_string()).await?;
        let initech = lookup::create_brand(&db, &actor, "Initech".to_string()).await?;
        soft_delete::<Brand, _>(&db, &actor, acme.id).await?;
        toggle_active::<Brand, _>(&db, &actor, initech.id, Lookup::VisibleOnly).await?;

        let visible = list::<Brand, _>(&db, &PageRequest::first()).await?;
        assert_eq!(visible.total_items, 1);
        assert_eq!(visible.items[0].name, "Globex");

        let everything = list::<Brand, _>(&db, &PageRequest::first().including_inactive()).await?;
        assert_eq!(everything.total_items, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_paginates_and_searches() -> Result<()> {
        let db = setup_test_db().await?;
        let actor = technician();
        for name in ["Acme", "Acme Labs", "Globex", "Initech", "Umbrella"] {
            lookup::create_brand(&db, &actor, name.to_string()).await?;
        }

        let page = list::<Brand, _>(&db, &PageRequest::new(2, 2)).await?;
        assert_eq!(page.total_items, 5);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].name, "Globex");

        let found = list::<Brand, _>(&db, &PageRequest::first().with_search("acme")).await?;
        assert_eq!(found.total_items, 2);
        Ok(())
    }
}

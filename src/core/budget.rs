//! Budget line aggregator.
//!
//! A budget's `total` always equals the sum of `line_total` over its active
//! labor and part lines. Every line mutation reads the budget first, runs in one
//! transaction together with [`recompute_total`], and writes the recomputed
//! total with a compare-and-swap on the `budgets.version` it read.
//!
//! Lines price themselves from a snapshot of the catalog cost taken when the line
//! is created or pointed at a different catalog item. Later catalog price changes
//! never reprice existing lines; [`preview_line_total`] shows the live price
//! without persisting it.

use crate::{
    core::{
        amount,
        auth::Principal,
        catalog::{self, CatalogItem},
        lifecycle::{self, Lookup},
    },
    entities::{
        Budget, BudgetLaborLine, BudgetPartLine, ServiceOrder, budget, budget_labor_line,
        budget_part_line,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Identifies one line of either kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum LineRef {
    /// A `budget_labor_lines` row
    Labor(i64),
    /// A `budget_part_lines` row
    Part(i64),
}

/// Partial update of a line. Fields left `None` keep their value.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct LineUpdate {
    /// New quantity, must be positive
    pub quantity: Option<i32>,
    /// New labor type or repuesto of the same kind as the line
    pub catalog_item_id: Option<i64>,
}

/// One priced line, labor or part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetLine {
    /// Which line this is
    pub line: LineRef,
    /// Owning budget
    pub budget_id: i64,
    /// Catalog item being quoted
    pub item: CatalogItem,
    /// Units quoted
    pub quantity: i32,
    /// Catalog cost when the line was priced
    pub unit_cost_snapshot: Decimal,
    /// `quantity * unit_cost_snapshot`
    pub line_total: Decimal,
    /// Counts toward the total when true
    pub active: bool,
}

impl From<budget_labor_line::Model> for BudgetLine {
    fn from(line: budget_labor_line::Model) -> Self {
        Self {
            line: LineRef::Labor(line.id),
            budget_id: line.budget_id,
            item: CatalogItem::LaborType(line.labor_type_id),
            quantity: line.quantity,
            unit_cost_snapshot: line.unit_cost_snapshot,
            line_total: line.line_total,
            active: line.active,
        }
    }
}

impl From<budget_part_line::Model> for BudgetLine {
    fn from(line: budget_part_line::Model) -> Self {
        Self {
            line: LineRef::Part(line.id),
            budget_id: line.budget_id,
            item: CatalogItem::Repuesto(line.repuesto_id),
            quantity: line.quantity,
            unit_cost_snapshot: line.unit_cost_snapshot,
            line_total: line.line_total,
            active: line.active,
        }
    }
}

/// Read model of a budget with its active lines.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetSummary {
    /// Budget identifier
    pub budget_id: i64,
    /// Persisted total
    pub total: Decimal,
    /// Number of active lines
    pub line_count: usize,
    /// Active labor lines followed by active part lines
    pub lines: Vec<BudgetLine>,
}

fn validate_quantity(quantity: i32) -> Result<()> {
    if quantity <= 0 {
        return Err(Error::validation(format!(
            "Line quantity must be positive, got {quantity}"
        )));
    }
    Ok(())
}

/// Opens an empty budget for a visible service order.
pub async fn create_budget(
    db: &DatabaseConnection,
    actor: &Principal,
    order_id: i64,
    description: String,
) -> Result<budget::Model> {
    actor.require_staff("create budget")?;
    lifecycle::find_visible::<ServiceOrder, _>(db, order_id).await?;

    let now = chrono::Utc::now();
    let model = budget::ActiveModel {
        order_id: Set(order_id),
        description: Set(description.trim().to_string()),
        total: Set(Decimal::ZERO),
        version: Set(0),
        active: Set(true),
        deleted_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(id = model.id, order_id, "budget created");
    Ok(model)
}

/// Prices a new line from the catalog's current cost and adds it to a budget.
///
/// # Errors
/// * `Validation` when `quantity <= 0`, the catalog item is inactive, or the
///   line or budget total no longer fits a money column
/// * `NotFound` when the budget or the catalog item does not resolve
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn add_line(
    db: &DatabaseConnection,
    actor: &Principal,
    budget_id: i64,
    item: CatalogItem,
    quantity: i32,
) -> Result<BudgetLine> {
    actor.require_staff("add budget line")?;
    validate_quantity(quantity)?;

    let txn = db.begin().await?;
    let budget = lifecycle::find_visible::<Budget, _>(&txn, budget_id).await?;
    let unit_cost = catalog::current_unit_cost(&txn, item).await?;
    let line_total = amount::line_total(unit_cost, quantity)?;
    let now = chrono::Utc::now();

    let line: BudgetLine = match item {
        CatalogItem::LaborType(labor_type_id) => budget_labor_line::ActiveModel {
            budget_id: Set(budget_id),
            labor_type_id: Set(labor_type_id),
            quantity: Set(quantity),
            unit_cost_snapshot: Set(unit_cost),
            line_total: Set(line_total),
            active: Set(true),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
        .into(),
        CatalogItem::Repuesto(repuesto_id) => budget_part_line::ActiveModel {
            budget_id: Set(budget_id),
            repuesto_id: Set(repuesto_id),
            quantity: Set(quantity),
            unit_cost_snapshot: Set(unit_cost),
            line_total: Set(line_total),
            active: Set(true),
            deleted_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?
        .into(),
    };

    let budget = recompute_total(&txn, &budget).await?;
    txn.commit().await?;

    info!(budget_id, line = ?line.line, %line_total, total = %budget.total, "budget line added");
    Ok(line)
}

/// Changes a line's quantity and/or catalog item, then reprices it.
///
/// The unit cost is re-snapshotted only when the catalog item changes; a
/// quantity change keeps the original snapshot.
#[instrument(skip(db, actor), fields(actor = actor.id))]
pub async fn update_line(
    db: &DatabaseConnection,
    actor: &Principal,
    line: LineRef,
    update: LineUpdate,
) -> Result<BudgetLine> {
    actor.require_staff("update budget line")?;
    if update.quantity.is_none() && update.catalog_item_id.is_none() {
        return Err(Error::validation("Line update has no fields to change"));
    }
    if let Some(quantity) = update.quantity {
        validate_quantity(quantity)?;
    }

    let txn = db.begin().await?;
    let now = chrono::Utc::now();
    let budget: budget::Model;
    let updated: BudgetLine = match line {
        LineRef::Labor(id) => {
            let current = lifecycle::find_visible::<BudgetLaborLine, _>(&txn, id).await?;
            budget = lifecycle::find_visible::<Budget, _>(&txn, current.budget_id).await?;

            let labor_type_id = update.catalog_item_id.unwrap_or(current.labor_type_id);
            let unit_cost = if labor_type_id == current.labor_type_id {
                current.unit_cost_snapshot
            } else {
                catalog::current_unit_cost(&txn, CatalogItem::LaborType(labor_type_id)).await?
            };
            let quantity = update.quantity.unwrap_or(current.quantity);

            let mut model: budget_labor_line::ActiveModel = current.into();
            model.labor_type_id = Set(labor_type_id);
            model.quantity = Set(quantity);
            model.unit_cost_snapshot = Set(unit_cost);
            model.line_total = Set(amount::line_total(unit_cost, quantity)?);
            model.updated_at = Set(now);
            model.update(&txn).await?.into()
        }
        LineRef::Part(id) => {
            let current = lifecycle::find_visible::<BudgetPartLine, _>(&txn, id).await?;
            budget = lifecycle::find_visible::<Budget, _>(&txn, current.budget_id).await?;

            let repuesto_id = update.catalog_item_id.unwrap_or(current.repuesto_id);
            let unit_cost = if repuesto_id == current.repuesto_id {
                current.unit_cost_snapshot
            } else {
                catalog::current_unit_cost(&txn, CatalogItem::Repuesto(repuesto_id)).await?
            };
            let quantity = update.quantity.unwrap_or(current.quantity);

            let mut model: budget_part_line::ActiveModel = current.into();
            model.repuesto_id = Set(repuesto_id);
            model.quantity = Set(quantity);
            model.unit_cost_snapshot = Set(unit_cost);
            model.line_total = Set(amount::line_total(unit_cost, quantity)?);
            model.updated_at = Set(now);
            model.update(&txn).await?.into()
        }
    };

    recompute_total(&txn, &budget).await?;
    txn.commit().await?;

    info!(line = ?updated.line, line_total = %updated.line_total, "budget line updated");
    Ok(updated)
}

/// Owning budget of a line. Either may be inactive or deleted.
async fn line_budget<C>(db: &C, line: LineRef) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let budget_id = match line {
        LineRef::Labor(id) => lifecycle::find::<BudgetLaborLine, _>(db, id, Lookup::IncludeInactive)
            .await?
            .budget_id,
        LineRef::Part(id) => lifecycle::find::<BudgetPartLine, _>(db, id, Lookup::IncludeInactive)
            .await?
            .budget_id,
    };
    lifecycle::find::<Budget, _>(db, budget_id, Lookup::IncludeInactive).await
}

async fn load_line<C>(db: &C, line: LineRef) -> Result<BudgetLine>
where
    C: ConnectionTrait,
{
    Ok(match line {
        LineRef::Labor(id) => {
            lifecycle::find::<BudgetLaborLine, _>(db, id, Lookup::IncludeInactive)
                .await?
                .into()
        }
        LineRef::Part(id) => {
            lifecycle::find::<BudgetPartLine, _>(db, id, Lookup::IncludeInactive)
                .await?
                .into()
        }
    })
}

/// Flips a line's `active` flag and recomputes the budget total.
pub async fn toggle_line_active(
    db: &DatabaseConnection,
    actor: &Principal,
    line: LineRef,
    lookup: Lookup,
) -> Result<BudgetLine> {
    actor.require_staff("toggle budget line")?;

    let txn = db.begin().await?;
    let budget = line_budget(&txn, line).await?;
    match line {
        LineRef::Labor(id) => {
            lifecycle::toggle_active::<BudgetLaborLine, _>(&txn, actor, id, lookup).await?;
        }
        LineRef::Part(id) => {
            lifecycle::toggle_active::<BudgetPartLine, _>(&txn, actor, id, lookup).await?;
        }
    }
    recompute_total(&txn, &budget).await?;
    let toggled = load_line(&txn, line).await?;
    txn.commit().await?;
    Ok(toggled)
}

/// Soft-deletes a line and recomputes the budget total.
pub async fn soft_delete_line(
    db: &DatabaseConnection,
    actor: &Principal,
    line: LineRef,
) -> Result<()> {
    actor.require_staff("delete budget line")?;

    let txn = db.begin().await?;
    let budget = line_budget(&txn, line).await?;
    match line {
        LineRef::Labor(id) => lifecycle::soft_delete::<BudgetLaborLine, _>(&txn, actor, id).await?,
        LineRef::Part(id) => lifecycle::soft_delete::<BudgetPartLine, _>(&txn, actor, id).await?,
    }
    recompute_total(&txn, &budget).await?;
    txn.commit().await?;
    Ok(())
}

/// Restores a soft-deleted line and recomputes the budget total.
pub async fn restore_line(
    db: &DatabaseConnection,
    actor: &Principal,
    line: LineRef,
) -> Result<BudgetLine> {
    actor.require_staff("restore budget line")?;

    let txn = db.begin().await?;
    let budget = line_budget(&txn, line).await?;
    let restored: BudgetLine = match line {
        LineRef::Labor(id) => lifecycle::restore::<BudgetLaborLine, _>(&txn, actor, id)
            .await?
            .into(),
        LineRef::Part(id) => lifecycle::restore::<BudgetPartLine, _>(&txn, actor, id)
            .await?
            .into(),
    };
    recompute_total(&txn, &budget).await?;
    txn.commit().await?;
    Ok(restored)
}

/// Recomputes and persists a budget's total from its active lines.
///
/// `read` is the budget as the caller saw it before mutating lines. The write
/// only applies while `version` still matches it; otherwise this fails with
/// `ConcurrentModification` and the caller's transaction rolls back.
///
/// # Errors
/// * `Validation` when the total no longer fits a money column
pub async fn recompute_total<C>(db: &C, read: &budget::Model) -> Result<budget::Model>
where
    C: ConnectionTrait,
{
    let budget_id = read.id;

    let labor_lines = BudgetLaborLine::find()
        .filter(budget_labor_line::Column::BudgetId.eq(budget_id))
        .filter(budget_labor_line::Column::Active.eq(true))
        .all(db)
        .await?;
    let part_lines = BudgetPartLine::find()
        .filter(budget_part_line::Column::BudgetId.eq(budget_id))
        .filter(budget_part_line::Column::Active.eq(true))
        .all(db)
        .await?;

    let total = amount::total(
        labor_lines
            .iter()
            .map(|line| line.line_total)
            .chain(part_lines.iter().map(|line| line.line_total)),
    )?;

    let result = Budget::update_many()
        .col_expr(budget::Column::Total, Expr::value(total))
        .col_expr(budget::Column::Version, Expr::col(budget::Column::Version).add(1))
        .col_expr(budget::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(budget::Column::Id.eq(budget_id))
        .filter(budget::Column::Version.eq(read.version))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::ConcurrentModification {
            entity: "budget",
            id: budget_id,
        });
    }

    debug!(budget_id, %total, version = read.version + 1, "budget total recomputed");
    lifecycle::find::<Budget, _>(db, budget_id, Lookup::IncludeInactive).await
}

/// Persisted total and active lines of a visible budget.
pub async fn get_budget_summary(db: &DatabaseConnection, budget_id: i64) -> Result<BudgetSummary> {
    let budget = lifecycle::find_visible::<Budget, _>(db, budget_id).await?;

    let labor_lines = BudgetLaborLine::find()
        .filter(budget_labor_line::Column::BudgetId.eq(budget_id))
        .filter(budget_labor_line::Column::Active.eq(true))
        .order_by_asc(budget_labor_line::Column::Id)
        .all(db)
        .await?;
    let part_lines = BudgetPartLine::find()
        .filter(budget_part_line::Column::BudgetId.eq(budget_id))
        .filter(budget_part_line::Column::Active.eq(true))
        .order_by_asc(budget_part_line::Column::Id)
        .all(db)
        .await?;

    let lines: Vec<BudgetLine> = labor_lines
        .into_iter()
        .map(BudgetLine::from)
        .chain(part_lines.into_iter().map(BudgetLine::from))
        .collect();

    Ok(BudgetSummary {
        budget_id,
        total: budget.total,
        line_count: lines.len(),
        lines,
    })
}

/// What a line would cost at today's catalog price. Never persisted.
pub async fn preview_line_total(
    db: &DatabaseConnection,
    item: CatalogItem,
    quantity: i32,
) -> Result<Decimal> {
    validate_quantity(quantity)?;
    let unit_cost = catalog::current_unit_cost(db, item).await?;
    amount::line_total(unit_cost, quantity)
}

//! Order repository

use shared::models::{Order, OrderStatus};
use sqlx::SqlitePool;

use super::{RepoResult, audit};
use crate::audit::types::NewAuditEntry;
use crate::db::models::OrderRow;

const COLUMNS: &str = "id, tenant_id, session_id, status, total, payment_method, items, settlement_ref, settled_at, created_at, updated_at";

/// Insert an order together with its `CREATED` audit head entry in one
/// transaction, so the head invariant holds even if the process dies
/// between the two writes.
pub async fn insert_with_audit(
    pool: &SqlitePool,
    order: &Order,
    head: &NewAuditEntry,
) -> RepoResult<()> {
    let items_json = serde_json::to_string(&order.items)
        .map_err(|e| super::RepoError::Database(format!("Failed to serialize items: {e}")))?;

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO orders (id, tenant_id, session_id, status, total, payment_method, items, settlement_ref, settled_at, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&order.id)
    .bind(&order.tenant_id)
    .bind(&order.session_id)
    .bind(order.status.as_str())
    .bind(order.total)
    .bind(order.payment_method.as_str())
    .bind(items_json)
    .bind(&order.settlement_ref)
    .bind(order.settled_at)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut *tx)
    .await?;

    audit::append(&mut *tx, head).await?;

    tx.commit().await?;
    Ok(())
}

pub async fn find_by_id(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
) -> RepoResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE tenant_id = ? AND id = ?"
    ))
    .bind(tenant_id)
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(Order::try_from).transpose()
}

pub async fn find_all(
    pool: &SqlitePool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE tenant_id = ? ORDER BY created_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Every order bound to a session, regardless of status. Used for the live
/// view of a closed session (discrepancy detection after reopens).
pub async fn find_by_session(pool: &SqlitePool, session_id: &str) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE session_id = ? ORDER BY created_at ASC"
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Delivered orders of a session: the set the close algorithm counts.
pub async fn find_delivered_by_session(
    pool: &SqlitePool,
    session_id: &str,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders WHERE session_id = ? AND status = 'delivered' ORDER BY created_at ASC"
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Delivered orders with no settlement marker. NULL and empty string count
/// equivalently as "absent": legacy rows carry both shapes.
pub async fn find_unsettled(pool: &SqlitePool, tenant_id: &str) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders
         WHERE tenant_id = ? AND status = 'delivered'
           AND (settlement_ref IS NULL OR TRIM(settlement_ref) = '')
         ORDER BY created_at ASC"
    ))
    .bind(tenant_id)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Settled-outcome orders (delivered or completed) in a time window, for
/// date-range reports.
pub async fn find_by_date_range(
    pool: &SqlitePool,
    tenant_id: &str,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {COLUMNS} FROM orders
         WHERE tenant_id = ? AND created_at >= ? AND created_at < ?
           AND status IN ('delivered', 'completed')
         ORDER BY created_at ASC"
    ))
    .bind(tenant_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}

/// Workflow status transition, guarded on the expected current status so a
/// concurrent close/reopen cannot be silently overwritten.
pub async fn update_status(
    pool: &SqlitePool,
    tenant_id: &str,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders SET status = ?, updated_at = ? WHERE tenant_id = ? AND id = ? AND status = ?",
    )
    .bind(to.as_str())
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .bind(from.as_str())
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Stamp the settlement marker on a delivered order (close step 7).
/// Guarded on `status = 'delivered'`; returns false if the order moved.
pub async fn settle(
    pool: &SqlitePool,
    id: &str,
    settlement_ref: &str,
    now: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders
         SET status = 'completed', settlement_ref = ?, settled_at = ?, updated_at = ?
         WHERE id = ? AND status = 'delivered'",
    )
    .bind(settlement_ref)
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Reverse the settlement marker (reopen). Completed status reverts to
/// delivered; a pending-cut order keeps its status.
pub async fn clear_settlement(pool: &SqlitePool, tenant_id: &str, id: &str, now: i64) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE orders
         SET settlement_ref = NULL,
             settled_at = NULL,
             status = CASE WHEN status = 'completed' THEN 'delivered' ELSE status END,
             updated_at = ?
         WHERE tenant_id = ? AND id = ?",
    )
    .bind(now)
    .bind(tenant_id)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

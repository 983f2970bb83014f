//! Cash session repository

use shared::models::{CashSession, SessionStatus};
use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::SessionRow;

const COLUMNS: &str = "id, tenant_id, employee_id, estado, initial_float, expected_amount, declared_amount, difference, opened_at, closed_at";

pub async fn find_by_id(pool: &SqlitePool, id: &str) -> RepoResult<Option<CashSession>> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM cash_session WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    row.map(CashSession::try_from).transpose()
}

/// The per-tenant open session, if any. "No open session" is a normal
/// outcome, not an error.
pub async fn find_open(pool: &SqlitePool, tenant_id: &str) -> RepoResult<Option<CashSession>> {
    let row = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM cash_session WHERE tenant_id = ? AND estado = 'open' LIMIT 1"
    ))
    .bind(tenant_id)
    .fetch_optional(pool)
    .await?;
    row.map(CashSession::try_from).transpose()
}

pub async fn insert(pool: &SqlitePool, session: &CashSession) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO cash_session (id, tenant_id, employee_id, estado, initial_float, opened_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&session.id)
    .bind(&session.tenant_id)
    .bind(&session.employee_id)
    .bind(session.estado.as_str())
    .bind(session.initial_float)
    .bind(session.opened_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_all(
    pool: &SqlitePool,
    tenant_id: &str,
    limit: i32,
    offset: i32,
) -> RepoResult<Vec<CashSession>> {
    let rows = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM cash_session WHERE tenant_id = ? ORDER BY opened_at DESC LIMIT ? OFFSET ?"
    ))
    .bind(tenant_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(CashSession::try_from).collect()
}

pub async fn find_by_date_range(
    pool: &SqlitePool,
    tenant_id: &str,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<CashSession>> {
    let rows = sqlx::query_as::<_, SessionRow>(&format!(
        "SELECT {COLUMNS} FROM cash_session WHERE tenant_id = ? AND opened_at >= ? AND opened_at < ? ORDER BY opened_at DESC"
    ))
    .bind(tenant_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;
    rows.into_iter().map(CashSession::try_from).collect()
}

/// Persist the close. Guarded on `estado = 'open'` so a session can only
/// transition open→closed once; returns whether the row was actually closed.
pub async fn close(
    pool: &SqlitePool,
    id: &str,
    expected_amount: f64,
    declared_amount: f64,
    difference: f64,
    closed_at: i64,
) -> RepoResult<bool> {
    let result = sqlx::query(
        "UPDATE cash_session
         SET estado = ?, expected_amount = ?, declared_amount = ?, difference = ?, closed_at = ?
         WHERE id = ? AND estado = 'open'",
    )
    .bind(SessionStatus::Closed.as_str())
    .bind(expected_amount)
    .bind(declared_amount)
    .bind(difference)
    .bind(closed_at)
    .bind(id)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

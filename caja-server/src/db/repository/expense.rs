//! Expense repository

use shared::models::Expense;
use sqlx::SqlitePool;

use super::RepoResult;
use crate::db::models::ExpenseRow;

const COLUMNS: &str = "id, tenant_id, session_id, amount, category, description, created_at";

pub async fn insert(pool: &SqlitePool, expense: &Expense) -> RepoResult<()> {
    sqlx::query(
        "INSERT INTO expense (id, tenant_id, session_id, amount, category, description, created_at)
         VALUES (?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&expense.id)
    .bind(&expense.tenant_id)
    .bind(&expense.session_id)
    .bind(expense.amount)
    .bind(&expense.category)
    .bind(&expense.description)
    .bind(expense.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn find_by_session(pool: &SqlitePool, session_id: &str) -> RepoResult<Vec<Expense>> {
    let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
        "SELECT {COLUMNS} FROM expense WHERE session_id = ? ORDER BY created_at ASC"
    ))
    .bind(session_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Expense::from).collect())
}

pub async fn find_by_date_range(
    pool: &SqlitePool,
    tenant_id: &str,
    start_millis: i64,
    end_millis: i64,
) -> RepoResult<Vec<Expense>> {
    let rows = sqlx::query_as::<_, ExpenseRow>(&format!(
        "SELECT {COLUMNS} FROM expense WHERE tenant_id = ? AND created_at >= ? AND created_at < ? ORDER BY created_at ASC"
    ))
    .bind(tenant_id)
    .bind(start_millis)
    .bind(end_millis)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Expense::from).collect())
}

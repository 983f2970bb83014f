//! Expense row model

use shared::models::Expense;
use sqlx::FromRow;

/// Raw `expense` row
#[derive(Debug, Clone, FromRow)]
pub struct ExpenseRow {
    pub id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub created_at: i64,
}

impl From<ExpenseRow> for Expense {
    fn from(row: ExpenseRow) -> Self {
        Expense {
            id: row.id,
            tenant_id: row.tenant_id,
            session_id: row.session_id,
            amount: row.amount,
            category: row.category,
            description: row.description,
            created_at: row.created_at,
        }
    }
}

//! Expense model (gasto)

use serde::{Deserialize, Serialize};

/// Expense: always belongs to exactly one session, immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Expense {
    pub id: String,
    pub tenant_id: String,
    pub session_id: String,
    pub amount: f64,
    pub category: String,
    pub description: String,
    pub created_at: i64,
}

/// Create expense payload. The session id is resolved server-side from the
/// currently open session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpenseCreate {
    pub amount: f64,
    pub category: String,
    pub description: String,
}

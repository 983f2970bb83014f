//! Cash session row model

use shared::models::{CashSession, SessionStatus};
use sqlx::FromRow;

use crate::db::repository::RepoError;

/// Raw `cash_session` row
#[derive(Debug, Clone, FromRow)]
pub struct SessionRow {
    pub id: String,
    pub tenant_id: String,
    pub employee_id: Option<String>,
    pub estado: String,
    pub initial_float: f64,
    pub expected_amount: Option<f64>,
    pub declared_amount: Option<f64>,
    pub difference: Option<f64>,
    pub opened_at: i64,
    pub closed_at: Option<i64>,
}

impl TryFrom<SessionRow> for CashSession {
    type Error = RepoError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        let estado = SessionStatus::parse(&row.estado).ok_or_else(|| {
            RepoError::Database(format!(
                "Invalid estado '{}' on session {}",
                row.estado, row.id
            ))
        })?;
        Ok(CashSession {
            id: row.id,
            tenant_id: row.tenant_id,
            employee_id: row.employee_id,
            estado,
            initial_float: row.initial_float,
            expected_amount: row.expected_amount,
            declared_amount: row.declared_amount,
            difference: row.difference,
            opened_at: row.opened_at,
            closed_at: row.closed_at,
        })
    }
}

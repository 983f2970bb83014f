//! Order row model

use shared::models::{LineItem, Order, OrderStatus, PaymentMethod};
use sqlx::FromRow;

use crate::db::repository::RepoError;

/// Raw `orders` row. Line items are a JSON snapshot column.
#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
    pub id: String,
    pub tenant_id: String,
    pub session_id: Option<String>,
    pub status: String,
    pub total: f64,
    pub payment_method: String,
    pub items: String,
    pub settlement_ref: Option<String>,
    pub settled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepoError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::parse(&row.status).ok_or_else(|| {
            RepoError::Database(format!("Invalid status '{}' on order {}", row.status, row.id))
        })?;
        let payment_method = PaymentMethod::parse(&row.payment_method).ok_or_else(|| {
            RepoError::Database(format!(
                "Invalid payment_method '{}' on order {}",
                row.payment_method, row.id
            ))
        })?;
        let items: Vec<LineItem> = serde_json::from_str(&row.items).map_err(|e| {
            RepoError::Database(format!("Corrupt items snapshot on order {}: {e}", row.id))
        })?;
        Ok(Order {
            id: row.id,
            tenant_id: row.tenant_id,
            session_id: row.session_id,
            status,
            total: row.total,
            payment_method,
            items,
            settlement_ref: row.settlement_ref,
            settled_at: row.settled_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

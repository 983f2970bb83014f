//! 订单与班次绑定
//!
//! Orders are created against the tenant's open session and carry their
//! monetary snapshot from creation onward. The `CREATED` audit head is
//! written in the same transaction as the order row, so every order's trail
//! starts with it.

pub mod reopen;

use std::sync::Arc;

use shared::event;
use shared::models::{Order, OrderCreate, OrderStatus};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditService, NewAuditEntry};
use crate::auth::CurrentUser;
use crate::db::repository::{order, session};
use crate::notify::ChangeNotifier;
use crate::utils::validation::{MAX_NAME_LEN, validate_cash, validate_required_text};
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "order";

/// 订单服务
#[derive(Clone)]
pub struct OrderBinder {
    pool: SqlitePool,
    audit: Arc<AuditService>,
    notifier: ChangeNotifier,
}

impl std::fmt::Debug for OrderBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderBinder").finish_non_exhaustive()
    }
}

impl OrderBinder {
    pub fn new(pool: SqlitePool, audit: Arc<AuditService>, notifier: ChangeNotifier) -> Self {
        Self {
            pool,
            audit,
            notifier,
        }
    }

    /// 创建订单
    ///
    /// Requires an open session; the order binds to it for its whole life.
    /// The total is computed server-side from the submitted line items.
    pub async fn create(&self, user: &CurrentUser, req: OrderCreate) -> AppResult<Order> {
        if req.items.is_empty() {
            return Err(AppError::validation("Order must contain at least one item"));
        }
        for item in &req.items {
            validate_required_text(&item.name, "item name", MAX_NAME_LEN)?;
            validate_cash(item.unit_price, "unit_price")?;
            if !item.quantity.is_finite() || item.quantity <= 0.0 {
                return Err(AppError::validation("Item quantity must be positive"));
            }
        }

        let open = session::find_open(&self.pool, &user.tenant_id)
            .await?
            .ok_or_else(|| {
                AppError::business_rule("No open session: open the register before taking orders")
            })?;

        let total: f64 = req.items.iter().map(|i| i.line_total()).sum();
        let now = shared::util::now_millis();
        let new_order = Order {
            id: Uuid::new_v4().to_string(),
            tenant_id: user.tenant_id.clone(),
            session_id: Some(open.id.clone()),
            status: OrderStatus::Pending,
            total,
            payment_method: req.payment_method,
            items: req.items,
            settlement_ref: None,
            settled_at: None,
            created_at: now,
            updated_at: now,
        };

        // CREATED head entry committed atomically with the order row
        let head = NewAuditEntry::new(
            &user.tenant_id,
            RESOURCE,
            &new_order.id,
            AuditAction::Created,
            serde_json::json!({
                "session_id": open.id,
                "total": total,
                "payment_method": new_order.payment_method,
                "item_count": new_order.items.len(),
            }),
        )
        .by(&user.id, &user.display_name);
        order::insert_with_audit(&self.pool, &new_order, &head).await?;

        self.notifier
            .publish(event::ORDER_CREATED, &user.tenant_id, &new_order.id, Some(&new_order));

        tracing::info!(
            "Order {} created in session {} (total {:.2})",
            new_order.id,
            open.id,
            total
        );
        Ok(new_order)
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> AppResult<Order> {
        order::find_by_id(&self.pool, tenant_id, id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Order {id} not found")))
    }

    pub async fn list(&self, tenant_id: &str, limit: i32, offset: i32) -> AppResult<Vec<Order>> {
        Ok(order::find_all(&self.pool, tenant_id, limit, offset).await?)
    }

    /// Delivered orders with no settlement marker, across all sessions.
    /// This is the self-healing view: anything a close failed to settle
    /// shows up here until the next close picks it up.
    pub async fn unsettled(&self, tenant_id: &str) -> AppResult<Vec<Order>> {
        Ok(order::find_unsettled(&self.pool, tenant_id).await?)
    }

    /// 状态流转
    ///
    /// Completed is reserved for settlement: it is only ever reached through
    /// a session close, never through this endpoint. Terminal statuses do
    /// not transition further.
    pub async fn update_status(
        &self,
        user: &CurrentUser,
        id: &str,
        to: OrderStatus,
    ) -> AppResult<Order> {
        let existing = self.get(&user.tenant_id, id).await?;

        if to == OrderStatus::Completed {
            return Err(AppError::business_rule(
                "Orders are completed by closing the session, not directly",
            ));
        }
        if matches!(existing.status, OrderStatus::Completed | OrderStatus::Cancelled) {
            return Err(AppError::business_rule(format!(
                "Order is {} and cannot change status",
                existing.status.as_str()
            )));
        }
        if existing.status == to {
            return Ok(existing);
        }

        let now = shared::util::now_millis();
        let updated = order::update_status(&self.pool, &user.tenant_id, id, existing.status, to, now)
            .await?;
        if !updated {
            return Err(AppError::conflict("Order status changed concurrently"));
        }

        self.audit
            .log(
                NewAuditEntry::new(
                    &user.tenant_id,
                    RESOURCE,
                    id,
                    AuditAction::StatusChange,
                    serde_json::json!({
                        "from": existing.status.as_str(),
                        "to": to.as_str(),
                    }),
                )
                .by(&user.id, &user.display_name),
            )
            .await;

        Ok(Order {
            status: to,
            updated_at: now,
            ..existing
        })
    }
}

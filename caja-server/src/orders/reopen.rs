//! 管理员重开订单
//!
//! Reversing a settlement marker is an administrator-only correction. The
//! order returns to `delivered` and to the unsettled pool; the closed
//! session's recorded figures are never rewritten, readers surface the
//! divergence as a discrepancy instead.

use shared::event;
use shared::models::{Order, OrderStatus, Settlement};

use super::OrderBinder;
use crate::audit::{AuditAction, NewAuditEntry};
use crate::auth::CurrentUser;
use crate::db::repository::order;
use crate::utils::{AppError, AppResult};

impl OrderBinder {
    /// 重开已结算订单
    ///
    /// Clears the settlement marker and reverts `completed` to `delivered`.
    /// The next session close settles the order again under its own id.
    pub async fn reopen(&self, user: &CurrentUser, id: &str) -> AppResult<Order> {
        if !user.is_admin {
            return Err(AppError::forbidden("Reopening orders requires administrator role"));
        }

        let existing = self.get(&user.tenant_id, id).await?;
        let previous_ref = match existing.settlement() {
            Settlement::Settled { settlement_ref } => settlement_ref,
            _ => {
                return Err(AppError::business_rule(format!(
                    "Order {id} is not settled, nothing to reopen"
                )));
            }
        };

        let now = shared::util::now_millis();
        let updated = order::clear_settlement(&self.pool, &user.tenant_id, id, now).await?;
        if !updated {
            return Err(AppError::not_found(format!("Order {id} not found")));
        }

        self.audit
            .log(
                NewAuditEntry::new(
                    &user.tenant_id,
                    super::RESOURCE,
                    id,
                    AuditAction::Reopened,
                    serde_json::json!({
                        "previous_settlement_ref": previous_ref,
                        "previous_status": existing.status.as_str(),
                    }),
                )
                .by(&user.id, &user.display_name),
            )
            .await;
        self.notifier
            .publish::<Order>(event::ORDER_REOPENED, &user.tenant_id, id, None);

        tracing::info!(
            "Order {} reopened by {} (was settled under {:?})",
            id,
            user.display_name,
            previous_ref
        );

        let status = if existing.status == OrderStatus::Completed {
            OrderStatus::Delivered
        } else {
            existing.status
        };
        Ok(Order {
            status,
            settlement_ref: None,
            settled_at: None,
            updated_at: now,
            ..existing
        })
    }
}

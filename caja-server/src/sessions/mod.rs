//! 收银班次生命周期
//!
//! Each tenant has at most one open session. Exclusivity is enforced with a
//! per-tenant async lock around the check-then-insert on open and the whole
//! close sequence, so two concurrent opens can never both succeed.
//!
//! The close commit happens before order settlement: once the session row is
//! closed its figures are final, and any order that fails to settle stays
//! delivered and resurfaces through the unsettled query.

use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use shared::event;
use shared::models::{CashSession, Expense, FinancialSummary, Order, SessionClose, SessionOpen};
use sqlx::SqlitePool;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::audit::{AuditAction, AuditService, NewAuditEntry};
use crate::auth::CurrentUser;
use crate::db::repository::{expense, order, session};
use crate::notify::ChangeNotifier;
use crate::reconcile;
use crate::utils::validation::validate_cash;
use crate::utils::{AppError, AppResult};

const RESOURCE: &str = "session";

/// Result of a committed close.
#[derive(Debug, Clone, Serialize)]
pub struct CloseOutcome {
    pub session: CashSession,
    pub summary: FinancialSummary,
    /// Orders whose settlement marker could not be written. They remain
    /// delivered and will be picked up by the unsettled query.
    pub unsettled_order_ids: Vec<String>,
}

/// Preview of what a close would record, without committing anything.
#[derive(Debug, Clone, Serialize)]
pub struct ClosePreview {
    pub session_id: String,
    pub summary: FinancialSummary,
    pub initial_float: f64,
    /// Hidden for non-admin operators (blind count).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_amount: Option<f64>,
}

/// 班次管理器
#[derive(Clone)]
pub struct SessionManager {
    pool: SqlitePool,
    audit: Arc<AuditService>,
    notifier: ChangeNotifier,
    /// Per-tenant open/close serialization.
    tenant_locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager").finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(pool: SqlitePool, audit: Arc<AuditService>, notifier: ChangeNotifier) -> Self {
        Self {
            pool,
            audit,
            notifier,
            tenant_locks: Arc::new(DashMap::new()),
        }
    }

    fn tenant_lock(&self, tenant_id: &str) -> Arc<Mutex<()>> {
        self.tenant_locks
            .entry(tenant_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// 开班
    ///
    /// Fails with a conflict if the tenant already has an open session.
    pub async fn open(&self, user: &CurrentUser, req: SessionOpen) -> AppResult<CashSession> {
        validate_cash(req.initial_float, "initial_float")?;

        let lock = self.tenant_lock(&user.tenant_id);
        let _guard = lock.lock().await;

        if let Some(existing) = session::find_open(&self.pool, &user.tenant_id).await? {
            return Err(AppError::conflict(format!(
                "Session {} is already open for this register",
                existing.id
            )));
        }

        let now = shared::util::now_millis();
        let new_session = CashSession {
            id: Uuid::new_v4().to_string(),
            tenant_id: user.tenant_id.clone(),
            employee_id: req.employee_id.or_else(|| Some(user.id.clone())),
            estado: shared::models::SessionStatus::Open,
            initial_float: req.initial_float,
            expected_amount: None,
            declared_amount: None,
            difference: None,
            opened_at: now,
            closed_at: None,
        };
        session::insert(&self.pool, &new_session).await?;

        self.audit
            .log(
                NewAuditEntry::new(
                    &user.tenant_id,
                    RESOURCE,
                    &new_session.id,
                    AuditAction::SessionOpened,
                    serde_json::json!({ "initial_float": new_session.initial_float }),
                )
                .by(&user.id, &user.display_name),
            )
            .await;
        self.notifier.publish(
            event::SESSION_OPENED,
            &user.tenant_id,
            &new_session.id,
            Some(&new_session),
        );

        tracing::info!(
            "Session {} opened for tenant {} (float {:.2})",
            new_session.id,
            user.tenant_id,
            new_session.initial_float
        );
        Ok(new_session)
    }

    /// 当前开着的班次，没有则为 None
    pub async fn current(&self, tenant_id: &str) -> AppResult<Option<CashSession>> {
        Ok(session::find_open(&self.pool, tenant_id).await?)
    }

    pub async fn get(&self, tenant_id: &str, id: &str) -> AppResult<CashSession> {
        let found = session::find_by_id(&self.pool, id)
            .await?
            .filter(|s| s.tenant_id == tenant_id)
            .ok_or_else(|| AppError::not_found(format!("Session {id} not found")))?;
        Ok(found)
    }

    pub async fn list(&self, tenant_id: &str, limit: i32, offset: i32) -> AppResult<Vec<CashSession>> {
        Ok(session::find_all(&self.pool, tenant_id, limit, offset).await?)
    }

    /// 关班预览
    ///
    /// `reveal_expected` controls the blind count: cashiers declare without
    /// seeing the target figure, administrators see it.
    pub async fn close_preview(
        &self,
        tenant_id: &str,
        reveal_expected: bool,
    ) -> AppResult<ClosePreview> {
        let open = session::find_open(&self.pool, tenant_id)
            .await?
            .ok_or_else(|| AppError::business_rule("No open session to close"))?;

        let (orders, expenses) = self.session_figures(&open.id).await?;
        let summary = reconcile::summarize(&orders, &expenses);
        let expected = reconcile::expected_amount(
            open.initial_float,
            summary.total_sales,
            summary.total_expenses,
        );

        Ok(ClosePreview {
            session_id: open.id,
            summary,
            initial_float: open.initial_float,
            expected_amount: reveal_expected.then_some(expected),
        })
    }

    /// 关班
    ///
    /// Computes expected and difference from the session's delivered orders
    /// and expenses, commits the close, then settles the counted orders
    /// best-effort. A settlement failure never unwinds the close.
    pub async fn close(&self, user: &CurrentUser, req: SessionClose) -> AppResult<CloseOutcome> {
        validate_cash(req.declared_amount, "declared_amount")?;

        let lock = self.tenant_lock(&user.tenant_id);
        let _guard = lock.lock().await;

        let open = session::find_open(&self.pool, &user.tenant_id)
            .await?
            .ok_or_else(|| AppError::business_rule("No open session to close"))?;

        let (orders, expenses) = self.session_figures(&open.id).await?;
        let summary = reconcile::summarize(&orders, &expenses);
        let expected = reconcile::expected_amount(
            open.initial_float,
            summary.total_sales,
            summary.total_expenses,
        );
        let difference = req.declared_amount - expected;
        let now = shared::util::now_millis();

        let closed = session::close(&self.pool, &open.id, expected, req.declared_amount, difference, now)
            .await?;
        if !closed {
            // Lost a race despite the lock (e.g. closed through another node)
            return Err(AppError::conflict("Session is no longer open"));
        }

        // Settlement after the commit: the session figures are frozen above,
        // an order that fails here stays delivered and unsettled.
        let mut unsettled_order_ids = Vec::new();
        for counted in &orders {
            match order::settle(&self.pool, &counted.id, &open.id, now).await {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(
                        "Order {} moved out of delivered during close of session {}",
                        counted.id,
                        open.id
                    );
                    unsettled_order_ids.push(counted.id.clone());
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to settle order {} in session {}: {}",
                        counted.id,
                        open.id,
                        e
                    );
                    unsettled_order_ids.push(counted.id.clone());
                }
            }
        }

        let session = CashSession {
            estado: shared::models::SessionStatus::Closed,
            expected_amount: Some(expected),
            declared_amount: Some(req.declared_amount),
            difference: Some(difference),
            closed_at: Some(now),
            ..open
        };

        self.audit
            .log(
                NewAuditEntry::new(
                    &user.tenant_id,
                    RESOURCE,
                    &session.id,
                    AuditAction::SessionClosed,
                    serde_json::json!({
                        "expected_amount": expected,
                        "declared_amount": req.declared_amount,
                        "difference": difference,
                        "order_count": summary.order_count,
                        "unsettled_order_ids": unsettled_order_ids,
                    }),
                )
                .by(&user.id, &user.display_name),
            )
            .await;
        self.notifier
            .publish(event::SESSION_CLOSED, &user.tenant_id, &session.id, Some(&session));

        tracing::info!(
            "Session {} closed: expected {:.2}, declared {:.2}, difference {:.2}",
            session.id,
            expected,
            req.declared_amount,
            difference
        );
        if !unsettled_order_ids.is_empty() {
            tracing::warn!(
                "Session {} closed with {} unsettled order(s): {:?}",
                session.id,
                unsettled_order_ids.len(),
                unsettled_order_ids
            );
        }

        Ok(CloseOutcome {
            session,
            summary,
            unsettled_order_ids,
        })
    }

    /// Recorded figures vs a fresh aggregation over the session's orders.
    /// After an admin reopen the two diverge; the caller surfaces that as a
    /// discrepancy warning, the recorded figures are never rewritten.
    pub async fn summary_for(&self, tenant_id: &str, id: &str) -> AppResult<(CashSession, FinancialSummary)> {
        let found = self.get(tenant_id, id).await?;
        let orders = order::find_by_session(&self.pool, &found.id).await?;
        let counted: Vec<Order> = orders
            .into_iter()
            .filter(|o| {
                matches!(
                    o.status,
                    shared::models::OrderStatus::Delivered | shared::models::OrderStatus::Completed
                )
            })
            .collect();
        let expenses = expense::find_by_session(&self.pool, &found.id).await?;
        let summary = reconcile::summarize(&counted, &expenses);
        Ok((found, summary))
    }

    async fn session_figures(&self, session_id: &str) -> AppResult<(Vec<Order>, Vec<Expense>)> {
        let orders = order::find_delivered_by_session(&self.pool, session_id).await?;
        let expenses = expense::find_by_session(&self.pool, session_id).await?;
        Ok((orders, expenses))
    }
}

//! Order API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{Order, OrderCreate, OrderStatus, Settlement};

use crate::audit::{AuditAction, AuditEntry};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::{AppError, AppResult};

/// Order plus its derived settlement state. Every listing goes through this
/// shape so all views classify identically.
#[derive(Debug, Serialize)]
pub struct OrderView {
    #[serde(flatten)]
    pub order: Order,
    pub settlement: Settlement,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let settlement = order.settlement();
        Self { order, settlement }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    50
}

#[derive(Debug, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

/// Audit entry with its operator-facing label.
#[derive(Debug, Serialize)]
pub struct AuditTrailEntry {
    #[serde(flatten)]
    pub entry: AuditEntry,
    pub display_label: &'static str,
}

fn display_label(action: AuditAction) -> &'static str {
    match action {
        AuditAction::Created => "Apertura",
        AuditAction::StatusChange => "Cambio de estado",
        AuditAction::Edited => "Edición",
        AuditAction::Reopened => "Reapertura",
        AuditAction::SessionOpened => "Apertura de caja",
        AuditAction::SessionClosed => "Cierre de caja",
        AuditAction::ExpenseCreated => "Gasto",
    }
}

/// POST /api/orders - 创建订单（绑定当前班次）
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<OrderCreate>,
) -> AppResult<Json<OrderView>> {
    let order = state.orders.create(&user, payload).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders - 订单列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<OrderView>>> {
    let orders = state
        .orders
        .list(&user.tenant_id, query.limit, query.offset)
        .await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// GET /api/orders/unsettled - 未结算订单（自愈视图）
pub async fn list_unsettled(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Vec<OrderView>>> {
    let orders = state.orders.unsettled(&user.tenant_id).await?;
    Ok(Json(orders.into_iter().map(OrderView::from).collect()))
}

/// GET /api/orders/:id - 单个订单
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderView>> {
    let order = state.orders.get(&user.tenant_id, &id).await?;
    Ok(Json(order.into()))
}

/// PUT /api/orders/:id/status - 状态流转
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(payload): Json<StatusUpdate>,
) -> AppResult<Json<OrderView>> {
    let to = OrderStatus::parse(&payload.status)
        .ok_or_else(|| AppError::validation(format!("Unknown status '{}'", payload.status)))?;
    let order = state.orders.update_status(&user, &id, to).await?;
    Ok(Json(order.into()))
}

/// POST /api/orders/:id/reopen - 管理员重开
pub async fn reopen(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<OrderView>> {
    let order = state.orders.reopen(&user, &id).await?;
    Ok(Json(order.into()))
}

/// GET /api/orders/:id/audit - 审计轨迹（首条恒为 Apertura）
pub async fn audit_trail(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<Vec<AuditTrailEntry>>> {
    // 404 before leaking whether a trail exists for another tenant
    state.orders.get(&user.tenant_id, &id).await?;

    let entries = state.audit.trail("order", &id).await?;
    Ok(Json(
        entries
            .into_iter()
            .map(|entry| AuditTrailEntry {
                display_label: display_label(entry.action),
                entry,
            })
            .collect(),
    ))
}

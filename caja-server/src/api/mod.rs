//! API 路由模块
//!
//! # 结构
//!
//! - [`health`] - 健康检查
//! - [`sessions`] - 班次开关与预览
//! - [`orders`] - 订单、状态流转、重开、审计轨迹
//! - [`expenses`] - 班次支出
//! - [`reports`] - 对账报表
//! - [`audit_log`] - 租户审计日志

pub mod audit_log;
pub mod expenses;
pub mod health;
pub mod orders;
pub mod reports;
pub mod sessions;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

pub fn create_router(state: ServerState) -> Router {
    Router::new()
        .merge(health::router())
        .merge(sessions::router())
        .merge(orders::router())
        .merge(expenses::router())
        .merge(reports::router())
        .merge(audit_log::router())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

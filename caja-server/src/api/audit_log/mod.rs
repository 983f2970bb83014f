//! Audit log API 模块

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Deserialize;

use crate::audit::AuditEntry;
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::utils::AppResult;

pub fn router() -> Router<ServerState> {
    Router::new().route("/api/audit", get(list_recent))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
}

fn default_limit() -> i32 {
    100
}

/// GET /api/audit - 租户最近的审计日志，最新的在前
pub async fn list_recent(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<AuditEntry>>> {
    let entries = state
        .audit
        .recent(&user.tenant_id, query.limit, query.offset)
        .await?;
    Ok(Json(entries))
}

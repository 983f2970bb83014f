//! Session API Handlers

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{CashSession, FinancialSummary, SessionClose, SessionOpen, SessionStatus};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::session;
use crate::sessions::{CloseOutcome, ClosePreview};
use crate::utils::AppResult;
use crate::utils::time;

/// Query params for listing sessions
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_limit")]
    pub limit: i32,
    #[serde(default)]
    pub offset: i32,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

fn default_limit() -> i32 {
    50
}

#[derive(Debug, Serialize)]
pub struct SessionDetail {
    pub session: CashSession,
    /// Fresh aggregation over the session's counted orders
    pub live_summary: FinancialSummary,
    /// True when the recorded close no longer matches the live figures
    pub discrepancy: bool,
}

/// GET /api/sessions - 班次列表
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<CashSession>>> {
    let tz = state.config.timezone;
    let sessions = if let (Some(start), Some(end)) = (query.start_date, query.end_date) {
        let start_date = time::parse_date(&start)?;
        let end_date = time::parse_date(&end)?;
        session::find_by_date_range(
            &state.pool,
            &user.tenant_id,
            time::day_start_millis(start_date, tz),
            time::day_end_millis(end_date, tz),
        )
        .await?
    } else {
        state
            .sessions
            .list(&user.tenant_id, query.limit, query.offset)
            .await?
    };
    Ok(Json(sessions))
}

/// GET /api/sessions/current - 当前开着的班次
pub async fn get_current(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<Option<CashSession>>> {
    let current = state.sessions.current(&user.tenant_id).await?;
    Ok(Json(current))
}

/// GET /api/sessions/:id - 班次详情（含差异检测）
pub async fn get_by_id(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<SessionDetail>> {
    let (session, live_summary) = state.sessions.summary_for(&user.tenant_id, &id).await?;

    let discrepancy = session.estado == SessionStatus::Closed
        && crate::reconcile::close_diverges(&session, &live_summary);

    Ok(Json(SessionDetail {
        session,
        live_summary,
        discrepancy,
    }))
}

/// POST /api/sessions - 开班
pub async fn open(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SessionOpen>,
) -> AppResult<Json<CashSession>> {
    let session = state.sessions.open(&user, payload).await?;
    Ok(Json(session))
}

/// GET /api/sessions/current/close-preview - 关班预览
///
/// 盲点：普通收银员看不到 expected_amount，管理员可以。
pub async fn close_preview(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<ClosePreview>> {
    let preview = state
        .sessions
        .close_preview(&user.tenant_id, user.is_admin)
        .await?;
    Ok(Json(preview))
}

/// POST /api/sessions/current/close - 关班
pub async fn close(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<SessionClose>,
) -> AppResult<Json<CloseOutcome>> {
    let outcome = state.sessions.close(&user, payload).await?;
    Ok(Json(outcome))
}

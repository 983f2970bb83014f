//! Report API Handlers
//!
//! 日期范围按营业时区的天边界解释 (config.timezone)。

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use shared::models::{CashSession, FinancialSummary};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{expense, order, session};
use crate::reconcile;
use crate::utils::AppResult;
use crate::utils::time;

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct RangeReport {
    pub start_date: String,
    pub end_date: String,
    pub summary: FinancialSummary,
    pub sessions: Vec<CashSession>,
}

#[derive(Debug, Serialize)]
pub struct SessionReport {
    pub session: CashSession,
    pub summary: FinancialSummary,
}

/// GET /api/reports/range?start_date=YYYY-MM-DD&end_date=YYYY-MM-DD
///
/// Aggregates settled-outcome orders and expenses across the range,
/// independent of session boundaries.
pub async fn range_summary(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<RangeQuery>,
) -> AppResult<Json<RangeReport>> {
    let tz = state.config.timezone;
    let start = time::day_start_millis(time::parse_date(&query.start_date)?, tz);
    let end = time::day_end_millis(time::parse_date(&query.end_date)?, tz);

    let orders = order::find_by_date_range(&state.pool, &user.tenant_id, start, end).await?;
    let expenses = expense::find_by_date_range(&state.pool, &user.tenant_id, start, end).await?;
    let sessions = session::find_by_date_range(&state.pool, &user.tenant_id, start, end).await?;

    Ok(Json(RangeReport {
        start_date: query.start_date,
        end_date: query.end_date,
        summary: reconcile::summarize(&orders, &expenses),
        sessions,
    }))
}

/// GET /api/reports/sessions/:id - 单班次对账
pub async fn session_summary(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<SessionReport>> {
    let (session, summary) = state.sessions.summary_for(&user.tenant_id, &id).await?;
    Ok(Json(SessionReport { session, summary }))
}

//! Expense API Handlers

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use shared::models::{Expense, ExpenseCreate};
use uuid::Uuid;

use crate::audit::{AuditAction, NewAuditEntry};
use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::repository::{expense, session};
use crate::utils::validation::{
    MAX_NAME_LEN, MAX_NOTE_LEN, validate_cash, validate_required_text,
};
use crate::utils::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub session_id: String,
}

/// POST /api/expenses - 记录支出（绑定当前班次）
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ExpenseCreate>,
) -> AppResult<Json<Expense>> {
    validate_cash(payload.amount, "amount")?;
    validate_required_text(&payload.category, "category", MAX_NAME_LEN)?;
    if payload.description.len() > MAX_NOTE_LEN {
        return Err(AppError::validation(format!(
            "description is too long ({} chars, max {MAX_NOTE_LEN})",
            payload.description.len()
        )));
    }

    let open = session::find_open(&state.pool, &user.tenant_id)
        .await?
        .ok_or_else(|| {
            AppError::business_rule("No open session: expenses bind to the open register")
        })?;

    let new_expense = Expense {
        id: Uuid::new_v4().to_string(),
        tenant_id: user.tenant_id.clone(),
        session_id: open.id.clone(),
        amount: payload.amount,
        category: payload.category,
        description: payload.description,
        created_at: shared::util::now_millis(),
    };
    expense::insert(&state.pool, &new_expense).await?;

    state
        .audit
        .log(
            NewAuditEntry::new(
                &user.tenant_id,
                "expense",
                &new_expense.id,
                AuditAction::ExpenseCreated,
                serde_json::json!({
                    "session_id": open.id,
                    "amount": new_expense.amount,
                    "category": new_expense.category,
                }),
            )
            .by(&user.id, &user.display_name),
        )
        .await;

    Ok(Json(new_expense))
}

/// GET /api/expenses?session_id=... - 某班次的支出
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<Expense>>> {
    // Session must belong to the caller's tenant
    let owner = session::find_by_id(&state.pool, &query.session_id)
        .await?
        .filter(|s| s.tenant_id == user.tenant_id)
        .ok_or_else(|| AppError::not_found(format!("Session {} not found", query.session_id)))?;

    let expenses = expense::find_by_session(&state.pool, &owner.id).await?;
    Ok(Json(expenses))
}

//! Report API 模块 (对账报表)

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/reports", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/range", get(handler::range_summary))
        .route("/sessions/{id}", get(handler::session_summary))
}

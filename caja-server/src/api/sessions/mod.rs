//! Session API 模块 (收银班次)

mod handler;

use axum::{
    Router,
    routing::{get, post},
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/sessions", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::open))
        .route("/current", get(handler::get_current))
        .route("/current/close-preview", get(handler::close_preview))
        .route("/current/close", post(handler::close))
        .route("/{id}", get(handler::get_by_id))
}

pub mod form;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::pipeline::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(form::index_handler))
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/introductions",
            post(handlers::handle_create_introduction),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}

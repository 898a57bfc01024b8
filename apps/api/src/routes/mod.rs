pub mod health;
pub mod threads;

use axum::{
    routing::{get, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/threads", post(threads::handle_start))
        .route("/api/v1/threads/:thread_id", get(threads::handle_get_thread))
        .route(
            "/api/v1/threads/:thread_id/messages",
            post(threads::handle_resume),
        )
        .with_state(state)
}

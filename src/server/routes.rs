use axum::Router;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use super::AppState;
use super::handlers::{filter, health, index, refresh, reset, submit_questionnaire};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/questionnaire", post(submit_questionnaire))
        .route("/filter", post(filter))
        .route("/reset", post(reset))
        .route("/refresh", post(refresh))
        .route("/health", get(health))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

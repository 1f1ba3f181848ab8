pub mod health;
pub mod request_id;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};

use crate::extraction::handlers::handle_extract_resume;
use crate::interview::handlers::handle_analyze_body_language;
use crate::matching::handlers::handle_match;
use crate::routes::request_id::request_id_middleware;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let max_upload_bytes = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/match", post(handle_match))
        .route("/extract_resume", post(handle_extract_resume))
        .route("/analyze_body_language", post(handle_analyze_body_language))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE_NAME: &str = "hireprep-api";

/// GET /
/// Service name, version and the endpoints it exposes.
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "GET /health",
            "POST /match",
            "POST /extract_resume",
            "POST /analyze_body_language"
        ]
    }))
}

/// GET /health
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE_NAME,
        "embedding_provider": state.config.embedding_provider.as_str()
    }))
}

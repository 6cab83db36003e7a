use axum::Json;
use serde_json::{json, Value};

/// GET / - liveness probe
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "active",
        "message": "Job board API is running",
    }))
}

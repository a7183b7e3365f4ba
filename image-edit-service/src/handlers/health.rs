use axum::Json;
use serde_json::{json, Value};

/// Liveness probe. Independent of the credential and the provider.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

use axum::{Json, Router, routing::get};

pub fn router() -> Router {
    Router::new().route("/healthz", get(healthz))
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

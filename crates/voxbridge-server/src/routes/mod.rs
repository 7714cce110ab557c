pub mod calls;
pub mod sync;
pub mod webhooks;

use axum::{routing::get, Json, Router};

use crate::state::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .nest("/webhooks", webhooks::router())
        .nest("/sync", sync::router())
        .nest("/calls", calls::router())
        .route("/health", get(health))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

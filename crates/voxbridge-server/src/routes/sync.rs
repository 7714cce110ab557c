use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use voxbridge_schema::{Provider, SyncSummary};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/{provider}", post(trigger_sync))
}

/// Manual sync trigger. May overlap a scheduled run; the store's upsert
/// contract keeps that safe.
async fn trigger_sync(
    State(state): State<AppState>,
    Path(provider): Path<String>,
) -> Result<Json<SyncSummary>, (StatusCode, String)> {
    let provider = Provider::parse(&provider)
        .ok_or_else(|| (StatusCode::NOT_FOUND, format!("unknown provider {provider}")))?;

    let orchestrator = state.orchestrators.get(&provider).ok_or_else(|| {
        (
            StatusCode::NOT_FOUND,
            format!("provider {provider} is not configured for sync"),
        )
    })?;

    let summary = orchestrator.run().await.map_err(|err| {
        tracing::error!(%provider, %err, "manual sync failed");
        (StatusCode::BAD_GATEWAY, err.to_string())
    })?;

    Ok(Json(summary))
}

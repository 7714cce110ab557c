use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use voxbridge_schema::{CallRecord, Provider};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_calls))
}

#[derive(Debug, Deserialize)]
struct CallsQuery {
    #[serde(default)]
    provider: Option<String>,
}

async fn list_calls(
    State(state): State<AppState>,
    Query(query): Query<CallsQuery>,
) -> Result<Json<Vec<CallRecord>>, (StatusCode, String)> {
    let provider = match query.provider.as_deref() {
        Some(raw) => Some(Provider::parse(raw).ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                format!("unknown provider {raw}"),
            )
        })?),
        None => None,
    };

    let records = state.store.list_calls(provider).await.map_err(|err| {
        tracing::error!(%err, "failed to list calls");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to list calls".to_string(),
        )
    })?;

    Ok(Json(records))
}

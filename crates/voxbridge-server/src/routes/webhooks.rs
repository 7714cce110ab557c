//! Inbound webhook ingestion.
//!
//! Each delivery is verified against the provider's shared secret before
//! the body is even parsed. Rejected deliveries get a non-2xx status so the
//! vendor redelivers; the upsert contract makes redelivery safe.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::Value;
use voxbridge_payload::normalize;
use voxbridge_schema::Provider;

use crate::state::AppState;

const VAPI_SIGNATURE_HEADER: &str = "x-vapi-signature";
const ELEVENLABS_SIGNATURE_HEADER: &str = "elevenlabs-signature";

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/vapi", post(vapi_webhook))
        .route("/elevenlabs", post(elevenlabs_webhook))
}

#[derive(Debug, Serialize)]
struct WebhookAck {
    status: &'static str,
    provider: Provider,
    external_call_id: String,
}

async fn vapi_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, String)> {
    ingest(&state, Provider::Vapi, VAPI_SIGNATURE_HEADER, &headers, &body).await
}

async fn elevenlabs_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAck>, (StatusCode, String)> {
    ingest(
        &state,
        Provider::ElevenLabs,
        ELEVENLABS_SIGNATURE_HEADER,
        &headers,
        &body,
    )
    .await
}

async fn ingest(
    state: &AppState,
    provider: Provider,
    header_name: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Json<WebhookAck>, (StatusCode, String)> {
    let Some(verifier) = state.verifiers.get(&provider) else {
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            format!("no webhook secret configured for {provider}"),
        ));
    };

    let signature = headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            (
                StatusCode::UNAUTHORIZED,
                format!("missing {header_name} header"),
            )
        })?;

    if !verifier.verify(body, signature) {
        tracing::warn!(%provider, "webhook signature verification failed");
        return Err((StatusCode::UNAUTHORIZED, "invalid signature".to_string()));
    }

    let payload: Value = serde_json::from_slice(body)
        .map_err(|err| (StatusCode::BAD_REQUEST, format!("invalid json: {err}")))?;

    let record = normalize(provider, &payload)
        .map_err(|err| (StatusCode::UNPROCESSABLE_ENTITY, err.to_string()))?;
    let external_call_id = record.external_call_id.clone();

    state.store.upsert_call(record).await.map_err(|err| {
        tracing::error!(%provider, %external_call_id, %err, "failed to persist webhook call");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "failed to persist call".to_string(),
        )
    })?;

    tracing::info!(%provider, %external_call_id, "ingested webhook call");
    Ok(Json(WebhookAck {
        status: "ok",
        provider,
        external_call_id,
    }))
}

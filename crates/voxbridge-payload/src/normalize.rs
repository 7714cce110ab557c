//! Canonicalization of provider payloads into [`CallRecord`]s.
//!
//! Each field has a fixed candidate-path table, tried in order with the
//! first hit winning. The order prefers the more specific/structured
//! source and falls back to legacy flat fields, so older flat payloads
//! and newer nested `message.*` payloads both normalize without guessing
//! across conflicting sources once a value is found.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use thiserror::Error;
use voxbridge_schema::{CallRecord, CallStatus, Provider};

use crate::audio::resolve_audio_url;
use crate::extract::{first_i64, first_string, lookup};

/// The only fatal extraction failure: a payload without a call identifier
/// cannot be persisted idempotently and must be skipped by the caller.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("payload has no resolvable call identifier")]
    MissingCallId,
}

/// Phone-number candidates, highest precedence first.
const PHONE_PATHS: &[&str] = &[
    "metadata.phone_call.external_number",
    "conversation_initiation_client_data.dynamic_variables.system__caller_id",
    "conversation_initiation_client_data.dynamic_variables.system__called_number",
    "phone_number",
    "message.call.customer.number",
];

const STARTED_AT_UNIX_PATHS: &[&str] = &["start_time_unix_secs", "metadata.start_time_unix_secs"];
const ENDED_AT_UNIX_PATHS: &[&str] = &["end_time_unix_secs", "metadata.end_time_unix_secs"];
const DURATION_PATHS: &[&str] = &["call_duration_secs", "metadata.call_duration_secs"];
const STATUS_PATHS: &[&str] = &["status", "call_status", "message.call.status"];
const ASSISTANT_ID_PATHS: &[&str] = &[
    "agent_id",
    "assistant_id",
    "message.call.assistantId",
    "metadata.agent_id",
];

/// Call-id candidates: the provider's structured call-object path first,
/// then the legacy flat fields shared by older payload versions.
fn call_id_paths(provider: Provider) -> &'static [&'static str] {
    match provider {
        Provider::Vapi => &["message.call.id", "call.id", "call_id", "id"],
        Provider::ElevenLabs => &["conversation_id", "call_id", "id"],
    }
}

/// Normalize one raw payload into a canonical record.
///
/// Every field but the call id is optional; absence never fails the
/// transform. Pure aside from logging.
pub fn normalize(provider: Provider, payload: &Value) -> Result<CallRecord, NormalizeError> {
    let external_call_id = first_string(payload, call_id_paths(provider))
        .ok_or(NormalizeError::MissingCallId)?;

    let caller_phone_number = first_string(payload, PHONE_PATHS);
    let duration_secs = first_i64(payload, DURATION_PATHS);
    let started_at = extract_started_at(payload);
    let ended_at = extract_ended_at(payload, started_at, duration_secs);

    let status = first_string(payload, STATUS_PATHS)
        .map(|raw| map_status(&raw))
        .unwrap_or_else(|| CallStatus::Other("unknown".to_string()));

    let record = CallRecord {
        provider,
        external_call_id,
        external_assistant_id: first_string(payload, ASSISTANT_ID_PATHS),
        caller_phone_number,
        started_at,
        ended_at,
        duration_secs,
        status,
        audio_url: resolve_audio_url(payload),
        transcript: assemble_transcript(payload),
        raw_payload: payload.to_string(),
    };

    tracing::debug!(
        provider = %record.provider,
        external_call_id = %record.external_call_id,
        has_phone = record.caller_phone_number.is_some(),
        has_audio = record.audio_url.is_some(),
        "normalized call payload"
    );

    Ok(record)
}

/// Start instant: unix-seconds fields first, then `created_at` parsed as a
/// timestamp string (not unix seconds).
fn extract_started_at(payload: &Value) -> Option<DateTime<Utc>> {
    if let Some(secs) = first_i64(payload, STARTED_AT_UNIX_PATHS) {
        return Utc.timestamp_opt(secs, 0).single();
    }
    first_string(payload, &["created_at"])
        .as_deref()
        .and_then(parse_timestamp)
}

/// End instant: explicit end field, else derived `started_at + duration`,
/// else the payload's `updated_at`.
fn extract_ended_at(
    payload: &Value,
    started_at: Option<DateTime<Utc>>,
    duration_secs: Option<i64>,
) -> Option<DateTime<Utc>> {
    if let Some(secs) = first_i64(payload, ENDED_AT_UNIX_PATHS) {
        if let Some(at) = Utc.timestamp_opt(secs, 0).single() {
            return Some(at);
        }
    }
    if let (Some(start), Some(duration)) = (started_at, duration_secs) {
        return Some(start + chrono::Duration::seconds(duration));
    }
    first_string(payload, &["updated_at"])
        .as_deref()
        .and_then(parse_timestamp)
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Static provider-vocabulary lookup. Unknown values pass through as
/// `Other` rather than failing the record.
fn map_status(raw: &str) -> CallStatus {
    match raw.to_ascii_lowercase().as_str() {
        "done" | "ended" | "completed" | "complete" | "success" => CallStatus::Completed,
        "failed" | "error" | "busy" | "no-answer" => CallStatus::Failed,
        "initiated" | "in-progress" | "in_progress" | "processing" | "queued" | "ringing" => {
            CallStatus::InProgress
        }
        other => CallStatus::Other(other.to_string()),
    }
}

/// Transcript: a structured per-message array concatenated with role
/// labels when present, otherwise the provider's transcript blob, and as a
/// last resort the analysis summary.
fn assemble_transcript(payload: &Value) -> Option<String> {
    for path in ["transcript", "message.artifact.messages"] {
        if let Some(messages) = lookup(payload, path).and_then(Value::as_array) {
            let lines: Vec<String> = messages.iter().filter_map(render_message_line).collect();
            if !lines.is_empty() {
                return Some(lines.join("\n"));
            }
        }
    }
    if let Some(blob) = first_string(payload, &["message.transcript", "transcript"]) {
        if !blob.trim().is_empty() {
            return Some(blob);
        }
    }
    first_string(
        payload,
        &["analysis.transcript_summary", "message.analysis.summary"],
    )
}

fn render_message_line(entry: &Value) -> Option<String> {
    let text = first_string(entry, &["message", "content", "text"])?;
    if text.trim().is_empty() {
        return None;
    }
    let role = first_string(entry, &["role", "speaker"]).unwrap_or_default();
    Some(format!("{} {}", role_label(&role), text))
}

/// Role labels are normalized at ingestion: the assistant side renders as
/// `AI:` and the caller side as `User:`, whatever the provider calls them.
fn role_label(role: &str) -> String {
    match role.to_ascii_lowercase().as_str() {
        "agent" | "assistant" | "bot" | "ai" => "AI:".to_string(),
        "user" | "customer" | "human" | "caller" => "User:".to_string(),
        "" => "Unknown:".to_string(),
        other => format!("{other}:"),
    }
}

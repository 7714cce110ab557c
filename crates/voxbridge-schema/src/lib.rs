use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// External voice-AI vendor supplying call data.
///
/// Vapi pushes call events over webhooks; ElevenLabs is polled through its
/// conversational-AI REST API. Both converge on the same canonical record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    Vapi,
    #[serde(rename = "elevenlabs")]
    ElevenLabs,
}

impl Provider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Vapi => "vapi",
            Provider::ElevenLabs => "elevenlabs",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "vapi" => Some(Provider::Vapi),
            "elevenlabs" => Some(Provider::ElevenLabs),
            _ => None,
        }
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical call outcome. Provider vocabularies map into this set;
/// anything unrecognized passes through as `Other` rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    Completed,
    Failed,
    InProgress,
    Other(String),
}

impl CallStatus {
    pub fn as_str(&self) -> &str {
        match self {
            CallStatus::Completed => "completed",
            CallStatus::Failed => "failed",
            CallStatus::InProgress => "in_progress",
            CallStatus::Other(raw) => raw.as_str(),
        }
    }

    /// Inverse of `as_str` for storage round-trips. Unknown text becomes
    /// `Other`, matching ingestion behavior.
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => CallStatus::Completed,
            "failed" => CallStatus::Failed,
            "in_progress" => CallStatus::InProgress,
            other => CallStatus::Other(other.to_string()),
        }
    }
}

/// Normalized, provider-agnostic record of one phone/voice-assistant call.
///
/// `(provider, external_call_id)` is the natural key: re-ingesting the same
/// external call updates the existing row, never duplicates it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CallRecord {
    pub provider: Provider,
    /// Provider-assigned call/conversation identifier. Required.
    pub external_call_id: String,
    /// Provider-assigned identifier of the assistant that handled the call.
    #[serde(default)]
    pub external_assistant_id: Option<String>,
    #[serde(default)]
    pub caller_phone_number: Option<String>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_secs: Option<i64>,
    pub status: CallStatus,
    #[serde(default)]
    pub audio_url: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    /// Original serialized payload, retained verbatim for audit/debugging.
    pub raw_payload: String,
}

impl CallRecord {
    /// Whether any tracked field differs from `other`. The audit copy of the
    /// raw payload is deliberately ignored so a re-serialized but
    /// semantically identical payload does not count as a change.
    pub fn differs_from(&self, other: &CallRecord) -> bool {
        self.external_assistant_id != other.external_assistant_id
            || self.caller_phone_number != other.caller_phone_number
            || self.started_at != other.started_at
            || self.ended_at != other.ended_at
            || self.duration_secs != other.duration_secs
            || self.status != other.status
            || self.audio_url != other.audio_url
            || self.transcript != other.transcript
    }
}

/// One entry in the synced assistant/agent catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssistantRecord {
    pub provider: Provider,
    pub external_assistant_id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub raw_payload: String,
}

/// Immutable result of one sync run. Produced once per completed run and
/// never mutated afterwards; consumed by logging and the manual-trigger API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSummary {
    pub run_id: Uuid,
    pub provider: Provider,
    pub fetched: usize,
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
    pub updated_ids: Vec<String>,
    pub skipped_ids: Vec<String>,
    pub error_ids: Vec<String>,
    pub duration_ms: u64,
}

impl SyncSummary {
    pub fn new(provider: Provider) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            provider,
            fetched: 0,
            updated: 0,
            skipped: 0,
            errors: 0,
            updated_ids: Vec::new(),
            skipped_ids: Vec::new(),
            error_ids: Vec::new(),
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(status: CallStatus) -> CallRecord {
        CallRecord {
            provider: Provider::ElevenLabs,
            external_call_id: "conv_1".into(),
            external_assistant_id: Some("agent_1".into()),
            caller_phone_number: Some("+15551234567".into()),
            started_at: Some(Utc.timestamp_opt(1_687_452_378, 0).unwrap()),
            ended_at: None,
            duration_secs: Some(120),
            status,
            audio_url: None,
            transcript: None,
            raw_payload: "{}".into(),
        }
    }

    #[test]
    fn provider_round_trips_through_str() {
        for p in [Provider::Vapi, Provider::ElevenLabs] {
            assert_eq!(Provider::parse(p.as_str()), Some(p));
        }
        assert_eq!(Provider::parse("twilio"), None);
    }

    #[test]
    fn status_parse_preserves_unknown_values() {
        assert_eq!(CallStatus::parse("completed"), CallStatus::Completed);
        let odd = CallStatus::parse("voicemail");
        assert_eq!(odd, CallStatus::Other("voicemail".into()));
        assert_eq!(odd.as_str(), "voicemail");
    }

    #[test]
    fn differs_ignores_raw_payload() {
        let a = record(CallStatus::Completed);
        let mut b = a.clone();
        b.raw_payload = r#"{"reserialized":true}"#.into();
        assert!(!a.differs_from(&b));

        b.status = CallStatus::Failed;
        assert!(a.differs_from(&b));
    }
}

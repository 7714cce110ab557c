//! HTTP clients for the pull-based provider APIs.
//!
//! Clients own their `reqwest::Client` and are injected where consumed;
//! pagination is handled here so consumers see one fully materialized list
//! of raw payloads in the shapes the normalizer understands.

pub mod elevenlabs;
pub mod vapi;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use voxbridge_schema::Provider;

pub use elevenlabs::ElevenLabsClient;
pub use vapi::VapiClient;

/// A remote source of call/conversation payloads.
#[async_trait]
pub trait ConversationSource: Send + Sync {
    fn provider(&self) -> Provider;

    /// The complete remote list, pagination already flattened.
    async fn list_conversations(&self) -> Result<Vec<Value>>;

    /// One record by its provider-assigned id.
    async fn get_conversation(&self, external_id: &str) -> Result<Value>;

    /// The provider's assistant/agent catalog.
    async fn list_assistants(&self) -> Result<Vec<Value>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderErrorKind {
    RateLimit,
    ServerError,
    Timeout,
    AuthError,
    InvalidRequest,
    Unknown,
}

impl ProviderErrorKind {
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        match status.as_u16() {
            429 => Self::RateLimit,
            401 | 403 => Self::AuthError,
            400 | 422 => Self::InvalidRequest,
            500..=599 => Self::ServerError,
            _ => Self::Unknown,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimit | Self::ServerError | Self::Timeout)
    }
}

pub(crate) fn api_error(
    provider: &str,
    status: reqwest::StatusCode,
    body: &str,
) -> anyhow::Error {
    let kind = ProviderErrorKind::from_status(status);
    let retryable = if kind.is_retryable() { " [retryable]" } else { "" };
    anyhow::anyhow!("{provider} api error ({status}){retryable}: {body}")
}

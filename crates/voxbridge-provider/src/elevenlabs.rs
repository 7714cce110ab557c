use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use voxbridge_schema::Provider;

use crate::{api_error, ConversationSource};

const PAGE_SIZE: u32 = 100;

/// ElevenLabs conversational-AI API client.
///
/// Authenticates with the `xi-api-key` header; the conversation and agent
/// list endpoints page with `has_more`/`next_cursor`.
#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl ElevenLabsClient {
    pub fn new(api_key: impl Into<String>, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        }
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        let resp = self
            .client
            .get(url)
            .header("xi-api-key", &self.api_key)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error("elevenlabs", status, &body));
        }
        Ok(resp.json().await?)
    }

    /// Walk the cursor-paged list endpoint until `has_more` goes false.
    async fn list_paged(&self, path: &str, items_key: &str) -> Result<Vec<Value>> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let url = match &cursor {
                Some(c) => format!(
                    "{}{path}?page_size={PAGE_SIZE}&cursor={c}",
                    self.api_base
                ),
                None => format!("{}{path}?page_size={PAGE_SIZE}", self.api_base),
            };
            let body = self.get_json(&url).await?;

            if let Some(page) = body.get(items_key).and_then(Value::as_array) {
                items.extend(page.iter().cloned());
            }

            let has_more = body
                .get("has_more")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            cursor = body
                .get("next_cursor")
                .and_then(Value::as_str)
                .map(str::to_string);

            if !has_more || cursor.is_none() {
                break;
            }
        }

        tracing::debug!(count = items.len(), path, "fetched elevenlabs list");
        Ok(items)
    }
}

#[async_trait]
impl ConversationSource for ElevenLabsClient {
    fn provider(&self) -> Provider {
        Provider::ElevenLabs
    }

    async fn list_conversations(&self) -> Result<Vec<Value>> {
        self.list_paged("/v1/convai/conversations", "conversations")
            .await
    }

    async fn get_conversation(&self, external_id: &str) -> Result<Value> {
        let url = format!("{}/v1/convai/conversations/{external_id}", self.api_base);
        self.get_json(&url).await
    }

    async fn list_assistants(&self) -> Result<Vec<Value>> {
        self.list_paged("/v1/convai/agents", "agents").await
    }
}

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use voxbridge_schema::Provider;

use crate::{api_error, ConversationSource};

const PAGE_LIMIT: usize = 100;

/// Vapi REST API client.
///
/// Bearer-token auth; `/call` returns newest-first pages that are walked
/// with a `createdAtLt` cursor taken from the last item of each page.
#[derive(Debug, Clone)]
pub struct VapiClient {
    client: reqwest::Client,
    api_key: String,
    api_base: String,
}

impl VapiClient {
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
            .bearer_auth(&self.api_key)
            .send()
            .await
            .with_context(|| format!("request to {url} failed"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error("vapi", status, &body));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait]
impl ConversationSource for VapiClient {
    fn provider(&self) -> Provider {
        Provider::Vapi
    }

    async fn list_conversations(&self) -> Result<Vec<Value>> {
        let mut items: Vec<Value> = Vec::new();
        let mut created_before: Option<String> = None;

        loop {
            let url = match &created_before {
                Some(at) => format!(
                    "{}/call?limit={PAGE_LIMIT}&createdAtLt={at}",
                    self.api_base
                ),
                None => format!("{}/call?limit={PAGE_LIMIT}", self.api_base),
            };
            let body = self.get_json(&url).await?;
            let Some(page) = body.as_array() else {
                break;
            };
            if page.is_empty() {
                break;
            }

            let page_len = page.len();
            created_before = page
                .last()
                .and_then(|call| call.get("createdAt"))
                .and_then(Value::as_str)
                .map(str::to_string);
            items.extend(page.iter().cloned());

            if page_len < PAGE_LIMIT || created_before.is_none() {
                break;
            }
        }

        tracing::debug!(count = items.len(), "fetched vapi call list");
        Ok(items)
    }

    async fn get_conversation(&self, external_id: &str) -> Result<Value> {
        let url = format!("{}/call/{external_id}", self.api_base);
        self.get_json(&url).await
    }

    async fn list_assistants(&self) -> Result<Vec<Value>> {
        let url = format!("{}/assistant", self.api_base);
        let body = self.get_json(&url).await?;
        Ok(body.as_array().cloned().unwrap_or_default())
    }
}

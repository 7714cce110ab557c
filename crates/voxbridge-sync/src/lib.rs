//! Reconciliation of a provider's remote call list against local storage.
//!
//! One run walks the full remote list, normalizes each item, and decides
//! create/update/skip per record. A bad item never aborts the run; a failed
//! fetch aborts it before any reconciliation, so a partial summary is never
//! emitted. Retry belongs to the scheduler driver, not here.

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::Value;
use voxbridge_payload::normalize;
use voxbridge_payload::extract::first_string;
use voxbridge_provider::ConversationSource;
use voxbridge_schema::{AssistantRecord, SyncSummary};
use voxbridge_store::CallStore;

pub struct SyncOrchestrator {
    source: Arc<dyn ConversationSource>,
    store: CallStore,
}

impl SyncOrchestrator {
    pub fn new(source: Arc<dyn ConversationSource>, store: CallStore) -> Self {
        Self { source, store }
    }

    /// One full sync run: fetch, normalize, reconcile, summarize.
    pub async fn run(&self) -> Result<SyncSummary> {
        let provider = self.source.provider();
        let started = Instant::now();

        let items = self
            .source
            .list_conversations()
            .await
            .with_context(|| format!("failed to fetch remote {provider} conversation list"))?;

        let mut summary = SyncSummary::new(provider);
        summary.fetched = items.len();

        for item in &items {
            let record = match normalize(provider, item) {
                Ok(record) => record,
                Err(err) => {
                    let id = best_effort_id(item);
                    tracing::warn!(%provider, external_call_id = %id, %err, "skipping unusable item");
                    summary.errors += 1;
                    summary.error_ids.push(id);
                    continue;
                }
            };

            let id = record.external_call_id.clone();
            match self.store.find_call(provider, &id).await {
                Ok(Some(existing)) if !record.differs_from(&existing) => {
                    summary.skipped += 1;
                    summary.skipped_ids.push(id);
                }
                Ok(_) => match self.store.upsert_call(record).await {
                    Ok(()) => {
                        summary.updated += 1;
                        summary.updated_ids.push(id);
                    }
                    Err(err) => {
                        tracing::warn!(%provider, external_call_id = %id, %err, "failed to persist record");
                        summary.errors += 1;
                        summary.error_ids.push(id);
                    }
                },
                Err(err) => {
                    tracing::warn!(%provider, external_call_id = %id, %err, "failed to look up record");
                    summary.errors += 1;
                    summary.error_ids.push(id);
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            %provider,
            run_id = %summary.run_id,
            fetched = summary.fetched,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            duration_ms = summary.duration_ms,
            "sync run completed"
        );
        Ok(summary)
    }

    /// Reconcile the provider's assistant/agent catalog under the same
    /// create/update/skip rules as calls.
    pub async fn sync_assistants(&self) -> Result<SyncSummary> {
        let provider = self.source.provider();
        let started = Instant::now();

        let items = self
            .source
            .list_assistants()
            .await
            .with_context(|| format!("failed to fetch remote {provider} assistant list"))?;

        let mut summary = SyncSummary::new(provider);
        summary.fetched = items.len();

        for item in &items {
            let Some(id) = first_string(item, &["agent_id", "assistant_id", "id"]) else {
                summary.errors += 1;
                summary.error_ids.push(best_effort_id(item));
                continue;
            };

            let record = AssistantRecord {
                provider,
                external_assistant_id: id.clone(),
                name: first_string(item, &["name", "agent_name"]),
                raw_payload: item.to_string(),
            };

            match self.store.find_assistant(provider, &id).await {
                Ok(Some(existing)) if existing == record => {
                    summary.skipped += 1;
                    summary.skipped_ids.push(id);
                }
                Ok(_) => match self.store.upsert_assistant(record).await {
                    Ok(()) => {
                        summary.updated += 1;
                        summary.updated_ids.push(id);
                    }
                    Err(err) => {
                        tracing::warn!(%provider, external_assistant_id = %id, %err, "failed to persist assistant");
                        summary.errors += 1;
                        summary.error_ids.push(id);
                    }
                },
                Err(err) => {
                    tracing::warn!(%provider, external_assistant_id = %id, %err, "failed to look up assistant");
                    summary.errors += 1;
                    summary.error_ids.push(id);
                }
            }
        }

        summary.duration_ms = started.elapsed().as_millis() as u64;
        tracing::info!(
            %provider,
            fetched = summary.fetched,
            updated = summary.updated,
            skipped = summary.skipped,
            errors = summary.errors,
            "assistant sync completed"
        );
        Ok(summary)
    }
}

fn best_effort_id(item: &Value) -> String {
    first_string(item, &["conversation_id", "call_id", "id", "agent_id"])
        .unwrap_or_else(|| "<unknown>".to_string())
}

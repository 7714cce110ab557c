use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;
use voxbridge_schema::{AssistantRecord, CallRecord, CallStatus, Provider};

use crate::migrations::run_migrations;

/// Sqlite-backed store for calls and the assistant catalog.
///
/// All access goes through `spawn_blocking`; the connection is shared
/// behind a mutex, matching sqlite's single-writer model.
#[derive(Clone)]
pub struct CallStore {
    db: Arc<Mutex<Connection>>,
}

impl CallStore {
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        tracing::debug!(path, "opened call store");
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        run_migrations(&conn)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert-or-update keyed by `(provider, external_call_id)`.
    ///
    /// The unique constraint makes concurrent upserts of the same external
    /// call converge on one row; `created_at` survives updates.
    pub async fn upsert_call(&self, record: CallRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let now = Utc::now().to_rfc3339();
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            conn.execute(
                r#"
                INSERT INTO calls (
                    provider, external_call_id, external_assistant_id,
                    caller_phone_number, started_at, ended_at, duration_secs,
                    status, audio_url, transcript, raw_payload, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?12)
                ON CONFLICT(provider, external_call_id) DO UPDATE SET
                    external_assistant_id = excluded.external_assistant_id,
                    caller_phone_number = excluded.caller_phone_number,
                    started_at = excluded.started_at,
                    ended_at = excluded.ended_at,
                    duration_secs = excluded.duration_secs,
                    status = excluded.status,
                    audio_url = excluded.audio_url,
                    transcript = excluded.transcript,
                    raw_payload = excluded.raw_payload,
                    updated_at = excluded.updated_at
                "#,
                params![
                    record.provider.as_str(),
                    record.external_call_id,
                    record.external_assistant_id,
                    record.caller_phone_number,
                    record.started_at.map(|at| at.to_rfc3339()),
                    record.ended_at.map(|at| at.to_rfc3339()),
                    record.duration_secs,
                    record.status.as_str(),
                    record.audio_url,
                    record.transcript,
                    record.raw_payload,
                    now,
                ],
            )?;
            Ok::<(), anyhow::Error>(())
        })
        .await??;

        Ok(())
    }

    pub async fn find_call(
        &self,
        provider: Provider,
        external_call_id: &str,
    ) -> Result<Option<CallRecord>> {
        let db = Arc::clone(&self.db);
        let external_call_id = external_call_id.to_owned();
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let record = conn
                .query_row(
                    r#"
                    SELECT provider, external_call_id, external_assistant_id,
                           caller_phone_number, started_at, ended_at, duration_secs,
                           status, audio_url, transcript, raw_payload
                    FROM calls
                    WHERE provider = ?1 AND external_call_id = ?2
                    "#,
                    params![provider.as_str(), external_call_id],
                    row_to_call,
                )
                .optional()?;
            Ok::<Option<CallRecord>, anyhow::Error>(record)
        })
        .await?
    }

    pub async fn list_calls(&self, provider: Option<Provider>) -> Result<Vec<CallRecord>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let mut records = Vec::new();
            match provider {
                Some(p) => {
                    let mut stmt = conn.prepare(
                        r#"
                        SELECT provider, external_call_id, external_assistant_id,
                               caller_phone_number, started_at, ended_at, duration_secs,
                               status, audio_url, transcript, raw_payload
                        FROM calls
                        WHERE provider = ?1
                        ORDER BY started_at DESC
                        "#,
                    )?;
                    let rows = stmt.query_map(params![p.as_str()], row_to_call)?;
                    for row in rows {
                        records.push(row?);
                    }
                }
                None => {
                    let mut stmt = conn.prepare(
                        r#"
                        SELECT provider, external_call_id, external_assistant_id,
                               caller_phone_number, started_at, ended_at, duration_secs,
                               status, audio_url, transcript, raw_payload
                        FROM calls
                        ORDER BY started_at DESC
                        "#,
                    )?;
                    let rows = stmt.query_map([], row_to_call)?;
                    for row in rows {
                        records.push(row?);
                    }
                }
            }
            Ok::<Vec<CallRecord>, anyhow::Error>(records)
        })
        .await?
    }

    pub async fn count_calls(&self) -> Result<i64> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM calls", [], |row| row.get(0))?;
            Ok::<i64, anyhow::Error>(count)
        })
        .await?
    }

    pub async fn upsert_assistant(&self, record: AssistantRecord) -> Result<()> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let now = Utc::now().to_rfc3339();
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            conn.execute(
                r#"
                INSERT INTO assistants (
                    provider, external_assistant_id, name, raw_payload, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?5)
                ON CONFLICT(provider, external_assistant_id) DO UPDATE SET
                    name = excluded.name,
                    raw_payload = excluded.raw_payload,
                    updated_at = excluded.updated_at
                "#,
                params![
                    record.provider.as_str(),
                    record.external_assistant_id,
                    record.name,
                    record.raw_payload,
                    now,
                ],
            )?;
            Ok::<(), anyhow::Error>(())
        })
        .await??;

        Ok(())
    }

    pub async fn find_assistant(
        &self,
        provider: Provider,
        external_assistant_id: &str,
    ) -> Result<Option<AssistantRecord>> {
        let db = Arc::clone(&self.db);
        let external_assistant_id = external_assistant_id.to_owned();
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let record = conn
                .query_row(
                    r#"
                    SELECT provider, external_assistant_id, name, raw_payload
                    FROM assistants
                    WHERE provider = ?1 AND external_assistant_id = ?2
                    "#,
                    params![provider.as_str(), external_assistant_id],
                    row_to_assistant,
                )
                .optional()?;
            Ok::<Option<AssistantRecord>, anyhow::Error>(record)
        })
        .await?
    }

    pub async fn list_assistants(&self, provider: Provider) -> Result<Vec<AssistantRecord>> {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db
                .lock()
                .map_err(|_| anyhow!("failed to lock sqlite connection"))?;
            let mut stmt = conn.prepare(
                r#"
                SELECT provider, external_assistant_id, name, raw_payload
                FROM assistants
                WHERE provider = ?1
                ORDER BY external_assistant_id
                "#,
            )?;
            let rows = stmt.query_map(params![provider.as_str()], row_to_assistant)?;
            let mut records = Vec::new();
            for row in rows {
                records.push(row?);
            }
            Ok::<Vec<AssistantRecord>, anyhow::Error>(records)
        })
        .await?
    }
}

fn row_to_call(row: &Row<'_>) -> rusqlite::Result<CallRecord> {
    let provider: String = row.get(0)?;
    let status: String = row.get(7)?;
    let started_at: Option<String> = row.get(4)?;
    let ended_at: Option<String> = row.get(5)?;
    Ok(CallRecord {
        provider: Provider::parse(&provider).unwrap_or(Provider::Vapi),
        external_call_id: row.get(1)?,
        external_assistant_id: row.get(2)?,
        caller_phone_number: row.get(3)?,
        started_at: started_at.as_deref().and_then(parse_stored_timestamp),
        ended_at: ended_at.as_deref().and_then(parse_stored_timestamp),
        duration_secs: row.get(6)?,
        status: CallStatus::parse(&status),
        audio_url: row.get(8)?,
        transcript: row.get(9)?,
        raw_payload: row.get(10)?,
    })
}

fn row_to_assistant(row: &Row<'_>) -> rusqlite::Result<AssistantRecord> {
    let provider: String = row.get(0)?;
    Ok(AssistantRecord {
        provider: Provider::parse(&provider).unwrap_or(Provider::Vapi),
        external_assistant_id: row.get(1)?,
        name: row.get(2)?,
        raw_payload: row.get(3)?,
    })
}

fn parse_stored_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_call(id: &str) -> CallRecord {
        CallRecord {
            provider: Provider::ElevenLabs,
            external_call_id: id.to_string(),
            external_assistant_id: Some("agent_1".into()),
            caller_phone_number: Some("+13476342847".into()),
            started_at: Some(Utc.timestamp_opt(1_687_452_378, 0).unwrap()),
            ended_at: Some(Utc.timestamp_opt(1_687_452_498, 0).unwrap()),
            duration_secs: Some(120),
            status: CallStatus::Completed,
            audio_url: Some("https://cdn.example.com/r.mp3".into()),
            transcript: Some("AI: Hello\nUser: Hi".into()),
            raw_payload: r#"{"conversation_id":"conv"}"#.into(),
        }
    }

    #[tokio::test]
    async fn upsert_then_find_round_trips() {
        let store = CallStore::open_in_memory().unwrap();
        store.upsert_call(sample_call("conv_1")).await.unwrap();

        let found = store
            .find_call(Provider::ElevenLabs, "conv_1")
            .await
            .unwrap()
            .expect("record present");
        assert_eq!(found, sample_call("conv_1"));
    }

    #[tokio::test]
    async fn second_upsert_updates_instead_of_duplicating() {
        let store = CallStore::open_in_memory().unwrap();
        store.upsert_call(sample_call("conv_1")).await.unwrap();

        let mut changed = sample_call("conv_1");
        changed.status = CallStatus::Failed;
        changed.transcript = None;
        store.upsert_call(changed.clone()).await.unwrap();

        assert_eq!(store.count_calls().await.unwrap(), 1);
        let found = store
            .find_call(Provider::ElevenLabs, "conv_1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status, CallStatus::Failed);
        assert!(found.transcript.is_none());
    }

    #[tokio::test]
    async fn same_external_id_under_different_providers_coexists() {
        let store = CallStore::open_in_memory().unwrap();
        let mut a = sample_call("shared");
        store.upsert_call(a.clone()).await.unwrap();
        a.provider = Provider::Vapi;
        store.upsert_call(a).await.unwrap();

        assert_eq!(store.count_calls().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn find_missing_returns_none() {
        let store = CallStore::open_in_memory().unwrap();
        assert!(store
            .find_call(Provider::Vapi, "ghost")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_filters_by_provider() {
        let store = CallStore::open_in_memory().unwrap();
        store.upsert_call(sample_call("a")).await.unwrap();
        let mut vapi = sample_call("b");
        vapi.provider = Provider::Vapi;
        store.upsert_call(vapi).await.unwrap();

        let eleven = store.list_calls(Some(Provider::ElevenLabs)).await.unwrap();
        assert_eq!(eleven.len(), 1);
        assert_eq!(eleven[0].external_call_id, "a");

        let all = store.list_calls(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn assistant_upsert_is_idempotent() {
        let store = CallStore::open_in_memory().unwrap();
        let rec = AssistantRecord {
            provider: Provider::ElevenLabs,
            external_assistant_id: "agent_1".into(),
            name: Some("Receptionist".into()),
            raw_payload: "{}".into(),
        };
        store.upsert_assistant(rec.clone()).await.unwrap();

        let mut renamed = rec.clone();
        renamed.name = Some("Front Desk".into());
        store.upsert_assistant(renamed).await.unwrap();

        let listed = store.list_assistants(Provider::ElevenLabs).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name.as_deref(), Some("Front Desk"));
    }

    #[tokio::test]
    async fn records_survive_reopening_the_same_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("calls.db");
        let path = path.to_str().unwrap();

        {
            let store = CallStore::open(path).unwrap();
            store.upsert_call(sample_call("persisted")).await.unwrap();
        }

        let store = CallStore::open(path).unwrap();
        assert!(store
            .find_call(Provider::ElevenLabs, "persisted")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn status_survives_storage_round_trip_including_other() {
        let store = CallStore::open_in_memory().unwrap();
        let mut rec = sample_call("odd");
        rec.status = CallStatus::Other("voicemail".into());
        store.upsert_call(rec).await.unwrap();

        let found = store
            .find_call(Provider::ElevenLabs, "odd")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.status, CallStatus::Other("voicemail".into()));
    }
}

use anyhow::Result;
use rusqlite::Connection;

/// Idempotent schema setup. Safe to run on every open.
pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS calls (
            id INTEGER PRIMARY KEY,
            provider TEXT NOT NULL,
            external_call_id TEXT NOT NULL,
            external_assistant_id TEXT,
            caller_phone_number TEXT,
            started_at TEXT,
            ended_at TEXT,
            duration_secs INTEGER,
            status TEXT NOT NULL,
            audio_url TEXT,
            transcript TEXT,
            raw_payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(provider, external_call_id)
        );

        CREATE INDEX IF NOT EXISTS idx_calls_provider_started
            ON calls(provider, started_at);

        CREATE TABLE IF NOT EXISTS assistants (
            id INTEGER PRIMARY KEY,
            provider TEXT NOT NULL,
            external_assistant_id TEXT NOT NULL,
            name TEXT,
            raw_payload TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(provider, external_assistant_id)
        );
        "#,
    )?;
    Ok(())
}

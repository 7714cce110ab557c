//! Sqlite persistence for call records and the assistant catalog.
//!
//! The unique constraint on `(provider, external_call_id)` is what makes
//! ingestion idempotent under concurrent and retried runs: every write goes
//! through `INSERT ... ON CONFLICT ... DO UPDATE`, so overlapping scheduled
//! and manual syncs converge instead of duplicating.

pub mod migrations;
pub mod store;

pub use store::CallStore;

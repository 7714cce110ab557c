//! Payload normalization for voice-provider webhooks and poll responses.
//!
//! Provider payloads have no fixed contract: field locations drifted across
//! webhook versions, older flat fields coexist with newer nested `message.*`
//! structures, and any key may be absent or mistyped. This crate turns one
//! such payload into one canonical [`voxbridge_schema::CallRecord`] by trying
//! ordered candidate paths per field. The first hit wins; lower-precedence
//! sources are never consulted after a hit.
//!
//! Everything here is pure and in-memory; persistence and network live in
//! the store/provider crates.

pub mod audio;
pub mod extract;
pub mod normalize;

pub use audio::{resolve_audio_url, resolve_audio_url_from_text};
pub use normalize::{normalize, NormalizeError};

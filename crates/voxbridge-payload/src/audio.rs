//! Recording-URL resolution.
//!
//! Providers have written the playable URL to at least six different field
//! names across three nesting levels, and truncated webhook bodies sometimes
//! arrive as unparseable text. Resolution is staged: known fields at the
//! root, known fields under nested containers, a generic url-key scan, a
//! heuristic sweep of every string in the tree, and finally regex recovery
//! straight from the raw text.

use std::sync::OnceLock;

use regex::Regex;
use serde_json::Value;

use crate::extract::lookup;

/// Known recording-field names, in precedence order.
const URL_FIELDS: &[&str] = &[
    "recordingUrl",
    "recording_url",
    "audioUrl",
    "audio_url",
    "mediaUrl",
    "media_url",
];

/// Nested containers checked after the root, in precedence order.
const URL_PREFIXES: &[&str] = &["message.artifact", "call", "artifact"];

const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".wav", ".m4a"];

/// Find a playable recording URL in a parsed payload tree.
///
/// Root-level direct fields are checked before the nested
/// `message.artifact` / `call` / `artifact` groups. A string found under a
/// known field name is returned as-is, even when blank; the generic and
/// heuristic stages only accept non-empty values starting with `http`.
pub fn resolve_audio_url(payload: &Value) -> Option<String> {
    // Stage 1: known field names at the root.
    for field in URL_FIELDS {
        if let Some(url) = lookup(payload, field).and_then(Value::as_str) {
            return Some(url.to_string());
        }
    }

    // Stage 2: the same names under known containers.
    for prefix in URL_PREFIXES {
        for field in URL_FIELDS {
            let path = format!("{prefix}.{field}");
            if let Some(url) = lookup(payload, &path).and_then(Value::as_str) {
                return Some(url.to_string());
            }
        }
    }

    // Stage 3: one level of nested objects with a generic url-like key,
    // then a `recordings` list.
    if let Some(map) = payload.as_object() {
        for value in map.values() {
            if let Some(nested) = value.as_object() {
                for key in ["url", "link", "href"] {
                    if let Some(url) = nested.get(key).and_then(Value::as_str) {
                        if url.starts_with("http") {
                            return Some(url.to_string());
                        }
                    }
                }
            }
        }
        if let Some(recordings) = map.get("recordings").and_then(Value::as_array) {
            for entry in recordings {
                match entry {
                    Value::String(s) if s.starts_with("http") => return Some(s.clone()),
                    Value::Object(obj) => {
                        for key in ["url", "link", "href"] {
                            if let Some(url) = obj.get(key).and_then(Value::as_str) {
                                if url.starts_with("http") {
                                    return Some(url.to_string());
                                }
                            }
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // Stage 4: any string anywhere that looks like an audio URL.
    scan_for_audio_url(payload)
}

fn scan_for_audio_url(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if looks_like_audio_url(s) => Some(s.clone()),
        Value::Object(map) => map.values().find_map(scan_for_audio_url),
        Value::Array(items) => items.iter().find_map(scan_for_audio_url),
        _ => None,
    }
}

fn looks_like_audio_url(s: &str) -> bool {
    if !s.starts_with("http") {
        return false;
    }
    let lower = s.to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
        || lower.contains("recording")
        || lower.contains("audio")
}

fn quoted_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#""(?:recordingUrl|recording_url|audioUrl|audio_url|mediaUrl|media_url)"\s*:\s*"(https?://[^"]+)""#,
        )
        .expect("valid quoted field regex")
    })
}

fn unquoted_field_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?:recordingUrl|recording_url|audioUrl|audio_url|mediaUrl|media_url)\s*[:=]\s*(https?://[^\s",}]+)"#,
        )
        .expect("valid unquoted field regex")
    })
}

fn bare_audio_url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"https?://[^\s"'<>]+\.(?:mp3|wav|m4a)"#).expect("valid bare url regex")
    })
}

/// Regex recovery for payloads that failed JSON parsing.
///
/// Tries the strict quoted-field pattern, then a looser unquoted variant,
/// then any URL ending in a known audio extension.
pub fn resolve_audio_url_from_text(raw: &str) -> Option<String> {
    if let Some(caps) = quoted_field_re().captures(raw) {
        return Some(caps[1].to_string());
    }
    if let Some(caps) = unquoted_field_re().captures(raw) {
        return Some(caps[1].to_string());
    }
    bare_audio_url_re()
        .find(raw)
        .map(|m| m.as_str().to_string())
}

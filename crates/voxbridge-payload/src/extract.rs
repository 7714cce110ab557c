//! Dot-path field extraction over loosely-typed JSON trees.
//!
//! A candidate path fails (returns `None`) when any intermediate node is not
//! an object, the key is absent, or the leaf is null or of the wrong type.
//! Failure of one candidate is never an error; callers try the next one.

use serde_json::Value;

/// Resolve a dot-separated path against a JSON tree.
///
/// Returns `None` for absent keys, non-object intermediates, and null
/// leaves. Never panics on malformed paths.
pub fn lookup<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    let mut node = root;
    for key in path.split('.') {
        node = node.as_object()?.get(key)?;
    }
    if node.is_null() {
        None
    } else {
        Some(node)
    }
}

/// First candidate path resolving to a string.
pub fn first_string(root: &Value, paths: &[&str]) -> Option<String> {
    paths
        .iter()
        .find_map(|path| lookup(root, path).and_then(Value::as_str).map(str::to_string))
}

/// First candidate path resolving to a number, accepting both native
/// numerics and numeric strings. A string that fails to parse counts as
/// not-found for that candidate.
pub fn first_f64(root: &Value, paths: &[&str]) -> Option<f64> {
    paths.iter().find_map(|path| match lookup(root, path)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

/// First candidate path resolving to an integer, with the same
/// numeric-string tolerance as [`first_f64`].
pub fn first_i64(root: &Value, paths: &[&str]) -> Option<i64> {
    paths.iter().find_map(|path| match lookup(root, path)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// First candidate path resolving to a boolean.
pub fn first_bool(root: &Value, paths: &[&str]) -> Option<bool> {
    paths
        .iter()
        .find_map(|path| lookup(root, path).and_then(Value::as_bool))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn lookup_descends_nested_objects() {
        let tree = json!({"metadata": {"phone_call": {"external_number": "+13476342847"}}});
        assert_eq!(
            lookup(&tree, "metadata.phone_call.external_number"),
            Some(&json!("+13476342847"))
        );
    }

    #[test]
    fn lookup_fails_on_missing_key_and_non_object_intermediate() {
        let tree = json!({"metadata": {"phone_call": "not-an-object"}});
        assert!(lookup(&tree, "metadata.phone_call.external_number").is_none());
        assert!(lookup(&tree, "metadata.missing.external_number").is_none());
        assert!(lookup(&tree, "absent").is_none());
    }

    #[test]
    fn lookup_treats_null_as_absent() {
        let tree = json!({"phone_number": null});
        assert!(lookup(&tree, "phone_number").is_none());
    }

    #[test]
    fn first_string_takes_first_present_candidate() {
        let tree = json!({"b": "second", "a": null});
        assert_eq!(
            first_string(&tree, &["a", "b", "c"]),
            Some("second".to_string())
        );
    }

    #[test]
    fn first_string_skips_type_mismatch() {
        let tree = json!({"a": 42, "b": "text"});
        assert_eq!(first_string(&tree, &["a", "b"]), Some("text".to_string()));
    }

    #[test]
    fn first_i64_accepts_numeric_strings() {
        let tree = json!({"duration": "120"});
        assert_eq!(first_i64(&tree, &["duration"]), Some(120));
    }

    #[test]
    fn first_i64_parse_failure_falls_through() {
        let tree = json!({"a": "twelve", "b": 12});
        assert_eq!(first_i64(&tree, &["a", "b"]), Some(12));
    }

    #[test]
    fn first_f64_handles_native_and_string() {
        let tree = json!({"x": 1.5});
        assert_eq!(first_f64(&tree, &["x"]), Some(1.5));
        let tree = json!({"x": " 2.25 "});
        assert_eq!(first_f64(&tree, &["x"]), Some(2.25));
    }

    #[test]
    fn first_bool_ignores_truthy_strings() {
        let tree = json!({"a": "true", "b": true});
        assert_eq!(first_bool(&tree, &["a", "b"]), Some(true));
    }
}

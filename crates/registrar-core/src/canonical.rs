//! Canonical JSON encoding for deterministic serialization.
//!
//! Every hash and signature in the system is computed over bytes from
//! this module:
//! - object keys sorted by byte-wise comparison, recursively
//! - compact separators, no whitespace
//! - RFC 8259 string escaping (short escapes plus `\u00XX` for other
//!   control characters)
//! - numbers formatted by `serde_json::Number` (locale-independent)
//!
//! `exclude` removes named top-level fields before encoding. The same
//! exclusion set MUST be used at signing time and at verification time;
//! a mismatch makes verification fail even for untampered entries.
//!
//! Key sorting is done here explicitly rather than relying on
//! `serde_json`'s map order, which is a feature flag.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::CanonicalizationError;

/// Encode a JSON value to canonical bytes, dropping the named top-level
/// fields first.
///
/// A non-empty exclusion set on a non-object value is an error.
pub fn canonical_bytes(value: &Value, exclude: &[&str]) -> Result<Vec<u8>, CanonicalizationError> {
    let mut buf = Vec::new();
    match value {
        Value::Object(map) => encode_object(&mut buf, map, exclude),
        _ if !exclude.is_empty() => return Err(CanonicalizationError::NotAnObject),
        other => encode_value(&mut buf, other),
    }
    Ok(buf)
}

/// Serialize a record and encode it to canonical bytes.
pub fn canonical_record<T: Serialize>(
    record: &T,
    exclude: &[&str],
) -> Result<Vec<u8>, CanonicalizationError> {
    let value = serde_json::to_value(record)
        .map_err(|e| CanonicalizationError::Unserializable(e.to_string()))?;
    canonical_bytes(&value, exclude)
}

/// Recursively encode a JSON value.
fn encode_value(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => buf.extend_from_slice(b"null"),
        Value::Bool(true) => buf.extend_from_slice(b"true"),
        Value::Bool(false) => buf.extend_from_slice(b"false"),
        Value::Number(n) => buf.extend_from_slice(n.to_string().as_bytes()),
        Value::String(s) => encode_string(buf, s),
        Value::Array(items) => {
            buf.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    buf.push(b',');
                }
                encode_value(buf, item);
            }
            buf.push(b']');
        }
        Value::Object(map) => encode_object(buf, map, &[]),
    }
}

/// Encode an object with keys sorted by byte comparison, skipping the
/// excluded top-level keys.
fn encode_object(buf: &mut Vec<u8>, map: &Map<String, Value>, exclude: &[&str]) {
    let mut entries: Vec<(&String, &Value)> = map
        .iter()
        .filter(|(key, _)| !exclude.contains(&key.as_str()))
        .collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    buf.push(b'{');
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            buf.push(b',');
        }
        encode_string(buf, key);
        buf.push(b':');
        encode_value(buf, value);
    }
    buf.push(b'}');
}

/// Encode a JSON string with mandatory escapes only.
fn encode_string(buf: &mut Vec<u8>, s: &str) {
    buf.push(b'"');
    for c in s.chars() {
        match c {
            '"' => buf.extend_from_slice(b"\\\""),
            '\\' => buf.extend_from_slice(b"\\\\"),
            '\u{08}' => buf.extend_from_slice(b"\\b"),
            '\u{0c}' => buf.extend_from_slice(b"\\f"),
            '\n' => buf.extend_from_slice(b"\\n"),
            '\r' => buf.extend_from_slice(b"\\r"),
            '\t' => buf.extend_from_slice(b"\\t"),
            c if (c as u32) < 0x20 => {
                buf.extend_from_slice(format!("\\u{:04x}", c as u32).as_bytes());
            }
            c => {
                let mut utf8 = [0u8; 4];
                buf.extend_from_slice(c.encode_utf8(&mut utf8).as_bytes());
            }
        }
    }
    buf.push(b'"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn test_keys_sorted() {
        let value = json!({"zeta": 1, "alpha": 2, "mid": 3});
        let bytes = canonical_bytes(&value, &[]).unwrap();
        assert_eq!(bytes, br#"{"alpha":2,"mid":3,"zeta":1}"#);
    }

    #[test]
    fn test_nested_objects_sorted() {
        let value = json!({"outer": {"b": 1, "a": {"d": 4, "c": 3}}});
        let bytes = canonical_bytes(&value, &[]).unwrap();
        assert_eq!(bytes, br#"{"outer":{"a":{"c":3,"d":4},"b":1}}"#);
    }

    #[test]
    fn test_no_whitespace() {
        let value = json!({"a": [1, 2, {"b": "c"}], "d": null});
        let bytes = canonical_bytes(&value, &[]).unwrap();
        assert!(!bytes.contains(&b' '));
        assert_eq!(bytes, br#"{"a":[1,2,{"b":"c"}],"d":null}"#);
    }

    #[test]
    fn test_exclude_removes_top_level_only() {
        let value = json!({"sig": "xyz", "data": {"sig": "kept"}, "name": "n"});
        let bytes = canonical_bytes(&value, &["sig"]).unwrap();
        assert_eq!(bytes, br#"{"data":{"sig":"kept"},"name":"n"}"#);
    }

    #[test]
    fn test_exclude_missing_field_is_noop() {
        let value = json!({"a": 1});
        let bytes = canonical_bytes(&value, &["absent"]).unwrap();
        assert_eq!(bytes, br#"{"a":1}"#);
    }

    #[test]
    fn test_exclude_on_non_object_fails() {
        let value = json!([1, 2, 3]);
        let result = canonical_bytes(&value, &["sig"]);
        assert!(matches!(result, Err(CanonicalizationError::NotAnObject)));
    }

    #[test]
    fn test_scalar_without_exclusions() {
        let bytes = canonical_bytes(&json!("plain"), &[]).unwrap();
        assert_eq!(bytes, br#""plain""#);
    }

    #[test]
    fn test_string_escapes() {
        let value = json!({"s": "a\"b\\c\nd\u{01}"});
        let bytes = canonical_bytes(&value, &[]).unwrap();
        assert_eq!(bytes, br#"{"s":"a\"b\\c\nd\u0001"}"#);
    }

    #[test]
    fn test_unicode_passes_through() {
        let value = json!({"s": "héllo \u{2713}"});
        let bytes = canonical_bytes(&value, &[]).unwrap();
        assert_eq!(bytes, "{\"s\":\"héllo \u{2713}\"}".as_bytes());
    }

    #[test]
    fn test_insertion_order_irrelevant() {
        // Same fields inserted in opposite orders must produce identical bytes.
        let mut forward = Map::new();
        forward.insert("first".into(), json!(1));
        forward.insert("second".into(), json!(2));

        let mut backward = Map::new();
        backward.insert("second".into(), json!(2));
        backward.insert("first".into(), json!(1));

        let a = canonical_bytes(&Value::Object(forward), &[]).unwrap();
        let b = canonical_bytes(&Value::Object(backward), &[]).unwrap();
        assert_eq!(a, b);
    }

    fn arb_json(depth: u32) -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(|n| json!(n)),
            "[a-zA-Z0-9 _\"\\\\]{0,12}".prop_map(Value::String),
        ];
        leaf.prop_recursive(depth, 32, 8, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn prop_encoding_deterministic(value in arb_json(3)) {
            let a = canonical_bytes(&value, &[]).unwrap();
            let b = canonical_bytes(&value, &[]).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_roundtrip_preserves_value(value in arb_json(3)) {
            // Canonical bytes are valid JSON that parses back to the input.
            let bytes = canonical_bytes(&value, &[]).unwrap();
            let parsed: Value = serde_json::from_slice(&bytes).unwrap();
            prop_assert_eq!(parsed, value);
        }
    }
}

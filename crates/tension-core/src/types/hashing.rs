//! Content-addressed identity.
//!
//! Ids are blake3 digests of a canonical JSON encoding: object keys sorted,
//! no insignificant whitespace. Only identity-bearing fields go in; timestamps
//! and file paths never do.

use serde_json::Value;

/// Canonical JSON encoding of `value`.
///
/// `serde_json::Map` is ordered by key, so any `Value` re-serializes with
/// sorted keys at every depth.
pub fn canonical_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail: keys are always strings and
    // non-finite floats are unrepresentable in `Value`.
    serde_json::to_string(value).unwrap_or_default()
}

/// Hex blake3 digest of raw bytes.
pub fn hash_bytes(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}

/// `prefix` + hex blake3 digest of the canonical encoding of `fields`.
pub fn content_id(prefix: &str, fields: &Value) -> String {
    format!("{prefix}{}", hash_bytes(canonical_json(fields).as_bytes()))
}

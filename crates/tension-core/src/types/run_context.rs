//! RunContext: binds a derivation pass to its exact inputs.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use super::hashing::{canonical_json, hash_bytes};

/// Identity of one baseline/candidate comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub run_pair_id: String,
    /// Named input source (e.g. `baseline/gates`) → blake3 of its raw bytes.
    pub inputs: BTreeMap<String, String>,
    /// Optional generation stamp. Excluded from the default match keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<String>,
}

impl RunContext {
    /// Build a context whose `run_pair_id` is derived from the input hashes.
    pub fn from_inputs(inputs: BTreeMap<String, String>) -> Self {
        let encoded = canonical_json(&serde_json::to_value(&inputs).unwrap_or(Value::Null));
        let digest = hash_bytes(encoded.as_bytes());
        Self {
            run_pair_id: format!("rp-{}", &digest[..16]),
            inputs,
            generated_at: None,
        }
    }

    pub fn with_run_pair_id(mut self, run_pair_id: impl Into<String>) -> Self {
        self.run_pair_id = run_pair_id.into();
        self
    }

    pub fn with_generated_at(mut self, generated_at: impl Into<String>) -> Self {
        self.generated_at = Some(generated_at.into());
        self
    }

    /// Top-level field value by key, as JSON. Unknown keys yield `Null`.
    pub fn field(&self, key: &str) -> Value {
        match key {
            "run_pair_id" => Value::String(self.run_pair_id.clone()),
            "inputs" => serde_json::to_value(&self.inputs).unwrap_or(Value::Null),
            "generated_at" => self
                .generated_at
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
            _ => Value::Null,
        }
    }

    /// First key in `keys` on which `self` and `other` differ, if any.
    pub fn mismatch_on<'k>(&self, other: &RunContext, keys: &'k [String]) -> Option<&'k str> {
        keys.iter()
            .find(|k| self.field(k) != other.field(k))
            .map(String::as_str)
    }

    /// True when `self` and `other` agree on every key in `keys`.
    pub fn matches_on(&self, other: &RunContext, keys: &[String]) -> bool {
        self.mismatch_on(other, keys).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> BTreeMap<String, String> {
        let mut m = BTreeMap::new();
        m.insert("baseline/gates".to_string(), "aa".to_string());
        m.insert("candidate/gates".to_string(), "bb".to_string());
        m
    }

    #[test]
    fn run_pair_id_is_stable() {
        let a = RunContext::from_inputs(inputs());
        let b = RunContext::from_inputs(inputs());
        assert_eq!(a.run_pair_id, b.run_pair_id);
        assert!(a.run_pair_id.starts_with("rp-"));
    }

    #[test]
    fn generated_at_is_ignored_on_default_keys() {
        let keys = vec!["run_pair_id".to_string(), "inputs".to_string()];
        let a = RunContext::from_inputs(inputs());
        let b = a.clone().with_generated_at("2026-01-01T00:00:00Z");
        assert!(a.matches_on(&b, &keys));

        let with_stamp = vec!["generated_at".to_string()];
        assert_eq!(a.mismatch_on(&b, &with_stamp), Some("generated_at"));
    }
}

//! Contract validator configuration.

use serde::{Deserialize, Serialize};

/// RunContext keys a validator may compare on.
pub const KNOWN_CONTEXT_KEYS: &[&str] = &["run_pair_id", "inputs", "generated_at"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ContractConfig {
    /// RunContext keys that must agree between edges and their atoms.
    /// Default: `run_pair_id`, `inputs`.
    pub allowed_context_keys: Vec<String>,
}

impl ContractConfig {
    pub fn effective_allowed_context_keys(&self) -> Vec<String> {
        if self.allowed_context_keys.is_empty() {
            vec!["run_pair_id".to_string(), "inputs".to_string()]
        } else {
            self.allowed_context_keys.clone()
        }
    }
}

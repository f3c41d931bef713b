//! Edge types.

use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;

use tension_core::constants::EDGE_ID_PREFIX;
use tension_core::{content_id, RunContext, Severity};

/// A tension between two atoms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub edge_id: String,
    #[serde(rename = "type")]
    pub edge_type: String,
    pub rule: String,
    pub src_atom_id: String,
    pub tension_atom_id: String,
    pub severity: Severity,
    /// Embedded so each edge can be verified without the atom document.
    pub run_context: RunContext,
}

impl Edge {
    pub fn compute_id(rule: &str, src_atom_id: &str, tension_atom_id: &str) -> String {
        content_id(
            EDGE_ID_PREFIX,
            &json!({
                "rule": rule,
                "src_atom_id": src_atom_id,
                "tension_atom_id": tension_atom_id,
            }),
        )
    }

    pub fn expected_id(&self) -> String {
        Self::compute_id(&self.rule, &self.src_atom_id, &self.tension_atom_id)
    }
}

/// Number of edges per edge type.
pub fn count_by_type(edges: &[Edge]) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for edge in edges {
        *counts.entry(edge.edge_type.clone()).or_insert(0) += 1;
    }
    counts
}

//! Acceptance checker configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AcceptanceConfig {
    /// Minimum total edge count. Default: 1.
    pub min_edges: Option<usize>,
    /// Minimum edge count per edge type.
    pub min_edges_by_type: BTreeMap<String, usize>,
}

impl AcceptanceConfig {
    pub fn effective_min_edges(&self) -> usize {
        self.min_edges.unwrap_or(1)
    }
}

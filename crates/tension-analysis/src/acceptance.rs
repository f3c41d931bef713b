//! Acceptance checker: a minimum-evidence gate over a validated edge set.
//!
//! Runs after the contract validator. A structurally valid but empty edge
//! document fails here with its own exit code.

use std::collections::BTreeMap;

use serde::Serialize;

use tension_core::config::AcceptanceConfig;
use tension_core::errors::AcceptanceError;

use crate::tensions::{count_by_type, Edge};

/// What the checker observed for a passing edge set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcceptanceReport {
    pub edge_count: usize,
    pub required: usize,
    pub by_type: BTreeMap<String, usize>,
}

pub struct AcceptanceChecker {
    min_edges: usize,
    min_edges_by_type: BTreeMap<String, usize>,
}

impl AcceptanceChecker {
    pub fn new(config: &AcceptanceConfig) -> Self {
        Self {
            min_edges: config.effective_min_edges(),
            min_edges_by_type: config.min_edges_by_type.clone(),
        }
    }

    /// Check `edges` against the configured minimums. The total minimum is
    /// checked first, then each per-type minimum in type-name order.
    pub fn check(&self, artifact: &str, edges: &[Edge]) -> Result<AcceptanceReport, AcceptanceError> {
        let by_type = count_by_type(edges);

        if edges.len() < self.min_edges {
            tracing::warn!(
                artifact,
                observed = edges.len(),
                required = self.min_edges,
                "acceptance failed"
            );
            return Err(AcceptanceError::InsufficientEdges {
                artifact: artifact.to_string(),
                observed: edges.len(),
                required: self.min_edges,
            });
        }

        for (edge_type, &required) in &self.min_edges_by_type {
            let observed = by_type.get(edge_type).copied().unwrap_or(0);
            if observed < required {
                tracing::warn!(artifact, %edge_type, observed, required, "acceptance failed");
                return Err(AcceptanceError::InsufficientEdgesOfType {
                    artifact: artifact.to_string(),
                    edge_type: edge_type.clone(),
                    observed,
                    required,
                });
            }
        }

        tracing::info!(artifact, edges = edges.len(), required = self.min_edges, "acceptance passed");
        Ok(AcceptanceReport {
            edge_count: edges.len(),
            required: self.min_edges,
            by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_edge_set_fails_default_minimum() {
        let checker = AcceptanceChecker::new(&AcceptanceConfig::default());
        let err = checker.check("edges.ndjson", &[]).unwrap_err();
        assert!(matches!(
            err,
            AcceptanceError::InsufficientEdges { observed: 0, required: 1, .. }
        ));
    }

    #[test]
    fn zero_minimum_accepts_empty_set() {
        let config = AcceptanceConfig {
            min_edges: Some(0),
            ..Default::default()
        };
        let report = AcceptanceChecker::new(&config).check("edges", &[]).unwrap();
        assert_eq!(report.edge_count, 0);
        assert!(report.by_type.is_empty());
    }
}

//! Edge deriver: pairwise rule matching over a complete atom set.

use std::collections::BTreeMap;

use tension_core::errors::ContractError;

use super::rules::{self, RuleTable};
use super::types::Edge;
use crate::atoms::Atom;

/// Matches every enabled rule against every atom pair of its type pattern.
///
/// Not incremental: `derive` needs the whole atom set of one RunContext.
pub struct EdgeDeriver {
    table: RuleTable,
}

impl EdgeDeriver {
    pub fn new(table: RuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Every qualifying pair yields an edge; there is no single-winner
    /// selection. Output is sorted by `edge_id` with duplicates collapsed.
    pub fn derive(&self, atoms: &[Atom]) -> Result<Vec<Edge>, ContractError> {
        if let Some(first) = atoms.first() {
            if let Some(other) = atoms.iter().find(|a| a.run_context != first.run_context) {
                return Err(ContractError::MixedRunContext {
                    first: first.run_context.run_pair_id.clone(),
                    other: other.run_context.run_pair_id.clone(),
                });
            }
        }

        let mut edges: BTreeMap<String, Edge> = BTreeMap::new();
        for rule in self.table.rules() {
            let lefts = atoms.iter().filter(|a| a.atom_type == rule.left);
            for left in lefts {
                for right in atoms.iter().filter(|a| a.atom_type == rule.right) {
                    let Some(severity) = rules::evaluate(rule, left, right) else {
                        continue;
                    };
                    let edge_id = Edge::compute_id(&rule.name, &left.atom_id, &right.atom_id);
                    tracing::debug!(
                        rule = %rule.name,
                        src = %left.subject,
                        tension = %right.subject,
                        %severity,
                        "tension"
                    );
                    edges.entry(edge_id.clone()).or_insert_with(|| Edge {
                        edge_id,
                        edge_type: rule.edge_type.clone(),
                        rule: rule.name.clone(),
                        src_atom_id: left.atom_id.clone(),
                        tension_atom_id: right.atom_id.clone(),
                        severity,
                        run_context: left.run_context.clone(),
                    });
                }
            }
        }

        tracing::info!(
            edges = edges.len(),
            atoms = atoms.len(),
            rules = self.table.rules().len(),
            version = %self.table.version,
            "tensions derived"
        );
        Ok(edges.into_values().collect())
    }
}

impl Default for EdgeDeriver {
    fn default() -> Self {
        Self::new(RuleTable::default())
    }
}

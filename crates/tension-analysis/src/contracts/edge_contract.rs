//! Edge document contract, checked against the companion atom document.

use std::collections::{HashMap, HashSet};

use serde_json::Value;

use tension_core::config::ContractConfig;
use tension_core::errors::{ContractError, ContractViolation};

use crate::atoms::{Atom, AtomDocument};
use crate::tensions::Edge;

/// One non-blank line of an NDJSON edge document.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeLine {
    /// 1-based line number in the source file.
    pub line: usize,
    /// Parsed JSON, or the parser's message.
    pub parsed: Result<Value, String>,
}

pub struct EdgeContract {
    allowed_keys: Vec<String>,
}

impl EdgeContract {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            allowed_keys: config.effective_allowed_context_keys(),
        }
    }

    /// Validate NDJSON edge lines and return the typed edges.
    pub fn validate_lines(
        &self,
        artifact: &str,
        lines: &[EdgeLine],
        atoms: &AtomDocument,
    ) -> Result<Vec<Edge>, ContractError> {
        let mut violations = Vec::new();
        let mut edges = Vec::with_capacity(lines.len());
        let mut line_numbers = Vec::with_capacity(lines.len());

        for entry in lines {
            match parse_edge(entry) {
                Ok(edge) => {
                    edges.push(edge);
                    line_numbers.push(entry.line);
                }
                Err(violation) => violations.push(violation),
            }
        }

        self.check(&edges, &line_numbers, atoms, &mut violations);
        finish(artifact, edges.len(), violations)?;
        Ok(edges)
    }

    /// Validate in-memory edges.
    pub fn validate(
        &self,
        artifact: &str,
        edges: &[Edge],
        atoms: &AtomDocument,
    ) -> Result<(), ContractError> {
        let line_numbers: Vec<usize> = (1..=edges.len()).collect();
        let mut violations = Vec::new();
        self.check(edges, &line_numbers, atoms, &mut violations);
        finish(artifact, edges.len(), violations)
    }

    fn check(
        &self,
        edges: &[Edge],
        line_numbers: &[usize],
        atoms: &AtomDocument,
        violations: &mut Vec<ContractViolation>,
    ) {
        let index: HashMap<&str, &Atom> = atoms
            .atoms
            .iter()
            .map(|a| (a.atom_id.as_str(), a))
            .collect();
        let mut seen = HashSet::new();

        for (edge, &line) in edges.iter().zip(line_numbers) {
            if edge.edge_id.is_empty() {
                violations.push(ContractViolation::EdgeIdEmpty { line });
                continue;
            }
            if edge.rule.is_empty() {
                violations.push(ContractViolation::EdgeRuleEmpty {
                    edge_id: edge.edge_id.clone(),
                });
            }

            let endpoints = [
                ("src_atom_id", &edge.src_atom_id),
                ("tension_atom_id", &edge.tension_atom_id),
            ];
            for (field, atom_id) in endpoints {
                match index.get(atom_id.as_str()) {
                    None => violations.push(ContractViolation::EdgeDanglingRef {
                        edge_id: edge.edge_id.clone(),
                        field,
                        atom_id: atom_id.clone(),
                    }),
                    Some(atom) => {
                        if let Some(key) =
                            edge.run_context.mismatch_on(&atom.run_context, &self.allowed_keys)
                        {
                            violations.push(ContractViolation::EdgeContextMismatch {
                                edge_id: edge.edge_id.clone(),
                                atom_id: atom_id.clone(),
                                key: key.to_string(),
                            });
                        }
                    }
                }
            }

            let expected = edge.expected_id();
            if expected != edge.edge_id {
                violations.push(ContractViolation::EdgeIdMismatch {
                    edge_id: edge.edge_id.clone(),
                    expected,
                });
            }
            if !seen.insert(edge.edge_id.as_str()) {
                violations.push(ContractViolation::EdgeIdDuplicate {
                    edge_id: edge.edge_id.clone(),
                });
            }
        }
    }
}

fn parse_edge(entry: &EdgeLine) -> Result<Edge, ContractViolation> {
    let value = entry
        .parsed
        .as_ref()
        .map_err(|message| ContractViolation::EdgeMalformed {
            line: entry.line,
            message: message.clone(),
        })?;
    match value.get("edge_id") {
        Some(Value::String(id)) if !id.is_empty() => {}
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(ContractViolation::EdgeIdEmpty { line: entry.line })
        }
        Some(other) => {
            return Err(ContractViolation::EdgeMalformed {
                line: entry.line,
                message: format!("edge_id must be a string, found {other}"),
            })
        }
    }
    serde_json::from_value(value.clone()).map_err(|e| ContractViolation::EdgeMalformed {
        line: entry.line,
        message: e.to_string(),
    })
}

fn finish(
    artifact: &str,
    edge_count: usize,
    violations: Vec<ContractViolation>,
) -> Result<(), ContractError> {
    if violations.is_empty() {
        tracing::debug!(artifact, edges = edge_count, "edge contract passed");
        return Ok(());
    }
    tracing::warn!(artifact, violations = violations.len(), "edge contract failed");
    Err(ContractError::EdgeContract {
        artifact: artifact.to_string(),
        violations,
    })
}

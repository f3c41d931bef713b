//! Atom and atom document types.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

use tension_core::constants::{ATOM_ID_PREFIX, ATOM_SCHEMA};
use tension_core::{content_id, AtomType, RunContext, Severity};

/// A single derived fact. Never mutated after derivation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Atom {
    pub atom_id: String,
    #[serde(rename = "type")]
    pub atom_type: AtomType,
    /// Gate name, metric name, or `document/key` for overlays.
    pub subject: String,
    pub before: Value,
    pub after: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// Descriptive fields outside the identity hash (direction, category, delta).
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, Value>,
    pub run_context: RunContext,
}

impl Atom {
    /// Content id over the identity-bearing fields only.
    pub fn compute_id(
        atom_type: AtomType,
        subject: &str,
        before: &Value,
        after: &Value,
        severity: Option<Severity>,
    ) -> String {
        content_id(
            ATOM_ID_PREFIX,
            &json!({
                "type": atom_type,
                "subject": subject,
                "before": before,
                "after": after,
                "severity": severity,
            }),
        )
    }

    /// The id this atom should carry given its current fields.
    pub fn expected_id(&self) -> String {
        Self::compute_id(
            self.atom_type,
            &self.subject,
            &self.before,
            &self.after,
            self.severity,
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomMeta {
    pub schema: String,
    pub run_context: RunContext,
    pub atom_count: usize,
}

/// Atoms of one derivation pass, sorted by `atom_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtomDocument {
    pub meta: AtomMeta,
    pub atoms: Vec<Atom>,
}

impl AtomDocument {
    /// Canonicalize `atoms` (sort by id, drop duplicate ids) into a document.
    pub fn new(run_context: RunContext, atoms: Vec<Atom>) -> Self {
        let mut by_id: BTreeMap<String, Atom> = BTreeMap::new();
        for atom in atoms {
            by_id.entry(atom.atom_id.clone()).or_insert(atom);
        }
        let atoms: Vec<Atom> = by_id.into_values().collect();
        Self {
            meta: AtomMeta {
                schema: ATOM_SCHEMA.to_string(),
                run_context,
                atom_count: atoms.len(),
            },
            atoms,
        }
    }

    pub fn get(&self, atom_id: &str) -> Option<&Atom> {
        self.atoms.iter().find(|a| a.atom_id == atom_id)
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Number of atoms per type.
    pub fn count_by_type(&self) -> BTreeMap<AtomType, usize> {
        let mut counts = BTreeMap::new();
        for atom in &self.atoms {
            *counts.entry(atom.atom_type).or_insert(0) += 1;
        }
        counts
    }
}

/// An atom document as read from disk: typed `meta`, atoms left raw so the
/// contract validator can report per-record problems.
#[derive(Debug, Clone, Deserialize)]
pub struct RawAtomDocument {
    pub meta: AtomMeta,
    pub atoms: Vec<Value>,
}

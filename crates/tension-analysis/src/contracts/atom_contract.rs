//! Atom document contract.

use std::collections::HashSet;

use serde_json::Value;

use tension_core::config::ContractConfig;
use tension_core::errors::{ContractError, ContractViolation};
use tension_core::AtomType;

use crate::atoms::{Atom, AtomDocument, RawAtomDocument};

pub struct AtomContract {
    allowed_keys: Vec<String>,
}

impl AtomContract {
    pub fn new(config: &ContractConfig) -> Self {
        Self {
            allowed_keys: config.effective_allowed_context_keys(),
        }
    }

    pub fn allowed_keys(&self) -> &[String] {
        &self.allowed_keys
    }

    /// Validate an atom document read from disk and return it typed.
    ///
    /// Records that do not even deserialize are reported by index; the
    /// remaining checks run on every record that does.
    pub fn validate_raw(
        &self,
        artifact: &str,
        raw: &RawAtomDocument,
    ) -> Result<AtomDocument, ContractError> {
        let mut violations = Vec::new();
        let mut atoms = Vec::with_capacity(raw.atoms.len());

        for (index, value) in raw.atoms.iter().enumerate() {
            match parse_atom(index, value) {
                Ok(atom) => atoms.push(atom),
                Err(violation) => violations.push(violation),
            }
        }

        let document = AtomDocument {
            meta: raw.meta.clone(),
            atoms,
        };
        self.check(&document, &mut violations);
        finish(artifact, &document, violations)?;
        Ok(document)
    }

    /// Validate an in-memory atom document.
    pub fn validate(&self, artifact: &str, document: &AtomDocument) -> Result<(), ContractError> {
        let mut violations = Vec::new();
        self.check(document, &mut violations);
        finish(artifact, document, violations)
    }

    fn check(&self, document: &AtomDocument, violations: &mut Vec<ContractViolation>) {
        let mut seen = HashSet::new();
        for (index, atom) in document.atoms.iter().enumerate() {
            if atom.atom_id.is_empty() {
                violations.push(ContractViolation::AtomIdEmpty { index });
                continue;
            }
            if atom.atom_type == AtomType::MetricDelta && atom.severity.is_none() {
                violations.push(ContractViolation::AtomFieldMissing {
                    atom_id: atom.atom_id.clone(),
                    field: "severity",
                });
            }
            let expected = atom.expected_id();
            if expected != atom.atom_id {
                violations.push(ContractViolation::AtomIdMismatch {
                    atom_id: atom.atom_id.clone(),
                    expected,
                });
            }
            if !seen.insert(atom.atom_id.as_str()) {
                violations.push(ContractViolation::AtomIdDuplicate {
                    atom_id: atom.atom_id.clone(),
                });
            }
            if let Some(key) = atom
                .run_context
                .mismatch_on(&document.meta.run_context, &self.allowed_keys)
            {
                violations.push(ContractViolation::AtomContextMismatch {
                    atom_id: atom.atom_id.clone(),
                    key: key.to_string(),
                });
            }
        }
    }
}

fn parse_atom(index: usize, value: &Value) -> Result<Atom, ContractViolation> {
    let Some(object) = value.as_object() else {
        return Err(ContractViolation::AtomMalformed {
            index,
            message: "not a JSON object".to_string(),
        });
    };
    match object.get("atom_id") {
        Some(Value::String(id)) if !id.is_empty() => {}
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(ContractViolation::AtomIdEmpty { index })
        }
        Some(other) => {
            return Err(ContractViolation::AtomMalformed {
                index,
                message: format!("atom_id must be a string, found {other}"),
            })
        }
    }
    let type_name = object.get("type").and_then(Value::as_str).unwrap_or_default();
    if !AtomType::all().iter().any(|t| t.as_str() == type_name) {
        return Err(ContractViolation::AtomTypeUnknown {
            index,
            found: type_name.to_string(),
        });
    }
    serde_json::from_value(value.clone()).map_err(|e| ContractViolation::AtomMalformed {
        index,
        message: e.to_string(),
    })
}

fn finish(
    artifact: &str,
    document: &AtomDocument,
    violations: Vec<ContractViolation>,
) -> Result<(), ContractError> {
    if violations.is_empty() {
        tracing::debug!(artifact, atoms = document.len(), "atom contract passed");
        return Ok(());
    }
    tracing::warn!(artifact, violations = violations.len(), "atom contract failed");
    Err(ContractError::AtomContract {
        artifact: artifact.to_string(),
        violations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;
    use tension_core::{RunContext, Severity};

    fn context() -> RunContext {
        let mut inputs = BTreeMap::new();
        inputs.insert("baseline/gates".to_string(), "aa".to_string());
        RunContext::from_inputs(inputs)
    }

    fn metric_atom(ctx: &RunContext) -> Atom {
        let before = json!(0.1);
        let after = json!(0.4);
        Atom {
            atom_id: Atom::compute_id(
                AtomType::MetricDelta,
                "latency",
                &before,
                &after,
                Some(Severity::Crit),
            ),
            atom_type: AtomType::MetricDelta,
            subject: "latency".to_string(),
            before,
            after,
            severity: Some(Severity::Crit),
            attributes: BTreeMap::new(),
            run_context: ctx.clone(),
        }
    }

    #[test]
    fn unknown_type_is_reported_by_index() {
        let ctx = context();
        let mut value = serde_json::to_value(metric_atom(&ctx)).unwrap();
        value["type"] = json!("mystery");
        let raw = RawAtomDocument {
            meta: AtomDocument::new(ctx, vec![]).meta,
            atoms: vec![value],
        };
        let err = AtomContract::new(&ContractConfig::default())
            .validate_raw("atoms.json", &raw)
            .unwrap_err();
        assert_eq!(err.violations()[0].code(), "ATOM_TYPE_UNKNOWN");
    }

    #[test]
    fn non_string_atom_id_is_malformed_not_empty() {
        let ctx = context();
        let mut value = serde_json::to_value(metric_atom(&ctx)).unwrap();
        value["atom_id"] = json!(42);
        let raw = RawAtomDocument {
            meta: AtomDocument::new(ctx, vec![]).meta,
            atoms: vec![value],
        };
        let err = AtomContract::new(&ContractConfig::default())
            .validate_raw("atoms.json", &raw)
            .unwrap_err();
        assert_eq!(err.violations().len(), 1);
        assert_eq!(err.violations()[0].code(), "ATOM_MALFORMED");
        assert!(err.to_string().contains("atom_id must be a string"));
    }

    #[test]
    fn metric_delta_without_severity_is_rejected() {
        let ctx = context();
        let mut atom = metric_atom(&ctx);
        atom.severity = None;
        atom.atom_id = atom.expected_id();
        let doc = AtomDocument::new(ctx, vec![atom]);
        let err = AtomContract::new(&ContractConfig::default())
            .validate("atoms", &doc)
            .unwrap_err();
        let codes: Vec<&str> = err.violations().iter().map(|v| v.code()).collect();
        assert_eq!(codes, vec!["ATOM_FIELD_MISSING"]);
    }
}

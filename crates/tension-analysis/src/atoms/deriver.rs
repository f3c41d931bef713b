//! Atom deriver: drift record → atom, 1:1.

use std::collections::BTreeMap;

use serde_json::{json, Value};

use tension_core::errors::{InputError, PipelineResult};
use tension_core::{AtomType, RunContext};

use super::types::Atom;
use crate::drift::{DriftRecord, FlipDirection};

/// Pure mapping from drift records to atoms under one RunContext.
pub struct AtomDeriver {
    run_context: RunContext,
    /// Name used in diagnostics for dropped records.
    source: String,
}

impl AtomDeriver {
    pub fn new(run_context: RunContext) -> Self {
        Self {
            run_context,
            source: "<drift>".to_string(),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Derive atoms for every complete record. Records missing a required
    /// field are dropped and reported in the result's `errors`.
    ///
    /// The output is sorted by `atom_id`, so record order never matters.
    pub fn derive(&self, records: &[DriftRecord]) -> PipelineResult<Vec<Atom>> {
        let mut result = PipelineResult::new(Vec::with_capacity(records.len()));
        for (index, record) in records.iter().enumerate() {
            match self.derive_one(record) {
                Ok(atom) => result.data.push(atom),
                Err(field) => {
                    tracing::warn!(
                        source = %self.source,
                        index,
                        kind = record.kind(),
                        field,
                        "drift record missing required field, dropped"
                    );
                    result.add_error(
                        InputError::MalformedKey {
                            path: self.source.clone(),
                            key: format!("records[{index}].{field}"),
                            message: format!("is required for {}", record.kind()),
                        }
                        .into(),
                    );
                }
            }
        }
        result.data.sort_by(|a, b| a.atom_id.cmp(&b.atom_id));
        result.data.dedup_by(|a, b| a.atom_id == b.atom_id);

        tracing::info!(
            atoms = result.data.len(),
            dropped = result.error_count(),
            "atoms derived"
        );
        result
    }

    /// One atom, or the name of the first missing required field.
    fn derive_one(&self, record: &DriftRecord) -> Result<Atom, &'static str> {
        match record {
            DriftRecord::GateFlip {
                gate,
                category,
                before,
                after,
            } => {
                let gate = gate.as_deref().ok_or("gate")?;
                let before = before.ok_or("before")?;
                let after = after.ok_or("after")?;
                let direction = FlipDirection::from_outcomes(before, after).ok_or("after")?;

                let mut attributes = BTreeMap::new();
                attributes.insert("direction".to_string(), json!(direction));
                if let Some(category) = category {
                    attributes.insert("category".to_string(), json!(category));
                }
                Ok(self.atom(
                    AtomType::GateFlip,
                    gate,
                    json!(before),
                    json!(after),
                    None,
                    attributes,
                ))
            }
            DriftRecord::MetricDelta {
                metric,
                before,
                after,
                delta,
                severity,
            } => {
                let metric = metric.as_deref().ok_or("metric")?;
                let before = before.ok_or("before")?;
                let after = after.ok_or("after")?;
                let severity = severity.ok_or("severity")?;

                let mut attributes = BTreeMap::new();
                let delta = delta.unwrap_or(after - before);
                if delta.is_finite() {
                    attributes.insert("delta".to_string(), json!(delta));
                }
                Ok(self.atom(
                    AtomType::MetricDelta,
                    metric,
                    json!(before),
                    json!(after),
                    Some(severity),
                    attributes,
                ))
            }
            DriftRecord::OverlayChange {
                document,
                key,
                before,
                after,
            } => {
                let document = document.as_deref().ok_or("document")?;
                let key = key.as_deref().ok_or("key")?;
                if before == after {
                    return Err("after");
                }

                let mut attributes = BTreeMap::new();
                attributes.insert("document".to_string(), json!(document));
                attributes.insert("key".to_string(), json!(key));
                Ok(self.atom(
                    AtomType::OverlayChange,
                    &format!("{document}/{key}"),
                    before.clone(),
                    after.clone(),
                    None,
                    attributes,
                ))
            }
        }
    }

    fn atom(
        &self,
        atom_type: AtomType,
        subject: &str,
        before: Value,
        after: Value,
        severity: Option<tension_core::Severity>,
        attributes: BTreeMap<String, Value>,
    ) -> Atom {
        Atom {
            atom_id: Atom::compute_id(atom_type, subject, &before, &after, severity),
            atom_type,
            subject: subject.to_string(),
            before,
            after,
            severity,
            attributes,
            run_context: self.run_context.clone(),
        }
    }
}

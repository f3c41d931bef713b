//! Status document types.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use tension_core::config::{AggregationPolicy, Comparator};
use tension_core::errors::{InputError, PolicyError};

use crate::snapshot::{read_gate_table, GateTable};

/// Gate name under which the external decision is mirrored.
pub const EXTERNAL_ALL_PASS_GATE: &str = "external_all_pass";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricStatus {
    Pass,
    Fail,
    Skipped,
}

/// One external detector's contribution to the status document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusMetric {
    pub name: String,
    pub value: Option<f64>,
    pub threshold: Option<f64>,
    pub comparator: Comparator,
    pub pass: Option<bool>,
    pub status: MetricStatus,
    /// Summary file, relative to the evidence directory.
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StatusMetric {
    pub fn is_produced(&self) -> bool {
        self.status != MetricStatus::Skipped
    }
}

/// An internal metric as supplied to the aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InternalMetric {
    pub value: f64,
    pub threshold: f64,
    #[serde(default)]
    pub comparator: Comparator,
}

impl InternalMetric {
    pub fn passes(&self) -> bool {
        self.comparator.holds(self.value, self.threshold)
    }
}

/// `metrics.*` entry of the status document.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricTriple {
    pub value: f64,
    pub threshold: f64,
    pub pass: bool,
}

/// Internal gates and metrics, recomputed by the caller for every run.
#[derive(Debug, Clone, Default)]
pub struct StatusInputs {
    pub gates: GateTable,
    pub metrics: BTreeMap<String, InternalMetric>,
}

impl StatusInputs {
    /// Load whichever internal input files are given. Both are optional;
    /// a given path must exist and parse.
    pub fn load(gates: Option<&Path>, metrics: Option<&Path>) -> Result<Self, InputError> {
        let mut inputs = Self::default();
        if let Some(path) = gates {
            inputs.gates = read_gate_table(path)?;
        }
        if let Some(path) = metrics {
            let bytes = std::fs::read(path).map_err(|e| InputError::from_io(path, &e))?;
            let raw: BTreeMap<String, serde_json::Value> = serde_json::from_slice(&bytes)
                .map_err(|e| InputError::malformed(path, e.to_string()))?;
            for (name, value) in raw {
                let metric: InternalMetric =
                    serde_json::from_value(value).map_err(|e| InputError::MalformedKey {
                        path: path.display().to_string(),
                        key: name.clone(),
                        message: e.to_string(),
                    })?;
                if !metric.value.is_finite() || !metric.threshold.is_finite() {
                    return Err(InputError::MalformedKey {
                        path: path.display().to_string(),
                        key: name,
                        message: "value and threshold must be finite".to_string(),
                    });
                }
                inputs.metrics.insert(name, metric);
            }
        }
        if inputs.gates.contains_key(EXTERNAL_ALL_PASS_GATE) {
            return Err(InputError::MalformedKey {
                path: gates.map(|p| p.display().to_string()).unwrap_or_default(),
                key: EXTERNAL_ALL_PASS_GATE.to_string(),
                message: "is reserved for the external decision".to_string(),
            });
        }
        Ok(inputs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalSection {
    pub policy: AggregationPolicy,
    pub strict_evidence: bool,
    pub metrics: Vec<StatusMetric>,
    pub evaluated: usize,
    pub skipped: usize,
    pub all_pass: bool,
}

/// The published status document. Field order is the output key order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusDocument {
    pub schema: String,
    pub release_pass: bool,
    pub external_all_pass: bool,
    pub gates: BTreeMap<String, bool>,
    pub metrics: BTreeMap<String, MetricTriple>,
    pub external: ExternalSection,
}

impl StatusDocument {
    /// Check that the three copies of the external decision agree.
    pub fn verify_mirrors(&self) -> Result<(), PolicyError> {
        let nested = self.external.all_pass;
        let top = self.external_all_pass;
        let gate = self.gates.get(EXTERNAL_ALL_PASS_GATE).copied();
        match gate {
            Some(gate) if gate == nested && gate == top => Ok(()),
            // A missing mirror counts as diverging.
            gate => Err(PolicyError::MirrorDivergence {
                nested,
                gate: gate.unwrap_or(!nested),
                top,
            }),
        }
    }

    /// Internal gates that are false, excluding the external mirror.
    pub fn failing_gates(&self) -> Vec<String> {
        self.gates
            .iter()
            .filter(|(name, passed)| name.as_str() != EXTERNAL_ALL_PASS_GATE && !**passed)
            .map(|(name, _)| name.clone())
            .collect()
    }
}

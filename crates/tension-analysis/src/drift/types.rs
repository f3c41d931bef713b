//! Drift record types.
//!
//! Every field is optional on the wire so a drift document written by another
//! tool can be read record by record; the atom deriver decides which records
//! are complete enough to become atoms.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use tension_core::constants::DRIFT_SCHEMA;
use tension_core::{RunContext, Severity};

/// Direction of a gate flip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipDirection {
    PassToFail,
    FailToPass,
}

impl FlipDirection {
    pub fn from_outcomes(before: bool, after: bool) -> Option<Self> {
        match (before, after) {
            (true, false) => Some(Self::PassToFail),
            (false, true) => Some(Self::FailToPass),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PassToFail => "pass_to_fail",
            Self::FailToPass => "fail_to_pass",
        }
    }
}

impl fmt::Display for FlipDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized difference between baseline and candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DriftRecord {
    GateFlip {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gate: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        category: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<bool>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<bool>,
    },
    MetricDelta {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        metric: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        before: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        after: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        delta: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        severity: Option<Severity>,
    },
    OverlayChange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        document: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        /// `null` when the key is absent from the baseline.
        #[serde(default)]
        before: Value,
        /// `null` when the key is absent from the candidate.
        #[serde(default)]
        after: Value,
    },
}

impl DriftRecord {
    pub fn gate_flip(gate: &str, category: &str, before: bool, after: bool) -> Self {
        Self::GateFlip {
            gate: Some(gate.to_string()),
            category: Some(category.to_string()),
            before: Some(before),
            after: Some(after),
        }
    }

    pub fn metric_delta(metric: &str, before: f64, after: f64, severity: Severity) -> Self {
        Self::MetricDelta {
            metric: Some(metric.to_string()),
            before: Some(before),
            after: Some(after),
            // An overflowing difference has no JSON representation.
            delta: Some(after - before).filter(|d| d.is_finite()),
            severity: Some(severity),
        }
    }

    pub fn overlay_change(document: &str, key: &str, before: Value, after: Value) -> Self {
        Self::OverlayChange {
            document: Some(document.to_string()),
            key: Some(key.to_string()),
            before,
            after,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::GateFlip { .. } => "gate_flip",
            Self::MetricDelta { .. } => "metric_delta",
            Self::OverlayChange { .. } => "overlay_change",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftMeta {
    pub schema: String,
    pub run_context: RunContext,
    pub record_count: usize,
}

/// The drift stream of one comparison. An empty `records` list is the
/// first-class "no drift" outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftDocument {
    pub meta: DriftMeta,
    pub records: Vec<DriftRecord>,
}

impl DriftDocument {
    pub fn new(run_context: RunContext, records: Vec<DriftRecord>) -> Self {
        Self {
            meta: DriftMeta {
                schema: DRIFT_SCHEMA.to_string(),
                run_context,
                record_count: records.len(),
            },
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for DriftDocument {
    fn default() -> Self {
        Self::new(RunContext::from_inputs(Default::default()), Vec::new())
    }
}

//! External detector probing.
//!
//! A detector that cannot be read is never an error here: it becomes an
//! explicit `skipped` entry carrying the reason.

use std::path::Path;

use serde_json::Value;

use tension_core::config::{Comparator, DetectorSpec};

use super::types::{MetricStatus, StatusMetric};

#[derive(Debug, Clone, PartialEq)]
pub enum ProbeOutcome {
    Produced { value: f64, value_key: String },
    Skipped {
        reason: String,
        /// The summary file itself parsed, only the value was unusable.
        summary_parsed: bool,
    },
}

/// Result of reading one detector's summary.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorProbe {
    pub name: String,
    pub source: String,
    pub threshold: Option<f64>,
    pub comparator: Comparator,
    pub outcome: ProbeOutcome,
}

impl DetectorProbe {
    /// Read `spec`'s summary from `evidence_dir`.
    pub fn run(evidence_dir: &Path, spec: &DetectorSpec, threshold: Option<f64>) -> Self {
        let path = evidence_dir.join(&spec.file);
        let outcome = match read_summary(&path) {
            Err(reason) => ProbeOutcome::Skipped {
                reason,
                summary_parsed: false,
            },
            Ok(summary) => extract_value(&summary, spec),
        };
        if let ProbeOutcome::Skipped { reason, .. } = &outcome {
            tracing::warn!(detector = %spec.name, path = %path.display(), %reason, "detector skipped");
        }
        Self {
            name: spec.name.clone(),
            source: spec.file.clone(),
            threshold,
            comparator: spec.comparator,
            outcome,
        }
    }

    pub fn summary_parsed(&self) -> bool {
        match &self.outcome {
            ProbeOutcome::Produced { .. } => true,
            ProbeOutcome::Skipped { summary_parsed, .. } => *summary_parsed,
        }
    }

    /// The status entry for this probe.
    pub fn to_metric(&self) -> StatusMetric {
        match (&self.outcome, self.threshold) {
            (ProbeOutcome::Produced { value, .. }, Some(threshold)) => {
                let pass = self.comparator.holds(*value, threshold);
                StatusMetric {
                    name: self.name.clone(),
                    value: Some(*value),
                    threshold: Some(threshold),
                    comparator: self.comparator,
                    pass: Some(pass),
                    status: if pass { MetricStatus::Pass } else { MetricStatus::Fail },
                    source: self.source.clone(),
                    reason: None,
                }
            }
            (ProbeOutcome::Produced { value, .. }, None) => StatusMetric {
                name: self.name.clone(),
                value: Some(*value),
                threshold: None,
                comparator: self.comparator,
                pass: None,
                status: MetricStatus::Skipped,
                source: self.source.clone(),
                reason: Some("no threshold configured".to_string()),
            },
            (ProbeOutcome::Skipped { reason, .. }, threshold) => StatusMetric {
                name: self.name.clone(),
                value: None,
                threshold,
                comparator: self.comparator,
                pass: None,
                status: MetricStatus::Skipped,
                source: self.source.clone(),
                reason: Some(reason.clone()),
            },
        }
    }
}

fn read_summary(path: &Path) -> Result<Value, String> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err("summary file absent".to_string())
        }
        Err(e) => return Err(format!("summary file unreadable: {e}")),
    };
    serde_json::from_slice(&bytes).map_err(|e| format!("summary file unparseable: {e}"))
}

fn extract_value(summary: &Value, spec: &DetectorSpec) -> ProbeOutcome {
    let keys = spec.value_keys();
    for key in &keys {
        match lookup(summary, key) {
            Some(Value::Number(n)) => match n.as_f64().filter(|v| v.is_finite()) {
                Some(value) => {
                    return ProbeOutcome::Produced {
                        value,
                        value_key: key.to_string(),
                    }
                }
                None => {
                    return skipped_parsed(format!("value at `{key}` is not a finite number"))
                }
            },
            Some(other) => {
                return skipped_parsed(format!("value at `{key}` is not numeric: {other}"))
            }
            None => continue,
        }
    }
    skipped_parsed(format!("no value at {}", keys.join(" or ")))
}

fn skipped_parsed(reason: String) -> ProbeOutcome {
    ProbeOutcome::Skipped {
        reason,
        summary_parsed: true,
    }
}

/// Dotted-path lookup: `a.b.c` descends through nested objects.
pub fn lookup<'v>(document: &'v Value, path: &str) -> Option<&'v Value> {
    path.split('.')
        .try_fold(document, |current, segment| current.as_object()?.get(segment))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dotted_lookup_descends() {
        let doc = json!({"summary": {"rate": 0.25}});
        assert_eq!(lookup(&doc, "summary.rate"), Some(&json!(0.25)));
        assert_eq!(lookup(&doc, "summary.value"), None);
        assert_eq!(lookup(&doc, "summary.rate.x"), None);
    }

    #[test]
    fn default_keys_fall_back_to_rate() {
        let spec = DetectorSpec {
            name: "flip".to_string(),
            file: "flip.json".to_string(),
            value_key: None,
            threshold_key: "flip_max".to_string(),
            comparator: Comparator::Le,
        };
        let outcome = extract_value(&json!({"rate": 0.1}), &spec);
        assert_eq!(
            outcome,
            ProbeOutcome::Produced {
                value: 0.1,
                value_key: "rate".to_string()
            }
        );
    }
}

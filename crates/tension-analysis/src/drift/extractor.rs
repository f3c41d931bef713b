//! Drift extractor: baseline vs candidate snapshot diff.

use std::collections::BTreeMap;

use serde_json::Value;

use tension_core::config::DriftConfig;
use tension_core::{RunContext, Severity};

use super::types::{DriftRecord, FlipDirection};
use crate::snapshot::RunSnapshot;

/// Build the RunContext for a comparison from both snapshots' input hashes.
///
/// Keys are `baseline/<input>` and `candidate/<input>`. The run pair id is
/// derived from the hashes unless `run_pair_id` is given.
pub fn build_run_context(
    baseline: &RunSnapshot,
    candidate: &RunSnapshot,
    run_pair_id: Option<&str>,
) -> RunContext {
    let mut inputs = BTreeMap::new();
    for (name, hash) in &baseline.input_hashes {
        inputs.insert(format!("baseline/{name}"), hash.clone());
    }
    for (name, hash) in &candidate.input_hashes {
        inputs.insert(format!("candidate/{name}"), hash.clone());
    }
    let context = RunContext::from_inputs(inputs);
    match run_pair_id {
        Some(id) => context.with_run_pair_id(id),
        None => context,
    }
}

/// Diffs two snapshots into drift records. Emits no atoms.
pub struct DriftExtractor<'a> {
    config: &'a DriftConfig,
}

impl<'a> DriftExtractor<'a> {
    pub fn new(config: &'a DriftConfig) -> Self {
        Self { config }
    }

    /// All drift between `baseline` and `candidate`, gates first, then
    /// metrics, then overlays, each ordered by name.
    pub fn extract(&self, baseline: &RunSnapshot, candidate: &RunSnapshot) -> Vec<DriftRecord> {
        let mut records = self.gate_flips(baseline, candidate);
        records.extend(self.metric_deltas(baseline, candidate));
        records.extend(self.overlay_changes(baseline, candidate));

        tracing::info!(records = records.len(), "drift extracted");
        records
    }

    fn gate_flips(&self, baseline: &RunSnapshot, candidate: &RunSnapshot) -> Vec<DriftRecord> {
        let mut records = Vec::new();
        for (gate, before) in &baseline.gates {
            let Some(after) = candidate.gates.get(gate) else {
                tracing::debug!(gate = %gate, "gate missing from candidate, ignored");
                continue;
            };
            if let Some(direction) = FlipDirection::from_outcomes(before.passed, after.passed) {
                tracing::debug!(gate = %gate, %direction, "gate flip");
                records.push(DriftRecord::gate_flip(
                    gate,
                    &after.category,
                    before.passed,
                    after.passed,
                ));
            }
        }
        for gate in candidate.gates.keys() {
            if !baseline.gates.contains_key(gate) {
                tracing::debug!(gate = %gate, "gate missing from baseline, ignored");
            }
        }
        records
    }

    fn metric_deltas(&self, baseline: &RunSnapshot, candidate: &RunSnapshot) -> Vec<DriftRecord> {
        let mut records = Vec::new();
        for (metric, before_raw) in &baseline.metrics {
            let Some(after_raw) = candidate.metrics.get(metric) else {
                tracing::debug!(metric = %metric, "metric missing from candidate, ignored");
                continue;
            };
            let (Some(before), Some(after)) = (finite(before_raw), finite(after_raw)) else {
                tracing::debug!(metric = %metric, "non-numeric metric value, skipped");
                continue;
            };

            let magnitude = (after - before).abs();
            let severity = if magnitude.is_infinite() {
                // Finite operands whose difference overflows are beyond any band.
                tracing::warn!(metric = %metric, before, after, "metric delta overflows, classified crit");
                Some(Severity::Crit)
            } else {
                match self.config.band_for(metric) {
                    Some(band) => band.classify(magnitude),
                    None if magnitude > 0.0 => Some(Severity::Info),
                    None => None,
                }
            };
            match severity {
                Some(severity) => {
                    tracing::debug!(metric = %metric, before, after, %severity, "metric delta");
                    records.push(DriftRecord::metric_delta(metric, before, after, severity));
                }
                None => {
                    tracing::trace!(metric = %metric, magnitude, "delta below info band, dropped");
                }
            }
        }
        records
    }

    fn overlay_changes(&self, baseline: &RunSnapshot, candidate: &RunSnapshot) -> Vec<DriftRecord> {
        let empty = BTreeMap::new();
        let mut documents: Vec<&String> = baseline
            .overlays
            .keys()
            .chain(candidate.overlays.keys())
            .collect();
        documents.sort();
        documents.dedup();

        let mut records = Vec::new();
        for document in documents {
            if !self.config.is_overlay_allowed(document) {
                tracing::debug!(document = %document, "overlay not allowlisted, ignored");
                continue;
            }
            let before_doc = baseline.overlays.get(document).unwrap_or(&empty);
            let after_doc = candidate.overlays.get(document).unwrap_or(&empty);

            let mut keys: Vec<&String> = before_doc.keys().chain(after_doc.keys()).collect();
            keys.sort();
            keys.dedup();

            for key in keys {
                let before = before_doc.get(key).cloned().unwrap_or(Value::Null);
                let after = after_doc.get(key).cloned().unwrap_or(Value::Null);
                if before != after {
                    tracing::debug!(document = %document, key = %key, "overlay change");
                    records.push(DriftRecord::overlay_change(document, key, before, after));
                }
            }
        }
        records
    }
}

fn finite(value: &Value) -> Option<f64> {
    value.as_f64().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tension_core::config::MetricBand;

    fn snapshot(gates: &str, metrics: &str, overlays: &str) -> RunSnapshot {
        RunSnapshot::from_json(gates, metrics, overlays).unwrap()
    }

    #[test]
    fn unconfigured_metric_defaults_to_info() {
        let config = DriftConfig::default();
        let a = snapshot("{}", r#"{"m": 1.0}"#, "{}");
        let b = snapshot("{}", r#"{"m": 1.5}"#, "{}");
        let records = DriftExtractor::new(&config).extract(&a, &b);
        assert_eq!(records, vec![DriftRecord::metric_delta("m", 1.0, 1.5, Severity::Info)]);
    }

    #[test]
    fn default_band_applies_to_unlisted_metrics() {
        let config = DriftConfig {
            default_band: Some(MetricBand::new(0.0, 0.1, 0.2)),
            ..Default::default()
        };
        let a = snapshot("{}", r#"{"m": 0.50}"#, "{}");
        let b = snapshot("{}", r#"{"m": 0.75}"#, "{}");
        let records = DriftExtractor::new(&config).extract(&a, &b);
        assert!(matches!(
            records[0],
            DriftRecord::MetricDelta {
                severity: Some(Severity::Crit),
                ..
            }
        ));
    }

    #[test]
    fn overflowing_delta_is_crit_with_any_band() {
        let banded = DriftConfig {
            default_band: Some(MetricBand::new(0.0, 1.0, 10.0)),
            ..Default::default()
        };
        let unbanded = DriftConfig::default();
        let a = snapshot("{}", r#"{"m": -1.7e308}"#, "{}");
        let b = snapshot("{}", r#"{"m": 1.7e308}"#, "{}");
        for config in [&banded, &unbanded] {
            let records = DriftExtractor::new(config).extract(&a, &b);
            assert_eq!(records.len(), 1);
            assert!(matches!(
                records[0],
                DriftRecord::MetricDelta {
                    severity: Some(Severity::Crit),
                    delta: None,
                    ..
                }
            ));
        }
    }

    #[test]
    fn removed_overlay_key_is_a_change() {
        let config = DriftConfig {
            overlay_allowlist: vec!["doc".to_string()],
            ..Default::default()
        };
        let a = snapshot("{}", "{}", r#"{"doc": {"k": 1}}"#);
        let b = snapshot("{}", "{}", r#"{"doc": {}}"#);
        let records = DriftExtractor::new(&config).extract(&a, &b);
        assert_eq!(
            records,
            vec![DriftRecord::overlay_change("doc", "k", serde_json::json!(1), Value::Null)]
        );
    }
}

//! Status aggregator.

use std::collections::BTreeMap;
use std::path::Path;

use tension_core::config::StatusConfig;
use tension_core::constants::STATUS_SCHEMA;
use tension_core::errors::{FailingMetric, PipelineError, PolicyError};

use super::detectors::DetectorProbe;
use super::evidence::require_evidence;
use super::policy::PolicyEngine;
use super::types::*;

/// Builds a status document from scratch on every call; nothing is carried
/// between runs.
pub struct StatusAggregator<'a> {
    config: &'a StatusConfig,
}

impl<'a> StatusAggregator<'a> {
    pub fn new(config: &'a StatusConfig) -> Self {
        Self { config }
    }

    /// Probe every configured detector, in configuration order.
    pub fn probe(&self, evidence_dir: &Path) -> Vec<DetectorProbe> {
        self.config
            .detectors
            .iter()
            .map(|spec| DetectorProbe::run(evidence_dir, spec, self.config.threshold_for(spec)))
            .collect()
    }

    /// Aggregate internal inputs and external evidence into a status document.
    ///
    /// With strict evidence on, an evidence directory without a single
    /// parseable summary fails before any decision is computed.
    pub fn aggregate(
        &self,
        inputs: &StatusInputs,
        evidence_dir: &Path,
    ) -> Result<StatusDocument, PipelineError> {
        let strict = self.config.effective_strict_evidence();
        let probes = self.probe(evidence_dir);
        if strict {
            require_evidence(evidence_dir, &probes)?;
        }

        let external_metrics: Vec<StatusMetric> = probes.iter().map(DetectorProbe::to_metric).collect();
        let outcome = PolicyEngine::new(self.config.effective_policy()).evaluate(&external_metrics);
        let external_all_pass = outcome.all_pass;

        let mut gates: BTreeMap<String, bool> = inputs
            .gates
            .iter()
            .map(|(name, record)| (name.clone(), record.passed))
            .collect();
        gates.insert(EXTERNAL_ALL_PASS_GATE.to_string(), external_all_pass);

        let metrics: BTreeMap<String, MetricTriple> = inputs
            .metrics
            .iter()
            .map(|(name, metric)| {
                (
                    name.clone(),
                    MetricTriple {
                        value: metric.value,
                        threshold: metric.threshold,
                        pass: metric.passes(),
                    },
                )
            })
            .collect();

        let internal_pass =
            inputs.gates.values().all(|g| g.passed) && metrics.values().all(|m| m.pass);

        let document = StatusDocument {
            schema: STATUS_SCHEMA.to_string(),
            release_pass: external_all_pass && internal_pass,
            external_all_pass,
            gates,
            metrics,
            external: ExternalSection {
                policy: outcome.policy,
                strict_evidence: strict,
                metrics: external_metrics,
                evaluated: outcome.evaluated,
                skipped: outcome.skipped,
                all_pass: external_all_pass,
            },
        };
        document.verify_mirrors()?;

        if outcome.is_vacuous() && !strict {
            tracing::warn!(
                skipped = outcome.skipped,
                "no detector produced a metric; external decision passes vacuously"
            );
        }
        tracing::info!(
            policy = %outcome.policy,
            evaluated = outcome.evaluated,
            skipped = outcome.skipped,
            external_all_pass,
            release_pass = document.release_pass,
            "status aggregated"
        );
        Ok(document)
    }

    /// Turn a failing decision into a `PolicyError` naming what failed.
    pub fn enforce(&self, inputs: &StatusInputs, document: &StatusDocument) -> Result<(), PolicyError> {
        if document.release_pass {
            return Ok(());
        }

        let mut failing_metrics = Vec::new();
        if !document.external_all_pass {
            failing_metrics.extend(
                document
                    .external
                    .metrics
                    .iter()
                    .filter(|m| m.status == MetricStatus::Fail)
                    .filter_map(|m| {
                        Some(FailingMetric {
                            name: m.name.clone(),
                            value: m.value?,
                            threshold: m.threshold?,
                            comparator: m.comparator.symbol().to_string(),
                        })
                    }),
            );
        }
        for (name, triple) in &document.metrics {
            if !triple.pass {
                let comparator = inputs
                    .metrics
                    .get(name)
                    .map(|m| m.comparator)
                    .unwrap_or_default();
                failing_metrics.push(FailingMetric {
                    name: name.clone(),
                    value: triple.value,
                    threshold: triple.threshold,
                    comparator: comparator.symbol().to_string(),
                });
            }
        }

        Err(PolicyError::Failed {
            policy: document.external.policy.to_string(),
            failing_metrics,
            failing_gates: document.failing_gates(),
        })
    }
}

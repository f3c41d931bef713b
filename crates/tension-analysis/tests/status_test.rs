//! Status aggregation: policies, vacuity, strict evidence, mirrors.

mod common;

use common::{fixture, fixture_config};
use tension_analysis::export::render_json;
use tension_analysis::snapshot::GateRecord;
use tension_analysis::status::*;
use tension_core::config::{AggregationPolicy, Comparator, StatusConfig};
use tension_core::errors::{ExitCode, PipelineError, PolicyError, TensionErrorCode};

fn status_config(policy: AggregationPolicy, strict: bool) -> StatusConfig {
    let mut config = fixture_config("evidence/tension.toml").status;
    config.policy = Some(policy);
    config.strict_evidence = Some(strict);
    config
}

fn internal_inputs() -> StatusInputs {
    StatusInputs::load(
        Some(&fixture("evidence/internal_gates.json")),
        Some(&fixture("evidence/internal_metrics.json")),
    )
    .unwrap()
}

#[test]
fn test_complete_evidence_passes_release() {
    let config = status_config(AggregationPolicy::All, true);
    let doc = StatusAggregator::new(&config)
        .aggregate(&internal_inputs(), &fixture("evidence/complete"))
        .unwrap();

    assert!(doc.external_all_pass);
    assert!(doc.release_pass);
    assert_eq!(doc.external.evaluated, 2);
    assert_eq!(doc.external.skipped, 0);
    assert!(doc.gates["external_all_pass"]);
    assert!(doc.gates["schema_valid"]);
    assert!(doc.metrics["wilson_lower_accuracy"].pass);
    doc.verify_mirrors().unwrap();

    let coverage = doc.external.metrics.iter().find(|m| m.name == "coverage").unwrap();
    assert_eq!(coverage.value, Some(0.97));
    assert_eq!(coverage.comparator, Comparator::Ge);
    assert_eq!(coverage.status, MetricStatus::Pass);
}

#[test]
fn test_all_and_any_pass_vacuously_with_no_metrics() {
    let empty = tempfile::tempdir().unwrap();
    for policy in [AggregationPolicy::All, AggregationPolicy::Any] {
        let config = status_config(policy, false);
        let doc = StatusAggregator::new(&config)
            .aggregate(&StatusInputs::default(), empty.path())
            .unwrap();
        assert!(doc.external_all_pass, "{policy} should pass vacuously");
        assert!(doc.release_pass);
        assert_eq!(doc.external.evaluated, 0);
        assert_eq!(doc.external.skipped, 2);
    }
}

#[test]
fn test_strict_evidence_fails_closed_on_empty_directory() {
    let empty = tempfile::tempdir().unwrap();
    let config = status_config(AggregationPolicy::All, true);
    let err = StatusAggregator::new(&config)
        .aggregate(&StatusInputs::default(), empty.path())
        .unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Policy(PolicyError::EvidenceMissing { checked: 2, .. })
    ));
    assert_eq!(err.exit_code(), ExitCode::PolicyFailure);
}

#[test]
fn test_strict_evidence_fails_closed_on_garbled_summaries() {
    let config = status_config(AggregationPolicy::Any, true);
    let err = StatusAggregator::new(&config)
        .aggregate(&StatusInputs::default(), &fixture("evidence/garbled"))
        .unwrap_err();
    assert!(err.to_string().contains("no parseable detector summary"));
}

#[test]
fn test_strict_evidence_with_no_detectors_configured_fails() {
    let config = StatusConfig {
        strict_evidence: Some(true),
        ..Default::default()
    };
    let empty = tempfile::tempdir().unwrap();
    let err = StatusAggregator::new(&config)
        .aggregate(&StatusInputs::default(), empty.path())
        .unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::PolicyFailure);
}

#[test]
fn test_skipped_detectors_are_visible() {
    let config = status_config(AggregationPolicy::All, false);
    let doc = StatusAggregator::new(&config)
        .aggregate(&StatusInputs::default(), &fixture("evidence/garbled"))
        .unwrap();
    assert_eq!(doc.external.metrics.len(), 2);
    for metric in &doc.external.metrics {
        assert_eq!(metric.status, MetricStatus::Skipped);
        assert!(metric.pass.is_none());
        assert!(metric.reason.is_some());
    }
    let flip = &doc.external.metrics[0];
    assert!(flip.reason.as_deref().unwrap().contains("unparseable"));
    let coverage = &doc.external.metrics[1];
    assert!(coverage.reason.as_deref().unwrap().contains("absent"));
}

#[test]
fn test_partial_evidence_fails_under_both_policies() {
    for policy in [AggregationPolicy::All, AggregationPolicy::Any] {
        let config = status_config(policy, true);
        let aggregator = StatusAggregator::new(&config);
        let inputs = internal_inputs();
        let doc = aggregator
            .aggregate(&inputs, &fixture("evidence/partial"))
            .unwrap();
        assert_eq!(doc.external.evaluated, 1);
        assert_eq!(doc.external.skipped, 1);
        assert!(!doc.external_all_pass);
        assert!(!doc.release_pass);

        let err = aggregator.enforce(&inputs, &doc).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("flip_rate: 0.08 <= 0.05 is false"), "{message}");
        assert_eq!(err.exit_code(), ExitCode::PolicyFailure);
    }
}

#[test]
fn test_any_policy_passes_with_one_passing_metric() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("flip_rate.json"), r#"{"rate": 0.9}"#).unwrap();
    std::fs::write(
        dir.path().join("coverage.json"),
        r#"{"summary": {"covered": 0.99}}"#,
    )
    .unwrap();

    let any = status_config(AggregationPolicy::Any, false);
    let doc = StatusAggregator::new(&any)
        .aggregate(&StatusInputs::default(), dir.path())
        .unwrap();
    assert!(doc.external_all_pass);

    let all = status_config(AggregationPolicy::All, false);
    let doc = StatusAggregator::new(&all)
        .aggregate(&StatusInputs::default(), dir.path())
        .unwrap();
    assert!(!doc.external_all_pass);
}

#[test]
fn test_failing_internal_gate_blocks_release_only() {
    let mut inputs = internal_inputs();
    inputs.gates.insert(
        "edges_present".to_string(),
        GateRecord {
            category: "presence".to_string(),
            passed: false,
        },
    );
    let config = status_config(AggregationPolicy::All, false);
    let aggregator = StatusAggregator::new(&config);
    let doc = aggregator
        .aggregate(&inputs, &fixture("evidence/complete"))
        .unwrap();
    assert!(doc.external_all_pass);
    assert!(!doc.release_pass);
    assert_eq!(doc.failing_gates(), vec!["edges_present".to_string()]);

    let err = aggregator.enforce(&inputs, &doc).unwrap_err();
    assert!(err.to_string().contains("gate edges_present is false"));
}

#[test]
fn test_mirror_divergence_is_detected() {
    let config = status_config(AggregationPolicy::All, false);
    let mut doc = StatusAggregator::new(&config)
        .aggregate(&StatusInputs::default(), &fixture("evidence/complete"))
        .unwrap();
    doc.external.all_pass = false;
    let err = doc.verify_mirrors().unwrap_err();
    assert!(matches!(err, PolicyError::MirrorDivergence { nested: false, .. }));
    assert_eq!(err.exit_code(), ExitCode::Internal);

    doc.external.all_pass = true;
    doc.gates.remove("external_all_pass");
    assert!(doc.verify_mirrors().is_err());
}

#[test]
fn test_reserved_gate_name_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gates.json");
    std::fs::write(&path, r#"{"external_all_pass": true}"#).unwrap();
    let err = StatusInputs::load(Some(&path), None).unwrap_err();
    assert_eq!(err.exit_code(), ExitCode::MalformedInput);
}

#[test]
fn test_status_document_key_order_is_stable() {
    let config = status_config(AggregationPolicy::All, false);
    let doc = StatusAggregator::new(&config)
        .aggregate(&internal_inputs(), &fixture("evidence/complete"))
        .unwrap();
    let text = String::from_utf8(render_json("status.json", &doc).unwrap()).unwrap();
    let positions: Vec<usize> = [
        "\"schema\"",
        "\"release_pass\"",
        "\"external_all_pass\"",
        "\"gates\"",
        "\"metrics\"",
        "\"external\"",
    ]
    .iter()
    .map(|key| text.find(key).unwrap())
    .collect();
    let mut sorted = positions.clone();
    sorted.sort();
    assert_eq!(positions, sorted);
    assert!(text.ends_with("}\n"));
}

//! Contract validator: structural checks, referential integrity, RunContext agreement.

mod common;

use common::{context, document_for};
use serde_json::json;
use tension_analysis::atoms::{AtomDocument, RawAtomDocument};
use tension_analysis::contracts::{AtomContract, EdgeContract};
use tension_analysis::drift::DriftRecord;
use tension_analysis::export::parse_edge_lines;
use tension_analysis::tensions::{Edge, EdgeDeriver};
use tension_core::config::ContractConfig;
use tension_core::errors::{ContractError, ExitCode, TensionErrorCode};
use tension_core::Severity;

fn case() -> (AtomDocument, Vec<Edge>) {
    let ctx = context("contract");
    let doc = document_for(
        &ctx,
        &[
            DriftRecord::gate_flip("g", "safety", true, false),
            DriftRecord::metric_delta("m", 1.0, 9.0, Severity::Crit),
        ],
    );
    let edges = EdgeDeriver::default().derive(&doc.atoms).unwrap();
    assert_eq!(edges.len(), 1);
    (doc, edges)
}

fn codes(err: &ContractError) -> Vec<&'static str> {
    err.violations().iter().map(|v| v.code()).collect()
}

#[test]
fn test_empty_collections_pass() {
    let doc = AtomDocument::new(context("empty"), vec![]);
    let config = ContractConfig::default();
    AtomContract::new(&config).validate("atoms", &doc).unwrap();
    EdgeContract::new(&config).validate("edges", &[], &doc).unwrap();
    let edges = EdgeContract::new(&config)
        .validate_lines("edges", &parse_edge_lines(""), &doc)
        .unwrap();
    assert!(edges.is_empty());
}

#[test]
fn test_removing_a_referenced_atom_fails_validation() {
    let (mut doc, edges) = case();
    let removed = edges[0].tension_atom_id.clone();
    doc.atoms.retain(|a| a.atom_id != removed);

    let err = EdgeContract::new(&ContractConfig::default())
        .validate("edges", &edges, &doc)
        .unwrap_err();
    assert_eq!(codes(&err), vec!["EDGE_DANGLING_REF"]);
    assert_eq!(err.exit_code(), ExitCode::ContractViolation);
    assert!(err.to_string().contains(&removed));
    assert!(err.to_string().contains("tension_atom_id"));
}

#[test]
fn test_tampered_atom_fails_hash_check() {
    let (mut doc, _) = case();
    doc.atoms[0].subject = "renamed".to_string();
    let err = AtomContract::new(&ContractConfig::default())
        .validate("atoms", &doc)
        .unwrap_err();
    assert_eq!(codes(&err), vec!["ATOM_ID_MISMATCH"]);
}

#[test]
fn test_all_violations_are_reported_together() {
    let (mut doc, _) = case();
    let first = doc.atoms[0].clone();
    doc.atoms.push(first);
    doc.atoms[1].run_context.run_pair_id = "rp-other".to_string();
    let err = AtomContract::new(&ContractConfig::default())
        .validate("atoms", &doc)
        .unwrap_err();
    let found = codes(&err);
    assert!(found.contains(&"ATOM_ID_DUPLICATE"));
    assert!(found.contains(&"ATOM_CONTEXT_MISMATCH"));
}

#[test]
fn test_generated_at_is_excluded_from_context_match_by_default() {
    let (doc, mut edges) = case();
    edges[0].run_context.generated_at = Some("2026-01-01T00:00:00Z".to_string());
    let default = ContractConfig::default();
    EdgeContract::new(&default)
        .validate("edges", &edges, &doc)
        .unwrap();

    let strict = ContractConfig {
        allowed_context_keys: vec!["run_pair_id".into(), "inputs".into(), "generated_at".into()],
    };
    let err = EdgeContract::new(&strict)
        .validate("edges", &edges, &doc)
        .unwrap_err();
    // One mismatch per endpoint atom.
    assert_eq!(codes(&err), vec!["EDGE_CONTEXT_MISMATCH", "EDGE_CONTEXT_MISMATCH"]);
}

#[test]
fn test_edge_with_foreign_inputs_is_rejected() {
    let (doc, mut edges) = case();
    edges[0]
        .run_context
        .inputs
        .insert("candidate/metrics".to_string(), "ff".to_string());
    let err = EdgeContract::new(&ContractConfig::default())
        .validate("edges", &edges, &doc)
        .unwrap_err();
    assert!(codes(&err).iter().all(|c| *c == "EDGE_CONTEXT_MISMATCH"));
}

#[test]
fn test_edge_lines_report_malformed_and_duplicate_entries() {
    let (doc, edges) = case();
    let line = serde_json::to_string(&edges[0]).unwrap();
    let mut no_rule = edges[0].clone();
    no_rule.rule = String::new();
    let text = format!(
        "{line}\n{line}\n{{not json\n{}\n{{\"rule\":\"x\"}}\n",
        serde_json::to_string(&no_rule).unwrap()
    );
    let err = EdgeContract::new(&ContractConfig::default())
        .validate_lines("edges.ndjson", &parse_edge_lines(&text), &doc)
        .unwrap_err();
    let found = codes(&err);
    assert!(found.contains(&"EDGE_ID_DUPLICATE"));
    assert!(found.contains(&"EDGE_MALFORMED"));
    assert!(found.contains(&"EDGE_ID_EMPTY"));
    assert!(found.contains(&"EDGE_RULE_EMPTY"));
    // Clearing the rule changes the content hash too.
    assert!(found.contains(&"EDGE_ID_MISMATCH"));
}

#[test]
fn test_raw_atoms_with_unknown_type_and_missing_id() {
    let (doc, _) = case();
    let mut atoms: Vec<serde_json::Value> = doc
        .atoms
        .iter()
        .map(|a| serde_json::to_value(a).unwrap())
        .collect();
    atoms.push(json!({"atom_id": "atom-x", "type": "vibe_shift"}));
    atoms.push(json!({"type": "gate_flip"}));
    atoms.push(json!(42));
    let raw = RawAtomDocument {
        meta: doc.meta.clone(),
        atoms,
    };
    let err = AtomContract::new(&ContractConfig::default())
        .validate_raw("atoms.json", &raw)
        .unwrap_err();
    assert_eq!(
        codes(&err),
        vec!["ATOM_TYPE_UNKNOWN", "ATOM_ID_EMPTY", "ATOM_MALFORMED"]
    );
}

#[test]
fn test_numeric_edge_id_is_malformed_not_empty() {
    let (doc, edges) = case();
    let mut value = serde_json::to_value(&edges[0]).unwrap();
    value["edge_id"] = json!(7);
    let err = EdgeContract::new(&ContractConfig::default())
        .validate_lines("edges.ndjson", &parse_edge_lines(&value.to_string()), &doc)
        .unwrap_err();
    assert_eq!(codes(&err), vec!["EDGE_MALFORMED"]);
    assert!(err.to_string().contains("edge_id must be a string"));
}

//! End-to-end tests of the `tension` binary and its exit codes.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn fixtures_root() -> PathBuf {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    while !path.join("test-fixtures").exists() {
        assert!(path.pop(), "Could not find test-fixtures directory");
    }
    path.join("test-fixtures")
}

fn fixture(relative: &str) -> PathBuf {
    fixtures_root().join(relative)
}

/// Run the binary in `cwd` with a clean `TENSION_*` environment.
fn tension(cwd: &Path, args: &[&str]) -> Output {
    let mut command = Command::new(env!("CARGO_BIN_EXE_tension"));
    for key in [
        "TENSION_LOG",
        "TENSION_POLICY",
        "TENSION_STRICT_EVIDENCE",
        "TENSION_MIN_EDGES",
        "TENSION_ALLOWED_CONTEXT_KEYS",
    ] {
        command.env_remove(key);
    }
    command.current_dir(cwd).args(args).output().unwrap()
}

fn code(output: &Output) -> i32 {
    output.status.code().unwrap()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn s(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn derive_case_study(work: &Path) -> PathBuf {
    let out = work.join("out");
    let config = fixture("case-study/tension.toml");
    let baseline = fixture("case-study/baseline");
    let candidate = fixture("case-study/candidate");
    let output = tension(
        work,
        &[
            "derive",
            "--config",
            s(&config),
            "--baseline",
            s(&baseline),
            "--candidate",
            s(&candidate),
            "--out-dir",
            s(&out),
        ],
    );
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    out
}

#[test]
fn test_derive_publishes_case_study_artifacts() {
    let work = tempfile::tempdir().unwrap();
    let out = derive_case_study(work.path());

    let edges = std::fs::read_to_string(out.join("edges.ndjson")).unwrap();
    assert_eq!(edges.lines().count(), 1);
    let edge: serde_json::Value = serde_json::from_str(edges.trim_end()).unwrap();
    assert_eq!(edge["type"], "gate_metric_tension");
    assert_eq!(edge["severity"], "crit");

    let atoms: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join("atoms.json")).unwrap()).unwrap();
    assert_eq!(atoms["meta"]["atom_count"], 3);
    assert_eq!(atoms["meta"]["schema"], "tension.atoms/v1");
    assert_eq!(edge["run_context"], atoms["meta"]["run_context"]);
}

#[test]
fn test_staged_commands_match_derive() {
    let work = tempfile::tempdir().unwrap();
    let out = derive_case_study(work.path());
    let config = fixture("case-study/tension.toml");
    let baseline = fixture("case-study/baseline");
    let candidate = fixture("case-study/candidate");
    let drift = work.path().join("staged/drift.json");
    let atoms = work.path().join("staged/atoms.json");
    let edges = work.path().join("staged/edges.ndjson");

    let steps: [Vec<&str>; 3] = [
        vec!["extract", "--config", s(&config), "--baseline", s(&baseline), "--candidate", s(&candidate), "--output", s(&drift)],
        vec!["atoms", "--config", s(&config), "--input", s(&drift), "--output", s(&atoms)],
        vec!["edges", "--config", s(&config), "--atoms", s(&atoms), "--output", s(&edges)],
    ];
    for step in &steps {
        let output = tension(work.path(), step);
        assert_eq!(code(&output), 0, "{}", stderr(&output));
    }

    for (staged, derived) in [(&atoms, "atoms.json"), (&edges, "edges.ndjson")] {
        assert_eq!(
            std::fs::read(staged).unwrap(),
            std::fs::read(out.join(derived)).unwrap(),
            "{derived} differs"
        );
    }
}

#[test]
fn test_validate_and_accept_pass_on_case_study() {
    let work = tempfile::tempdir().unwrap();
    let out = derive_case_study(work.path());
    let atoms = out.join("atoms.json");
    let edges = out.join("edges.ndjson");

    let output = tension(work.path(), &["validate", "--atoms", s(&atoms), "--edges", s(&edges)]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    let output = tension(work.path(), &["accept", "--atoms", s(&atoms), "--edges", s(&edges)]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));

    let output = tension(
        work.path(),
        &["accept", "--min-edges", "2", "--atoms", s(&atoms), "--edges", s(&edges)],
    );
    assert_eq!(code(&output), 4);
    assert!(stderr(&output).contains("[ACCEPTANCE_FAILED]"));
}

#[test]
fn test_removing_referenced_atom_fails_validation() {
    let work = tempfile::tempdir().unwrap();
    let out = derive_case_study(work.path());
    let atoms_path = out.join("atoms.json");

    let mut atoms: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&atoms_path).unwrap()).unwrap();
    atoms["atoms"]
        .as_array_mut()
        .unwrap()
        .retain(|a| a["type"] != "metric_delta");
    atoms["meta"]["atom_count"] = serde_json::json!(2);
    std::fs::write(&atoms_path, serde_json::to_vec_pretty(&atoms).unwrap()).unwrap();

    let edges = out.join("edges.ndjson");
    let output = tension(work.path(), &["validate", "--atoms", s(&atoms_path), "--edges", s(&edges)]);
    assert_eq!(code(&output), 3);
    assert!(stderr(&output).contains("EDGE_DANGLING_REF"));
}

#[test]
fn test_no_drift_validates_but_fails_acceptance() {
    let work = tempfile::tempdir().unwrap();
    let out = work.path().join("out");
    let baseline = fixture("no-drift/baseline");
    let candidate = fixture("no-drift/candidate");
    let output = tension(
        work.path(),
        &["derive", "--baseline", s(&baseline), "--candidate", s(&candidate), "--out-dir", s(&out), "--accept"],
    );
    assert_eq!(code(&output), 4);
    assert_eq!(std::fs::read(out.join("edges.ndjson")).unwrap(), b"");

    let atoms = out.join("atoms.json");
    let edges = out.join("edges.ndjson");
    let output = tension(work.path(), &["validate", "--atoms", s(&atoms), "--edges", s(&edges)]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
}

#[test]
fn test_input_errors_have_distinct_codes() {
    let work = tempfile::tempdir().unwrap();
    let missing = work.path().join("nope");
    let candidate = fixture("no-drift/candidate");
    let drift = work.path().join("drift.json");
    let output = tension(
        work.path(),
        &["extract", "--baseline", s(&missing), "--candidate", s(&candidate), "--output", s(&drift)],
    );
    assert_eq!(code(&output), 6);
    assert!(stderr(&output).contains("gates.json"));

    let garbage = work.path().join("garbage.json");
    std::fs::write(&garbage, "{ not json").unwrap();
    let atoms = work.path().join("atoms.json");
    let output = tension(work.path(), &["atoms", "--input", s(&garbage), "--output", s(&atoms)]);
    assert_eq!(code(&output), 7);
    assert!(!atoms.exists());
}

#[test]
fn test_usage_and_config_errors() {
    let work = tempfile::tempdir().unwrap();
    assert_eq!(code(&tension(work.path(), &["frobnicate"])), 2);
    assert_eq!(code(&tension(work.path(), &[])), 2);
    assert_eq!(code(&tension(work.path(), &["--help"])), 0);

    let output = Command::new(env!("CARGO_BIN_EXE_tension"))
        .current_dir(work.path())
        .env("TENSION_POLICY", "most")
        .arg("config")
        .output()
        .unwrap();
    assert_eq!(code(&output), 8);

    let absent = work.path().join("absent.toml");
    assert_eq!(code(&tension(work.path(), &["config", "--config", s(&absent)])), 8);
}

#[test]
fn test_config_prints_resolved_values() {
    let work = tempfile::tempdir().unwrap();
    std::fs::write(work.path().join("tension.toml"), "[acceptance]\nmin_edges = 3\n").unwrap();
    let output = tension(work.path(), &["config", "--policy", "any"]);
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.contains("min_edges = 3"));
    assert!(text.contains("policy = \"any\""));
}

#[test]
fn test_status_writes_document_and_exits_on_failure() {
    let work = tempfile::tempdir().unwrap();
    let config = fixture("evidence/tension.toml");
    let gates = fixture("evidence/internal_gates.json");
    let metrics = fixture("evidence/internal_metrics.json");
    let status = work.path().join("status.json");

    let complete = fixture("evidence/complete");
    let output = tension(
        work.path(),
        &[
            "status", "--config", s(&config), "--strict-evidence", "true",
            "--evidence-dir", s(&complete), "--output", s(&status),
            "--gates", s(&gates), "--metrics", s(&metrics),
        ],
    );
    assert_eq!(code(&output), 0, "{}", stderr(&output));
    let doc: serde_json::Value = serde_json::from_slice(&std::fs::read(&status).unwrap()).unwrap();
    assert_eq!(doc["release_pass"], true);
    assert_eq!(doc["external_all_pass"], doc["external"]["all_pass"]);
    assert_eq!(doc["external_all_pass"], doc["gates"]["external_all_pass"]);

    let partial = fixture("evidence/partial");
    let output = tension(
        work.path(),
        &["status", "--config", s(&config), "--evidence-dir", s(&partial), "--output", s(&status)],
    );
    assert_eq!(code(&output), 5);
    assert!(stderr(&output).contains("flip_rate: 0.08 <= 0.05 is false"));
    let doc: serde_json::Value = serde_json::from_slice(&std::fs::read(&status).unwrap()).unwrap();
    assert_eq!(doc["release_pass"], false);
    assert_eq!(doc["external"]["skipped"], 1);
}

#[test]
fn test_strict_evidence_fails_closed_without_document() {
    let work = tempfile::tempdir().unwrap();
    let config = fixture("evidence/tension.toml");
    let empty = work.path().join("evidence");
    std::fs::create_dir(&empty).unwrap();
    let status = work.path().join("status.json");

    let output = tension(
        work.path(),
        &["status", "--config", s(&config), "--evidence-dir", s(&empty), "--output", s(&status)],
    );
    assert_eq!(code(&output), 0, "non-strict passes vacuously: {}", stderr(&output));

    std::fs::remove_file(&status).unwrap();
    let output = tension(
        work.path(),
        &[
            "status", "--config", s(&config), "--strict-evidence", "true",
            "--evidence-dir", s(&empty), "--output", s(&status),
        ],
    );
    assert_eq!(code(&output), 5);
    assert!(stderr(&output).contains("[EVIDENCE_MISSING]"));
    assert!(!status.exists());
}

#[test]
fn test_batch_reports_first_failure() {
    let work = tempfile::tempdir().unwrap();
    let config = fixture("case-study/tension.toml");
    let manifest = fixture("batch/manifest.json");
    let out = work.path().join("batch");
    let output = tension(
        work.path(),
        &["batch", "--config", s(&config), "--manifest", s(&manifest), "--out-dir", s(&out)],
    );
    assert_eq!(code(&output), 6);

    let report: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out.join("batch.json")).unwrap()).unwrap();
    assert_eq!(report["entries"].as_array().unwrap().len(), 3);
    assert_eq!(report["entries"][0]["edges"], 1);
    assert!(out.join("rp-case-study").join("atoms.json").exists());
}

//! Shared helpers for tension-analysis integration tests.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use tension_analysis::atoms::{Atom, AtomDeriver, AtomDocument};
use tension_analysis::drift::DriftRecord;
use tension_core::config::TensionConfig;
use tension_core::RunContext;

/// Root of the workspace `test-fixtures` folder.
pub fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);
    while !path.join("test-fixtures").exists() {
        if !path.pop() {
            panic!("Could not find test-fixtures directory from CARGO_MANIFEST_DIR={manifest_dir}");
        }
    }
    path.join("test-fixtures")
}

pub fn fixture(relative: &str) -> PathBuf {
    fixtures_root().join(relative)
}

/// Parse a fixture `tension.toml` without consulting the environment.
pub fn fixture_config(relative: &str) -> TensionConfig {
    let path = fixture(relative);
    let text = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    TensionConfig::from_toml(&text)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

pub fn context(tag: &str) -> RunContext {
    let mut inputs = BTreeMap::new();
    inputs.insert("baseline/gates".to_string(), format!("{tag}-a"));
    inputs.insert("candidate/gates".to_string(), format!("{tag}-b"));
    RunContext::from_inputs(inputs)
}

pub fn atoms_for(ctx: &RunContext, records: &[DriftRecord]) -> Vec<Atom> {
    let result = AtomDeriver::new(ctx.clone()).derive(records);
    assert!(result.is_clean(), "unexpected diagnostics: {:?}", result.errors);
    result.data
}

pub fn document_for(ctx: &RunContext, records: &[DriftRecord]) -> AtomDocument {
    AtomDocument::new(ctx.clone(), atoms_for(ctx, records))
}

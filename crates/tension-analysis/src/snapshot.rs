//! Run snapshots: one evaluation run's gate outcomes, metrics, and overlays.
//!
//! Snapshots are produced by the run harness. This module only reads them
//! and records a content hash of every input file for the RunContext.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use tension_core::constants::{
    SNAPSHOT_GATES, SNAPSHOT_METRICS, SNAPSHOT_OVERLAYS, SNAPSHOT_TRANSITIONS,
};
use tension_core::errors::InputError;
use tension_core::types::hash_bytes;

/// Category used when a gate table entry is a bare boolean.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Outcome of one gate in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawGate")]
pub struct GateRecord {
    pub category: String,
    pub passed: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawGate {
    Bare(bool),
    Full {
        #[serde(default)]
        category: Option<String>,
        passed: bool,
    },
}

impl From<RawGate> for GateRecord {
    fn from(raw: RawGate) -> Self {
        match raw {
            RawGate::Bare(passed) => Self {
                category: UNCATEGORIZED.to_string(),
                passed,
            },
            RawGate::Full { category, passed } => Self {
                category: category.unwrap_or_else(|| UNCATEGORIZED.to_string()),
                passed,
            },
        }
    }
}

pub type GateTable = BTreeMap<String, GateRecord>;

/// One run's tables plus the content hash of each source file.
#[derive(Debug, Clone, Default)]
pub struct RunSnapshot {
    pub gates: GateTable,
    /// Raw metric values. Non-numeric entries are kept and skipped at diff time.
    pub metrics: BTreeMap<String, Value>,
    /// Overlay document name → key → value.
    pub overlays: BTreeMap<String, BTreeMap<String, Value>>,
    /// Input name (`gates`, `metrics`, `overlays`, `transitions`) → blake3 hex.
    pub input_hashes: BTreeMap<String, String>,
}

impl RunSnapshot {
    /// Load a snapshot directory. `gates.json`, `metrics.json` and
    /// `overlays.json` are required; `transitions.json` is hashed when present.
    pub fn load(dir: &Path) -> Result<Self, InputError> {
        let gates_bytes = read_required(&dir.join(SNAPSHOT_GATES))?;
        let metrics_bytes = read_required(&dir.join(SNAPSHOT_METRICS))?;
        let overlays_bytes = read_required(&dir.join(SNAPSHOT_OVERLAYS))?;

        let mut snapshot = Self {
            gates: parse(&dir.join(SNAPSHOT_GATES), &gates_bytes)?,
            metrics: parse(&dir.join(SNAPSHOT_METRICS), &metrics_bytes)?,
            overlays: parse(&dir.join(SNAPSHOT_OVERLAYS), &overlays_bytes)?,
            input_hashes: BTreeMap::new(),
        };
        snapshot.record_hash("gates", &gates_bytes);
        snapshot.record_hash("metrics", &metrics_bytes);
        snapshot.record_hash("overlays", &overlays_bytes);

        let transitions = dir.join(SNAPSHOT_TRANSITIONS);
        match std::fs::read(&transitions) {
            Ok(bytes) => {
                // Only hashed, but it still has to be a JSON document.
                let _: Value = parse(&transitions, &bytes)?;
                snapshot.record_hash("transitions", &bytes);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(InputError::from_io(&transitions, &e)),
        }

        tracing::debug!(
            dir = %dir.display(),
            gates = snapshot.gates.len(),
            metrics = snapshot.metrics.len(),
            overlays = snapshot.overlays.len(),
            "loaded run snapshot"
        );
        Ok(snapshot)
    }

    /// Build a snapshot from in-memory JSON documents, hashing them the same
    /// way `load` hashes files.
    pub fn from_json(gates: &str, metrics: &str, overlays: &str) -> Result<Self, InputError> {
        let mut snapshot = Self {
            gates: parse(Path::new(SNAPSHOT_GATES), gates.as_bytes())?,
            metrics: parse(Path::new(SNAPSHOT_METRICS), metrics.as_bytes())?,
            overlays: parse(Path::new(SNAPSHOT_OVERLAYS), overlays.as_bytes())?,
            input_hashes: BTreeMap::new(),
        };
        snapshot.record_hash("gates", gates.as_bytes());
        snapshot.record_hash("metrics", metrics.as_bytes());
        snapshot.record_hash("overlays", overlays.as_bytes());
        Ok(snapshot)
    }

    fn record_hash(&mut self, name: &str, bytes: &[u8]) {
        self.input_hashes.insert(name.to_string(), hash_bytes(bytes));
    }
}

/// Read a gate table document (`gates.json` format) on its own.
pub fn read_gate_table(path: &Path) -> Result<GateTable, InputError> {
    let bytes = read_required(path)?;
    parse(path, &bytes)
}

fn read_required(path: &Path) -> Result<Vec<u8>, InputError> {
    std::fs::read(path).map_err(|e| InputError::from_io(path, &e))
}

fn parse<T: serde::de::DeserializeOwned>(path: &Path, bytes: &[u8]) -> Result<T, InputError> {
    serde_json::from_slice(bytes).map_err(|e| InputError::malformed(path, e.to_string()))
}

/// Directory pair for one comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPair {
    /// Explicit run pair id; derived from input hashes when absent.
    #[serde(default)]
    pub id: Option<String>,
    pub baseline: PathBuf,
    pub candidate: PathBuf,
}

/// A run pair id names one output directory, so it must be a single plain
/// path component: ASCII letters, digits, `.`, `_` or `-`, and not `.`/`..`.
pub fn check_run_pair_id(id: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err("run pair id is empty".to_string());
    }
    if id == "." || id == ".." {
        return Err(format!("run pair id `{id}` is not a directory name"));
    }
    if let Some(c) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')))
    {
        return Err(format!("run pair id `{id}` contains `{c}`"));
    }
    Ok(())
}

//! End-to-end derivation: snapshots → drift → atoms → edges → contracts.
//!
//! Artifacts are validated before anything is published. Batch mode runs
//! independent run pairs in parallel, one pair per work unit.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tension_core::config::TensionConfig;
use tension_core::constants::{ATOMS_FILE, DRIFT_FILE, EDGES_FILE};
use tension_core::errors::{
    ContractError, InputError, PipelineError, PipelineResult, PublishError, TensionErrorCode,
};
use tension_core::RunContext;

use crate::atoms::{AtomDeriver, AtomDocument};
use crate::contracts::{AtomContract, EdgeContract};
use crate::drift::{build_run_context, DriftDocument, DriftExtractor};
use crate::export::{publish_set, read_json, render_edges, render_json};
use crate::snapshot::{check_run_pair_id, RunPair, RunSnapshot};
use crate::tensions::{Edge, EdgeDeriver, RuleTable};

/// Every artifact of one derivation pass plus its non-fatal diagnostics.
#[derive(Debug)]
pub struct DerivationOutput {
    pub context: RunContext,
    pub drift: DriftDocument,
    pub atoms: AtomDocument,
    pub edges: Vec<Edge>,
    pub diagnostics: Vec<PipelineError>,
}

/// Stage runner. Holds the resolved configuration; reads nothing ambient.
pub struct Pipeline<'a> {
    config: &'a TensionConfig,
    generated_at: Option<String>,
}

impl<'a> Pipeline<'a> {
    pub fn new(config: &'a TensionConfig) -> Self {
        Self {
            config,
            generated_at: None,
        }
    }

    /// Stamp every RunContext with `generated_at`. It never enters an id.
    pub fn with_generated_at(mut self, generated_at: Option<String>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Diff two loaded snapshots into a drift document.
    pub fn extract_snapshots(
        &self,
        baseline: &RunSnapshot,
        candidate: &RunSnapshot,
        run_pair_id: Option<&str>,
    ) -> DriftDocument {
        let mut context = build_run_context(baseline, candidate, run_pair_id);
        if let Some(stamp) = &self.generated_at {
            context = context.with_generated_at(stamp.clone());
        }
        let records = DriftExtractor::new(&self.config.drift).extract(baseline, candidate);
        DriftDocument::new(context, records)
    }

    /// Load both snapshot directories and diff them.
    pub fn extract(
        &self,
        baseline_dir: &Path,
        candidate_dir: &Path,
        run_pair_id: Option<&str>,
    ) -> Result<DriftDocument, InputError> {
        let baseline = RunSnapshot::load(baseline_dir)?;
        let candidate = RunSnapshot::load(candidate_dir)?;
        Ok(self.extract_snapshots(&baseline, &candidate, run_pair_id))
    }

    /// Atoms for a drift document. Incomplete records land in `errors`.
    pub fn derive_atoms(&self, drift: &DriftDocument, source: &str) -> PipelineResult<AtomDocument> {
        let context = drift.meta.run_context.clone();
        let derived = AtomDeriver::new(context.clone())
            .with_source(source)
            .derive(&drift.records);
        PipelineResult {
            data: AtomDocument::new(context, derived.data),
            errors: derived.errors,
        }
    }

    pub fn derive_edges(&self, atoms: &AtomDocument) -> Result<Vec<Edge>, ContractError> {
        EdgeDeriver::new(RuleTable::from_config(&self.config.rules)).derive(&atoms.atoms)
    }

    /// Run both contracts over in-memory artifacts.
    pub fn validate(&self, atoms: &AtomDocument, edges: &[Edge]) -> Result<(), ContractError> {
        AtomContract::new(&self.config.contract).validate(ATOMS_FILE, atoms)?;
        EdgeContract::new(&self.config.contract).validate(EDGES_FILE, edges, atoms)
    }

    /// The whole chain over loaded snapshots, validated.
    pub fn derive_snapshots(
        &self,
        baseline: &RunSnapshot,
        candidate: &RunSnapshot,
        run_pair_id: Option<&str>,
    ) -> Result<DerivationOutput, PipelineError> {
        let drift = self.extract_snapshots(baseline, candidate, run_pair_id);
        let atoms = self.derive_atoms(&drift, DRIFT_FILE);
        let edges = self.derive_edges(&atoms.data)?;
        self.validate(&atoms.data, &edges)?;

        tracing::info!(
            run_pair_id = %drift.meta.run_context.run_pair_id,
            drift = drift.records.len(),
            atoms = atoms.data.len(),
            edges = edges.len(),
            dropped = atoms.errors.len(),
            "derivation complete"
        );
        Ok(DerivationOutput {
            context: drift.meta.run_context.clone(),
            drift,
            atoms: atoms.data,
            edges,
            diagnostics: atoms.errors,
        })
    }

    pub fn derive_pair(&self, pair: &RunPair) -> Result<DerivationOutput, PipelineError> {
        let baseline = RunSnapshot::load(&pair.baseline)?;
        let candidate = RunSnapshot::load(&pair.candidate)?;
        self.derive_snapshots(&baseline, &candidate, pair.id.as_deref())
    }

    /// Publish drift, atom, and edge documents into `out_dir` as one set.
    pub fn publish(&self, output: &DerivationOutput, out_dir: &Path) -> Result<(), PublishError> {
        let drift = render_json(DRIFT_FILE, &output.drift)?;
        let atoms = render_json(ATOMS_FILE, &output.atoms)?;
        let edges = render_edges(&output.edges)?;
        publish_set(
            out_dir,
            &[
                (DRIFT_FILE, drift.as_slice()),
                (ATOMS_FILE, atoms.as_slice()),
                (EDGES_FILE, edges.as_slice()),
            ],
        )
    }

    /// Derive and publish every pair of `manifest` under `out_root`, one
    /// subdirectory per run pair id. A failing pair does not stop the others.
    ///
    /// Derivation runs in parallel. Output directories are then claimed in
    /// manifest order: a pair whose id is unsafe as a directory name, or was
    /// already claimed by an earlier pair, fails instead of publishing.
    pub fn derive_batch(&self, manifest: &BatchManifest, out_root: &Path) -> BatchReport {
        let derived: Vec<Result<DerivationOutput, PipelineError>> = manifest
            .pairs
            .par_iter()
            .map(|pair| self.derive_pair(pair))
            .collect();

        let mut claimed = HashSet::new();
        let claims: Vec<Result<DerivationOutput, PipelineError>> = derived
            .into_iter()
            .enumerate()
            .map(|(index, outcome)| {
                outcome.and_then(|output| {
                    claim_output_dir(&mut claimed, index, &output.context.run_pair_id)?;
                    Ok(output)
                })
            })
            .collect();

        let entries: Vec<BatchEntry> = manifest
            .pairs
            .par_iter()
            .zip(claims.into_par_iter())
            .map(|(pair, outcome)| self.finish_batch_pair(pair, outcome, out_root))
            .collect();

        let failed = entries.iter().filter(|e| e.error.is_some()).count();
        tracing::info!(pairs = entries.len(), failed, "batch complete");
        BatchReport { entries }
    }

    fn finish_batch_pair(
        &self,
        pair: &RunPair,
        outcome: Result<DerivationOutput, PipelineError>,
        out_root: &Path,
    ) -> BatchEntry {
        let mut entry = BatchEntry {
            baseline: pair.baseline.clone(),
            candidate: pair.candidate.clone(),
            run_pair_id: pair.id.clone(),
            atoms: 0,
            edges: 0,
            dropped: 0,
            error: None,
            exit_code: 0,
        };
        let outcome = outcome.and_then(|output| {
            let dir = out_root.join(&output.context.run_pair_id);
            self.publish(&output, &dir)?;
            Ok(output)
        });
        match outcome {
            Ok(output) => {
                entry.run_pair_id = Some(output.context.run_pair_id);
                entry.atoms = output.atoms.len();
                entry.edges = output.edges.len();
                entry.dropped = output.diagnostics.len();
            }
            Err(e) => {
                tracing::warn!(
                    baseline = %pair.baseline.display(),
                    candidate = %pair.candidate.display(),
                    error = %e,
                    "batch pair failed"
                );
                entry.exit_code = e.exit_code() as u8;
                entry.error = Some(e.coded_string());
            }
        }
        entry
    }
}

/// Reserve `run_pair_id` as the output directory of pair `index`.
fn claim_output_dir(
    claimed: &mut HashSet<String>,
    index: usize,
    run_pair_id: &str,
) -> Result<(), InputError> {
    let malformed = |message: String| InputError::MalformedKey {
        path: "<batch manifest>".to_string(),
        key: format!("pairs[{index}].id"),
        message,
    };
    check_run_pair_id(run_pair_id).map_err(malformed)?;
    if !claimed.insert(run_pair_id.to_string()) {
        return Err(malformed(format!(
            "run pair id `{run_pair_id}` is already used by an earlier pair"
        )));
    }
    Ok(())
}

/// Run pairs to derive in one batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchManifest {
    pub pairs: Vec<RunPair>,
}

impl BatchManifest {
    /// Load a JSON manifest. Relative snapshot paths resolve against the
    /// manifest's own directory. Explicit ids must be unique plain directory
    /// names.
    pub fn load(path: &Path) -> Result<Self, InputError> {
        let mut manifest: Self = read_json(path)?;
        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let mut ids = HashSet::new();
        for (index, pair) in manifest.pairs.iter_mut().enumerate() {
            if let Some(id) = &pair.id {
                let malformed = |message: String| InputError::MalformedKey {
                    path: path.display().to_string(),
                    key: format!("pairs[{index}].id"),
                    message,
                };
                check_run_pair_id(id).map_err(malformed)?;
                if !ids.insert(id.clone()) {
                    return Err(malformed(format!("duplicate run pair id `{id}`")));
                }
            }
            pair.baseline = resolve(&base, &pair.baseline);
            pair.candidate = resolve(&base, &pair.candidate);
        }
        Ok(manifest)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub baseline: PathBuf,
    pub candidate: PathBuf,
    pub run_pair_id: Option<String>,
    pub atoms: usize,
    pub edges: usize,
    /// Drift records dropped as incomplete.
    pub dropped: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub exit_code: u8,
}

/// Per-pair outcomes, in manifest order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub entries: Vec<BatchEntry>,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &BatchEntry> {
        self.entries.iter().filter(|e| e.error.is_some())
    }

    pub fn is_clean(&self) -> bool {
        self.failed().next().is_none()
    }
}

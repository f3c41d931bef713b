use std::path::Path;

use tension_analysis::acceptance::AcceptanceChecker;
use tension_analysis::atoms::AtomDocument;
use tension_analysis::contracts::{AtomContract, EdgeContract};
use tension_analysis::export::{
    read_atom_document, read_drift_document, read_edge_lines, write_edges_atomic,
    write_json_atomic,
};
use tension_analysis::pipeline::{BatchManifest, Pipeline};
use tension_analysis::snapshot::RunPair;
use tension_analysis::status::{StatusAggregator, StatusInputs};
use tension_core::config::TensionConfig;
use tension_core::errors::{ExitCode, PipelineError, TensionErrorCode};

use crate::commands::StampArgs;
use crate::CliError;

const BATCH_REPORT_FILE: &str = "batch.json";

fn artifact_name(path: &Path) -> String {
    path.display().to_string()
}

fn report_diagnostics(diagnostics: &[PipelineError]) {
    for diagnostic in diagnostics {
        eprintln!("warning: {}", diagnostic.coded_string());
    }
}

/// Read and contract-check an atom document.
fn load_atoms(config: &TensionConfig, path: &Path) -> Result<AtomDocument, CliError> {
    let raw = read_atom_document(path)?;
    Ok(AtomContract::new(&config.contract).validate_raw(&artifact_name(path), &raw)?)
}

pub(crate) fn extract(
    config: &TensionConfig,
    baseline: &Path,
    candidate: &Path,
    output: &Path,
    stamp: &StampArgs,
) -> Result<(), CliError> {
    let drift = Pipeline::new(config)
        .with_generated_at(stamp.generated_at.clone())
        .extract(baseline, candidate, stamp.run_pair_id.as_deref())?;
    write_json_atomic(output, &drift)?;
    println!(
        "extract: {} drift record(s) -> {}",
        drift.records.len(),
        output.display()
    );
    Ok(())
}

pub(crate) fn atoms(config: &TensionConfig, input: &Path, output: &Path) -> Result<(), CliError> {
    let drift = read_drift_document(input)?;
    let atoms = Pipeline::new(config).derive_atoms(&drift.data, &artifact_name(input));
    report_diagnostics(&drift.errors);
    report_diagnostics(&atoms.errors);

    AtomContract::new(&config.contract).validate(&artifact_name(output), &atoms.data)?;
    write_json_atomic(output, &atoms.data)?;
    println!(
        "atoms: {} atom(s), {} record(s) dropped -> {}",
        atoms.data.len(),
        drift.error_count() + atoms.error_count(),
        output.display()
    );
    Ok(())
}

pub(crate) fn edges(config: &TensionConfig, atoms: &Path, output: &Path) -> Result<(), CliError> {
    let document = load_atoms(config, atoms)?;
    let pipeline = Pipeline::new(config);
    let edges = pipeline.derive_edges(&document)?;
    EdgeContract::new(&config.contract).validate(&artifact_name(output), &edges, &document)?;
    write_edges_atomic(output, &edges)?;
    println!("edges: {} edge(s) -> {}", edges.len(), output.display());
    Ok(())
}

pub(crate) fn derive(
    config: &TensionConfig,
    baseline: &Path,
    candidate: &Path,
    out_dir: &Path,
    stamp: &StampArgs,
    accept: bool,
) -> Result<(), CliError> {
    let pipeline = Pipeline::new(config).with_generated_at(stamp.generated_at.clone());
    let pair = RunPair {
        id: stamp.run_pair_id.clone(),
        baseline: baseline.to_path_buf(),
        candidate: candidate.to_path_buf(),
    };
    let output = pipeline.derive_pair(&pair)?;
    report_diagnostics(&output.diagnostics);
    pipeline.publish(&output, out_dir)?;
    println!(
        "derive: run_pair_id={} drift={} atoms={} edges={} -> {}",
        output.context.run_pair_id,
        output.drift.records.len(),
        output.atoms.len(),
        output.edges.len(),
        out_dir.display()
    );

    if accept {
        let report = AcceptanceChecker::new(&config.acceptance)
            .check(&artifact_name(out_dir), &output.edges)?;
        println!("accept: OK edges={} required={}", report.edge_count, report.required);
    }
    Ok(())
}

pub(crate) fn batch(
    config: &TensionConfig,
    manifest: &Path,
    out_dir: &Path,
    generated_at: Option<String>,
) -> Result<(), CliError> {
    let manifest = BatchManifest::load(manifest)?;
    let report = Pipeline::new(config)
        .with_generated_at(generated_at)
        .derive_batch(&manifest, out_dir);
    write_json_atomic(&out_dir.join(BATCH_REPORT_FILE), &report)?;

    for entry in &report.entries {
        match &entry.error {
            None => println!(
                "batch: {} atoms={} edges={}",
                entry.run_pair_id.as_deref().unwrap_or("-"),
                entry.atoms,
                entry.edges
            ),
            Some(error) => eprintln!("batch: {} failed: {error}", entry.baseline.display()),
        }
    }

    // The first failing pair in manifest order decides the exit code.
    let result = match report.failed().next() {
        None => Ok(()),
        Some(entry) => Err(CliError {
            exit_code: ExitCode::from_code(entry.exit_code).unwrap_or(ExitCode::Internal),
            message: format!(
                "{} of {} run pair(s) failed; see {}",
                report.failed().count(),
                report.entries.len(),
                out_dir.join(BATCH_REPORT_FILE).display()
            ),
        }),
    };
    result
}

pub(crate) fn validate(
    config: &TensionConfig,
    atoms: &Path,
    edges: Option<&Path>,
) -> Result<(), CliError> {
    let document = load_atoms(config, atoms)?;
    println!("validate: {} atom(s) OK", document.len());
    if let Some(edges) = edges {
        let lines = read_edge_lines(edges)?;
        let validated = EdgeContract::new(&config.contract).validate_lines(
            &artifact_name(edges),
            &lines,
            &document,
        )?;
        println!("validate: {} edge(s) OK", validated.len());
    }
    Ok(())
}

pub(crate) fn accept(config: &TensionConfig, atoms: &Path, edges: &Path) -> Result<(), CliError> {
    let document = load_atoms(config, atoms)?;
    let lines = read_edge_lines(edges)?;
    let validated =
        EdgeContract::new(&config.contract).validate_lines(&artifact_name(edges), &lines, &document)?;
    let report = AcceptanceChecker::new(&config.acceptance).check(&artifact_name(edges), &validated)?;
    println!("accept: OK edges={} required={}", report.edge_count, report.required);
    for (edge_type, count) in &report.by_type {
        println!("accept:   {edge_type}={count}");
    }
    Ok(())
}

/// The document is written even when the decision fails; the exit code
/// then carries the failure.
pub(crate) fn status(
    config: &TensionConfig,
    evidence_dir: &Path,
    output: &Path,
    gates: Option<&Path>,
    metrics: Option<&Path>,
) -> Result<(), CliError> {
    let inputs = StatusInputs::load(gates, metrics)?;
    let aggregator = StatusAggregator::new(&config.status);
    let document = aggregator.aggregate(&inputs, evidence_dir)?;
    write_json_atomic(output, &document)?;
    println!(
        "status: release_pass={} external_all_pass={} evaluated={} skipped={} -> {}",
        document.release_pass,
        document.external_all_pass,
        document.external.evaluated,
        document.external.skipped,
        output.display()
    );
    aggregator.enforce(&inputs, &document)?;
    Ok(())
}

pub(crate) fn print_config(config: &TensionConfig) -> Result<(), CliError> {
    let text = config.to_toml()?;
    print!("{text}");
    Ok(())
}

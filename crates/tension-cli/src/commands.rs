use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use tension_core::config::{AggregationPolicy, CliOverrides};
use tension_core::constants::STATUS_FILE;

#[derive(Parser)]
#[command(name = "tension")]
#[command(version, about = "Drift-to-tension derivation and release gate aggregation")]
#[command(
    after_help = "Environment:\n  TENSION_LOG                   Tracing filter (default: info)\n  TENSION_POLICY                all | any\n  TENSION_STRICT_EVIDENCE       true | false\n  TENSION_MIN_EDGES             Minimum accepted edge count\n  TENSION_ALLOWED_CONTEXT_KEYS  Comma-separated RunContext keys"
)]
pub(crate) struct Cli {
    /// Project config file. Default: `tension.toml` in --root when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    /// Directory searched for `tension.toml`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
    #[command(flatten)]
    pub overrides: OverrideArgs,
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Highest-priority configuration layer.
#[derive(Args, Clone, Default)]
pub(crate) struct OverrideArgs {
    #[arg(long, global = true, value_enum)]
    pub policy: Option<PolicyCli>,
    #[arg(long, global = true)]
    pub strict_evidence: Option<bool>,
    #[arg(long, global = true)]
    pub min_edges: Option<usize>,
    /// Comma-separated RunContext keys compared by the edge contract.
    #[arg(long, global = true, value_delimiter = ',')]
    pub allowed_context_keys: Option<Vec<String>>,
}

impl OverrideArgs {
    pub fn to_overrides(&self) -> CliOverrides {
        CliOverrides {
            policy: self.policy.map(Into::into),
            strict_evidence: self.strict_evidence,
            min_edges: self.min_edges,
            allowed_context_keys: self.allowed_context_keys.clone(),
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub(crate) enum PolicyCli {
    All,
    Any,
}

impl From<PolicyCli> for AggregationPolicy {
    fn from(value: PolicyCli) -> Self {
        match value {
            PolicyCli::All => AggregationPolicy::All,
            PolicyCli::Any => AggregationPolicy::Any,
        }
    }
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Diff two snapshot directories into a drift document.
    Extract {
        #[arg(long)]
        baseline: PathBuf,
        #[arg(long)]
        candidate: PathBuf,
        #[arg(long)]
        output: PathBuf,
        #[command(flatten)]
        stamp: StampArgs,
    },
    /// Derive an atom document from a drift document.
    Atoms {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Derive NDJSON edges from a validated atom document.
    Edges {
        #[arg(long)]
        atoms: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Extract, derive atoms and edges, validate, and publish into one directory.
    Derive {
        #[arg(long)]
        baseline: PathBuf,
        #[arg(long)]
        candidate: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[command(flatten)]
        stamp: StampArgs,
        /// Also run the acceptance checker over the derived edges.
        #[arg(long, default_value_t = false)]
        accept: bool,
    },
    /// Derive every run pair of a manifest in parallel.
    Batch {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long)]
        out_dir: PathBuf,
        #[arg(long)]
        generated_at: Option<String>,
    },
    /// Check atom (and optionally edge) documents against their contracts.
    Validate {
        #[arg(long)]
        atoms: PathBuf,
        #[arg(long)]
        edges: Option<PathBuf>,
    },
    /// Validate an edge document, then apply the minimum-evidence gate.
    Accept {
        #[arg(long)]
        atoms: PathBuf,
        #[arg(long)]
        edges: PathBuf,
    },
    /// Aggregate internal gates, metrics, and detector evidence into a status document.
    Status {
        #[arg(long)]
        evidence_dir: PathBuf,
        #[arg(long, default_value = STATUS_FILE)]
        output: PathBuf,
        /// Internal gate table (`gates.json` format).
        #[arg(long)]
        gates: Option<PathBuf>,
        /// Internal metrics: `{name: {value, threshold, comparator?}}`.
        #[arg(long)]
        metrics: Option<PathBuf>,
    },
    /// Print the resolved configuration as TOML.
    Config,
}

#[derive(Args, Clone, Default)]
pub(crate) struct StampArgs {
    /// Explicit run pair id. Default: derived from the input hashes.
    #[arg(long)]
    pub run_pair_id: Option<String>,
    /// Generation timestamp recorded in the RunContext. Never hashed into ids.
    #[arg(long)]
    pub generated_at: Option<String>,
}

//! Aggregation policy failures.

use serde::{Deserialize, Serialize};

use super::error_code::{self, ExitCode, TensionErrorCode};

/// A produced metric that did not satisfy its threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailingMetric {
    pub name: String,
    pub value: f64,
    pub threshold: f64,
    /// Comparison that failed, e.g. `<=`.
    pub comparator: String,
}

impl std::fmt::Display for FailingMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} {} {} is false",
            self.name, self.value, self.comparator, self.threshold
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("Release policy `{policy}` failed: {}", render(.failing_metrics, .failing_gates))]
    Failed {
        policy: String,
        failing_metrics: Vec<FailingMetric>,
        failing_gates: Vec<String>,
    },

    #[error(
        "Strict evidence check failed: no parseable detector summary in {evidence_dir} ({checked} configured file(s) checked)"
    )]
    EvidenceMissing { evidence_dir: String, checked: usize },

    #[error(
        "Status mirrors diverge: external.all_pass={nested}, gates.external_all_pass={gate}, external_all_pass={top}"
    )]
    MirrorDivergence { nested: bool, gate: bool, top: bool },
}

fn render(metrics: &[FailingMetric], gates: &[String]) -> String {
    let mut parts: Vec<String> = metrics.iter().map(ToString::to_string).collect();
    parts.extend(gates.iter().map(|g| format!("gate {g} is false")));
    if parts.is_empty() {
        "no produced metric passed".to_string()
    } else {
        parts.join("; ")
    }
}

impl TensionErrorCode for PolicyError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Failed { .. } => error_code::POLICY_FAILED,
            Self::EvidenceMissing { .. } => error_code::EVIDENCE_MISSING,
            Self::MirrorDivergence { .. } => error_code::MIRROR_DIVERGENCE,
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            Self::MirrorDivergence { .. } => ExitCode::Internal,
            _ => ExitCode::PolicyFailure,
        }
    }
}

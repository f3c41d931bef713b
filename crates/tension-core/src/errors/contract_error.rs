//! Contract violations for atom and edge documents.
//!
//! Contract checks are fail-closed: a validation pass collects every
//! violation it sees and returns them together, never a partial success.

use super::error_code::{self, ExitCode, TensionErrorCode};

/// A single structural or cross-referential violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContractViolation {
    #[error("atom #{index} has an empty atom_id")]
    AtomIdEmpty { index: usize },

    #[error("atom #{index} has type `{found}`, expected one of gate_flip, metric_delta, overlay_change")]
    AtomTypeUnknown { index: usize, found: String },

    #[error("atom #{index} is malformed: {message}")]
    AtomMalformed { index: usize, message: String },

    #[error("atom {atom_id} is missing required field `{field}`")]
    AtomFieldMissing { atom_id: String, field: &'static str },

    #[error("atom {atom_id} does not match its content hash {expected}")]
    AtomIdMismatch { atom_id: String, expected: String },

    #[error("atom {atom_id} appears more than once")]
    AtomIdDuplicate { atom_id: String },

    #[error("atom {atom_id} run_context differs from meta.run_context on key `{key}`")]
    AtomContextMismatch { atom_id: String, key: String },

    #[error("edge on line {line} is malformed: {message}")]
    EdgeMalformed { line: usize, message: String },

    #[error("edge on line {line} has an empty edge_id")]
    EdgeIdEmpty { line: usize },

    #[error("edge {edge_id} has an empty rule")]
    EdgeRuleEmpty { edge_id: String },

    #[error("edge {edge_id} references unknown atom {atom_id} via `{field}`")]
    EdgeDanglingRef {
        edge_id: String,
        field: &'static str,
        atom_id: String,
    },

    #[error("edge {edge_id} does not match its content hash {expected}")]
    EdgeIdMismatch { edge_id: String, expected: String },

    #[error("edge {edge_id} appears more than once")]
    EdgeIdDuplicate { edge_id: String },

    #[error("edge {edge_id} run_context differs from atom {atom_id} on key `{key}`")]
    EdgeContextMismatch {
        edge_id: String,
        atom_id: String,
        key: String,
    },
}

impl ContractViolation {
    /// Specific code for this violation kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::AtomIdEmpty { .. } => "ATOM_ID_EMPTY",
            Self::AtomTypeUnknown { .. } => "ATOM_TYPE_UNKNOWN",
            Self::AtomMalformed { .. } => "ATOM_MALFORMED",
            Self::AtomFieldMissing { .. } => "ATOM_FIELD_MISSING",
            Self::AtomIdMismatch { .. } => "ATOM_ID_MISMATCH",
            Self::AtomIdDuplicate { .. } => "ATOM_ID_DUPLICATE",
            Self::AtomContextMismatch { .. } => "ATOM_CONTEXT_MISMATCH",
            Self::EdgeMalformed { .. } => "EDGE_MALFORMED",
            Self::EdgeIdEmpty { .. } => "EDGE_ID_EMPTY",
            Self::EdgeRuleEmpty { .. } => "EDGE_RULE_EMPTY",
            Self::EdgeDanglingRef { .. } => "EDGE_DANGLING_REF",
            Self::EdgeIdMismatch { .. } => "EDGE_ID_MISMATCH",
            Self::EdgeIdDuplicate { .. } => "EDGE_ID_DUPLICATE",
            Self::EdgeContextMismatch { .. } => "EDGE_CONTEXT_MISMATCH",
        }
    }
}

/// Errors raised by the contract validator and by any stage that refuses
/// input crossing RunContext boundaries.
#[derive(Debug, thiserror::Error)]
pub enum ContractError {
    #[error("Atom contract failed for {artifact}: {}", render(.violations))]
    AtomContract {
        artifact: String,
        violations: Vec<ContractViolation>,
    },

    #[error("Edge contract failed for {artifact}: {}", render(.violations))]
    EdgeContract {
        artifact: String,
        violations: Vec<ContractViolation>,
    },

    #[error("Atoms span multiple run contexts: {first} vs {other}")]
    MixedRunContext { first: String, other: String },
}

impl ContractError {
    /// The individual violations, empty for `MixedRunContext`.
    pub fn violations(&self) -> &[ContractViolation] {
        match self {
            Self::AtomContract { violations, .. } | Self::EdgeContract { violations, .. } => {
                violations
            }
            Self::MixedRunContext { .. } => &[],
        }
    }
}

fn render(violations: &[ContractViolation]) -> String {
    let parts: Vec<String> = violations
        .iter()
        .map(|v| format!("[{}] {}", v.code(), v))
        .collect();
    format!("{} violation(s): {}", violations.len(), parts.join("; "))
}

impl TensionErrorCode for ContractError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MixedRunContext { .. } => error_code::MIXED_RUN_CONTEXT,
            _ => error_code::CONTRACT_VIOLATION,
        }
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::ContractViolation
    }
}

//! Acceptance failures: structurally valid output that carries too little evidence.

use super::error_code::{self, ExitCode, TensionErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum AcceptanceError {
    #[error("Acceptance failed for {artifact}: edge count {observed} < required {required}")]
    InsufficientEdges {
        artifact: String,
        observed: usize,
        required: usize,
    },

    #[error(
        "Acceptance failed for {artifact}: `{edge_type}` edge count {observed} < required {required}"
    )]
    InsufficientEdgesOfType {
        artifact: String,
        edge_type: String,
        observed: usize,
        required: usize,
    },
}

impl TensionErrorCode for AcceptanceError {
    fn error_code(&self) -> &'static str {
        error_code::ACCEPTANCE_FAILED
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::AcceptanceFailure
    }
}

//! Artifact publishing errors.

use super::error_code::{self, ExitCode, TensionErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    #[error("Failed to publish {path}: {message}")]
    Io { path: String, message: String },

    #[error("Failed to serialize {artifact}: {message}")]
    Serialize { artifact: String, message: String },
}

impl TensionErrorCode for PublishError {
    fn error_code(&self) -> &'static str {
        error_code::PUBLISH_ERROR
    }

    fn exit_code(&self) -> ExitCode {
        ExitCode::Internal
    }
}

//! Upstream document errors.
//!
//! A required input is never treated as empty-but-valid: a missing file is
//! `Missing`, an unreadable or unparseable one is `Malformed`, and both name
//! the offending path.

use super::error_code::{self, ExitCode, TensionErrorCode};

#[derive(Debug, thiserror::Error)]
pub enum InputError {
    #[error("Required input not found: {path}")]
    Missing { path: String },

    #[error("Malformed input {path}: {message}")]
    Malformed { path: String, message: String },

    #[error("Malformed input {path}: key `{key}` {message}")]
    MalformedKey {
        path: String,
        key: String,
        message: String,
    },

    #[error("Failed to read {path}: {message}")]
    Unreadable { path: String, message: String },
}

impl InputError {
    /// Classify a `std::io::Error` raised while reading `path`.
    pub fn from_io(path: &std::path::Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::Missing {
                path: path.display().to_string(),
            }
        } else {
            Self::Unreadable {
                path: path.display().to_string(),
                message: err.to_string(),
            }
        }
    }

    pub fn malformed(path: &std::path::Path, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

impl TensionErrorCode for InputError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => error_code::INPUT_MISSING,
            _ => error_code::INPUT_MALFORMED,
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Missing { .. } => ExitCode::MissingInput,
            _ => ExitCode::MalformedInput,
        }
    }
}

//! Pipeline errors and non-fatal diagnostic collection.

use super::error_code::{ExitCode, TensionErrorCode};
use super::{AcceptanceError, ConfigError, ContractError, InputError, PolicyError, PublishError};

/// Errors that can occur while running any stage.
/// Aggregates subsystem errors via `From` conversions.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    #[error("Acceptance error: {0}")]
    Acceptance(#[from] AcceptanceError),

    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),
}

impl TensionErrorCode for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Input(e) => e.error_code(),
            Self::Contract(e) => e.error_code(),
            Self::Acceptance(e) => e.error_code(),
            Self::Policy(e) => e.error_code(),
            Self::Config(e) => e.error_code(),
            Self::Publish(e) => e.error_code(),
        }
    }

    fn exit_code(&self) -> ExitCode {
        match self {
            Self::Input(e) => e.exit_code(),
            Self::Contract(e) => e.exit_code(),
            Self::Acceptance(e) => e.exit_code(),
            Self::Policy(e) => e.exit_code(),
            Self::Config(e) => e.exit_code(),
            Self::Publish(e) => e.exit_code(),
        }
    }
}

/// Result of a stage run that accumulates non-fatal diagnostics.
/// Dropped records land in `errors` instead of aborting the stage.
#[derive(Debug, Default)]
pub struct PipelineResult<T = ()> {
    /// The successful result data.
    pub data: T,
    /// Non-fatal errors collected during the run.
    pub errors: Vec<PipelineError>,
}

impl<T> PipelineResult<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    pub fn add_error(&mut self, error: PipelineError) {
        self.errors.push(error);
    }

    /// Returns true if there are no non-fatal errors.
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn error_count(&self) -> usize {
        self.errors.len()
    }
}

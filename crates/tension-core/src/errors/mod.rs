//! Error handling for Tension.
//! One error enum per subsystem, `thiserror` only, zero `anyhow`.

pub mod acceptance_error;
pub mod config_error;
pub mod contract_error;
pub mod error_code;
pub mod input_error;
pub mod pipeline_error;
pub mod policy_error;
pub mod publish_error;

pub use acceptance_error::AcceptanceError;
pub use config_error::ConfigError;
pub use contract_error::{ContractError, ContractViolation};
pub use error_code::{ExitCode, TensionErrorCode};
pub use input_error::InputError;
pub use pipeline_error::{PipelineError, PipelineResult};
pub use policy_error::{FailingMetric, PolicyError};
pub use publish_error::PublishError;

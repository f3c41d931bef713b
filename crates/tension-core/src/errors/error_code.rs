//! Stable error codes and process exit codes.

/// Every error enum implements this to expose a structured code string that
/// survives into logs and CLI output.
pub trait TensionErrorCode {
    /// Returns the error code string (e.g., "CONTRACT_VIOLATION").
    fn error_code(&self) -> &'static str;

    /// Process exit code for this failure category.
    fn exit_code(&self) -> ExitCode;

    /// Returns the formatted error string: `[ERROR_CODE] message`.
    fn coded_string(&self) -> String
    where
        Self: std::fmt::Display,
    {
        format!("[{}] {}", self.error_code(), self)
    }
}

/// Process exit codes. Each failure category gets its own code so CI can tell
/// a contract violation from a missing input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Usage = 2,
    ContractViolation = 3,
    AcceptanceFailure = 4,
    PolicyFailure = 5,
    MissingInput = 6,
    MalformedInput = 7,
    Config = 8,
    Internal = 10,
}

impl ExitCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Usage => "usage",
            Self::ContractViolation => "contract_violation",
            Self::AcceptanceFailure => "acceptance_failure",
            Self::PolicyFailure => "policy_failure",
            Self::MissingInput => "missing_input",
            Self::MalformedInput => "malformed_input",
            Self::Config => "config",
            Self::Internal => "internal",
        }
    }

    pub fn all() -> &'static [ExitCode] {
        &[
            Self::Success,
            Self::Usage,
            Self::ContractViolation,
            Self::AcceptanceFailure,
            Self::PolicyFailure,
            Self::MissingInput,
            Self::MalformedInput,
            Self::Config,
            Self::Internal,
        ]
    }

    /// Inverse of `as u8`.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::all().iter().copied().find(|c| *c as u8 == code)
    }
}

pub const INPUT_MISSING: &str = "INPUT_MISSING";
pub const INPUT_MALFORMED: &str = "INPUT_MALFORMED";
pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
pub const CONTRACT_VIOLATION: &str = "CONTRACT_VIOLATION";
pub const ACCEPTANCE_FAILED: &str = "ACCEPTANCE_FAILED";
pub const POLICY_FAILED: &str = "POLICY_FAILED";
pub const EVIDENCE_MISSING: &str = "EVIDENCE_MISSING";
pub const MIRROR_DIVERGENCE: &str = "MIRROR_DIVERGENCE";
pub const PUBLISH_ERROR: &str = "PUBLISH_ERROR";
pub const MIXED_RUN_CONTEXT: &str = "MIXED_RUN_CONTEXT";

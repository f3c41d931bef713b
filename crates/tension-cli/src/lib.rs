//! The `tension` command-line surface.
//!
//! Every failure maps to a process exit code through `TensionErrorCode`;
//! argument errors exit with the usage code.
#![forbid(unsafe_code)]

mod actions;
mod commands;

use std::process::ExitCode as ProcessExitCode;

use clap::{error::ErrorKind, Parser};

use tension_core::config::TensionConfig;
use tension_core::errors::{ExitCode, PipelineError, TensionErrorCode};

use commands::{Cli, Commands};

/// A failure ready to be reported: exit code plus a coded message.
#[derive(Debug)]
pub struct CliError {
    pub exit_code: ExitCode,
    pub message: String,
}

impl CliError {
    fn usage(message: impl Into<String>) -> Self {
        Self {
            exit_code: ExitCode::Usage,
            message: format!("[USAGE] {}", message.into()),
        }
    }
}

impl From<PipelineError> for CliError {
    fn from(err: PipelineError) -> Self {
        Self {
            exit_code: err.exit_code(),
            message: err.coded_string(),
        }
    }
}

macro_rules! impl_from_stage_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(err: $ty) -> Self {
                    PipelineError::from(err).into()
                }
            }
        )*
    };
}

impl_from_stage_error!(
    tension_core::errors::InputError,
    tension_core::errors::ContractError,
    tension_core::errors::AcceptanceError,
    tension_core::errors::PolicyError,
    tension_core::errors::ConfigError,
    tension_core::errors::PublishError,
);

pub fn main_entry() -> ProcessExitCode {
    match run() {
        Ok(()) => ProcessExitCode::from(ExitCode::Success as u8),
        Err(err) => {
            eprintln!("{}", err.message);
            ProcessExitCode::from(err.exit_code as u8)
        }
    }
}

fn run() -> Result<(), CliError> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{err}");
                return Ok(());
            }
            _ => return Err(CliError::usage(err.to_string().trim_end())),
        },
    };

    let default_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tension_core::tracing::init_tracing_with_default(default_level);

    let command = cli
        .command
        .ok_or_else(|| CliError::usage("missing command; see --help"))?;
    let config = TensionConfig::load(
        &cli.root,
        cli.config.as_deref(),
        Some(&cli.overrides.to_overrides()),
    )?;

    match command {
        Commands::Extract {
            baseline,
            candidate,
            output,
            stamp,
        } => actions::extract(&config, &baseline, &candidate, &output, &stamp),
        Commands::Atoms { input, output } => actions::atoms(&config, &input, &output),
        Commands::Edges { atoms, output } => actions::edges(&config, &atoms, &output),
        Commands::Derive {
            baseline,
            candidate,
            out_dir,
            stamp,
            accept,
        } => actions::derive(&config, &baseline, &candidate, &out_dir, &stamp, accept),
        Commands::Batch {
            manifest,
            out_dir,
            generated_at,
        } => actions::batch(&config, &manifest, &out_dir, generated_at),
        Commands::Validate { atoms, edges } => {
            actions::validate(&config, &atoms, edges.as_deref())
        }
        Commands::Accept { atoms, edges } => actions::accept(&config, &atoms, &edges),
        Commands::Status {
            evidence_dir,
            output,
            gates,
            metrics,
        } => actions::status(
            &config,
            &evidence_dir,
            &output,
            gates.as_deref(),
            metrics.as_deref(),
        ),
        Commands::Config => actions::print_config(&config),
    }
}

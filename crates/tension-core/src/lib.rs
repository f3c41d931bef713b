//! Core types, errors, configuration, and tracing for the Tension engine.
//!
//! Everything here is shared by the derivation stages in `tension-analysis`
//! and the `tension` binary. Nothing in this crate reads ambient state except
//! `TensionConfig::load`, which is only called at the outer edge.

pub mod config;
pub mod constants;
pub mod errors;
pub mod tracing;
pub mod types;

pub use types::{content_id, AtomType, RunContext, Severity};

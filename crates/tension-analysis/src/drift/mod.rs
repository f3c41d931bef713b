//! Drift extraction: normalized differences between a baseline and a candidate run.

pub mod extractor;
pub mod types;

pub use extractor::{build_run_context, DriftExtractor};
pub use types::*;

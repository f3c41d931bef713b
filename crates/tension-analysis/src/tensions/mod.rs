//! Tensions: co-occurrence edges between atoms of one RunContext.
//!
//! An edge records only that two atoms co-occurred under a named rule. It
//! carries no causal claim.

pub mod engine;
pub mod rules;
pub mod types;

pub use engine::EdgeDeriver;
pub use rules::{RuleTable, PARTICIPATION_FLOOR};
pub use types::*;

//! Drift-to-tension derivation and release gate aggregation.
//!
//! Stages, leaves first:
//! - `snapshot`: load one run's gate, metric, and overlay tables
//! - `drift`: diff baseline vs candidate into drift records
//! - `atoms`: content-addressed facts, one per drift record
//! - `tensions`: rule table and edge deriver over a complete atom set
//! - `contracts`: fail-closed structural and referential checks
//! - `acceptance`: minimum-evidence gate over a validated edge set
//! - `status`: detector probing, policy aggregation, status document
//! - `export`: document readers and atomic publishing
//! - `pipeline`: end-to-end derivation, single pair or batch

pub mod acceptance;
pub mod atoms;
pub mod contracts;
pub mod drift;
pub mod export;
pub mod pipeline;
pub mod snapshot;
pub mod status;
pub mod tensions;

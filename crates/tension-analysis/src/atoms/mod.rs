//! Atoms: immutable, content-addressed facts derived 1:1 from drift records.

pub mod deriver;
pub mod types;

pub use deriver::AtomDeriver;
pub use types::*;

//! Core value types shared by every stage.

pub mod atom_type;
pub mod hashing;
pub mod run_context;
pub mod severity;

pub use atom_type::AtomType;
pub use hashing::{canonical_json, content_id, hash_bytes};
pub use run_context::RunContext;
pub use severity::Severity;

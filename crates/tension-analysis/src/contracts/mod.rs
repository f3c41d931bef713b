//! Contract validator: fail-closed structural and referential checks.
//!
//! Every check of a pass runs; violations are returned together in one
//! `ContractError`. Empty atom and edge collections pass.

pub mod atom_contract;
pub mod edge_contract;

pub use atom_contract::AtomContract;
pub use edge_contract::{EdgeContract, EdgeLine};

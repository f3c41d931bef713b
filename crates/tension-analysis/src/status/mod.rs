//! Status aggregator: internal gates, internal metrics, and external
//! detector summaries folded into one status document.

pub mod aggregator;
pub mod detectors;
pub mod evidence;
pub mod policy;
pub mod types;

pub use aggregator::StatusAggregator;
pub use detectors::{DetectorProbe, ProbeOutcome};
pub use policy::{PolicyEngine, PolicyOutcome};
pub use types::*;

//! Configuration system for Tension.
//! TOML-based, layered resolution: CLI > env > project file > compiled defaults.

pub mod acceptance_config;
pub mod contract_config;
pub mod drift_config;
pub mod rules_config;
pub mod status_config;
pub mod tension_config;

pub use acceptance_config::AcceptanceConfig;
pub use contract_config::ContractConfig;
pub use drift_config::{DriftConfig, MetricBand};
pub use rules_config::{RuleSpec, RulesConfig, SeverityRule};
pub use status_config::{AggregationPolicy, Comparator, DetectorSpec, StatusConfig};
pub use tension_config::{CliOverrides, TensionConfig};

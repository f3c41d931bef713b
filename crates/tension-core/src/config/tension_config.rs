//! Top-level Tension configuration with layered resolution.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::contract_config::KNOWN_CONTEXT_KEYS;
use super::{
    AcceptanceConfig, AggregationPolicy, ContractConfig, DriftConfig, RulesConfig, SeverityRule,
    StatusConfig,
};
use crate::constants::CONFIG_FILE_NAME;
use crate::errors::ConfigError;
use crate::types::AtomType;

/// Top-level configuration aggregating all sub-configs.
///
/// Resolution order (highest priority first):
/// 1. CLI flags (applied via `apply_cli_overrides`)
/// 2. Environment variables (`TENSION_*`)
/// 3. Project config (`--config` path, else `tension.toml` in the root)
/// 4. Compiled defaults
///
/// The resolved value is passed into every stage; no stage reads the
/// environment or the filesystem for configuration on its own.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct TensionConfig {
    pub drift: DriftConfig,
    pub rules: RulesConfig,
    pub contract: ContractConfig,
    pub acceptance: AcceptanceConfig,
    pub status: StatusConfig,
}

/// CLI override arguments that can be applied to a config.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub policy: Option<AggregationPolicy>,
    pub strict_evidence: Option<bool>,
    pub min_edges: Option<usize>,
    pub allowed_context_keys: Option<Vec<String>>,
}

impl TensionConfig {
    /// Load configuration with layered resolution.
    ///
    /// An explicit `config_path` must exist. Without one, `tension.toml` in
    /// `root` is used when present and compiled defaults otherwise.
    pub fn load(
        root: &Path,
        config_path: Option<&Path>,
        cli_overrides: Option<&CliOverrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Layer 3: project config
        let project_path: Option<PathBuf> = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::FileNotFound {
                        path: path.display().to_string(),
                    });
                }
                Some(path.to_path_buf())
            }
            None => {
                let candidate = root.join(CONFIG_FILE_NAME);
                candidate.exists().then_some(candidate)
            }
        };
        if let Some(path) = project_path {
            tracing::debug!(path = %path.display(), "merging project config");
            Self::merge_toml_file(&mut config, &path)?;
        }

        // Layer 2: environment variables
        Self::apply_env_overrides(&mut config)?;

        // Layer 1 (highest priority): CLI flags
        if let Some(cli) = cli_overrides {
            Self::apply_cli_overrides(&mut config, cli);
        }

        Self::validate(&config)?;

        Ok(config)
    }

    /// Load configuration from a TOML string (for testing).
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
            path: "<string>".to_string(),
            message: e.to_string(),
        })?;
        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(config: &TensionConfig) -> Result<(), ConfigError> {
        for (metric, band) in &config.drift.bands {
            if !band.is_ordered() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("drift.bands.{metric}"),
                    message: "must satisfy 0 <= info <= warn <= crit".to_string(),
                });
            }
        }
        if let Some(band) = &config.drift.default_band {
            if !band.is_ordered() {
                return Err(ConfigError::ValidationFailed {
                    field: "drift.default_band".to_string(),
                    message: "must satisfy 0 <= info <= warn <= crit".to_string(),
                });
            }
        }

        let rules = config.rules.effective_rules();
        let mut names = HashSet::new();
        for rule in &rules {
            if rule.name.is_empty() || rule.edge_type.is_empty() {
                return Err(ConfigError::ValidationFailed {
                    field: "rules.rules".to_string(),
                    message: "every rule needs a name and an edge_type".to_string(),
                });
            }
            if !names.insert(rule.name.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("rules.rules.{}", rule.name),
                    message: "duplicate rule name".to_string(),
                });
            }
            if rule.severity == SeverityRule::Inherit && rule.right != AtomType::MetricDelta {
                return Err(ConfigError::ValidationFailed {
                    field: format!("rules.rules.{}.severity", rule.name),
                    message: format!(
                        "`inherit` needs a metric_delta right-hand atom, found {}",
                        rule.right
                    ),
                });
            }
        }
        for toggled in config.rules.enabled.iter().chain(&config.rules.disabled) {
            if !names.contains(toggled.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "rules.enabled/disabled".to_string(),
                    message: format!("unknown rule `{toggled}`"),
                });
            }
        }

        for key in &config.contract.allowed_context_keys {
            if !KNOWN_CONTEXT_KEYS.contains(&key.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "contract.allowed_context_keys".to_string(),
                    message: format!(
                        "unknown key `{key}` (expected one of {})",
                        KNOWN_CONTEXT_KEYS.join(", ")
                    ),
                });
            }
        }

        for (key, value) in &config.status.thresholds {
            if !value.is_finite() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("status.thresholds.{key}"),
                    message: "must be a finite number".to_string(),
                });
            }
        }
        let mut detector_names = HashSet::new();
        for detector in &config.status.detectors {
            if !detector_names.insert(detector.name.as_str()) {
                return Err(ConfigError::ValidationFailed {
                    field: format!("status.detectors.{}", detector.name),
                    message: "duplicate detector name".to_string(),
                });
            }
            if config.status.threshold_for(detector).is_none() {
                return Err(ConfigError::ValidationFailed {
                    field: format!("status.detectors.{}.threshold_key", detector.name),
                    message: format!(
                        "threshold key `{}` is not defined in status.thresholds",
                        detector.threshold_key
                    ),
                });
            }
        }
        Ok(())
    }

    /// Merge a TOML file into the existing config.
    fn merge_toml_file(config: &mut TensionConfig, path: &Path) -> Result<(), ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let file_config: TensionConfig =
            toml::from_str(&content).map_err(|e| ConfigError::ParseError {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;

        Self::merge(config, &file_config);
        Ok(())
    }

    /// Merge `other` into `base`, where `other` values override `base` values
    /// only when `other` sets them.
    fn merge(base: &mut TensionConfig, other: &TensionConfig) {
        // Drift
        if !other.drift.bands.is_empty() {
            base.drift.bands = other.drift.bands.clone();
        }
        if other.drift.default_band.is_some() {
            base.drift.default_band = other.drift.default_band;
        }
        if !other.drift.overlay_allowlist.is_empty() {
            base.drift.overlay_allowlist = other.drift.overlay_allowlist.clone();
        }

        // Rules
        if other.rules.version.is_some() {
            base.rules.version = other.rules.version.clone();
        }
        if !other.rules.rules.is_empty() {
            base.rules.rules = other.rules.rules.clone();
        }
        if !other.rules.enabled.is_empty() {
            base.rules.enabled = other.rules.enabled.clone();
        }
        if !other.rules.disabled.is_empty() {
            base.rules.disabled = other.rules.disabled.clone();
        }

        // Contract
        if !other.contract.allowed_context_keys.is_empty() {
            base.contract.allowed_context_keys = other.contract.allowed_context_keys.clone();
        }

        // Acceptance
        if other.acceptance.min_edges.is_some() {
            base.acceptance.min_edges = other.acceptance.min_edges;
        }
        if !other.acceptance.min_edges_by_type.is_empty() {
            base.acceptance.min_edges_by_type = other.acceptance.min_edges_by_type.clone();
        }

        // Status
        if other.status.policy.is_some() {
            base.status.policy = other.status.policy;
        }
        if other.status.strict_evidence.is_some() {
            base.status.strict_evidence = other.status.strict_evidence;
        }
        if !other.status.thresholds.is_empty() {
            base.status.thresholds = other.status.thresholds.clone();
        }
        if !other.status.detectors.is_empty() {
            base.status.detectors = other.status.detectors.clone();
        }
    }

    /// Apply environment variable overrides.
    /// Pattern: `TENSION_POLICY`, `TENSION_STRICT_EVIDENCE`, etc.
    ///
    /// A set but unparseable variable is an error rather than a silent
    /// fallback: these values decide whether a release passes.
    fn apply_env_overrides(config: &mut TensionConfig) -> Result<(), ConfigError> {
        if let Ok(val) = std::env::var("TENSION_POLICY") {
            let policy = val
                .parse::<AggregationPolicy>()
                .map_err(|message| ConfigError::InvalidValue {
                    field: "TENSION_POLICY".to_string(),
                    message,
                })?;
            config.status.policy = Some(policy);
        }
        if let Ok(val) = std::env::var("TENSION_STRICT_EVIDENCE") {
            let strict = val.parse::<bool>().map_err(|e| ConfigError::InvalidValue {
                field: "TENSION_STRICT_EVIDENCE".to_string(),
                message: e.to_string(),
            })?;
            config.status.strict_evidence = Some(strict);
        }
        if let Ok(val) = std::env::var("TENSION_MIN_EDGES") {
            let min = val.parse::<usize>().map_err(|e| ConfigError::InvalidValue {
                field: "TENSION_MIN_EDGES".to_string(),
                message: e.to_string(),
            })?;
            config.acceptance.min_edges = Some(min);
        }
        if let Ok(val) = std::env::var("TENSION_ALLOWED_CONTEXT_KEYS") {
            config.contract.allowed_context_keys = val
                .split(',')
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    /// Apply CLI overrides (highest priority).
    fn apply_cli_overrides(config: &mut TensionConfig, cli: &CliOverrides) {
        if let Some(v) = cli.policy {
            config.status.policy = Some(v);
        }
        if let Some(v) = cli.strict_evidence {
            config.status.strict_evidence = Some(v);
        }
        if let Some(v) = cli.min_edges {
            config.acceptance.min_edges = Some(v);
        }
        if let Some(ref v) = cli.allowed_context_keys {
            config.contract.allowed_context_keys = v.clone();
        }
    }

    /// Serialize the config back to TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ParseError {
            path: "<serialization>".to_string(),
            message: e.to_string(),
        })
    }
}

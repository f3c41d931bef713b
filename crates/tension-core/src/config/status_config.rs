//! Status aggregation configuration: policy, strict evidence, detectors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// How produced metric outcomes combine into one decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AggregationPolicy {
    /// Every produced metric passes. Vacuously true with none.
    #[default]
    All,
    /// At least one produced metric passes. Vacuously true with none.
    Any,
}

impl AggregationPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for AggregationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AggregationPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(Self::All),
            "any" => Ok(Self::Any),
            other => Err(format!("unknown aggregation policy `{other}` (expected all|any)")),
        }
    }
}

/// Pass comparison between an observed value and its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    /// `value <= threshold`
    #[default]
    Le,
    /// `value >= threshold`
    Ge,
}

impl Comparator {
    pub fn holds(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Le => value <= threshold,
            Self::Ge => value >= threshold,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Le => "<=",
            Self::Ge => ">=",
        }
    }
}

/// One external detector whose summary document feeds the aggregator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorSpec {
    pub name: String,
    /// Summary file, relative to the evidence directory.
    pub file: String,
    /// Field to read. Dotted paths descend into objects. Default: `value`, then `rate`.
    #[serde(default)]
    pub value_key: Option<String>,
    /// Key into `status.thresholds`.
    pub threshold_key: String,
    #[serde(default)]
    pub comparator: Comparator,
}

impl DetectorSpec {
    /// Candidate keys in lookup order.
    pub fn value_keys(&self) -> Vec<&str> {
        match &self.value_key {
            Some(key) => vec![key.as_str()],
            None => vec!["value", "rate"],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StatusConfig {
    /// Default: `all`.
    pub policy: Option<AggregationPolicy>,
    /// Require at least one parseable detector summary. Default: false.
    pub strict_evidence: Option<bool>,
    /// Named thresholds referenced by detectors.
    pub thresholds: BTreeMap<String, f64>,
    pub detectors: Vec<DetectorSpec>,
}

impl StatusConfig {
    pub fn effective_policy(&self) -> AggregationPolicy {
        self.policy.unwrap_or_default()
    }

    pub fn effective_strict_evidence(&self) -> bool {
        self.strict_evidence.unwrap_or(false)
    }

    /// Threshold for `detector`, if its key resolves.
    pub fn threshold_for(&self, detector: &DetectorSpec) -> Option<f64> {
        self.thresholds.get(&detector.threshold_key).copied()
    }
}

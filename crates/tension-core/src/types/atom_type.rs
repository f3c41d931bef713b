//! The closed set of atom kinds.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtomType {
    GateFlip,
    MetricDelta,
    OverlayChange,
}

impl AtomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GateFlip => "gate_flip",
            Self::MetricDelta => "metric_delta",
            Self::OverlayChange => "overlay_change",
        }
    }

    pub fn all() -> &'static [AtomType] {
        &[Self::GateFlip, Self::MetricDelta, Self::OverlayChange]
    }
}

impl fmt::Display for AtomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AtomType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown atom type `{s}`"))
    }
}

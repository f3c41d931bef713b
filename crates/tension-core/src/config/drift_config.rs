//! Drift extraction configuration: metric bands and overlay allowlist.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::Severity;

/// Magnitude bands for one metric. A delta whose magnitude is below `info`
/// is not drift at all.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricBand {
    #[serde(default)]
    pub info: f64,
    pub warn: f64,
    pub crit: f64,
}

impl MetricBand {
    pub fn new(info: f64, warn: f64, crit: f64) -> Self {
        Self { info, warn, crit }
    }

    /// Classify a delta magnitude. Zero and non-finite magnitudes never classify.
    pub fn classify(&self, magnitude: f64) -> Option<Severity> {
        if !magnitude.is_finite() || magnitude == 0.0 {
            return None;
        }
        if magnitude >= self.crit {
            Some(Severity::Crit)
        } else if magnitude >= self.warn {
            Some(Severity::Warn)
        } else if magnitude >= self.info {
            Some(Severity::Info)
        } else {
            None
        }
    }

    /// `0 <= info <= warn <= crit`, all finite.
    pub fn is_ordered(&self) -> bool {
        [self.info, self.warn, self.crit].iter().all(|v| v.is_finite())
            && 0.0 <= self.info
            && self.info <= self.warn
            && self.warn <= self.crit
    }
}

/// Configuration for the drift extractor.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DriftConfig {
    /// Per-metric bands keyed by metric name.
    pub bands: BTreeMap<String, MetricBand>,
    /// Band for metrics without an entry in `bands`.
    pub default_band: Option<MetricBand>,
    /// Overlay documents whose key changes are recorded. Others are ignored.
    pub overlay_allowlist: Vec<String>,
}

impl DriftConfig {
    /// Band for `metric`, falling back to `default_band`.
    pub fn band_for(&self, metric: &str) -> Option<&MetricBand> {
        self.bands.get(metric).or(self.default_band.as_ref())
    }

    pub fn is_overlay_allowed(&self, document: &str) -> bool {
        self.overlay_allowlist.iter().any(|d| d == document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_respects_band_edges() {
        let band = MetricBand::new(0.01, 0.05, 0.10);
        assert_eq!(band.classify(0.005), None);
        assert_eq!(band.classify(0.01), Some(Severity::Info));
        assert_eq!(band.classify(0.05), Some(Severity::Warn));
        assert_eq!(band.classify(0.10), Some(Severity::Crit));
        assert_eq!(band.classify(0.0), None);
        assert_eq!(band.classify(f64::NAN), None);
    }

    #[test]
    fn band_ordering() {
        assert!(MetricBand::new(0.0, 0.1, 0.2).is_ordered());
        assert!(!MetricBand::new(0.0, 0.3, 0.2).is_ordered());
        assert!(!MetricBand::new(-1.0, 0.1, 0.2).is_ordered());
    }
}

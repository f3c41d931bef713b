//! Strict evidence presence.

use std::path::Path;

use tension_core::errors::PolicyError;

use super::detectors::DetectorProbe;

/// Fail closed unless at least one configured detector summary parsed.
///
/// Runs before aggregation and independently of the policy decision.
pub fn require_evidence(evidence_dir: &Path, probes: &[DetectorProbe]) -> Result<(), PolicyError> {
    let parsed = probes.iter().filter(|p| p.summary_parsed()).count();
    if parsed == 0 {
        tracing::warn!(
            evidence_dir = %evidence_dir.display(),
            checked = probes.len(),
            "strict evidence check failed"
        );
        return Err(PolicyError::EvidenceMissing {
            evidence_dir: evidence_dir.display().to_string(),
            checked: probes.len(),
        });
    }
    tracing::debug!(parsed, checked = probes.len(), "strict evidence check passed");
    Ok(())
}

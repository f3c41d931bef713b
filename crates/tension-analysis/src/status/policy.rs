//! Policy engine: folds produced metric outcomes per aggregation policy.

use tension_core::config::AggregationPolicy;

use super::types::StatusMetric;

/// Result of one policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyOutcome {
    pub policy: AggregationPolicy,
    pub evaluated: usize,
    pub skipped: usize,
    pub passed: usize,
    pub all_pass: bool,
}

impl PolicyOutcome {
    /// True when the decision was reached with nothing produced.
    pub fn is_vacuous(&self) -> bool {
        self.evaluated == 0
    }
}

pub struct PolicyEngine {
    policy: AggregationPolicy,
}

impl PolicyEngine {
    pub fn new(policy: AggregationPolicy) -> Self {
        Self { policy }
    }

    /// Skipped entries never count either way. Both policies pass
    /// vacuously when no metric was produced.
    pub fn evaluate(&self, metrics: &[StatusMetric]) -> PolicyOutcome {
        let produced: Vec<&StatusMetric> = metrics.iter().filter(|m| m.is_produced()).collect();
        let passed = produced.iter().filter(|m| m.pass == Some(true)).count();

        let all_pass = match self.policy {
            AggregationPolicy::All => passed == produced.len(),
            AggregationPolicy::Any => produced.is_empty() || passed > 0,
        };

        PolicyOutcome {
            policy: self.policy,
            evaluated: produced.len(),
            skipped: metrics.len() - produced.len(),
            passed,
            all_pass,
        }
    }
}

//! The versioned tension rule table.

use tension_core::config::{RuleSpec, RulesConfig, SeverityRule};
use tension_core::{AtomType, Severity};

use crate::atoms::Atom;

/// Metric deltas below this severity never take part in any rule, whatever
/// the table says. Pure info-level changes cannot create tension.
pub const PARTICIPATION_FLOOR: Severity = Severity::Warn;

/// Enabled rules of one table version.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    pub version: String,
    rules: Vec<RuleSpec>,
}

impl RuleTable {
    pub fn new(version: impl Into<String>, rules: Vec<RuleSpec>) -> Self {
        Self {
            version: version.into(),
            rules: rules.into_iter().filter(|r| r.enabled).collect(),
        }
    }

    pub fn from_config(config: &RulesConfig) -> Self {
        Self::new(config.effective_version(), config.effective_rules())
    }

    pub fn rules(&self) -> &[RuleSpec] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    fn default() -> Self {
        Self::from_config(&RulesConfig::default())
    }
}

/// Whether `atom` may take part in any rule at all.
pub fn participates(atom: &Atom) -> bool {
    match atom.atom_type {
        AtomType::MetricDelta => atom.severity.is_some_and(|s| s >= PARTICIPATION_FLOOR),
        _ => true,
    }
}

/// Whether `(left, right)` matches `rule`. Returns the edge severity on match.
pub fn evaluate(rule: &RuleSpec, left: &Atom, right: &Atom) -> Option<Severity> {
    if left.atom_type != rule.left || right.atom_type != rule.right {
        return None;
    }
    if left.atom_id == right.atom_id || !participates(left) || !participates(right) {
        return None;
    }
    if let Some(min) = rule.min_severity {
        if right.severity.map_or(true, |s| s < min) {
            return None;
        }
    }
    match rule.severity {
        SeverityRule::Inherit => right.severity,
        SeverityRule::Fixed(severity) => Some(severity),
    }
}

//! Tension rule table configuration.

use serde::{Deserialize, Serialize};

use crate::constants::RULE_TABLE_VERSION;
use crate::types::{AtomType, Severity};

/// How an edge's severity is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeverityRule {
    /// Take the severity of the right-hand atom.
    Inherit,
    /// Fixed by the rule.
    Fixed(Severity),
}

/// One row of the rule table: a left/right atom-type pattern and the edge it emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleSpec {
    pub name: String,
    pub left: AtomType,
    pub right: AtomType,
    pub edge_type: String,
    /// Right-hand atoms below this severity never participate.
    #[serde(default)]
    pub min_severity: Option<Severity>,
    pub severity: SeverityRule,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl RuleSpec {
    /// The compiled-in `tension-rules/v1` table.
    pub fn default_table() -> Vec<RuleSpec> {
        vec![
            RuleSpec {
                name: "gate_metric".to_string(),
                left: AtomType::GateFlip,
                right: AtomType::MetricDelta,
                edge_type: "gate_metric_tension".to_string(),
                min_severity: Some(Severity::Warn),
                severity: SeverityRule::Inherit,
                enabled: true,
            },
            RuleSpec {
                name: "gate_overlay".to_string(),
                left: AtomType::GateFlip,
                right: AtomType::OverlayChange,
                edge_type: "gate_overlay_tension".to_string(),
                min_severity: None,
                severity: SeverityRule::Fixed(Severity::Warn),
                enabled: false,
            },
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RulesConfig {
    /// Rule table version label. Default: `tension-rules/v1`.
    pub version: Option<String>,
    /// Replacement rule table. Empty means the compiled-in table.
    pub rules: Vec<RuleSpec>,
    /// Rule names to force on.
    pub enabled: Vec<String>,
    /// Rule names to force off. Wins over `enabled`.
    pub disabled: Vec<String>,
}

impl RulesConfig {
    pub fn effective_version(&self) -> &str {
        self.version.as_deref().unwrap_or(RULE_TABLE_VERSION)
    }

    /// The rule table with `enabled`/`disabled` toggles applied.
    pub fn effective_rules(&self) -> Vec<RuleSpec> {
        let mut rules = if self.rules.is_empty() {
            RuleSpec::default_table()
        } else {
            self.rules.clone()
        };
        for rule in &mut rules {
            if self.enabled.contains(&rule.name) {
                rule.enabled = true;
            }
            if self.disabled.contains(&rule.name) {
                rule.enabled = false;
            }
        }
        rules
    }
}

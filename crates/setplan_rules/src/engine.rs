//! Rule pipeline.

use crate::config::RuleConfig;
use crate::diagnostic::Diagnostic;
use crate::facts::Facts;
use crate::rules;
use crate::snapshot::{PracticeSnapshot, ValidationContext};
use std::sync::Arc;
use tracing::{debug, trace};

/// A validation rule.
///
/// Rules are independent of each other and return at most one diagnostic.
/// They must not panic and must not read anything outside `facts`.
pub trait Rule: Send + Sync {
    /// Short rule name used in logs.
    fn name(&self) -> &'static str;

    /// Evaluates the rule.
    fn evaluate(&self, facts: &Facts<'_>) -> Option<Diagnostic>;
}

/// Runs a list of rules over a snapshot.
///
/// # Example
///
/// ```rust,ignore
/// use setplan_rules::{RuleConfig, ValidationEngine};
///
/// let engine = ValidationEngine::new()
///     .with_config(RuleConfig::default().with_min_confirmed_dogs(6))
///     .with_rule(MyClubRule);
/// let diagnostics = engine.validate(&snapshot, &ctx);
/// ```
#[derive(Clone)]
pub struct ValidationEngine {
    rules: Vec<Arc<dyn Rule>>,
    config: RuleConfig,
}

impl ValidationEngine {
    /// Creates an engine with the built-in rules.
    pub fn new() -> Self {
        Self {
            rules: rules::standard_rules(),
            config: RuleConfig::default(),
        }
    }

    /// Creates an engine with no rules.
    pub fn empty() -> Self {
        Self {
            rules: Vec::new(),
            config: RuleConfig::default(),
        }
    }

    /// Adds a rule.
    pub fn with_rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Sets the thresholds.
    pub fn with_config(mut self, config: RuleConfig) -> Self {
        self.config = config;
        self
    }

    /// Returns the rule names in evaluation order.
    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Evaluates every rule and returns the diagnostics in display order:
    /// errors, then warnings, then infos, each by message.
    pub fn validate(
        &self,
        snapshot: &PracticeSnapshot,
        context: &ValidationContext,
    ) -> Vec<Diagnostic> {
        let facts = Facts::new(snapshot, context, &self.config);
        let mut diagnostics: Vec<Diagnostic> = self
            .rules
            .iter()
            .filter_map(|rule| {
                let diagnostic = rule.evaluate(&facts);
                if let Some(d) = &diagnostic {
                    trace!(rule = rule.name(), code = %d.code, "rule fired");
                }
                diagnostic
            })
            .collect();
        diagnostics.sort_by(Diagnostic::display_cmp);

        debug!(
            practice = %snapshot.practice.id,
            rules = self.rules.len(),
            diagnostics = diagnostics.len(),
            "practice validated"
        );
        diagnostics
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Validates a snapshot with the built-in rules and default thresholds.
pub fn validate(snapshot: &PracticeSnapshot, context: &ValidationContext) -> Vec<Diagnostic> {
    ValidationEngine::new().validate(snapshot, context)
}

//! Lint rules: domains `semantic`/`style`/`heuristic`, code prefix `LINT_`.

mod semantic;
mod style;

use std::fmt;
use std::sync::Arc;

pub use semantic::{SemanticInconsistentShapeRule, SemanticMissingRequiredFieldRule};
pub use style::StyleSingleLineMultiValueBlockRule;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::Diagnostic;

use crate::error::EngineError;
use crate::services::TypecheckServices;
use crate::typecheck::TypecheckFacts;

/// Domain of a lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintDomain {
    Semantic,
    Style,
    Heuristic,
}

impl fmt::Display for LintDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LintDomain::Semantic => "semantic",
            LintDomain::Style => "style",
            LintDomain::Heuristic => "heuristic",
        };
        write!(f, "{name}")
    }
}

/// Confidence of a lint rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintConfidence {
    Policy,
    Heuristic,
}

impl fmt::Display for LintConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LintConfidence::Policy => "policy",
            LintConfidence::Heuristic => "heuristic",
        };
        write!(f, "{name}")
    }
}

/// Contract for one lint rule.
///
/// Lint runs after type-check and may consume its facts.
pub trait LintRule {
    fn code(&self) -> &str;
    fn name(&self) -> &str;
    fn category(&self) -> &str;
    fn domain(&self) -> LintDomain;
    fn confidence(&self) -> LintConfidence;

    fn run(&self, facts: &AnalysisFacts, type_facts: &TypecheckFacts, text: &str)
    -> Vec<Diagnostic>;
}

/// The built-in lint rules, wired from `services` and sorted by
/// `(category, code, name)` for stable output.
pub fn default_lint_rules(services: &TypecheckServices) -> Vec<Arc<dyn LintRule>> {
    let mut rules: Vec<Arc<dyn LintRule>> = vec![
        Arc::new(SemanticInconsistentShapeRule::default()),
        Arc::new(SemanticMissingRequiredFieldRule {
            required_fields_by_object: services.required_fields_by_object.clone(),
        }),
        Arc::new(StyleSingleLineMultiValueBlockRule::default()),
    ];
    rules.sort_by(|a, b| {
        a.category()
            .cmp(b.category())
            .then_with(|| a.code().cmp(b.code()))
            .then_with(|| a.name().cmp(b.name()))
    });
    rules
}

/// Validate lint rules at registration time.
pub fn validate_lint_rules(rules: &[Arc<dyn LintRule>]) -> Result<(), EngineError> {
    for rule in rules {
        if !rule.code().starts_with("LINT_") {
            return Err(EngineError::invalid_lint_rule(
                rule.name(),
                format!("code `{}` must use the `LINT_` prefix", rule.code()),
            ));
        }
        if rule.category().is_empty() {
            return Err(EngineError::invalid_lint_rule(
                rule.name(),
                "category must not be empty".to_string(),
            ));
        }
    }
    Ok(())
}

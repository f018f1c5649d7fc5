//! Semantic lint rules.

use std::collections::BTreeMap;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::ast::AstValue;
use pdxlint_core::diagnostics::{
    Diagnostic, LINT_SEMANTIC_INCONSISTENT_SHAPE, LINT_SEMANTIC_MISSING_REQUIRED_FIELD,
};

use crate::lint::{LintConfidence, LintDomain, LintRule};
use crate::typecheck::TypecheckFacts;
use crate::typecheck::support::find_key_range;

/// Mirrors the type-check shape finding as a normalization suggestion.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticInconsistentShapeRule;

impl LintRule for SemanticInconsistentShapeRule {
    fn code(&self) -> &str {
        LINT_SEMANTIC_INCONSISTENT_SHAPE.code
    }

    fn name(&self) -> &str {
        "semanticInconsistentShape"
    }

    fn category(&self) -> &str {
        "semantic"
    }

    fn domain(&self) -> LintDomain {
        LintDomain::Semantic
    }

    fn confidence(&self) -> LintConfidence {
        LintConfidence::Heuristic
    }

    fn run(
        &self,
        _facts: &AnalysisFacts,
        type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for key in type_facts.inconsistent_top_level_shapes.keys() {
            diagnostics.push(
                LINT_SEMANTIC_INCONSISTENT_SHAPE
                    .with_message(
                        format!(
                            "{} Key `{key}` should use one shape.",
                            LINT_SEMANTIC_INCONSISTENT_SHAPE.message
                        ),
                        find_key_range(text, key),
                    )
                    .with_hint("Move alternative shapes under explicit nested keys."),
            );
        }
        diagnostics
    }
}

/// Enforces an injected required-field map on object-like top-level blocks.
#[derive(Debug, Clone, Default)]
pub struct SemanticMissingRequiredFieldRule {
    pub required_fields_by_object: BTreeMap<String, Vec<String>>,
}

impl LintRule for SemanticMissingRequiredFieldRule {
    fn code(&self) -> &str {
        LINT_SEMANTIC_MISSING_REQUIRED_FIELD.code
    }

    fn name(&self) -> &str {
        "semanticMissingRequiredField"
    }

    fn category(&self) -> &str {
        "semantic"
    }

    fn domain(&self) -> LintDomain {
        LintDomain::Semantic
    }

    fn confidence(&self) -> LintConfidence {
        LintConfidence::Policy
    }

    fn run(
        &self,
        facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (key, values) in &facts.top_level_values {
            let Some(required_fields) = self.required_fields_by_object.get(key) else {
                continue;
            };
            for value in values {
                let Some(AstValue::Block(block)) = value else {
                    continue;
                };
                let Some(object) = block.to_object() else {
                    continue;
                };
                for required_field in required_fields {
                    if object.contains_key(required_field) {
                        continue;
                    }
                    diagnostics.push(
                        LINT_SEMANTIC_MISSING_REQUIRED_FIELD
                            .with_message(
                                format!(
                                    "{} Object `{key}` is missing `{required_field}`.",
                                    LINT_SEMANTIC_MISSING_REQUIRED_FIELD.message
                                ),
                                find_key_range(text, key),
                            )
                            .with_hint(format!("Add `{required_field} = ...` to `{key}`.")),
                    );
                }
            }
        }

        diagnostics
    }
}

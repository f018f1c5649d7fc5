//! Style lint rules.

use once_cell::sync::Lazy;
use regex::Regex;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{Diagnostic, LINT_STYLE_SINGLE_LINE_BLOCK};
use pdxlint_core::text::{TextRange, TextSize};

use crate::lint::{LintConfidence, LintDomain, LintRule};
use crate::typecheck::TypecheckFacts;

static SINGLE_LINE_BLOCK_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{[^\n{}]*\s+[^\n{}]*\}").expect("single-line block pattern"));

/// Flags `{ ... }` blocks carrying multiple values on one line.
#[derive(Debug, Clone, Copy, Default)]
pub struct StyleSingleLineMultiValueBlockRule;

impl LintRule for StyleSingleLineMultiValueBlockRule {
    fn code(&self) -> &str {
        LINT_STYLE_SINGLE_LINE_BLOCK.code
    }

    fn name(&self) -> &str {
        "styleSingleLineMultiValueBlock"
    }

    fn category(&self) -> &str {
        "style"
    }

    fn domain(&self) -> LintDomain {
        LintDomain::Style
    }

    fn confidence(&self) -> LintConfidence {
        LintConfidence::Policy
    }

    fn run(
        &self,
        _facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        SINGLE_LINE_BLOCK_PATTERN
            .find_iter(text)
            .map(|found| {
                LINT_STYLE_SINGLE_LINE_BLOCK
                    .diagnostic(TextRange::new(
                        TextSize::from(found.start() as u32),
                        TextSize::from(found.end() as u32),
                    ))
                    .with_hint("Use multiline layout inside braces when multiple values are present.")
            })
            .collect()
    }
}

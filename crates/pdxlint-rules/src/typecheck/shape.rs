//! Flags top-level keys whose values switch between shapes.

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{Diagnostic, TYPECHECK_INCONSISTENT_VALUE_SHAPE};

use crate::typecheck::support::find_key_range;
use crate::typecheck::{TypecheckFacts, TypecheckRule};

/// Flags keys that mix scalar/block/tagged forms at the top level.
#[derive(Debug, Clone, Copy, Default)]
pub struct InconsistentTopLevelShapeRule;

impl TypecheckRule for InconsistentTopLevelShapeRule {
    fn code(&self) -> &str {
        TYPECHECK_INCONSISTENT_VALUE_SHAPE.code
    }

    fn name(&self) -> &str {
        "inconsistentTopLevelShape"
    }

    fn run(
        &self,
        _facts: &AnalysisFacts,
        type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();
        for (key, shapes) in &type_facts.inconsistent_top_level_shapes {
            diagnostics.push(
                TYPECHECK_INCONSISTENT_VALUE_SHAPE
                    .with_message(
                        format!(
                            "{} Key `{key}` uses {}.",
                            TYPECHECK_INCONSISTENT_VALUE_SHAPE.message,
                            shapes.join(", ")
                        ),
                        find_key_range(text, key),
                    )
                    .with_hint(
                        "Keep a stable value shape per key or split the key into explicit variants.",
                    ),
            );
        }
        diagnostics
    }
}

//! Scope-context enforcement for fields with `required_scope` constraints.

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{
    Diagnostic, TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT, TYPECHECK_INVALID_SCOPE_CONTEXT,
};

use crate::schema::{FieldScopeConstraintsByObject, SubtypeMatchersByObject};
use crate::scope::{AliasResolution, ScopeContext};
use crate::typecheck::support::{
    find_key_occurrence_range, matched_subtypes, object_occurrences, subtype_push_scopes,
};
use crate::typecheck::{TypecheckFacts, TypecheckRule};

/// Walks each object occurrence maintaining a virtual scope stack and
/// reports fields that appear outside their required scope.
///
/// Contexts are built per occurrence from that object's own constraint
/// map, so `push_scope` never leaks across sibling branches or adjacent
/// top-level objects.
#[derive(Debug, Clone, Default)]
pub struct FieldScopeContextRule {
    pub field_scope_constraints_by_object: FieldScopeConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
}

impl TypecheckRule for FieldScopeContextRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_SCOPE_CONTEXT.code
    }

    fn name(&self) -> &str {
        "fieldScopeContext"
    }

    fn run(
        &self,
        facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (object_key, constraint_map) in &self.field_scope_constraints_by_object {
            for occurrence in object_occurrences(facts, object_key) {
                let matched = matched_subtypes(
                    self.subtype_matchers_by_object
                        .get(object_key)
                        .map(Vec::as_slice),
                    object_key,
                    &occurrence.immediate,
                );
                let root_push = subtype_push_scopes(&matched);

                for (path, constraint) in constraint_map {
                    if constraint.required_scope.is_empty() {
                        continue;
                    }
                    for fact in occurrence
                        .all
                        .iter()
                        .filter(|fact| fact.path[1..] == path[..])
                    {
                        let context =
                            ScopeContext::build(Some(constraint_map), path, &root_push);
                        let range =
                            find_key_occurrence_range(text, object_key, occurrence.occurrence);

                        if context.has_ambiguous_replacement() {
                            diagnostics.push(TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT.with_message(
                                format!(
                                    "{} `{object_key}.{}` sits in an ambiguous context.",
                                    TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT.message, fact.field_key
                                ),
                                range,
                            ));
                            continue;
                        }

                        let satisfied = match context.current() {
                            AliasResolution::Scope(scope) => {
                                constraint.required_scope.iter().any(|required| {
                                    required == &scope || required == "any"
                                })
                            }
                            _ => false,
                        };
                        if !satisfied {
                            diagnostics.push(
                                TYPECHECK_INVALID_SCOPE_CONTEXT
                                    .with_message(
                                        format!(
                                            "{} `{object_key}.{}` requires scope {}.",
                                            TYPECHECK_INVALID_SCOPE_CONTEXT.message,
                                            fact.field_key,
                                            constraint.required_scope.join(", ")
                                        ),
                                        range,
                                    )
                                    .with_hint(
                                        "Enter the required scope before using this field.",
                                    ),
                            );
                        }
                    }
                }
            }
        }

        diagnostics
    }
}

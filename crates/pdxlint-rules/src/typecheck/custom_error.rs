//! Custom-error constraints: `error_if_only_match` markers.

use std::sync::Arc;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{Diagnostic, TYPECHECK_RULE_CUSTOM_ERROR};

use crate::assets::{AssetRegistry, NullAssetRegistry};
use crate::schema::{
    FieldConstraintsByObject, SubtypeFieldConstraintsByObject, SubtypeMatchersByObject,
};
use crate::services::{TypecheckPolicy, TypecheckServices};
use crate::typecheck::field_constraint::matches_field_constraint;
use crate::typecheck::support::{
    effective_constraints, find_key_occurrence_range, matched_subtypes, object_occurrences,
};
use crate::typecheck::{TypecheckFacts, TypecheckRule};

/// Emits the schema's custom error when a comparison field's value matches
/// a constraint flagged with `error_if_only_match`.
#[derive(Debug, Clone)]
pub struct ErrorIfOnlyMatchRule {
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub asset_registry: Arc<dyn AssetRegistry>,
    pub policy: TypecheckPolicy,
}

impl Default for ErrorIfOnlyMatchRule {
    fn default() -> Self {
        Self {
            field_constraints_by_object: FieldConstraintsByObject::default(),
            subtype_matchers_by_object: SubtypeMatchersByObject::default(),
            subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject::default(),
            asset_registry: Arc::new(NullAssetRegistry),
            policy: TypecheckPolicy::default(),
        }
    }
}

impl TypecheckRule for ErrorIfOnlyMatchRule {
    fn code(&self) -> &str {
        TYPECHECK_RULE_CUSTOM_ERROR.code
    }

    fn name(&self) -> &str {
        "errorIfOnlyMatch"
    }

    fn run(
        &self,
        facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (object_key, base_constraints) in &self.field_constraints_by_object {
            for occurrence in object_occurrences(facts, object_key) {
                let matched = matched_subtypes(
                    self.subtype_matchers_by_object
                        .get(object_key)
                        .map(Vec::as_slice),
                    object_key,
                    &occurrence.immediate,
                );
                let constraints = effective_constraints(
                    base_constraints,
                    Some(&self.subtype_field_constraints_by_object),
                    object_key,
                    &matched,
                );

                for fact in &occurrence.all {
                    let Some(constraint) = constraints.get(&fact.field_key) else {
                        continue;
                    };
                    let Some(marker) = constraint.error_if_only_match.as_deref() else {
                        continue;
                    };
                    if !constraint.comparison {
                        continue;
                    }
                    if !matches_field_constraint(
                        fact.value.as_ref(),
                        constraint,
                        self.asset_registry.as_ref(),
                        &self.policy,
                    ) {
                        continue;
                    }

                    diagnostics.push(TYPECHECK_RULE_CUSTOM_ERROR.with_message(
                        format!(
                            "{} `{object_key}.{}`: {marker}.",
                            TYPECHECK_RULE_CUSTOM_ERROR.message, fact.field_key
                        ),
                        find_key_occurrence_range(text, object_key, occurrence.occurrence),
                    ));
                }
            }
        }

        diagnostics
    }

    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let mut rebound = self.clone();
        rebound.asset_registry = services.asset_registry.clone();
        rebound.policy = services.policy;
        Some(Arc::new(rebound))
    }
}

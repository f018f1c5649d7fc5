//! Reference-constraint checking: enum, type, value-set, alias-family,
//! single-alias, and scope references.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use pdxlint_core::analysis::{AnalysisFacts, FieldFact};
use pdxlint_core::diagnostics::{
    Diagnostic, TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT, TYPECHECK_INVALID_FIELD_REFERENCE,
};

use crate::schema::{
    FieldConstraintsByObject, FieldScopeConstraintsByObject, LinkDefinition, MembershipsByKey,
    RuleValueSpec, RuleValueSpecKind, SubtypeFieldConstraintsByObject, SubtypeMatchersByObject,
};
use crate::scope::{ChainResolution, ScopeChainResolver, ScopeContext};
use crate::services::{TypecheckPolicy, TypecheckServices, UnresolvedPolicy};
use crate::typecheck::field_constraint::format_value_specs;
use crate::typecheck::support::{
    effective_constraints, find_key_occurrence_range, matched_subtypes, object_occurrences,
    scalar_of, strip_scalar_quotes, subtype_push_scopes,
};
use crate::typecheck::{TypecheckFacts, TypecheckRule};

/// Validates reference-shaped value specs against injected memberships.
///
/// Constraints match nested fields by field name; scope references resolve
/// through the occurrence's scope context and link chains. Unresolved
/// references follow the policy; known mismatches always report.
#[derive(Debug, Clone, Default)]
pub struct FieldReferenceConstraintRule {
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub field_scope_constraints_by_object: FieldScopeConstraintsByObject,
    pub enum_values_by_key: MembershipsByKey,
    pub type_memberships_by_key: MembershipsByKey,
    pub value_memberships_by_key: MembershipsByKey,
    pub alias_memberships_by_family: MembershipsByKey,
    pub link_definitions_by_name: BTreeMap<String, LinkDefinition>,
    pub known_scopes: BTreeSet<String>,
    pub known_type_keys: BTreeSet<String>,
    pub policy: TypecheckPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SpecOutcome {
    Match,
    NoMatch,
    Unresolved,
    Ambiguous,
}

impl TypecheckRule for FieldReferenceConstraintRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_FIELD_REFERENCE.code
    }

    fn name(&self) -> &str {
        "fieldReferenceConstraint"
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
                let root_push = subtype_push_scopes(&matched);

                for fact in &occurrence.all {
                    let Some(constraint) = constraints.get(&fact.field_key) else {
                        continue;
                    };
                    let ref_specs: Vec<&RuleValueSpec> = constraint
                        .value_specs
                        .iter()
                        .filter(|spec| is_reference_spec(spec.kind))
                        .collect();
                    if ref_specs.is_empty() {
                        continue;
                    }

                    let outcomes: Vec<SpecOutcome> = ref_specs
                        .iter()
                        .map(|spec| self.evaluate_spec(spec, object_key, fact, &root_push))
                        .collect();

                    if outcomes.contains(&SpecOutcome::Match) {
                        continue;
                    }
                    let range =
                        find_key_occurrence_range(text, object_key, occurrence.occurrence);
                    if outcomes.contains(&SpecOutcome::Ambiguous) {
                        diagnostics.push(TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT.with_message(
                            format!(
                                "{} `{object_key}.{}` cannot be resolved unambiguously.",
                                TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT.message, fact.field_key
                            ),
                            range,
                        ));
                        continue;
                    }
                    let definite_mismatch = outcomes.contains(&SpecOutcome::NoMatch);
                    if definite_mismatch
                        || self.policy.unresolved_reference == UnresolvedPolicy::Error
                    {
                        diagnostics.push(
                            TYPECHECK_INVALID_FIELD_REFERENCE
                                .with_message(
                                    format!(
                                        "{} `{object_key}.{}` does not match {}.",
                                        TYPECHECK_INVALID_FIELD_REFERENCE.message,
                                        fact.field_key,
                                        format_value_specs(&constraint.value_specs)
                                    ),
                                    range,
                                )
                                .with_hint(format!(
                                    "Use a known reference for `{}`.",
                                    fact.field_key
                                )),
                        );
                    }
                }
            }
        }

        diagnostics
    }

    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let mut rebound = self.clone();
        rebound.policy = services.policy;
        if rebound.enum_values_by_key.is_empty() {
            rebound.enum_values_by_key = services.enum_memberships_by_key.clone();
        }
        if rebound.type_memberships_by_key.is_empty() {
            rebound.type_memberships_by_key = services.type_memberships_by_key.clone();
        }
        if rebound.value_memberships_by_key.is_empty() {
            rebound.value_memberships_by_key = services.value_memberships_by_key.clone();
        }
        if rebound.alias_memberships_by_family.is_empty() {
            rebound.alias_memberships_by_family = services.alias_memberships_by_family.clone();
        }
        if rebound.link_definitions_by_name.is_empty() {
            rebound.link_definitions_by_name = services.link_definitions_by_name.clone();
        }
        if rebound.known_scopes.is_empty() {
            rebound.known_scopes = services.known_scopes.clone();
        }
        if rebound.known_type_keys.is_empty() {
            rebound.known_type_keys = services.known_type_keys.clone();
        }
        Some(Arc::new(rebound))
    }
}

impl FieldReferenceConstraintRule {
    fn evaluate_spec(
        &self,
        spec: &RuleValueSpec,
        object_key: &str,
        fact: &FieldFact,
        root_push: &[String],
    ) -> SpecOutcome {
        let Some(scalar) = scalar_of(fact.value.as_ref()) else {
            return SpecOutcome::NoMatch;
        };
        let value_text = strip_scalar_quotes(&scalar.raw_text);

        match spec.kind {
            RuleValueSpecKind::EnumRef => {
                membership_outcome(&self.enum_values_by_key, spec.argument.as_deref(), value_text)
            }
            RuleValueSpecKind::ValueRef => membership_outcome(
                &self.value_memberships_by_key,
                spec.argument.as_deref(),
                value_text,
            ),
            // The definition side of a value set accepts any scalar.
            RuleValueSpecKind::ValueSetRef => SpecOutcome::Match,
            RuleValueSpecKind::AliasMatchLeftRef => membership_outcome(
                &self.alias_memberships_by_family,
                spec.argument.as_deref(),
                value_text,
            ),
            RuleValueSpecKind::SingleAliasRef => SpecOutcome::Unresolved,
            RuleValueSpecKind::TypeRef => self.evaluate_type_ref(spec, value_text),
            RuleValueSpecKind::ScopeRef => {
                self.evaluate_scope_ref(spec, object_key, fact, root_push, value_text)
            }
            _ => SpecOutcome::Unresolved,
        }
    }

    fn evaluate_type_ref(&self, spec: &RuleValueSpec, value_text: &str) -> SpecOutcome {
        let Some(type_key) = spec.argument.as_deref() else {
            return SpecOutcome::Unresolved;
        };
        let Some(members) = self.type_memberships_by_key.get(type_key) else {
            return SpecOutcome::Unresolved;
        };

        // `pre_<type>_suf` wrapping from the spec's raw form.
        let (prefix, suffix) = type_ref_wrapping(&spec.raw);
        let Some(candidate) = value_text
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(suffix))
        else {
            return SpecOutcome::NoMatch;
        };

        if members.contains(candidate) {
            SpecOutcome::Match
        } else {
            SpecOutcome::NoMatch
        }
    }

    fn evaluate_scope_ref(
        &self,
        spec: &RuleValueSpec,
        object_key: &str,
        fact: &FieldFact,
        root_push: &[String],
        value_text: &str,
    ) -> SpecOutcome {
        let Some(target) = spec.argument.as_deref() else {
            return SpecOutcome::Unresolved;
        };

        let relative_path: Vec<String> = fact.path[1..].to_vec();
        let context = ScopeContext::build(
            self.field_scope_constraints_by_object.get(object_key),
            &relative_path,
            root_push,
        );
        let resolver = ScopeChainResolver {
            context: &context,
            known_scopes: &self.known_scopes,
            link_definitions: &self.link_definitions_by_name,
            value_memberships: &self.value_memberships_by_key,
        };

        match resolver.resolve(value_text) {
            ChainResolution::Scope(scope) => {
                if target == "any" || scope == target {
                    SpecOutcome::Match
                } else {
                    SpecOutcome::NoMatch
                }
            }
            ChainResolution::Ambiguous => SpecOutcome::Ambiguous,
            ChainResolution::Unresolved => SpecOutcome::Unresolved,
            ChainResolution::Mismatch => SpecOutcome::NoMatch,
        }
    }
}

fn is_reference_spec(kind: RuleValueSpecKind) -> bool {
    matches!(
        kind,
        RuleValueSpecKind::EnumRef
            | RuleValueSpecKind::TypeRef
            | RuleValueSpecKind::ValueRef
            | RuleValueSpecKind::ValueSetRef
            | RuleValueSpecKind::ScopeRef
            | RuleValueSpecKind::AliasMatchLeftRef
            | RuleValueSpecKind::SingleAliasRef
    )
}

fn membership_outcome(
    memberships: &MembershipsByKey,
    key: Option<&str>,
    value_text: &str,
) -> SpecOutcome {
    let Some(key) = key else {
        return SpecOutcome::Unresolved;
    };
    let Some(members) = memberships.get(key) else {
        return SpecOutcome::Unresolved;
    };
    if members.contains(value_text) {
        SpecOutcome::Match
    } else {
        SpecOutcome::NoMatch
    }
}

/// Prefix and suffix around `<...>` in a type-ref raw form.
fn type_ref_wrapping(raw: &str) -> (&str, &str) {
    let Some(open) = raw.find('<') else {
        return ("", "");
    };
    let Some(close) = raw.rfind('>') else {
        return ("", "");
    };
    if close < open {
        return ("", "");
    }
    (&raw[..open], &raw[close + 1..])
}

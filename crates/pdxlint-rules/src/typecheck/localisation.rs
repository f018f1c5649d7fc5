//! Localisation-aware rules: command scopes, key existence, and per-type
//! key requirements.

use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{Diagnostic, TYPECHECK_INVALID_FIELD_REFERENCE};
use pdxlint_core::text::{TextRange, TextSize};

use crate::localisation::LocalisationKeyProvider;
use crate::schema::{
    FieldConstraintsByObject, FieldScopeConstraintsByObject, LocalisationCommandDefinition,
    MembershipsByKey, RuleFieldConstraint, SubtypeFieldConstraintsByObject,
    SubtypeMatchersByObject, TypeLocalisationTemplate,
};
use crate::scope::{AliasResolution, ScopeContext};
use crate::services::{LocalisationCoverage, TypecheckPolicy, TypecheckServices, UnresolvedPolicy};
use crate::typecheck::support::{
    effective_constraints, find_key_occurrence_range, matched_subtypes, object_occurrences,
    scalar_of, strip_scalar_quotes, subtype_push_scopes,
};
use crate::typecheck::{TypecheckFacts, TypecheckRule};

static LOCALISATION_COMMAND_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[([^\[\]]+)\]").expect("localisation command pattern"));

const LOCALISATION_PRIMITIVES: &[&str] =
    &["localisation", "localisation_synced", "localisation_inline"];

fn is_localisation_constraint(constraint: &RuleFieldConstraint) -> bool {
    constraint.value_specs.iter().any(|spec| {
        spec.primitive
            .as_deref()
            .is_some_and(|primitive| LOCALISATION_PRIMITIVES.contains(&primitive))
    })
}

/// Validates `[Scope.Command]` references inside localisation-valued fields
/// against command scope sets.
#[derive(Debug, Clone, Default)]
pub struct LocalisationCommandScopeRule {
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub field_scope_constraints_by_object: FieldScopeConstraintsByObject,
    pub localisation_command_definitions_by_name:
        BTreeMap<String, LocalisationCommandDefinition>,
    pub policy: TypecheckPolicy,
}

impl TypecheckRule for LocalisationCommandScopeRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_FIELD_REFERENCE.code
    }

    fn name(&self) -> &str {
        "localisationCommandScope"
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
                    if !is_localisation_constraint(constraint) {
                        continue;
                    }
                    let Some(scalar) = scalar_of(fact.value.as_ref()) else {
                        continue;
                    };

                    let relative_path: Vec<String> = fact.path[1..].to_vec();
                    let context = ScopeContext::build(
                        self.field_scope_constraints_by_object.get(object_key),
                        &relative_path,
                        &root_push,
                    );

                    for captures in
                        LOCALISATION_COMMAND_PATTERN.captures_iter(&scalar.raw_text)
                    {
                        let Some(command_text) = captures.get(1) else {
                            continue;
                        };
                        if let Some(diagnostic) = self.check_command(
                            command_text.as_str(),
                            &context,
                            object_key,
                            &fact.field_key,
                            find_key_occurrence_range(text, object_key, occurrence.occurrence),
                        ) {
                            diagnostics.push(diagnostic);
                        }
                    }
                }
            }
        }

        diagnostics
    }

    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let mut rebound = self.clone();
        rebound.policy = services.policy;
        if rebound.localisation_command_definitions_by_name.is_empty() {
            rebound.localisation_command_definitions_by_name =
                services.localisation_command_definitions_by_name.clone();
        }
        Some(Arc::new(rebound))
    }
}

impl LocalisationCommandScopeRule {
    fn check_command(
        &self,
        command_text: &str,
        context: &ScopeContext,
        object_key: &str,
        field_key: &str,
        range: TextRange,
    ) -> Option<Diagnostic> {
        let segments: Vec<&str> = command_text.split('.').map(str::trim).collect();
        let command_name = segments.last()?.split_whitespace().next()?;
        let alias = if segments.len() >= 2 {
            segments[0]
        } else {
            "this"
        };

        let Some(definition) = self
            .localisation_command_definitions_by_name
            .get(command_name)
        else {
            return self.unresolved(object_key, field_key, command_name, range);
        };

        let scope = match context.resolve_alias(alias) {
            AliasResolution::Scope(scope) => scope,
            _ => return self.unresolved(object_key, field_key, command_name, range),
        };

        let supported = definition
            .supported_scopes
            .iter()
            .any(|supported| supported == "any" || supported == &scope);
        if supported {
            return None;
        }

        Some(
            TYPECHECK_INVALID_FIELD_REFERENCE.with_message(
                format!(
                    "{} Localisation command `{command_name}` in `{object_key}.{field_key}` does not support scope `{scope}`.",
                    TYPECHECK_INVALID_FIELD_REFERENCE.message
                ),
                range,
            ),
        )
    }

    fn unresolved(
        &self,
        object_key: &str,
        field_key: &str,
        command_name: &str,
        range: TextRange,
    ) -> Option<Diagnostic> {
        if self.policy.unresolved_reference == UnresolvedPolicy::Defer {
            return None;
        }
        Some(
            TYPECHECK_INVALID_FIELD_REFERENCE.with_message(
                format!(
                    "{} Unknown localisation command `{command_name}` in `{object_key}.{field_key}`.",
                    TYPECHECK_INVALID_FIELD_REFERENCE.message
                ),
                range,
            ),
        )
    }
}

/// Reports localisation keys that do not exist (or lack locale coverage).
#[derive(Debug, Clone)]
pub struct LocalisationKeyExistenceRule {
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub localisation_key_provider: Arc<LocalisationKeyProvider>,
    pub policy: TypecheckPolicy,
}

impl Default for LocalisationKeyExistenceRule {
    fn default() -> Self {
        Self {
            field_constraints_by_object: FieldConstraintsByObject::default(),
            subtype_matchers_by_object: SubtypeMatchersByObject::default(),
            subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject::default(),
            localisation_key_provider: Arc::new(LocalisationKeyProvider::new()),
            policy: TypecheckPolicy::default(),
        }
    }
}

impl TypecheckRule for LocalisationKeyExistenceRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_FIELD_REFERENCE.code
    }

    fn name(&self) -> &str {
        "localisationKeyExistence"
    }

    fn run(
        &self,
        facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        text: &str,
    ) -> Vec<Diagnostic> {
        // No key index loaded: defer unless the policy demands otherwise.
        if self.localisation_key_provider.is_empty()
            && self.policy.unresolved_reference == UnresolvedPolicy::Defer
        {
            return Vec::new();
        }

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
                    if !is_localisation_constraint(constraint) {
                        continue;
                    }
                    let Some(scalar) = scalar_of(fact.value.as_ref()) else {
                        continue;
                    };
                    let key = strip_scalar_quotes(&scalar.raw_text);
                    // Command-bearing values are the command rule's concern.
                    if key.is_empty() || key.contains('[') {
                        continue;
                    }

                    let range =
                        find_key_occurrence_range(text, object_key, occurrence.occurrence);
                    if !self.localisation_key_provider.has_key(key) {
                        diagnostics.push(TYPECHECK_INVALID_FIELD_REFERENCE.with_message(
                            format!(
                                "{} Unknown localisation key `{key}`.",
                                TYPECHECK_INVALID_FIELD_REFERENCE.message
                            ),
                            range,
                        ));
                        continue;
                    }

                    if self.policy.localisation_coverage == LocalisationCoverage::All {
                        let missing = self
                            .localisation_key_provider
                            .missing_locales_for_key(key, None);
                        if !missing.is_empty() {
                            diagnostics.push(TYPECHECK_INVALID_FIELD_REFERENCE.with_message(
                                format!(
                                    "{} Localisation key `{key}` is missing locales: {}.",
                                    TYPECHECK_INVALID_FIELD_REFERENCE.message,
                                    missing.join(", ")
                                ),
                                range,
                            ));
                        }
                    }
                }
            }
        }

        diagnostics
    }

    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let mut rebound = self.clone();
        rebound.policy = services.policy;
        if rebound.localisation_key_provider.is_empty() {
            rebound.localisation_key_provider = services.localisation_key_provider.clone();
        }
        Some(Arc::new(rebound))
    }
}

/// Enforces `$`-template localisation coverage for every member of a type.
#[derive(Debug, Clone)]
pub struct TypeLocalisationRequirementRule {
    pub type_memberships_by_key: MembershipsByKey,
    pub type_localisation_templates_by_type: BTreeMap<String, Vec<TypeLocalisationTemplate>>,
    pub localisation_key_provider: Arc<LocalisationKeyProvider>,
    pub policy: TypecheckPolicy,
}

impl Default for TypeLocalisationRequirementRule {
    fn default() -> Self {
        Self {
            type_memberships_by_key: MembershipsByKey::default(),
            type_localisation_templates_by_type: BTreeMap::new(),
            localisation_key_provider: Arc::new(LocalisationKeyProvider::new()),
            policy: TypecheckPolicy::default(),
        }
    }
}

impl TypecheckRule for TypeLocalisationRequirementRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_FIELD_REFERENCE.code
    }

    fn name(&self) -> &str {
        "typeLocalisationRequirement"
    }

    fn run(
        &self,
        _facts: &AnalysisFacts,
        _type_facts: &TypecheckFacts,
        _text: &str,
    ) -> Vec<Diagnostic> {
        if self.localisation_key_provider.is_empty() {
            return Vec::new();
        }

        let mut diagnostics = Vec::new();
        // Type members are project-wide; diagnostics anchor at the file start.
        let range = TextRange::empty(TextSize::from(0));

        for (type_key, templates) in &self.type_localisation_templates_by_type {
            let Some(members) = self.type_memberships_by_key.get(type_key) else {
                continue;
            };
            for member in members {
                for template in templates {
                    if !template.required {
                        continue;
                    }
                    let key = template.expand(member);
                    let missing_entirely = !self.localisation_key_provider.has_key(&key);
                    let missing_coverage = self.policy.localisation_coverage
                        == LocalisationCoverage::All
                        && !self
                            .localisation_key_provider
                            .missing_locales_for_key(&key, None)
                            .is_empty();
                    if missing_entirely || missing_coverage {
                        diagnostics.push(TYPECHECK_INVALID_FIELD_REFERENCE.with_message(
                            format!(
                                "{} Missing required localisation key `{key}` for `{type_key}` member `{member}`.",
                                TYPECHECK_INVALID_FIELD_REFERENCE.message
                            ),
                            range,
                        ));
                    }
                }
            }
        }

        diagnostics
    }

    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let mut rebound = self.clone();
        rebound.policy = services.policy;
        if rebound.type_memberships_by_key.is_empty() {
            rebound.type_memberships_by_key = services.type_memberships_by_key.clone();
        }
        if rebound.localisation_key_provider.is_empty() {
            rebound.localisation_key_provider = services.localisation_key_provider.clone();
        }
        Some(Arc::new(rebound))
    }
}

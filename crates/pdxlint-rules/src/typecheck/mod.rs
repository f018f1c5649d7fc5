//! Type-check rules: domain `correctness`, confidence `sound`, code prefix
//! `TYPECHECK_`.

mod custom_error;
mod field_constraint;
mod field_reference;
mod localisation;
mod scope_context;
mod shape;
pub(crate) mod support;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

pub use custom_error::ErrorIfOnlyMatchRule;
pub use field_constraint::FieldConstraintRule;
pub use field_reference::FieldReferenceConstraintRule;
pub use localisation::{
    LocalisationCommandScopeRule, LocalisationKeyExistenceRule, TypeLocalisationRequirementRule,
};
pub use scope_context::FieldScopeContextRule;
pub use shape::InconsistentTopLevelShapeRule;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::Diagnostic;

use crate::error::EngineError;
use crate::services::TypecheckServices;

/// Domain of a type-check rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypecheckDomain {
    #[default]
    Correctness,
}

impl fmt::Display for TypecheckDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "correctness")
    }
}

/// Confidence of a type-check rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypecheckConfidence {
    #[default]
    Sound,
}

impl fmt::Display for TypecheckConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sound")
    }
}

/// Facts the type-check pass derives from the shared analysis facts. Lint
/// rules may consume them afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypecheckFacts {
    /// Top-level keys whose values take more than one shape, with the shape
    /// names they take (sorted).
    pub inconsistent_top_level_shapes: BTreeMap<String, Vec<String>>,
}

/// Build type-check facts from the shared analysis facts.
pub fn build_typecheck_facts(facts: &AnalysisFacts) -> TypecheckFacts {
    let mut inconsistent = BTreeMap::new();
    for (key, shapes) in &facts.top_level_shapes {
        if shapes.len() > 1 {
            let mut names: Vec<String> = shapes.iter().map(|shape| shape.to_string()).collect();
            names.sort();
            inconsistent.insert(key.clone(), names);
        }
    }
    TypecheckFacts {
        inconsistent_top_level_shapes: inconsistent,
    }
}

/// Contract for one type-check rule.
///
/// `run` must be pure with respect to its inputs and the services the rule
/// was constructed with.
pub trait TypecheckRule {
    fn code(&self) -> &str;
    fn name(&self) -> &str;

    fn domain(&self) -> TypecheckDomain {
        TypecheckDomain::Correctness
    }

    fn confidence(&self) -> TypecheckConfidence {
        TypecheckConfidence::Sound
    }

    fn run(&self, facts: &AnalysisFacts, type_facts: &TypecheckFacts, text: &str)
    -> Vec<Diagnostic>;

    /// Rebind empty service-backed fields from `services`, returning a
    /// replacement rule. `None` keeps the rule as constructed. The runner
    /// calls this when both explicit rules and services are supplied.
    fn rebind(&self, services: &TypecheckServices) -> Option<Arc<dyn TypecheckRule>> {
        let _ = services;
        None
    }
}

/// The built-in rule set, wired from `services` by explicit struct update
/// and sorted by `(code, name)` for stable diagnostic output.
pub fn default_typecheck_rules(services: &TypecheckServices) -> Vec<Arc<dyn TypecheckRule>> {
    let mut rules: Vec<Arc<dyn TypecheckRule>> = vec![
        Arc::new(InconsistentTopLevelShapeRule::default()),
        Arc::new(FieldConstraintRule {
            field_constraints_by_object: services.field_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
            subtype_field_constraints_by_object: services
                .subtype_field_constraints_by_object
                .clone(),
            asset_registry: services.asset_registry.clone(),
            policy: services.policy,
        }),
        Arc::new(FieldReferenceConstraintRule {
            field_constraints_by_object: services.field_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
            subtype_field_constraints_by_object: services
                .subtype_field_constraints_by_object
                .clone(),
            field_scope_constraints_by_object: services.field_scope_constraints_by_object.clone(),
            enum_values_by_key: services.enum_memberships_by_key.clone(),
            type_memberships_by_key: services.type_memberships_by_key.clone(),
            value_memberships_by_key: services.value_memberships_by_key.clone(),
            alias_memberships_by_family: services.alias_memberships_by_family.clone(),
            link_definitions_by_name: services.link_definitions_by_name.clone(),
            known_scopes: services.known_scopes.clone(),
            known_type_keys: services.known_type_keys.clone(),
            policy: services.policy,
        }),
        Arc::new(FieldScopeContextRule {
            field_scope_constraints_by_object: services.field_scope_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
        }),
        Arc::new(LocalisationCommandScopeRule {
            field_constraints_by_object: services.field_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
            subtype_field_constraints_by_object: services
                .subtype_field_constraints_by_object
                .clone(),
            field_scope_constraints_by_object: services.field_scope_constraints_by_object.clone(),
            localisation_command_definitions_by_name: services
                .localisation_command_definitions_by_name
                .clone(),
            policy: services.policy,
        }),
        Arc::new(LocalisationKeyExistenceRule {
            field_constraints_by_object: services.field_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
            subtype_field_constraints_by_object: services
                .subtype_field_constraints_by_object
                .clone(),
            localisation_key_provider: services.localisation_key_provider.clone(),
            policy: services.policy,
        }),
        Arc::new(TypeLocalisationRequirementRule {
            type_memberships_by_key: services.type_memberships_by_key.clone(),
            type_localisation_templates_by_type: services
                .type_localisation_templates_by_type
                .clone(),
            localisation_key_provider: services.localisation_key_provider.clone(),
            policy: services.policy,
        }),
        Arc::new(ErrorIfOnlyMatchRule {
            field_constraints_by_object: services.field_constraints_by_object.clone(),
            subtype_matchers_by_object: services.subtype_matchers_by_object.clone(),
            subtype_field_constraints_by_object: services
                .subtype_field_constraints_by_object
                .clone(),
            asset_registry: services.asset_registry.clone(),
            policy: services.policy,
        }),
    ];
    rules.sort_by(|a, b| {
        a.code()
            .cmp(b.code())
            .then_with(|| a.name().cmp(b.name()))
    });
    rules
}

/// Validate rules at registration time.
///
/// Domains and confidences are closed enums in this implementation, so the
/// only representable violation is a wrong code prefix.
pub fn validate_typecheck_rules(rules: &[Arc<dyn TypecheckRule>]) -> Result<(), EngineError> {
    for rule in rules {
        if !rule.code().starts_with("TYPECHECK_") {
            return Err(EngineError::invalid_typecheck_rule(
                rule.name(),
                format!("code `{}` must use the `TYPECHECK_` prefix", rule.code()),
            ));
        }
    }
    Ok(())
}

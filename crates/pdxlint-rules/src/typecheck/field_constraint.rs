//! Primitive field-constraint checking.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::ast::{AstScalar, AstValue, interpret_scalar};
use pdxlint_core::diagnostics::{Diagnostic, TYPECHECK_INVALID_FIELD_TYPE};

use crate::assets::{AssetLookupStatus, AssetRegistry, NullAssetRegistry};
use crate::schema::{
    FieldConstraintsByObject, RuleFieldConstraint, RuleValueSpec, RuleValueSpecKind,
    SubtypeFieldConstraintsByObject, SubtypeMatchersByObject,
};
use crate::services::{TypecheckPolicy, TypecheckServices, UnresolvedPolicy};
use crate::typecheck::support::{
    effective_constraints, find_key_occurrence_range, matched_subtypes, object_occurrences,
    strip_scalar_quotes,
};
use crate::typecheck::{TypecheckFacts, TypecheckRule};

static VARIABLE_REF_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_@][A-Za-z0-9_:@.\-]*$").expect("variable reference pattern")
});

/// Checks immediate field values against schema-derived primitive
/// constraints, with subtype gating per object occurrence.
#[derive(Debug, Clone)]
pub struct FieldConstraintRule {
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub asset_registry: Arc<dyn AssetRegistry>,
    pub policy: TypecheckPolicy,
}

impl Default for FieldConstraintRule {
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

impl TypecheckRule for FieldConstraintRule {
    fn code(&self) -> &str {
        TYPECHECK_INVALID_FIELD_TYPE.code
    }

    fn name(&self) -> &str {
        "fieldConstraint"
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

                for (field_name, constraint) in &constraints {
                    for fact in occurrence
                        .immediate
                        .iter()
                        .filter(|fact| fact.field_key == *field_name)
                    {
                        if matches_field_constraint(
                            fact.value.as_ref(),
                            constraint,
                            self.asset_registry.as_ref(),
                            &self.policy,
                        ) {
                            continue;
                        }
                        diagnostics.push(
                            TYPECHECK_INVALID_FIELD_TYPE
                                .with_message(
                                    format!(
                                        "{} `{object_key}.{field_name}` does not match {}.",
                                        TYPECHECK_INVALID_FIELD_TYPE.message,
                                        format_value_specs(&constraint.value_specs)
                                    ),
                                    find_key_occurrence_range(
                                        text,
                                        object_key,
                                        occurrence.occurrence,
                                    ),
                                )
                                .with_hint(format!(
                                    "Use a value matching the schema for `{field_name}`."
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
        rebound.asset_registry = services.asset_registry.clone();
        rebound.policy = services.policy;
        if rebound.subtype_matchers_by_object.is_empty() {
            rebound.subtype_matchers_by_object = services.subtype_matchers_by_object.clone();
        }
        if rebound.subtype_field_constraints_by_object.is_empty() {
            rebound.subtype_field_constraints_by_object =
                services.subtype_field_constraints_by_object.clone();
        }
        Some(Arc::new(rebound))
    }
}

/// Whether a value satisfies the constraint (any spec may match; an empty
/// spec list always matches).
pub(crate) fn matches_field_constraint(
    value: Option<&AstValue>,
    constraint: &RuleFieldConstraint,
    asset_registry: &dyn AssetRegistry,
    policy: &TypecheckPolicy,
) -> bool {
    if constraint.value_specs.is_empty() {
        return true;
    }
    constraint
        .value_specs
        .iter()
        .any(|spec| matches_value_spec(value, spec, asset_registry, policy))
}

fn matches_value_spec(
    value: Option<&AstValue>,
    spec: &RuleValueSpec,
    asset_registry: &dyn AssetRegistry,
    policy: &TypecheckPolicy,
) -> bool {
    match spec.kind {
        // Reference specs are the reference rule's business; treat them as
        // satisfied here so mixed constraints do not double-report.
        RuleValueSpecKind::Missing
        | RuleValueSpecKind::UnknownRef
        | RuleValueSpecKind::EnumRef
        | RuleValueSpecKind::ScopeRef
        | RuleValueSpecKind::ValueRef
        | RuleValueSpecKind::ValueSetRef
        | RuleValueSpecKind::TypeRef
        | RuleValueSpecKind::AliasMatchLeftRef
        | RuleValueSpecKind::SingleAliasRef
        | RuleValueSpecKind::Error => true,
        RuleValueSpecKind::Block => matches!(value, Some(AstValue::Block(_))),
        RuleValueSpecKind::TaggedBlock => matches!(value, Some(AstValue::Tagged(_))),
        RuleValueSpecKind::Primitive => {
            let Some(AstValue::Scalar(scalar)) = value else {
                return false;
            };
            let Some(primitive) = spec.primitive.as_deref() else {
                return true;
            };
            matches_primitive(
                scalar,
                primitive,
                spec.argument.as_deref(),
                asset_registry,
                policy,
            )
        }
    }
}

fn matches_primitive(
    value: &AstScalar,
    primitive: &str,
    argument: Option<&str>,
    asset_registry: &dyn AssetRegistry,
    policy: &TypecheckPolicy,
) -> bool {
    let parsed = interpret_scalar(&value.raw_text, value.was_quoted, false);
    let number_value = parsed.number_value;

    match primitive {
        "scalar" | "localisation" | "localisation_synced" | "localisation_inline" => true,
        "bool" => parsed.bool_value.is_some(),
        "int" => matches_numeric(number_value, argument, true),
        "float" => matches_numeric(number_value, argument, false),
        "date_field" => parsed.date_value.is_some(),
        "percentage_field" => {
            let raw = value.raw_text.trim();
            let Some(prefix) = raw.strip_suffix('%') else {
                return false;
            };
            interpret_scalar(prefix, value.was_quoted, false)
                .number_value
                .is_some()
        }
        "variable_field" | "value_field" => {
            matches_numeric_or_reference(&value.raw_text, number_value, argument, false)
        }
        "int_variable_field" | "int_value_field" => {
            matches_numeric_or_reference(&value.raw_text, number_value, argument, true)
        }
        "scope_field" => true,
        "filepath" | "icon" => matches_asset_primitive(
            &value.raw_text,
            primitive,
            argument,
            asset_registry,
            policy,
        ),
        _ => true,
    }
}

fn matches_numeric(
    number_value: Option<pdxlint_core::ast::NumberValue>,
    argument: Option<&str>,
    require_int: bool,
) -> bool {
    let Some(number) = number_value else {
        return false;
    };
    if require_int && !number.is_int() {
        return false;
    }
    match parse_range_argument(argument) {
        Some(bounds) => in_range(number.as_f64(), bounds),
        None => true,
    }
}

fn matches_numeric_or_reference(
    raw_text: &str,
    number_value: Option<pdxlint_core::ast::NumberValue>,
    argument: Option<&str>,
    require_int: bool,
) -> bool {
    if let Some(number) = number_value {
        if require_int && !number.is_int() {
            return false;
        }
        return match parse_range_argument(argument) {
            Some(bounds) => in_range(number.as_f64(), bounds),
            None => true,
        };
    }
    VARIABLE_REF_PATTERN.is_match(raw_text.trim())
}

fn matches_asset_primitive(
    raw_text: &str,
    primitive: &str,
    argument: Option<&str>,
    asset_registry: &dyn AssetRegistry,
    policy: &TypecheckPolicy,
) -> bool {
    let raw_value = strip_scalar_quotes(raw_text);
    if raw_value.is_empty() {
        return false;
    }

    let candidate = match primitive {
        "filepath" => build_filepath_candidate(raw_value, argument),
        "icon" => build_icon_candidate(raw_value, argument),
        _ => return true,
    };
    if candidate.is_empty() {
        return false;
    }

    let lookup = asset_registry.lookup(&candidate);
    match lookup.status {
        AssetLookupStatus::Found => true,
        AssetLookupStatus::Missing => false,
        AssetLookupStatus::Unknown => policy.unresolved_asset == UnresolvedPolicy::Defer,
    }
}

fn build_filepath_candidate(raw_value: &str, argument: Option<&str>) -> String {
    let Some(argument) = argument else {
        return raw_value.to_string();
    };
    let spec = argument.trim();
    if spec.is_empty() {
        return raw_value.to_string();
    }

    let (prefix, extension) = match spec.split_once(',') {
        Some((prefix, extension)) => (prefix.trim(), extension.trim()),
        None => (spec, ""),
    };
    format!("{prefix}{raw_value}{extension}")
}

fn build_icon_candidate(raw_value: &str, argument: Option<&str>) -> String {
    match argument {
        Some(argument) => {
            let prefix = argument.trim().trim_end_matches('/');
            if prefix.is_empty() {
                format!("{raw_value}.dds")
            } else {
                format!("{prefix}/{raw_value}.dds")
            }
        }
        None => format!("{raw_value}.dds"),
    }
}

fn parse_range_argument(argument: Option<&str>) -> Option<(Option<f64>, Option<f64>)> {
    let argument = argument?.trim().to_ascii_lowercase();
    let (minimum, maximum) = argument.split_once("..")?;
    Some((parse_range_bound(minimum)?, parse_range_bound(maximum)?))
}

fn parse_range_bound(raw: &str) -> Option<Option<f64>> {
    let raw = raw.trim();
    if raw == "inf" || raw == "-inf" {
        return Some(None);
    }
    raw.parse::<f64>().ok().map(Some)
}

fn in_range(value: f64, bounds: (Option<f64>, Option<f64>)) -> bool {
    let (minimum, maximum) = bounds;
    if minimum.is_some_and(|minimum| value < minimum) {
        return false;
    }
    if maximum.is_some_and(|maximum| value > maximum) {
        return false;
    }
    true
}

pub(crate) fn format_value_specs(specs: &[RuleValueSpec]) -> String {
    if specs.is_empty() {
        return "schema constraints".to_string();
    }
    specs
        .iter()
        .map(|spec| spec.raw.as_str())
        .collect::<Vec<_>>()
        .join(" | ")
}

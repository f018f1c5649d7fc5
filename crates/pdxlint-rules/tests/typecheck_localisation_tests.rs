//! Localisation rules: command scopes, key existence, coverage, templates,
//! and custom-error constraints.

use std::collections::BTreeMap;
use std::sync::Arc;

use pdxlint_rules::{
    ErrorIfOnlyMatchRule, LocalisationCommandDefinition, LocalisationCommandScopeRule,
    LocalisationCoverage, LocalisationKeyExistenceRule, LocalisationKeyProvider,
    RuleFieldConstraint, RuleFieldScopeConstraint, RuleValueSpec, SubtypeMatcher,
    TypeLocalisationRequirementRule, TypeLocalisationTemplate, TypecheckPolicy,
    TypecheckRunConfig, TypecheckRule, UnresolvedPolicy, run_typecheck,
};

fn localisation_constraint() -> RuleFieldConstraint {
    RuleFieldConstraint::new(
        false,
        vec![RuleValueSpec::primitive("localisation", "localisation")],
    )
}

fn constraint_map(
    object: &str,
    fields: &[(&str, RuleFieldConstraint)],
) -> pdxlint_rules::FieldConstraintsByObject {
    let mut by_field = BTreeMap::new();
    for (field, constraint) in fields {
        by_field.insert(field.to_string(), constraint.clone());
    }
    let mut by_object = pdxlint_rules::FieldConstraintsByObject::default();
    by_object.insert(object.to_string(), by_field);
    by_object
}

fn scope_constraint_map(
    object: &str,
    entries: &[(&[&str], RuleFieldScopeConstraint)],
) -> pdxlint_rules::FieldScopeConstraintsByObject {
    let mut by_path = BTreeMap::new();
    for (path, constraint) in entries {
        by_path.insert(
            path.iter().map(|part| part.to_string()).collect::<Vec<_>>(),
            constraint.clone(),
        );
    }
    let mut by_object = pdxlint_rules::FieldScopeConstraintsByObject::default();
    by_object.insert(object.to_string(), by_path);
    by_object
}

fn commands(
    entries: &[(&str, &[&str])],
) -> BTreeMap<String, LocalisationCommandDefinition> {
    entries
        .iter()
        .map(|(name, supported)| {
            (
                name.to_string(),
                LocalisationCommandDefinition::new(*name, supported),
            )
        })
        .collect()
}

fn provider(entries: &[(&str, &[&str])]) -> Arc<LocalisationKeyProvider> {
    Arc::new(LocalisationKeyProvider::from_locale_keys(
        entries.iter().map(|(locale, keys)| {
            (
                locale.to_string(),
                keys.iter().map(|key| key.to_string()).collect(),
            )
        }),
    ))
}

fn codes(result: &pdxlint_rules::TypecheckRunResult) -> Vec<&str> {
    result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect()
}

fn run_rule(
    source: &str,
    rule: Arc<dyn TypecheckRule>,
) -> pdxlint_rules::TypecheckRunResult {
    run_typecheck(
        source,
        TypecheckRunConfig {
            rules: Some(vec![rule]),
            ..TypecheckRunConfig::default()
        },
    )
    .expect("typecheck run")
}

#[test]
fn command_scope_allows_matching_scope() {
    let rule = LocalisationCommandScopeRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        localisation_command_definitions_by_name: commands(&[("GetWing", &["air"])]),
        field_scope_constraints_by_object: scope_constraint_map(
            "technology",
            &[(&[], RuleFieldScopeConstraint::pushing(&["air"]))],
        ),
        policy: TypecheckPolicy {
            unresolved_reference: UnresolvedPolicy::Error,
            ..TypecheckPolicy::default()
        },
        ..LocalisationCommandScopeRule::default()
    };

    let result = run_rule("technology={ desc = \"[ROOT.GetWing]\" }\n", Arc::new(rule));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn command_scope_rejects_mismatched_scope() {
    let rule = LocalisationCommandScopeRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        localisation_command_definitions_by_name: commands(&[("GetWing", &["air"])]),
        field_scope_constraints_by_object: scope_constraint_map(
            "technology",
            &[(&[], RuleFieldScopeConstraint::pushing(&["country"]))],
        ),
        policy: TypecheckPolicy {
            unresolved_reference: UnresolvedPolicy::Error,
            ..TypecheckPolicy::default()
        },
        ..LocalisationCommandScopeRule::default()
    };

    let result = run_rule("technology={ desc = \"[ROOT.GetWing]\" }\n", Arc::new(rule));
    assert_eq!(codes(&result), vec!["TYPECHECK_INVALID_FIELD_REFERENCE"]);
}

#[test]
fn command_scope_applies_subtype_push_scope() {
    let mut matchers = pdxlint_rules::SubtypeMatchersByObject::default();
    matchers.insert(
        "ship_size".to_string(),
        vec![SubtypeMatcher {
            subtype_name: "starbase".to_string(),
            expected_field_values: vec![("class".to_string(), "shipclass_starbase".to_string())],
            push_scope: vec!["air".to_string()],
            ..SubtypeMatcher::default()
        }],
    );

    let rule = LocalisationCommandScopeRule {
        field_constraints_by_object: constraint_map(
            "ship_size",
            &[("desc", localisation_constraint())],
        ),
        localisation_command_definitions_by_name: commands(&[("GetWing", &["air"])]),
        subtype_matchers_by_object: matchers,
        policy: TypecheckPolicy {
            unresolved_reference: UnresolvedPolicy::Error,
            ..TypecheckPolicy::default()
        },
        ..LocalisationCommandScopeRule::default()
    };

    let source = "ship_size = {\n    class = shipclass_starbase\n    desc = \"[ROOT.GetWing]\"\n}\n";
    let result = run_rule(source, Arc::new(rule));
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
}

#[test]
fn unresolved_command_defers_by_default_policy() {
    let rule = LocalisationCommandScopeRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        field_scope_constraints_by_object: scope_constraint_map(
            "technology",
            &[(&[], RuleFieldScopeConstraint::pushing(&["country"]))],
        ),
        ..LocalisationCommandScopeRule::default()
    };

    let result = run_rule(
        "technology={ desc = \"[ROOT.GetUnknown]\" }\n",
        Arc::new(rule),
    );
    assert!(result.diagnostics.is_empty());
}

#[test]
fn key_existence_reports_missing_key() {
    let rule = LocalisationKeyExistenceRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        localisation_key_provider: provider(&[
            ("english", &["known_loc_key"]),
            ("german", &["known_loc_key"]),
        ]),
        ..LocalisationKeyExistenceRule::default()
    };

    let result = run_rule("technology={ desc = missing_loc_key }\n", Arc::new(rule));
    assert_eq!(codes(&result), vec!["TYPECHECK_INVALID_FIELD_REFERENCE"]);
    assert!(
        result.diagnostics[0]
            .message
            .contains("Unknown localisation key `missing_loc_key`")
    );
}

#[test]
fn key_existence_reports_missing_locale_coverage() {
    let rule = LocalisationKeyExistenceRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        localisation_key_provider: provider(&[
            ("english", &["known_loc_key"]),
            ("german", &[]),
        ]),
        policy: TypecheckPolicy {
            localisation_coverage: LocalisationCoverage::All,
            ..TypecheckPolicy::default()
        },
        ..LocalisationKeyExistenceRule::default()
    };

    let result = run_rule("technology={ desc = known_loc_key }\n", Arc::new(rule));
    assert_eq!(codes(&result), vec!["TYPECHECK_INVALID_FIELD_REFERENCE"]);
    assert!(result.diagnostics[0].message.contains("missing locales: german"));
}

#[test]
fn key_existence_defers_with_empty_provider() {
    let rule = LocalisationKeyExistenceRule {
        field_constraints_by_object: constraint_map(
            "technology",
            &[("desc", localisation_constraint())],
        ),
        ..LocalisationKeyExistenceRule::default()
    };

    let result = run_rule("technology={ desc = missing_loc_key }\n", Arc::new(rule));
    assert!(result.diagnostics.is_empty());
}

#[test]
fn type_localisation_requirement_reports_missing_required_key() {
    let mut templates = BTreeMap::new();
    templates.insert(
        "ship_size".to_string(),
        vec![
            TypeLocalisationTemplate::new("$", false),
            TypeLocalisationTemplate::new("$_desc", true),
        ],
    );

    let mut type_memberships = pdxlint_rules::MembershipsByKey::default();
    type_memberships.insert("ship_size".to_string(), ["ship_alpha".to_string()].into());

    let rule = TypeLocalisationRequirementRule {
        type_memberships_by_key: type_memberships,
        type_localisation_templates_by_type: templates,
        localisation_key_provider: provider(&[
            ("english", &["ship_alpha"]),
            ("german", &["ship_alpha"]),
        ]),
        ..TypeLocalisationRequirementRule::default()
    };

    let result = run_rule("technology={ desc = missing_loc_key }\n", Arc::new(rule));
    assert_eq!(codes(&result), vec!["TYPECHECK_INVALID_FIELD_REFERENCE"]);
    assert!(
        result.diagnostics[0]
            .message
            .contains("Missing required localisation key `ship_alpha_desc`")
    );
}

#[test]
fn error_if_only_match_emits_custom_diagnostic_when_value_matches() {
    let mut constraint = RuleFieldConstraint::new(
        false,
        vec![RuleValueSpec::primitive("scalar", "scalar")],
    );
    constraint.error_if_only_match = Some("custom-scope-match-error".to_string());
    constraint.comparison = true;

    let rule = ErrorIfOnlyMatchRule {
        field_constraints_by_object: constraint_map("technology", &[("target", constraint)]),
        ..ErrorIfOnlyMatchRule::default()
    };

    let result = run_rule("technology={ target = var:foo }\n", Arc::new(rule));
    assert_eq!(codes(&result), vec!["TYPECHECK_RULE_CUSTOM_ERROR"]);
    assert!(
        result.diagnostics[0]
            .message
            .contains("custom-scope-match-error")
    );
}

#[test]
fn error_if_only_match_skips_when_value_does_not_match() {
    let mut constraint =
        RuleFieldConstraint::new(false, vec![RuleValueSpec::primitive("int", "int")]);
    constraint.error_if_only_match = Some("custom-scope-match-error".to_string());
    constraint.comparison = true;

    let rule = ErrorIfOnlyMatchRule {
        field_constraints_by_object: constraint_map("technology", &[("target", constraint)]),
        ..ErrorIfOnlyMatchRule::default()
    };

    let result = run_rule("technology={ target = var:foo }\n", Arc::new(rule));
    assert!(result.diagnostics.is_empty());
}

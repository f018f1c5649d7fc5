//! Pipeline entrypoints: shared parse lifecycle, rule validation, ordering,
//! and the combined check run.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::Arc;

use pdxlint_core::analysis::AnalysisFacts;
use pdxlint_core::diagnostics::{Diagnostic, Severity};
use pdxlint_core::parser::ParseMode;
use pdxlint_core::result::parse_result;

use pdxlint_rules::{
    CheckRunConfig, FormatRunConfig, LintRule, LintRunConfig, TypecheckFacts, TypecheckRule,
    TypecheckRunConfig, TypecheckServices, run_check, run_format, run_lint, run_typecheck,
};

#[test]
fn typecheck_reports_inconsistent_top_level_shape() {
    let source = "value=1\nvalue={ a=1 }\n";
    let result = run_typecheck(source, TypecheckRunConfig::default()).expect("typecheck run");

    let codes: Vec<&str> = result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect();
    assert!(codes.contains(&"TYPECHECK_INCONSISTENT_VALUE_SHAPE"));
    assert!(
        result
            .facts
            .inconsistent_top_level_shapes
            .contains_key("value")
    );
    // A single finding for the repeated key.
    assert_eq!(
        codes
            .iter()
            .filter(|code| **code == "TYPECHECK_INCONSISTENT_VALUE_SHAPE")
            .count(),
        1
    );
}

#[test]
fn run_lint_reuses_provided_parse_result() {
    let source = "a=1\n";
    let parse = parse_result(source);

    let result = run_lint(
        "ignored",
        LintRunConfig {
            parse: Some(parse.clone()),
            ..LintRunConfig::default()
        },
    )
    .expect("lint run");

    assert!(Rc::ptr_eq(&result.parse, &parse));
    assert_eq!(result.diagnostics, parse.diagnostics().to_vec());
    assert!(result.type_facts.is_some());
}

#[test]
fn run_typecheck_reuses_provided_parse_result() {
    let source = "a=1\n";
    let parse = parse_result(source);

    let result = run_typecheck(
        "ignored",
        TypecheckRunConfig {
            parse: Some(parse.clone()),
            ..TypecheckRunConfig::default()
        },
    )
    .expect("typecheck run");

    assert!(Rc::ptr_eq(&result.parse, &parse));
    assert_eq!(result.diagnostics, parse.diagnostics().to_vec());
}

#[test]
fn analysis_facts_are_cached_across_engines() {
    let parse = parse_result("a=1\n");

    let first = parse.analysis_facts();
    let lint = run_lint(
        "ignored",
        LintRunConfig {
            parse: Some(parse.clone()),
            ..LintRunConfig::default()
        },
    )
    .expect("lint run");
    let typecheck = run_typecheck(
        "ignored",
        TypecheckRunConfig {
            parse: Some(parse.clone()),
            ..TypecheckRunConfig::default()
        },
    )
    .expect("typecheck run");
    let second = parse.analysis_facts();
    let third = parse.analysis_facts();

    assert!(Rc::ptr_eq(&lint.parse, &parse));
    assert!(Rc::ptr_eq(&typecheck.parse, &parse));
    assert!(Rc::ptr_eq(&first, &second));
    assert!(Rc::ptr_eq(&second, &third));
}

#[test]
#[should_panic(expected = "prebuilt parse result")]
fn run_lint_rejects_parse_with_mode() {
    let parse = parse_result("a=1\n");
    let _ = run_lint(
        "a=1\n",
        LintRunConfig {
            parse: Some(parse),
            mode: Some(ParseMode::Permissive),
            ..LintRunConfig::default()
        },
    );
}

#[test]
fn run_lint_rejects_foreign_typecheck_result() {
    let parse = parse_result("a=1\n");
    let other_parse = parse_result("a=1\n");
    let typecheck = run_typecheck(
        "ignored",
        TypecheckRunConfig {
            parse: Some(other_parse),
            ..TypecheckRunConfig::default()
        },
    )
    .expect("typecheck run");

    let outcome = run_lint(
        "ignored",
        LintRunConfig {
            parse: Some(parse),
            typecheck: Some(typecheck),
            ..LintRunConfig::default()
        },
    );
    assert!(outcome.is_err());
}

#[test]
fn run_format_returns_identity_text() {
    let source = "a = 1 # note\nb = { 2 3 }\n";
    let result = run_format(source, FormatRunConfig::default()).expect("format run");

    assert_eq!(result.formatted_text, source);
    assert!(!result.changed);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn run_check_reports_parse_errors_through_the_pipeline() {
    let source = "a=\"x\";\n";
    let result = run_check(source, CheckRunConfig::default()).expect("check run");

    assert_eq!(result.parse.source_text(), source);
    assert!(result.has_errors);
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].code, "PARSER_UNEXPECTED_TOKEN");
}

#[test]
fn run_check_is_clean_in_permissive_mode_for_legacy_semicolons() {
    let source = "a=\"x\";\n";
    let result = run_check(
        source,
        CheckRunConfig {
            mode: Some(ParseMode::Permissive),
            ..CheckRunConfig::default()
        },
    )
    .expect("check run");

    assert!(!result.has_errors);
    assert!(result.diagnostics.is_empty());
}

#[test]
fn run_check_deduplicates_and_sorts_diagnostics() {
    // The shape finding surfaces through both typecheck and lint (under
    // different codes), plus the style rule fires twice.
    let source = "technology={ cost=1 path=a }\nvalue=1\nvalue={ a=1 }\n";
    let result = run_check(source, CheckRunConfig::default()).expect("check run");

    let mut sorted = result.diagnostics.clone();
    pdxlint_core::diagnostics::sort_diagnostics(&mut sorted);
    assert_eq!(result.diagnostics, sorted);

    let mut deduped = result.diagnostics.clone();
    let before = deduped.len();
    deduped = pdxlint_core::diagnostics::dedupe_diagnostics(deduped);
    assert_eq!(before, deduped.len());

    let codes: Vec<&str> = result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect();
    assert!(codes.contains(&"TYPECHECK_INCONSISTENT_VALUE_SHAPE"));
    assert!(codes.contains(&"LINT_SEMANTIC_INCONSISTENT_SHAPE"));
    assert!(codes.contains(&"LINT_STYLE_SINGLE_LINE_BLOCK"));
    assert!(!result.has_errors);
}

#[test]
fn lint_runs_rules_in_deterministic_range_order() {
    let source = "technology={ cost=1 path=a }\nvalue=1\nvalue={ a=1 }\n";
    let services = TypecheckServices {
        required_fields_by_object: BTreeMap::from([(
            "technology".to_string(),
            vec!["start_year".to_string()],
        )]),
        ..TypecheckServices::default()
    };

    let result = run_lint(
        source,
        LintRunConfig {
            services: Some(services),
            ..LintRunConfig::default()
        },
    )
    .expect("lint run");

    let codes: Vec<&str> = result
        .diagnostics
        .iter()
        .map(|diagnostic| diagnostic.code.as_str())
        .collect();
    assert_eq!(
        codes,
        vec![
            "LINT_SEMANTIC_MISSING_REQUIRED_FIELD",
            "LINT_STYLE_SINGLE_LINE_BLOCK",
            "LINT_SEMANTIC_INCONSISTENT_SHAPE",
            "LINT_STYLE_SINGLE_LINE_BLOCK",
        ]
    );
}

struct BadCodeTypecheckRule;

impl TypecheckRule for BadCodeTypecheckRule {
    fn code(&self) -> &str {
        "LINT_WRONG_FAMILY"
    }

    fn name(&self) -> &str {
        "badCode"
    }

    fn run(&self, _: &AnalysisFacts, _: &TypecheckFacts, _: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}

#[test]
fn typecheck_rejects_rules_without_the_code_prefix() {
    let outcome = run_typecheck(
        "a=1\n",
        TypecheckRunConfig {
            rules: Some(vec![Arc::new(BadCodeTypecheckRule)]),
            ..TypecheckRunConfig::default()
        },
    );
    let error = outcome.err().expect("validation error");
    assert!(error.to_string().contains("TYPECHECK_"));
}

struct BadCodeLintRule;

impl LintRule for BadCodeLintRule {
    fn code(&self) -> &str {
        "TYPECHECK_WRONG_FAMILY"
    }

    fn name(&self) -> &str {
        "badLintCode"
    }

    fn category(&self) -> &str {
        "semantic"
    }

    fn domain(&self) -> pdxlint_rules::LintDomain {
        pdxlint_rules::LintDomain::Semantic
    }

    fn confidence(&self) -> pdxlint_rules::LintConfidence {
        pdxlint_rules::LintConfidence::Policy
    }

    fn run(&self, _: &AnalysisFacts, _: &TypecheckFacts, _: &str) -> Vec<Diagnostic> {
        Vec::new()
    }
}

#[test]
fn lint_rejects_rules_without_the_code_prefix() {
    let outcome = run_lint(
        "a=1\n",
        LintRunConfig {
            rules: Some(vec![Arc::new(BadCodeLintRule)]),
            ..LintRunConfig::default()
        },
    );
    let error = outcome.err().expect("validation error");
    assert!(error.to_string().contains("LINT_"));
}

#[test]
fn severities_distinguish_errors_from_warnings_in_check() {
    let clean = run_check("a=1\n", CheckRunConfig::default()).expect("check run");
    assert!(!clean.has_errors);
    assert!(clean.diagnostics.is_empty());

    let warnings_only = run_check(
        "a = { 1 }\n}\nb = 2\n",
        CheckRunConfig {
            mode: Some(ParseMode::Permissive),
            ..CheckRunConfig::default()
        },
    )
    .expect("check run");
    assert!(!warnings_only.has_errors);
    assert!(
        warnings_only
            .diagnostics
            .iter()
            .all(|diagnostic| diagnostic.severity == Severity::Warning)
    );
}

//! Unified pipeline entrypoints coordinating parse, type-check, lint, and
//! format over one shared parse lifecycle.

use std::rc::Rc;
use std::sync::Arc;

use pdxlint_core::diagnostics::{
    Diagnostic, dedupe_diagnostics, has_errors, sort_diagnostics,
};
use pdxlint_core::parser::{ParseMode, ParserOptions};
use pdxlint_core::result::{
    JominiParseResult, parse_result_with_mode, parse_result_with_options,
};

use crate::error::EngineError;
use crate::lint::{LintRule, default_lint_rules, validate_lint_rules};
use crate::services::TypecheckServices;
use crate::typecheck::{
    TypecheckFacts, TypecheckRule, build_typecheck_facts, default_typecheck_rules,
    validate_typecheck_rules,
};

/// Result of running type-check rules from a shared parse result.
#[derive(Debug, Clone)]
pub struct TypecheckRunResult {
    pub parse: Rc<JominiParseResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub facts: TypecheckFacts,
}

/// Result of running lint rules from a shared parse result.
#[derive(Debug, Clone)]
pub struct LintRunResult {
    pub parse: Rc<JominiParseResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub type_facts: Option<TypecheckFacts>,
}

/// Result of formatting from a shared parse result.
#[derive(Debug, Clone)]
pub struct FormatRunResult {
    pub parse: Rc<JominiParseResult>,
    pub formatted_text: String,
    pub diagnostics: Vec<Diagnostic>,
    pub changed: bool,
}

/// Result of the combined check pipeline.
#[derive(Debug, Clone)]
pub struct CheckRunResult {
    pub parse: Rc<JominiParseResult>,
    pub diagnostics: Vec<Diagnostic>,
    pub has_errors: bool,
}

/// Configuration for [`run_typecheck`].
#[derive(Default)]
pub struct TypecheckRunConfig {
    pub mode: Option<ParseMode>,
    pub options: Option<ParserOptions>,
    /// A pre-built parse result to reuse. Mutually exclusive with
    /// `mode`/`options`.
    pub parse: Option<Rc<JominiParseResult>>,
    pub rules: Option<Vec<Arc<dyn TypecheckRule>>>,
    pub services: Option<TypecheckServices>,
}

/// Configuration for [`run_lint`].
#[derive(Default)]
pub struct LintRunConfig {
    pub mode: Option<ParseMode>,
    pub options: Option<ParserOptions>,
    pub parse: Option<Rc<JominiParseResult>>,
    /// A pre-run type-check over the same parse result.
    pub typecheck: Option<TypecheckRunResult>,
    pub rules: Option<Vec<Arc<dyn LintRule>>>,
    pub services: Option<TypecheckServices>,
}

/// Configuration for [`run_format`].
#[derive(Default)]
pub struct FormatRunConfig {
    pub mode: Option<ParseMode>,
    pub options: Option<ParserOptions>,
    pub parse: Option<Rc<JominiParseResult>>,
}

/// Configuration for [`run_check`].
#[derive(Default)]
pub struct CheckRunConfig {
    pub mode: Option<ParseMode>,
    pub options: Option<ParserOptions>,
    pub parse: Option<Rc<JominiParseResult>>,
    pub services: Option<TypecheckServices>,
}

/// Run type checking over one parse lifecycle.
pub fn run_typecheck(
    text: &str,
    config: TypecheckRunConfig,
) -> Result<TypecheckRunResult, EngineError> {
    let parse = resolve_parse(text, config.mode, config.options, config.parse);
    run_typecheck_on(parse, config.rules, config.services)
}

fn run_typecheck_on(
    parse: Rc<JominiParseResult>,
    rules: Option<Vec<Arc<dyn TypecheckRule>>>,
    services: Option<TypecheckServices>,
) -> Result<TypecheckRunResult, EngineError> {
    tracing::debug!(source_len = parse.source_text().len(), "running typecheck");

    let analysis_facts = parse.analysis_facts();
    let type_facts = build_typecheck_facts(&analysis_facts);

    let rebind = rules.is_some() && services.is_some();
    let resolved_services = services.unwrap_or_default();
    let mut resolved_rules =
        rules.unwrap_or_else(|| default_typecheck_rules(&resolved_services));
    if rebind {
        resolved_rules = resolved_rules
            .into_iter()
            .map(|rule| rule.rebind(&resolved_services).unwrap_or(rule))
            .collect();
    }
    validate_typecheck_rules(&resolved_rules)?;

    let mut diagnostics = parse.diagnostics().to_vec();
    for rule in &resolved_rules {
        diagnostics.extend(rule.run(&analysis_facts, &type_facts, parse.source_text()));
    }
    sort_diagnostics(&mut diagnostics);

    Ok(TypecheckRunResult {
        parse,
        diagnostics,
        facts: type_facts,
    })
}

/// Run linting over one parse lifecycle.
///
/// Lint consumes type-check facts; a pre-run type-check result may be
/// supplied, otherwise one is computed against the same parse.
pub fn run_lint(text: &str, config: LintRunConfig) -> Result<LintRunResult, EngineError> {
    let parse = resolve_parse(text, config.mode, config.options, config.parse);
    tracing::debug!(source_len = parse.source_text().len(), "running lint");

    let typecheck = match config.typecheck {
        Some(typecheck) => {
            if !Rc::ptr_eq(&typecheck.parse, &parse) {
                return Err(EngineError::MismatchedParse {
                    what: "typecheck result",
                });
            }
            typecheck
        }
        None => run_typecheck_on(parse.clone(), None, config.services.clone())?,
    };

    let resolved_services = config.services.unwrap_or_default();
    let resolved_rules = config
        .rules
        .unwrap_or_else(|| default_lint_rules(&resolved_services));
    validate_lint_rules(&resolved_rules)?;

    let analysis_facts = parse.analysis_facts();
    let mut diagnostics = parse.diagnostics().to_vec();
    for rule in &resolved_rules {
        diagnostics.extend(rule.run(&analysis_facts, &typecheck.facts, parse.source_text()));
    }
    sort_diagnostics(&mut diagnostics);

    Ok(LintRunResult {
        parse,
        diagnostics,
        type_facts: Some(typecheck.facts),
    })
}

/// Run formatting over one parse lifecycle.
///
/// Concrete formatting rules live outside the core; the runner reconstructs
/// the text from the green tree, which by the lossless invariant is the
/// identity transformation.
pub fn run_format(text: &str, config: FormatRunConfig) -> Result<FormatRunResult, EngineError> {
    let parse = resolve_parse(text, config.mode, config.options, config.parse);
    tracing::debug!(source_len = parse.source_text().len(), "running format");

    let formatted_text = parse.green_root().text();
    let changed = formatted_text != parse.source_text();
    let diagnostics = parse.diagnostics().to_vec();

    Ok(FormatRunResult {
        parse,
        formatted_text,
        diagnostics,
        changed,
    })
}

/// Run type-check then lint against the same parse, deduplicating the
/// combined diagnostics.
pub fn run_check(text: &str, config: CheckRunConfig) -> Result<CheckRunResult, EngineError> {
    let parse = resolve_parse(text, config.mode, config.options, config.parse);

    let typecheck = run_typecheck_on(parse.clone(), None, config.services.clone())?;
    let lint = run_lint(
        parse.source_text(),
        LintRunConfig {
            parse: Some(parse.clone()),
            typecheck: Some(typecheck.clone()),
            services: config.services,
            ..LintRunConfig::default()
        },
    )?;

    let mut combined = typecheck.diagnostics;
    combined.extend(lint.diagnostics);
    let mut diagnostics = dedupe_diagnostics(combined);
    sort_diagnostics(&mut diagnostics);
    let any_errors = has_errors(&diagnostics);

    Ok(CheckRunResult {
        parse,
        diagnostics,
        has_errors: any_errors,
    })
}

/// Resolve one parse lifecycle for an entrypoint.
///
/// Passing a pre-built parse result together with `mode`/`options` is a
/// programmer error: the options could not be applied to the existing
/// parse.
fn resolve_parse(
    text: &str,
    mode: Option<ParseMode>,
    options: Option<ParserOptions>,
    parse: Option<Rc<JominiParseResult>>,
) -> Rc<JominiParseResult> {
    if let Some(parse) = parse {
        assert!(
            mode.is_none() && options.is_none(),
            "pass either a prebuilt parse result or parser mode/options, not both"
        );
        return parse;
    }
    match (options, mode) {
        (Some(options), None) => parse_result_with_options(text, options),
        (None, Some(mode)) => parse_result_with_mode(text, mode),
        (None, None) => parse_result_with_options(text, ParserOptions::default()),
        (Some(_), Some(_)) => panic!("pass either parser options or a mode, not both"),
    }
}

//! pdxlint rules
//!
//! Rule engine for Jomini game script: type-check and lint rule families
//! over the shared analysis facts produced by `pdxlint-core`, the services
//! object carrying schema artifacts, and the pipeline entrypoints that
//! coordinate parse/type-check/lint/format over one parse lifecycle.

pub mod assets;
pub mod error;
pub mod lint;
pub mod localisation;
pub mod pipeline;
pub mod schema;
pub mod scope;
pub mod services;
pub mod typecheck;

pub use assets::{
    AssetLookup, AssetLookupStatus, AssetRegistry, NullAssetRegistry, SetAssetRegistry,
};
pub use error::EngineError;
pub use lint::{
    LintConfidence, LintDomain, LintRule, default_lint_rules, validate_lint_rules,
};
pub use localisation::LocalisationKeyProvider;
pub use pipeline::{
    CheckRunConfig, CheckRunResult, FormatRunConfig, FormatRunResult, LintRunConfig,
    LintRunResult, TypecheckRunConfig, TypecheckRunResult, run_check, run_format, run_lint,
    run_typecheck,
};
pub use schema::{
    FieldConstraintsByObject, FieldScopeConstraintsByObject, LinkDefinition, LinkType,
    LocalisationCommandDefinition, MembershipsByKey, RuleFieldConstraint,
    RuleFieldScopeConstraint, RuleScopeReplacement, RuleValueSpec, RuleValueSpecKind,
    SubtypeFieldConstraintsByObject, SubtypeMatcher, SubtypeMatchersByObject,
    TypeLocalisationTemplate,
};
pub use scope::{AliasResolution, ChainResolution, ScopeChainResolver, ScopeContext};
pub use services::{
    LocalisationCoverage, TypecheckPolicy, TypecheckServices, UnresolvedPolicy,
};
pub use typecheck::{
    ErrorIfOnlyMatchRule, FieldConstraintRule, FieldReferenceConstraintRule,
    FieldScopeContextRule, InconsistentTopLevelShapeRule, LocalisationCommandScopeRule,
    LocalisationKeyExistenceRule, TypeLocalisationRequirementRule, TypecheckConfidence,
    TypecheckDomain, TypecheckFacts, TypecheckRule, build_typecheck_facts,
    default_typecheck_rules, validate_typecheck_rules,
};

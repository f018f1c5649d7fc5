//! Schema artifacts consumed by the rule engine.
//!
//! These types mirror what the external rules-file ingestion delivers after
//! normalization: field constraints, scope constraints, subtype matchers,
//! link definitions, and localisation templates. Nothing in this crate
//! parses rule files; the artifacts are injected through
//! [`crate::services::TypecheckServices`] or directly into rule structs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// What a value spec refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleValueSpecKind {
    /// A primitive such as `bool`, `int[0..10]`, `filepath[...]`.
    Primitive,
    /// `enum[key]`
    EnumRef,
    /// `<type>` (optionally wrapped, e.g. `pre_<type>_suf`)
    TypeRef,
    /// `value[key]` read side
    ValueRef,
    /// `value_set[key]`
    ValueSetRef,
    /// `scope[name]`
    ScopeRef,
    /// `alias_match_left[family]`
    AliasMatchLeftRef,
    /// `single_alias_right[name]`
    SingleAliasRef,
    Missing,
    Block,
    TaggedBlock,
    Error,
    UnknownRef,
}

/// One alternative a field value may match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleValueSpec {
    pub kind: RuleValueSpecKind,
    /// The spec as written in the schema, kept for messages.
    pub raw: String,
    /// Primitive name for `kind == Primitive`.
    pub primitive: Option<String>,
    /// Bracket argument (range, enum key, scope name, ...).
    pub argument: Option<String>,
}

impl RuleValueSpec {
    pub fn new(kind: RuleValueSpecKind, raw: impl Into<String>) -> Self {
        Self {
            kind,
            raw: raw.into(),
            primitive: None,
            argument: None,
        }
    }

    pub fn primitive(raw: impl Into<String>, primitive: impl Into<String>) -> Self {
        Self {
            kind: RuleValueSpecKind::Primitive,
            raw: raw.into(),
            primitive: Some(primitive.into()),
            argument: None,
        }
    }

    pub fn primitive_with_argument(
        raw: impl Into<String>,
        primitive: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            kind: RuleValueSpecKind::Primitive,
            raw: raw.into(),
            primitive: Some(primitive.into()),
            argument: Some(argument.into()),
        }
    }

    pub fn reference(
        kind: RuleValueSpecKind,
        raw: impl Into<String>,
        argument: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            raw: raw.into(),
            primitive: None,
            argument: Some(argument.into()),
        }
    }
}

/// Constraint on one field of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleFieldConstraint {
    pub required: bool,
    /// Alternatives; a value matches the constraint when any spec matches.
    pub value_specs: Vec<RuleValueSpec>,
    /// `## error_if_only_match = "..."` marker from the schema.
    pub error_if_only_match: Option<String>,
    /// The schema declared this a comparison field.
    pub comparison: bool,
}

impl RuleFieldConstraint {
    pub fn new(required: bool, value_specs: Vec<RuleValueSpec>) -> Self {
        Self {
            required,
            value_specs,
            error_if_only_match: None,
            comparison: false,
        }
    }
}

/// One `replace_scope = { source = target }` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScopeReplacement {
    pub source: String,
    pub target: String,
}

impl RuleScopeReplacement {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

/// Scope behavior attached to one field path inside an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RuleFieldScopeConstraint {
    /// Scopes this field may appear in.
    pub required_scope: Vec<String>,
    /// Scopes pushed for fields beneath this path.
    pub push_scope: Vec<String>,
    /// Alias replacements for fields beneath this path. Ignored when
    /// `push_scope` is present on the same path.
    pub replace_scope: Vec<RuleScopeReplacement>,
}

impl RuleFieldScopeConstraint {
    pub fn required(scopes: &[&str]) -> Self {
        Self {
            required_scope: scopes.iter().map(|scope| scope.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn pushing(scopes: &[&str]) -> Self {
        Self {
            push_scope: scopes.iter().map(|scope| scope.to_string()).collect(),
            ..Self::default()
        }
    }

    pub fn replacing(replacements: Vec<RuleScopeReplacement>) -> Self {
        Self {
            replace_scope: replacements,
            ..Self::default()
        }
    }
}

/// Whether a link produces a scope, a value, or either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    #[default]
    Scope,
    Value,
    Both,
}

/// A scope link (`owner`, `capital`, `var:<variable>`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkDefinition {
    pub name: String,
    pub output_scope: String,
    /// Scopes the link may be entered from; empty means any.
    pub input_scopes: Vec<String>,
    /// Data-link prefix including the colon, e.g. `var:`.
    pub prefix: Option<String>,
    pub from_data: bool,
    /// Data sources such as `value[variable]` for prefixed links.
    pub data_sources: Vec<String>,
    pub link_type: LinkType,
}

impl LinkDefinition {
    pub fn new(
        name: impl Into<String>,
        output_scope: impl Into<String>,
        input_scopes: &[&str],
    ) -> Self {
        Self {
            name: name.into(),
            output_scope: output_scope.into(),
            input_scopes: input_scopes.iter().map(|scope| scope.to_string()).collect(),
            prefix: None,
            from_data: false,
            data_sources: Vec::new(),
            link_type: LinkType::default(),
        }
    }
}

/// Matcher selecting a subtype variant of an object occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SubtypeMatcher {
    pub subtype_name: String,
    /// Immediate fields that must carry these scalar values.
    pub expected_field_values: Vec<(String, String)>,
    /// Restrict the matcher to these object keys (empty: no restriction).
    pub type_key_filters: Vec<String>,
    /// Restrict the matcher to object keys with this prefix.
    pub starts_with: Option<String>,
    /// Extra scopes pushed onto the occurrence's root context.
    pub push_scope: Vec<String>,
}

impl SubtypeMatcher {
    pub fn new(subtype_name: impl Into<String>, expected_field_values: &[(&str, &str)]) -> Self {
        Self {
            subtype_name: subtype_name.into(),
            expected_field_values: expected_field_values
                .iter()
                .map(|(field, value)| (field.to_string(), value.to_string()))
                .collect(),
            ..Self::default()
        }
    }
}

/// A localisation command and the scopes it may run in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalisationCommandDefinition {
    pub name: String,
    /// `any` accepts every scope.
    pub supported_scopes: Vec<String>,
}

impl LocalisationCommandDefinition {
    pub fn new(name: impl Into<String>, supported_scopes: &[&str]) -> Self {
        Self {
            name: name.into(),
            supported_scopes: supported_scopes
                .iter()
                .map(|scope| scope.to_string())
                .collect(),
        }
    }
}

/// `$`-template for localisation keys a type's members must provide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeLocalisationTemplate {
    /// `$` stands for the member name, e.g. `$_desc`.
    pub template: String,
    pub required: bool,
}

impl TypeLocalisationTemplate {
    pub fn new(template: impl Into<String>, required: bool) -> Self {
        Self {
            template: template.into(),
            required,
        }
    }

    pub fn expand(&self, member: &str) -> String {
        self.template.replace('$', member)
    }
}

/// Object key → field name → constraint.
pub type FieldConstraintsByObject = BTreeMap<String, BTreeMap<String, RuleFieldConstraint>>;

/// Object key → field path (relative to the object) → scope constraint.
pub type FieldScopeConstraintsByObject =
    BTreeMap<String, BTreeMap<Vec<String>, RuleFieldScopeConstraint>>;

/// Object key → subtype matchers.
pub type SubtypeMatchersByObject = BTreeMap<String, Vec<SubtypeMatcher>>;

/// Object key → subtype name → field name → constraint.
pub type SubtypeFieldConstraintsByObject =
    BTreeMap<String, BTreeMap<String, BTreeMap<String, RuleFieldConstraint>>>;

/// Membership index: key → member names.
pub type MembershipsByKey = BTreeMap<String, BTreeSet<String>>;

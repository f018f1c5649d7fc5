//! Service and policy wiring for the rule engine.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::{AssetRegistry, NullAssetRegistry};
use crate::localisation::LocalisationKeyProvider;
use crate::schema::{
    FieldConstraintsByObject, FieldScopeConstraintsByObject, LinkDefinition,
    LocalisationCommandDefinition, MembershipsByKey, RuleFieldConstraint,
    SubtypeFieldConstraintsByObject, SubtypeMatchersByObject, TypeLocalisationTemplate,
};

/// How to treat a reference or asset whose registry reports `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnresolvedPolicy {
    /// Skip the hard decision; emit nothing.
    #[default]
    Defer,
    /// Treat unresolved as invalid.
    Error,
}

/// Which locales a localisation key must cover.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocalisationCoverage {
    /// Any known locale suffices.
    #[default]
    Any,
    /// Every known locale must carry the key.
    All,
}

/// Policy toggles for unresolved checks in type-check rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypecheckPolicy {
    pub unresolved_asset: UnresolvedPolicy,
    pub unresolved_reference: UnresolvedPolicy,
    pub localisation_coverage: LocalisationCoverage,
}

/// Shared resolvers and schema artifacts injected into rule execution.
///
/// The default-rule factory wires rule fields from this struct by explicit
/// struct update; rules never reach into process-wide state. All providers
/// are immutable, so a services value may be shared across parallel parse
/// lifecycles.
#[derive(Debug, Clone)]
pub struct TypecheckServices {
    pub asset_registry: Arc<dyn AssetRegistry>,
    pub policy: TypecheckPolicy,
    pub field_constraints_by_object: FieldConstraintsByObject,
    pub field_scope_constraints_by_object: FieldScopeConstraintsByObject,
    pub subtype_matchers_by_object: SubtypeMatchersByObject,
    pub subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject,
    pub type_memberships_by_key: MembershipsByKey,
    pub value_memberships_by_key: MembershipsByKey,
    pub enum_memberships_by_key: MembershipsByKey,
    pub alias_memberships_by_family: MembershipsByKey,
    pub single_alias_constraints_by_name: BTreeMap<String, RuleFieldConstraint>,
    pub link_definitions_by_name: BTreeMap<String, LinkDefinition>,
    pub localisation_command_definitions_by_name: BTreeMap<String, LocalisationCommandDefinition>,
    pub type_localisation_templates_by_type: BTreeMap<String, Vec<TypeLocalisationTemplate>>,
    pub localisation_key_provider: Arc<LocalisationKeyProvider>,
    pub known_scopes: BTreeSet<String>,
    pub known_type_keys: BTreeSet<String>,
    /// Required-field map consumed by the semantic lint rule.
    pub required_fields_by_object: BTreeMap<String, Vec<String>>,
}

impl Default for TypecheckServices {
    fn default() -> Self {
        Self {
            asset_registry: Arc::new(NullAssetRegistry),
            policy: TypecheckPolicy::default(),
            field_constraints_by_object: FieldConstraintsByObject::default(),
            field_scope_constraints_by_object: FieldScopeConstraintsByObject::default(),
            subtype_matchers_by_object: SubtypeMatchersByObject::default(),
            subtype_field_constraints_by_object: SubtypeFieldConstraintsByObject::default(),
            type_memberships_by_key: MembershipsByKey::default(),
            value_memberships_by_key: MembershipsByKey::default(),
            enum_memberships_by_key: MembershipsByKey::default(),
            alias_memberships_by_family: MembershipsByKey::default(),
            single_alias_constraints_by_name: BTreeMap::new(),
            link_definitions_by_name: BTreeMap::new(),
            localisation_command_definitions_by_name: BTreeMap::new(),
            type_localisation_templates_by_type: BTreeMap::new(),
            localisation_key_provider: Arc::new(LocalisationKeyProvider::new()),
            known_scopes: BTreeSet::new(),
            known_type_keys: BTreeSet::new(),
            required_fields_by_object: BTreeMap::new(),
        }
    }
}

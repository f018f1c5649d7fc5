//! Virtual scope contexts and scope-chain resolution.
//!
//! Scope-aware rules never execute game script; they maintain a virtual
//! stack derived from `push_scope` / `replace_scope` constraints along a
//! field's ancestor path and resolve alias identifiers (`this`, `root`,
//! `from`, `prev`, repetitions thereof) and link chains (`owner.capital`,
//! `var:foo`) against it.

use std::collections::{BTreeMap, BTreeSet};

use crate::schema::{
    LinkDefinition, MembershipsByKey, RuleFieldScopeConstraint,
};

/// Outcome of resolving one alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AliasResolution {
    Scope(String),
    /// A replace-scope mapping offers multiple targets for this alias.
    Ambiguous,
    Unresolved,
}

/// Outcome of resolving a whole dotted chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainResolution {
    Scope(String),
    Ambiguous,
    /// Some step could not be decided with the available artifacts.
    Unresolved,
    /// A step failed against known artifacts (wrong input scope, missing
    /// data-source value, unknown final scope).
    Mismatch,
}

/// The scope context in effect at one field path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeContext {
    stack: Vec<String>,
    /// Alias → replacement targets. More than one target marks the alias
    /// ambiguous.
    overrides: BTreeMap<String, Vec<String>>,
}

impl ScopeContext {
    /// Build the context seen by a field at `relative_path` (path inside
    /// the object, the field key last). Constraints are applied from the
    /// object root downwards; `extra_root_push` seeds the stack (subtype
    /// `push_scope`).
    pub fn build(
        constraints: Option<&BTreeMap<Vec<String>, RuleFieldScopeConstraint>>,
        relative_path: &[String],
        extra_root_push: &[String],
    ) -> ScopeContext {
        let mut context = ScopeContext {
            stack: extra_root_push.to_vec(),
            overrides: BTreeMap::new(),
        };

        let Some(constraints) = constraints else {
            return context;
        };

        for prefix_len in 0..relative_path.len() {
            let prefix = relative_path[..prefix_len].to_vec();
            if let Some(constraint) = constraints.get(&prefix) {
                context.apply(constraint);
            }
        }
        context
    }

    fn apply(&mut self, constraint: &RuleFieldScopeConstraint) {
        // push_scope takes precedence over replace_scope on the same path.
        if !constraint.push_scope.is_empty() {
            self.stack.extend(constraint.push_scope.iter().cloned());
            return;
        }

        let mut grouped: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for replacement in &constraint.replace_scope {
            let targets = grouped
                .entry(replacement.source.to_ascii_lowercase())
                .or_default();
            if !targets.contains(&replacement.target) {
                targets.push(replacement.target.clone());
            }
        }
        // A deeper path's mapping replaces a shallower one per alias.
        for (source, targets) in grouped {
            self.overrides.insert(source, targets);
        }
    }

    /// Whether any replace-scope mapping in effect is ambiguous.
    pub fn has_ambiguous_replacement(&self) -> bool {
        self.overrides.values().any(|targets| targets.len() > 1)
    }

    /// The scope `this` refers to.
    pub fn current(&self) -> AliasResolution {
        self.resolve_alias("this")
    }

    /// Resolve a scope alias. The stack answers first; replace-scope
    /// overrides cover aliases the stack cannot reach.
    pub fn resolve_alias(&self, alias: &str) -> AliasResolution {
        let normalized = alias.to_ascii_lowercase();

        if let Some(depth) = alias_depth(&normalized) {
            let resolved = match depth {
                AliasDepth::This => self.stack.last(),
                AliasDepth::Root => self.stack.first(),
                AliasDepth::Below(count) => {
                    if self.stack.len() > count {
                        self.stack.get(self.stack.len() - 1 - count)
                    } else {
                        None
                    }
                }
            };
            if let Some(scope) = resolved {
                return AliasResolution::Scope(scope.clone());
            }
        }

        match self.overrides.get(&normalized) {
            Some(targets) if targets.len() == 1 => AliasResolution::Scope(targets[0].clone()),
            Some(_) => AliasResolution::Ambiguous,
            None => AliasResolution::Unresolved,
        }
    }
}

enum AliasDepth {
    This,
    Root,
    /// `from`/`prev` chains: how many entries below the stack top.
    Below(usize),
}

fn alias_depth(normalized: &str) -> Option<AliasDepth> {
    match normalized {
        "this" => return Some(AliasDepth::This),
        "root" => return Some(AliasDepth::Root),
        _ => {}
    }
    if let Some(count) = repetitions_of(normalized, "prev") {
        return Some(AliasDepth::Below(count));
    }
    if let Some(count) = repetitions_of(normalized, "from") {
        return Some(AliasDepth::Below(count));
    }
    None
}

/// Whether a name is shaped like a scope alias at all.
pub fn is_scope_alias(name: &str) -> bool {
    alias_depth(&name.to_ascii_lowercase()).is_some()
}

fn repetitions_of(name: &str, unit: &str) -> Option<usize> {
    if name.is_empty() || name.len() % unit.len() != 0 {
        return None;
    }
    let count = name.len() / unit.len();
    if unit.repeat(count) == name {
        Some(count)
    } else {
        None
    }
}

/// Resolves dotted scope chains against a context plus link artifacts.
pub struct ScopeChainResolver<'a> {
    pub context: &'a ScopeContext,
    pub known_scopes: &'a BTreeSet<String>,
    pub link_definitions: &'a BTreeMap<String, LinkDefinition>,
    pub value_memberships: &'a MembershipsByKey,
}

impl ScopeChainResolver<'_> {
    /// Resolve `text` (e.g. `this`, `owner.capital`, `var:foo`) to the
    /// scope it lands in.
    pub fn resolve(&self, text: &str) -> ChainResolution {
        let mut current: Option<String> = match self.context.current() {
            AliasResolution::Scope(scope) => Some(scope),
            AliasResolution::Ambiguous => return ChainResolution::Ambiguous,
            AliasResolution::Unresolved => None,
        };
        let mut unresolved = false;

        for segment in text.trim().split('.') {
            let segment = segment.trim();
            if segment.is_empty() {
                unresolved = true;
                current = None;
                continue;
            }

            if is_scope_alias(segment) {
                match self.context.resolve_alias(segment) {
                    AliasResolution::Scope(scope) => current = Some(scope),
                    AliasResolution::Ambiguous => return ChainResolution::Ambiguous,
                    AliasResolution::Unresolved => {
                        unresolved = true;
                        current = None;
                    }
                }
                continue;
            }

            if let Some((prefix_name, data)) = segment.split_once(':') {
                let prefix = format!("{prefix_name}:");
                let link = self
                    .link_definitions
                    .values()
                    .find(|link| link.prefix.as_deref() == Some(prefix.as_str()));
                match link {
                    Some(link) => match self.enter_link(link, &current, Some(data)) {
                        LinkStep::Entered(scope) => current = Some(scope),
                        LinkStep::Unresolved => {
                            unresolved = true;
                            current = None;
                        }
                        LinkStep::Mismatch => return ChainResolution::Mismatch,
                    },
                    None => {
                        unresolved = true;
                        current = None;
                    }
                }
                continue;
            }

            if let Some(link) = self.link_definitions.get(segment) {
                match self.enter_link(link, &current, None) {
                    LinkStep::Entered(scope) => current = Some(scope),
                    LinkStep::Unresolved => {
                        unresolved = true;
                        current = None;
                    }
                    LinkStep::Mismatch => return ChainResolution::Mismatch,
                }
                continue;
            }

            if self.known_scopes.contains(segment) {
                current = Some(segment.to_string());
                continue;
            }

            unresolved = true;
            current = None;
        }

        if unresolved {
            return ChainResolution::Unresolved;
        }
        match current {
            Some(scope) => ChainResolution::Scope(scope),
            None => ChainResolution::Unresolved,
        }
    }

    fn enter_link(
        &self,
        link: &LinkDefinition,
        current: &Option<String>,
        data: Option<&str>,
    ) -> LinkStep {
        let mut step_unresolved = false;

        if !link.input_scopes.is_empty() {
            match current {
                Some(scope) if link.input_scopes.iter().any(|input| input == scope) => {}
                Some(_) => return LinkStep::Mismatch,
                None => step_unresolved = true,
            }
        }

        if link.from_data
            && let Some(data) = data
        {
            match self.check_data_sources(link, data) {
                DataCheck::Member => {}
                DataCheck::NotMember => return LinkStep::Mismatch,
                DataCheck::Unknown => step_unresolved = true,
            }
        }

        if step_unresolved {
            return LinkStep::Unresolved;
        }
        LinkStep::Entered(link.output_scope.clone())
    }

    fn check_data_sources(&self, link: &LinkDefinition, data: &str) -> DataCheck {
        let mut any_known = false;
        for source in &link.data_sources {
            let Some(key) = bracket_argument(source) else {
                continue;
            };
            let Some(members) = self.value_memberships.get(key) else {
                continue;
            };
            any_known = true;
            if members.contains(data) {
                return DataCheck::Member;
            }
        }
        if any_known {
            DataCheck::NotMember
        } else {
            DataCheck::Unknown
        }
    }
}

enum LinkStep {
    Entered(String),
    Unresolved,
    Mismatch,
}

enum DataCheck {
    Member,
    NotMember,
    Unknown,
}

/// The `x` of `value[x]` / `enum[x]`-style source declarations.
fn bracket_argument(source: &str) -> Option<&str> {
    let open = source.find('[')?;
    let close = source.rfind(']')?;
    if close <= open {
        return None;
    }
    Some(source[open + 1..close].trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::RuleScopeReplacement;

    fn constraints(
        entries: &[(&[&str], RuleFieldScopeConstraint)],
    ) -> BTreeMap<Vec<String>, RuleFieldScopeConstraint> {
        entries
            .iter()
            .map(|(path, constraint)| {
                (
                    path.iter().map(|part| part.to_string()).collect(),
                    constraint.clone(),
                )
            })
            .collect()
    }

    fn path(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|part| part.to_string()).collect()
    }

    #[test]
    fn push_scope_builds_the_stack_for_nested_fields() {
        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::pushing(&["country", "state"]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["who"]), &[]);

        assert_eq!(
            context.resolve_alias("this"),
            AliasResolution::Scope("state".to_string())
        );
        assert_eq!(
            context.resolve_alias("from"),
            AliasResolution::Scope("country".to_string())
        );
        assert_eq!(
            context.resolve_alias("prev"),
            AliasResolution::Scope("country".to_string())
        );
        assert_eq!(
            context.resolve_alias("root"),
            AliasResolution::Scope("country".to_string())
        );
    }

    #[test]
    fn prevprev_needs_three_pushed_scopes() {
        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::pushing(&["country", "state", "province"]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["who"]), &[]);
        assert_eq!(
            context.resolve_alias("prevprev"),
            AliasResolution::Scope("country".to_string())
        );
    }

    #[test]
    fn replace_scope_covers_aliases_the_stack_cannot_reach() {
        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::replacing(vec![RuleScopeReplacement::new(
                "from", "country",
            )]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["who"]), &[]);
        assert_eq!(
            context.resolve_alias("from"),
            AliasResolution::Scope("country".to_string())
        );
        assert_eq!(context.resolve_alias("this"), AliasResolution::Unresolved);
    }

    #[test]
    fn conflicting_replacement_targets_are_ambiguous() {
        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::replacing(vec![
                RuleScopeReplacement::new("from", "country"),
                RuleScopeReplacement::new("from", "state"),
            ]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["who"]), &[]);
        assert!(context.has_ambiguous_replacement());
        assert_eq!(context.resolve_alias("from"), AliasResolution::Ambiguous);
    }

    #[test]
    fn push_scope_suppresses_replace_scope_on_the_same_path() {
        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint {
                push_scope: vec!["country".to_string(), "state".to_string()],
                replace_scope: vec![RuleScopeReplacement::new("from", "planet")],
                ..RuleFieldScopeConstraint::default()
            },
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["who"]), &[]);
        assert!(!context.has_ambiguous_replacement());
        assert_eq!(
            context.resolve_alias("from"),
            AliasResolution::Scope("country".to_string())
        );
    }

    #[test]
    fn sibling_branch_constraints_do_not_leak() {
        let map = constraints(&[
            (
                &["branch_a"] as &[&str],
                RuleFieldScopeConstraint::pushing(&["country"]),
            ),
            (
                &["branch_b"] as &[&str],
                RuleFieldScopeConstraint::required(&["country"]),
            ),
        ]);
        let context = ScopeContext::build(Some(&map), &path(&["branch_b"]), &[]);
        assert_eq!(context.resolve_alias("this"), AliasResolution::Unresolved);
    }

    #[test]
    fn chain_resolution_walks_links() {
        let mut links = BTreeMap::new();
        links.insert(
            "owner".to_string(),
            LinkDefinition::new("owner", "country", &["state"]),
        );
        links.insert(
            "capital".to_string(),
            LinkDefinition::new("capital", "state", &["country", "state"]),
        );
        let known_scopes: BTreeSet<String> =
            ["country".to_string(), "state".to_string()].into();
        let value_memberships = MembershipsByKey::default();

        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::pushing(&["state"]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["target"]), &[]);
        let resolver = ScopeChainResolver {
            context: &context,
            known_scopes: &known_scopes,
            link_definitions: &links,
            value_memberships: &value_memberships,
        };

        assert_eq!(
            resolver.resolve("owner.capital"),
            ChainResolution::Scope("state".to_string())
        );
        assert_eq!(
            resolver.resolve("capital.owner"),
            ChainResolution::Scope("country".to_string())
        );
    }

    #[test]
    fn chain_resolution_rejects_wrong_input_scope() {
        let mut links = BTreeMap::new();
        links.insert(
            "owner".to_string(),
            LinkDefinition::new("owner", "country", &["state"]),
        );
        let known_scopes: BTreeSet<String> =
            ["country".to_string(), "state".to_string()].into();
        let value_memberships = MembershipsByKey::default();

        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::pushing(&["country"]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["target"]), &[]);
        let resolver = ScopeChainResolver {
            context: &context,
            known_scopes: &known_scopes,
            link_definitions: &links,
            value_memberships: &value_memberships,
        };

        assert_eq!(resolver.resolve("owner"), ChainResolution::Mismatch);
    }

    #[test]
    fn prefixed_links_validate_their_data_sources() {
        let mut links = BTreeMap::new();
        let mut var = LinkDefinition::new("var", "country", &["state"]);
        var.prefix = Some("var:".to_string());
        var.from_data = true;
        var.data_sources = vec!["value[variable]".to_string()];
        links.insert("var".to_string(), var);

        let known_scopes: BTreeSet<String> =
            ["country".to_string(), "state".to_string()].into();
        let mut value_memberships = MembershipsByKey::default();
        value_memberships.insert("variable".to_string(), ["foo".to_string()].into());

        let map = constraints(&[(
            &[] as &[&str],
            RuleFieldScopeConstraint::pushing(&["state"]),
        )]);
        let context = ScopeContext::build(Some(&map), &path(&["target"]), &[]);
        let resolver = ScopeChainResolver {
            context: &context,
            known_scopes: &known_scopes,
            link_definitions: &links,
            value_memberships: &value_memberships,
        };

        assert_eq!(
            resolver.resolve("var:foo"),
            ChainResolution::Scope("country".to_string())
        );
        assert_eq!(resolver.resolve("var:missing"), ChainResolution::Mismatch);
    }

    #[test]
    fn unknown_segments_leave_the_chain_unresolved() {
        let context = ScopeContext::default();
        let known_scopes = BTreeSet::new();
        let links = BTreeMap::new();
        let value_memberships = MembershipsByKey::default();
        let resolver = ScopeChainResolver {
            context: &context,
            known_scopes: &known_scopes,
            link_definitions: &links,
            value_memberships: &value_memberships,
        };
        assert_eq!(resolver.resolve("this"), ChainResolution::Unresolved);
        assert_eq!(resolver.resolve("TAG"), ChainResolution::Unresolved);
    }
}

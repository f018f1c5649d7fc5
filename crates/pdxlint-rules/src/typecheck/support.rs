//! Shared helpers for field-oriented type-check rules.

use std::collections::BTreeMap;

use pdxlint_core::analysis::{AnalysisFacts, FieldFact};
use pdxlint_core::ast::{AstScalar, AstValue};
use pdxlint_core::text::{TextRange, TextSize};

use crate::schema::{
    RuleFieldConstraint, SubtypeFieldConstraintsByObject, SubtypeMatcher,
};

/// One occurrence of an object-valued top-level key, with its field facts.
pub(crate) struct ObjectOccurrence<'a> {
    pub occurrence: usize,
    /// Immediate fields only (`path.len() == 2`).
    pub immediate: Vec<&'a FieldFact>,
    /// Every nested field fact of this occurrence.
    pub all: Vec<&'a FieldFact>,
}

/// Group `facts.all_field_facts` of `object_key` by object occurrence.
pub(crate) fn object_occurrences<'a>(
    facts: &'a AnalysisFacts,
    object_key: &str,
) -> Vec<ObjectOccurrence<'a>> {
    let mut by_occurrence: BTreeMap<usize, ObjectOccurrence<'a>> = BTreeMap::new();
    for fact in &facts.all_field_facts {
        if fact.object_key != object_key {
            continue;
        }
        let entry = by_occurrence
            .entry(fact.object_occurrence)
            .or_insert_with(|| ObjectOccurrence {
                occurrence: fact.object_occurrence,
                immediate: Vec::new(),
                all: Vec::new(),
            });
        if fact.path.len() == 2 {
            entry.immediate.push(fact);
        }
        entry.all.push(fact);
    }
    by_occurrence.into_values().collect()
}

/// Matchers that apply to this occurrence.
pub(crate) fn matched_subtypes<'a>(
    matchers: Option<&'a [SubtypeMatcher]>,
    object_key: &str,
    immediate: &[&FieldFact],
) -> Vec<&'a SubtypeMatcher> {
    let Some(matchers) = matchers else {
        return Vec::new();
    };
    matchers
        .iter()
        .filter(|matcher| subtype_matches(matcher, object_key, immediate))
        .collect()
}

fn subtype_matches(matcher: &SubtypeMatcher, object_key: &str, immediate: &[&FieldFact]) -> bool {
    if !matcher.type_key_filters.is_empty()
        && !matcher
            .type_key_filters
            .iter()
            .any(|filter| filter == object_key)
    {
        return false;
    }
    if let Some(prefix) = &matcher.starts_with
        && !object_key.starts_with(prefix.as_str())
    {
        return false;
    }

    matcher
        .expected_field_values
        .iter()
        .all(|(field, expected)| {
            immediate.iter().any(|fact| {
                fact.field_key == *field
                    && scalar_of(fact.value.as_ref())
                        .is_some_and(|scalar| strip_scalar_quotes(&scalar.raw_text) == expected)
            })
        })
}

/// Scopes pushed onto the root context by matched subtypes.
pub(crate) fn subtype_push_scopes(matched: &[&SubtypeMatcher]) -> Vec<String> {
    matched
        .iter()
        .flat_map(|matcher| matcher.push_scope.iter().cloned())
        .collect()
}

/// Base constraints overlaid with the constraints of matched subtypes.
pub(crate) fn effective_constraints(
    base: &BTreeMap<String, RuleFieldConstraint>,
    subtype_constraints: Option<&SubtypeFieldConstraintsByObject>,
    object_key: &str,
    matched: &[&SubtypeMatcher],
) -> BTreeMap<String, RuleFieldConstraint> {
    let mut combined = base.clone();
    let Some(by_object) = subtype_constraints else {
        return combined;
    };
    let Some(by_subtype) = by_object.get(object_key) else {
        return combined;
    };
    for matcher in matched {
        if let Some(fields) = by_subtype.get(&matcher.subtype_name) {
            for (field, constraint) in fields {
                combined.insert(field.clone(), constraint.clone());
            }
        }
    }
    combined
}

pub(crate) fn scalar_of(value: Option<&AstValue>) -> Option<&AstScalar> {
    match value {
        Some(AstValue::Scalar(scalar)) => Some(scalar),
        _ => None,
    }
}

pub(crate) fn strip_scalar_quotes(raw: &str) -> &str {
    let trimmed = raw.trim();
    let bytes = trimmed.as_bytes();
    if bytes.len() >= 2 && bytes[0] == b'"' && bytes[bytes.len() - 1] == b'"' {
        return &trimmed[1..trimmed.len() - 1];
    }
    trimmed
}

/// Range of the first `key=` occurrence, or an empty range at the start.
///
/// AST nodes do not carry ranges, so rules locate keys textually; sources
/// with spacing around the operator fall back to the empty range.
pub(crate) fn find_key_range(text: &str, key: &str) -> TextRange {
    find_key_occurrence_range(text, key, 0)
}

/// Range of the `occurrence`th `key=` occurrence, falling back to the first
/// occurrence and then to an empty range at the start.
pub(crate) fn find_key_occurrence_range(text: &str, key: &str, occurrence: usize) -> TextRange {
    let needle = format!("{key}=");
    let mut search_start = 0usize;
    let mut found: Option<usize> = None;

    for _ in 0..=occurrence {
        match text[search_start..].find(&needle) {
            Some(relative) => {
                let index = search_start + relative;
                found = Some(index);
                search_start = index + needle.len();
            }
            None => {
                return match first_occurrence(text, &needle) {
                    Some(index) => key_range_at(index, key),
                    None => TextRange::empty(TextSize::from(0)),
                };
            }
        }
    }

    match found {
        Some(index) => key_range_at(index, key),
        None => TextRange::empty(TextSize::from(0)),
    }
}

fn first_occurrence(text: &str, needle: &str) -> Option<usize> {
    text.find(needle)
}

fn key_range_at(index: usize, key: &str) -> TextRange {
    TextRange::at(TextSize::from(index as u32), TextSize::from(key.len() as u32))
}

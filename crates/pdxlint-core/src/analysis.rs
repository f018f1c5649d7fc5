//! Shared analysis facts built once from the AST.
//!
//! Facts are extracted in a single traversal and reused by the type-check
//! and lint engines. Only the first level of nested object blocks feeds the
//! immediate field index; deeper object-like blocks contribute to
//! `all_field_facts` with their full ancestor path.

use std::collections::BTreeSet;
use std::fmt;

use indexmap::IndexMap;

use crate::ast::{AstBlock, AstSourceFile, AstStatement, AstValue};

/// Shape taken by one value position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ValueShape {
    Missing,
    Scalar,
    Block,
    Tagged,
    Error,
}

impl fmt::Display for ValueShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueShape::Missing => "missing",
            ValueShape::Scalar => "scalar",
            ValueShape::Block => "block",
            ValueShape::Tagged => "tagged",
            ValueShape::Error => "error",
        };
        write!(f, "{name}")
    }
}

/// One nested object field, with its ancestor path and occurrence indexes.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFact {
    /// Top-level key of the enclosing object.
    pub object_key: String,
    pub field_key: String,
    /// Full key path starting at the top-level key.
    pub path: Vec<String>,
    pub value: Option<AstValue>,
    /// Position of this object among all occurrences of its top-level key.
    pub object_occurrence: usize,
    /// Position of this field key within its particular object block.
    pub field_occurrence: usize,
}

/// Facts extracted once from the AST and shared by every engine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalysisFacts {
    /// Top-level key → ordered values (repeats preserved).
    pub top_level_values: IndexMap<String, Vec<Option<AstValue>>>,
    /// Top-level key → set of shapes its values take.
    pub top_level_shapes: IndexMap<String, BTreeSet<ValueShape>>,
    /// Top-level key → immediate field facts of its object-valued occurrences.
    pub object_fields: IndexMap<String, Vec<FieldFact>>,
    /// Top-level key → field key → immediate field facts.
    pub object_field_map: IndexMap<String, IndexMap<String, Vec<FieldFact>>>,
    /// Every nested field fact, recursively, with full ancestor paths.
    pub all_field_facts: Vec<FieldFact>,
}

/// Build facts from a lowered source file.
pub fn build_analysis_facts(source_file: &AstSourceFile) -> AnalysisFacts {
    let mut facts = AnalysisFacts::default();
    let mut object_occurrences: IndexMap<String, usize> = IndexMap::new();

    for statement in source_file.statements.iter() {
        let AstStatement::KeyValue(key_value) = statement else {
            continue;
        };

        let key = key_value.key.raw_text.clone();
        let object_occurrence = *object_occurrences
            .entry(key.clone())
            .and_modify(|count| *count += 1)
            .or_insert(0);

        facts
            .top_level_values
            .entry(key.clone())
            .or_default()
            .push(key_value.value.clone());
        facts
            .top_level_shapes
            .entry(key.clone())
            .or_default()
            .insert(shape_for_value(key_value.value.as_ref()));

        let field_facts =
            extract_object_field_facts(&key, object_occurrence, key_value.value.as_ref());
        if field_facts.is_empty() {
            continue;
        }

        let immediate: Vec<FieldFact> = field_facts
            .iter()
            .filter(|fact| fact.path.len() == 2)
            .cloned()
            .collect();
        if !immediate.is_empty() {
            facts
                .object_fields
                .entry(key.clone())
                .or_default()
                .extend(immediate.iter().cloned());
            let grouped = facts.object_field_map.entry(key.clone()).or_default();
            for fact in &immediate {
                grouped
                    .entry(fact.field_key.clone())
                    .or_default()
                    .push(fact.clone());
            }
        }
        facts.all_field_facts.extend(field_facts);
    }

    facts
}

fn shape_for_value(value: Option<&AstValue>) -> ValueShape {
    match value {
        None => ValueShape::Missing,
        Some(AstValue::Scalar(_)) => ValueShape::Scalar,
        Some(AstValue::Block(_)) => ValueShape::Block,
        Some(AstValue::Tagged(_)) => ValueShape::Tagged,
    }
}

fn extract_object_field_facts(
    object_key: &str,
    object_occurrence: usize,
    value: Option<&AstValue>,
) -> Vec<FieldFact> {
    let Some(AstValue::Block(block)) = value else {
        return Vec::new();
    };
    if !block.is_object_like() {
        return Vec::new();
    }
    collect_field_facts_recursive(
        object_key,
        object_occurrence,
        block,
        &[object_key.to_string()],
    )
}

fn collect_field_facts_recursive(
    object_key: &str,
    object_occurrence: usize,
    block: &AstBlock,
    parent_path: &[String],
) -> Vec<FieldFact> {
    let mut field_occurrences: IndexMap<String, usize> = IndexMap::new();
    let mut field_facts = Vec::new();

    for statement in block.statements.iter() {
        let AstStatement::KeyValue(key_value) = statement else {
            continue;
        };

        let field_key = key_value.key.raw_text.clone();
        let field_occurrence = *field_occurrences
            .entry(field_key.clone())
            .and_modify(|count| *count += 1)
            .or_insert(0);

        let mut path = parent_path.to_vec();
        path.push(field_key.clone());

        field_facts.push(FieldFact {
            object_key: object_key.to_string(),
            field_key: field_key.clone(),
            path: path.clone(),
            value: key_value.value.clone(),
            object_occurrence,
            field_occurrence,
        });

        if let Some(AstValue::Block(nested)) = &key_value.value
            && nested.is_object_like()
        {
            field_facts.extend(collect_field_facts_recursive(
                object_key,
                object_occurrence,
                nested,
                &path,
            ));
        }
    }

    field_facts
}

//! Typed AST for Jomini source, lowered from the red tree.
//!
//! Statement order is preserved everywhere. Blocks are classified by shape
//! (object-like / array-like / mixed / empty-ambiguous) at query time; the
//! conversions reject mixed blocks by returning `None`.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::cst::JominiSyntaxKind;

/// Scalar value preserved as raw CST token text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstScalar {
    pub raw_text: String,
    /// Kinds of the glued tokens this scalar was built from.
    pub token_kinds: Vec<JominiSyntaxKind>,
    pub was_quoted: bool,
}

/// Externally tagged block value, e.g. `rgb { 100 200 150 }`.
#[derive(Debug, Clone, PartialEq)]
pub struct AstTaggedBlockValue {
    pub tag: AstScalar,
    pub block: AstBlock,
}

/// Key-value statement with optional operator (implicit block assignment
/// has none).
#[derive(Debug, Clone, PartialEq)]
pub struct AstKeyValue {
    pub key: AstScalar,
    pub operator: Option<String>,
    pub value: Option<AstValue>,
}

/// Recoverable parse fragment retained during lowering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AstError {
    pub raw_text: String,
}

/// A value position: scalar, block, or tagged block.
#[derive(Debug, Clone, PartialEq)]
pub enum AstValue {
    Scalar(AstScalar),
    Block(AstBlock),
    Tagged(AstTaggedBlockValue),
}

/// A statement position: key-value, bare scalar, nested block, or error.
#[derive(Debug, Clone, PartialEq)]
pub enum AstStatement {
    KeyValue(AstKeyValue),
    Scalar(AstScalar),
    Block(AstBlock),
    Error(AstError),
}

/// Object view of a block: key → last value.
pub type AstObject = IndexMap<String, Option<AstValue>>;

/// Multimap view of a block: key → every value in insertion order.
pub type AstObjectMultimap = IndexMap<String, Vec<Option<AstValue>>>;

/// Block statement/value preserving statement order.
#[derive(Debug, Clone, PartialEq)]
pub struct AstBlock {
    pub statements: Arc<[AstStatement]>,
}

impl AstBlock {
    pub fn new(statements: impl Into<Arc<[AstStatement]>>) -> Self {
        Self {
            statements: statements.into(),
        }
    }

    pub fn empty() -> Self {
        Self {
            statements: Arc::from([]),
        }
    }

    /// Zero statements: could be read as either an object or an array.
    pub fn is_empty_ambiguous(&self) -> bool {
        self.statements.is_empty()
    }

    /// Every statement is a key-value.
    pub fn is_object_like(&self) -> bool {
        !self.is_empty_ambiguous()
            && self
                .statements
                .iter()
                .all(|statement| matches!(statement, AstStatement::KeyValue(_)))
    }

    /// Every statement is an array-style element (scalar or block).
    pub fn is_array_like(&self) -> bool {
        !self.is_empty_ambiguous()
            && self
                .statements
                .iter()
                .all(|statement| {
                    matches!(statement, AstStatement::Scalar(_) | AstStatement::Block(_))
                })
    }

    /// Key-values and array-style elements coexist.
    pub fn is_mixed(&self) -> bool {
        if self.is_empty_ambiguous() {
            return false;
        }
        let has_key_values = self
            .statements
            .iter()
            .any(|statement| matches!(statement, AstStatement::KeyValue(_)));
        let has_array_values = self
            .statements
            .iter()
            .any(|statement| {
                matches!(statement, AstStatement::Scalar(_) | AstStatement::Block(_))
            });
        has_key_values && has_array_values
    }

    /// Object conversion; repeated keys keep the last occurrence.
    ///
    /// `None` unless the block is object-like or empty.
    pub fn to_object(&self) -> Option<AstObject> {
        if !(self.is_object_like() || self.is_empty_ambiguous()) {
            return None;
        }
        let mut object = AstObject::new();
        for statement in self.statements.iter() {
            if let AstStatement::KeyValue(key_value) = statement {
                object.insert(key_value.key.raw_text.clone(), key_value.value.clone());
            }
        }
        Some(object)
    }

    /// Object conversion preserving every occurrence in insertion order.
    pub fn to_object_multimap(&self) -> Option<AstObjectMultimap> {
        if !(self.is_object_like() || self.is_empty_ambiguous()) {
            return None;
        }
        let mut multimap = AstObjectMultimap::new();
        for statement in self.statements.iter() {
            if let AstStatement::KeyValue(key_value) = statement {
                multimap
                    .entry(key_value.key.raw_text.clone())
                    .or_default()
                    .push(key_value.value.clone());
            }
        }
        Some(multimap)
    }

    /// Array conversion; `None` unless the block is array-like or empty.
    pub fn to_array(&self) -> Option<Vec<AstValue>> {
        if !(self.is_array_like() || self.is_empty_ambiguous()) {
            return None;
        }
        let mut array = Vec::with_capacity(self.statements.len());
        for statement in self.statements.iter() {
            match statement {
                AstStatement::Scalar(scalar) => array.push(AstValue::Scalar(scalar.clone())),
                AstStatement::Block(block) => array.push(AstValue::Block(block.clone())),
                _ => return None,
            }
        }
        Some(array)
    }
}

/// The lowered source file.
#[derive(Debug, Clone, PartialEq)]
pub struct AstSourceFile {
    pub statements: Arc<[AstStatement]>,
}

impl AstSourceFile {
    pub fn new(statements: impl Into<Arc<[AstStatement]>>) -> Self {
        Self {
            statements: statements.into(),
        }
    }
}

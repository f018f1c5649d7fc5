//! Consumer views over AST blocks.

use crate::ast::model::{AstBlock, AstObject, AstObjectMultimap, AstScalar, AstValue};
use crate::ast::scalar::{ScalarInterpretation, interpret_scalar};

/// Explicit consumer view over an [`AstBlock`].
///
/// Shape queries and conversions delegate to the block; scalar getters add
/// interpretation with an explicit opt-in for quoted scalars.
#[derive(Debug, Clone, PartialEq)]
pub struct AstBlockView {
    block: AstBlock,
}

impl AstBlockView {
    pub fn new(block: AstBlock) -> Self {
        Self { block }
    }

    pub fn block(&self) -> &AstBlock {
        &self.block
    }

    pub fn is_empty_ambiguous(&self) -> bool {
        self.block.is_empty_ambiguous()
    }

    pub fn is_object_like(&self) -> bool {
        self.block.is_object_like()
    }

    pub fn is_array_like(&self) -> bool {
        self.block.is_array_like()
    }

    pub fn is_mixed(&self) -> bool {
        self.block.is_mixed()
    }

    pub fn as_object(&self) -> Option<AstObject> {
        self.block.to_object()
    }

    pub fn as_multimap(&self) -> Option<AstObjectMultimap> {
        self.block.to_object_multimap()
    }

    pub fn as_array(&self) -> Option<Vec<AstValue>> {
        self.block.to_array()
    }

    /// Interpret the scalar value of `key` (last occurrence wins).
    pub fn get_scalar(&self, key: &str, allow_quoted: bool) -> Option<ScalarInterpretation> {
        let object = self.as_object()?;
        let scalar = as_scalar(object.get(key)?)?;
        Some(interpret_from_scalar(scalar, allow_quoted))
    }

    /// Interpret every scalar value of `key` in insertion order.
    pub fn get_scalar_all(&self, key: &str, allow_quoted: bool) -> Vec<ScalarInterpretation> {
        let Some(multimap) = self.as_multimap() else {
            return Vec::new();
        };
        multimap
            .get(key)
            .into_iter()
            .flatten()
            .filter_map(|value| as_scalar(value))
            .map(|scalar| interpret_from_scalar(scalar, allow_quoted))
            .collect()
    }
}

fn as_scalar(value: &Option<AstValue>) -> Option<&AstScalar> {
    match value {
        Some(AstValue::Scalar(scalar)) => Some(scalar),
        _ => None,
    }
}

fn interpret_from_scalar(scalar: &AstScalar, allow_quoted: bool) -> ScalarInterpretation {
    let text = if scalar.was_quoted && allow_quoted {
        strip_matching_quotes(&scalar.raw_text)
    } else {
        scalar.raw_text.as_str()
    };
    interpret_scalar(text, scalar.was_quoted, allow_quoted)
}

fn strip_matching_quotes(text: &str) -> &str {
    let bytes = text.as_bytes();
    if bytes.len() >= 2 && (bytes[0] == b'"' || bytes[0] == b'\'') && bytes[bytes.len() - 1] == bytes[0]
    {
        return &text[1..text.len() - 1];
    }
    text
}

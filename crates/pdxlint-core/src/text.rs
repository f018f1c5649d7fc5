//! Text primitives used across the lexer, parser, and CST.
//!
//! Offsets are byte offsets into UTF-8 source text. Ranges are half-open
//! `[start, end)` pairs. Both come from `biome_text_size`, which provides
//! checked arithmetic, containment, intersection, and cover operations.

pub use biome_text_size::{TextLen, TextRange, TextSize};

/// Slice the source text covered by `range`.
///
/// Ranges produced by the lexer always fall on UTF-8 boundaries, so plain
/// indexing is safe here.
pub fn slice_text_range(source: &str, range: TextRange) -> &str {
    &source[usize::from(range.start())..usize::from(range.end())]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slice_returns_covered_text() {
        let source = "a = 1\n";
        let range = TextRange::new(TextSize::from(4), TextSize::from(5));
        assert_eq!(slice_text_range(source, range), "1");
    }

    #[test]
    fn empty_range_slices_to_empty_text() {
        let range = TextRange::empty(TextSize::from(3));
        assert_eq!(slice_text_range("abcdef", range), "");
    }
}

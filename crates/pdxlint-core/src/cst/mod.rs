//! Concrete syntax tree: green (immutable persistent) storage and red
//! (parent-pointed, offset-resolved) views.
//!
//! The green tree stores per-token leading and trailing trivia, which gives
//! the lossless property: concatenating every token's full text in tree
//! order reproduces the source byte for byte. Green values are `Arc`-shared
//! and may back any number of red trees; red trees are single-owner views
//! used for navigation and AST lowering.

mod green;
mod red;
mod syntax_kind;

pub use green::{GreenElement, GreenNode, GreenToken, TreeBuilder};
pub use red::{SyntaxElement, SyntaxNode, SyntaxToken, SyntaxTriviaPiece, from_green};
pub use syntax_kind::JominiSyntaxKind;

//! Immutable persistent green tree.
//!
//! Green nodes and tokens are `Arc`-shared values with no parent pointers,
//! so a single green tree can back any number of red views and be shared
//! across threads. A token stores its full text (leading trivia + token +
//! trailing trivia) together with the trivia piece lengths that partition
//! it; concatenating every token's full text in tree order reproduces the
//! original source exactly.

use std::sync::Arc;

use crate::cst::JominiSyntaxKind;
use crate::lexer::TriviaPiece;
use crate::text::{TextLen, TextSize};

#[derive(Debug, PartialEq, Eq)]
struct GreenTokenData {
    kind: JominiSyntaxKind,
    /// Leading trivia + token text + trailing trivia.
    full_text: Box<str>,
    leading: Box<[TriviaPiece]>,
    trailing: Box<[TriviaPiece]>,
}

/// An immutable token with its attached trivia.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenToken {
    data: Arc<GreenTokenData>,
}

impl GreenToken {
    pub fn new(
        kind: JominiSyntaxKind,
        full_text: &str,
        leading: &[TriviaPiece],
        trailing: &[TriviaPiece],
    ) -> Self {
        Self {
            data: Arc::new(GreenTokenData {
                kind,
                full_text: full_text.into(),
                leading: leading.into(),
                trailing: trailing.into(),
            }),
        }
    }

    pub fn kind(&self) -> JominiSyntaxKind {
        self.data.kind
    }

    /// The token's own text, trivia excluded.
    pub fn text(&self) -> &str {
        let start = usize::from(self.leading_len());
        let end = usize::from(self.full_len() - self.trailing_len());
        &self.data.full_text[start..end]
    }

    /// Leading trivia + token text + trailing trivia.
    pub fn full_text(&self) -> &str {
        &self.data.full_text
    }

    pub fn leading_trivia(&self) -> &[TriviaPiece] {
        &self.data.leading
    }

    pub fn trailing_trivia(&self) -> &[TriviaPiece] {
        &self.data.trailing
    }

    /// Length of the token's own text.
    pub fn text_len(&self) -> TextSize {
        self.full_len() - self.leading_len() - self.trailing_len()
    }

    pub fn leading_len(&self) -> TextSize {
        trivia_len(&self.data.leading)
    }

    pub fn trailing_len(&self) -> TextSize {
        trivia_len(&self.data.trailing)
    }

    /// Length including trivia.
    pub fn full_len(&self) -> TextSize {
        self.data.full_text.text_len()
    }
}

#[derive(Debug, PartialEq, Eq)]
struct GreenNodeData {
    kind: JominiSyntaxKind,
    text_len: TextSize,
    children: Box<[GreenElement]>,
}

/// An immutable interior node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GreenNode {
    data: Arc<GreenNodeData>,
}

impl GreenNode {
    pub fn new(kind: JominiSyntaxKind, children: Vec<GreenElement>) -> Self {
        let text_len = children
            .iter()
            .fold(TextSize::from(0), |len, child| len + child.full_len());
        Self {
            data: Arc::new(GreenNodeData {
                kind,
                text_len,
                children: children.into(),
            }),
        }
    }

    pub fn kind(&self) -> JominiSyntaxKind {
        self.data.kind
    }

    pub fn children(&self) -> &[GreenElement] {
        &self.data.children
    }

    /// Total covered length, trivia included.
    pub fn text_len(&self) -> TextSize {
        self.data.text_len
    }

    /// Reconstruct the covered text, trivia included.
    pub fn text(&self) -> String {
        let mut out = String::with_capacity(usize::from(self.text_len()));
        collect_text(self, &mut out);
        out
    }
}

fn collect_text(node: &GreenNode, out: &mut String) {
    for child in node.children() {
        match child {
            GreenElement::Node(node) => collect_text(node, out),
            GreenElement::Token(token) => out.push_str(token.full_text()),
        }
    }
}

/// Either child of a green node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GreenElement {
    Node(GreenNode),
    Token(GreenToken),
}

impl GreenElement {
    pub fn kind(&self) -> JominiSyntaxKind {
        match self {
            GreenElement::Node(node) => node.kind(),
            GreenElement::Token(token) => token.kind(),
        }
    }

    pub fn full_len(&self) -> TextSize {
        match self {
            GreenElement::Node(node) => node.text_len(),
            GreenElement::Token(token) => token.full_len(),
        }
    }
}

fn trivia_len(pieces: &[TriviaPiece]) -> TextSize {
    pieces
        .iter()
        .fold(TextSize::from(0), |len, piece| len + piece.length)
}

/// Builds a green tree from `start_node` / `token_with_trivia` /
/// `finish_node` events.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    stack: Vec<(JominiSyntaxKind, Vec<GreenElement>)>,
    roots: Vec<GreenElement>,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_node(&mut self, kind: JominiSyntaxKind) {
        self.stack.push((kind, Vec::new()));
    }

    pub fn token_with_trivia(
        &mut self,
        kind: JominiSyntaxKind,
        full_text: &str,
        leading: &[TriviaPiece],
        trailing: &[TriviaPiece],
    ) {
        let token = GreenToken::new(kind, full_text, leading, trailing);
        self.push_element(GreenElement::Token(token));
    }

    pub fn finish_node(&mut self) {
        let (kind, children) = self
            .stack
            .pop()
            .expect("finish_node called with empty builder stack");
        let node = GreenNode::new(kind, children);
        self.push_element(GreenElement::Node(node));
    }

    /// Finish the tree, wrapping everything in a `Root` node unless the
    /// single root already is one.
    pub fn finish(mut self) -> GreenNode {
        assert!(
            self.stack.is_empty(),
            "cannot finish tree: unclosed nodes remain on the builder stack"
        );

        if self.roots.len() == 1
            && let GreenElement::Node(node) = &self.roots[0]
            && node.kind() == JominiSyntaxKind::Root
        {
            return node.clone();
        }

        GreenNode::new(JominiSyntaxKind::Root, std::mem::take(&mut self.roots))
    }

    fn push_element(&mut self, element: GreenElement) {
        match self.stack.last_mut() {
            Some((_, children)) => children.push(element),
            None => self.roots.push(element),
        }
    }
}

//! Red tree: parent-pointed, offset-resolved views over the green tree.
//!
//! Red nodes are cheap `Rc` handles; parents are weak references so the
//! tree forms no ownership cycle. Every offset is resolved eagerly from
//! green lengths, so navigation never re-walks the tree. Multiple red trees
//! may be built over the same green tree.

use std::rc::{Rc, Weak};

use once_cell::unsync::OnceCell;

use crate::cst::green::{GreenElement, GreenNode, GreenToken};
use crate::cst::syntax_kind::JominiSyntaxKind;
use crate::lexer::TriviaKind;
use crate::text::{TextRange, TextSize};

/// A trivia piece with its text resolved from the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxTriviaPiece {
    pub kind: TriviaKind,
    pub text: String,
}

struct TokenData {
    kind: JominiSyntaxKind,
    green: GreenToken,
    parent: Weak<NodeData>,
    index_in_parent: usize,
    /// Offset of the token's leading trivia.
    full_start: TextSize,
}

/// A token view carrying absolute offsets and resolved trivia.
#[derive(Clone)]
pub struct SyntaxToken {
    data: Rc<TokenData>,
}

impl SyntaxToken {
    pub fn kind(&self) -> JominiSyntaxKind {
        self.data.kind
    }

    /// The token's own text, trivia excluded.
    pub fn text_trimmed(&self) -> &str {
        self.data.green.text()
    }

    /// The token text including its leading and trailing trivia.
    pub fn text_with_trivia(&self) -> &str {
        self.data.green.full_text()
    }

    /// Start offset including leading trivia.
    pub fn start(&self) -> TextSize {
        self.data.full_start
    }

    /// End offset including trailing trivia.
    pub fn end(&self) -> TextSize {
        self.data.full_start + self.data.green.full_len()
    }

    /// Start offset of the token proper.
    pub fn token_start(&self) -> TextSize {
        self.data.full_start + self.data.green.leading_len()
    }

    /// End offset of the token proper.
    pub fn token_end(&self) -> TextSize {
        self.token_start() + self.data.green.text_len()
    }

    /// Range of the token proper.
    pub fn range(&self) -> TextRange {
        TextRange::new(self.token_start(), self.token_end())
    }

    /// Range including trivia.
    pub fn range_with_trivia(&self) -> TextRange {
        TextRange::new(self.start(), self.end())
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        self.data.parent.upgrade().map(|data| SyntaxNode { data })
    }

    pub fn index_in_parent(&self) -> usize {
        self.data.index_in_parent
    }

    pub fn leading_trivia(&self) -> Vec<SyntaxTriviaPiece> {
        resolve_trivia(
            self.data.green.leading_trivia(),
            self.text_with_trivia(),
            TextSize::from(0),
        )
    }

    pub fn trailing_trivia(&self) -> Vec<SyntaxTriviaPiece> {
        resolve_trivia(
            self.data.green.trailing_trivia(),
            self.text_with_trivia(),
            self.data.green.leading_len() + self.data.green.text_len(),
        )
    }
}

impl PartialEq for SyntaxToken {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for SyntaxToken {}

impl std::fmt::Debug for SyntaxToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{:?} {:?}", self.kind(), self.range(), self.text_trimmed())
    }
}

fn resolve_trivia(
    pieces: &[crate::lexer::TriviaPiece],
    full_text: &str,
    start: TextSize,
) -> Vec<SyntaxTriviaPiece> {
    let mut out = Vec::with_capacity(pieces.len());
    let mut offset = usize::from(start);
    for piece in pieces {
        let end = offset + usize::from(piece.length);
        out.push(SyntaxTriviaPiece {
            kind: piece.kind,
            text: full_text[offset..end].to_string(),
        });
        offset = end;
    }
    out
}

struct NodeData {
    kind: JominiSyntaxKind,
    parent: Weak<NodeData>,
    index_in_parent: usize,
    source: Rc<str>,
    range: TextRange,
    children: OnceCell<Box<[SyntaxElement]>>,
}

/// A node view with absolute offsets and parent/sibling navigation.
#[derive(Clone)]
pub struct SyntaxNode {
    data: Rc<NodeData>,
}

impl SyntaxNode {
    pub fn kind(&self) -> JominiSyntaxKind {
        self.data.kind
    }

    /// Covered range, trivia included.
    pub fn range(&self) -> TextRange {
        self.data.range
    }

    pub fn start(&self) -> TextSize {
        self.data.range.start()
    }

    pub fn end(&self) -> TextSize {
        self.data.range.end()
    }

    /// Covered source text, trivia included.
    pub fn text(&self) -> &str {
        &self.data.source[usize::from(self.start())..usize::from(self.end())]
    }

    pub fn parent(&self) -> Option<SyntaxNode> {
        self.data.parent.upgrade().map(|data| SyntaxNode { data })
    }

    pub fn index_in_parent(&self) -> usize {
        self.data.index_in_parent
    }

    pub fn children(&self) -> &[SyntaxElement] {
        self.data.children.get().map_or(&[], |children| children)
    }

    pub fn child_nodes(&self) -> impl Iterator<Item = &SyntaxNode> {
        self.children().iter().filter_map(SyntaxElement::as_node)
    }

    pub fn child_tokens(&self) -> impl Iterator<Item = &SyntaxToken> {
        self.children().iter().filter_map(SyntaxElement::as_token)
    }

    /// All tokens beneath this node, in source order.
    pub fn descendant_tokens(&self) -> Vec<SyntaxToken> {
        let mut tokens = Vec::new();
        fn walk(node: &SyntaxNode, tokens: &mut Vec<SyntaxToken>) {
            for child in node.children() {
                match child {
                    SyntaxElement::Node(node) => walk(node, tokens),
                    SyntaxElement::Token(token) => tokens.push(token.clone()),
                }
            }
        }
        walk(self, &mut tokens);
        tokens
    }

    pub fn next_sibling(&self) -> Option<SyntaxElement> {
        let parent = self.parent()?;
        parent
            .children()
            .get(self.data.index_in_parent + 1)
            .cloned()
    }

    pub fn prev_sibling(&self) -> Option<SyntaxElement> {
        if self.data.index_in_parent == 0 {
            return None;
        }
        let parent = self.parent()?;
        parent
            .children()
            .get(self.data.index_in_parent - 1)
            .cloned()
    }
}

impl PartialEq for SyntaxNode {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.data, &other.data)
    }
}

impl Eq for SyntaxNode {}

impl std::fmt::Debug for SyntaxNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}@{:?}", self.kind(), self.range())
    }
}

/// Either child of a red node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyntaxElement {
    Node(SyntaxNode),
    Token(SyntaxToken),
}

impl SyntaxElement {
    pub fn kind(&self) -> JominiSyntaxKind {
        match self {
            SyntaxElement::Node(node) => node.kind(),
            SyntaxElement::Token(token) => token.kind(),
        }
    }

    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxElement::Node(node) => Some(node),
            SyntaxElement::Token(_) => None,
        }
    }

    pub fn as_token(&self) -> Option<&SyntaxToken> {
        match self {
            SyntaxElement::Token(token) => Some(token),
            SyntaxElement::Node(_) => None,
        }
    }
}

/// Materialize a red tree over `root`.
pub fn from_green(root: &GreenNode, source: &str) -> SyntaxNode {
    build_node(root, Weak::new(), 0, &Rc::from(source), TextSize::from(0))
}

fn build_node(
    green: &GreenNode,
    parent: Weak<NodeData>,
    index_in_parent: usize,
    source: &Rc<str>,
    start: TextSize,
) -> SyntaxNode {
    let data = Rc::new(NodeData {
        kind: green.kind(),
        parent,
        index_in_parent,
        source: source.clone(),
        range: TextRange::at(start, green.text_len()),
        children: OnceCell::new(),
    });

    let mut children = Vec::with_capacity(green.children().len());
    let mut offset = start;
    for (index, child) in green.children().iter().enumerate() {
        match child {
            GreenElement::Node(node) => {
                let red = build_node(node, Rc::downgrade(&data), index, source, offset);
                offset += node.text_len();
                children.push(SyntaxElement::Node(red));
            }
            GreenElement::Token(token) => {
                let red = SyntaxToken {
                    data: Rc::new(TokenData {
                        kind: token.kind(),
                        green: token.clone(),
                        parent: Rc::downgrade(&data),
                        index_in_parent: index,
                        full_start: offset,
                    }),
                };
                offset += token.full_len();
                children.push(SyntaxElement::Token(red));
            }
        }
    }

    let _ = data.children.set(children.into_boxed_slice());
    SyntaxNode { data }
}

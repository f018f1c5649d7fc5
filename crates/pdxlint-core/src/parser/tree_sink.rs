//! Lossless tree sink: parser events + recorded trivia → green tree.

use crate::cst::{GreenNode, JominiSyntaxKind, TreeBuilder};
use crate::diagnostics::Diagnostic;
use crate::lexer::{Trivia, TriviaPiece};
use crate::parser::event::TreeSink;
use crate::text::{TextLen, TextSize};

/// A finished green tree together with its parse diagnostics.
#[derive(Debug, Clone)]
pub struct ParsedGreenTree {
    pub root: GreenNode,
    pub diagnostics: Vec<Diagnostic>,
}

/// Converts parser events and trivia ownership into a green CST.
///
/// Leading trivia is everything between the previous token's trailing trivia
/// and the token itself; trailing trivia runs until ownership flips at a
/// newline. If the event stream never emitted EOF, the sink synthesizes one
/// whose text absorbs any residual bytes, keeping the tree lossless even
/// when recovery stopped consuming tokens early.
pub struct LosslessTreeSink<'src> {
    text: &'src str,
    trivia: Vec<Trivia>,
    text_pos: TextSize,
    trivia_pos: usize,
    parents_count: usize,
    errors: Vec<Diagnostic>,
    builder: TreeBuilder,
    needs_eof: bool,
    trivia_pieces: Vec<TriviaPiece>,
}

impl<'src> LosslessTreeSink<'src> {
    pub fn new(text: &'src str, trivia: Vec<Trivia>) -> Self {
        Self {
            text,
            trivia,
            text_pos: TextSize::from(0),
            trivia_pos: 0,
            parents_count: 0,
            errors: Vec::new(),
            builder: TreeBuilder::new(),
            needs_eof: true,
            trivia_pieces: Vec::new(),
        }
    }

    pub fn finish(self) -> ParsedGreenTree {
        ParsedGreenTree {
            root: self.builder.finish(),
            diagnostics: self.errors,
        }
    }

    fn do_token(&mut self, kind: JominiSyntaxKind, token_end: TextSize) {
        if kind == JominiSyntaxKind::Eof {
            self.needs_eof = false;
        }

        let full_start = self.text_pos;

        // Attach all trivia up to the token start as leading.
        self.eat_trivia(false, token_end);
        let trailing_start = self.trivia_pieces.len();

        self.text_pos = token_end;

        // Attach trailing trivia until ownership flips.
        self.eat_trivia(true, token_end);

        let full_text = &self.text[usize::from(full_start)..usize::from(self.text_pos)];
        let leading = &self.trivia_pieces[..trailing_start];
        let trailing = &self.trivia_pieces[trailing_start..];
        self.builder.token_with_trivia(kind, full_text, leading, trailing);
        self.trivia_pieces.clear();
    }

    fn eat_trivia(&mut self, trailing: bool, token_end: TextSize) {
        while let Some(trivia) = self.trivia.get(self.trivia_pos).copied() {
            if trivia.trailing != trailing {
                break;
            }
            if self.text_pos != trivia.range.start() {
                break;
            }
            if !trailing && trivia.range.end() > token_end {
                break;
            }

            self.trivia_pieces
                .push(TriviaPiece::new(trivia.kind, trivia.range.len()));
            self.text_pos = trivia.range.end();
            self.trivia_pos += 1;
        }
    }
}

impl TreeSink for LosslessTreeSink<'_> {
    fn token(&mut self, kind: JominiSyntaxKind, end: TextSize) {
        self.do_token(kind, end);
    }

    fn start_node(&mut self, kind: JominiSyntaxKind) {
        self.builder.start_node(kind);
        self.parents_count += 1;
    }

    fn finish_node(&mut self) {
        assert!(
            self.parents_count > 0,
            "finish_node called more often than start_node"
        );
        self.parents_count -= 1;

        if self.parents_count == 0 && self.needs_eof {
            self.do_token(JominiSyntaxKind::Eof, self.text.text_len());
        }

        self.builder.finish_node();
    }

    fn errors(&mut self, errors: Vec<Diagnostic>) {
        self.errors = errors;
    }
}

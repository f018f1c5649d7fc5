//! Buffered lookahead on top of the lexer.
//!
//! Lookahead is stored as lexer checkpoints, which lets the buffered lexer
//! both answer `nth_non_trivia` queries and rewind precisely. A non-regular
//! [`LexContext`] clears the buffer so that context-sensitive relexing never
//! observes stale tokens.

use std::collections::VecDeque;

use crate::diagnostics::Diagnostic;
use crate::lexer::lexer::{Lexer, LexerCheckpoint};
use crate::lexer::token::{TokenFlags, TokenKind};
use crate::text::TextRange;

/// Lexing context toggle.
///
/// A non-regular context invalidates buffered lookahead before the next pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LexContext {
    regular: bool,
}

impl LexContext {
    pub fn regular() -> Self {
        Self { regular: true }
    }

    pub fn non_regular() -> Self {
        Self { regular: false }
    }

    pub fn is_regular(self) -> bool {
        self.regular
    }
}

impl Default for LexContext {
    fn default() -> Self {
        Self::regular()
    }
}

/// A token observed through lookahead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookaheadToken {
    pub kind: TokenKind,
    pub flags: TokenFlags,
    pub range: TextRange,
}

impl LookaheadToken {
    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    fn from_checkpoint(checkpoint: &LexerCheckpoint) -> Self {
        Self {
            kind: checkpoint.current_kind,
            flags: checkpoint.current_flags,
            range: checkpoint.current_range(),
        }
    }
}

/// Checkpoint queues for all tokens and for non-trivia tokens only.
#[derive(Debug, Default)]
struct Lookahead {
    all: VecDeque<LexerCheckpoint>,
    non_trivia: VecDeque<LexerCheckpoint>,
}

impl Lookahead {
    fn is_empty(&self) -> bool {
        self.all.is_empty()
    }

    fn push_back(&mut self, checkpoint: LexerCheckpoint) {
        if !checkpoint.current_kind.is_trivia() {
            self.non_trivia.push_back(checkpoint);
        }
        self.all.push_back(checkpoint);
    }

    fn pop_front(&mut self) -> Option<LexerCheckpoint> {
        let checkpoint = self.all.pop_front()?;
        if !checkpoint.current_kind.is_trivia() {
            self.non_trivia.pop_front();
        }
        Some(checkpoint)
    }

    fn non_trivia_get(&self, index: usize) -> Option<&LexerCheckpoint> {
        self.non_trivia.get(index)
    }

    fn non_trivia_len(&self) -> usize {
        self.non_trivia.len()
    }

    fn clear(&mut self) {
        self.all.clear();
        self.non_trivia.clear();
    }
}

/// Lexer wrapper providing non-trivia lookahead.
pub struct BufferedLexer<'src> {
    inner: Lexer<'src>,
    /// Checkpoint of the current token while the inner lexer is ahead of it.
    current_checkpoint: Option<LexerCheckpoint>,
    lookahead: Lookahead,
}

impl<'src> BufferedLexer<'src> {
    pub fn new(inner: Lexer<'src>) -> Self {
        Self {
            inner,
            current_checkpoint: None,
            lookahead: Lookahead::default(),
        }
    }

    pub fn source(&self) -> &'src str {
        self.inner.source()
    }

    /// Advance to the next token and return its kind.
    pub fn next_token(&mut self, context: LexContext) -> TokenKind {
        if !context.is_regular() {
            self.reset_lookahead();
        } else if let Some(next_checkpoint) = self.lookahead.pop_front() {
            if self.lookahead.is_empty() {
                // The inner lexer's own state is now the current token.
                self.current_checkpoint = None;
            } else {
                self.current_checkpoint = Some(next_checkpoint);
            }
            return next_checkpoint.current_kind;
        }

        self.current_checkpoint = None;
        self.inner.next_token().kind
    }

    pub fn current(&self) -> TokenKind {
        match &self.current_checkpoint {
            Some(checkpoint) => checkpoint.current_kind,
            None => self.inner.current(),
        }
    }

    pub fn current_range(&self) -> TextRange {
        match &self.current_checkpoint {
            Some(checkpoint) => checkpoint.current_range(),
            None => self.inner.current_range(),
        }
    }

    pub fn current_flags(&self) -> TokenFlags {
        match &self.current_checkpoint {
            Some(checkpoint) => checkpoint.current_flags,
            None => self.inner.current_flags(),
        }
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.current_flags()
            .contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// Checkpoint of the current token.
    pub fn checkpoint(&self) -> LexerCheckpoint {
        match self.current_checkpoint {
            Some(checkpoint) => checkpoint,
            None => self.inner.checkpoint(),
        }
    }

    /// Restore a checkpoint; any buffered lookahead is discarded.
    pub fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.inner.rewind(checkpoint);
        self.lookahead.clear();
        self.current_checkpoint = None;
    }

    /// Peek at the `n`th non-trivia token ahead of the current one (1-indexed).
    pub fn nth_non_trivia(&mut self, n: usize) -> Option<LookaheadToken> {
        assert!(n >= 1, "nth_non_trivia is 1-indexed");

        if let Some(checkpoint) = self.lookahead.non_trivia_get(n - 1) {
            return Some(LookaheadToken::from_checkpoint(checkpoint));
        }

        let mut remaining = n - self.lookahead.non_trivia_len();
        loop {
            let token = self.pull_into_lookahead()?;
            if !token.kind.is_trivia() {
                remaining -= 1;
                if remaining == 0 {
                    return Some(token);
                }
            }
        }
    }

    /// Consume the buffered lexer, returning the inner lexer's diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.inner.finish()
    }

    fn reset_lookahead(&mut self) {
        if let Some(checkpoint) = self.current_checkpoint.take() {
            self.inner.rewind(checkpoint);
            self.lookahead.clear();
        }
    }

    fn pull_into_lookahead(&mut self) -> Option<LookaheadToken> {
        if self.inner.current() == TokenKind::Eof {
            return None;
        }
        if self.current_checkpoint.is_none() {
            self.current_checkpoint = Some(self.inner.checkpoint());
        }
        let token = self.inner.next_token();
        self.lookahead.push_back(self.inner.checkpoint());
        Some(LookaheadToken {
            kind: token.kind,
            flags: self.inner.current_flags(),
            range: token.range,
        })
    }
}

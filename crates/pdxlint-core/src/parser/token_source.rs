//! Token source bridging the buffered lexer and the parser.
//!
//! The grammar only ever sees non-trivia tokens. Trivia encountered on the
//! way is recorded with an ownership direction: a piece is `trailing` when it
//! follows a token on the same physical line, and `leading` (on the next
//! token) once a newline flips the direction.

use crate::diagnostics::Diagnostic;
use crate::lexer::{
    BufferedLexer, LexContext, LexerCheckpoint, TokenFlags, TokenKind, Trivia, TriviaKind,
};
use crate::text::{TextRange, TextSize};

/// Checkpoint pairing a lexer checkpoint with the trivia vector length.
#[derive(Debug, Clone, Copy)]
pub struct TokenSourceCheckpoint {
    pub(crate) lexer: LexerCheckpoint,
    pub(crate) trivia_len: usize,
}

impl TokenSourceCheckpoint {
    pub fn current_start(&self) -> TextSize {
        self.lexer.current_range().start()
    }

    pub fn trivia_position(&self) -> usize {
        self.trivia_len
    }
}

/// Strips trivia for the parser while recording its ownership.
pub struct TokenSource<'src> {
    lexer: BufferedLexer<'src>,
    trivia: Vec<Trivia>,
    current_kind: TokenKind,
    current_range: TextRange,
    preceding_line_break: bool,
    current_has_preceding_trivia: bool,
}

impl<'src> TokenSource<'src> {
    pub fn new(lexer: BufferedLexer<'src>) -> Self {
        let mut source = Self {
            lexer,
            trivia: Vec::new(),
            current_kind: TokenKind::Eof,
            current_range: TextRange::empty(TextSize::from(0)),
            preceding_line_break: false,
            current_has_preceding_trivia: false,
        };
        source.next_non_trivia_token(true, None);
        source
    }

    /// Kind of the current non-trivia token.
    pub fn current(&self) -> TokenKind {
        self.current_kind
    }

    /// Range of the current non-trivia token.
    pub fn current_range(&self) -> TextRange {
        self.current_range
    }

    /// The full source text.
    pub fn text(&self) -> &'src str {
        self.lexer.source()
    }

    /// Byte position at the start of the current token.
    pub fn position(&self) -> TextSize {
        self.current_range.start()
    }

    /// Whether a line break separates the current token from the previous one.
    pub fn has_preceding_line_break(&self) -> bool {
        self.preceding_line_break
    }

    /// Whether any trivia separates the current token from the previous one.
    pub fn has_preceding_trivia(&self) -> bool {
        self.current_has_preceding_trivia
    }

    /// Trivia recorded so far.
    pub fn trivia(&self) -> &[Trivia] {
        &self.trivia
    }

    pub fn checkpoint(&self) -> TokenSourceCheckpoint {
        TokenSourceCheckpoint {
            lexer: self.lexer.checkpoint(),
            trivia_len: self.trivia.len(),
        }
    }

    /// Advance past the current token.
    pub fn bump(&mut self) {
        if self.current_kind != TokenKind::Eof {
            self.next_non_trivia_token(false, None);
        }
    }

    /// Advance past the current token, relexing in `context`.
    pub fn bump_with_context(&mut self, context: LexContext) {
        if self.current_kind != TokenKind::Eof {
            self.next_non_trivia_token(false, Some(context));
        }
    }

    /// Reclassify the current non-trivia token as `Skipped` trivia.
    ///
    /// Recovery uses this to preserve bytes without growing the tree.
    pub fn skip_as_trivia(&mut self) {
        self.skip_as_trivia_impl(None);
    }

    pub fn skip_as_trivia_with_context(&mut self, context: LexContext) {
        self.skip_as_trivia_impl(Some(context));
    }

    fn skip_as_trivia_impl(&mut self, context: Option<LexContext>) {
        if self.current_kind == TokenKind::Eof {
            return;
        }
        self.trivia.push(Trivia {
            kind: TriviaKind::Skipped,
            range: self.current_range,
            trailing: false,
        });
        self.next_non_trivia_token(false, context);
    }

    /// Kind of the `n`th non-trivia token; `nth(0)` is the current token.
    pub fn nth(&mut self, n: usize) -> TokenKind {
        if n == 0 {
            return self.current_kind;
        }
        self.lexer
            .nth_non_trivia(n)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    /// Range of the `n`th non-trivia token.
    pub fn nth_range(&mut self, n: usize) -> TextRange {
        if n == 0 {
            return self.current_range;
        }
        self.lexer
            .nth_non_trivia(n)
            .map_or_else(|| TextRange::empty(self.current_range.end()), |token| token.range)
    }

    pub fn has_nth_preceding_line_break(&mut self, n: usize) -> bool {
        if n == 0 {
            return self.preceding_line_break;
        }
        self.lexer
            .nth_non_trivia(n)
            .is_some_and(|token| token.has_preceding_line_break())
    }

    pub fn has_nth_preceding_trivia(&mut self, n: usize) -> bool {
        if n == 0 {
            return self.has_preceding_trivia();
        }
        let next_range = self.nth_range(n);
        let prev_range = if n == 1 {
            self.current_range
        } else {
            self.nth_range(n - 1)
        };
        next_range.start() > prev_range.end()
    }

    /// Restore a checkpoint, truncating trivia recorded after it.
    pub fn rewind(&mut self, checkpoint: TokenSourceCheckpoint) {
        self.lexer.rewind(checkpoint.lexer);
        self.trivia.truncate(checkpoint.trivia_len);

        self.current_kind = checkpoint.lexer.current_kind;
        self.current_range = checkpoint.lexer.current_range();
        self.preceding_line_break = checkpoint
            .lexer
            .current_flags
            .contains(TokenFlags::PRECEDING_LINE_BREAK);
        self.current_has_preceding_trivia = false;
    }

    /// Consume the source, returning recorded trivia and lexer diagnostics.
    pub fn finish(self) -> (Vec<Trivia>, Vec<Diagnostic>) {
        (self.trivia, self.lexer.finish())
    }

    fn next_non_trivia_token(&mut self, first_token: bool, context: Option<LexContext>) {
        let mut trailing = !first_token;
        self.preceding_line_break = false;
        let mut saw_trivia = false;

        loop {
            let kind = self.lexer.next_token(context.unwrap_or_default());
            let token_range = self.lexer.current_range();

            if let Some(trivia_kind) = kind.trivia_kind() {
                saw_trivia = true;
                if trivia_kind == TriviaKind::Newline {
                    trailing = false;
                    self.preceding_line_break = true;
                }
                self.trivia.push(Trivia {
                    kind: trivia_kind,
                    range: token_range,
                    trailing,
                });
                continue;
            }

            self.current_kind = kind;
            self.current_range = token_range;
            self.current_has_preceding_trivia = saw_trivia;
            if self
                .lexer
                .current_flags()
                .contains(TokenFlags::PRECEDING_LINE_BREAK)
            {
                self.preceding_line_break = true;
            }
            break;
        }
    }
}

//! Lossless lexer for Jomini game script.
//!
//! The lexer emits trivia (whitespace, newlines, comments, skipped bytes) as
//! ordinary tokens so that every byte of the input is covered by exactly one
//! token. Unknown bytes become `Skipped` trivia instead of failing, which
//! keeps round-tripping possible on arbitrary input.

use crate::diagnostics::{Diagnostic, LEXER_UNTERMINATED_STRING};
use crate::lexer::token::{Token, TokenFlags, TokenKind};
use crate::text::{TextRange, TextSize};

/// Snapshot of the full lexer state, used for speculative parsing.
#[derive(Debug, Clone, Copy)]
pub struct LexerCheckpoint {
    pub(crate) position: usize,
    pub(crate) current_start: TextSize,
    pub(crate) current_kind: TokenKind,
    pub(crate) current_flags: TokenFlags,
    pub(crate) after_newline: bool,
    pub(crate) eof_emitted: bool,
    pub(crate) diagnostics_len: usize,
}

impl LexerCheckpoint {
    /// Range of the token that was current when this checkpoint was taken.
    pub(crate) fn current_range(&self) -> TextRange {
        TextRange::new(self.current_start, TextSize::from(self.position as u32))
    }
}

/// Lossless lexer that emits trivia and non-trivia tokens.
pub struct Lexer<'src> {
    source: &'src str,
    position: usize,
    after_newline: bool,
    current_start: TextSize,
    current_kind: TokenKind,
    current_flags: TokenFlags,
    eof_emitted: bool,
    allow_multiline_strings: bool,
    diagnostics: Vec<Diagnostic>,
}

impl<'src> Lexer<'src> {
    /// Create a lexer over `source`. Multiline strings are rejected; opt in
    /// with [`Lexer::with_multiline_strings`].
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            position: 0,
            after_newline: false,
            current_start: TextSize::from(0),
            current_kind: TokenKind::Eof,
            current_flags: TokenFlags::empty(),
            eof_emitted: false,
            allow_multiline_strings: false,
            diagnostics: Vec::new(),
        }
    }

    /// Allow double-quoted strings to span line breaks.
    pub fn with_multiline_strings(mut self, allow: bool) -> Self {
        self.allow_multiline_strings = allow;
        self
    }

    /// Original source text.
    pub fn source(&self) -> &'src str {
        self.source
    }

    /// Diagnostics accumulated so far.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Kind of the most recently lexed token.
    pub fn current(&self) -> TokenKind {
        self.current_kind
    }

    /// Start offset of the most recently lexed token.
    pub fn current_start(&self) -> TextSize {
        self.current_start
    }

    /// Range of the most recently lexed token.
    pub fn current_range(&self) -> TextRange {
        TextRange::new(self.current_start, TextSize::from(self.position as u32))
    }

    /// Flags of the most recently lexed token.
    pub fn current_flags(&self) -> TokenFlags {
        self.current_flags
    }

    /// Byte offset of the cursor.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Whether the cursor reached the end of the input.
    pub fn is_eof(&self) -> bool {
        self.position >= self.source.len()
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.current_flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }

    /// Emit the next token in source order.
    ///
    /// EOF is emitted exactly once with a zero-width range, then repeated on
    /// every further call.
    pub fn next_token(&mut self) -> Token {
        self.current_start = TextSize::from(self.position as u32);
        self.current_flags = TokenFlags::empty();

        if self.is_eof() {
            if !self.eof_emitted {
                self.eof_emitted = true;
                self.current_kind = TokenKind::Eof;
            }
            return Token::new(
                TokenKind::Eof,
                TextRange::empty(self.current_start),
                self.current_flags,
            );
        }

        let kind = self.lex_token();
        if self.after_newline {
            self.current_flags |= TokenFlags::PRECEDING_LINE_BREAK;
        }
        self.current_kind = kind;

        if !kind.is_trivia() {
            self.after_newline = false;
        }

        Token::new(kind, self.current_range(), self.current_flags)
    }

    /// Drain the input to EOF, returning every token including the final EOF.
    pub fn lex(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    /// Snapshot the full lexer state.
    pub fn checkpoint(&self) -> LexerCheckpoint {
        LexerCheckpoint {
            position: self.position,
            current_start: self.current_start,
            current_kind: self.current_kind,
            current_flags: self.current_flags,
            after_newline: self.after_newline,
            eof_emitted: self.eof_emitted,
            diagnostics_len: self.diagnostics.len(),
        }
    }

    /// Restore a checkpoint, truncating diagnostics accumulated after it.
    pub fn rewind(&mut self, checkpoint: LexerCheckpoint) {
        self.position = checkpoint.position;
        self.current_start = checkpoint.current_start;
        self.current_kind = checkpoint.current_kind;
        self.current_flags = checkpoint.current_flags;
        self.after_newline = checkpoint.after_newline;
        self.eof_emitted = checkpoint.eof_emitted;
        self.diagnostics.truncate(checkpoint.diagnostics_len);
    }

    /// Consume the lexer, returning its diagnostics.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn lex_token(&mut self) -> TokenKind {
        let Some(ch) = self.current_char() else {
            return TokenKind::Eof;
        };

        match ch {
            '\r' | '\n' | '\t' | ' ' => self.consume_newline_or_whitespace(),
            '#' => self.lex_comment(),
            '"' => self.lex_string(),
            c if c.is_ascii_digit() => self.lex_number(),
            c if c.is_alphabetic() || c == '_' => self.lex_identifier(),
            '=' if self.peek_char() == Some('=') => self.two(TokenKind::EqualEqual),
            '!' if self.peek_char() == Some('=') => self.two(TokenKind::NotEqual),
            '<' if self.peek_char() == Some('=') => self.two(TokenKind::LessThanOrEqual),
            '>' if self.peek_char() == Some('=') => self.two(TokenKind::GreaterThanOrEqual),
            '?' if self.peek_char() == Some('=') => self.two(TokenKind::QuestionEqual),
            '=' => self.one(TokenKind::Equal),
            '<' => self.one(TokenKind::LessThan),
            '>' => self.one(TokenKind::GreaterThan),
            '+' => self.one(TokenKind::Plus),
            '-' => self.one(TokenKind::Minus),
            '*' => self.one(TokenKind::Star),
            '%' => self.one(TokenKind::Percent),
            '^' => self.one(TokenKind::Caret),
            '|' => self.one(TokenKind::Pipe),
            '&' => self.one(TokenKind::Amp),
            '?' => self.one(TokenKind::Question),
            '!' => self.one(TokenKind::Bang),
            ':' => self.one(TokenKind::Colon),
            ';' => self.one(TokenKind::Semicolon),
            ',' => self.one(TokenKind::Comma),
            '.' => self.one(TokenKind::Dot),
            '/' => self.one(TokenKind::Slash),
            '\\' => self.one(TokenKind::Backslash),
            '@' => self.one(TokenKind::At),
            '{' => self.one(TokenKind::LBrace),
            '}' => self.one(TokenKind::RBrace),
            '[' => self.one(TokenKind::LBracket),
            ']' => self.one(TokenKind::RBracket),
            '(' => self.one(TokenKind::LParen),
            ')' => self.one(TokenKind::RParen),
            // Anything else is preserved as skipped trivia for recovery.
            other => {
                self.advance(other.len_utf8());
                TokenKind::Skipped
            }
        }
    }

    fn one(&mut self, kind: TokenKind) -> TokenKind {
        self.advance(1);
        kind
    }

    fn two(&mut self, kind: TokenKind) -> TokenKind {
        self.advance(2);
        kind
    }

    fn lex_comment(&mut self) -> TokenKind {
        // Consume until end of line, not including the newline itself.
        self.advance(1);
        while let Some(ch) = self.current_char() {
            if ch == '\n' || ch == '\r' {
                break;
            }
            self.advance(ch.len_utf8());
        }
        TokenKind::Comment
    }

    fn lex_string(&mut self) -> TokenKind {
        self.advance(1);
        self.current_flags |= TokenFlags::WAS_QUOTED;
        let mut escaped = false;
        let mut closed = false;

        while let Some(ch) = self.current_char() {
            if ch == '"' {
                self.advance(1);
                closed = true;
                break;
            }
            if ch == '\\' {
                escaped = true;
                self.advance(1);
                if let Some(next) = self.current_char() {
                    self.advance(next.len_utf8());
                }
                continue;
            }
            if (ch == '\n' || ch == '\r') && !self.allow_multiline_strings {
                break;
            }
            self.advance(ch.len_utf8());
        }

        if escaped {
            self.current_flags |= TokenFlags::HAS_ESCAPE;
        }

        if !closed {
            let range = TextRange::new(self.current_start, TextSize::from(self.position as u32));
            self.diagnostics
                .push(LEXER_UNTERMINATED_STRING.diagnostic(range));
        }

        TokenKind::String
    }

    fn lex_number(&mut self) -> TokenKind {
        let mut saw_dot = false;
        while let Some(ch) = self.current_char() {
            if ch.is_ascii_digit() {
                self.advance(1);
                continue;
            }
            if ch == '.'
                && !saw_dot
                && self.peek_char().is_some_and(|next| next.is_ascii_digit())
            {
                saw_dot = true;
                self.advance(1);
                continue;
            }
            break;
        }
        if saw_dot { TokenKind::Float } else { TokenKind::Int }
    }

    fn lex_identifier(&mut self) -> TokenKind {
        let first = self.current_char().map_or(1, char::len_utf8);
        self.advance(first);
        while let Some(ch) = self.current_char() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance(ch.len_utf8());
                continue;
            }
            break;
        }
        TokenKind::Identifier
    }

    fn consume_newline_or_whitespace(&mut self) -> TokenKind {
        if self.consume_newline() {
            self.after_newline = true;
            return TokenKind::Newline;
        }
        self.consume_whitespace();
        TokenKind::Whitespace
    }

    fn consume_whitespace(&mut self) {
        while let Some(ch) = self.current_char() {
            if ch == ' ' || ch == '\t' {
                self.advance(1);
                continue;
            }
            break;
        }
    }

    fn consume_newline(&mut self) -> bool {
        match self.current_char() {
            Some('\n') => {
                self.advance(1);
                true
            }
            Some('\r') => {
                if self.peek_char() == Some('\n') {
                    self.advance(2);
                } else {
                    self.advance(1);
                }
                true
            }
            _ => false,
        }
    }

    fn current_char(&self) -> Option<char> {
        self.source[self.position..].chars().next()
    }

    fn peek_char(&self) -> Option<char> {
        let mut chars = self.source[self.position..].chars();
        chars.next();
        chars.next()
    }

    fn advance(&mut self, bytes: usize) {
        self.position += bytes;
    }
}

/// Text covered by a token's own range (empty for EOF).
pub fn token_text<'src>(source: &'src str, token: &Token) -> &'src str {
    if token.kind == TokenKind::Eof {
        return "";
    }
    crate::text::slice_text_range(source, token.range)
}

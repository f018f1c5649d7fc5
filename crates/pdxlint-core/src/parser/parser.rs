//! Event-based parser core.

use crate::cst::JominiSyntaxKind;
use crate::diagnostics::Diagnostic;
use crate::lexer::TokenKind;
use crate::parser::event::Event;
use crate::parser::marker::Marker;
use crate::parser::options::ParserOptions;
use crate::parser::token_source::{TokenSource, TokenSourceCheckpoint};
use crate::text::{TextRange, TextSize};

/// Compact set of token kinds, const-constructible for grammar stop sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenSet(u64);

impl TokenSet {
    pub const EMPTY: TokenSet = TokenSet(0);

    pub const fn new(kinds: &[TokenKind]) -> TokenSet {
        let mut bits = 0u64;
        let mut index = 0;
        while index < kinds.len() {
            bits |= 1u64 << (kinds[index] as u64);
            index += 1;
        }
        TokenSet(bits)
    }

    pub const fn insert(self, kind: TokenKind) -> TokenSet {
        TokenSet(self.0 | (1u64 << (kind as u64)))
    }

    pub const fn union(self, other: TokenSet) -> TokenSet {
        TokenSet(self.0 | other.0)
    }

    pub const fn contains(self, kind: TokenKind) -> bool {
        self.0 & (1u64 << (kind as u64)) != 0
    }
}

/// Detects parser stalls inside list-style loops.
///
/// A loop iteration that does not advance the byte position is a grammar
/// bug, not a recoverable condition.
#[derive(Debug, Default)]
pub struct ParserProgress {
    last_position: Option<TextSize>,
}

impl ParserProgress {
    pub fn has_progressed(&mut self, parser: &Parser<'_>) -> bool {
        let progressed = self
            .last_position
            .is_none_or(|position| position < parser.position());
        self.last_position = Some(parser.position());
        progressed
    }

    pub fn assert_progressing(&mut self, parser: &Parser<'_>) {
        if !self.has_progressed(parser) {
            panic!(
                "parser stopped making progress at {:?} {:?}",
                parser.current(),
                parser.current_range()
            );
        }
    }
}

/// Snapshot of the parser for speculative parsing; rewinding truncates the
/// event and diagnostic lists rather than replaying anything.
#[derive(Debug, Clone, Copy)]
pub struct ParserCheckpoint {
    events_len: usize,
    diagnostics_len: usize,
    source: TokenSourceCheckpoint,
}

/// Event-based parser over a trivia-stripped token source.
pub struct Parser<'src> {
    source: TokenSource<'src>,
    options: ParserOptions,
    pub(crate) events: Vec<Event>,
    diagnostics: Vec<Diagnostic>,
    speculative_depth: u32,
}

impl<'src> Parser<'src> {
    pub fn new(source: TokenSource<'src>, options: ParserOptions) -> Self {
        Self {
            source,
            options,
            events: Vec::new(),
            diagnostics: Vec::new(),
            speculative_depth: 0,
        }
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn source_text(&self) -> &'src str {
        self.source.text()
    }

    pub fn current(&self) -> TokenKind {
        self.source.current()
    }

    pub fn current_range(&self) -> TextRange {
        self.source.current_range()
    }

    pub fn position(&self) -> TextSize {
        self.source.position()
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.source.has_preceding_line_break()
    }

    pub fn has_preceding_trivia(&self) -> bool {
        self.source.has_preceding_trivia()
    }

    pub fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    pub fn at_set(&self, kinds: TokenSet) -> bool {
        kinds.contains(self.current())
    }

    pub fn nth(&mut self, n: usize) -> TokenKind {
        self.source.nth(n)
    }

    pub fn nth_range(&mut self, n: usize) -> TextRange {
        self.source.nth_range(n)
    }

    pub fn has_nth_preceding_line_break(&mut self, n: usize) -> bool {
        self.source.has_nth_preceding_line_break(n)
    }

    pub fn has_nth_preceding_trivia(&mut self, n: usize) -> bool {
        self.source.has_nth_preceding_trivia(n)
    }

    /// Open a new marker at the current position.
    pub fn start(&mut self) -> Marker {
        let pos = self.events.len() as u32;
        self.events.push(Event::tombstone());
        Marker::new(pos, self.position())
    }

    /// Consume the current token into the event stream.
    pub fn bump(&mut self) {
        if self.current() == TokenKind::Eof {
            return;
        }
        self.events.push(Event::Token {
            kind: JominiSyntaxKind::from_token_kind(self.current()),
            end: self.current_range().end(),
        });
        self.source.bump();
    }

    /// Consume the current token regardless of its kind.
    pub fn bump_any(&mut self) {
        self.bump();
    }

    /// Consume the current token if it matches `kind`.
    pub fn eat(&mut self, kind: TokenKind) -> bool {
        if self.current() == kind {
            self.bump();
            return true;
        }
        false
    }

    /// Consume `kind` or report `diagnostic`; returns whether it was present.
    pub fn expect(&mut self, kind: TokenKind, diagnostic: Diagnostic) -> bool {
        if self.eat(kind) {
            return true;
        }
        self.error(diagnostic);
        false
    }

    /// Record a diagnostic.
    pub fn error(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Whether the parser is inside a speculative section.
    pub fn is_speculative_parsing(&self) -> bool {
        self.speculative_depth > 0
    }

    /// Run `f` with recovery disabled. The closure is responsible for taking
    /// a checkpoint first and rewinding if its speculation fails.
    pub fn speculate<R>(&mut self, f: impl FnOnce(&mut Parser<'src>) -> R) -> R {
        self.speculative_depth += 1;
        let result = f(self);
        self.speculative_depth -= 1;
        result
    }

    pub fn checkpoint(&self) -> ParserCheckpoint {
        ParserCheckpoint {
            events_len: self.events.len(),
            diagnostics_len: self.diagnostics.len(),
            source: self.source.checkpoint(),
        }
    }

    /// Restore a checkpoint. Events and diagnostics recorded after it are
    /// truncated; the token source rewinds to the checkpointed token.
    pub fn rewind(&mut self, checkpoint: ParserCheckpoint) {
        self.events.truncate(checkpoint.events_len);
        self.diagnostics.truncate(checkpoint.diagnostics_len);
        self.source.rewind(checkpoint.source);
    }

    /// Consume the parser, returning events, diagnostics, and the source.
    pub fn finish(self) -> (Vec<Event>, Vec<Diagnostic>, TokenSource<'src>) {
        (self.events, self.diagnostics, self.source)
    }
}

//! Token and trivia vocabulary emitted by the lexer.

use bitflags::bitflags;

use crate::text::{TextRange, TextSize};

/// Kinds of tokens produced by the lexer, trivia included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum TokenKind {
    Eof,

    // Trivia
    Whitespace,
    Newline,
    Comment,
    /// Bytes preserved by recovery or unknown input. Still trivia-like.
    Skipped,

    // Identifiers / literals
    Identifier,
    String,
    Int,
    Float,

    // Operators (multi-char included)
    Equal,
    EqualEqual,
    NotEqual,
    LessThanOrEqual,
    GreaterThanOrEqual,
    LessThan,
    GreaterThan,
    QuestionEqual,

    // Punctuation / separators
    Colon,
    Semicolon,
    Comma,
    Dot,
    Slash,
    Backslash,
    At,

    Plus,
    Minus,
    Star,
    Percent,
    Caret,
    Pipe,
    Amp,
    Question,
    Bang,

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
}

impl TokenKind {
    /// Whether this kind is trivia (whitespace, newlines, comments, skipped bytes).
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace | TokenKind::Newline | TokenKind::Comment | TokenKind::Skipped
        )
    }

    /// Map a trivia token kind onto the trivia vocabulary.
    pub fn trivia_kind(self) -> Option<TriviaKind> {
        match self {
            TokenKind::Whitespace => Some(TriviaKind::Whitespace),
            TokenKind::Newline => Some(TriviaKind::Newline),
            TokenKind::Comment => Some(TriviaKind::Comment),
            TokenKind::Skipped => Some(TriviaKind::Skipped),
            _ => None,
        }
    }
}

bitflags! {
    /// Token metadata flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TokenFlags: u8 {
        /// A newline was consumed before this token.
        const PRECEDING_LINE_BREAK = 1 << 0;
        /// The token text is a double-quoted string.
        const WAS_QUOTED = 1 << 1;
        /// The token text contains at least one backslash escape.
        const HAS_ESCAPE = 1 << 2;
    }
}

/// A single lexed token (trivia or non-trivia).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub range: TextRange,
    pub flags: TokenFlags,
}

impl Token {
    pub fn new(kind: TokenKind, range: TextRange, flags: TokenFlags) -> Self {
        Self { kind, range, flags }
    }

    pub fn has_preceding_line_break(&self) -> bool {
        self.flags.contains(TokenFlags::PRECEDING_LINE_BREAK)
    }
}

/// The trivia vocabulary, separate from [`TokenKind`] for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TriviaKind {
    Whitespace,
    Newline,
    Comment,
    Skipped,
}

/// Range-based trivia recorded by the token source, tagged with the owning
/// direction: `trailing` trivia belongs to the previous token, leading trivia
/// to the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Trivia {
    pub kind: TriviaKind,
    pub range: TextRange,
    pub trailing: bool,
}

/// Compact trivia unit stored in the green tree: kind plus length only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriviaPiece {
    pub kind: TriviaKind,
    pub length: TextSize,
}

impl TriviaPiece {
    pub fn new(kind: TriviaKind, length: TextSize) -> Self {
        Self { kind, length }
    }
}

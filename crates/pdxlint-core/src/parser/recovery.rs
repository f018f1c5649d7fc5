//! Token-set recovery primitive.

use crate::cst::JominiSyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::marker::CompletedMarker;
use crate::parser::parser::{Parser, TokenSet};

/// Why a recovery attempt produced no `ERROR` node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryError {
    /// The parser is already at EOF.
    Eof,
    /// The parser already sits on a recovery token (or a line-break
    /// recovered position).
    AlreadyRecovered,
    /// Recovery is disabled inside speculative parsing so that backtracked
    /// alternatives do not leak error nodes.
    RecoveryDisabled,
}

/// Recover by consuming tokens into an error node until a safe token.
#[derive(Debug, Clone, Copy)]
pub struct ParseRecoveryTokenSet {
    node_kind: JominiSyntaxKind,
    recovery_set: TokenSet,
    line_break: bool,
}

impl ParseRecoveryTokenSet {
    pub fn new(node_kind: JominiSyntaxKind, recovery_set: TokenSet) -> Self {
        Self {
            node_kind,
            recovery_set,
            line_break: false,
        }
    }

    /// Also stop at the first token that begins on a fresh line.
    pub fn enable_recovery_on_line_break(mut self) -> Self {
        self.line_break = true;
        self
    }

    pub fn recover(
        &self,
        parser: &mut Parser<'_>,
    ) -> Result<CompletedMarker, RecoveryError> {
        if parser.at(TokenKind::Eof) {
            return Err(RecoveryError::Eof);
        }
        if self.is_at_recovered(parser) {
            return Err(RecoveryError::AlreadyRecovered);
        }
        if parser.is_speculative_parsing() {
            return Err(RecoveryError::RecoveryDisabled);
        }

        let marker = parser.start();
        while !parser.at(TokenKind::Eof) && !self.is_at_recovered(parser) {
            parser.bump_any();
        }
        Ok(marker.complete(parser, self.node_kind))
    }

    pub fn is_at_recovered(&self, parser: &Parser<'_>) -> bool {
        parser.at_set(self.recovery_set)
            || (self.line_break && parser.has_preceding_line_break())
    }
}

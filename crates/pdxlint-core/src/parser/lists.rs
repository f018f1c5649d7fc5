//! Reusable node-list parse loop.

use crate::cst::JominiSyntaxKind;
use crate::lexer::TokenKind;
use crate::parser::marker::CompletedMarker;
use crate::parser::parser::{Parser, ParserProgress};

/// Success/failure outcome of one parse attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedSyntax {
    Present,
    Absent,
}

impl ParsedSyntax {
    pub fn is_present(self) -> bool {
        self == ParsedSyntax::Present
    }

    pub fn is_absent(self) -> bool {
        self == ParsedSyntax::Absent
    }
}

/// Parse a non-separated list of elements into a node of `list_kind`.
///
/// `parse_element` attempts one element; `recover` decides whether the loop
/// can continue after an absent element (typically by error recovery). The
/// progress guard turns a stalled loop into a panic.
pub fn parse_node_list(
    parser: &mut Parser<'_>,
    list_kind: JominiSyntaxKind,
    is_at_list_end: impl Fn(&Parser<'_>) -> bool,
    mut parse_element: impl FnMut(&mut Parser<'_>) -> ParsedSyntax,
    mut recover: impl FnMut(&mut Parser<'_>, ParsedSyntax) -> bool,
) -> CompletedMarker {
    let marker = parser.start();
    let mut progress = ParserProgress::default();

    while !parser.at(TokenKind::Eof) && !is_at_list_end(parser) {
        progress.assert_progressing(parser);
        let parsed = parse_element(parser);
        if !recover(parser, parsed) {
            break;
        }
    }

    marker.complete(parser, list_kind)
}

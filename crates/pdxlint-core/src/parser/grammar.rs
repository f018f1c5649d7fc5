//! Jomini grammar routines that emit CST events.

use crate::cst::JominiSyntaxKind;
use crate::diagnostics::{
    Diagnostic, PARSER_EXPECTED_TOKEN, PARSER_EXPECTED_VALUE, PARSER_LEGACY_EXTRA_RBRACE,
    PARSER_LEGACY_MISSING_RBRACE, PARSER_UNEXPECTED_TOKEN, PARSER_UNSUPPORTED_PARAMETER_SYNTAX,
    PARSER_UNSUPPORTED_UNMARKED_LIST,
};
use crate::lexer::TokenKind;
use crate::parser::lists::{ParsedSyntax, parse_node_list};
use crate::parser::marker::CompletedMarker;
use crate::parser::parser::{Parser, TokenSet};
use crate::parser::recovery::ParseRecoveryTokenSet;

pub(crate) const ASSIGNMENT_OPERATORS: TokenSet = TokenSet::new(&[
    TokenKind::Equal,
    TokenKind::EqualEqual,
    TokenKind::NotEqual,
    TokenKind::LessThanOrEqual,
    TokenKind::GreaterThanOrEqual,
    TokenKind::LessThan,
    TokenKind::GreaterThan,
    TokenKind::QuestionEqual,
]);

#[derive(Debug, Clone, Copy)]
pub(crate) struct StatementParseResult {
    present: bool,
    is_key_value: bool,
}

impl StatementParseResult {
    fn present() -> Self {
        Self {
            present: true,
            is_key_value: false,
        }
    }

    fn key_value() -> Self {
        Self {
            present: true,
            is_key_value: true,
        }
    }

    fn absent() -> Self {
        Self {
            present: false,
            is_key_value: false,
        }
    }
}

/// Parse a whole source file: a statement list stopping at EOF.
pub fn parse_source_file(parser: &mut Parser<'_>) {
    let restrict = !parser.options().allow_bare_scalar_after_key_value;
    let root = parser.start();
    parse_statement_list(parser, TokenSet::new(&[TokenKind::Eof]), true, restrict);
    root.complete(parser, JominiSyntaxKind::SourceFile);
}

/// Parse statements until `stop_at`.
///
/// `allow_bare_scalars` permits array-style elements;
/// `restrict_bare_scalars_after_key_value` turns them off once a key-value
/// has been seen in this list.
pub fn parse_statement_list(
    parser: &mut Parser<'_>,
    stop_at: TokenSet,
    allow_bare_scalars: bool,
    restrict_bare_scalars_after_key_value: bool,
) -> CompletedMarker {
    let mut has_seen_key_value = false;

    let mut recovery_set = stop_at;
    if parser.options().allow_semicolon_terminator {
        recovery_set = recovery_set.insert(TokenKind::Semicolon);
    }
    let recovery = ParseRecoveryTokenSet::new(JominiSyntaxKind::Error, recovery_set)
        .enable_recovery_on_line_break();

    parse_node_list(
        parser,
        JominiSyntaxKind::StatementList,
        |current| current.at_set(stop_at),
        |current| {
            if current.options().allow_semicolon_terminator && current.at(TokenKind::Semicolon) {
                current.bump();
                return ParsedSyntax::Present;
            }

            let statement_allow_bare = allow_bare_scalars
                && (!restrict_bare_scalars_after_key_value || !has_seen_key_value);
            let parsed = parse_statement(current, statement_allow_bare);

            if parsed.present {
                if parsed.is_key_value {
                    has_seen_key_value = true;
                }
                return ParsedSyntax::Present;
            }
            ParsedSyntax::Absent
        },
        |current, parsed| {
            if parsed.is_present() {
                return true;
            }
            let diagnostic = unexpected_token(current);
            current.error(diagnostic);
            recovery.recover(current).is_ok()
        },
    )
}

fn parse_statement(parser: &mut Parser<'_>, allow_bare_scalars: bool) -> StatementParseResult {
    if parser.at(TokenKind::RBrace) {
        if parser.options().allow_legacy_extra_rbrace {
            let diagnostic = PARSER_LEGACY_EXTRA_RBRACE.diagnostic(parser.current_range());
            parser.error(diagnostic);
            parser.bump();
            return StatementParseResult::present();
        }
        return StatementParseResult::absent();
    }

    if parser.at(TokenKind::LBrace) {
        parse_block(parser);
        return StatementParseResult::present();
    }

    let Some(key_or_value) = parse_scalar(parser) else {
        return StatementParseResult::absent();
    };

    if parser.at_set(ASSIGNMENT_OPERATORS) {
        let marker = key_or_value.precede(parser);
        parser.bump();
        if parser.at(TokenKind::Eof) || parser.at(TokenKind::RBrace) {
            let diagnostic = PARSER_EXPECTED_VALUE.diagnostic(parser.current_range());
            parser.error(diagnostic);
        } else {
            parse_value(parser);
        }
        marker.complete(parser, JominiSyntaxKind::KeyValue);
        return StatementParseResult::key_value();
    }

    // Implicit block assignment: `foo{...}` is a key-value without operator.
    if parser.at(TokenKind::LBrace) {
        let marker = key_or_value.precede(parser);
        parse_block(parser);
        marker.complete(parser, JominiSyntaxKind::KeyValue);
        return StatementParseResult::key_value();
    }

    if allow_bare_scalars {
        let scalar_text = key_or_value.text(parser);
        if is_parameter_syntax_scalar(scalar_text) && !parser.options().allow_parameter_syntax {
            let diagnostic =
                PARSER_UNSUPPORTED_PARAMETER_SYNTAX.diagnostic(parser.current_range());
            parser.error(diagnostic);
        }
        return StatementParseResult::present();
    }

    StatementParseResult::absent()
}

fn parse_value(parser: &mut Parser<'_>) -> bool {
    if parser.at(TokenKind::LBrace) {
        parse_block(parser);
        return true;
    }

    let Some(scalar) = parse_scalar(parser) else {
        let diagnostic = PARSER_EXPECTED_VALUE.diagnostic(parser.current_range());
        parser.error(diagnostic);
        return false;
    };

    // Legacy unmarked list form: `key = list "name"`.
    if scalar.text(parser) == "list" && parser.at(TokenKind::String) {
        if !parser.options().allow_unmarked_list_form {
            let diagnostic = PARSER_UNSUPPORTED_UNMARKED_LIST.diagnostic(parser.current_range());
            parser.error(diagnostic);
            return false;
        }
        parse_scalar(parser);
        return true;
    }

    // A scalar directly followed by `{` is an externally tagged block.
    if parser.at(TokenKind::LBrace) {
        let tagged = scalar.precede(parser);
        parse_block(parser);
        tagged.complete(parser, JominiSyntaxKind::TaggedBlockValue);
    }

    true
}

pub(crate) fn parse_block(parser: &mut Parser<'_>) -> CompletedMarker {
    let marker = parser.start();
    if !parser.at(TokenKind::LBrace) {
        let diagnostic = expected_token(parser, TokenKind::LBrace);
        parser.error(diagnostic);
        return marker.complete(parser, JominiSyntaxKind::Block);
    }

    parser.bump();
    let restrict = !parser.options().allow_alternating_value_key_value;
    parse_statement_list(
        parser,
        TokenSet::new(&[TokenKind::RBrace, TokenKind::Eof]),
        true,
        restrict,
    );

    if parser.at(TokenKind::RBrace) {
        parser.bump();
    } else if parser.at(TokenKind::Eof) && parser.options().allow_legacy_missing_rbrace {
        let diagnostic = PARSER_LEGACY_MISSING_RBRACE.diagnostic(parser.current_range());
        parser.error(diagnostic);
    } else {
        let diagnostic = expected_token(parser, TokenKind::RBrace);
        parser.error(diagnostic);
    }

    marker.complete(parser, JominiSyntaxKind::Block)
}

/// Parse a scalar: the first scalar-starting token, then any further
/// scalar-starting tokens glued on without intervening trivia (so
/// `foo.bar`, `@scope`, `1821.1.1`, `-5` each form one scalar).
fn parse_scalar(parser: &mut Parser<'_>) -> Option<CompletedMarker> {
    if !can_start_scalar(parser.current()) {
        return None;
    }

    let marker = parser.start();
    let first_kind = parser.current();
    parser.bump();

    if first_kind == TokenKind::String {
        return Some(marker.complete(parser, JominiSyntaxKind::Scalar));
    }

    while can_start_scalar(parser.current()) {
        if parser.has_preceding_trivia() {
            break;
        }
        parser.bump();
    }

    Some(marker.complete(parser, JominiSyntaxKind::Scalar))
}

fn can_start_scalar(kind: TokenKind) -> bool {
    !(kind == TokenKind::Eof
        || kind == TokenKind::LBrace
        || kind == TokenKind::RBrace
        || ASSIGNMENT_OPERATORS.contains(kind))
}

fn expected_token(parser: &Parser<'_>, kind: TokenKind) -> Diagnostic {
    PARSER_EXPECTED_TOKEN.with_message(format!("Expected token {kind:?}"), parser.current_range())
}

fn unexpected_token(parser: &Parser<'_>) -> Diagnostic {
    PARSER_UNEXPECTED_TOKEN.with_message(
        format!("Unexpected token {:?}", parser.current()),
        parser.current_range(),
    )
}

fn is_parameter_syntax_scalar(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.starts_with("[[")
        || (trimmed.len() >= 2 && trimmed.starts_with('$') && trimmed.ends_with('$'))
}

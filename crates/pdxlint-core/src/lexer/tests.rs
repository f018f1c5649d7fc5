use crate::lexer::{BufferedLexer, LexContext, Lexer, TokenFlags, TokenKind, token_text};

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source).lex().iter().map(|token| token.kind).collect()
}

#[test]
fn lexes_simple_key_value() {
    assert_eq!(
        kinds("a = 1\n"),
        vec![
            TokenKind::Identifier,
            TokenKind::Whitespace,
            TokenKind::Equal,
            TokenKind::Whitespace,
            TokenKind::Int,
            TokenKind::Newline,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn token_ranges_cover_every_byte_once() {
    let source = "a=1 # note\nfoo = \"bar\"\n";
    let tokens = Lexer::new(source).lex();

    let mut position = 0u32;
    for token in &tokens {
        assert_eq!(u32::from(token.range.start()), position);
        position = u32::from(token.range.end());
    }
    assert_eq!(position as usize, source.len());
    assert_eq!(tokens.last().map(|token| token.kind), Some(TokenKind::Eof));
}

#[test]
fn reconstructs_source_from_token_text() {
    let source = "a={b=\"1\"c=d}foo=bar#good\n";
    let mut lexer = Lexer::new(source);
    let tokens = lexer.lex();
    let reconstructed: String = tokens
        .iter()
        .map(|token| token_text(source, token))
        .collect();
    assert_eq!(reconstructed, source);
}

#[test]
fn comments_run_to_line_end_without_newline() {
    let source = "# full line comment\nx=1 # trailing comment";
    let tokens = Lexer::new(source).lex();
    let comments: Vec<_> = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Comment)
        .collect();
    assert_eq!(comments.len(), 2);
    assert_eq!(token_text(source, comments[0]), "# full line comment");
    assert_eq!(token_text(source, comments[1]), "# trailing comment");
}

#[test]
fn newline_variants_set_preceding_line_break_flag() {
    let source = "a=1\r\nb=2\nc=3\r\nd=4";
    let tokens = Lexer::new(source).lex();

    let identifiers: Vec<_> = tokens
        .iter()
        .filter(|token| token.kind == TokenKind::Identifier)
        .collect();
    assert_eq!(identifiers.len(), 4);
    assert!(!identifiers[0].has_preceding_line_break());
    assert!(identifiers[1].has_preceding_line_break());
    assert!(identifiers[2].has_preceding_line_break());
    assert!(identifiers[3].has_preceding_line_break());
}

#[test]
fn lone_carriage_return_counts_as_newline() {
    let source = "a\rb";
    let tokens = Lexer::new(source).lex();
    assert_eq!(
        tokens.iter().map(|token| token.kind).collect::<Vec<_>>(),
        vec![
            TokenKind::Identifier,
            TokenKind::Newline,
            TokenKind::Identifier,
            TokenKind::Eof,
        ]
    );
    assert!(tokens[2].has_preceding_line_break());
}

#[test]
fn quoted_string_sets_flags() {
    let source = "name=\"va\\\"lue\"";
    let tokens = Lexer::new(source).lex();
    let string = tokens
        .iter()
        .find(|token| token.kind == TokenKind::String)
        .expect("string token");
    assert!(string.flags.contains(TokenFlags::WAS_QUOTED));
    assert!(string.flags.contains(TokenFlags::HAS_ESCAPE));
}

#[test]
fn unterminated_string_emits_diagnostic_and_recovers_at_line_end() {
    let source = "a=\"oops\nb=2\n";
    let mut lexer = Lexer::new(source);
    let tokens = lexer.lex();

    assert_eq!(lexer.diagnostics().len(), 1);
    assert_eq!(lexer.diagnostics()[0].code, "LEXER_UNTERMINATED_STRING");

    // The string stops before the newline; lexing continues on the next line.
    let after: Vec<_> = tokens.iter().map(|token| token.kind).collect();
    assert!(after.contains(&TokenKind::Newline));
    assert_eq!(
        after.iter().filter(|kind| **kind == TokenKind::Identifier).count(),
        2
    );
}

#[test]
fn multiline_strings_are_opt_in() {
    let source = "ooo=\"hello\n     world\"\n";

    // The broken-off string leaves a stray quote on the next line, so the
    // strict lexer reports two unterminated strings.
    let mut strict = Lexer::new(source);
    strict.lex();
    assert_eq!(strict.diagnostics().len(), 2);

    let mut permitting = Lexer::new(source).with_multiline_strings(true);
    let tokens = permitting.lex();
    assert!(permitting.diagnostics().is_empty());
    let string = tokens
        .iter()
        .find(|token| token.kind == TokenKind::String)
        .expect("string token");
    assert_eq!(token_text(source, string), "\"hello\n     world\"");
}

#[test]
fn numbers_split_on_second_dot() {
    let source = "meta_date=1066.9.15";
    let tokens = Lexer::new(source).lex();
    let kinds: Vec<_> = tokens.iter().map(|token| token.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Identifier,
            TokenKind::Equal,
            TokenKind::Float,
            TokenKind::Dot,
            TokenKind::Int,
            TokenKind::Eof,
        ]
    );
    assert_eq!(token_text(source, &tokens[2]), "1066.9");
}

#[test]
fn multi_char_operators_take_priority() {
    assert_eq!(
        kinds("a>=1 b<=2 c!=3 d==4 e?=5"),
        vec![
            TokenKind::Identifier,
            TokenKind::GreaterThanOrEqual,
            TokenKind::Int,
            TokenKind::Whitespace,
            TokenKind::Identifier,
            TokenKind::LessThanOrEqual,
            TokenKind::Int,
            TokenKind::Whitespace,
            TokenKind::Identifier,
            TokenKind::NotEqual,
            TokenKind::Int,
            TokenKind::Whitespace,
            TokenKind::Identifier,
            TokenKind::EqualEqual,
            TokenKind::Int,
            TokenKind::Whitespace,
            TokenKind::Identifier,
            TokenKind::QuestionEqual,
            TokenKind::Int,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn unicode_identifiers_lex_as_single_tokens() {
    let source = "jean_jaurès = { }\n";
    let tokens = Lexer::new(source).lex();
    assert_eq!(tokens[0].kind, TokenKind::Identifier);
    assert_eq!(token_text(source, &tokens[0]), "jean_jaurès");
}

#[test]
fn unknown_bytes_become_skipped_trivia() {
    let source = "a=1 \u{15}\n";
    let tokens = Lexer::new(source).lex();
    assert!(tokens.iter().any(|token| token.kind == TokenKind::Skipped));
    let reconstructed: String = tokens
        .iter()
        .map(|token| token_text(source, token))
        .collect();
    assert_eq!(reconstructed, source);
}

#[test]
fn eof_is_emitted_once_then_repeated_zero_width() {
    let mut lexer = Lexer::new("a");
    assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
    let first_eof = lexer.next_token();
    let second_eof = lexer.next_token();
    assert_eq!(first_eof.kind, TokenKind::Eof);
    assert_eq!(second_eof.kind, TokenKind::Eof);
    assert!(second_eof.range.is_empty());
    assert_eq!(first_eof.range, second_eof.range);
}

#[test]
fn checkpoint_rewind_restores_state_and_truncates_diagnostics() {
    let source = "a \"oops\nb";
    let mut lexer = Lexer::new(source);
    assert_eq!(lexer.next_token().kind, TokenKind::Identifier);
    assert_eq!(lexer.next_token().kind, TokenKind::Whitespace);

    let checkpoint = lexer.checkpoint();
    assert_eq!(lexer.next_token().kind, TokenKind::String);
    assert_eq!(lexer.diagnostics().len(), 1);

    lexer.rewind(checkpoint);
    assert!(lexer.diagnostics().is_empty());
    assert_eq!(lexer.current(), TokenKind::Whitespace);

    // Relexing after rewind reproduces the same tokens.
    assert_eq!(lexer.next_token().kind, TokenKind::String);
    assert_eq!(lexer.diagnostics().len(), 1);
}

#[test]
fn buffered_lexer_nth_non_trivia_skips_trivia() {
    let lexer = Lexer::new("a = 1 # c\nb");
    let mut buffered = BufferedLexer::new(lexer);
    buffered.next_token(LexContext::regular());
    assert_eq!(buffered.current(), TokenKind::Identifier);

    let first = buffered.nth_non_trivia(1).expect("first lookahead");
    let second = buffered.nth_non_trivia(2).expect("second lookahead");
    let third = buffered.nth_non_trivia(3).expect("third lookahead");
    assert_eq!(first.kind, TokenKind::Equal);
    assert_eq!(second.kind, TokenKind::Int);
    assert_eq!(third.kind, TokenKind::Identifier);
    assert!(third.has_preceding_line_break());

    // Lookahead does not disturb the current token.
    assert_eq!(buffered.current(), TokenKind::Identifier);

    // Consuming afterwards walks through the buffered tokens in order.
    assert_eq!(buffered.next_token(LexContext::regular()), TokenKind::Whitespace);
    assert_eq!(buffered.next_token(LexContext::regular()), TokenKind::Equal);
}

#[test]
fn buffered_lexer_lookahead_past_eof_returns_none() {
    let lexer = Lexer::new("a");
    let mut buffered = BufferedLexer::new(lexer);
    buffered.next_token(LexContext::regular());
    assert_eq!(buffered.nth_non_trivia(1), None);
}

#[test]
fn buffered_lexer_rewind_clears_lookahead() {
    let lexer = Lexer::new("a b c");
    let mut buffered = BufferedLexer::new(lexer);
    buffered.next_token(LexContext::regular());
    let checkpoint = buffered.checkpoint();

    buffered.nth_non_trivia(2);
    buffered.next_token(LexContext::regular());
    buffered.rewind(checkpoint);

    assert_eq!(buffered.current(), TokenKind::Identifier);
    let first = buffered.nth_non_trivia(1).expect("lookahead after rewind");
    assert_eq!(first.kind, TokenKind::Identifier);
}

//! Event-driven parser: token source, parser core, grammar, recovery, and
//! the lossless tree sink, plus the `parse` front-ends that wire them up.

pub mod event;
pub mod grammar;
pub mod lists;
pub mod marker;
pub mod options;
#[allow(clippy::module_inception)]
pub mod parser;
pub mod recovery;
pub mod token_source;
pub mod tree_sink;

pub use event::{Event, TreeSink, process_events};
pub use grammar::{parse_source_file, parse_statement_list};
pub use lists::{ParsedSyntax, parse_node_list};
pub use marker::{CompletedMarker, Marker};
pub use options::{ParseMode, ParserOptions};
pub use parser::{Parser, ParserCheckpoint, ParserProgress, TokenSet};
pub use recovery::{ParseRecoveryTokenSet, RecoveryError};
pub use token_source::{TokenSource, TokenSourceCheckpoint};
pub use tree_sink::{LosslessTreeSink, ParsedGreenTree};

use crate::lexer::{BufferedLexer, Lexer};

/// Parse `text` with strict-mode defaults.
pub fn parse(text: &str) -> ParsedGreenTree {
    parse_with_options(text, ParserOptions::default())
}

/// Parse `text` with the documented defaults for `mode`.
pub fn parse_with_mode(text: &str, mode: ParseMode) -> ParsedGreenTree {
    parse_with_options(text, ParserOptions::for_mode(mode))
}

/// Parse `text` with explicit options.
pub fn parse_with_options(text: &str, options: ParserOptions) -> ParsedGreenTree {
    tracing::debug!(len = text.len(), mode = ?options.mode, "parsing source");

    // Game script strings legitimately span lines (save games, quoted
    // display names), so the front-end opts the lexer in.
    let lexer = Lexer::new(text).with_multiline_strings(true);
    let buffered = BufferedLexer::new(lexer);
    let source = TokenSource::new(buffered);
    let mut parser = Parser::new(source, options);

    parse_source_file(&mut parser);

    let (mut events, parser_diagnostics, source) = parser.finish();
    let (trivia, lexer_diagnostics) = source.finish();

    let mut diagnostics = lexer_diagnostics;
    diagnostics.extend(parser_diagnostics);

    let mut sink = LosslessTreeSink::new(text, trivia);
    process_events(&mut sink, &mut events, diagnostics);
    sink.finish()
}

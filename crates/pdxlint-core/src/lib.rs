//! pdxlint core
//!
//! Core engine for parsing and analyzing Jomini game script, the C-brace
//! key/value/block language used across Paradox grand-strategy titles.
//! This crate provides the lossless syntactic pipeline (lexer, buffered
//! lookahead, event-driven parser, green/red CST), the typed AST with shape
//! classification, shared analysis facts, and the parse-result carrier that
//! the lint/type-check/format engines run against.

pub mod analysis;
pub mod ast;
pub mod cst; // Concrete syntax tree (lossless, green/red)
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod result;
pub mod text;

// Re-export commonly used types
pub use analysis::{AnalysisFacts, FieldFact, ValueShape, build_analysis_facts};
pub use ast::{
    AstBlock, AstBlockView, AstError, AstKeyValue, AstObject, AstObjectMultimap, AstScalar,
    AstSourceFile, AstStatement, AstTaggedBlockValue, AstValue, NumberValue, ScalarInterpretation,
    interpret_scalar, lower_syntax_tree,
};
pub use cst::{
    GreenElement, GreenNode, GreenToken, JominiSyntaxKind, SyntaxElement, SyntaxNode, SyntaxToken,
    from_green,
};
pub use diagnostics::{Diagnostic, DiagnosticSpec, Severity, dedupe_diagnostics, has_errors,
    sort_diagnostics};
pub use lexer::{BufferedLexer, LexContext, Lexer, Token, TokenFlags, TokenKind};
pub use parser::{
    ParseMode, ParsedGreenTree, Parser, ParserOptions, parse, parse_with_mode, parse_with_options,
};
pub use result::{
    JominiParseResult, parse_result, parse_result_with_mode, parse_result_with_options,
};
pub use text::{TextLen, TextRange, TextSize};

/// Initialize the tracing subscriber for logging
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pdxlint=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

//! Parse-result carrier shared by the lint, type-check, and format engines.

use std::rc::Rc;

use once_cell::unsync::OnceCell;

use crate::analysis::{AnalysisFacts, build_analysis_facts};
use crate::ast::{AstBlock, AstBlockView, AstSourceFile, lower_syntax_tree};
use crate::cst::{GreenNode, SyntaxNode, from_green};
use crate::diagnostics::{Diagnostic, has_errors};
use crate::parser::{ParseMode, ParsedGreenTree, ParserOptions, parse_with_options};

/// The single carrier for one parsed input text.
///
/// Owns the source, the green tree, and all diagnostics, and lazily caches
/// every downstream view so that running multiple engines over the same
/// source reuses one parse lifecycle. Accessors are idempotent: repeated
/// calls return pointer-equal objects.
pub struct JominiParseResult {
    source_text: String,
    parsed: ParsedGreenTree,
    options: ParserOptions,
    syntax_root: OnceCell<SyntaxNode>,
    ast_root: OnceCell<Rc<AstSourceFile>>,
    root_view: OnceCell<Rc<AstBlockView>>,
    analysis_facts: OnceCell<Rc<AnalysisFacts>>,
}

impl JominiParseResult {
    pub fn new(source_text: impl Into<String>, parsed: ParsedGreenTree, options: ParserOptions) -> Self {
        Self {
            source_text: source_text.into(),
            parsed,
            options,
            syntax_root: OnceCell::new(),
            ast_root: OnceCell::new(),
            root_view: OnceCell::new(),
            analysis_facts: OnceCell::new(),
        }
    }

    pub fn source_text(&self) -> &str {
        &self.source_text
    }

    pub fn options(&self) -> &ParserOptions {
        &self.options
    }

    pub fn green_root(&self) -> &GreenNode {
        &self.parsed.root
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.parsed.diagnostics
    }

    pub fn has_errors(&self) -> bool {
        has_errors(&self.parsed.diagnostics)
    }

    /// Red tree over the green root, built on first use.
    pub fn syntax_root(&self) -> SyntaxNode {
        self.syntax_root
            .get_or_init(|| from_green(&self.parsed.root, &self.source_text))
            .clone()
    }

    /// Lowered AST, built on first use.
    pub fn ast_root(&self) -> Rc<AstSourceFile> {
        self.ast_root
            .get_or_init(|| Rc::new(lower_syntax_tree(&self.syntax_root())))
            .clone()
    }

    /// The source file wrapped in a block view.
    pub fn root_view(&self) -> Rc<AstBlockView> {
        self.root_view
            .get_or_init(|| {
                let ast = self.ast_root();
                Rc::new(AstBlockView::new(AstBlock {
                    statements: ast.statements.clone(),
                }))
            })
            .clone()
    }

    /// Analysis facts, built once from the AST.
    pub fn analysis_facts(&self) -> Rc<AnalysisFacts> {
        self.analysis_facts
            .get_or_init(|| Rc::new(build_analysis_facts(&self.ast_root())))
            .clone()
    }
}

impl std::fmt::Debug for JominiParseResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JominiParseResult")
            .field("source_len", &self.source_text.len())
            .field("diagnostics", &self.parsed.diagnostics.len())
            .field("mode", &self.options.mode)
            .finish()
    }
}

/// Parse `text` into a shareable parse result with strict-mode defaults.
pub fn parse_result(text: &str) -> Rc<JominiParseResult> {
    parse_result_with_options(text, ParserOptions::default())
}

/// Parse `text` with the documented defaults for `mode`.
pub fn parse_result_with_mode(text: &str, mode: ParseMode) -> Rc<JominiParseResult> {
    parse_result_with_options(text, ParserOptions::for_mode(mode))
}

/// Parse `text` with explicit options.
pub fn parse_result_with_options(text: &str, options: ParserOptions) -> Rc<JominiParseResult> {
    let parsed = parse_with_options(text, options);
    Rc::new(JominiParseResult::new(text, parsed, options))
}

//! Structured diagnostics and the registry of stable diagnostic codes.
//!
//! Every diagnostic the pipeline can emit is declared here as a
//! [`DiagnosticSpec`] constant so that codes stay stable across releases and
//! the rule engines can validate their prefixes at registration time.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::text::TextRange;

/// Severity levels for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Findings that should be addressed but do not invalidate the input.
    Warning,
    /// Errors that must be fixed.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A structured diagnostic emitted by the lexer, parser, or a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Stable identifier, e.g. `PARSER_EXPECTED_VALUE`.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Source range the diagnostic points at.
    pub range: TextRange,
    /// Severity of the finding.
    pub severity: Severity,
    /// Optional remediation hint.
    pub hint: Option<String>,
    /// Optional category, e.g. `parser` or `lint/style`.
    pub category: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        range: TextRange,
        severity: Severity,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            range,
            severity,
            hint: None,
            category: None,
        }
    }

    /// Attach a remediation hint.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Attach a category.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Static description of one diagnostic code.
#[derive(Debug, Clone, Copy)]
pub struct DiagnosticSpec {
    pub code: &'static str,
    pub message: &'static str,
    pub hint: Option<&'static str>,
    pub severity: Severity,
    pub category: Option<&'static str>,
}

impl DiagnosticSpec {
    /// Instantiate the spec with its default message at `range`.
    pub fn diagnostic(&self, range: TextRange) -> Diagnostic {
        self.with_message(self.message, range)
    }

    /// Instantiate the spec with a custom message at `range`.
    pub fn with_message(&self, message: impl Into<String>, range: TextRange) -> Diagnostic {
        Diagnostic {
            code: self.code.to_string(),
            message: message.into(),
            range,
            severity: self.severity,
            hint: self.hint.map(str::to_string),
            category: self.category.map(str::to_string),
        }
    }
}

pub const LEXER_UNTERMINATED_STRING: DiagnosticSpec = DiagnosticSpec {
    code: "LEXER_UNTERMINATED_STRING",
    message: "Unterminated string literal.",
    hint: Some("Close the string with a double quote or enable multiline strings."),
    severity: Severity::Error,
    category: Some("lexer"),
};

pub const PARSER_EXPECTED_VALUE: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_EXPECTED_VALUE",
    message: "Expected a value",
    hint: None,
    severity: Severity::Error,
    category: Some("parser"),
};

pub const PARSER_EXPECTED_TOKEN: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_EXPECTED_TOKEN",
    message: "Expected token",
    hint: None,
    severity: Severity::Error,
    category: Some("parser"),
};

pub const PARSER_UNEXPECTED_TOKEN: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_UNEXPECTED_TOKEN",
    message: "Unexpected token",
    hint: None,
    severity: Severity::Error,
    category: Some("parser"),
};

pub const PARSER_LEGACY_EXTRA_RBRACE: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_LEGACY_EXTRA_RBRACE",
    message: "Ignoring extra closing brace in permissive mode",
    hint: None,
    severity: Severity::Warning,
    category: Some("parser"),
};

pub const PARSER_LEGACY_MISSING_RBRACE: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_LEGACY_MISSING_RBRACE",
    message: "Missing closing brace tolerated in permissive mode",
    hint: None,
    severity: Severity::Warning,
    category: Some("parser"),
};

pub const PARSER_UNSUPPORTED_UNMARKED_LIST: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_UNSUPPORTED_UNMARKED_LIST",
    message: "Unsupported unmarked list form: expected tagged list block, got `list \"...\"`",
    hint: None,
    severity: Severity::Error,
    category: Some("parser"),
};

pub const PARSER_UNSUPPORTED_PARAMETER_SYNTAX: DiagnosticSpec = DiagnosticSpec {
    code: "PARSER_UNSUPPORTED_PARAMETER_SYNTAX",
    message: "Unsupported parameter syntax scalar (`[[...]]` or `$...$`)",
    hint: None,
    severity: Severity::Error,
    category: Some("parser"),
};

pub const TYPECHECK_INCONSISTENT_VALUE_SHAPE: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_INCONSISTENT_VALUE_SHAPE",
    message: "Top-level key mixes incompatible value shapes.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const TYPECHECK_INVALID_FIELD_TYPE: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_INVALID_FIELD_TYPE",
    message: "Field value does not match schema type constraints.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const TYPECHECK_INVALID_FIELD_REFERENCE: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_INVALID_FIELD_REFERENCE",
    message: "Field value does not match schema reference constraints.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const TYPECHECK_INVALID_SCOPE_CONTEXT: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_INVALID_SCOPE_CONTEXT",
    message: "Field is used outside its allowed scope context.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_AMBIGUOUS_SCOPE_CONTEXT",
    message: "Scope context is ambiguous due to conflicting scope alias replacements.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const TYPECHECK_RULE_CUSTOM_ERROR: DiagnosticSpec = DiagnosticSpec {
    code: "TYPECHECK_RULE_CUSTOM_ERROR",
    message: "Field matched a custom error rule.",
    hint: None,
    severity: Severity::Warning,
    category: Some("typecheck"),
};

pub const LINT_SEMANTIC_INCONSISTENT_SHAPE: DiagnosticSpec = DiagnosticSpec {
    code: "LINT_SEMANTIC_INCONSISTENT_SHAPE",
    message: "Semantic rule: mixed value shapes should be normalized.",
    hint: None,
    severity: Severity::Warning,
    category: Some("lint/semantic"),
};

pub const LINT_SEMANTIC_MISSING_REQUIRED_FIELD: DiagnosticSpec = DiagnosticSpec {
    code: "LINT_SEMANTIC_MISSING_REQUIRED_FIELD",
    message: "Semantic rule: required field missing according to the schema.",
    hint: None,
    severity: Severity::Warning,
    category: Some("lint/semantic"),
};

pub const LINT_STYLE_SINGLE_LINE_BLOCK: DiagnosticSpec = DiagnosticSpec {
    code: "LINT_STYLE_SINGLE_LINE_BLOCK",
    message: "Style rule: multi-value blocks should be split across lines.",
    hint: None,
    severity: Severity::Warning,
    category: Some("lint/style"),
};

/// True if any diagnostic carries error severity.
pub fn has_errors(diagnostics: &[Diagnostic]) -> bool {
    diagnostics
        .iter()
        .any(|diagnostic| diagnostic.severity == Severity::Error)
}

/// Sort diagnostics by `(range.start, range.end, code, message)`.
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| {
        u32::from(a.range.start())
            .cmp(&u32::from(b.range.start()))
            .then_with(|| u32::from(a.range.end()).cmp(&u32::from(b.range.end())))
            .then_with(|| a.code.cmp(&b.code))
            .then_with(|| a.message.cmp(&b.message))
    });
}

/// Drop duplicates under the `(range, code, message, category, hint)` key,
/// keeping first occurrences in order.
pub fn dedupe_diagnostics(diagnostics: Vec<Diagnostic>) -> Vec<Diagnostic> {
    let mut seen: std::collections::HashSet<(u32, u32, String, String, Option<String>, Option<String>)> =
        std::collections::HashSet::new();
    let mut deduped = Vec::with_capacity(diagnostics.len());
    for diagnostic in diagnostics {
        let key = (
            u32::from(diagnostic.range.start()),
            u32::from(diagnostic.range.end()),
            diagnostic.code.clone(),
            diagnostic.message.clone(),
            diagnostic.category.clone(),
            diagnostic.hint.clone(),
        );
        if seen.insert(key) {
            deduped.push(diagnostic);
        }
    }
    deduped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{TextRange, TextSize};

    fn range(start: u32, end: u32) -> TextRange {
        TextRange::new(TextSize::from(start), TextSize::from(end))
    }

    #[test]
    fn has_errors_distinguishes_severities() {
        let warning = PARSER_LEGACY_EXTRA_RBRACE.diagnostic(range(0, 1));
        let error = PARSER_EXPECTED_VALUE.diagnostic(range(0, 1));
        assert!(!has_errors(&[warning.clone()]));
        assert!(has_errors(&[warning, error]));
    }

    #[test]
    fn sort_orders_by_range_then_code() {
        let mut diagnostics = vec![
            PARSER_UNEXPECTED_TOKEN.diagnostic(range(5, 6)),
            PARSER_EXPECTED_VALUE.diagnostic(range(0, 2)),
            PARSER_EXPECTED_TOKEN.diagnostic(range(0, 2)),
        ];
        sort_diagnostics(&mut diagnostics);
        assert_eq!(diagnostics[0].code, "PARSER_EXPECTED_TOKEN");
        assert_eq!(diagnostics[1].code, "PARSER_EXPECTED_VALUE");
        assert_eq!(diagnostics[2].code, "PARSER_UNEXPECTED_TOKEN");
    }

    #[test]
    fn dedupe_removes_exact_duplicates_only() {
        let diagnostic = PARSER_EXPECTED_VALUE.diagnostic(range(1, 2));
        let other_range = PARSER_EXPECTED_VALUE.diagnostic(range(2, 3));
        let deduped = dedupe_diagnostics(vec![diagnostic.clone(), diagnostic, other_range]);
        assert_eq!(deduped.len(), 2);
    }
}

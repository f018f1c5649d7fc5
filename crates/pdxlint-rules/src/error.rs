//! Error types for the rule engine.

use thiserror::Error;

/// Errors raised by rule registration and pipeline entrypoints.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A rule failed registration validation (wrong code prefix etc.).
    #[error("invalid {family} rule `{name}`: {reason}")]
    InvalidRule {
        family: &'static str,
        name: String,
        reason: String,
    },

    /// A pre-built run result was supplied that does not reuse the same
    /// parse result as the current invocation.
    #[error("provided {what} must reuse the same parse result")]
    MismatchedParse { what: &'static str },
}

impl EngineError {
    pub fn invalid_typecheck_rule(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            family: "typecheck",
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_lint_rule(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            family: "lint",
            name: name.into(),
            reason: reason.into(),
        }
    }
}

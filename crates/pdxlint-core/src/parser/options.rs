//! Parser modes and configuration options.

use serde::{Deserialize, Serialize};

/// Top-level parser behavior profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// All legacy tolerances off.
    #[default]
    Strict,
    /// Tolerate the legacy constructs that shipped game files rely on.
    Permissive,
}

/// Feature flags controlling grammar compatibility and recovery behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserOptions {
    pub mode: ParseMode,
    /// Consume a stray `}` at statement position with a warning.
    pub allow_legacy_extra_rbrace: bool,
    /// Tolerate EOF before a block's closing `}` with a warning.
    pub allow_legacy_missing_rbrace: bool,
    /// Treat `;` as a statement terminator.
    pub allow_semicolon_terminator: bool,
    /// Allow bare array elements after key-values inside blocks.
    pub allow_alternating_value_key_value: bool,
    /// Accept `[[...]]` / `$...$` parameter scalars.
    pub allow_parameter_syntax: bool,
    /// Accept the legacy `key = list "name"` form.
    pub allow_unmarked_list_form: bool,
    /// Allow bare scalars after key-values at top level.
    pub allow_bare_scalar_after_key_value: bool,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self::for_mode(ParseMode::Strict)
    }
}

impl ParserOptions {
    /// The documented defaults for `mode`.
    pub fn for_mode(mode: ParseMode) -> Self {
        match mode {
            ParseMode::Strict => Self {
                mode,
                allow_legacy_extra_rbrace: false,
                allow_legacy_missing_rbrace: false,
                allow_semicolon_terminator: false,
                allow_alternating_value_key_value: false,
                allow_parameter_syntax: false,
                allow_unmarked_list_form: false,
                allow_bare_scalar_after_key_value: false,
            },
            ParseMode::Permissive => Self {
                mode,
                allow_legacy_extra_rbrace: true,
                allow_legacy_missing_rbrace: true,
                allow_semicolon_terminator: true,
                allow_alternating_value_key_value: true,
                allow_parameter_syntax: false,
                allow_unmarked_list_form: false,
                allow_bare_scalar_after_key_value: false,
            },
        }
    }

    pub fn strict() -> Self {
        Self::for_mode(ParseMode::Strict)
    }

    pub fn permissive() -> Self {
        Self::for_mode(ParseMode::Permissive)
    }
}

//! The Skroll language front end.
//!
//! Source text goes through the indentation-aware [`lexer`], the block
//! [`parser`] (with the [`expr`] grammar for conditions and values), the
//! [`builder`] that produces a [`skr_core::Script`], and the two passes in
//! [`validate`]. [`parse`] runs all of it and never fails.

/// Syntax tree types.
pub mod ast;
/// Syntax tree to script model.
pub mod builder;
/// Parse options.
pub mod config;
/// Diagnostic types and ariadne rendering.
pub mod diagnostics;
/// Expression grammar for guards and values.
pub mod expr;
/// Tokenizer with indentation tracking.
pub mod lexer;
/// Block parser with error recovery.
pub mod parser;
/// Syntactic and semantic checks.
pub mod validate;

use skr_core::{LineIndex, Script};

pub use config::ParseConfig;
pub use diagnostics::{Diagnostic, Severity, has_errors, render_diagnostics};

/// The outcome of parsing one script.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseResult {
    /// The built script, possibly partial.
    pub script: Script,
    /// Syntactic diagnostics followed by semantic ones.
    pub diagnostics: Vec<Diagnostic>,
}

impl ParseResult {
    /// Returns `true` if any diagnostic has error severity.
    pub fn has_errors(&self) -> bool {
        has_errors(&self.diagnostics)
    }
}

/// Parse a source string with the default configuration.
pub fn parse(source: &str) -> ParseResult {
    parse_with(source, &ParseConfig::default())
}

/// Parse a source string.
///
/// Total for any input: malformed text only adds diagnostics and `unknown`
/// nodes.
pub fn parse_with(source: &str, config: &ParseConfig) -> ParseResult {
    let tokens = lexer::lex_with_tab_width(source, config.tab_width);
    let file = parser::parse(&tokens, source.len());
    let script = builder::build(&file, source);

    let index = LineIndex::new(source);
    let mut diagnostics = validate::syntax_diagnostics(&file, &index);
    diagnostics.extend(validate::semantic_diagnostics(&script, &file, &index));
    log::debug!(
        "parse finished: {} nodes, {} diagnostics",
        script.nodes.len(),
        diagnostics.len()
    );

    ParseResult {
        script,
        diagnostics,
    }
}

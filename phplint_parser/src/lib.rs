//! phplint_parser
//!
//! Pure Rust parser for PHP source files. Produces a concrete syntax tree
//! with named fields, recovering from syntax errors so that the rest of a
//! file can still be analyzed.
//!
//! # Example
//!
//! ```
//! use phplint_parser::{parse, NodeKind};
//!
//! let cst = parse("<?php $x = 42;").expect("parse failed");
//! assert_eq!(cst.kind, NodeKind::SourceFile);
//! ```

pub mod cst;
pub mod error;
pub mod lexer;
pub mod node_kind;
pub mod parser;
pub mod span;
pub mod token;

pub use cst::{CstNode, CstWalker};
pub use error::{ParseError, ParseErrors, ParseResult};
pub use lexer::{Lexer, SpannedToken};
pub use node_kind::NodeKind;
pub use parser::{Parser, MAX_NESTING_DEPTH};
pub use span::{SourceMap, Span};
pub use token::{Associativity, Precedence, Token};

/// Parse PHP source code into a CST, failing on the first syntax error
pub fn parse(source: &str) -> ParseResult<CstNode> {
    let (cst, errors) = parser::parse(source);
    match errors.into_iter().next() {
        None => Ok(cst),
        Some(first) => Err(first),
    }
}

/// Parse PHP source code with error recovery
///
/// Returns a CST even if there are parse errors, along with the errors.
pub fn parse_with_errors(source: &str) -> (CstNode, ParseErrors) {
    parser::parse(source)
}

/// Tokenize PHP source code
pub fn tokenize(source: &str) -> Vec<Result<SpannedToken<'_>, ParseError>> {
    lexer::tokenize(source)
}

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty() {
        let cst = parse("").unwrap();
        assert_eq!(cst.kind, NodeKind::SourceFile);
        assert!(cst.children.is_empty());
    }

    #[test]
    fn test_html_only_file() {
        let cst = parse("<html></html>").unwrap();
        assert_eq!(cst.children[0].kind, NodeKind::InlineHtml);
    }

    #[test]
    fn test_parse_reports_first_error() {
        let err = parse("<?php $a = ;").unwrap_err();
        assert!(matches!(err, ParseError::UnexpectedToken { .. }));
    }

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}

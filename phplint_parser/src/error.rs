//! Parse error types

use crate::span::Span;
use thiserror::Error;

/// Parse error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("unexpected '{found}', expected {expected}")]
    UnexpectedToken {
        found: String,
        expected: String,
        span: Span,
    },

    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof { expected: String, span: Span },

    #[error("unterminated string literal")]
    UnterminatedString { span: Span },

    #[error("unterminated comment")]
    UnterminatedComment { span: Span },

    #[error("unterminated heredoc '{label}'")]
    UnterminatedHeredoc { label: String, span: Span },

    #[error("invalid number literal '{literal}'")]
    InvalidNumber { literal: String, span: Span },

    #[error("{message}")]
    InvalidSyntax { message: String, span: Span },

    #[error("nesting deeper than {limit} levels")]
    NestingTooDeep { limit: usize, span: Span },

    #[error("unrecognized character")]
    LexerError { span: Span },
}

impl ParseError {
    pub fn span(&self) -> &Span {
        match self {
            ParseError::UnexpectedToken { span, .. }
            | ParseError::UnexpectedEof { span, .. }
            | ParseError::UnterminatedString { span }
            | ParseError::UnterminatedComment { span }
            | ParseError::UnterminatedHeredoc { span, .. }
            | ParseError::InvalidNumber { span, .. }
            | ParseError::InvalidSyntax { span, .. }
            | ParseError::NestingTooDeep { span, .. }
            | ParseError::LexerError { span } => span,
        }
    }

    pub fn unexpected_token(
        found: impl Into<String>,
        expected: impl Into<String>,
        span: Span,
    ) -> Self {
        ParseError::UnexpectedToken {
            found: found.into(),
            expected: expected.into(),
            span,
        }
    }

    pub fn unexpected_eof(expected: impl Into<String>, span: Span) -> Self {
        ParseError::UnexpectedEof {
            expected: expected.into(),
            span,
        }
    }

    pub fn invalid_syntax(message: impl Into<String>, span: Span) -> Self {
        ParseError::InvalidSyntax {
            message: message.into(),
            span,
        }
    }

    /// Render the offending source line with a caret marker under the error
    pub fn format_with_context(&self, source: &str) -> String {
        let span = self.span();
        let Some(line) = source.lines().nth(span.start_line.saturating_sub(1)) else {
            return String::new();
        };
        let col = span.start_column.saturating_sub(1);
        let width = if span.start_line == span.end_line {
            span.end_column.saturating_sub(span.start_column).max(1)
        } else {
            1
        };
        let width = width.min(line.len().saturating_sub(col)).max(1);
        let gutter = " ".repeat(span.start_line.to_string().len());
        format!(
            "  {} | {}\n  {} | {}{}",
            span.start_line,
            line,
            gutter,
            " ".repeat(col),
            "^".repeat(width)
        )
    }
}

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Errors collected while recovering from bad input
#[derive(Debug, Default, Clone)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl ParseErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ParseError> {
        self.errors.first()
    }

    /// Format all errors with source context, one block per error
    pub fn format_all(&self, source: &str) -> String {
        self.errors
            .iter()
            .map(|e| format!("{}\n{}", e, e.format_with_context(source)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::SourceMap;

    #[test]
    fn test_unexpected_token_message() {
        let span = SourceMap::new("$a = ;").span(5, 6);
        let err = ParseError::unexpected_token(";", "expression", span);
        assert_eq!(err.to_string(), "unexpected ';', expected expression");
        assert_eq!(err.span().start_column, 6);
    }

    #[test]
    fn test_format_with_context() {
        let source = "<?php\n$a = ;\n";
        let span = SourceMap::new(source).span(11, 12);
        let err = ParseError::unexpected_token(";", "expression", span);
        let context = err.format_with_context(source);
        assert!(context.contains("$a = ;"));
        assert!(context.ends_with("     ^"));
    }

    #[test]
    fn test_parse_errors_collection() {
        let mut errors = ParseErrors::new();
        assert!(errors.is_empty());
        errors.push(ParseError::unexpected_eof("'}'", Span::empty()));
        errors.push(ParseError::invalid_syntax("bad", Span::empty()));
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors.first(), Some(ParseError::UnexpectedEof { .. })));
        assert_eq!(errors.into_iter().count(), 2);
    }
}

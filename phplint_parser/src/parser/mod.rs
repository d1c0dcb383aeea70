//! Recursive descent parser for PHP
//!
//! Converts the token stream from the lexer into CST nodes. Statements are
//! parsed by recursive descent, expressions by precedence climbing.

mod collections;
mod expressions;
mod literals;
mod statements;

use crate::cst::CstNode;
use crate::error::{ParseError, ParseErrors, ParseResult};
use crate::lexer::{Lexer, SpannedToken};
use crate::node_kind::NodeKind;
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// Deepest expression or statement nesting the parser descends into
pub const MAX_NESTING_DEPTH: usize = 128;

/// PHP parser
#[derive(Debug)]
pub struct Parser<'a> {
    pub(crate) source: &'a str,
    pub(crate) lexer: Lexer<'a>,
    pub(crate) source_map: SourceMap,
    /// Current token
    pub(crate) current: Option<SpannedToken<'a>>,
    /// Doc comment immediately preceding `current`
    pub(crate) pending_doc: Option<SpannedToken<'a>>,
    /// End offset of the last consumed token
    pub(crate) prev_end: usize,
    /// Current expression/statement nesting
    pub(crate) depth: usize,
    pub(crate) errors: ParseErrors,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str) -> Self {
        Self::with_lexer(source, Lexer::new(source))
    }

    /// Parser for PHP code embedded in a string at `start..end` of `source`
    pub(crate) fn embedded(source: &'a str, start: usize, end: usize) -> Self {
        let source = &source[..end.min(source.len())];
        Self::with_lexer(source, Lexer::new_php(source, start))
    }

    fn with_lexer(source: &'a str, lexer: Lexer<'a>) -> Self {
        let source_map = lexer.source_map().clone();
        Self {
            source,
            lexer,
            source_map,
            current: None,
            pending_doc: None,
            prev_end: 0,
            depth: 0,
            errors: ParseErrors::new(),
        }
    }

    /// Parse the source and return a SourceFile CST node
    pub fn parse(mut self) -> (CstNode, ParseErrors) {
        self.advance();
        let children = self.parse_statements_until(&[]);
        let span = self.source_map.span(0, self.source.len());
        let root = CstNode::with_children(NodeKind::SourceFile, span, children);
        (root, self.errors)
    }

    /// Parse a single embedded expression, requiring all input to be consumed
    pub(crate) fn parse_embedded_expression(mut self) -> (ParseResult<CstNode>, ParseErrors) {
        self.advance();
        let result = self.parse_expression().and_then(|expr| match &self.current {
            None => Ok(expr),
            Some(tok) => Err(ParseError::unexpected_token(
                tok.text,
                "end of interpolated expression",
                tok.span,
            )),
        });
        (result, self.errors)
    }

    // ==================== Token Management ====================

    /// Advance to the next significant token, returning the consumed one
    pub(crate) fn advance(&mut self) -> Option<SpannedToken<'a>> {
        let prev = self.current.take();
        if let Some(tok) = &prev {
            self.prev_end = tok.span.end;
        }
        self.pending_doc = None;
        loop {
            match self.lexer.next_token() {
                Some(Ok(token)) if token.token == Token::LineComment => continue,
                Some(Ok(token)) if token.token == Token::DocComment => {
                    self.pending_doc = Some(token);
                }
                Some(Ok(token)) => {
                    self.current = Some(token);
                    break;
                }
                Some(Err(e)) => self.errors.push(e),
                None => break,
            }
        }
        prev
    }

    /// Consume the current token if it matches
    pub(crate) fn eat(&mut self, expected: &Token) -> Option<SpannedToken<'a>> {
        if self.check(expected) {
            self.advance()
        } else {
            None
        }
    }

    pub(crate) fn check(&self, expected: &Token) -> bool {
        self.current.as_ref().is_some_and(|t| &t.token == expected)
    }

    pub(crate) fn check_any(&self, expected: &[Token]) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| expected.contains(&t.token))
    }

    /// Check for an identifier with the given text (case-insensitive)
    pub(crate) fn check_ident(&self, text: &str) -> bool {
        self.current
            .as_ref()
            .is_some_and(|t| t.token == Token::Identifier && t.text.eq_ignore_ascii_case(text))
    }

    pub(crate) fn current_token(&self) -> Option<&Token> {
        self.current.as_ref().map(|t| &t.token)
    }

    /// Look past the current token, skipping comments (0 is the token after `current`)
    pub(crate) fn peek_nth(&mut self, n: usize) -> Option<SpannedToken<'a>> {
        let mut seen = 0;
        let mut i = 0;
        loop {
            match self.lexer.peek_nth(i) {
                None => return None,
                Some(Ok(t)) if t.token.is_comment() => {}
                Some(Ok(t)) => {
                    if seen == n {
                        return Some(t.clone());
                    }
                    seen += 1;
                }
                Some(Err(_)) => {}
            }
            i += 1;
        }
    }

    pub(crate) fn peek_next(&mut self) -> Option<Token> {
        self.peek_nth(0).map(|t| t.token)
    }

    /// Consume the current token if it matches, error otherwise
    pub(crate) fn expect(&mut self, expected: Token, what: &str) -> ParseResult<SpannedToken<'a>> {
        if self.check(&expected) {
            if let Some(tok) = self.advance() {
                return Ok(tok);
            }
        }
        Err(self.unexpected(what))
    }

    /// Build an error for the current token
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match &self.current {
            Some(tok) => ParseError::unexpected_token(tok.text, expected, tok.span),
            None => ParseError::unexpected_eof(expected, self.current_span()),
        }
    }

    /// Statement terminator: `;`, or an implicit one before `?>` / end of file
    pub(crate) fn expect_semicolon(&mut self) -> ParseResult<()> {
        if self.eat(&Token::Semicolon).is_some() || self.check(&Token::CloseTag) || self.is_at_end()
        {
            Ok(())
        } else {
            Err(self.unexpected("';'"))
        }
    }

    /// Run `parse` one nesting level deeper, failing past [`MAX_NESTING_DEPTH`]
    pub(crate) fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> ParseResult<T>,
    ) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep {
                limit: MAX_NESTING_DEPTH,
                span: self.current_span(),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    pub(crate) fn current_span(&self) -> Span {
        self.current
            .as_ref()
            .map(|t| t.span)
            .unwrap_or_else(|| self.source_map.span(self.source.len(), self.source.len()))
    }

    pub(crate) fn current_start(&self) -> usize {
        self.current.as_ref().map_or(self.source.len(), |t| t.span.start)
    }

    /// Span from `start` to the end of the last consumed token
    pub(crate) fn span_from(&self, start: usize) -> Span {
        self.source_map.span(start, self.prev_end.max(start))
    }

    pub(crate) fn is_at_end(&self) -> bool {
        self.current.is_none()
    }

    /// Empty leaf used as a flag field
    pub(crate) fn flag(&self, span: Span) -> CstNode {
        CstNode::new(NodeKind::Flag, span)
    }

    /// Take the doc comment preceding the current token as a node
    pub(crate) fn take_doc(&mut self) -> Option<CstNode> {
        self.pending_doc
            .take()
            .map(|t| CstNode::leaf(NodeKind::DocComment, t.span, t.text))
    }

    /// Error recovery: skip tokens until a statement boundary
    pub(crate) fn synchronize(&mut self) {
        let mut last = self.advance();
        while !self.is_at_end() {
            if last.as_ref().is_some_and(|t| t.token == Token::Semicolon) {
                return;
            }
            if self.check_any(&[
                Token::RBrace,
                Token::CloseTag,
                Token::KwFunction,
                Token::KwClass,
                Token::KwInterface,
                Token::KwTrait,
                Token::KwIf,
                Token::KwFor,
                Token::KwForeach,
                Token::KwWhile,
                Token::KwReturn,
                Token::KwTry,
                Token::KwNamespace,
                Token::KwUse,
            ]) {
                return;
            }
            last = self.advance();
        }
    }

    // ==================== Statement Lists ====================

    /// Parse statements until one of `terminators` (or end of input)
    pub(crate) fn parse_statements_until(&mut self, terminators: &[Token]) -> Vec<CstNode> {
        let mut children = Vec::new();
        loop {
            match self.current_token().cloned() {
                None => break,
                Some(tok) if terminators.contains(&tok) => break,
                Some(Token::OpenTag | Token::CloseTag) => {
                    self.advance();
                    continue;
                }
                _ => {}
            }
            let start = self.current_start();
            match self.parse_statement() {
                Ok(node) => children.push(node),
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize();
                    children.push(CstNode::new(NodeKind::Error, self.span_from(start)));
                }
            }
        }
        children
    }

    /// Parse a block of statements until one of the given tokens (not consumed)
    pub(crate) fn parse_block_until(&mut self, terminators: &[Token]) -> CstNode {
        let start = self.current_start();
        let children = self.parse_statements_until(terminators);
        let end = self.prev_end.max(start);
        CstNode::with_children(NodeKind::Block, self.source_map.span(start, end), children)
    }
}

/// Parse PHP source code into a CST
pub fn parse(source: &str) -> (CstNode, ParseErrors) {
    Parser::new(source).parse()
}

//! Jump statement parsers (return, break, continue, goto)

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `return [expr];`
    pub(crate) fn parse_return_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwReturn, "'return'")?.span.start;
        let value = if self.check_any(&[Token::Semicolon, Token::CloseTag]) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        let mut node = CstNode::new(NodeKind::ReturnStatement, self.span_from(start));
        node.push_opt_field("value", value);
        Ok(node)
    }

    /// `break [n];` / `continue [n];`
    pub(crate) fn parse_break_statement(&mut self, kind: NodeKind) -> ParseResult<CstNode> {
        let start = self.current_start();
        self.advance();
        let depth = if self.check_any(&[Token::Semicolon, Token::CloseTag]) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };
        self.expect_semicolon()?;
        let mut node = CstNode::new(kind, self.span_from(start));
        node.push_opt_field("depth", depth);
        Ok(node)
    }

    /// `goto label;`
    pub(crate) fn parse_goto_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwGoto, "'goto'")?.span.start;
        let label = self.expect(Token::Identifier, "label")?;
        self.expect_semicolon()?;
        let label = CstNode::leaf(NodeKind::Name, label.span, label.text);
        Ok(CstNode::new(NodeKind::GotoStatement, self.span_from(start)).field("label", label))
    }
}

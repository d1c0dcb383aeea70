//! Array literals and `list()` destructuring

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use super::Parser;

impl<'a> Parser<'a> {
    /// `[a, k => v, &$r, ...$s]` or `array(...)`
    pub(crate) fn parse_array_literal(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let close = if self.eat(&Token::KwArray).is_some() {
            self.expect(Token::LParen, "'('")?;
            Token::RParen
        } else {
            self.expect(Token::LBracket, "'['")?;
            Token::RBracket
        };
        let elements = self.parse_array_elements(&close)?;
        self.expect(close, "end of array")?;
        Ok(CstNode::with_children(
            NodeKind::ArrayLiteral,
            self.span_from(start),
            elements,
        ))
    }

    /// `list($a, , 'k' => $b)`
    pub(crate) fn parse_list_expression(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwList, "'list'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let elements = self.parse_array_elements(&Token::RParen)?;
        self.expect(Token::RParen, "')'")?;
        Ok(CstNode::with_children(
            NodeKind::ListExpression,
            self.span_from(start),
            elements,
        ))
    }

    /// Elements up to `close`; empty slots (`[, $b]`) become elements without a value
    fn parse_array_elements(&mut self, close: &Token) -> ParseResult<Vec<CstNode>> {
        let mut elements = Vec::new();
        while !self.is_at_end() && !self.check(close) {
            let start = self.current_start();
            let mut element = CstNode::new(NodeKind::ArrayElement, self.span_from(start));
            if self.check(&Token::Comma) {
                self.advance();
                elements.push(element);
                continue;
            }
            if let Some(tok) = self.eat(&Token::Ellipsis) {
                element.push_field("spread", self.flag(tok.span));
                element.push_field("value", self.parse_expression()?);
            } else {
                let by_ref = self.eat(&Token::Amp);
                let first = self.parse_expression()?;
                if by_ref.is_none() && self.eat(&Token::FatArrow).is_some() {
                    element.push_field("key", first);
                    if let Some(amp) = self.eat(&Token::Amp) {
                        element.push_field("reference", self.flag(amp.span));
                    }
                    element.push_field("value", self.parse_expression()?);
                } else {
                    if let Some(amp) = by_ref {
                        element.push_field("reference", self.flag(amp.span));
                    }
                    element.push_field("value", first);
                }
            }
            element.span = self.span_from(start);
            elements.push(element);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        Ok(elements)
    }
}

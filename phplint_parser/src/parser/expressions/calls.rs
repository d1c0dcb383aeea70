//! Call arguments and `new` expressions

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::{Precedence, Token};

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `( [...]arg, name: arg, ... )`
    ///
    /// `f(...)` (first-class callable syntax) yields an empty list with a
    /// `callable` flag.
    pub(crate) fn parse_argument_list(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::LParen, "'('")?.span.start;
        let mut node = CstNode::new(NodeKind::ArgumentList, self.span_from(start));

        if self.check(&Token::Ellipsis) && self.peek_next() == Some(Token::RParen) {
            if let Some(tok) = self.advance() {
                node.push_field("callable", self.flag(tok.span));
            }
        }

        while !self.is_at_end() && !self.check(&Token::RParen) {
            node.push_child(self.parse_argument()?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        node.span = self.span_from(start);
        Ok(node)
    }

    fn parse_argument(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let mut node = CstNode::new(NodeKind::Argument, self.span_from(start));
        if let Some(tok) = self.eat(&Token::Ellipsis) {
            node.push_field("spread", self.flag(tok.span));
        } else if self
            .current
            .as_ref()
            .is_some_and(|t| t.token.is_member_name())
            && self.peek_next() == Some(Token::Colon)
        {
            let name = self.parse_member_name()?;
            self.advance();
            node.push_field("name", name);
        }
        node.push_field("value", self.parse_expression()?);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `new Foo(...)`, `new $cls`, `new static`, `new class(...) extends B { }`
    pub(crate) fn parse_new_expression(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwNew, "'new'")?.span.start;
        let mut node = CstNode::new(NodeKind::NewExpression, self.span_from(start));

        if self.check(&Token::KwClass) {
            node.push_field("class", self.parse_anonymous_class()?);
            node.span = self.span_from(start);
            return Ok(node);
        }

        let class = if self.check_any(&[
            Token::Identifier,
            Token::Backslash,
            Token::KwNamespace,
            Token::KwStatic,
        ]) {
            self.parse_name()?
        } else if self.check(&Token::LParen) {
            self.advance();
            let expr = self.parse_expression()?;
            self.expect(Token::RParen, "')'")?;
            expr
        } else {
            self.parse_new_class_reference()?
        };
        node.push_field("class", class);
        if self.check(&Token::LParen) {
            node.push_field("arguments", self.parse_argument_list()?);
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    /// Dynamic class after `new`: `$a`, `$a->b`, `$a::$b`, `$a['x']` (no calls)
    fn parse_new_class_reference(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let mut expr = if self.check(&Token::Dollar) {
            self.parse_primary()?
        } else {
            self.parse_simple_variable()?
        };
        loop {
            if self.check(&Token::Arrow) || self.check(&Token::NullsafeArrow) {
                self.advance();
                let name = self.parse_member_name()?;
                expr = CstNode::new(NodeKind::PropertyAccess, self.span_from(start))
                    .field("object", expr)
                    .field("name", name);
            } else if self.check(&Token::DoubleColon) {
                self.advance();
                let name = self.parse_simple_variable()?;
                expr = CstNode::new(NodeKind::StaticPropertyAccess, self.span_from(start))
                    .field("scope", expr)
                    .field("name", name);
            } else if self.eat(&Token::LBracket).is_some() {
                let index = self.parse_expression_with_precedence(Precedence::Lowest)?;
                self.expect(Token::RBracket, "']'")?;
                expr = CstNode::new(NodeKind::SubscriptExpression, self.span_from(start))
                    .field("object", expr)
                    .field("index", index);
            } else {
                break;
            }
        }
        Ok(expr)
    }

    /// `class(args) extends B implements I { body }` after `new`
    fn parse_anonymous_class(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        self.expect(Token::KwClass, "'class'")?;
        let mut node = CstNode::new(NodeKind::AnonymousClass, self.span_from(start));
        if self.check(&Token::LParen) {
            node.push_field("arguments", self.parse_argument_list()?);
        }
        if self.eat(&Token::KwExtends).is_some() {
            node.push_field("extends", self.parse_name()?);
        }
        if self.eat(&Token::KwImplements).is_some() {
            node.push_field("implements", self.parse_name_list()?);
        }
        node.push_field("body", self.parse_class_body()?);
        node.push_opt_field("doc", doc);
        node.span = self.span_from(start);
        Ok(node)
    }
}

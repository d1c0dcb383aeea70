//! Closures, arrow functions, and parameter lists

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::span::Span;
use crate::token::{Precedence, Token};

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `function (...) use (...) { }` or `fn (...) => expr`, optionally `static`
    pub(crate) fn parse_closure(&mut self, static_span: Option<Span>) -> ParseResult<CstNode> {
        let start = static_span.map_or_else(|| self.current_start(), |s| s.start);
        let is_arrow = self.check(&Token::KwFn);
        self.advance();

        let kind = if is_arrow {
            NodeKind::ArrowFunction
        } else {
            NodeKind::AnonymousFunction
        };
        let mut node = CstNode::new(kind, self.span_from(start));
        if let Some(span) = static_span {
            node.push_field("static", self.flag(span));
        }
        if let Some(amp) = self.eat(&Token::Amp) {
            node.push_field("reference", self.flag(amp.span));
        }
        node.push_field("parameters", self.parse_parameter_list()?);

        if !is_arrow && self.check(&Token::KwUse) {
            node.push_field("uses", self.parse_closure_uses()?);
        }
        if self.eat(&Token::Colon).is_some() {
            node.push_field("return_type", self.parse_type_hint()?);
        }

        if is_arrow {
            self.expect(Token::FatArrow, "'=>'")?;
            let body = self.parse_expression_with_precedence(Precedence::Assign)?;
            node.push_field("body", body);
        } else {
            node.push_field("body", self.parse_brace_block()?);
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `use ($a, &$b)`
    fn parse_closure_uses(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwUse, "'use'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let mut uses = Vec::new();
        while !self.is_at_end() && !self.check(&Token::RParen) {
            let use_start = self.current_start();
            let by_ref = self.eat(&Token::Amp);
            let name = self.parse_simple_variable()?;
            let mut node = CstNode::new(NodeKind::ClosureUse, self.span_from(use_start));
            node.push_field("name", name);
            if let Some(amp) = by_ref {
                node.push_field("reference", self.flag(amp.span));
            }
            uses.push(node);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(CstNode::with_children(
            NodeKind::ClosureUseList,
            self.span_from(start),
            uses,
        ))
    }

    /// `( [visibility] [type] [&] [...] $name [= default], ... )`
    pub(crate) fn parse_parameter_list(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::LParen, "'('")?.span.start;
        let mut params = Vec::new();
        while !self.is_at_end() && !self.check(&Token::RParen) {
            params.push(self.parse_parameter()?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        Ok(CstNode::with_children(
            NodeKind::ParameterList,
            self.span_from(start),
            params,
        ))
    }

    fn parse_parameter(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let mut node = CstNode::new(NodeKind::Parameter, self.span_from(start));
        for mut modifier in self.parse_modifiers() {
            modifier.field = Some("visibility");
            node.push_child(modifier);
        }
        if !self.check_any(&[Token::Variable, Token::Amp, Token::Ellipsis]) {
            node.push_field("type", self.parse_type_hint()?);
        }
        if let Some(amp) = self.eat(&Token::Amp) {
            node.push_field("reference", self.flag(amp.span));
        }
        if let Some(dots) = self.eat(&Token::Ellipsis) {
            node.push_field("variadic", self.flag(dots.span));
        }
        node.push_field("name", self.parse_simple_variable()?);
        if self.eat(&Token::Eq).is_some() {
            node.push_field("default", self.parse_expression()?);
        }
        node.span = self.span_from(start);
        Ok(node)
    }
}

//! Postfix chains: calls, `->`, `?->`, `::`, subscripts, `++`/`--`

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_postfix_chain(&mut self, mut left: CstNode) -> ParseResult<CstNode> {
        loop {
            let Some(token) = self.current_token().cloned() else {
                break;
            };
            let start = left.span.start;
            left = match token {
                Token::LParen => {
                    let arguments = self.parse_argument_list()?;
                    CstNode::new(NodeKind::CallExpression, self.span_from(start))
                        .field("function", left)
                        .field("arguments", arguments)
                }
                Token::LBracket => {
                    self.advance();
                    let index = if self.check(&Token::RBracket) {
                        None
                    } else {
                        Some(self.parse_expression()?)
                    };
                    self.expect(Token::RBracket, "']'")?;
                    let mut node = CstNode::new(NodeKind::SubscriptExpression, self.span_from(start));
                    node.push_field("object", left);
                    node.push_opt_field("index", index);
                    node
                }
                Token::Arrow | Token::NullsafeArrow => {
                    let Some(op) = self.advance() else { break };
                    let name = self.parse_member_selector()?;
                    let mut node = if self.check(&Token::LParen) {
                        let arguments = self.parse_argument_list()?;
                        CstNode::new(NodeKind::MethodCallExpression, self.span_from(start))
                            .field("object", left)
                            .field("name", name)
                            .field("arguments", arguments)
                    } else {
                        CstNode::new(NodeKind::PropertyAccess, self.span_from(start))
                            .field("object", left)
                            .field("name", name)
                    };
                    if op.token == Token::NullsafeArrow {
                        node.push_field("nullsafe", self.flag(op.span));
                    }
                    node
                }
                Token::DoubleColon => {
                    self.advance();
                    self.parse_static_member(left, start)?
                }
                Token::PlusPlus | Token::MinusMinus if left.kind.is_assignable() => {
                    let Some(op) = self.advance() else { break };
                    CstNode::new(NodeKind::PostfixUpdateExpression, self.span_from(start))
                        .field("operand", left)
                        .field("operator", CstNode::leaf(NodeKind::Operator, op.span, op.text))
                }
                _ => break,
            };
        }
        Ok(left)
    }

    /// Name after `->`: identifier, `$var`, or `{expr}`
    fn parse_member_selector(&mut self) -> ParseResult<CstNode> {
        if self.check(&Token::Variable) {
            return self.parse_simple_variable();
        }
        if self.eat(&Token::LBrace).is_some() {
            let expr = self.parse_expression()?;
            self.expect(Token::RBrace, "'}'")?;
            return Ok(expr);
        }
        self.parse_member_name()
    }

    /// After `Scope::`: `$prop`, `CONST`, `class`, or `method(...)`
    fn parse_static_member(&mut self, scope: CstNode, start: usize) -> ParseResult<CstNode> {
        if self.check(&Token::Variable) {
            let name = self.parse_simple_variable()?;
            return Ok(
                CstNode::new(NodeKind::StaticPropertyAccess, self.span_from(start))
                    .field("scope", scope)
                    .field("name", name),
            );
        }
        let name = if self.eat(&Token::LBrace).is_some() {
            let expr = self.parse_expression()?;
            self.expect(Token::RBrace, "'}'")?;
            expr
        } else {
            self.parse_member_name()?
        };
        if self.check(&Token::LParen) {
            let arguments = self.parse_argument_list()?;
            return Ok(
                CstNode::new(NodeKind::StaticCallExpression, self.span_from(start))
                    .field("scope", scope)
                    .field("name", name)
                    .field("arguments", arguments),
            );
        }
        Ok(
            CstNode::new(NodeKind::ClassConstantAccess, self.span_from(start))
                .field("scope", scope)
                .field("name", name),
        )
    }
}

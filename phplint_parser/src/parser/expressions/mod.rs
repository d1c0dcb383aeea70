//! Expression parsing (Pratt parser)
//!
//! Handles:
//! - Binary and unary expressions with precedence climbing
//! - Assignment, which binds whenever its left side is assignable
//! - Ternary and short ternary
//! - Postfix chains (calls, member access, subscripts)

mod calls;
mod functions;
mod postfix;
mod primary;
mod types;

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::{Associativity, Precedence, Token};

use super::Parser;

/// Cast keywords accepted inside `( )`, mapped to their canonical name
fn cast_type(text: &str) -> Option<&'static str> {
    Some(match text.to_ascii_lowercase().as_str() {
        "int" | "integer" => "int",
        "bool" | "boolean" => "bool",
        "float" | "double" | "real" => "float",
        "string" | "binary" => "string",
        "array" => "array",
        "object" => "object",
        "unset" => "null",
        _ => return None,
    })
}

impl<'a> Parser<'a> {
    pub(crate) fn parse_expression(&mut self) -> ParseResult<CstNode> {
        self.parse_expression_with_precedence(Precedence::Lowest)
    }

    /// Parse an expression whose binary operators bind at least as tightly as `min_prec`
    pub(crate) fn parse_expression_with_precedence(
        &mut self,
        min_prec: Precedence,
    ) -> ParseResult<CstNode> {
        self.nested(|p| p.parse_binary(min_prec))
    }

    fn parse_binary(&mut self, min_prec: Precedence) -> ParseResult<CstNode> {
        let mut left = self.parse_unary()?;

        loop {
            let Some(token) = self.current_token().cloned() else {
                break;
            };

            if token.is_assignment() && left.kind.is_assignable() {
                left = self.parse_assignment(left)?;
                continue;
            }

            if token == Token::Question && min_prec <= Precedence::Ternary {
                left = self.parse_ternary(left)?;
                continue;
            }

            let Some((prec, assoc)) = token.binary_precedence() else {
                break;
            };
            if prec < min_prec {
                break;
            }

            let Some(op) = self.advance() else { break };
            let operator = CstNode::leaf(NodeKind::Operator, op.span, op.text.to_ascii_lowercase());
            let right = if token == Token::KwInstanceof {
                self.parse_instanceof_target()?
            } else {
                let next_prec = match assoc {
                    Associativity::Left | Associativity::None => prec.next(),
                    Associativity::Right => prec,
                };
                self.parse_expression_with_precedence(next_prec)?
            };
            let span = left.span.merge(&right.span);
            left = CstNode::new(NodeKind::BinaryExpression, span)
                .field("left", left)
                .field("operator", operator)
                .field("right", right);
        }

        Ok(left)
    }

    /// `=`, `=&`, and compound assignments (right associative)
    fn parse_assignment(&mut self, left: CstNode) -> ParseResult<CstNode> {
        let Some(op) = self.advance() else {
            return Err(self.unexpected("assignment operator"));
        };
        if op.token == Token::Eq {
            if self.eat(&Token::Amp).is_some() {
                let right = self.parse_expression_with_precedence(Precedence::Assign)?;
                let span = left.span.merge(&right.span);
                return Ok(CstNode::new(NodeKind::ReferenceAssignment, span)
                    .field("left", left)
                    .field("right", right));
            }
            let right = self.parse_expression_with_precedence(Precedence::Assign)?;
            let span = left.span.merge(&right.span);
            return Ok(CstNode::new(NodeKind::Assignment, span)
                .field("left", left)
                .field("right", right));
        }

        let text = op.token.compound_operator().unwrap_or("=");
        let operator = CstNode::leaf(NodeKind::Operator, op.span, text);
        let right = self.parse_expression_with_precedence(Precedence::Assign)?;
        let span = left.span.merge(&right.span);
        Ok(CstNode::new(NodeKind::CompoundAssignment, span)
            .field("left", left)
            .field("operator", operator)
            .field("right", right))
    }

    /// `cond ? a : b` and `cond ?: b`
    fn parse_ternary(&mut self, condition: CstNode) -> ParseResult<CstNode> {
        self.expect(Token::Question, "'?'")?;
        let consequence = if self.check(&Token::Colon) {
            None
        } else {
            Some(self.parse_expression_with_precedence(Precedence::Assign)?)
        };
        self.expect(Token::Colon, "':'")?;
        let alternative = self.parse_expression_with_precedence(Precedence::Coalesce)?;
        let span = condition.span.merge(&alternative.span);
        let mut node = CstNode::new(NodeKind::TernaryExpression, span);
        node.push_field("condition", condition);
        node.push_opt_field("consequence", consequence);
        node.push_field("alternative", alternative);
        Ok(node)
    }

    /// Right side of `instanceof`: a class name or an expression yielding one
    fn parse_instanceof_target(&mut self) -> ParseResult<CstNode> {
        if self.check_any(&[Token::Identifier, Token::Backslash, Token::KwStatic, Token::KwNamespace])
        {
            return self.parse_name();
        }
        let primary = self.parse_primary()?;
        self.parse_postfix_chain(primary)
    }

    /// Prefix operators, casts, and keyword-introduced expressions
    pub(crate) fn parse_unary(&mut self) -> ParseResult<CstNode> {
        let Some(token) = self.current_token().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let start = self.current_start();

        match token {
            Token::Bang | Token::Minus | Token::Plus | Token::Tilde => {
                let Some(op) = self.advance() else {
                    return Err(self.unexpected("operator"));
                };
                let prec = token.unary_precedence().unwrap_or(Precedence::Prefix);
                let operand = self.parse_expression_with_precedence(prec)?;
                Ok(CstNode::new(NodeKind::UnaryExpression, self.span_from(start))
                    .field("operator", CstNode::leaf(NodeKind::Operator, op.span, op.text))
                    .field("operand", operand))
            }
            Token::At => {
                self.advance();
                let operand = self.parse_expression_with_precedence(Precedence::Prefix)?;
                Ok(CstNode::new(NodeKind::ErrorSuppression, self.span_from(start))
                    .field("operand", operand))
            }
            Token::PlusPlus | Token::MinusMinus => {
                let Some(op) = self.advance() else {
                    return Err(self.unexpected("operator"));
                };
                let operand = self.parse_expression_with_precedence(Precedence::Prefix)?;
                Ok(CstNode::new(NodeKind::PrefixUpdateExpression, self.span_from(start))
                    .field("operator", CstNode::leaf(NodeKind::Operator, op.span, op.text))
                    .field("operand", operand))
            }
            Token::LParen => {
                if let Some(cast) = self.try_parse_cast()? {
                    return Ok(cast);
                }
                let primary = self.parse_primary()?;
                self.parse_postfix_chain(primary)
            }
            Token::KwNew => {
                let new = self.parse_new_expression()?;
                self.parse_postfix_chain(new)
            }
            Token::KwClone => {
                self.advance();
                let value = self.parse_expression_with_precedence(Precedence::Prefix)?;
                Ok(CstNode::new(NodeKind::CloneExpression, self.span_from(start))
                    .field("value", value))
            }
            Token::KwPrint => {
                self.advance();
                let value = self.parse_expression_with_precedence(Precedence::Assign)?;
                Ok(CstNode::new(NodeKind::PrintExpression, self.span_from(start))
                    .field("value", value))
            }
            Token::KwThrow => {
                self.advance();
                let value = self.parse_expression_with_precedence(Precedence::Assign)?;
                Ok(CstNode::new(NodeKind::ThrowExpression, self.span_from(start))
                    .field("value", value))
            }
            Token::KwInclude | Token::KwIncludeOnce | Token::KwRequire | Token::KwRequireOnce => {
                let Some(kw) = self.advance() else {
                    return Err(self.unexpected("include"));
                };
                let kind = CstNode::leaf(NodeKind::Modifier, kw.span, kw.text.to_ascii_lowercase());
                let value = self.parse_expression_with_precedence(Precedence::Assign)?;
                Ok(CstNode::new(NodeKind::IncludeExpression, self.span_from(start))
                    .field("kind", kind)
                    .field("value", value))
            }
            Token::KwYield => self.parse_yield(),
            Token::KwFunction | Token::KwFn => self.parse_closure(None),
            Token::KwStatic if matches!(self.peek_next(), Some(Token::KwFunction | Token::KwFn)) => {
                let Some(kw) = self.advance() else {
                    return Err(self.unexpected("'static'"));
                };
                self.parse_closure(Some(kw.span))
            }
            _ => {
                let primary = self.parse_primary()?;
                self.parse_postfix_chain(primary)
            }
        }
    }

    /// `(int) $x` and friends
    fn try_parse_cast(&mut self) -> ParseResult<Option<CstNode>> {
        let Some(inner) = self.peek_nth(0) else {
            return Ok(None);
        };
        if !matches!(inner.token, Token::Identifier | Token::KwArray) {
            return Ok(None);
        }
        let Some(cast) = cast_type(inner.text) else {
            return Ok(None);
        };
        if self.peek_nth(1).map(|t| t.token) != Some(Token::RParen) {
            return Ok(None);
        }
        let start = self.current_start();
        self.advance();
        let type_tok = self.advance();
        self.expect(Token::RParen, "')'")?;
        let type_span = type_tok.map_or_else(|| self.current_span(), |t| t.span);
        let operand = self.parse_expression_with_precedence(Precedence::Prefix)?;
        Ok(Some(
            CstNode::new(NodeKind::CastExpression, self.span_from(start))
                .field("type", CstNode::leaf(NodeKind::TypeHint, type_span, cast))
                .field("operand", operand),
        ))
    }

    /// `yield`, `yield v`, `yield k => v`, `yield from e`
    fn parse_yield(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwYield, "'yield'")?.span.start;
        let mut node = CstNode::new(NodeKind::YieldExpression, self.span_from(start));
        if self.check_ident("from") {
            let from = self.advance();
            if let Some(from) = from {
                node.push_field("from", self.flag(from.span));
            }
            node.push_field("value", self.parse_expression_with_precedence(Precedence::Assign)?);
        } else if !self.check_any(&[
            Token::Semicolon,
            Token::RParen,
            Token::RBracket,
            Token::Comma,
            Token::CloseTag,
        ]) && !self.is_at_end()
        {
            let first = self.parse_expression_with_precedence(Precedence::Ternary)?;
            if self.eat(&Token::FatArrow).is_some() {
                node.push_field("key", first);
                node.push_field("value", self.parse_expression_with_precedence(Precedence::Ternary)?);
            } else {
                node.push_field("value", first);
            }
        }
        node.span = self.span_from(start);
        Ok(node)
    }
}

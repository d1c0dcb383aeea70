//! Primary expression parsing (variables, names, literals, language constructs)

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

const MAGIC_CONSTANTS: &[&str] = &[
    "__LINE__",
    "__FILE__",
    "__DIR__",
    "__FUNCTION__",
    "__CLASS__",
    "__TRAIT__",
    "__METHOD__",
    "__NAMESPACE__",
];

impl<'a> Parser<'a> {
    pub(crate) fn parse_primary(&mut self) -> ParseResult<CstNode> {
        let Some(token) = self.current_token().cloned() else {
            return Err(self.unexpected("expression"));
        };
        let start = self.current_start();

        match token {
            Token::Variable => self.parse_simple_variable(),
            Token::Dollar => self.parse_variable_variable(),

            Token::DecimalLiteral
            | Token::HexLiteral
            | Token::BinaryLiteral
            | Token::OctalLiteral
            | Token::FloatLiteral => self.parse_number(),
            Token::StringLiteral => self.parse_single_quoted(),
            Token::TemplateString | Token::ShellCommand => self.parse_double_quoted(),
            Token::Heredoc | Token::Nowdoc => self.parse_heredoc(),

            Token::LBracket => self.parse_array_literal(),
            Token::KwArray if self.peek_next() == Some(Token::LParen) => self.parse_array_literal(),
            Token::KwList => self.parse_list_expression(),

            Token::LParen => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(inner)
            }

            Token::KwIsset => {
                self.advance();
                self.expect(Token::LParen, "'('")?;
                let values = self.parse_expression_list_until(&[Token::RParen])?;
                self.expect(Token::RParen, "')'")?;
                Ok(CstNode::with_children(
                    NodeKind::IssetExpression,
                    self.span_from(start),
                    values,
                ))
            }
            Token::KwEmpty => {
                self.advance();
                let value = self.parse_parenthesized_condition()?;
                Ok(CstNode::new(NodeKind::EmptyExpression, self.span_from(start))
                    .field("value", value))
            }
            Token::KwEval => {
                self.advance();
                let value = self.parse_parenthesized_condition()?;
                Ok(CstNode::new(NodeKind::EvalExpression, self.span_from(start))
                    .field("value", value))
            }
            Token::KwExit | Token::KwDie => {
                self.advance();
                let mut node = CstNode::new(NodeKind::ExitExpression, self.span_from(start));
                if self.eat(&Token::LParen).is_some() {
                    if !self.check(&Token::RParen) {
                        node.push_field("value", self.parse_expression()?);
                    }
                    self.expect(Token::RParen, "')'")?;
                }
                node.span = self.span_from(start);
                Ok(node)
            }
            Token::KwMatch => self.parse_match_expression(),

            Token::Identifier | Token::Backslash | Token::KwNamespace | Token::KwStatic => {
                let name = self.parse_name()?;
                Ok(classify_name(name))
            }
            // keywords reachable as function names, e.g. `list` handled above
            _ => Err(self.unexpected("expression")),
        }
    }

    /// `$name`
    pub(crate) fn parse_simple_variable(&mut self) -> ParseResult<CstNode> {
        let tok = self.expect(Token::Variable, "variable")?;
        Ok(CstNode::leaf(
            NodeKind::Variable,
            tok.span,
            tok.text.trim_start_matches('$'),
        ))
    }

    /// `$$name`, `${expr}`
    fn parse_variable_variable(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::Dollar, "'$'")?.span.start;
        let name = if self.eat(&Token::LBrace).is_some() {
            let inner = self.parse_expression()?;
            self.expect(Token::RBrace, "'}'")?;
            inner
        } else if self.check(&Token::Dollar) {
            self.parse_variable_variable()?
        } else {
            self.parse_simple_variable()?
        };
        Ok(CstNode::new(NodeKind::VariableVariable, self.span_from(start)).field("name", name))
    }

    /// Qualified name: `Foo`, `Foo\Bar`, `\Foo\Bar`, `namespace\Foo`, `static`
    pub(crate) fn parse_name(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        if self.check(&Token::KwStatic) {
            let tok = self.expect(Token::KwStatic, "'static'")?;
            return Ok(CstNode::leaf(NodeKind::Name, tok.span, "static"));
        }
        if self.check(&Token::KwNamespace) {
            self.advance();
            self.expect(Token::Backslash, "'\\'")?;
        } else {
            self.eat(&Token::Backslash);
        }
        if !self.current.as_ref().is_some_and(|t| t.token.is_member_name()) {
            return Err(self.unexpected("name"));
        }
        self.advance();
        while self.check(&Token::Backslash)
            && self.peek_nth(0).is_some_and(|t| t.token.is_member_name())
        {
            self.advance();
            self.advance();
        }
        let span = self.span_from(start);
        let text: String = self.source[span.start..span.end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(CstNode::leaf(NodeKind::Name, span, text))
    }

    /// `match (subject) { a, b => x, default => y }`
    fn parse_match_expression(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwMatch, "'match'")?.span.start;
        let subject = self.parse_parenthesized_condition()?;
        self.expect(Token::LBrace, "'{'")?;
        let mut node = CstNode::new(NodeKind::MatchExpression, self.span_from(start));
        node.push_field("subject", subject);
        while !self.is_at_end() && !self.check(&Token::RBrace) {
            let arm_start = self.current_start();
            let mut arm = CstNode::new(NodeKind::MatchArm, self.span_from(arm_start));
            if let Some(tok) = self.eat(&Token::KwDefault) {
                arm.push_field("default", self.flag(tok.span));
            } else {
                loop {
                    arm.push_field("condition", self.parse_expression()?);
                    if self.eat(&Token::Comma).is_none() || self.check(&Token::FatArrow) {
                        break;
                    }
                }
            }
            self.expect(Token::FatArrow, "'=>'")?;
            arm.push_field("body", self.parse_expression()?);
            arm.span = self.span_from(arm_start);
            node.push_field("arm", arm);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RBrace, "'}'")?;
        node.span = self.span_from(start);
        Ok(node)
    }
}

/// Turn `true`/`false`/`null`/magic constants into literals; other names stay names
fn classify_name(name: CstNode) -> CstNode {
    let text = name.text();
    let bare = text.trim_start_matches('\\');
    if bare.contains('\\') {
        return name;
    }
    let lower = bare.to_ascii_lowercase();
    match lower.as_str() {
        "true" | "false" => CstNode::leaf(NodeKind::BooleanLiteral, name.span, lower),
        "null" => CstNode::new(NodeKind::NullLiteral, name.span),
        _ => {
            let upper = bare.to_ascii_uppercase();
            if MAGIC_CONSTANTS.contains(&upper.as_str()) {
                CstNode::leaf(NodeKind::MagicConstant, name.span, upper)
            } else {
                name
            }
        }
    }
}

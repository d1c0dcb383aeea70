//! Statement parsing
//!
//! Handles:
//! - Control flow (if, loops, switch, try) including the `:`/`endif;` forms
//! - Declarations (functions, classes, interfaces, traits, constants)
//! - Namespace and use imports
//! - Jumps (return, break, continue, goto)

mod control_flow;
mod declarations;
mod imports;
mod jumps;

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use super::Parser;

impl<'a> Parser<'a> {
    /// Parse one statement, dispatching on the current token
    pub(crate) fn parse_statement(&mut self) -> ParseResult<CstNode> {
        self.nested(Self::dispatch_statement)
    }

    fn dispatch_statement(&mut self) -> ParseResult<CstNode> {
        let Some(token) = self.current_token().cloned() else {
            return Err(self.unexpected("statement"));
        };

        match token {
            Token::LBrace => self.parse_brace_block(),
            Token::Semicolon => {
                let tok = self.expect(Token::Semicolon, "';'")?;
                Ok(CstNode::new(NodeKind::EmptyStatement, tok.span))
            }
            Token::InlineHtml => {
                let tok = self.expect(Token::InlineHtml, "inline HTML")?;
                Ok(CstNode::leaf(NodeKind::InlineHtml, tok.span, tok.text))
            }
            Token::OpenTagWithEcho => self.parse_short_echo(),

            // Control flow
            Token::KwIf => self.parse_if_statement(),
            Token::KwWhile => self.parse_while_statement(),
            Token::KwDo => self.parse_do_while_statement(),
            Token::KwFor => self.parse_for_statement(),
            Token::KwForeach => self.parse_foreach_statement(),
            Token::KwSwitch => self.parse_switch_statement(),
            Token::KwTry => self.parse_try_statement(),
            Token::KwDeclare => self.parse_declare_statement(),

            // Jumps
            Token::KwReturn => self.parse_return_statement(),
            Token::KwBreak => self.parse_break_statement(NodeKind::BreakStatement),
            Token::KwContinue => self.parse_break_statement(NodeKind::ContinueStatement),
            Token::KwGoto => self.parse_goto_statement(),

            // Declarations
            Token::KwFunction if self.is_function_declaration() => self.parse_function_definition(),
            Token::KwAbstract | Token::KwFinal | Token::KwReadonly | Token::KwClass
                if self.is_class_declaration() =>
            {
                self.parse_class_declaration()
            }
            Token::KwInterface => self.parse_interface_declaration(),
            Token::KwTrait => self.parse_trait_declaration(),
            Token::KwConst => self.parse_const_declaration(),
            Token::KwNamespace if self.peek_next() != Some(Token::Backslash) => {
                self.parse_namespace_definition()
            }
            Token::KwUse => self.parse_use_declaration(),

            // Variable scope statements
            Token::KwEcho => self.parse_echo_statement(),
            Token::KwGlobal => self.parse_global_declaration(),
            Token::KwStatic if self.peek_next() == Some(Token::Variable) => {
                self.parse_static_declaration()
            }
            Token::KwUnset => self.parse_unset_statement(),

            Token::Identifier if self.peek_next() == Some(Token::Colon) => {
                self.parse_label_statement()
            }

            _ => self.parse_expression_statement(),
        }
    }

    /// `function name(` or `function &name(` (as opposed to a closure)
    fn is_function_declaration(&mut self) -> bool {
        match self.peek_nth(0).map(|t| t.token) {
            Some(Token::Amp) => self.peek_nth(1).is_some_and(|t| t.token.is_member_name()),
            Some(t) => t.is_member_name(),
            None => false,
        }
    }

    /// Skip leading class modifiers and check for `class Name`
    fn is_class_declaration(&mut self) -> bool {
        if self.check(&Token::KwClass) {
            return self.peek_next() == Some(Token::Identifier);
        }
        let mut i = 0;
        loop {
            match self.peek_nth(i).map(|t| t.token) {
                Some(Token::KwAbstract | Token::KwFinal | Token::KwReadonly) => i += 1,
                Some(Token::KwClass) => return true,
                _ => return false,
            }
        }
    }

    /// `{ statements }`
    pub(crate) fn parse_brace_block(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::LBrace, "'{'")?.span.start;
        let children = self.parse_statements_until(&[Token::RBrace]);
        self.expect(Token::RBrace, "'}'")?;
        Ok(CstNode::with_children(
            NodeKind::Block,
            self.span_from(start),
            children,
        ))
    }

    /// Body of a control structure, always returned as a Block
    ///
    /// Accepts `{ ... }`, a single statement, or the alternative
    /// `: ... end_keyword;` form.
    pub(crate) fn parse_body(&mut self, end_keyword: Token) -> ParseResult<CstNode> {
        if self.eat(&Token::Colon).is_some() {
            let block = self.parse_block_until(&[end_keyword.clone()]);
            self.expect(end_keyword, "end of block")?;
            self.expect_semicolon()?;
            return Ok(block);
        }
        self.parse_statement_as_block()
    }

    pub(crate) fn parse_statement_as_block(&mut self) -> ParseResult<CstNode> {
        let stmt = self.parse_statement()?;
        if stmt.kind == NodeKind::Block {
            Ok(stmt)
        } else {
            let span = stmt.span;
            Ok(CstNode::with_children(NodeKind::Block, span, vec![stmt]))
        }
    }

    fn parse_expression_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        let expr = self.parse_expression()?;
        self.expect_semicolon()?;
        let mut node = CstNode::new(NodeKind::ExpressionStatement, self.span_from(start));
        node.push_field("expression", expr);
        node.push_opt_field("doc", doc);
        Ok(node)
    }

    /// `echo a, b;`
    fn parse_echo_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwEcho, "'echo'")?.span.start;
        let values = self.parse_expression_list_until(&[Token::Semicolon, Token::CloseTag])?;
        self.expect_semicolon()?;
        Ok(CstNode::with_children(
            NodeKind::EchoStatement,
            self.span_from(start),
            values,
        ))
    }

    /// `<?= a, b ?>`
    fn parse_short_echo(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::OpenTagWithEcho, "'<?='")?.span.start;
        let values = self.parse_expression_list_until(&[Token::Semicolon, Token::CloseTag])?;
        self.expect_semicolon()?;
        Ok(CstNode::with_children(
            NodeKind::EchoStatement,
            self.span_from(start),
            values,
        ))
    }

    /// `global $a, $b;`
    fn parse_global_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwGlobal, "'global'")?.span.start;
        let mut vars = vec![self.parse_simple_variable()?];
        while self.eat(&Token::Comma).is_some() {
            vars.push(self.parse_simple_variable()?);
        }
        self.expect_semicolon()?;
        Ok(CstNode::with_children(
            NodeKind::GlobalDeclaration,
            self.span_from(start),
            vars,
        ))
    }

    /// `static $a = 1, $b;`
    fn parse_static_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwStatic, "'static'")?.span.start;
        let mut vars = Vec::new();
        loop {
            let var_start = self.current_start();
            let name = self.parse_simple_variable()?;
            let default = if self.eat(&Token::Eq).is_some() {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let mut var = CstNode::new(NodeKind::StaticVariable, self.span_from(var_start));
            var.push_field("name", name);
            var.push_opt_field("default", default);
            vars.push(var);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect_semicolon()?;
        Ok(CstNode::with_children(
            NodeKind::StaticDeclaration,
            self.span_from(start),
            vars,
        ))
    }

    /// `unset($a, $b['k']);`
    fn parse_unset_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwUnset, "'unset'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let targets = self.parse_expression_list_until(&[Token::RParen])?;
        self.expect(Token::RParen, "')'")?;
        self.expect_semicolon()?;
        Ok(CstNode::with_children(
            NodeKind::UnsetStatement,
            self.span_from(start),
            targets,
        ))
    }

    /// `name:`
    fn parse_label_statement(&mut self) -> ParseResult<CstNode> {
        let label = self.expect(Token::Identifier, "label")?;
        self.expect(Token::Colon, "':'")?;
        let mut node = CstNode::new(NodeKind::LabelStatement, self.span_from(label.span.start));
        node.push_field("label", CstNode::leaf(NodeKind::Name, label.span, label.text));
        Ok(node)
    }

    /// Comma-separated expressions up to (not including) a terminator;
    /// a trailing comma is allowed
    pub(crate) fn parse_expression_list_until(
        &mut self,
        terminators: &[Token],
    ) -> ParseResult<Vec<CstNode>> {
        let mut items = Vec::new();
        while !self.is_at_end() && !self.check_any(terminators) {
            items.push(self.parse_expression()?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        Ok(items)
    }
}

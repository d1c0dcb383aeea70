//! Control flow statement parsers (if, while, do, for, foreach, switch, try, declare)

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `( expr )`
    pub(crate) fn parse_parenthesized_condition(&mut self) -> ParseResult<CstNode> {
        self.expect(Token::LParen, "'('")?;
        let condition = self.parse_expression()?;
        self.expect(Token::RParen, "')'")?;
        Ok(condition)
    }

    /// `if (c) s [elseif (c) s]* [else s]` or the `if (c): ... endif;` form
    pub(crate) fn parse_if_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwIf, "'if'")?.span.start;
        let condition = self.parse_parenthesized_condition()?;
        let mut node = CstNode::new(NodeKind::IfStatement, self.span_from(start));
        node.push_field("condition", condition);

        if self.eat(&Token::Colon).is_some() {
            return self.parse_alternative_if(node, start);
        }

        node.push_field("body", self.parse_statement_as_block()?);
        loop {
            if self.check(&Token::KwElseif) {
                let clause_start = self.current_start();
                self.advance();
                let condition = self.parse_parenthesized_condition()?;
                let body = self.parse_statement_as_block()?;
                let clause = CstNode::new(NodeKind::ElseifClause, self.span_from(clause_start))
                    .field("condition", condition)
                    .field("body", body);
                node.push_field("alternative", clause);
            } else if self.check(&Token::KwElse) {
                let clause_start = self.current_start();
                self.advance();
                // `else if` is an else clause whose body is an if statement
                let body = self.parse_statement_as_block()?;
                let clause = CstNode::new(NodeKind::ElseClause, self.span_from(clause_start))
                    .field("body", body);
                node.push_field("alternative", clause);
                break;
            } else {
                break;
            }
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    fn parse_alternative_if(&mut self, mut node: CstNode, start: usize) -> ParseResult<CstNode> {
        let stops = [Token::KwElseif, Token::KwElse, Token::KwEndif];
        node.push_field("body", self.parse_block_until(&stops));
        loop {
            let clause_start = self.current_start();
            if self.eat(&Token::KwElseif).is_some() {
                let condition = self.parse_parenthesized_condition()?;
                self.expect(Token::Colon, "':'")?;
                let body = self.parse_block_until(&stops);
                let clause = CstNode::new(NodeKind::ElseifClause, self.span_from(clause_start))
                    .field("condition", condition)
                    .field("body", body);
                node.push_field("alternative", clause);
            } else if self.eat(&Token::KwElse).is_some() {
                self.expect(Token::Colon, "':'")?;
                let body = self.parse_block_until(&[Token::KwEndif]);
                let clause = CstNode::new(NodeKind::ElseClause, self.span_from(clause_start))
                    .field("body", body);
                node.push_field("alternative", clause);
            } else {
                break;
            }
        }
        self.expect(Token::KwEndif, "'endif'")?;
        self.expect_semicolon()?;
        node.span = self.span_from(start);
        Ok(node)
    }

    pub(crate) fn parse_while_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwWhile, "'while'")?.span.start;
        let condition = self.parse_parenthesized_condition()?;
        let body = self.parse_body(Token::KwEndwhile)?;
        Ok(CstNode::new(NodeKind::WhileStatement, self.span_from(start))
            .field("condition", condition)
            .field("body", body))
    }

    pub(crate) fn parse_do_while_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwDo, "'do'")?.span.start;
        let body = self.parse_statement_as_block()?;
        self.expect(Token::KwWhile, "'while'")?;
        let condition = self.parse_parenthesized_condition()?;
        self.expect_semicolon()?;
        Ok(CstNode::new(NodeKind::DoWhileStatement, self.span_from(start))
            .field("body", body)
            .field("condition", condition))
    }

    /// `for (init; condition; update) body`
    pub(crate) fn parse_for_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwFor, "'for'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let init = self.parse_for_clause(Token::Semicolon)?;
        self.expect(Token::Semicolon, "';'")?;
        let condition = self.parse_for_clause(Token::Semicolon)?;
        self.expect(Token::Semicolon, "';'")?;
        let update = self.parse_for_clause(Token::RParen)?;
        self.expect(Token::RParen, "')'")?;
        let body = self.parse_body(Token::KwEndfor)?;
        Ok(CstNode::new(NodeKind::ForStatement, self.span_from(start))
            .field("init", init)
            .field("condition", condition)
            .field("update", update)
            .field("body", body))
    }

    fn parse_for_clause(&mut self, terminator: Token) -> ParseResult<CstNode> {
        let start = self.current_start();
        let items = self.parse_expression_list_until(&[terminator])?;
        Ok(CstNode::with_children(
            NodeKind::ExpressionList,
            self.span_from(start),
            items,
        ))
    }

    /// `foreach (subject as [key =>] [&]value) body`
    pub(crate) fn parse_foreach_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwForeach, "'foreach'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let subject = self.parse_expression()?;
        self.expect(Token::KwAs, "'as'")?;

        let mut node = CstNode::new(NodeKind::ForeachStatement, self.span_from(start));
        node.push_field("subject", subject);

        let mut by_ref = self.eat(&Token::Amp);
        let mut value = self.parse_foreach_target()?;
        if self.eat(&Token::FatArrow).is_some() {
            node.push_field("key", value);
            by_ref = self.eat(&Token::Amp);
            value = self.parse_foreach_target()?;
        }
        node.push_field("value", value);
        if let Some(amp) = by_ref {
            node.push_field("reference", self.flag(amp.span));
        }
        self.expect(Token::RParen, "')'")?;
        node.push_field("body", self.parse_body(Token::KwEndforeach)?);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// Loop variable or `list(...)` / `[...]` destructuring pattern
    fn parse_foreach_target(&mut self) -> ParseResult<CstNode> {
        self.parse_expression_with_precedence(crate::token::Precedence::Coalesce)
    }

    /// `switch (subject) { case v: ...; default: ... }`
    pub(crate) fn parse_switch_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwSwitch, "'switch'")?.span.start;
        let subject = self.parse_parenthesized_condition()?;
        let (alternative, close) = if self.eat(&Token::Colon).is_some() {
            (true, Token::KwEndswitch)
        } else {
            self.expect(Token::LBrace, "'{'")?;
            (false, Token::RBrace)
        };

        let mut node = CstNode::new(NodeKind::SwitchStatement, self.span_from(start));
        node.push_field("subject", subject);
        // a leading `;` after `{` is allowed
        self.eat(&Token::Semicolon);

        let stops = [Token::KwCase, Token::KwDefault, close.clone()];
        while !self.is_at_end() && !self.check(&close) {
            let clause_start = self.current_start();
            let mut clause = if self.eat(&Token::KwCase).is_some() {
                let value = self.parse_expression()?;
                CstNode::new(NodeKind::CaseClause, self.span_from(clause_start))
                    .field("value", value)
            } else if self.eat(&Token::KwDefault).is_some() {
                CstNode::new(NodeKind::DefaultClause, self.span_from(clause_start))
            } else {
                return Err(self.unexpected("'case' or 'default'"));
            };
            if self.eat(&Token::Colon).is_none() {
                self.expect(Token::Semicolon, "':'")?;
            }
            for stmt in self.parse_statements_until(&stops) {
                clause.push_child(stmt);
            }
            clause.span = self.span_from(clause_start);
            node.push_child(clause);
        }
        self.expect(close, "end of switch")?;
        if alternative {
            self.expect_semicolon()?;
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `try { } catch (A|B $e) { } finally { }`
    pub(crate) fn parse_try_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwTry, "'try'")?.span.start;
        let mut node = CstNode::new(NodeKind::TryStatement, self.span_from(start));
        node.push_field("body", self.parse_brace_block()?);

        while self.check(&Token::KwCatch) {
            let clause_start = self.current_start();
            self.advance();
            self.expect(Token::LParen, "'('")?;
            let types_start = self.current_start();
            let mut types = vec![self.parse_name()?];
            while self.eat(&Token::Pipe).is_some() {
                types.push(self.parse_name()?);
            }
            let types = CstNode::with_children(NodeKind::NameList, self.span_from(types_start), types);
            let variable = if self.check(&Token::Variable) {
                Some(self.parse_simple_variable()?)
            } else {
                None
            };
            self.expect(Token::RParen, "')'")?;
            let body = self.parse_brace_block()?;
            let mut clause = CstNode::new(NodeKind::CatchClause, self.span_from(clause_start));
            clause.push_field("types", types);
            clause.push_opt_field("variable", variable);
            clause.push_field("body", body);
            clause.span = self.span_from(clause_start);
            node.push_field("catch", clause);
        }

        if self.check(&Token::KwFinally) {
            let clause_start = self.current_start();
            self.advance();
            let body = self.parse_brace_block()?;
            node.push_field(
                "finally",
                CstNode::new(NodeKind::FinallyClause, self.span_from(clause_start))
                    .field("body", body),
            );
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `declare(strict_types=1);`, `declare(ticks=1) { }`, `declare(...): enddeclare;`
    pub(crate) fn parse_declare_statement(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwDeclare, "'declare'")?.span.start;
        self.expect(Token::LParen, "'('")?;
        let mut node = CstNode::new(NodeKind::DeclareStatement, self.span_from(start));
        loop {
            node.push_field("directive", self.parse_const_element()?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RParen, "')'")?;
        if self.check(&Token::LBrace) || self.check(&Token::Colon) {
            node.push_field("body", self.parse_body(Token::KwEnddeclare)?);
        } else {
            self.expect_semicolon()?;
        }
        node.span = self.span_from(start);
        Ok(node)
    }
}

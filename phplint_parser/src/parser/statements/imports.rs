//! Namespace and import parsers

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::span::Span;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `namespace A\B;`, `namespace A\B { ... }` or `namespace { ... }`
    pub(crate) fn parse_namespace_definition(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwNamespace, "'namespace'")?.span.start;
        let mut node = CstNode::new(NodeKind::NamespaceDefinition, self.span_from(start));
        if !self.check(&Token::LBrace) {
            node.push_field("name", self.parse_name()?);
        }
        if self.check(&Token::LBrace) {
            node.push_field("body", self.parse_brace_block()?);
        } else {
            self.expect_semicolon()?;
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `use [function|const] A\B [as C], D;` and group form `use A\{B, C as D};`
    pub(crate) fn parse_use_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwUse, "'use'")?.span.start;
        let mut node = CstNode::new(NodeKind::UseDeclaration, self.span_from(start));
        if let Some(kind) = self.parse_use_kind() {
            node.push_field("kind", kind);
        }

        loop {
            let clause_start = self.current_start();
            let name = self.parse_name()?;
            if self.check(&Token::Backslash) && self.peek_next() == Some(Token::LBrace) {
                self.advance();
                self.advance();
                self.parse_group_use(&mut node, &name)?;
            } else if self.check(&Token::LBrace) && name.text().ends_with('\\') {
                self.advance();
                self.parse_group_use(&mut node, &name)?;
            } else {
                let clause = self.finish_use_clause(clause_start, name, None)?;
                node.push_field("clause", clause);
            }
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect_semicolon()?;
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `function` / `const` before an imported name
    fn parse_use_kind(&mut self) -> Option<CstNode> {
        let tok = self
            .current
            .as_ref()
            .filter(|t| matches!(t.token, Token::KwFunction | Token::KwConst))?;
        let node = CstNode::leaf(NodeKind::Modifier, tok.span, tok.text.to_ascii_lowercase());
        self.advance();
        Some(node)
    }

    /// Members of `prefix\{ ... }`, flattened into ordinary clauses
    fn parse_group_use(&mut self, node: &mut CstNode, prefix: &CstNode) -> ParseResult<()> {
        let prefix_text = prefix.text().trim_end_matches('\\').to_string();
        while !self.is_at_end() && !self.check(&Token::RBrace) {
            let clause_start = self.current_start();
            let kind = self.parse_use_kind();
            let inner = self.parse_name()?;
            let full = format!("{}\\{}", prefix_text, inner.text());
            let span = prefix.span.merge(&inner.span);
            let name = CstNode::leaf(NodeKind::Name, span, full);
            let clause = self.finish_use_clause(clause_start, name, kind)?;
            node.push_field("clause", clause);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(())
    }

    fn finish_use_clause(
        &mut self,
        start: usize,
        name: CstNode,
        kind: Option<CstNode>,
    ) -> ParseResult<CstNode> {
        let mut clause = CstNode::new(NodeKind::UseClause, Span::empty());
        clause.push_field("name", name);
        if self.eat(&Token::KwAs).is_some() {
            clause.push_field("alias", self.parse_member_name()?);
        }
        clause.push_opt_field("kind", kind);
        clause.span = self.span_from(start);
        Ok(clause)
    }
}

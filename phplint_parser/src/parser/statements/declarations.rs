//! Declaration parsers (functions, classes, interfaces, traits, members, constants)

use crate::cst::CstNode;
use crate::error::{ParseError, ParseResult};
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// `function [&]name(params)[: type] { body }`
    pub(crate) fn parse_function_definition(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        self.expect(Token::KwFunction, "'function'")?;
        let mut node = CstNode::new(NodeKind::FunctionDefinition, self.span_from(start));
        if let Some(amp) = self.eat(&Token::Amp) {
            node.push_field("reference", self.flag(amp.span));
        }
        node.push_field("name", self.parse_member_name()?);
        node.push_field("parameters", self.parse_parameter_list()?);
        if self.eat(&Token::Colon).is_some() {
            node.push_field("return_type", self.parse_type_hint()?);
        }
        node.push_field("body", self.parse_brace_block()?);
        node.push_opt_field("doc", doc);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// An identifier or semi-reserved keyword used as a declaration or member name
    pub(crate) fn parse_member_name(&mut self) -> ParseResult<CstNode> {
        match &self.current {
            Some(tok) if tok.token.is_member_name() => {
                let node = CstNode::leaf(NodeKind::Name, tok.span, tok.text);
                self.advance();
                Ok(node)
            }
            _ => Err(self.unexpected("name")),
        }
    }

    /// Leading `abstract` / `final` / `readonly` / visibility keywords
    pub(crate) fn parse_modifiers(&mut self) -> Vec<CstNode> {
        let mut modifiers = Vec::new();
        while let Some(tok) = self.current.as_ref().filter(|t| t.token.is_modifier()) {
            let mut node = CstNode::leaf(NodeKind::Modifier, tok.span, tok.text.to_ascii_lowercase());
            node.field = Some("modifier");
            modifiers.push(node);
            self.advance();
        }
        modifiers
    }

    /// `[abstract|final|readonly] class Name [extends P] [implements I, J] { ... }`
    pub(crate) fn parse_class_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        let modifiers = self.parse_modifiers();
        self.expect(Token::KwClass, "'class'")?;
        let mut node = CstNode::new(NodeKind::ClassDeclaration, self.span_from(start));
        node.children.extend(modifiers);
        node.push_field("name", self.parse_member_name()?);
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

    /// `interface Name [extends A, B] { ... }`
    pub(crate) fn parse_interface_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        self.expect(Token::KwInterface, "'interface'")?;
        let mut node = CstNode::new(NodeKind::InterfaceDeclaration, self.span_from(start));
        node.push_field("name", self.parse_member_name()?);
        if self.eat(&Token::KwExtends).is_some() {
            node.push_field("extends", self.parse_name_list()?);
        }
        node.push_field("body", self.parse_class_body()?);
        node.push_opt_field("doc", doc);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `trait Name { ... }`
    pub(crate) fn parse_trait_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        self.expect(Token::KwTrait, "'trait'")?;
        let mut node = CstNode::new(NodeKind::TraitDeclaration, self.span_from(start));
        node.push_field("name", self.parse_member_name()?);
        node.push_field("body", self.parse_class_body()?);
        node.push_opt_field("doc", doc);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `A, B\C, \D`
    pub(crate) fn parse_name_list(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let mut names = vec![self.parse_name()?];
        while self.eat(&Token::Comma).is_some() {
            names.push(self.parse_name()?);
        }
        Ok(CstNode::with_children(
            NodeKind::NameList,
            self.span_from(start),
            names,
        ))
    }

    /// `{ member* }`
    pub(crate) fn parse_class_body(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::LBrace, "'{'")?.span.start;
        let mut members = Vec::new();
        while !self.is_at_end() && !self.check(&Token::RBrace) {
            let member_start = self.current_start();
            match self.parse_class_member() {
                Ok(Some(member)) => members.push(member),
                Ok(None) => {}
                Err(e) => {
                    self.errors.push(e);
                    self.synchronize_member();
                    members.push(CstNode::new(NodeKind::Error, self.span_from(member_start)));
                }
            }
        }
        self.expect(Token::RBrace, "'}'")?;
        Ok(CstNode::with_children(
            NodeKind::ClassBody,
            self.span_from(start),
            members,
        ))
    }

    /// Skip to the next member: past a `;` or a balanced `{ }` block
    fn synchronize_member(&mut self) {
        let mut depth = 0usize;
        while let Some(tok) = self.current_token().cloned() {
            match tok {
                Token::LBrace => depth += 1,
                Token::RBrace if depth == 0 => return,
                Token::RBrace => {
                    depth -= 1;
                    if depth == 0 {
                        self.advance();
                        return;
                    }
                }
                Token::Semicolon if depth == 0 => {
                    self.advance();
                    return;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_class_member(&mut self) -> ParseResult<Option<CstNode>> {
        if self.eat(&Token::Semicolon).is_some() {
            return Ok(None);
        }
        if self.check(&Token::KwUse) {
            return self.parse_trait_use().map(Some);
        }
        let start = self.current_start();
        let doc = self.take_doc();
        let modifiers = self.parse_modifiers();

        match self.current_token() {
            Some(Token::KwConst) => {
                self.advance();
                let mut node = CstNode::new(NodeKind::ClassConstDeclaration, self.span_from(start));
                node.children.extend(modifiers);
                // typed constant: `const int X = 1`
                if !matches!(self.peek_next(), Some(Token::Eq)) {
                    node.push_field("type", self.parse_type_hint()?);
                }
                loop {
                    node.push_field("element", self.parse_const_element()?);
                    if self.eat(&Token::Comma).is_none() {
                        break;
                    }
                }
                self.expect_semicolon()?;
                node.push_opt_field("doc", doc);
                node.span = self.span_from(start);
                Ok(Some(node))
            }
            Some(Token::KwFunction) => {
                self.advance();
                let mut node = CstNode::new(NodeKind::MethodDeclaration, self.span_from(start));
                node.children.extend(modifiers);
                if let Some(amp) = self.eat(&Token::Amp) {
                    node.push_field("reference", self.flag(amp.span));
                }
                node.push_field("name", self.parse_member_name()?);
                node.push_field("parameters", self.parse_parameter_list()?);
                if self.eat(&Token::Colon).is_some() {
                    node.push_field("return_type", self.parse_type_hint()?);
                }
                if self.check(&Token::LBrace) {
                    node.push_field("body", self.parse_brace_block()?);
                } else {
                    self.expect_semicolon()?;
                }
                node.push_opt_field("doc", doc);
                node.span = self.span_from(start);
                Ok(Some(node))
            }
            Some(Token::KwCase) => Err(ParseError::invalid_syntax(
                "enum cases are not supported",
                self.current_span(),
            )),
            _ if modifiers.is_empty() && !self.check(&Token::Variable) => {
                Err(self.unexpected("class member"))
            }
            _ => {
                let mut node = CstNode::new(NodeKind::PropertyDeclaration, self.span_from(start));
                node.children.extend(modifiers);
                if !self.check(&Token::Variable) {
                    node.push_field("type", self.parse_type_hint()?);
                }
                loop {
                    let el_start = self.current_start();
                    let name = self.parse_simple_variable()?;
                    let default = if self.eat(&Token::Eq).is_some() {
                        Some(self.parse_expression()?)
                    } else {
                        None
                    };
                    let mut element =
                        CstNode::new(NodeKind::PropertyElement, self.span_from(el_start));
                    element.push_field("name", name);
                    element.push_opt_field("default", default);
                    node.push_field("element", element);
                    if self.eat(&Token::Comma).is_none() {
                        break;
                    }
                }
                self.expect_semicolon()?;
                node.push_opt_field("doc", doc);
                node.span = self.span_from(start);
                Ok(Some(node))
            }
        }
    }

    /// `NAME = expr` (class constants, `const` statements, declare directives)
    pub(crate) fn parse_const_element(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let name = self.parse_member_name()?;
        self.expect(Token::Eq, "'='")?;
        let value = self.parse_expression()?;
        Ok(CstNode::new(NodeKind::ConstElement, self.span_from(start))
            .field("name", name)
            .field("value", value))
    }

    /// `const A = 1, B = 2;`
    pub(crate) fn parse_const_declaration(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        let doc = self.take_doc();
        self.expect(Token::KwConst, "'const'")?;
        let mut node = CstNode::new(NodeKind::ConstDeclaration, self.span_from(start));
        loop {
            node.push_field("element", self.parse_const_element()?);
            if self.eat(&Token::Comma).is_none() {
                break;
            }
        }
        self.expect_semicolon()?;
        node.push_opt_field("doc", doc);
        node.span = self.span_from(start);
        Ok(node)
    }

    /// `use A, B { A::foo insteadof B; B::foo as protected bar; }`
    fn parse_trait_use(&mut self) -> ParseResult<CstNode> {
        let start = self.expect(Token::KwUse, "'use'")?.span.start;
        let mut node = CstNode::new(NodeKind::TraitUse, self.span_from(start));
        node.push_field("traits", self.parse_name_list()?);

        if self.eat(&Token::LBrace).is_some() {
            while !self.is_at_end() && !self.check(&Token::RBrace) {
                node.push_field("adaptation", self.parse_trait_adaptation()?);
            }
            self.expect(Token::RBrace, "'}'")?;
        } else {
            self.expect_semicolon()?;
        }
        node.span = self.span_from(start);
        Ok(node)
    }

    fn parse_trait_adaptation(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        // `Trait::method` or bare `method`
        let first = self.parse_name()?;
        let (trait_name, method) = if self.eat(&Token::DoubleColon).is_some() {
            (Some(first), self.parse_member_name()?)
        } else {
            (None, first)
        };

        let node = if self.eat(&Token::KwInsteadof).is_some() {
            let Some(trait_name) = trait_name else {
                return Err(ParseError::invalid_syntax(
                    "'insteadof' requires a Trait::method reference",
                    self.span_from(start),
                ));
            };
            let excluded = self.parse_name_list()?;
            CstNode::new(NodeKind::TraitPrecedence, self.span_from(start))
                .field("trait", trait_name)
                .field("method", method)
                .field("insteadof", excluded)
        } else {
            self.expect(Token::KwAs, "'as' or 'insteadof'")?;
            let mut node = CstNode::new(NodeKind::TraitAlias, self.span_from(start));
            node.push_opt_field("trait", trait_name);
            node.push_field("method", method);
            if let Some(tok) = self
                .current
                .as_ref()
                .filter(|t| matches!(t.token, Token::KwPublic | Token::KwProtected | Token::KwPrivate))
            {
                let modifier =
                    CstNode::leaf(NodeKind::Modifier, tok.span, tok.text.to_ascii_lowercase());
                self.advance();
                node.push_field("modifier", modifier);
            }
            if !self.check(&Token::Semicolon) {
                node.push_field("alias", self.parse_member_name()?);
            }
            node
        };
        self.expect_semicolon()?;
        let mut node = node;
        node.span = self.span_from(start);
        Ok(node)
    }
}

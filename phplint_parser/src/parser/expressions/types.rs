//! Native type hints: `?int`, `int|string`, `A&B`, `(A&B)|null`, `\Foo\Bar`

use crate::cst::CstNode;
use crate::error::ParseResult;
use crate::node_kind::NodeKind;
use crate::token::Token;

use crate::parser::Parser;

impl<'a> Parser<'a> {
    /// Parse a type hint into a TypeHint leaf holding its source text
    pub(crate) fn parse_type_hint(&mut self) -> ParseResult<CstNode> {
        let start = self.current_start();
        self.eat(&Token::Question);
        loop {
            if self.eat(&Token::LParen).is_some() {
                self.parse_type_atom()?;
                while self.eat(&Token::Amp).is_some() {
                    self.parse_type_atom()?;
                }
                self.expect(Token::RParen, "')'")?;
            } else {
                self.parse_type_atom()?;
            }

            if self.eat(&Token::Pipe).is_some() {
                continue;
            }
            // `A&B $x` is an intersection; `A &$x` is a by-reference parameter
            if self.check(&Token::Amp)
                && !matches!(
                    self.peek_next(),
                    Some(Token::Variable | Token::Ellipsis | Token::Amp)
                )
            {
                self.advance();
                continue;
            }
            break;
        }
        let span = self.span_from(start);
        let text: String = self.source[span.start..span.end]
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        Ok(CstNode::leaf(NodeKind::TypeHint, span, text))
    }

    fn parse_type_atom(&mut self) -> ParseResult<()> {
        if self.check_any(&[Token::KwArray, Token::KwCallable]) {
            self.advance();
            return Ok(());
        }
        self.parse_name().map(|_| ())
    }
}

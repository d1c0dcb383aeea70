//! Literal parsers: numbers, quoted strings, heredoc/nowdoc, interpolation

use crate::cst::CstNode;
use crate::error::{ParseError, ParseResult};
use crate::lexer::heredoc_parts;
use crate::node_kind::NodeKind;
use crate::token::Token;

use super::Parser;

impl<'a> Parser<'a> {
    pub(crate) fn parse_number(&mut self) -> ParseResult<CstNode> {
        let Some(tok) = self.advance() else {
            return Err(self.unexpected("number"));
        };
        let kind = if tok.token == Token::FloatLiteral {
            NodeKind::FloatLiteral
        } else {
            NodeKind::IntegerLiteral
        };
        Ok(CstNode::leaf(kind, tok.span, tok.text.replace('_', "")))
    }

    /// `'...'`: only `\'` and `\\` are escapes
    pub(crate) fn parse_single_quoted(&mut self) -> ParseResult<CstNode> {
        let tok = self.expect(Token::StringLiteral, "string")?;
        let body = &tok.text[1..tok.text.len() - 1];
        Ok(CstNode::leaf(
            NodeKind::StringLiteral,
            tok.span,
            decode_single_quoted(body),
        ))
    }

    /// `"..."` or `` `...` ``
    pub(crate) fn parse_double_quoted(&mut self) -> ParseResult<CstNode> {
        let Some(tok) = self.advance() else {
            return Err(self.unexpected("string"));
        };
        let quote = tok.text.as_bytes().first().copied();
        let start = tok.span.start + 1;
        let end = tok.span.end.saturating_sub(1).max(start);
        self.build_interpolated(tok.span, start, end, 0, quote)
    }

    pub(crate) fn parse_heredoc(&mut self) -> ParseResult<CstNode> {
        let Some(tok) = self.advance() else {
            return Err(self.unexpected("heredoc"));
        };
        let parts = heredoc_parts(tok.text).ok_or_else(|| {
            ParseError::invalid_syntax("malformed heredoc", tok.span)
        })?;
        let body_start = tok.span.start + parts.body_offset;
        let body_end = body_start + parts.body_len;
        if tok.token == Token::Nowdoc {
            let body = &self.source[body_start..body_end];
            return Ok(CstNode::leaf(
                NodeKind::StringLiteral,
                tok.span,
                dedent(body, parts.indent),
            ));
        }
        self.build_interpolated(tok.span, body_start, body_end, parts.indent, None)
    }

    /// Split a string body into literal fragments and embedded expressions
    ///
    /// Returns a plain StringLiteral when nothing is interpolated.
    fn build_interpolated(
        &mut self,
        span: crate::span::Span,
        start: usize,
        end: usize,
        indent: usize,
        quote: Option<u8>,
    ) -> ParseResult<CstNode> {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut parts: Vec<CstNode> = Vec::new();
        let mut buf = String::new();
        let mut buf_start = start;
        let mut at_line_start = indent > 0;
        let mut i = start;

        while i < end {
            if at_line_start {
                let mut stripped = 0;
                while stripped < indent && i < end && matches!(bytes[i], b' ' | b'\t') {
                    i += 1;
                    stripped += 1;
                }
                at_line_start = false;
                continue;
            }
            let next = bytes.get(i + 1).copied().filter(|_| i + 1 < end);
            match bytes[i] {
                b'\\' if next.is_some() => {
                    let (decoded, len) = decode_escape(&source[i..end], quote);
                    buf.push_str(&decoded);
                    i += len;
                }
                b'$' if next.is_some_and(is_ident_start) => {
                    self.flush_fragment(&mut parts, &mut buf, buf_start, i);
                    let (node, after) = self.parse_simple_interpolation(i, end);
                    parts.push(node);
                    i = after;
                    buf_start = i;
                }
                b'{' if next == Some(b'$') => {
                    self.flush_fragment(&mut parts, &mut buf, buf_start, i);
                    let close = matching_brace(bytes, i + 1, end).ok_or_else(|| {
                        ParseError::UnterminatedString {
                            span: self.source_map.span(i, end),
                        }
                    })?;
                    parts.push(self.parse_embedded(i + 1, close));
                    i = close + 1;
                    buf_start = i;
                }
                b'$' if next == Some(b'{') => {
                    self.flush_fragment(&mut parts, &mut buf, buf_start, i);
                    let close = matching_brace(bytes, i + 2, end).ok_or_else(|| {
                        ParseError::UnterminatedString {
                            span: self.source_map.span(i, end),
                        }
                    })?;
                    let inner = &source[i + 2..close];
                    let node_span = self.source_map.span(i, close + 1);
                    if !inner.is_empty() && inner.bytes().all(is_ident_byte) {
                        parts.push(CstNode::leaf(NodeKind::Variable, node_span, inner));
                    } else {
                        let name = self.parse_embedded(i + 2, close);
                        parts.push(
                            CstNode::new(NodeKind::VariableVariable, node_span).field("name", name),
                        );
                    }
                    i = close + 1;
                    buf_start = i;
                }
                b'\n' => {
                    buf.push('\n');
                    i += 1;
                    at_line_start = indent > 0;
                }
                _ => {
                    let ch = source[i..].chars().next().unwrap_or('\u{FFFD}');
                    buf.push(ch);
                    i += ch.len_utf8();
                }
            }
        }
        self.flush_fragment(&mut parts, &mut buf, buf_start, end);

        if parts.iter().all(|p| p.kind == NodeKind::StringFragment) {
            let text: String = parts.iter().map(|p| p.text()).collect();
            return Ok(CstNode::leaf(NodeKind::StringLiteral, span, text));
        }
        Ok(CstNode::with_children(
            NodeKind::InterpolatedString,
            span,
            parts,
        ))
    }

    fn flush_fragment(&self, parts: &mut Vec<CstNode>, buf: &mut String, start: usize, end: usize) {
        if !buf.is_empty() {
            let span = self.source_map.span(start, end.max(start));
            parts.push(CstNode::leaf(
                NodeKind::StringFragment,
                span,
                std::mem::take(buf),
            ));
        }
    }

    /// `$name`, `$name[key]`, `$name->prop` inside a string
    fn parse_simple_interpolation(&self, start: usize, end: usize) -> (CstNode, usize) {
        let source = self.source;
        let bytes = source.as_bytes();
        let mut j = start + 1;
        while j < end && is_ident_byte(bytes[j]) {
            j += 1;
        }
        let mut node = CstNode::leaf(
            NodeKind::Variable,
            self.source_map.span(start, j),
            &source[start + 1..j],
        );

        if j < end && bytes[j] == b'[' {
            if let Some(close) = memchr::memchr(b']', &bytes[j..end]).map(|o| j + o) {
                let inner = &source[j + 1..close];
                let index_span = self.source_map.span(j + 1, close);
                let index = if let Some(var) = inner.strip_prefix('$') {
                    CstNode::leaf(NodeKind::Variable, index_span, var)
                } else if !inner.is_empty()
                    && inner.trim_start_matches('-').bytes().all(|b| b.is_ascii_digit())
                {
                    CstNode::leaf(NodeKind::IntegerLiteral, index_span, inner)
                } else {
                    CstNode::leaf(
                        NodeKind::StringLiteral,
                        index_span,
                        inner.trim_matches(|c| c == '\'' || c == '"'),
                    )
                };
                let span = self.source_map.span(start, close + 1);
                node = CstNode::new(NodeKind::SubscriptExpression, span)
                    .field("object", node)
                    .field("index", index);
                return (node, close + 1);
            }
        } else if source[j..end].starts_with("->")
            && bytes.get(j + 2).is_some_and(|&b| j + 2 < end && is_ident_start(b))
        {
            let name_start = j + 2;
            let mut k = name_start;
            while k < end && is_ident_byte(bytes[k]) {
                k += 1;
            }
            let name = CstNode::leaf(
                NodeKind::Name,
                self.source_map.span(name_start, k),
                &source[name_start..k],
            );
            node = CstNode::new(NodeKind::PropertyAccess, self.source_map.span(start, k))
                .field("object", node)
                .field("name", name);
            return (node, k);
        }
        (node, j)
    }

    /// Parse source `start..end` as an expression, merging its errors into ours
    fn parse_embedded(&mut self, start: usize, end: usize) -> CstNode {
        let (result, errors) = Parser::embedded(self.source, start, end).parse_embedded_expression();
        for e in errors {
            self.errors.push(e);
        }
        match result {
            Ok(expr) => expr,
            Err(e) => {
                let span = *e.span();
                self.errors.push(e);
                CstNode::new(NodeKind::Error, span)
            }
        }
    }
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// Index of the `}` closing a brace opened just before `from`
fn matching_brace(bytes: &[u8], from: usize, end: usize) -> Option<usize> {
    let mut depth = 1usize;
    let mut i = from;
    while i < end {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            q @ (b'\'' | b'"') => {
                i += 1;
                while i < end && bytes[i] != q {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

pub(crate) fn decode_single_quoted(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if next == '\\' || next == '\'' {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Decode one escape sequence at the start of `s` (which begins with `\`)
///
/// Returns the decoded text and the number of bytes consumed.
fn decode_escape(s: &str, quote: Option<u8>) -> (String, usize) {
    let bytes = s.as_bytes();
    let Some(&c) = bytes.get(1) else {
        return ("\\".to_string(), 1);
    };
    let simple = match c {
        b'n' => Some('\n'),
        b't' => Some('\t'),
        b'r' => Some('\r'),
        b'v' => Some('\u{0B}'),
        b'e' => Some('\u{1B}'),
        b'f' => Some('\u{0C}'),
        b'\\' => Some('\\'),
        b'$' => Some('$'),
        q if Some(q) == quote => Some(q as char),
        _ => None,
    };
    if let Some(ch) = simple {
        return (ch.to_string(), 2);
    }
    match c {
        b'0'..=b'7' => {
            let digits = bytes[1..]
                .iter()
                .take(3)
                .take_while(|b| (b'0'..=b'7').contains(b))
                .count();
            let value = u32::from_str_radix(&s[1..1 + digits], 8).unwrap_or(0) & 0xFF;
            (char::from_u32(value).unwrap_or('\u{FFFD}').to_string(), 1 + digits)
        }
        b'x' => {
            let digits = bytes[2..]
                .iter()
                .take(2)
                .take_while(|b| b.is_ascii_hexdigit())
                .count();
            if digits == 0 {
                return ("\\".to_string(), 1);
            }
            let value = u32::from_str_radix(&s[2..2 + digits], 16).unwrap_or(0);
            (char::from_u32(value).unwrap_or('\u{FFFD}').to_string(), 2 + digits)
        }
        b'u' if bytes.get(2) == Some(&b'{') => match s[3..].find('}') {
            Some(close) => {
                let value = u32::from_str_radix(&s[3..3 + close], 16).unwrap_or(0xFFFD);
                (
                    char::from_u32(value).unwrap_or('\u{FFFD}').to_string(),
                    4 + close,
                )
            }
            None => ("\\".to_string(), 1),
        },
        _ => ("\\".to_string(), 1),
    }
}

/// Remove up to `indent` leading blanks from every line
fn dedent(body: &str, indent: usize) -> String {
    if indent == 0 {
        return body.to_string();
    }
    body.split('\n')
        .map(|line| {
            let blanks = line
                .bytes()
                .take(indent)
                .take_while(|b| matches!(b, b' ' | b'\t'))
                .count();
            &line[blanks..]
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_single_quoted() {
        assert_eq!(decode_single_quoted(r"it\'s"), "it's");
        assert_eq!(decode_single_quoted(r"a\\b\n"), r"a\b\n");
    }

    #[test]
    fn test_decode_escape() {
        assert_eq!(decode_escape(r"\n", Some(b'"')), ("\n".to_string(), 2));
        assert_eq!(decode_escape(r#"\""#, Some(b'"')), ("\"".to_string(), 2));
        assert_eq!(decode_escape(r#"\""#, None), ("\\".to_string(), 1));
        assert_eq!(decode_escape(r"\x41", None), ("A".to_string(), 4));
        assert_eq!(decode_escape(r"\101", None), ("A".to_string(), 4));
        assert_eq!(decode_escape(r"\u{1F600}", None), ("\u{1F600}".to_string(), 9));
        assert_eq!(decode_escape(r"\q", None), ("\\".to_string(), 1));
    }

    #[test]
    fn test_dedent() {
        assert_eq!(dedent("    a\n      b", 4), "a\n  b");
        assert_eq!(dedent("a", 0), "a");
    }

    #[test]
    fn test_matching_brace_skips_strings() {
        let s = br#"$a["}"]} tail"#;
        assert_eq!(matching_brace(s, 0, s.len()), Some(7));
    }
}

//! Lexer for PHP source code
//!
//! Wraps the logos-generated lexer with the parts of PHP lexing a regular
//! automaton cannot express: inline HTML around `<?php ... ?>` tags,
//! comments that end at `?>`, quoted strings containing `{$...}` code,
//! heredoc/nowdoc bodies, and case-insensitive keywords.

use std::collections::VecDeque;

use logos::Logos;

use crate::error::{ParseError, ParseResult};
use crate::span::{SourceMap, Span};
use crate::token::Token;

/// A token with its span
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken<'a> {
    pub token: Token,
    pub span: Span,
    pub text: &'a str,
}

impl<'a> SpannedToken<'a> {
    pub fn new(token: Token, span: Span, text: &'a str) -> Self {
        Self { token, span, text }
    }
}

type LexItem<'a> = Result<SpannedToken<'a>, ParseError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Outside PHP tags
    Html,
    /// Inside `<?php ... ?>`
    Php,
}

/// PHP lexer
pub struct Lexer<'a> {
    source: &'a str,
    inner: logos::Lexer<'a, Token>,
    source_map: SourceMap,
    mode: Mode,
    /// Offset of `inner`'s input within `source`
    offset: usize,
    lookahead: VecDeque<LexItem<'a>>,
}

impl std::fmt::Debug for Lexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lexer")
            .field("mode", &self.mode)
            .field("position", &self.scan_offset())
            .field("lookahead", &self.lookahead.len())
            .finish()
    }
}

impl<'a> Lexer<'a> {
    /// Lex a whole file, starting outside PHP tags
    pub fn new(source: &'a str) -> Self {
        Self::with_mode(source, 0, Mode::Html)
    }

    /// Lex PHP code starting at `start`, as if already inside `<?php`
    ///
    /// Used for code embedded in interpolated strings: the caller passes
    /// the source truncated at the end of the embedded region so that
    /// spans stay relative to the enclosing file.
    pub fn new_php(source: &'a str, start: usize) -> Self {
        Self::with_mode(source, start, Mode::Php)
    }

    fn with_mode(source: &'a str, start: usize, mode: Mode) -> Self {
        let start = start.min(source.len());
        Self {
            source,
            inner: Token::lexer(&source[start..]),
            source_map: SourceMap::new(source),
            mode,
            offset: start,
            lookahead: VecDeque::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        self.source
    }

    pub fn source_map(&self) -> &SourceMap {
        &self.source_map
    }

    fn make_span(&self, start: usize, end: usize) -> Span {
        self.source_map.span(start, end)
    }

    fn spanned(&self, token: Token, start: usize, end: usize) -> SpannedToken<'a> {
        SpannedToken::new(token, self.make_span(start, end), &self.source[start..end])
    }

    /// Current scan position (past any buffered lookahead)
    pub fn scan_offset(&self) -> usize {
        self.offset + self.inner.span().end
    }

    /// Peek at the next token without consuming it
    pub fn peek(&mut self) -> Option<&LexItem<'a>> {
        self.peek_nth(0)
    }

    /// Peek `n` tokens ahead (0 is the next token)
    pub fn peek_nth(&mut self, n: usize) -> Option<&LexItem<'a>> {
        while self.lookahead.len() <= n {
            let item = self.next_raw()?;
            self.lookahead.push_back(item);
        }
        self.lookahead.get(n)
    }

    pub fn next_token(&mut self) -> Option<LexItem<'a>> {
        if let Some(item) = self.lookahead.pop_front() {
            return Some(item);
        }
        self.next_raw()
    }

    fn next_raw(&mut self) -> Option<LexItem<'a>> {
        match self.mode {
            Mode::Html => self.lex_html(),
            Mode::Php => self.lex_php(),
        }
    }

    /// Restart the logos lexer at an absolute offset
    fn restart_from(&mut self, pos: usize) {
        let pos = pos.min(self.source.len());
        self.inner = Token::lexer(&self.source[pos..]);
        self.offset = pos;
    }

    fn lex_html(&mut self) -> Option<LexItem<'a>> {
        let pos = self.scan_offset();
        if pos >= self.source.len() {
            return None;
        }
        let rest = self.source[pos..].as_bytes();
        match memchr::memmem::find(rest, b"<?") {
            Some(0) => {
                let (token, len) = if rest.starts_with(b"<?=") {
                    (Token::OpenTagWithEcho, 3)
                } else if rest.len() >= 5 && rest[..5].eq_ignore_ascii_case(b"<?php") {
                    (Token::OpenTag, 5)
                } else {
                    (Token::OpenTag, 2)
                };
                self.mode = Mode::Php;
                self.restart_from(pos + len);
                Some(Ok(self.spanned(token, pos, pos + len)))
            }
            Some(i) => {
                self.restart_from(pos + i);
                Some(Ok(self.spanned(Token::InlineHtml, pos, pos + i)))
            }
            None => {
                let end = self.source.len();
                self.restart_from(end);
                Some(Ok(self.spanned(Token::InlineHtml, pos, end)))
            }
        }
    }

    fn lex_php(&mut self) -> Option<LexItem<'a>> {
        let result = self.inner.next()?;
        let span = self.inner.span();
        let start = self.offset + span.start;
        let end = self.offset + span.end;

        let scanned = match result {
            Ok(Token::CloseTag) => {
                self.mode = Mode::Html;
                let rest = &self.source[end..];
                let after = if rest.starts_with("\r\n") {
                    end + 2
                } else if rest.starts_with('\n') {
                    end + 1
                } else {
                    end
                };
                self.restart_from(after);
                return Some(Ok(self.spanned(Token::CloseTag, start, end)));
            }
            Ok(Token::LineCommentStart) => {
                let stop = if self.source.as_bytes().get(end) == Some(&b'[')
                    && &self.source[start..end] == "#"
                {
                    // `#[Attribute(...)]` is skipped like a comment
                    self.skip_balanced(end + 1, b'[', b']')
                } else {
                    Ok(self.scan_line_comment(end))
                };
                stop.map(|e| (Token::LineComment, e))
            }
            Ok(Token::BlockCommentStart) => self.scan_block_comment(start, end).map(|e| {
                let text = &self.source[start..e];
                if text.starts_with("/**") && text != "/**/" {
                    (Token::DocComment, e)
                } else {
                    (Token::LineComment, e)
                }
            }),
            Ok(Token::SingleQuote) => self
                .scan_quoted(end, b'\'')
                .map(|e| (Token::StringLiteral, e)),
            Ok(Token::DoubleQuote) => self
                .scan_interpolated(end, b'"')
                .map(|e| (Token::TemplateString, e)),
            Ok(Token::Backtick) => self
                .scan_interpolated(end, b'`')
                .map(|e| (Token::ShellCommand, e)),
            Ok(Token::HeredocStart) => self.scan_heredoc(start, end),
            Ok(Token::Identifier) => {
                let text = &self.source[start..end];
                let token = Token::keyword(text).unwrap_or(Token::Identifier);
                return Some(Ok(self.spanned(token, start, end)));
            }
            Ok(token) => return Some(Ok(self.spanned(token, start, end))),
            Err(()) => {
                return Some(Err(ParseError::LexerError {
                    span: self.make_span(start, end),
                }))
            }
        };

        match scanned {
            Ok((token, scan_end)) => {
                self.restart_from(scan_end);
                Some(Ok(self.spanned(token, start, scan_end)))
            }
            Err(e) => {
                self.restart_from(self.source.len());
                Some(Err(e))
            }
        }
    }

    /// A line comment runs to the newline or to `?>`, whichever comes first
    fn scan_line_comment(&self, pos: usize) -> usize {
        let bytes = self.source.as_bytes();
        let mut i = pos;
        while let Some(off) = memchr::memchr2(b'\n', b'?', &bytes[i..]) {
            i += off;
            if bytes[i] == b'\n' || bytes.get(i + 1) == Some(&b'>') {
                return i;
            }
            i += 1;
        }
        bytes.len()
    }

    fn scan_block_comment(&self, start: usize, pos: usize) -> ParseResult<usize> {
        match memchr::memmem::find(&self.source.as_bytes()[pos..], b"*/") {
            Some(off) => Ok(pos + off + 2),
            None => Err(ParseError::UnterminatedComment {
                span: self.make_span(start, self.source.len()),
            }),
        }
    }

    /// Scan to the closing `quote`, honoring backslash escapes
    fn scan_quoted(&self, pos: usize, quote: u8) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut i = pos;
        // A trailing backslash steps past the end of the input
        while let Some(off) = bytes.get(i..).and_then(|rest| memchr::memchr2(b'\\', quote, rest)) {
            i += off;
            if bytes[i] == b'\\' {
                i += 2;
                continue;
            }
            return Ok(i + 1);
        }
        Err(ParseError::UnterminatedString {
            span: self.make_span(pos.saturating_sub(1), bytes.len()),
        })
    }

    /// Like [`Lexer::scan_quoted`], but `{$...}` and `${...}` regions are
    /// PHP code and may contain the quote character
    fn scan_interpolated(&self, pos: usize, quote: u8) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut i = pos;
        while i < bytes.len() {
            match bytes[i] {
                b'\\' => i += 2,
                b if b == quote => return Ok(i + 1),
                b'{' if bytes.get(i + 1) == Some(&b'$') => {
                    i = self.skip_balanced(i + 1, b'{', b'}')?;
                }
                b'$' if bytes.get(i + 1) == Some(&b'{') => {
                    i = self.skip_balanced(i + 2, b'{', b'}')?;
                }
                _ => i += 1,
            }
        }
        Err(ParseError::UnterminatedString {
            span: self.make_span(pos.saturating_sub(1), bytes.len()),
        })
    }

    /// Skip code up to the bracket closing an already-open `open`,
    /// stepping over nested strings. Returns the offset past the closer.
    fn skip_balanced(&self, pos: usize, open: u8, close: u8) -> ParseResult<usize> {
        let bytes = self.source.as_bytes();
        let mut depth = 1usize;
        let mut i = pos;
        while i < bytes.len() {
            match bytes[i] {
                b'\'' => i = self.scan_quoted(i + 1, b'\'')?,
                b'"' => i = self.scan_interpolated(i + 1, b'"')?,
                b if b == open => {
                    depth += 1;
                    i += 1;
                }
                b if b == close => {
                    depth -= 1;
                    i += 1;
                    if depth == 0 {
                        return Ok(i);
                    }
                }
                _ => i += 1,
            }
        }
        Err(ParseError::UnterminatedString {
            span: self.make_span(pos.saturating_sub(1), bytes.len()),
        })
    }

    /// Scan `<<<LABEL` / `<<<"LABEL"` / `<<<'LABEL'` through the closing label
    fn scan_heredoc(&self, start: usize, pos: usize) -> ParseResult<(Token, usize)> {
        let bytes = self.source.as_bytes();
        let mut i = pos;
        while matches!(bytes.get(i), Some(b' ' | b'\t')) {
            i += 1;
        }
        let quote = match bytes.get(i) {
            Some(&q) if q == b'\'' || q == b'"' => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        let label_start = i;
        while bytes.get(i).is_some_and(|&b| is_label_byte(b)) {
            i += 1;
        }
        let label = &bytes[label_start..i];
        if label.is_empty() {
            return Err(ParseError::invalid_syntax(
                "expected heredoc label after '<<<'",
                self.make_span(start, i),
            ));
        }
        if let Some(q) = quote {
            if bytes.get(i) != Some(&q) {
                return Err(ParseError::invalid_syntax(
                    "unterminated heredoc label quote",
                    self.make_span(start, i),
                ));
            }
            i += 1;
        }
        if bytes[i..].starts_with(b"\r\n") {
            i += 2;
        } else if bytes.get(i) == Some(&b'\n') {
            i += 1;
        } else {
            return Err(ParseError::invalid_syntax(
                "expected newline after heredoc label",
                self.make_span(start, i),
            ));
        }

        let mut line_start = i;
        loop {
            let mut j = line_start;
            while matches!(bytes.get(j), Some(b' ' | b'\t')) {
                j += 1;
            }
            let after = j + label.len();
            if bytes[j..].starts_with(label) && !bytes.get(after).is_some_and(|&b| is_label_byte(b))
            {
                let token = if quote == Some(b'\'') {
                    Token::Nowdoc
                } else {
                    Token::Heredoc
                };
                return Ok((token, after));
            }
            match memchr::memchr(b'\n', &bytes[line_start..]) {
                Some(off) => line_start += off + 1,
                None => {
                    return Err(ParseError::UnterminatedHeredoc {
                        label: String::from_utf8_lossy(label).into_owned(),
                        span: self.make_span(start, bytes.len()),
                    })
                }
            }
        }
    }

    /// Collect all tokens (for debugging)
    pub fn collect_all(mut self) -> Vec<LexItem<'a>> {
        let mut tokens = Vec::new();
        while let Some(token) = self.next_token() {
            tokens.push(token);
        }
        tokens
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = LexItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token()
    }
}

fn is_label_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b >= 0x80
}

/// The pieces of a scanned heredoc/nowdoc token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeredocParts {
    /// Byte offset of the body within the token text
    pub body_offset: usize,
    /// Raw body without the final newline before the closing label
    pub body_len: usize,
    /// Indentation of the closing label, removed from every body line
    pub indent: usize,
}

/// Split a heredoc token's text into its body and closing indentation
pub fn heredoc_parts(text: &str) -> Option<HeredocParts> {
    let first_nl = text.find('\n')?;
    let body_offset = first_nl + 1;
    let last_nl = text.rfind('\n')?;
    let closing = &text[last_nl + 1..];
    let indent = closing.len() - closing.trim_start_matches([' ', '\t']).len();
    let body_len = if last_nl < body_offset {
        0
    } else {
        let end = if text[..last_nl].ends_with('\r') {
            last_nl - 1
        } else {
            last_nl
        };
        end.saturating_sub(body_offset)
    };
    Some(HeredocParts {
        body_offset,
        body_len,
        indent,
    })
}

/// Tokenize source code into a vector of spanned tokens
pub fn tokenize(source: &str) -> Vec<LexItem<'_>> {
    Lexer::new(source).collect_all()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .into_iter()
            .filter_map(|r| r.ok())
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        assert_eq!(
            kinds("<?php function foo($x) { return $x + 1; }"),
            vec![
                Token::OpenTag,
                Token::KwFunction,
                Token::Identifier,
                Token::LParen,
                Token::Variable,
                Token::RParen,
                Token::LBrace,
                Token::KwReturn,
                Token::Variable,
                Token::Plus,
                Token::DecimalLiteral,
                Token::Semicolon,
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_keywords_any_case() {
        assert_eq!(
            kinds("<?php IF Else WHILE"),
            vec![Token::OpenTag, Token::KwIf, Token::KwElse, Token::KwWhile]
        );
    }

    #[test]
    fn test_inline_html_and_tags() {
        assert_eq!(
            kinds("<p>hi</p><?= $a ?>\n<b>"),
            vec![
                Token::InlineHtml,
                Token::OpenTagWithEcho,
                Token::Variable,
                Token::CloseTag,
                Token::InlineHtml,
            ]
        );
        let tokens: Vec<_> = tokenize("x<?php ?>\ny").into_iter().flatten().collect();
        assert_eq!(tokens.last().map(|t| t.text), Some("y"));
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            kinds("<?php // one ?>two"),
            vec![Token::OpenTag, Token::LineComment, Token::CloseTag, Token::InlineHtml]
        );
        assert_eq!(
            kinds("<?php /** doc */ /* plain */ # hash\n1"),
            vec![
                Token::OpenTag,
                Token::DocComment,
                Token::LineComment,
                Token::LineComment,
                Token::DecimalLiteral,
            ]
        );
    }

    #[test]
    fn test_attribute_is_skipped() {
        assert_eq!(
            kinds("<?php #[Attr(\"]\")] function"),
            vec![Token::OpenTag, Token::LineComment, Token::KwFunction]
        );
    }

    #[test]
    fn test_strings() {
        let tokens: Vec<_> = tokenize(r#"<?php 'it\'s' "a {$b["c"]} d" `ls`"#)
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(tokens[1].token, Token::StringLiteral);
        assert_eq!(tokens[1].text, r"'it\'s'");
        assert_eq!(tokens[2].token, Token::TemplateString);
        assert_eq!(tokens[2].text, r#""a {$b["c"]} d""#);
        assert_eq!(tokens[3].token, Token::ShellCommand);
    }

    #[test]
    fn test_unterminated_string() {
        let tokens = tokenize("<?php 'abc");
        assert!(matches!(
            tokens.last(),
            Some(Err(ParseError::UnterminatedString { .. }))
        ));
    }

    #[test]
    fn test_unterminated_string_ending_in_backslash() {
        let tokens = tokenize("<?php '\\");
        assert!(matches!(
            tokens.last(),
            Some(Err(ParseError::UnterminatedString { .. }))
        ));
    }

    #[test]
    fn test_heredoc() {
        let source = "<?php $x = <<<EOT\n  hello\n  EOT;\n";
        let tokens: Vec<_> = tokenize(source).into_iter().flatten().collect();
        let heredoc = &tokens[3];
        assert_eq!(heredoc.token, Token::Heredoc);
        assert!(heredoc.text.ends_with("EOT"));
        assert_eq!(tokens[4].token, Token::Semicolon);

        let parts = heredoc_parts(heredoc.text).unwrap();
        assert_eq!(parts.indent, 2);
        assert_eq!(
            &heredoc.text[parts.body_offset..parts.body_offset + parts.body_len],
            "  hello"
        );
    }

    #[test]
    fn test_nowdoc() {
        let tokens: Vec<_> = tokenize("<?php <<<'X'\n$a\nX;")
            .into_iter()
            .flatten()
            .collect();
        assert_eq!(tokens[1].token, Token::Nowdoc);
    }

    #[test]
    fn test_spans_are_absolute() {
        let source = "<?php\n$a = 1;";
        let tokens: Vec<_> = tokenize(source).into_iter().flatten().collect();
        assert_eq!(tokens[1].text, "$a");
        assert_eq!(tokens[1].span.start_line, 2);
        assert_eq!(tokens[1].span.start_column, 1);
    }

    #[test]
    fn test_peek_nth() {
        let mut lexer = Lexer::new("<?php (int) $x");
        assert_eq!(lexer.next_token().unwrap().unwrap().token, Token::OpenTag);
        let second = lexer.peek_nth(1).unwrap().as_ref().unwrap();
        assert_eq!(second.text, "int");
        assert_eq!(lexer.next_token().unwrap().unwrap().token, Token::LParen);
    }

    #[test]
    fn test_php_mode_sub_lexer() {
        let source = "<?php \"{$a->b}\"";
        let start = source.find("$a").unwrap();
        let end = source.find('}').unwrap();
        let tokens: Vec<_> = Lexer::new_php(&source[..end], start).flatten().collect();
        let kinds: Vec<_> = tokens.iter().map(|t| t.token.clone()).collect();
        assert_eq!(kinds, vec![Token::Variable, Token::Arrow, Token::Identifier]);
        assert_eq!(tokens[0].span.start, start);
    }
}

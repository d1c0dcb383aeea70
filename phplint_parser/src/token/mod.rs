//! Token definitions for the PHP lexer
//!
//! Keywords are case-insensitive in PHP, so the logos automaton only
//! recognizes identifiers; `Token::keyword` reclassifies them afterwards.

mod precedence;

#[cfg(test)]
mod tests;

use logos::Logos;

pub use precedence::{Associativity, Precedence};

/// PHP tokens
///
/// Variants without a `#[token]`/`#[regex]` attribute are synthesized by
/// [`crate::lexer::Lexer`] (keywords, scanned strings, comments, tags).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum Token {
    // ==================== Tags / inline HTML ====================
    /// `<?php` or `<?`
    OpenTag,
    /// `<?=`
    OpenTagWithEcho,
    #[token("?>")]
    CloseTag,
    /// Text outside of PHP tags
    InlineHtml,

    // ==================== Keywords ====================
    KwAbstract,
    KwAnd,
    KwArray,
    KwAs,
    KwBreak,
    KwCallable,
    KwCase,
    KwCatch,
    KwClass,
    KwClone,
    KwConst,
    KwContinue,
    KwDeclare,
    KwDefault,
    KwDie,
    KwDo,
    KwEcho,
    KwElse,
    KwElseif,
    KwEmpty,
    KwEnddeclare,
    KwEndfor,
    KwEndforeach,
    KwEndif,
    KwEndswitch,
    KwEndwhile,
    KwEval,
    KwExit,
    KwExtends,
    KwFinal,
    KwFinally,
    KwFn,
    KwFor,
    KwForeach,
    KwFunction,
    KwGlobal,
    KwGoto,
    KwIf,
    KwImplements,
    KwInclude,
    KwIncludeOnce,
    KwInstanceof,
    KwInsteadof,
    KwInterface,
    KwIsset,
    KwList,
    KwMatch,
    KwNamespace,
    KwNew,
    KwOr,
    KwPrint,
    KwPrivate,
    KwProtected,
    KwPublic,
    KwReadonly,
    KwRequire,
    KwRequireOnce,
    KwReturn,
    KwStatic,
    KwSwitch,
    KwThrow,
    KwTrait,
    KwTry,
    KwUnset,
    KwUse,
    KwVar,
    KwWhile,
    KwXor,
    KwYield,

    // ==================== Delimiters ====================
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,

    // ==================== Punctuation ====================
    #[token(",")]
    Comma,
    #[token(";")]
    Semicolon,
    #[token("::")]
    DoubleColon,
    #[token(":")]
    Colon,
    #[token("\\")]
    Backslash,
    #[token("...")]
    Ellipsis,
    #[token("->")]
    Arrow,
    #[token("?->")]
    NullsafeArrow,
    #[token("=>")]
    FatArrow,
    #[token("$")]
    Dollar,
    #[token("@")]
    At,

    // ==================== Assignment ====================
    #[token("=")]
    Eq,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    StarEq,
    #[token("/=")]
    SlashEq,
    #[token(".=")]
    DotEq,
    #[token("%=")]
    PercentEq,
    #[token("**=")]
    StarStarEq,
    #[token("&=")]
    AmpEq,
    #[token("|=")]
    PipeEq,
    #[token("^=")]
    CaretEq,
    #[token("<<=")]
    LtLtEq,
    #[token(">>=")]
    GtGtEq,
    #[token("??=")]
    QuestionQuestionEq,

    // ==================== Comparison ====================
    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    NotEq,
    #[token("<>")]
    LtGt,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token(">")]
    Gt,
    #[token("<=")]
    LtEq,
    #[token(">=")]
    GtEq,
    #[token("<=>")]
    Spaceship,

    // ==================== Arithmetic / string ====================
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("**")]
    StarStar,
    #[token(".")]
    Dot,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,

    // ==================== Logical / bitwise ====================
    #[token("&&")]
    AmpAmp,
    #[token("||")]
    PipePipe,
    #[token("!")]
    Bang,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,
    #[token("~")]
    Tilde,
    #[token("<<")]
    LtLt,
    #[token(">>")]
    GtGt,
    #[token("?")]
    Question,
    #[token("??")]
    QuestionQuestion,

    // ==================== Comments ====================
    #[token("//")]
    #[token("#")]
    LineCommentStart,
    #[token("/*")]
    BlockCommentStart,
    /// Scanned `//`, `#` or `/* */` comment
    LineComment,
    /// Scanned `/** ... */` comment
    DocComment,

    // ==================== Strings ====================
    #[token("'")]
    SingleQuote,
    #[token("\"")]
    DoubleQuote,
    #[token("`")]
    Backtick,
    #[token("<<<")]
    HeredocStart,
    /// Single-quoted string (no interpolation)
    StringLiteral,
    /// Double-quoted string (may interpolate)
    TemplateString,
    /// Heredoc (`<<<ID`) body, may interpolate
    Heredoc,
    /// Nowdoc (`<<<'ID'`) body
    Nowdoc,
    /// Backtick shell command
    ShellCommand,

    // ==================== Numbers ====================
    #[regex(r"0[xX][0-9a-fA-F]+(_[0-9a-fA-F]+)*")]
    HexLiteral,
    #[regex(r"0[bB][01]+(_[01]+)*")]
    BinaryLiteral,
    #[regex(r"0[oO][0-7]+(_[0-7]+)*")]
    OctalLiteral,
    #[regex(r"[0-9]+(_[0-9]+)*")]
    DecimalLiteral,
    #[regex(r"[0-9]+(_[0-9]+)*\.[0-9]*(_[0-9]+)*([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+(_[0-9]+)*([eE][+-]?[0-9]+)?")]
    #[regex(r"[0-9]+(_[0-9]+)*[eE][+-]?[0-9]+")]
    FloatLiteral,

    // ==================== Names ====================
    #[regex(r"\$[a-zA-Z_\u{80}-\u{10FFFF}][a-zA-Z0-9_\u{80}-\u{10FFFF}]*")]
    Variable,
    #[regex(r"[a-zA-Z_\u{80}-\u{10FFFF}][a-zA-Z0-9_\u{80}-\u{10FFFF}]*")]
    Identifier,
}

impl Token {
    /// Reclassify an identifier as a keyword (case-insensitive)
    pub fn keyword(text: &str) -> Option<Token> {
        let lower = text.to_ascii_lowercase();
        Some(match lower.as_str() {
            "abstract" => Token::KwAbstract,
            "and" => Token::KwAnd,
            "array" => Token::KwArray,
            "as" => Token::KwAs,
            "break" => Token::KwBreak,
            "callable" => Token::KwCallable,
            "case" => Token::KwCase,
            "catch" => Token::KwCatch,
            "class" => Token::KwClass,
            "clone" => Token::KwClone,
            "const" => Token::KwConst,
            "continue" => Token::KwContinue,
            "declare" => Token::KwDeclare,
            "default" => Token::KwDefault,
            "die" => Token::KwDie,
            "do" => Token::KwDo,
            "echo" => Token::KwEcho,
            "else" => Token::KwElse,
            "elseif" => Token::KwElseif,
            "empty" => Token::KwEmpty,
            "enddeclare" => Token::KwEnddeclare,
            "endfor" => Token::KwEndfor,
            "endforeach" => Token::KwEndforeach,
            "endif" => Token::KwEndif,
            "endswitch" => Token::KwEndswitch,
            "endwhile" => Token::KwEndwhile,
            "eval" => Token::KwEval,
            "exit" => Token::KwExit,
            "extends" => Token::KwExtends,
            "final" => Token::KwFinal,
            "finally" => Token::KwFinally,
            "fn" => Token::KwFn,
            "for" => Token::KwFor,
            "foreach" => Token::KwForeach,
            "function" => Token::KwFunction,
            "global" => Token::KwGlobal,
            "goto" => Token::KwGoto,
            "if" => Token::KwIf,
            "implements" => Token::KwImplements,
            "include" => Token::KwInclude,
            "include_once" => Token::KwIncludeOnce,
            "instanceof" => Token::KwInstanceof,
            "insteadof" => Token::KwInsteadof,
            "interface" => Token::KwInterface,
            "isset" => Token::KwIsset,
            "list" => Token::KwList,
            "match" => Token::KwMatch,
            "namespace" => Token::KwNamespace,
            "new" => Token::KwNew,
            "or" => Token::KwOr,
            "print" => Token::KwPrint,
            "private" => Token::KwPrivate,
            "protected" => Token::KwProtected,
            "public" => Token::KwPublic,
            "readonly" => Token::KwReadonly,
            "require" => Token::KwRequire,
            "require_once" => Token::KwRequireOnce,
            "return" => Token::KwReturn,
            "static" => Token::KwStatic,
            "switch" => Token::KwSwitch,
            "throw" => Token::KwThrow,
            "trait" => Token::KwTrait,
            "try" => Token::KwTry,
            "unset" => Token::KwUnset,
            "use" => Token::KwUse,
            "var" => Token::KwVar,
            "while" => Token::KwWhile,
            "xor" => Token::KwXor,
            "yield" => Token::KwYield,
            _ => return None,
        })
    }

    /// Check if this token is a keyword
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            Token::KwAbstract
                | Token::KwAnd
                | Token::KwArray
                | Token::KwAs
                | Token::KwBreak
                | Token::KwCallable
                | Token::KwCase
                | Token::KwCatch
                | Token::KwClass
                | Token::KwClone
                | Token::KwConst
                | Token::KwContinue
                | Token::KwDeclare
                | Token::KwDefault
                | Token::KwDie
                | Token::KwDo
                | Token::KwEcho
                | Token::KwElse
                | Token::KwElseif
                | Token::KwEmpty
                | Token::KwEnddeclare
                | Token::KwEndfor
                | Token::KwEndforeach
                | Token::KwEndif
                | Token::KwEndswitch
                | Token::KwEndwhile
                | Token::KwEval
                | Token::KwExit
                | Token::KwExtends
                | Token::KwFinal
                | Token::KwFinally
                | Token::KwFn
                | Token::KwFor
                | Token::KwForeach
                | Token::KwFunction
                | Token::KwGlobal
                | Token::KwGoto
                | Token::KwIf
                | Token::KwImplements
                | Token::KwInclude
                | Token::KwIncludeOnce
                | Token::KwInstanceof
                | Token::KwInsteadof
                | Token::KwInterface
                | Token::KwIsset
                | Token::KwList
                | Token::KwMatch
                | Token::KwNamespace
                | Token::KwNew
                | Token::KwOr
                | Token::KwPrint
                | Token::KwPrivate
                | Token::KwProtected
                | Token::KwPublic
                | Token::KwReadonly
                | Token::KwRequire
                | Token::KwRequireOnce
                | Token::KwReturn
                | Token::KwStatic
                | Token::KwSwitch
                | Token::KwThrow
                | Token::KwTrait
                | Token::KwTry
                | Token::KwUnset
                | Token::KwUse
                | Token::KwVar
                | Token::KwWhile
                | Token::KwXor
                | Token::KwYield
        )
    }

    /// Identifiers and semi-reserved keywords usable as member names
    /// (`$a->list`, `Foo::class`, `function new()`)
    pub fn is_member_name(&self) -> bool {
        matches!(self, Token::Identifier) || self.is_keyword()
    }

    /// Check if this is an assignment operator (`=` or compound)
    pub fn is_assignment(&self) -> bool {
        matches!(self, Token::Eq) || self.is_compound_assignment()
    }

    /// Check if this is a compound assignment operator (`+=`, `.=`, `??=`, ...)
    pub fn is_compound_assignment(&self) -> bool {
        matches!(
            self,
            Token::PlusEq
                | Token::MinusEq
                | Token::StarEq
                | Token::SlashEq
                | Token::DotEq
                | Token::PercentEq
                | Token::StarStarEq
                | Token::AmpEq
                | Token::PipeEq
                | Token::CaretEq
                | Token::LtLtEq
                | Token::GtGtEq
                | Token::QuestionQuestionEq
        )
    }

    /// Check if this token starts a literal
    pub fn is_literal(&self) -> bool {
        matches!(
            self,
            Token::HexLiteral
                | Token::BinaryLiteral
                | Token::OctalLiteral
                | Token::DecimalLiteral
                | Token::FloatLiteral
                | Token::StringLiteral
                | Token::TemplateString
                | Token::Heredoc
                | Token::Nowdoc
        )
    }

    /// Check if this is a member or class modifier keyword
    pub fn is_modifier(&self) -> bool {
        matches!(
            self,
            Token::KwPublic
                | Token::KwProtected
                | Token::KwPrivate
                | Token::KwStatic
                | Token::KwAbstract
                | Token::KwFinal
                | Token::KwReadonly
                | Token::KwVar
        )
    }

    /// Check if this is a comment token
    pub fn is_comment(&self) -> bool {
        matches!(self, Token::LineComment | Token::DocComment)
    }
}

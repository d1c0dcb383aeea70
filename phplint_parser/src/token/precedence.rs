//! Operator precedence and associativity definitions

use super::Token;

/// Operator precedence levels, lowest first
///
/// Follows the PHP 8 operator table. Assignment is handled by the parser
/// whenever the left operand is assignable, so `!$a = foo()` parses as
/// `!($a = foo())`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i8)]
pub enum Precedence {
    /// Statement level
    Lowest = 0,
    /// `or`
    KeywordOr = 1,
    /// `xor`
    KeywordXor = 2,
    /// `and`
    KeywordAnd = 3,
    /// `=`, `+=`, ...
    Assign = 4,
    /// `? :`
    Ternary = 5,
    /// `??`
    Coalesce = 6,
    /// `||`
    LogicalOr = 7,
    /// `&&`
    LogicalAnd = 8,
    /// `|`
    BitOr = 9,
    /// `^`
    BitXor = 10,
    /// `&`
    BitAnd = 11,
    /// `==`, `!=`, `===`, `!==`, `<>`, `<=>`
    Equality = 12,
    /// `<`, `<=`, `>`, `>=`
    Relational = 13,
    /// `.`
    Concat = 14,
    /// `<<`, `>>`
    Shift = 15,
    /// `+`, `-`
    Additive = 16,
    /// `*`, `/`, `%`
    Multiplicative = 17,
    /// `!`
    Not = 18,
    /// `instanceof`
    Instanceof = 19,
    /// Unary `-`, `+`, `~`, casts, `@`, `++`/`--`
    Prefix = 20,
    /// `**`
    Pow = 21,
}

impl TryFrom<i8> for Precedence {
    type Error = ();

    fn try_from(value: i8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Precedence::Lowest),
            1 => Ok(Precedence::KeywordOr),
            2 => Ok(Precedence::KeywordXor),
            3 => Ok(Precedence::KeywordAnd),
            4 => Ok(Precedence::Assign),
            5 => Ok(Precedence::Ternary),
            6 => Ok(Precedence::Coalesce),
            7 => Ok(Precedence::LogicalOr),
            8 => Ok(Precedence::LogicalAnd),
            9 => Ok(Precedence::BitOr),
            10 => Ok(Precedence::BitXor),
            11 => Ok(Precedence::BitAnd),
            12 => Ok(Precedence::Equality),
            13 => Ok(Precedence::Relational),
            14 => Ok(Precedence::Concat),
            15 => Ok(Precedence::Shift),
            16 => Ok(Precedence::Additive),
            17 => Ok(Precedence::Multiplicative),
            18 => Ok(Precedence::Not),
            19 => Ok(Precedence::Instanceof),
            20 => Ok(Precedence::Prefix),
            21 => Ok(Precedence::Pow),
            _ => Err(()),
        }
    }
}

impl Precedence {
    /// The next tighter level (used for left-associative operands)
    pub fn next(self) -> Precedence {
        Precedence::try_from(self as i8 + 1).unwrap_or(Precedence::Pow)
    }
}

/// Operator associativity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
    None,
}

impl Token {
    /// Get the precedence and associativity of a binary operator
    ///
    /// Assignment and ternary are parsed separately and are not listed.
    pub fn binary_precedence(&self) -> Option<(Precedence, Associativity)> {
        use Associativity::{Left, None, Right};
        use Precedence::*;

        Some(match self {
            Token::KwOr => (KeywordOr, Left),
            Token::KwXor => (KeywordXor, Left),
            Token::KwAnd => (KeywordAnd, Left),
            Token::QuestionQuestion => (Coalesce, Right),
            Token::PipePipe => (LogicalOr, Left),
            Token::AmpAmp => (LogicalAnd, Left),
            Token::Pipe => (BitOr, Left),
            Token::Caret => (BitXor, Left),
            Token::Amp => (BitAnd, Left),
            Token::EqEq
            | Token::EqEqEq
            | Token::NotEq
            | Token::LtGt
            | Token::NotEqEq
            | Token::Spaceship => (Equality, None),
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => (Relational, None),
            Token::Dot => (Concat, Left),
            Token::LtLt | Token::GtGt => (Shift, Left),
            Token::Plus | Token::Minus => (Additive, Left),
            Token::Star | Token::Slash | Token::Percent => (Multiplicative, Left),
            Token::KwInstanceof => (Instanceof, None),
            Token::StarStar => (Pow, Right),
            _ => return Option::None,
        })
    }

    /// Get the precedence of a unary operator
    pub fn unary_precedence(&self) -> Option<Precedence> {
        match self {
            Token::Bang => Some(Precedence::Not),
            Token::Plus | Token::Minus | Token::Tilde | Token::At => Some(Precedence::Prefix),
            _ => None,
        }
    }

    /// Operator text for a compound assignment, without the trailing `=`
    pub fn compound_operator(&self) -> Option<&'static str> {
        Some(match self {
            Token::PlusEq => "+",
            Token::MinusEq => "-",
            Token::StarEq => "*",
            Token::SlashEq => "/",
            Token::DotEq => ".",
            Token::PercentEq => "%",
            Token::StarStarEq => "**",
            Token::AmpEq => "&",
            Token::PipeEq => "|",
            Token::CaretEq => "^",
            Token::LtLtEq => "<<",
            Token::GtGtEq => ">>",
            Token::QuestionQuestionEq => "??",
            _ => return None,
        })
    }
}

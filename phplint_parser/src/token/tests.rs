//! Tests for token module

use super::*;
use logos::Logos;

#[test]
fn test_operators() {
    let mut lexer = Token::lexer("+ -> ?-> ?? ??= === !== <=> ** **= ...");
    assert_eq!(lexer.next(), Some(Ok(Token::Plus)));
    assert_eq!(lexer.next(), Some(Ok(Token::Arrow)));
    assert_eq!(lexer.next(), Some(Ok(Token::NullsafeArrow)));
    assert_eq!(lexer.next(), Some(Ok(Token::QuestionQuestion)));
    assert_eq!(lexer.next(), Some(Ok(Token::QuestionQuestionEq)));
    assert_eq!(lexer.next(), Some(Ok(Token::EqEqEq)));
    assert_eq!(lexer.next(), Some(Ok(Token::NotEqEq)));
    assert_eq!(lexer.next(), Some(Ok(Token::Spaceship)));
    assert_eq!(lexer.next(), Some(Ok(Token::StarStar)));
    assert_eq!(lexer.next(), Some(Ok(Token::StarStarEq)));
    assert_eq!(lexer.next(), Some(Ok(Token::Ellipsis)));
}

#[test]
fn test_numbers() {
    let mut lexer = Token::lexer("42 3.14 0xff 0b101 1_000_000 .5 1e3");
    assert_eq!(lexer.next(), Some(Ok(Token::DecimalLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::HexLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::BinaryLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::DecimalLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral)));
    assert_eq!(lexer.next(), Some(Ok(Token::FloatLiteral)));
}

#[test]
fn test_variables_and_identifiers() {
    let mut lexer = Token::lexer("$foo bar_baz $ $x");
    assert_eq!(lexer.next(), Some(Ok(Token::Variable)));
    assert_eq!(lexer.next(), Some(Ok(Token::Identifier)));
    assert_eq!(lexer.next(), Some(Ok(Token::Dollar)));
    assert_eq!(lexer.next(), Some(Ok(Token::Variable)));
}

#[test]
fn test_comment_and_string_starts() {
    let mut lexer = Token::lexer("// # /* ' \" <<<");
    assert_eq!(lexer.next(), Some(Ok(Token::LineCommentStart)));
    assert_eq!(lexer.next(), Some(Ok(Token::LineCommentStart)));
    assert_eq!(lexer.next(), Some(Ok(Token::BlockCommentStart)));
    assert_eq!(lexer.next(), Some(Ok(Token::SingleQuote)));
    assert_eq!(lexer.next(), Some(Ok(Token::DoubleQuote)));
    assert_eq!(lexer.next(), Some(Ok(Token::HeredocStart)));
}

// =============================================================================
// Keyword classification
// =============================================================================

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(Token::keyword("function"), Some(Token::KwFunction));
    assert_eq!(Token::keyword("FUNCTION"), Some(Token::KwFunction));
    assert_eq!(Token::keyword("ElseIf"), Some(Token::KwElseif));
    assert_eq!(Token::keyword("require_once"), Some(Token::KwRequireOnce));
    assert_eq!(Token::keyword("strlen"), None);
}

#[test]
fn test_is_keyword() {
    assert!(Token::KwClass.is_keyword());
    assert!(Token::KwYield.is_keyword());
    assert!(!Token::Identifier.is_keyword());
    assert!(Token::KwList.is_member_name());
}

#[test]
fn test_assignment_classification() {
    assert!(Token::Eq.is_assignment());
    assert!(!Token::Eq.is_compound_assignment());
    assert!(Token::DotEq.is_compound_assignment());
    assert!(Token::QuestionQuestionEq.is_assignment());
    assert!(!Token::EqEq.is_assignment());
    assert_eq!(Token::DotEq.compound_operator(), Some("."));
    assert_eq!(Token::QuestionQuestionEq.compound_operator(), Some("??"));
}

#[test]
fn test_precedence_ordering() {
    let prec = |t: Token| t.binary_precedence().map(|(p, _)| p);
    assert!(prec(Token::Star) > prec(Token::Plus));
    assert!(prec(Token::Plus) > prec(Token::Dot));
    assert!(prec(Token::AmpAmp) > prec(Token::PipePipe));
    assert!(prec(Token::PipePipe) > prec(Token::KwAnd));
    assert!(prec(Token::KwInstanceof) > prec(Token::EqEqEq));
    assert_eq!(
        Token::StarStar.binary_precedence(),
        Some((Precedence::Pow, Associativity::Right))
    );
    assert_eq!(Token::Comma.binary_precedence(), None);
}

#[test]
fn test_precedence_roundtrip_from_i8() {
    assert_eq!(Precedence::try_from(14), Ok(Precedence::Concat));
    assert_eq!(Precedence::try_from(99), Err(()));
    assert_eq!(Precedence::Additive.next(), Precedence::Multiplicative);
    assert_eq!(Precedence::Pow.next(), Precedence::Pow);
}

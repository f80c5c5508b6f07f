use crate::operator::Operator;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;
use crate::token::TT;
use ahash::HashMap;
use once_cell::sync::Lazy;

/// Tokens that continue an expression after an operand: binary and assignment operators, plus
/// member access, calls, `?:` and the comma.
const MULTARY: &[(TT, OperatorName)] = &[
  (TT::Plus, OperatorName::Addition),
  (TT::Hyphen, OperatorName::Subtraction),
  (TT::Asterisk, OperatorName::Multiplication),
  (TT::Slash, OperatorName::Division),
  (TT::Percent, OperatorName::Remainder),
  (TT::AsteriskAsterisk, OperatorName::Exponentiation),
  (TT::Ampersand, OperatorName::BitwiseAnd),
  (TT::Bar, OperatorName::BitwiseOr),
  (TT::Caret, OperatorName::BitwiseXor),
  (TT::ChevronLeftChevronLeft, OperatorName::BitwiseLeftShift),
  (TT::ChevronRightChevronRight, OperatorName::BitwiseRightShift),
  (TT::ChevronRightChevronRightChevronRight, OperatorName::BitwiseUnsignedRightShift),
  (TT::EqualsEquals, OperatorName::Equality),
  (TT::ExclamationEquals, OperatorName::Inequality),
  (TT::EqualsEqualsEquals, OperatorName::StrictEquality),
  (TT::ExclamationEqualsEquals, OperatorName::StrictInequality),
  (TT::ChevronLeft, OperatorName::LessThan),
  (TT::ChevronLeftEquals, OperatorName::LessThanOrEqual),
  (TT::ChevronRight, OperatorName::GreaterThan),
  (TT::ChevronRightEquals, OperatorName::GreaterThanOrEqual),
  (TT::KeywordIn, OperatorName::In),
  (TT::KeywordInstanceof, OperatorName::Instanceof),
  (TT::AmpersandAmpersand, OperatorName::LogicalAnd),
  (TT::BarBar, OperatorName::LogicalOr),
  (TT::QuestionQuestion, OperatorName::NullishCoalescing),
  (TT::Equals, OperatorName::Assignment),
  (TT::PlusEquals, OperatorName::AssignmentAddition),
  (TT::HyphenEquals, OperatorName::AssignmentSubtraction),
  (TT::AsteriskEquals, OperatorName::AssignmentMultiplication),
  (TT::SlashEquals, OperatorName::AssignmentDivision),
  (TT::PercentEquals, OperatorName::AssignmentRemainder),
  (TT::AsteriskAsteriskEquals, OperatorName::AssignmentExponentiation),
  (TT::AmpersandEquals, OperatorName::AssignmentBitwiseAnd),
  (TT::BarEquals, OperatorName::AssignmentBitwiseOr),
  (TT::CaretEquals, OperatorName::AssignmentBitwiseXor),
  (TT::ChevronLeftChevronLeftEquals, OperatorName::AssignmentBitwiseLeftShift),
  (TT::ChevronRightChevronRightEquals, OperatorName::AssignmentBitwiseRightShift),
  (
    TT::ChevronRightChevronRightChevronRightEquals,
    OperatorName::AssignmentBitwiseUnsignedRightShift,
  ),
  (TT::AmpersandAmpersandEquals, OperatorName::AssignmentLogicalAnd),
  (TT::BarBarEquals, OperatorName::AssignmentLogicalOr),
  (TT::QuestionQuestionEquals, OperatorName::AssignmentNullishCoalescing),
  (TT::Dot, OperatorName::MemberAccess),
  (TT::BracketOpen, OperatorName::ComputedMemberAccess),
  (TT::ParenthesisOpen, OperatorName::Call),
  (TT::QuestionDot, OperatorName::OptionalChainingMemberAccess),
  (TT::QuestionDotBracketOpen, OperatorName::OptionalChainingComputedMemberAccess),
  (TT::QuestionDotParenthesisOpen, OperatorName::OptionalChainingCall),
  (TT::Question, OperatorName::Conditional),
  (TT::Comma, OperatorName::Comma),
];

// `new`, `await` and `yield` have their own parsing routines.
const UNARY: &[(TT, OperatorName)] = &[
  (TT::Plus, OperatorName::UnaryPlus),
  (TT::Hyphen, OperatorName::UnaryNegation),
  (TT::Exclamation, OperatorName::LogicalNot),
  (TT::Tilde, OperatorName::BitwiseNot),
  (TT::PlusPlus, OperatorName::PrefixIncrement),
  (TT::HyphenHyphen, OperatorName::PrefixDecrement),
  (TT::KeywordTypeof, OperatorName::Typeof),
  (TT::KeywordVoid, OperatorName::Void),
  (TT::KeywordDelete, OperatorName::Delete),
];

fn lookup_table(pairs: &[(TT, OperatorName)]) -> HashMap<TT, &'static Operator> {
  pairs
    .iter()
    .map(|(tt, name)| (*tt, &OPERATORS[name]))
    .collect()
}

pub static MULTARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static Operator>> =
  Lazy::new(|| lookup_table(MULTARY));

pub static UNARY_OPERATOR_MAPPING: Lazy<HashMap<TT, &'static Operator>> =
  Lazy::new(|| lookup_table(UNARY));

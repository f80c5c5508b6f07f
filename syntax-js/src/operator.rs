use ahash::HashMap;
use ahash::HashMapExt;
use once_cell::sync::Lazy;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Associativity {
  Left,
  Right,
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum OperatorName {
  Addition,
  Assignment,
  AssignmentAddition,
  AssignmentBitwiseAnd,
  AssignmentBitwiseLeftShift,
  AssignmentBitwiseOr,
  AssignmentBitwiseRightShift,
  AssignmentBitwiseUnsignedRightShift,
  AssignmentBitwiseXor,
  AssignmentDivision,
  AssignmentExponentiation,
  AssignmentLogicalAnd,
  AssignmentLogicalOr,
  AssignmentMultiplication,
  AssignmentNullishCoalescing,
  AssignmentRemainder,
  AssignmentSubtraction,
  Await,
  BitwiseAnd,
  BitwiseLeftShift,
  BitwiseNot,
  BitwiseOr,
  BitwiseRightShift,
  BitwiseUnsignedRightShift,
  BitwiseXor,
  Call,
  Comma,
  ComputedMemberAccess,
  Conditional,
  ConditionalAlternate,
  Delete,
  Division,
  Equality,
  Exponentiation,
  GreaterThan,
  GreaterThanOrEqual,
  In,
  Inequality,
  Instanceof,
  LessThan,
  LessThanOrEqual,
  LogicalAnd,
  LogicalNot,
  LogicalOr,
  MemberAccess,
  Multiplication,
  New,
  NullishCoalescing,
  OptionalChainingCall,
  OptionalChainingComputedMemberAccess,
  OptionalChainingMemberAccess,
  PostfixDecrement,
  PostfixIncrement,
  PrefixDecrement,
  PrefixIncrement,
  Remainder,
  StrictEquality,
  StrictInequality,
  Subtraction,
  Typeof,
  UnaryNegation,
  UnaryPlus,
  Void,
  Yield,
  YieldDelegated,
}

impl OperatorName {
  pub fn is_assignment(self) -> bool {
    matches!(
      self,
      OperatorName::Assignment
        | OperatorName::AssignmentAddition
        | OperatorName::AssignmentBitwiseAnd
        | OperatorName::AssignmentBitwiseLeftShift
        | OperatorName::AssignmentBitwiseOr
        | OperatorName::AssignmentBitwiseRightShift
        | OperatorName::AssignmentBitwiseUnsignedRightShift
        | OperatorName::AssignmentBitwiseXor
        | OperatorName::AssignmentDivision
        | OperatorName::AssignmentExponentiation
        | OperatorName::AssignmentLogicalAnd
        | OperatorName::AssignmentLogicalOr
        | OperatorName::AssignmentMultiplication
        | OperatorName::AssignmentNullishCoalescing
        | OperatorName::AssignmentRemainder
        | OperatorName::AssignmentSubtraction
    )
  }

  /// For a compound assignment, the binary operator it applies before storing.
  pub fn compound_base(self) -> Option<OperatorName> {
    Some(match self {
      OperatorName::AssignmentAddition => OperatorName::Addition,
      OperatorName::AssignmentBitwiseAnd => OperatorName::BitwiseAnd,
      OperatorName::AssignmentBitwiseLeftShift => OperatorName::BitwiseLeftShift,
      OperatorName::AssignmentBitwiseOr => OperatorName::BitwiseOr,
      OperatorName::AssignmentBitwiseRightShift => OperatorName::BitwiseRightShift,
      OperatorName::AssignmentBitwiseUnsignedRightShift => OperatorName::BitwiseUnsignedRightShift,
      OperatorName::AssignmentBitwiseXor => OperatorName::BitwiseXor,
      OperatorName::AssignmentDivision => OperatorName::Division,
      OperatorName::AssignmentExponentiation => OperatorName::Exponentiation,
      OperatorName::AssignmentLogicalAnd => OperatorName::LogicalAnd,
      OperatorName::AssignmentLogicalOr => OperatorName::LogicalOr,
      OperatorName::AssignmentMultiplication => OperatorName::Multiplication,
      OperatorName::AssignmentNullishCoalescing => OperatorName::NullishCoalescing,
      OperatorName::AssignmentRemainder => OperatorName::Remainder,
      OperatorName::AssignmentSubtraction => OperatorName::Subtraction,
      _ => return None,
    })
  }

  /// Source text of the operator, as printed between or before operands.
  pub fn syntax(self) -> &'static str {
    match self {
      OperatorName::Addition | OperatorName::UnaryPlus => "+",
      OperatorName::Assignment => "=",
      OperatorName::AssignmentAddition => "+=",
      OperatorName::AssignmentBitwiseAnd => "&=",
      OperatorName::AssignmentBitwiseLeftShift => "<<=",
      OperatorName::AssignmentBitwiseOr => "|=",
      OperatorName::AssignmentBitwiseRightShift => ">>=",
      OperatorName::AssignmentBitwiseUnsignedRightShift => ">>>=",
      OperatorName::AssignmentBitwiseXor => "^=",
      OperatorName::AssignmentDivision => "/=",
      OperatorName::AssignmentExponentiation => "**=",
      OperatorName::AssignmentLogicalAnd => "&&=",
      OperatorName::AssignmentLogicalOr => "||=",
      OperatorName::AssignmentMultiplication => "*=",
      OperatorName::AssignmentNullishCoalescing => "??=",
      OperatorName::AssignmentRemainder => "%=",
      OperatorName::AssignmentSubtraction => "-=",
      OperatorName::Await => "await",
      OperatorName::BitwiseAnd => "&",
      OperatorName::BitwiseLeftShift => "<<",
      OperatorName::BitwiseNot => "~",
      OperatorName::BitwiseOr => "|",
      OperatorName::BitwiseRightShift => ">>",
      OperatorName::BitwiseUnsignedRightShift => ">>>",
      OperatorName::BitwiseXor => "^",
      OperatorName::Call => "(",
      OperatorName::Comma => ",",
      OperatorName::ComputedMemberAccess => "[",
      OperatorName::Conditional | OperatorName::ConditionalAlternate => "?",
      OperatorName::Delete => "delete",
      OperatorName::Division => "/",
      OperatorName::Equality => "==",
      OperatorName::Exponentiation => "**",
      OperatorName::GreaterThan => ">",
      OperatorName::GreaterThanOrEqual => ">=",
      OperatorName::In => "in",
      OperatorName::Inequality => "!=",
      OperatorName::Instanceof => "instanceof",
      OperatorName::LessThan => "<",
      OperatorName::LessThanOrEqual => "<=",
      OperatorName::LogicalAnd => "&&",
      OperatorName::LogicalNot => "!",
      OperatorName::LogicalOr => "||",
      OperatorName::MemberAccess => ".",
      OperatorName::Multiplication => "*",
      OperatorName::New => "new",
      OperatorName::NullishCoalescing => "??",
      OperatorName::OptionalChainingCall => "?.(",
      OperatorName::OptionalChainingComputedMemberAccess => "?.[",
      OperatorName::OptionalChainingMemberAccess => "?.",
      OperatorName::PostfixDecrement | OperatorName::PrefixDecrement => "--",
      OperatorName::PostfixIncrement | OperatorName::PrefixIncrement => "++",
      OperatorName::Remainder => "%",
      OperatorName::StrictEquality => "===",
      OperatorName::StrictInequality => "!==",
      OperatorName::Subtraction | OperatorName::UnaryNegation => "-",
      OperatorName::Typeof => "typeof",
      OperatorName::Void => "void",
      OperatorName::Yield => "yield",
      OperatorName::YieldDelegated => "yield*",
    }
  }
}

pub struct Operator {
  pub name: OperatorName,
  pub precedence: u8,
  pub associativity: Associativity,
}

// Higher precedence binds tighter. Postfix and prefix operators that share a level with binary
// operators are right associative so their operand is parsed at the same level.
const PRECEDENCE_LEVELS: &[(&[OperatorName], Associativity)] = &[
  (&[OperatorName::Comma], Associativity::Left),
  (&[OperatorName::Yield, OperatorName::YieldDelegated], Associativity::Right),
  (
    &[
      OperatorName::Assignment,
      OperatorName::AssignmentAddition,
      OperatorName::AssignmentBitwiseAnd,
      OperatorName::AssignmentBitwiseLeftShift,
      OperatorName::AssignmentBitwiseOr,
      OperatorName::AssignmentBitwiseRightShift,
      OperatorName::AssignmentBitwiseUnsignedRightShift,
      OperatorName::AssignmentBitwiseXor,
      OperatorName::AssignmentDivision,
      OperatorName::AssignmentExponentiation,
      OperatorName::AssignmentLogicalAnd,
      OperatorName::AssignmentLogicalOr,
      OperatorName::AssignmentMultiplication,
      OperatorName::AssignmentNullishCoalescing,
      OperatorName::AssignmentRemainder,
      OperatorName::AssignmentSubtraction,
      OperatorName::ConditionalAlternate,
    ],
    Associativity::Right,
  ),
  (&[OperatorName::Conditional], Associativity::Right),
  (&[OperatorName::LogicalOr, OperatorName::NullishCoalescing], Associativity::Left),
  (&[OperatorName::LogicalAnd], Associativity::Left),
  (&[OperatorName::BitwiseOr], Associativity::Left),
  (&[OperatorName::BitwiseXor], Associativity::Left),
  (&[OperatorName::BitwiseAnd], Associativity::Left),
  (
    &[
      OperatorName::Equality,
      OperatorName::Inequality,
      OperatorName::StrictEquality,
      OperatorName::StrictInequality,
    ],
    Associativity::Left,
  ),
  (
    &[
      OperatorName::LessThan,
      OperatorName::LessThanOrEqual,
      OperatorName::GreaterThan,
      OperatorName::GreaterThanOrEqual,
      OperatorName::In,
      OperatorName::Instanceof,
    ],
    Associativity::Left,
  ),
  (
    &[
      OperatorName::BitwiseLeftShift,
      OperatorName::BitwiseRightShift,
      OperatorName::BitwiseUnsignedRightShift,
    ],
    Associativity::Left,
  ),
  (&[OperatorName::Addition, OperatorName::Subtraction], Associativity::Left),
  (
    &[
      OperatorName::Multiplication,
      OperatorName::Division,
      OperatorName::Remainder,
    ],
    Associativity::Left,
  ),
  (&[OperatorName::Exponentiation], Associativity::Right),
  (
    &[
      OperatorName::LogicalNot,
      OperatorName::BitwiseNot,
      OperatorName::UnaryPlus,
      OperatorName::UnaryNegation,
      OperatorName::PrefixIncrement,
      OperatorName::PrefixDecrement,
      OperatorName::Typeof,
      OperatorName::Void,
      OperatorName::Delete,
      OperatorName::Await,
    ],
    Associativity::Right,
  ),
  (
    &[OperatorName::PostfixIncrement, OperatorName::PostfixDecrement],
    Associativity::Left,
  ),
  (&[OperatorName::New], Associativity::Right),
  (
    &[
      OperatorName::MemberAccess,
      OperatorName::ComputedMemberAccess,
      OperatorName::Call,
      OperatorName::OptionalChainingMemberAccess,
      OperatorName::OptionalChainingComputedMemberAccess,
      OperatorName::OptionalChainingCall,
    ],
    Associativity::Left,
  ),
];

pub static OPERATORS: Lazy<HashMap<OperatorName, Operator>> = Lazy::new(|| {
  let mut map = HashMap::<OperatorName, Operator>::new();
  for (i, (names, associativity)) in PRECEDENCE_LEVELS.iter().enumerate() {
    for &name in names.iter() {
      map.insert(name, Operator {
        name,
        // Level 0 is reserved as a "lower than everything" sentinel.
        precedence: i as u8 + 1,
        associativity: *associativity,
      });
    }
  }
  map
});

/// Precedence of a primary expression (identifier, literal, grouping), tighter than any operator.
pub const PRIMARY_PRECEDENCE: u8 = PRECEDENCE_LEVELS.len() as u8 + 1;

#[cfg(test)]
mod tests {
  use super::OperatorName;
  use super::OPERATORS;

  #[test]
  fn precedence_ordering() {
    let prec = |name| OPERATORS[&name].precedence;
    assert!(prec(OperatorName::Multiplication) > prec(OperatorName::Addition));
    assert!(prec(OperatorName::Addition) > prec(OperatorName::BitwiseLeftShift));
    assert!(prec(OperatorName::LogicalAnd) > prec(OperatorName::LogicalOr));
    assert!(prec(OperatorName::Assignment) > prec(OperatorName::Comma));
    assert_eq!(
      prec(OperatorName::Assignment),
      prec(OperatorName::ConditionalAlternate)
    );
  }
}

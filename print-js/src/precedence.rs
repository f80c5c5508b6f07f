use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Syntax;
use syntax_js::operator::Associativity;
use syntax_js::operator::OperatorName;
use syntax_js::operator::OPERATORS;
use syntax_js::operator::PRIMARY_PRECEDENCE;

pub fn op_prec(name: OperatorName) -> u8 {
  OPERATORS[&name].precedence
}

/// Lowest precedence an expression may have to appear in a list, initializer, or argument
/// position without parentheses.
pub fn assignment_prec() -> u8 {
  op_prec(OperatorName::Assignment)
}

/// Precedence of a member access, call, or `new` with arguments.
pub fn member_prec() -> u8 {
  op_prec(OperatorName::MemberAccess)
}

/// Precedence of the node as it will be printed.
pub fn node_prec(node: &Node) -> u8 {
  match node.stx.as_ref() {
    Syntax::BinaryExpr { operator, .. } => op_prec(*operator),
    Syntax::CondExpr { .. } => op_prec(OperatorName::Conditional),
    Syntax::ArrowFunc { .. } => assignment_prec(),
    Syntax::YieldExpr { .. } => op_prec(OperatorName::Yield),
    Syntax::UnaryExpr { .. } | Syntax::AwaitExpr { .. } => op_prec(OperatorName::LogicalNot),
    Syntax::UnaryPostfixExpr { .. } => op_prec(OperatorName::PostfixIncrement),
    // Negative numbers are printed with a leading minus.
    Syntax::LitNum { value } if value.is_sign_negative() && !value.is_nan() => {
      op_prec(OperatorName::UnaryNegation)
    }
    Syntax::NewExpr { .. }
    | Syntax::CallExpr { .. }
    | Syntax::MemberExpr { .. }
    | Syntax::ComputedMemberExpr { .. }
    | Syntax::TaggedTemplate { .. }
    | Syntax::ImportCall { .. } => member_prec(),
    _ => PRIMARY_PRECEDENCE,
  }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Side {
  Left,
  Right,
}

pub fn child_min_prec_for_binary(op: OperatorName, side: Side) -> u8 {
  let operator = &OPERATORS[&op];
  let prec = operator.precedence;
  let min = match (operator.associativity, side) {
    (Associativity::Left, Side::Left) | (Associativity::Right, Side::Right) => prec,
    _ => prec + 1,
  };
  if op == OperatorName::Exponentiation && side == Side::Left {
    // `-a ** b` is a syntax error, so unary operands need parentheses.
    return min.max(op_prec(OperatorName::PostfixIncrement));
  }
  if op.is_assignment() && side == Side::Left {
    return member_prec();
  }
  min
}

fn is_short_circuit(op: OperatorName) -> bool {
  matches!(op, OperatorName::LogicalAnd | OperatorName::LogicalOr)
}

/// `??` can't be combined with `||` or `&&` without explicit parentheses.
pub fn mixes_nullish(parent: OperatorName, child: &Node) -> bool {
  let Syntax::BinaryExpr { operator, .. } = child.stx.as_ref() else {
    return false;
  };
  (parent == OperatorName::NullishCoalescing && is_short_circuit(*operator))
    || (is_short_circuit(parent) && *operator == OperatorName::NullishCoalescing)
}

#[cfg(test)]
mod tests {
  use super::child_min_prec_for_binary;
  use super::op_prec;
  use super::Side;
  use syntax_js::operator::OperatorName;

  #[test]
  fn left_associative_right_operand_is_tighter() {
    let p = op_prec(OperatorName::Subtraction);
    assert_eq!(child_min_prec_for_binary(OperatorName::Subtraction, Side::Left), p);
    assert_eq!(
      child_min_prec_for_binary(OperatorName::Subtraction, Side::Right),
      p + 1
    );
  }

  #[test]
  fn exponentiation_rejects_unary_left_operand() {
    assert!(
      child_min_prec_for_binary(OperatorName::Exponentiation, Side::Left)
        > op_prec(OperatorName::UnaryNegation)
    );
  }
}

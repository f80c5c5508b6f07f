//! Constant folding of unary and binary expressions over literal operands.
//!
//! Operators are applied through `sandbox_js::ops`, the same code the interpreter runs, so a
//! folded result is exactly what the expression would have produced at runtime.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::literal::bool_node;
use crate::literal::number_node;
use crate::literal::string_node;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use sandbox_js::ops;
use sandbox_js::value::Object;
use sandbox_js::value::ObjectKind;
use sandbox_js::ObjRef;
use sandbox_js::Value;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use syntax_js::operator::OperatorName;
use tracing::debug;

fn is_foldable_unary(op: OperatorName) -> bool {
  matches!(
    op,
    OperatorName::UnaryNegation
      | OperatorName::UnaryPlus
      | OperatorName::LogicalNot
      | OperatorName::BitwiseNot
      | OperatorName::Typeof
      | OperatorName::Void
  )
}

fn is_foldable_binary(op: OperatorName) -> bool {
  matches!(
    op,
    OperatorName::Equality
      | OperatorName::Inequality
      | OperatorName::StrictEquality
      | OperatorName::StrictInequality
      | OperatorName::LessThan
      | OperatorName::LessThanOrEqual
      | OperatorName::GreaterThan
      | OperatorName::GreaterThanOrEqual
      | OperatorName::BitwiseLeftShift
      | OperatorName::BitwiseRightShift
      | OperatorName::BitwiseUnsignedRightShift
      | OperatorName::Addition
      | OperatorName::Subtraction
      | OperatorName::Multiplication
      | OperatorName::Division
      | OperatorName::Remainder
      | OperatorName::Exponentiation
      | OperatorName::BitwiseAnd
      | OperatorName::BitwiseOr
      | OperatorName::BitwiseXor
  )
}

/// The value of an operand whose value is known without running anything.
fn resolve(node: &Node) -> Option<Value> {
  Some(match node.stx.as_ref() {
    Syntax::LitStr { value } => Value::string(value),
    Syntax::LitNum { value } => Value::Number(*value),
    Syntax::LitBool { value } => Value::Bool(*value),
    Syntax::LitNull {} => Value::Null,
    Syntax::IdExpr { name } if name == "undefined" => Value::Undefined,
    Syntax::UnaryExpr {
      operator: OperatorName::UnaryNegation,
      argument,
    } => match argument.stx.as_ref() {
      Syntax::LitNum { value } => Value::Number(-value),
      _ => return None,
    },
    Syntax::LitArr { elements } if elements.is_empty() => Value::Object(ObjRef::new(
      Object::new(None, ObjectKind::Array(Vec::new())),
    )),
    Syntax::LitObj { props } if props.is_empty() => {
      Value::Object(ObjRef::new(Object::new(None, ObjectKind::Plain)))
    }
    _ => return None,
  })
}

/// The literal for a folded result. Results with no literal form (`undefined`, `NaN`,
/// infinities, strings with lone surrogates) aren't folded.
fn literal_of(value: &Value) -> Option<Node> {
  match value {
    Value::String(s) => s.to_utf8().map(string_node),
    Value::Number(n) => number_node(*n),
    Value::Bool(b) => Some(bool_node(*b)),
    _ => None,
  }
}

/// Folds `node` if it's a foldable operator over resolvable operands.
pub fn fold(node: &Node) -> Option<Node> {
  match node.stx.as_ref() {
    Syntax::UnaryExpr { operator, argument } => {
      if !is_foldable_unary(*operator) {
        return None;
      }
      // Keeps negative literals as written.
      if *operator == OperatorName::UnaryNegation
        && matches!(argument.stx.as_ref(), Syntax::LitNum { .. })
      {
        return None;
      }
      literal_of(&ops::unary(*operator, &resolve(argument)?)?)
    }
    Syntax::BinaryExpr {
      operator,
      left,
      right,
    } => {
      if !is_foldable_binary(*operator) {
        return None;
      }
      let result = ops::binary(*operator, &resolve(left)?, &resolve(right)?)?;
      literal_of(&result)
    }
    _ => None,
  }
}

/// Rewrites `a - (-b)` to `a + b` for a numeric literal `b`, in place.
fn double_negation(node: &mut Node) -> bool {
  let Syntax::BinaryExpr {
    operator,
    right,
    ..
  } = node.stx.as_mut()
  else {
    return false;
  };
  if *operator != OperatorName::Subtraction {
    return false;
  }
  let Syntax::UnaryExpr {
    operator: OperatorName::UnaryNegation,
    argument,
  } = right.stx.as_mut()
  else {
    return false;
  };
  if !matches!(argument.stx.as_ref(), Syntax::LitNum { .. }) {
    return false;
  }
  let argument = std::mem::replace(argument, Node::synthetic(Syntax::EmptyStmt {}));
  *right = argument;
  *operator = OperatorName::Addition;
  true
}

#[derive(Default)]
struct Fold {
  replaced: usize,
}

impl Rewrite for Fold {
  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if double_negation(node) {
      self.replaced += 1;
    }
    Ok(fold(node).map(|folded| {
      self.replaced += 1;
      Replacement::One(folded)
    }))
  }
}

pub struct SimplifyPass;

impl Pass for SimplifyPass {
  fn name(&self) -> &'static str {
    "simplify"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut total = 0;
    loop {
      let mut folder = Fold::default();
      rewrite(program, &mut folder)?;
      if folder.replaced == 0 {
        break;
      }
      total += folder.replaced;
    }
    debug!(folded = total, "simplified expressions");
    Ok(total > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::fold;
  use print_js::print;
  use print_js::PrintOptions;
  use syntax_js::parse_expression;

  fn folded(src: &str) -> Option<String> {
    let node = parse_expression(src).unwrap();
    fold(&node).map(|n| print(&n, PrintOptions { pretty: false }))
  }

  #[test]
  fn folds_with_language_coercions() {
    assert_eq!(folded(r#""5" - 1"#).as_deref(), Some("4"));
    assert_eq!(folded(r#""5" + 1"#).as_deref(), Some(r#""51""#));
    assert_eq!(folded("1 << 33").as_deref(), Some("2"));
    assert_eq!(folded("1 - 5").as_deref(), Some("-4"));
    assert_eq!(folded("null == undefined").as_deref(), Some("true"));
    assert_eq!(folded("null === undefined").as_deref(), Some("false"));
    assert_eq!(folded("[] + {}").as_deref(), Some(r#""[object Object]""#));
    assert_eq!(folded("![]").as_deref(), Some("false"));
    assert_eq!(folded("typeof undefined").as_deref(), Some(r#""undefined""#));
    assert_eq!(folded("~-1").as_deref(), Some("0"));
    assert_eq!(folded("-1 >>> 0").as_deref(), Some("4294967295"));
    assert_eq!(folded(r#""b" < "a""#).as_deref(), Some("false"));
  }

  #[test]
  fn leaves_unfoldable_expressions() {
    assert_eq!(folded("-5"), None);
    assert_eq!(folded("a + 1"), None);
    assert_eq!(folded("1 / 0"), None);
    assert_eq!(folded("void 0"), None);
    assert_eq!(folded("0 / 0"), None);
    assert_eq!(folded("1 && 2"), None);
    assert_eq!(folded("[1] + 1"), None);
  }
}

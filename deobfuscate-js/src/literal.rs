//! Building literal nodes from computed values.

use crate::eval::SandboxValue;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use syntax_js::operator::OperatorName;

pub fn string_node(value: impl Into<String>) -> Node {
  Node::synthetic(Syntax::LitStr {
    value: value.into(),
  })
}

pub fn bool_node(value: bool) -> Node {
  Node::synthetic(Syntax::LitBool { value })
}

/// A numeric literal, or a negation of one for negative values and `-0`. Non-finite numbers
/// have no literal form and yield `None`.
pub fn number_node(value: f64) -> Option<Node> {
  if !value.is_finite() {
    return None;
  }
  let lit = Node::synthetic(Syntax::LitNum { value: value.abs() });
  Some(if value.is_sign_negative() {
    Node::synthetic(Syntax::UnaryExpr {
      operator: OperatorName::UnaryNegation,
      argument: lit,
    })
  } else {
    lit
  })
}

/// The literal for a string, number, boolean or null, or an array literal of such values.
pub fn value_node(value: &SandboxValue) -> Option<Node> {
  Some(match value {
    SandboxValue::String(s) => string_node(s.as_str()),
    SandboxValue::Number(n) => return number_node(*n),
    SandboxValue::Bool(b) => bool_node(*b),
    SandboxValue::Null => Node::synthetic(Syntax::LitNull {}),
    SandboxValue::Array(elems) => Node::synthetic(Syntax::LitArr {
      elements: elems.iter().map(value_node).collect::<Option<Vec<_>>>()?,
    }),
    SandboxValue::Undefined | SandboxValue::Opaque => return None,
  })
}

/// The numeric value of a literal or of a negated numeric literal.
pub fn numeric_value(node: &Node) -> Option<f64> {
  match node.stx.as_ref() {
    Syntax::LitNum { value } => Some(*value),
    Syntax::UnaryExpr {
      operator: OperatorName::UnaryNegation,
      argument,
    } => match argument.stx.as_ref() {
      Syntax::LitNum { value } => Some(-value),
      _ => None,
    },
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use print_js::print;
  use print_js::PrintOptions;

  fn show(node: &Node) -> String {
    print(node, PrintOptions { pretty: false })
  }

  #[test]
  fn numbers() {
    assert_eq!(show(&number_node(1.5).unwrap()), "1.5");
    assert_eq!(show(&number_node(-3.0).unwrap()), "-3");
    assert_eq!(show(&number_node(-0.0).unwrap()), "-0");
    assert!(number_node(f64::NAN).is_none());
    assert!(number_node(f64::NEG_INFINITY).is_none());
    assert_eq!(numeric_value(&number_node(-7.0).unwrap()), Some(-7.0));
  }

  #[test]
  fn nested_arrays() {
    let value = SandboxValue::Array(vec![
      SandboxValue::String("a".into()),
      SandboxValue::Array(vec![SandboxValue::Null, SandboxValue::Bool(false)]),
      SandboxValue::Number(-1.0),
    ]);
    assert_eq!(show(&value_node(&value).unwrap()), "[\"a\",[null,false],-1]");
    let with_undefined = SandboxValue::Array(vec![SandboxValue::Undefined]);
    assert!(value_node(&with_undefined).is_none());
  }
}

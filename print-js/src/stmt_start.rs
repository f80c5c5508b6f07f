//! Detection of expressions whose leftmost token would be misread in the position they're
//! printed in, such as `{` or `function` at the start of an expression statement.

use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Syntax;
use syntax_js::operator::OperatorName;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum StartContext {
  /// Start of an expression statement.
  Statement,
  /// Concise arrow function body.
  ArrowBody,
  /// Operand of `export default`.
  ExportDefault,
  /// Expression initializer of a `for` head, or the left side of `for-in`/`for-of`.
  ForHead,
}

/// The node whose first token is the first token of `node` when printed without extra
/// parentheses.
fn leftmost(mut node: &Node) -> &Node {
  loop {
    node = match node.stx.as_ref() {
      Syntax::BinaryExpr { left, .. } => left,
      Syntax::CondExpr { test, .. } => test,
      Syntax::CallExpr { callee, .. } => callee,
      Syntax::MemberExpr { object, .. } | Syntax::ComputedMemberExpr { object, .. } => object,
      Syntax::UnaryPostfixExpr { argument, .. } => argument,
      Syntax::TaggedTemplate { tag, .. } => tag,
      _ => return node,
    };
  }
}

pub fn needs_parens(node: &Node, ctx: StartContext) -> bool {
  let first = leftmost(node);
  match (ctx, first.stx.as_ref()) {
    (StartContext::Statement, Syntax::LitObj { .. } | Syntax::ObjPat { .. }) => true,
    (
      StartContext::Statement | StartContext::ExportDefault,
      Syntax::FuncExpr { .. } | Syntax::ClassExpr { .. },
    ) => true,
    (StartContext::ForHead, Syntax::IdExpr { name }) => name == "let" || name == "async",
    (StartContext::Statement, Syntax::IdExpr { name }) => name == "let",
    (StartContext::ArrowBody, Syntax::LitObj { .. }) => true,
    // A string expression statement at the start of a body would become a directive.
    (StartContext::Statement, Syntax::LitStr { .. }) => std::ptr::eq(first, node),
    _ => false,
  }
}

/// Whether an `in` operator appears outside of any nested function, which would end a `for`
/// initializer early.
pub fn contains_in(node: &Node) -> bool {
  if let Syntax::BinaryExpr {
    operator: OperatorName::In,
    ..
  } = node.stx.as_ref()
  {
    return true;
  }
  if node.stx.is_function() || matches!(node.stx.as_ref(), Syntax::ClassExpr { .. }) {
    return false;
  }
  node.children().into_iter().any(contains_in)
}

/// Whether a statement ends with an `if` lacking an `else`, which would capture a following
/// `else` if used as the consequent of another `if`.
pub fn ends_with_open_if(stmt: &Node) -> bool {
  match stmt.stx.as_ref() {
    Syntax::IfStmt {
      alternate: None, ..
    } => true,
    Syntax::IfStmt {
      alternate: Some(alt),
      ..
    } => ends_with_open_if(alt),
    Syntax::LabelStmt { body, .. }
    | Syntax::WhileStmt { body, .. }
    | Syntax::ForStmt { body, .. }
    | Syntax::ForInStmt { body, .. }
    | Syntax::ForOfStmt { body, .. }
    | Syntax::WithStmt { body, .. } => ends_with_open_if(body),
    _ => false,
  }
}

#[cfg(test)]
mod tests {
  use super::needs_parens;
  use super::StartContext;
  use syntax_js::parse_expression;

  #[test]
  fn object_literal_hazards() {
    let obj = parse_expression("({a: 1}).a").unwrap();
    assert!(needs_parens(&obj, StartContext::Statement));
    assert!(!needs_parens(&obj, StartContext::ExportDefault));
  }

  #[test]
  fn function_call_hazard() {
    let call = parse_expression("(function () {})()").unwrap();
    assert!(needs_parens(&call, StartContext::Statement));
    let arrow = parse_expression("(() => {})()").unwrap();
    assert!(!needs_parens(&arrow, StartContext::Statement));
  }
}

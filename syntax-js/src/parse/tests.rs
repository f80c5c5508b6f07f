use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::PropKind;
use crate::ast::syntax::Syntax;
use crate::ast::syntax::VarDeclKind;
use crate::error::SyntaxErrorType;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::operator::OperatorName;
use crate::parse;
use crate::parse_expression;
use crate::token::TT;
use crate::ParseOptions;

fn body(src: &str) -> Vec<Node> {
  let program = parse(src, ParseOptions::default()).unwrap();
  match *program.stx {
    Syntax::Program { body, .. } => body,
    _ => unreachable!(),
  }
}

fn expr(src: &str) -> Node {
  parse_expression(src).unwrap()
}

#[test]
fn test_parser_buffer() {
  let lexer = Lexer::new("let x = /a/ / 1;");
  let mut p = Parser::new(lexer);
  let cp = p.checkpoint();
  assert_eq!(p.next_tok_i, 0);

  let t = p.peek();
  assert_eq!(p.next_tok_i, 0);
  assert_eq!(p.buf.len(), 1);
  assert_eq!(t.typ, TT::KeywordLet);

  let t = p.consume();
  assert_eq!(p.next_tok_i, 1);
  assert_eq!(t.typ, TT::KeywordLet);
  let t = p.consume();
  assert_eq!(p.next_tok_i, 2);
  assert_eq!(t.typ, TT::Identifier);

  p.restore_checkpoint(cp);
  assert_eq!(p.buf.len(), 2);

  // Peeking using a different mode truncates the buffer.
  let t = p.peek_with_mode(LexMode::SlashIsRegex);
  assert_eq!(p.buf.len(), 1);
  assert_eq!(t.typ, TT::KeywordLet);
}

#[test]
fn test_precedence() {
  let e = expr("1 + 2 * 3");
  let Syntax::BinaryExpr { operator, right, .. } = e.stx.as_ref() else {
    panic!("expected binary expression");
  };
  assert_eq!(*operator, OperatorName::Addition);
  assert!(matches!(right.stx.as_ref(), Syntax::BinaryExpr {
    operator: OperatorName::Multiplication,
    ..
  }));
}

#[test]
fn test_conditional_alternate_takes_assignment() {
  let e = expr("a ? b : c = d");
  let Syntax::CondExpr { alternate, .. } = e.stx.as_ref() else {
    panic!("expected conditional");
  };
  assert!(matches!(alternate.stx.as_ref(), Syntax::BinaryExpr {
    operator: OperatorName::Assignment,
    ..
  }));
}

#[test]
fn test_regex_and_division() {
  let e = expr("/a/g.test(x) / 2");
  let Syntax::BinaryExpr { operator, left, .. } = e.stx.as_ref() else {
    panic!("expected binary expression");
  };
  assert_eq!(*operator, OperatorName::Division);
  let Syntax::CallExpr { callee, .. } = left.stx.as_ref() else {
    panic!("expected call");
  };
  let Syntax::MemberExpr { object, .. } = callee.stx.as_ref() else {
    panic!("expected member");
  };
  assert!(matches!(object.stx.as_ref(), Syntax::LitRegex { pattern, flags } if pattern == "a" && flags == "g"));
}

#[test]
fn test_asi() {
  let stmts = body("var a = 1\nvar b = 2\na\n++b\nreturn_\n(c)");
  assert_eq!(stmts.len(), 5);
  // `a` then `++b`, since a postfix operator can't follow a line break.
  assert!(matches!(stmts[3].stx.as_ref(), Syntax::ExprStmt { expr } if matches!(expr.stx.as_ref(), Syntax::UnaryExpr { .. })));
  // A call continues across lines.
  assert!(matches!(stmts[4].stx.as_ref(), Syntax::ExprStmt { expr } if matches!(expr.stx.as_ref(), Syntax::CallExpr { .. })));
}

#[test]
fn test_strings_are_cooked() {
  let e = expr(r#""\x68i\n""#);
  assert!(matches!(e.stx.as_ref(), Syntax::LitStr { value } if value == "hi\n"));
}

#[test]
fn test_numbers() {
  for (src, value) in [("0x1F", 31.0), ("1e3", 1000.0), ("017", 15.0), ("1_000", 1000.0), (".5", 0.5)] {
    assert!(matches!(expr(src).stx.as_ref(), Syntax::LitNum { value: v } if *v == value), "{}", src);
  }
}

#[test]
fn test_template() {
  let e = expr("`a${b}c${d + 1}`");
  let Syntax::LitTemplate { quasis, exprs } = e.stx.as_ref() else {
    panic!("expected template");
  };
  assert_eq!(quasis, &vec!["a".to_string(), "c".to_string(), "".to_string()]);
  assert_eq!(exprs.len(), 2);
}

#[test]
fn test_arrow_or_grouping() {
  assert!(matches!(expr("(a, b) => a + b").stx.as_ref(), Syntax::ArrowFunc { func } if func.params.len() == 2 && func.has_expression_body()));
  assert!(matches!(expr("(a, b)").stx.as_ref(), Syntax::BinaryExpr { operator: OperatorName::Comma, .. }));
  assert!(matches!(expr("async x => x").stx.as_ref(), Syntax::ArrowFunc { func } if func.is_async));
  assert!(matches!(expr("async(x)").stx.as_ref(), Syntax::CallExpr { .. }));
}

#[test]
fn test_destructuring_assignment_keeps_references() {
  let e = expr("[a, , b = 1, ...c] = d");
  let Syntax::BinaryExpr { left, .. } = e.stx.as_ref() else {
    panic!("expected assignment");
  };
  let Syntax::ArrPat { elements } = left.stx.as_ref() else {
    panic!("expected array pattern");
  };
  assert_eq!(elements.len(), 4);
  assert!(matches!(elements[0].stx.as_ref(), Syntax::IdExpr { .. }));
  assert!(matches!(elements[1].stx.as_ref(), Syntax::ArrHole {}));
  assert!(matches!(elements[2].stx.as_ref(), Syntax::AssignPat { .. }));
  assert!(matches!(elements[3].stx.as_ref(), Syntax::RestPat { .. }));
}

#[test]
fn test_declarations() {
  let stmts = body("const {a, b: [c]} = x, d = 2; function f(g, ...h) { 'use strict'; return g }");
  let Syntax::VarDecl { kind, declarators } = stmts[0].stx.as_ref() else {
    panic!("expected declaration");
  };
  assert_eq!(*kind, VarDeclKind::Const);
  assert_eq!(declarators.len(), 2);
  let Syntax::FuncDecl { func } = stmts[1].stx.as_ref() else {
    panic!("expected function");
  };
  assert_eq!(func.directives, vec!["use strict".to_string()]);
  assert!(matches!(func.params[1].stx.as_ref(), Syntax::RestPat { .. }));
}

#[test]
fn test_object_literal() {
  let e = expr("({a, 'b': 1, [c]: 2, get d() { return 1 }, e() {}, ...f})");
  let Syntax::LitObj { props } = e.stx.as_ref() else {
    panic!("expected object");
  };
  let kinds: Vec<_> = props
    .iter()
    .filter_map(|p| match p.stx.as_ref() {
      Syntax::ObjProp { kind, .. } => Some(*kind),
      _ => None,
    })
    .collect();
  assert_eq!(kinds, vec![
    PropKind::Shorthand,
    PropKind::Init,
    PropKind::Init,
    PropKind::Getter,
    PropKind::Method
  ]);
  assert!(matches!(props[5].stx.as_ref(), Syntax::SpreadElement { .. }));
}

#[test]
fn test_new_expression() {
  let e = expr("new a.b(1).c");
  let Syntax::MemberExpr { object, prop, .. } = e.stx.as_ref() else {
    panic!("expected member");
  };
  assert_eq!(prop, "c");
  assert!(matches!(object.stx.as_ref(), Syntax::NewExpr { arguments, .. } if arguments.len() == 1));
}

#[test]
fn test_statements() {
  let stmts = body(
    "for (var i = 0; i < 1; i++) {} for (k in o); for (const v of w) {} \
     switch (x) { case 1: y(); break; default: } \
     try { a() } catch (e) {} finally {} \
     l: while (true) { continue l } do x--; while (x) if (a) b; else c",
  );
  assert!(matches!(stmts[0].stx.as_ref(), Syntax::ForStmt { .. }));
  assert!(matches!(stmts[1].stx.as_ref(), Syntax::ForInStmt { .. }));
  assert!(matches!(stmts[2].stx.as_ref(), Syntax::ForOfStmt { .. }));
  assert!(matches!(stmts[3].stx.as_ref(), Syntax::SwitchStmt { cases, .. } if cases.len() == 2));
  assert!(matches!(stmts[4].stx.as_ref(), Syntax::TryStmt { handler: Some(_), finalizer: Some(_), .. }));
  assert!(matches!(stmts[5].stx.as_ref(), Syntax::LabelStmt { .. }));
  assert!(matches!(stmts[6].stx.as_ref(), Syntax::DoWhileStmt { .. }));
  assert!(matches!(stmts[7].stx.as_ref(), Syntax::IfStmt { alternate: Some(_), .. }));
}

#[test]
fn test_class() {
  let stmts = body("class A extends B { static x = 1; #y; constructor() { super() } get z() { return 1 } }");
  let Syntax::ClassDecl { class } = stmts[0].stx.as_ref() else {
    panic!("expected class");
  };
  assert!(class.extends.is_some());
  assert_eq!(class.members.len(), 4);
}

#[test]
fn test_module() {
  let program = parse(
    "import a, { b as c } from 'm'; export const d = 1; export default a; export * from 'n';",
    ParseOptions { is_module: true },
  )
  .unwrap();
  let Syntax::Program { body, is_module, .. } = program.stx.as_ref() else {
    unreachable!();
  };
  assert!(is_module);
  assert_eq!(body.len(), 4);
}

#[test]
fn test_errors() {
  assert!(parse("var = 1", ParseOptions::default()).is_err());
  assert!(parse("a +", ParseOptions::default()).is_err());
  assert!(parse("try {}", ParseOptions::default()).is_err());
  assert!(parse("1 = 2", ParseOptions::default()).is_err());
  assert!(parse_expression("a b").is_err());
}

#[test]
fn test_unary_base_of_exponentiation() {
  let err = parse_expression("-2 ** 2").unwrap_err();
  assert_eq!(err.typ, SyntaxErrorType::UnaryBaseOfExponentiation);
  assert!(parse_expression("a * typeof b ** 2").is_err());
  assert!(parse_expression("(-2) ** 2").is_ok());
  assert!(parse_expression("++a ** 2").is_ok());
  assert!(parse_expression("2 ** -2").is_ok());
  let e = expr("-(2 ** 2)");
  assert!(matches!(e.stx.as_ref(), Syntax::UnaryExpr {
    operator: OperatorName::UnaryNegation,
    ..
  }));
}

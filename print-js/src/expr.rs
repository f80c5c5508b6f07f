use crate::escape::quote_string;
use crate::precedence::assignment_prec;
use crate::precedence::child_min_prec_for_binary;
use crate::precedence::member_prec;
use crate::precedence::mixes_nullish;
use crate::precedence::node_prec;
use crate::precedence::op_prec;
use crate::precedence::Side;
use crate::stmt_start::needs_parens;
use crate::stmt_start::StartContext;
use crate::Printer;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Class;
use syntax_js::ast::syntax::ClassMemberKind;
use syntax_js::ast::syntax::Func;
use syntax_js::ast::syntax::PropKind;
use syntax_js::ast::syntax::Syntax;
use syntax_js::char::is_identifier_name;
use syntax_js::num::number_to_string;
use syntax_js::operator::OperatorName;

/// Whether a `new` callee would lose its arguments to an inner call if printed bare, e.g.
/// `new (a().b)()`.
fn new_callee_needs_parens(callee: &Node) -> bool {
  match callee.stx.as_ref() {
    Syntax::CallExpr { .. } | Syntax::ImportCall { .. } => true,
    Syntax::MemberExpr {
      object, optional, ..
    }
    | Syntax::ComputedMemberExpr {
      object, optional, ..
    } => *optional || new_callee_needs_parens(object),
    Syntax::TaggedTemplate { tag, .. } => new_callee_needs_parens(tag),
    _ => false,
  }
}

fn is_word_operator(op: OperatorName) -> bool {
  matches!(
    op,
    OperatorName::Typeof | OperatorName::Void | OperatorName::Delete
  )
}

impl Printer {
  pub(crate) fn print_expr(&mut self, node: &Node, min_prec: u8) {
    if node_prec(node) < min_prec {
      self.print_parenthesized(node);
    } else {
      self.print_expr_inner(node);
    }
  }

  /// Prints an expression in a position where its first token is constrained.
  pub(crate) fn print_expr_at_start(&mut self, node: &Node, ctx: StartContext, min_prec: u8) {
    if needs_parens(node, ctx) {
      self.print_parenthesized(node);
    } else {
      self.print_expr(node, min_prec);
    }
  }

  fn print_parenthesized(&mut self, node: &Node) {
    self.out.write_punct("(");
    self.print_expr_inner(node);
    self.out.write_punct(")");
  }

  fn print_binary_operand(&mut self, op: OperatorName, node: &Node, side: Side) {
    if mixes_nullish(op, node) {
      self.print_parenthesized(node);
    } else {
      self.print_expr(node, child_min_prec_for_binary(op, side));
    }
  }

  pub(crate) fn print_args(&mut self, args: &[Node]) {
    self.out.write_punct("(");
    for (i, arg) in args.iter().enumerate() {
      if i > 0 {
        self.out.comma();
      }
      self.print_expr(arg, assignment_prec());
    }
    self.out.write_punct(")");
  }

  fn print_array_like(&mut self, elements: &[Node]) {
    self.out.write_punct("[");
    for (i, elem) in elements.iter().enumerate() {
      if i > 0 {
        self.out.comma();
      }
      self.print_expr(elem, assignment_prec());
    }
    // A trailing elision needs its own comma, as a single trailing comma is ignored.
    if elements
      .last()
      .is_some_and(|e| matches!(e.stx.as_ref(), Syntax::ArrHole {}))
    {
      self.out.write_punct(",");
    }
    self.out.write_punct("]");
  }

  fn print_template(&mut self, quasis: &[String], exprs: &[Node]) {
    self.out.write_delimited("`");
    for (i, quasi) in quasis.iter().enumerate() {
      self.out.write_delimited(quasi);
      if let Some(expr) = exprs.get(i) {
        self.out.write_delimited("${");
        self.print_expr(expr, 1);
        self.out.write_delimited("}");
      }
    }
    self.out.write_delimited("`");
  }

  fn print_number(&mut self, value: f64) {
    if value.is_sign_negative() && !value.is_nan() {
      self.out.write_punct("-");
      self.out.write_token(&number_to_string(-value));
    } else {
      self.out.write_token(&number_to_string(value));
    }
  }

  /// Prints a name that must be a single identifier-like token, quoting it otherwise.
  pub(crate) fn print_name_or_string(&mut self, name: &str) {
    if is_identifier_name(name) {
      self.out.write_identifier(name);
    } else {
      self.out.write_delimited(&quote_string(name));
    }
  }

  pub(crate) fn print_prop_key(&mut self, key: &Node, computed: bool) {
    if computed {
      self.out.write_punct("[");
      self.print_expr(key, assignment_prec());
      self.out.write_punct("]");
      return;
    }
    match key.stx.as_ref() {
      Syntax::PropKey { name } if name.starts_with('#') => self.out.write_identifier(name),
      Syntax::PropKey { name } => self.print_name_or_string(name),
      Syntax::LitStr { value } => self.out.write_delimited(&quote_string(value)),
      Syntax::LitNum { value } if *value >= 0.0 => self.print_number(*value),
      Syntax::LitBigInt { raw } => self.out.write_token(&format!("{raw}n")),
      // Any other key can only be expressed as a computed key.
      _ => {
        self.out.write_punct("[");
        self.print_expr(key, assignment_prec());
        self.out.write_punct("]");
      }
    }
  }

  pub(crate) fn print_params(&mut self, params: &[Node]) {
    self.print_args(params);
  }

  pub(crate) fn print_func(&mut self, func: &Func) {
    if func.is_async {
      self.out.write_keyword("async");
    }
    self.out.write_keyword("function");
    if func.is_generator {
      self.out.write_punct("*");
    }
    if let Some(name) = &func.name {
      if func.is_generator {
        self.out.space();
      }
      self.print_expr_inner(name);
    }
    self.print_params(&func.params);
    self.out.space();
    self.print_func_body(func);
  }

  fn print_arrow(&mut self, func: &Func) {
    if func.is_async {
      self.out.write_keyword("async");
      self.out.space();
    }
    self.print_params(&func.params);
    self.out.space();
    self.out.write_punct("=>");
    self.out.space();
    if func.has_expression_body() {
      self.print_expr_at_start(&func.body, StartContext::ArrowBody, assignment_prec());
    } else {
      self.print_func_body(func);
    }
  }

  /// Prints a method of an object literal or class, whose value is a `FuncExpr`.
  fn print_method(&mut self, accessor: Option<&str>, key: &Node, computed: bool, value: &Node) {
    let Some(func) = value.stx.func() else {
      self.print_prop_key(key, computed);
      self.out.write_punct(":");
      self.out.space();
      self.print_expr(value, assignment_prec());
      return;
    };
    if func.is_async {
      self.out.write_keyword("async");
      self.out.space();
    }
    if func.is_generator {
      self.out.write_punct("*");
    }
    if let Some(accessor) = accessor {
      self.out.write_keyword(accessor);
      self.out.space();
    }
    self.print_prop_key(key, computed);
    self.print_params(&func.params);
    self.out.space();
    self.print_func_body(func);
  }

  fn print_obj_prop(&mut self, prop: &Node) {
    match prop.stx.as_ref() {
      Syntax::ObjProp {
        key,
        value,
        computed,
        kind,
      } => match kind {
        PropKind::Method => self.print_method(None, key, *computed, value),
        PropKind::Getter => self.print_method(Some("get"), key, *computed, value),
        PropKind::Setter => self.print_method(Some("set"), key, *computed, value),
        PropKind::Init | PropKind::Shorthand => {
          let key_name = match key.stx.as_ref() {
            Syntax::PropKey { name } if !*computed => Some(name.as_str()),
            _ => None,
          };
          if *kind == PropKind::Shorthand && key_name.is_some() {
            match value.stx.as_ref() {
              Syntax::IdExpr { name } if Some(name.as_str()) == key_name => {
                self.out.write_identifier(name);
                return;
              }
              Syntax::BinaryExpr {
                operator: OperatorName::Assignment,
                left,
                right,
              } if left.stx.ident_name() == key_name => {
                self.print_expr_inner(left);
                self.out.space();
                self.out.write_punct("=");
                self.out.space();
                self.print_expr(right, assignment_prec());
                return;
              }
              _ => {}
            }
          }
          self.print_prop_key(key, *computed);
          self.out.write_punct(":");
          self.out.space();
          self.print_expr(value, assignment_prec());
        }
      },
      Syntax::SpreadElement { argument } => {
        self.out.write_punct("...");
        self.print_expr(argument, assignment_prec());
      }
      _ => self.print_expr(prop, assignment_prec()),
    }
  }

  fn print_pat_prop(&mut self, prop: &Node) {
    let Syntax::PatProp {
      key,
      target,
      computed,
      ..
    } = prop.stx.as_ref()
    else {
      self.print_expr(prop, assignment_prec());
      return;
    };
    let key_name = match key.stx.as_ref() {
      Syntax::PropKey { name } if !*computed => Some(name.as_str()),
      _ => None,
    };
    if key_name.is_some() {
      if target.stx.ident_name() == key_name {
        self.print_expr_inner(target);
        return;
      }
      if let Syntax::AssignPat {
        target: inner,
        default,
      } = target.stx.as_ref()
      {
        if inner.stx.ident_name() == key_name {
          self.print_expr_inner(inner);
          self.out.space();
          self.out.write_punct("=");
          self.out.space();
          self.print_expr(default, assignment_prec());
          return;
        }
      }
    }
    self.print_prop_key(key, *computed);
    self.out.write_punct(":");
    self.out.space();
    self.print_expr(target, assignment_prec());
  }

  pub(crate) fn print_class(&mut self, class: &Class) {
    self.out.write_keyword("class");
    if let Some(name) = &class.name {
      self.print_expr_inner(name);
    }
    if let Some(extends) = &class.extends {
      self.out.write_keyword("extends");
      self.print_expr(extends, member_prec());
    }
    self.out.space();
    self.out.write_punct("{");
    self.out.indent();
    for member in class.members.iter() {
      self.out.newline();
      self.print_class_member(member);
    }
    self.out.dedent();
    if !class.members.is_empty() {
      self.out.newline();
    }
    self.out.write_punct("}");
  }

  fn print_class_member(&mut self, member: &Node) {
    let Syntax::ClassMember {
      key,
      value,
      computed,
      is_static,
      kind,
    } = member.stx.as_ref()
    else {
      return;
    };
    if *is_static {
      self.out.write_keyword("static");
      self.out.space();
    }
    match (kind, value) {
      (ClassMemberKind::StaticBlock, Some(body)) => self.print_stmt(body),
      (ClassMemberKind::Method, Some(value)) => self.print_method(None, key, *computed, value),
      (ClassMemberKind::Getter, Some(value)) => {
        self.print_method(Some("get"), key, *computed, value)
      }
      (ClassMemberKind::Setter, Some(value)) => {
        self.print_method(Some("set"), key, *computed, value)
      }
      _ => {
        self.print_prop_key(key, *computed);
        if let Some(value) = value {
          self.out.space();
          self.out.write_punct("=");
          self.out.space();
          self.print_expr(value, assignment_prec());
        }
        self.out.write_punct(";");
      }
    }
  }

  pub(crate) fn print_expr_inner(&mut self, node: &Node) {
    match node.stx.as_ref() {
      Syntax::ArrHole {} => {}
      Syntax::ArrowFunc { func } => self.print_arrow(func),
      Syntax::AwaitExpr { argument } => {
        self.out.write_keyword("await");
        self.out.space();
        self.print_expr(argument, op_prec(OperatorName::Await));
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => {
        let op = *operator;
        self.print_binary_operand(op, left, Side::Left);
        if op == OperatorName::Comma {
          self.out.comma();
        } else {
          self.out.space();
          self.out.write_punct(op.syntax());
          self.out.space();
        }
        self.print_binary_operand(op, right, Side::Right);
      }
      Syntax::CallExpr {
        callee,
        arguments,
        optional,
      } => {
        self.print_expr(callee, member_prec());
        if *optional {
          self.out.write_punct("?.");
        }
        self.print_args(arguments);
      }
      Syntax::ClassExpr { class } => self.print_class(class),
      Syntax::ComputedMemberExpr {
        object,
        member,
        optional,
      } => {
        self.print_member_object(object);
        self.out.write_punct(if *optional { "?.[" } else { "[" });
        self.print_expr(member, 1);
        self.out.write_punct("]");
      }
      Syntax::CondExpr {
        test,
        consequent,
        alternate,
      } => {
        self.print_expr(test, op_prec(OperatorName::Conditional) + 1);
        self.out.space();
        self.out.write_punct("?");
        self.out.space();
        self.print_expr(consequent, assignment_prec());
        self.out.space();
        self.out.write_punct(":");
        self.out.space();
        self.print_expr(alternate, assignment_prec());
      }
      Syntax::FuncExpr { func } => self.print_func(func),
      Syntax::IdExpr { name } | Syntax::IdPat { name } | Syntax::PropKey { name } => {
        self.out.write_identifier(name)
      }
      Syntax::ImportCall { argument } => {
        self.out.write_keyword("import");
        self.out.write_punct("(");
        self.print_expr(argument, assignment_prec());
        self.out.write_punct(")");
      }
      Syntax::ImportMeta {} => {
        self.out.write_keyword("import");
        self.out.write_punct(".");
        self.out.write_identifier("meta");
      }
      Syntax::LitArr { elements } | Syntax::ArrPat { elements } => {
        self.print_array_like(elements)
      }
      Syntax::LitBigInt { raw } => self.out.write_token(&format!("{raw}n")),
      Syntax::LitBool { value } => self.out.write_keyword(if *value { "true" } else { "false" }),
      Syntax::LitNull {} => self.out.write_keyword("null"),
      Syntax::LitNum { value } => self.print_number(*value),
      Syntax::LitObj { props } => {
        self.out.write_punct("{");
        if props.is_empty() {
          self.out.write_punct("}");
          return;
        }
        self.out.indent();
        for (i, prop) in props.iter().enumerate() {
          if i > 0 {
            self.out.write_punct(",");
          }
          self.out.newline();
          self.print_obj_prop(prop);
        }
        self.out.dedent();
        self.out.newline();
        self.out.write_punct("}");
      }
      Syntax::LitRegex { pattern, flags } => self.out.write_regex(pattern, flags),
      Syntax::LitStr { value } => self.out.write_delimited(&quote_string(value)),
      Syntax::LitTemplate { quasis, exprs } => self.print_template(quasis, exprs),
      Syntax::MemberExpr {
        object,
        prop,
        optional,
      } => {
        self.print_member_object(object);
        if is_identifier_name(prop) || prop.starts_with('#') {
          self.out.write_punct(if *optional { "?." } else { "." });
          self.out.write_identifier(prop);
        } else {
          self.out.write_punct(if *optional { "?.[" } else { "[" });
          self.out.write_delimited(&quote_string(prop));
          self.out.write_punct("]");
        }
      }
      Syntax::NewExpr { callee, arguments } => {
        self.out.write_keyword("new");
        if new_callee_needs_parens(callee) {
          self.print_parenthesized(callee);
        } else {
          self.print_expr(callee, member_prec());
        }
        self.print_args(arguments);
      }
      Syntax::NewTarget {} => {
        self.out.write_keyword("new");
        self.out.write_punct(".");
        self.out.write_identifier("target");
      }
      Syntax::ObjPat { props } => {
        self.out.write_punct("{");
        for (i, prop) in props.iter().enumerate() {
          if i > 0 {
            self.out.comma();
          }
          self.print_pat_prop(prop);
        }
        self.out.write_punct("}");
      }
      Syntax::AssignPat { target, default } => {
        self.print_expr(target, assignment_prec());
        self.out.space();
        self.out.write_punct("=");
        self.out.space();
        self.print_expr(default, assignment_prec());
      }
      Syntax::RestPat { target } | Syntax::SpreadElement { argument: target } => {
        self.out.write_punct("...");
        self.print_expr(target, assignment_prec());
      }
      Syntax::SuperExpr {} => self.out.write_keyword("super"),
      Syntax::TaggedTemplate { tag, quasis, exprs } => {
        self.print_member_object(tag);
        self.print_template(quasis, exprs);
      }
      Syntax::ThisExpr {} => self.out.write_keyword("this"),
      Syntax::UnaryExpr { operator, argument } => {
        if is_word_operator(*operator) {
          self.out.write_keyword(operator.syntax());
          self.out.space();
        } else {
          self.out.write_punct(operator.syntax());
        }
        self.print_expr(argument, op_prec(*operator));
      }
      Syntax::UnaryPostfixExpr { operator, argument } => {
        self.print_expr(argument, op_prec(OperatorName::New));
        self.out.write_punct(operator.syntax());
      }
      Syntax::YieldExpr { argument, delegate } => {
        self.out.write_keyword("yield");
        if *delegate {
          self.out.write_punct("*");
        }
        if let Some(argument) = argument {
          self.out.space();
          self.print_expr(argument, assignment_prec());
        }
      }
      Syntax::ObjProp { .. } => self.print_obj_prop(node),
      Syntax::PatProp { .. } => self.print_pat_prop(node),
      Syntax::ClassMember { .. } => self.print_class_member(node),
      _ => self.print_stmt(node),
    }
  }

  fn print_member_object(&mut self, object: &Node) {
    if let Syntax::LitNum { .. } = object.stx.as_ref() {
      // `1.toString()` would lex as a malformed number.
      self.print_parenthesized(object);
    } else {
      self.print_expr(object, member_prec());
    }
  }
}

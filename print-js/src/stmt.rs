use crate::escape::quote_string;
use crate::precedence::assignment_prec;
use crate::precedence::member_prec;
use crate::stmt_start::contains_in;
use crate::stmt_start::ends_with_open_if;
use crate::stmt_start::StartContext;
use crate::Printer;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Func;
use syntax_js::ast::syntax::Syntax;

fn is_statement(stx: &Syntax) -> bool {
  matches!(
    stx,
    Syntax::Program { .. }
      | Syntax::BlockStmt { .. }
      | Syntax::BreakStmt { .. }
      | Syntax::ClassDecl { .. }
      | Syntax::ContinueStmt { .. }
      | Syntax::DebuggerStmt {}
      | Syntax::DoWhileStmt { .. }
      | Syntax::EmptyStmt {}
      | Syntax::ExprStmt { .. }
      | Syntax::ForInStmt { .. }
      | Syntax::ForOfStmt { .. }
      | Syntax::ForStmt { .. }
      | Syntax::FuncDecl { .. }
      | Syntax::IfStmt { .. }
      | Syntax::LabelStmt { .. }
      | Syntax::ReturnStmt { .. }
      | Syntax::SwitchStmt { .. }
      | Syntax::SwitchCase { .. }
      | Syntax::ThrowStmt { .. }
      | Syntax::TryStmt { .. }
      | Syntax::CatchClause { .. }
      | Syntax::VarDecl { .. }
      | Syntax::VarDeclarator { .. }
      | Syntax::WhileStmt { .. }
      | Syntax::WithStmt { .. }
      | Syntax::ImportDecl { .. }
      | Syntax::ImportSpecifier { .. }
      | Syntax::ExportAll { .. }
      | Syntax::ExportDecl { .. }
      | Syntax::ExportDefaultExpr { .. }
      | Syntax::ExportNamed { .. }
      | Syntax::ExportSpecifier { .. }
  )
}

impl Printer {
  pub(crate) fn print_node(&mut self, node: &Node) {
    if is_statement(node.stx.as_ref()) {
      self.print_stmt(node);
    } else {
      self.print_expr(node, 1);
    }
  }

  fn print_directives_and_stmts(&mut self, directives: &[String], body: &[Node]) {
    let mut first = true;
    for directive in directives.iter() {
      if !first {
        self.out.newline();
      }
      first = false;
      self.out.write_delimited(&quote_string(directive));
      self.out.write_punct(";");
    }
    for stmt in body.iter() {
      if !first {
        self.out.newline();
      }
      first = false;
      self.print_stmt(stmt);
    }
  }

  fn print_block(&mut self, directives: &[String], body: &[Node]) {
    self.out.write_punct("{");
    if directives.is_empty() && body.is_empty() {
      self.out.write_punct("}");
      return;
    }
    self.out.indent();
    self.out.newline();
    self.print_directives_and_stmts(directives, body);
    self.out.dedent();
    self.out.newline();
    self.out.write_punct("}");
  }

  pub(crate) fn print_func_body(&mut self, func: &Func) {
    match func.body.stx.as_ref() {
      Syntax::BlockStmt { body } => self.print_block(&func.directives, body),
      _ => {
        self.out.write_punct("{");
        self.out.write_keyword("return");
        self.out.space();
        self.print_expr(&func.body, 1);
        self.out.write_punct(";");
        self.out.write_punct("}");
      }
    }
  }

  /// Prints the body of a control statement, which follows its header on the same line.
  fn print_body(&mut self, stmt: &Node) {
    self.out.space();
    self.print_stmt(stmt);
  }

  fn print_paren_header(&mut self, keyword: &str, expr: &Node) {
    self.out.write_keyword(keyword);
    self.out.space();
    self.out.write_punct("(");
    self.print_expr(expr, 1);
    self.out.write_punct(")");
  }

  fn print_var_decl(&mut self, kind: &str, declarators: &[Node], in_for_init: bool) {
    self.out.write_keyword(kind);
    for (i, decl) in declarators.iter().enumerate() {
      if i > 0 {
        self.out.comma();
      }
      let Syntax::VarDeclarator { target, init } = decl.stx.as_ref() else {
        self.print_node(decl);
        continue;
      };
      self.print_expr(target, assignment_prec());
      if let Some(init) = init {
        self.out.space();
        self.out.write_punct("=");
        self.out.space();
        if in_for_init && contains_in(init) {
          self.out.write_punct("(");
          self.print_expr(init, 1);
          self.out.write_punct(")");
        } else {
          self.print_expr(init, assignment_prec());
        }
      }
    }
  }

  fn print_for_left(&mut self, left: &Node) {
    match left.stx.as_ref() {
      Syntax::VarDecl { kind, declarators } => {
        self.print_var_decl(kind.keyword(), declarators, false)
      }
      _ => self.print_expr_at_start(left, StartContext::ForHead, member_prec()),
    }
  }

  fn print_module_source(&mut self, source: &str) {
    self.out.write_keyword("from");
    self.out.space();
    self.out.write_delimited(&quote_string(source));
  }

  pub(crate) fn print_stmt(&mut self, node: &Node) {
    match node.stx.as_ref() {
      Syntax::Program {
        body, directives, ..
      } => self.print_directives_and_stmts(directives, body),
      Syntax::BlockStmt { body } => self.print_block(&[], body),
      Syntax::BreakStmt { label } | Syntax::ContinueStmt { label } => {
        let keyword = if matches!(node.stx.as_ref(), Syntax::BreakStmt { .. }) {
          "break"
        } else {
          "continue"
        };
        self.out.write_keyword(keyword);
        if let Some(label) = label {
          self.out.write_identifier(label);
        }
        self.out.write_punct(";");
      }
      Syntax::ClassDecl { class } => self.print_class(class),
      Syntax::DebuggerStmt {} => {
        self.out.write_keyword("debugger");
        self.out.write_punct(";");
      }
      Syntax::DoWhileStmt { body, test } => {
        self.out.write_keyword("do");
        self.print_body(body);
        self.out.space();
        self.print_paren_header("while", test);
        self.out.write_punct(";");
      }
      Syntax::EmptyStmt {} => self.out.write_punct(";"),
      Syntax::ExprStmt { expr } => {
        self.print_expr_at_start(expr, StartContext::Statement, 1);
        self.out.write_punct(";");
      }
      Syntax::ForInStmt { left, right, body } => {
        self.out.write_keyword("for");
        self.out.space();
        self.out.write_punct("(");
        self.print_for_left(left);
        self.out.space();
        self.out.write_keyword("in");
        self.out.space();
        self.print_expr(right, 1);
        self.out.write_punct(")");
        self.print_body(body);
      }
      Syntax::ForOfStmt {
        is_await,
        left,
        right,
        body,
      } => {
        self.out.write_keyword("for");
        if *is_await {
          self.out.write_keyword("await");
        }
        self.out.space();
        self.out.write_punct("(");
        self.print_for_left(left);
        self.out.space();
        self.out.write_keyword("of");
        self.out.space();
        self.print_expr(right, assignment_prec());
        self.out.write_punct(")");
        self.print_body(body);
      }
      Syntax::ForStmt {
        init,
        test,
        update,
        body,
      } => {
        self.out.write_keyword("for");
        self.out.space();
        self.out.write_punct("(");
        match init.as_ref().map(|n| (n, n.stx.as_ref())) {
          Some((_, Syntax::VarDecl { kind, declarators })) => {
            self.print_var_decl(kind.keyword(), declarators, true)
          }
          Some((init, _)) if contains_in(init) => {
            self.out.write_punct("(");
            self.print_expr(init, 1);
            self.out.write_punct(")");
          }
          Some((init, _)) => self.print_expr_at_start(init, StartContext::ForHead, 1),
          None => {}
        };
        self.out.write_punct(";");
        if let Some(test) = test {
          self.out.space();
          self.print_expr(test, 1);
        }
        self.out.write_punct(";");
        if let Some(update) = update {
          self.out.space();
          self.print_expr(update, 1);
        }
        self.out.write_punct(")");
        self.print_body(body);
      }
      Syntax::FuncDecl { func } => self.print_func(func),
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        self.print_paren_header("if", test);
        match alternate {
          Some(alternate) => {
            if ends_with_open_if(consequent) {
              self.out.space();
              self.print_block(&[], std::slice::from_ref(consequent));
            } else {
              self.print_body(consequent);
            }
            self.out.space();
            self.out.write_keyword("else");
            self.print_body(alternate);
          }
          None => self.print_body(consequent),
        }
      }
      Syntax::LabelStmt { name, body } => {
        self.out.write_identifier(name);
        self.out.write_punct(":");
        self.print_body(body);
      }
      Syntax::ReturnStmt { value } => {
        self.out.write_keyword("return");
        if let Some(value) = value {
          self.out.space();
          self.print_expr(value, 1);
        }
        self.out.write_punct(";");
      }
      Syntax::SwitchStmt {
        discriminant,
        cases,
      } => {
        self.print_paren_header("switch", discriminant);
        self.out.space();
        self.out.write_punct("{");
        self.out.indent();
        for case in cases.iter() {
          self.out.newline();
          self.print_stmt(case);
        }
        self.out.dedent();
        if !cases.is_empty() {
          self.out.newline();
        }
        self.out.write_punct("}");
      }
      Syntax::SwitchCase { test, body } => {
        match test {
          Some(test) => {
            self.out.write_keyword("case");
            self.out.space();
            self.print_expr(test, 1);
          }
          None => self.out.write_keyword("default"),
        };
        self.out.write_punct(":");
        self.out.indent();
        for stmt in body.iter() {
          self.out.newline();
          self.print_stmt(stmt);
        }
        self.out.dedent();
      }
      Syntax::ThrowStmt { value } => {
        self.out.write_keyword("throw");
        self.out.space();
        self.print_expr(value, 1);
        self.out.write_punct(";");
      }
      Syntax::TryStmt {
        block,
        handler,
        finalizer,
      } => {
        self.out.write_keyword("try");
        self.out.space();
        self.print_stmt(block);
        if let Some(handler) = handler {
          self.out.space();
          self.print_stmt(handler);
        }
        if let Some(finalizer) = finalizer {
          self.out.space();
          self.out.write_keyword("finally");
          self.out.space();
          self.print_stmt(finalizer);
        }
      }
      Syntax::CatchClause { param, body } => {
        self.out.write_keyword("catch");
        self.out.space();
        if let Some(param) = param {
          self.out.write_punct("(");
          self.print_expr(param, assignment_prec());
          self.out.write_punct(")");
          self.out.space();
        }
        self.print_stmt(body);
      }
      Syntax::VarDecl { kind, declarators } => {
        self.print_var_decl(kind.keyword(), declarators, false);
        self.out.write_punct(";");
      }
      Syntax::VarDeclarator { .. } => {
        self.print_var_decl("", std::slice::from_ref(node), false);
      }
      Syntax::WhileStmt { test, body } => {
        self.print_paren_header("while", test);
        self.print_body(body);
      }
      Syntax::WithStmt { object, body } => {
        self.print_paren_header("with", object);
        self.print_body(body);
      }
      Syntax::ImportDecl {
        default,
        namespace,
        named,
        source,
      } => {
        self.out.write_keyword("import");
        let has_bindings = default.is_some() || namespace.is_some() || !named.is_empty();
        if let Some(default) = default {
          self.print_expr_inner(default);
          if namespace.is_some() || !named.is_empty() {
            self.out.comma();
          }
        }
        if default.is_none() {
          self.out.space();
        }
        if let Some(namespace) = namespace {
          self.out.write_punct("*");
          self.out.space();
          self.out.write_keyword("as");
          self.print_expr_inner(namespace);
        } else if !named.is_empty() {
          self.out.write_punct("{");
          for (i, spec) in named.iter().enumerate() {
            if i > 0 {
              self.out.comma();
            }
            self.print_stmt(spec);
          }
          self.out.write_punct("}");
        }
        if has_bindings {
          self.out.space();
          self.print_module_source(source);
        } else {
          self.out.write_delimited(&quote_string(source));
        }
        self.out.write_punct(";");
      }
      Syntax::ImportSpecifier { imported, local } => {
        if local.stx.ident_name() != Some(imported.as_str()) {
          self.print_name_or_string(imported);
          self.out.space();
          self.out.write_keyword("as");
        }
        self.print_expr_inner(local);
      }
      Syntax::ExportAll { alias, source } => {
        self.out.write_keyword("export");
        self.out.space();
        self.out.write_punct("*");
        self.out.space();
        if let Some(alias) = alias {
          self.out.write_keyword("as");
          self.print_name_or_string(alias);
          self.out.space();
        }
        self.print_module_source(source);
        self.out.write_punct(";");
      }
      Syntax::ExportDecl { decl } => {
        self.out.write_keyword("export");
        self.print_stmt(decl);
      }
      Syntax::ExportDefaultExpr { value } => {
        self.out.write_keyword("export");
        self.out.write_keyword("default");
        self.out.space();
        match value.stx.as_ref() {
          Syntax::FuncDecl { .. } | Syntax::ClassDecl { .. } => self.print_stmt(value),
          _ => {
            self.print_expr_at_start(value, StartContext::ExportDefault, assignment_prec());
            self.out.write_punct(";");
          }
        }
      }
      Syntax::ExportNamed { specifiers, source } => {
        self.out.write_keyword("export");
        self.out.space();
        self.out.write_punct("{");
        for (i, spec) in specifiers.iter().enumerate() {
          if i > 0 {
            self.out.comma();
          }
          self.print_stmt(spec);
        }
        self.out.write_punct("}");
        if let Some(source) = source {
          self.out.space();
          self.print_module_source(source);
        }
        self.out.write_punct(";");
      }
      Syntax::ExportSpecifier { local, exported } => {
        let local_name = match local.stx.as_ref() {
          Syntax::IdExpr { name } | Syntax::PropKey { name } => name.as_str(),
          _ => exported.as_str(),
        };
        self.print_name_or_string(local_name);
        if local_name != exported {
          self.out.space();
          self.out.write_keyword("as");
          self.print_name_or_string(exported);
        }
      }
      _ => self.print_expr(node, 1),
    }
  }
}

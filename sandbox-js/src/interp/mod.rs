//! Tree-walking evaluation of statements and expressions.
//!
//! Evaluation methods live on [`Realm`] and take the current environment explicitly. Throws travel
//! as `Err(SandboxError::Throw(..))`; the other abrupt completions are values of [`Completion`].

mod expr;
mod pattern;
mod stmt;

use crate::env::EnvRef;
use crate::error::SandboxError;
use crate::error::SandboxResult;
use crate::realm::Realm;
use crate::value::Closure;
use crate::value::Value;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Syntax;
use syntax_js::ast::syntax::VarDeclKind;

pub(crate) use pattern::BindMode;

/// Non-throw completion of a statement.
#[derive(Clone, Debug)]
pub enum Completion {
  /// The statement's value, if it produced one.
  Normal(Option<Value>),
  Return(Value),
  Break(Option<String>),
  Continue(Option<String>),
}

impl Completion {
  pub fn empty() -> Self {
    Completion::Normal(None)
  }
}

/// Adds the names bound by a pattern to `out`.
pub(crate) fn pattern_names<'n>(pat: &'n Node, out: &mut Vec<&'n str>) {
  match pat.stx.as_ref() {
    Syntax::IdPat { name } => out.push(name),
    Syntax::ArrPat { elements } => {
      for elem in elements {
        pattern_names(elem, out);
      }
    }
    Syntax::ObjPat { props } => {
      for prop in props {
        pattern_names(prop, out);
      }
    }
    Syntax::PatProp { target, .. } | Syntax::RestPat { target } => pattern_names(target, out),
    Syntax::AssignPat { target, .. } => pattern_names(target, out),
    _ => {}
  }
}

fn collect_var_names<'n>(stmt: &'n Node, out: &mut Vec<&'n str>) {
  match stmt.stx.as_ref() {
    Syntax::VarDecl {
      kind: VarDeclKind::Var,
      declarators,
    } => {
      for decl in declarators {
        if let Syntax::VarDeclarator { target, .. } = decl.stx.as_ref() {
          pattern_names(target, out);
        }
      }
    }
    Syntax::BlockStmt { body } => {
      for stmt in body {
        collect_var_names(stmt, out);
      }
    }
    Syntax::IfStmt {
      consequent,
      alternate,
      ..
    } => {
      collect_var_names(consequent, out);
      if let Some(alt) = alternate {
        collect_var_names(alt, out);
      }
    }
    Syntax::ForStmt { init, body, .. } => {
      if let Some(init) = init {
        collect_var_names(init, out);
      }
      collect_var_names(body, out);
    }
    Syntax::ForInStmt { left, body, .. } | Syntax::ForOfStmt { left, body, .. } => {
      collect_var_names(left, out);
      collect_var_names(body, out);
    }
    Syntax::WhileStmt { body, .. }
    | Syntax::DoWhileStmt { body, .. }
    | Syntax::LabelStmt { body, .. }
    | Syntax::WithStmt { body, .. } => collect_var_names(body, out),
    Syntax::SwitchStmt { cases, .. } => {
      for case in cases {
        if let Syntax::SwitchCase { body, .. } = case.stx.as_ref() {
          for stmt in body {
            collect_var_names(stmt, out);
          }
        }
      }
    }
    Syntax::TryStmt {
      block,
      handler,
      finalizer,
    } => {
      collect_var_names(block, out);
      if let Some(handler) = handler {
        collect_var_names(handler, out);
      }
      if let Some(finalizer) = finalizer {
        collect_var_names(finalizer, out);
      }
    }
    Syntax::CatchClause { body, .. } => collect_var_names(body, out),
    _ => {}
  }
}

impl Realm {
  /// Declares everything a statement list introduces before any of it runs: lexical bindings
  /// (in their dead zone) and function declarations in `env`, plus hoisted `var`s when `vars` is
  /// set, i.e. for function bodies and the top level.
  pub(crate) fn hoist_declarations(
    &mut self,
    env: &EnvRef,
    stmts: &[Node],
    vars: bool,
  ) -> SandboxResult<()> {
    if vars {
      let mut names = Vec::new();
      for stmt in stmts {
        collect_var_names(stmt, &mut names);
      }
      for name in names {
        env.declare_var(name);
      }
    }
    for stmt in stmts {
      match stmt.stx.as_ref() {
        Syntax::VarDecl { kind, declarators } if *kind != VarDeclKind::Var => {
          let mut names = Vec::new();
          for decl in declarators {
            if let Syntax::VarDeclarator { target, .. } = decl.stx.as_ref() {
              pattern_names(target, &mut names);
            }
          }
          for name in names {
            env
              .declare_lexical(name, *kind == VarDeclKind::Let)
              .map_err(|err| self.env_error(err))?;
          }
        }
        Syntax::FuncDecl { func } => {
          if let Some(name) = func.name.as_ref().and_then(|n| n.stx.ident_name()) {
            let closure = self.closure(stmt, func, env);
            env.initialize(name, closure);
          }
        }
        _ => {}
      }
    }
    Ok(())
  }

  pub(crate) fn call_closure(
    &mut self,
    closure: &Closure,
    this: Value,
    args: &[Value],
  ) -> SandboxResult<Value> {
    let func = closure.func.clone();
    if func.is_async || func.is_generator {
      return Err(SandboxError::Unsupported("async or generator function call"));
    }
    let env = closure
      .env
      .new_function((!func.is_arrow).then_some(this));
    if !func.is_arrow {
      env.initialize("arguments", self.new_array(args.to_vec()));
    }
    for (i, param) in func.params.iter().enumerate() {
      match param.stx.as_ref() {
        Syntax::RestPat { target } => {
          let rest = self.new_array(args.get(i..).map(<[Value]>::to_vec).unwrap_or_default());
          self.bind_pattern(&env, target, rest, BindMode::Lexical)?;
        }
        _ => {
          let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
          self.bind_pattern(&env, param, arg, BindMode::Lexical)?;
        }
      }
    }
    if func.has_expression_body() {
      return self.eval_expr(&env, &func.body);
    }
    let Syntax::BlockStmt { body } = func.body.stx.as_ref() else {
      return Ok(Value::Undefined);
    };
    self.hoist_declarations(&env, body, true)?;
    match self.eval_stmt_list(&env, body)? {
      Completion::Return(value) => Ok(value),
      _ => Ok(Value::Undefined),
    }
  }
}

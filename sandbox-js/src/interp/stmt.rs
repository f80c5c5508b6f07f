use super::pattern_names;
use super::BindMode;
use super::Completion;
use crate::env::EnvRef;
use crate::error::SandboxError;
use crate::error::SandboxResult;
use crate::ops::strict_equals;
use crate::ops::to_boolean;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::Value;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Syntax;
use syntax_js::ast::syntax::VarDeclKind;

/// Folds one loop iteration's completion into the loop's state. Returns `Some` when the loop has
/// to stop with that completion.
fn after_iteration(
  completion: Completion,
  labels: &[&str],
  last: &mut Option<Value>,
) -> Option<Completion> {
  match completion {
    Completion::Normal(value) => {
      if value.is_some() {
        *last = value;
      }
      None
    }
    Completion::Continue(None) => None,
    Completion::Continue(Some(label)) if labels.contains(&label.as_str()) => None,
    Completion::Break(None) => Some(Completion::Normal(last.take())),
    Completion::Break(Some(label)) if labels.contains(&label.as_str()) => {
      Some(Completion::Normal(last.take()))
    }
    other => Some(other),
  }
}

impl Realm {
  pub(crate) fn eval_stmt_list(&mut self, env: &EnvRef, stmts: &[Node]) -> SandboxResult<Completion> {
    let mut last = None;
    for stmt in stmts {
      match self.eval_stmt(env, stmt)? {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_block(&mut self, env: &EnvRef, body: &[Node]) -> SandboxResult<Completion> {
    let block = env.new_block();
    self.hoist_declarations(&block, body, false)?;
    self.eval_stmt_list(&block, body)
  }

  fn eval_block_node(&mut self, env: &EnvRef, node: &Node) -> SandboxResult<Completion> {
    match node.stx.as_ref() {
      Syntax::BlockStmt { body } => self.eval_block(env, body),
      _ => self.eval_stmt(env, node),
    }
  }

  pub(crate) fn eval_stmt(&mut self, env: &EnvRef, stmt: &Node) -> SandboxResult<Completion> {
    self.eval_labelled_stmt(env, stmt, &[])
  }

  fn eval_labelled_stmt(
    &mut self,
    env: &EnvRef,
    stmt: &Node,
    labels: &[&str],
  ) -> SandboxResult<Completion> {
    self.tick()?;
    match stmt.stx.as_ref() {
      Syntax::EmptyStmt {} | Syntax::DebuggerStmt {} | Syntax::FuncDecl { .. } => {
        Ok(Completion::empty())
      }
      Syntax::ExprStmt { expr } => Ok(Completion::Normal(Some(self.eval_expr(env, expr)?))),
      Syntax::VarDecl { kind, declarators } => {
        self.eval_var_decl(env, *kind, declarators)?;
        Ok(Completion::empty())
      }
      Syntax::BlockStmt { body } => self.eval_block(env, body),
      Syntax::IfStmt {
        test,
        consequent,
        alternate,
      } => {
        let test = self.eval_expr(env, test)?;
        if to_boolean(&test) {
          self.eval_stmt(env, consequent)
        } else if let Some(alternate) = alternate {
          self.eval_stmt(env, alternate)
        } else {
          Ok(Completion::empty())
        }
      }
      Syntax::LabelStmt { name, body } => {
        let mut inner = labels.to_vec();
        inner.push(name.as_str());
        match self.eval_labelled_stmt(env, body, &inner)? {
          Completion::Break(Some(label)) if label == *name => Ok(Completion::empty()),
          other => Ok(other),
        }
      }
      Syntax::WhileStmt { test, body } => {
        let mut last = None;
        loop {
          self.tick()?;
          let test = self.eval_expr(env, test)?;
          if !to_boolean(&test) {
            return Ok(Completion::Normal(last));
          }
          let completion = self.eval_stmt(env, body)?;
          if let Some(done) = after_iteration(completion, labels, &mut last) {
            return Ok(done);
          }
        }
      }
      Syntax::DoWhileStmt { body, test } => {
        let mut last = None;
        loop {
          self.tick()?;
          let completion = self.eval_stmt(env, body)?;
          if let Some(done) = after_iteration(completion, labels, &mut last) {
            return Ok(done);
          }
          let test = self.eval_expr(env, test)?;
          if !to_boolean(&test) {
            return Ok(Completion::Normal(last));
          }
        }
      }
      Syntax::ForStmt {
        init,
        test,
        update,
        body,
      } => self.eval_for(env, init.as_ref(), test.as_ref(), update.as_ref(), body, labels),
      Syntax::ForInStmt { left, right, body } => {
        let right = self.eval_expr(env, right)?;
        let keys: Vec<Value> = match &right {
          Value::Object(obj) => obj.borrow().own_keys().into_iter().map(Value::String).collect(),
          Value::String(s) => (0..s.len_code_units())
            .map(|i| Value::String(JsString::from(i.to_string())))
            .collect(),
          _ => Vec::new(),
        };
        self.eval_for_each(env, left, keys, body, labels)
      }
      Syntax::ForOfStmt {
        is_await,
        left,
        right,
        body,
      } => {
        if *is_await {
          return Err(SandboxError::Unsupported("for await"));
        }
        let right = self.eval_expr(env, right)?;
        let items = self.iterate(&right)?;
        self.eval_for_each(env, left, items, body, labels)
      }
      Syntax::SwitchStmt {
        discriminant,
        cases,
      } => self.eval_switch(env, discriminant, cases, labels),
      Syntax::BreakStmt { label } => Ok(Completion::Break(label.clone())),
      Syntax::ContinueStmt { label } => Ok(Completion::Continue(label.clone())),
      Syntax::ReturnStmt { value } => Ok(Completion::Return(match value {
        Some(value) => self.eval_expr(env, value)?,
        None => Value::Undefined,
      })),
      Syntax::ThrowStmt { value } => Err(SandboxError::Throw(self.eval_expr(env, value)?)),
      Syntax::TryStmt {
        block,
        handler,
        finalizer,
      } => self.eval_try(env, block, handler.as_ref(), finalizer.as_ref()),
      Syntax::ClassDecl { .. } => Err(SandboxError::Unsupported("class declaration")),
      Syntax::WithStmt { .. } => Err(SandboxError::Unsupported("with statement")),
      _ => Err(SandboxError::Unsupported("module declaration")),
    }
  }

  fn eval_var_decl(
    &mut self,
    env: &EnvRef,
    kind: VarDeclKind,
    declarators: &[Node],
  ) -> SandboxResult<()> {
    let mode = match kind {
      VarDeclKind::Var => BindMode::Var,
      _ => BindMode::Lexical,
    };
    for decl in declarators {
      let Syntax::VarDeclarator { target, init } = decl.stx.as_ref() else {
        continue;
      };
      match init {
        Some(init) => {
          let value = self.eval_expr(env, init)?;
          self.bind_pattern(env, target, value, mode)?;
        }
        None if mode == BindMode::Lexical => {
          self.bind_pattern(env, target, Value::Undefined, mode)?;
        }
        None => {}
      }
    }
    Ok(())
  }

  // Copies the loop's `let` bindings into a fresh scope, so closures created in one iteration
  // don't observe later iterations.
  fn next_iteration_env(&self, loop_env: &EnvRef, current: &EnvRef, names: &[&str]) -> EnvRef {
    let next = loop_env.new_block();
    for name in names {
      if let Ok(value) = current.lookup(name) {
        next.initialize(name, value);
      }
    }
    next
  }

  fn eval_for(
    &mut self,
    env: &EnvRef,
    init: Option<&Node>,
    test: Option<&Node>,
    update: Option<&Node>,
    body: &Node,
    labels: &[&str],
  ) -> SandboxResult<Completion> {
    let loop_env = env.new_block();
    let mut per_iteration = Vec::new();
    if let Some(init) = init {
      match init.stx.as_ref() {
        Syntax::VarDecl { kind, declarators } => {
          if *kind != VarDeclKind::Var {
            for decl in declarators {
              if let Syntax::VarDeclarator { target, .. } = decl.stx.as_ref() {
                pattern_names(target, &mut per_iteration);
              }
            }
          }
          self.hoist_declarations(&loop_env, std::slice::from_ref(init), false)?;
          self.eval_var_decl(&loop_env, *kind, declarators)?;
        }
        _ => {
          self.eval_expr(&loop_env, init)?;
        }
      }
    }
    let mut iter_env = self.next_iteration_env(&loop_env, &loop_env, &per_iteration);
    let mut last = None;
    loop {
      self.tick()?;
      if let Some(test) = test {
        let test = self.eval_expr(&iter_env, test)?;
        if !to_boolean(&test) {
          return Ok(Completion::Normal(last));
        }
      }
      let completion = self.eval_stmt(&iter_env, body)?;
      if let Some(done) = after_iteration(completion, labels, &mut last) {
        return Ok(done);
      }
      iter_env = self.next_iteration_env(&loop_env, &iter_env, &per_iteration);
      if let Some(update) = update {
        self.eval_expr(&iter_env, update)?;
      }
    }
  }

  fn eval_for_each(
    &mut self,
    env: &EnvRef,
    left: &Node,
    items: Vec<Value>,
    body: &Node,
    labels: &[&str],
  ) -> SandboxResult<Completion> {
    let mut last = None;
    for item in items {
      self.tick()?;
      let iter_env = env.new_block();
      match left.stx.as_ref() {
        Syntax::VarDecl { kind, declarators } => {
          let mode = match kind {
            VarDeclKind::Var => BindMode::Var,
            _ => BindMode::Lexical,
          };
          if let Some(Syntax::VarDeclarator { target, .. }) =
            declarators.first().map(|d| d.stx.as_ref())
          {
            self.bind_pattern(&iter_env, target, item, mode)?;
          }
        }
        _ => self.bind_pattern(&iter_env, left, item, BindMode::Assign)?,
      }
      let completion = self.eval_stmt(&iter_env, body)?;
      if let Some(done) = after_iteration(completion, labels, &mut last) {
        return Ok(done);
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_switch(
    &mut self,
    env: &EnvRef,
    discriminant: &Node,
    cases: &[Node],
    labels: &[&str],
  ) -> SandboxResult<Completion> {
    let value = self.eval_expr(env, discriminant)?;
    let block = env.new_block();
    let case_parts: Vec<(Option<&Node>, &[Node])> = cases
      .iter()
      .filter_map(|case| match case.stx.as_ref() {
        Syntax::SwitchCase { test, body } => Some((test.as_ref(), body.as_slice())),
        _ => None,
      })
      .collect();
    for (_, body) in &case_parts {
      self.hoist_declarations(&block, body, false)?;
    }
    let mut start = None;
    for (i, (test, _)) in case_parts.iter().enumerate() {
      if let Some(test) = test {
        let test = self.eval_expr(&block, test)?;
        if strict_equals(&value, &test) {
          start = Some(i);
          break;
        }
      }
    }
    let start = start.or_else(|| case_parts.iter().position(|(test, _)| test.is_none()));
    let Some(start) = start else {
      return Ok(Completion::empty());
    };
    let mut last = None;
    for (_, body) in &case_parts[start..] {
      match self.eval_stmt_list(&block, body)? {
        Completion::Normal(value) => {
          if value.is_some() {
            last = value;
          }
        }
        Completion::Break(None) => return Ok(Completion::Normal(last)),
        Completion::Break(Some(label)) if labels.contains(&label.as_str()) => {
          return Ok(Completion::Normal(last))
        }
        abrupt => return Ok(abrupt),
      }
    }
    Ok(Completion::Normal(last))
  }

  fn eval_try(
    &mut self,
    env: &EnvRef,
    block: &Node,
    handler: Option<&Node>,
    finalizer: Option<&Node>,
  ) -> SandboxResult<Completion> {
    let mut result = self.eval_block_node(env, block);
    if let (Err(SandboxError::Throw(thrown)), Some(handler)) = (&result, handler) {
      if let Syntax::CatchClause { param, body } = handler.stx.as_ref() {
        let catch_env = env.new_block();
        let thrown = thrown.clone();
        result = match param {
          Some(param) => self.bind_pattern(&catch_env, param, thrown, BindMode::Lexical),
          None => Ok(()),
        }
        .and_then(|_| self.eval_block_node(&catch_env, body));
      }
    }
    if matches!(&result, Err(err) if !err.is_catchable()) {
      return result;
    }
    let Some(finalizer) = finalizer else {
      return result;
    };
    match self.eval_block_node(env, finalizer)? {
      Completion::Normal(_) => result,
      abrupt => Ok(abrupt),
    }
  }
}

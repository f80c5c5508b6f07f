//! Pre-executes functions whose body starts with an `#execute` directive and replaces their calls
//! with the computed results.
//!
//! A function declaration is called by its own name. Any other function names itself in the
//! directive, as in `"#execute[name=decode]"`. Each marked function is evaluated once under a
//! synthetic name, and every call is evaluated against that. A call whose result has no literal
//! form stays, and keeps the function alive.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::literal::value_node;
use crate::mutate::remove;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use crate::scope::DeclKind;
use crate::scope::ScopeStack;
use crate::scope::ScopeTree;
use ahash::HashSet;
use ahash::HashSetExt;
use print_js::print;
use print_js::PrintOptions;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Func;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;
use tracing::debug;
use tracing::warn;

const MARKER: &str = "#execute";

struct Executed {
  func: NodeId,
  /// The statement or declarator holding the function.
  removal: Option<NodeId>,
  name: Option<String>,
  synthetic: String,
  errored: bool,
  failed: bool,
}

/// For a marked function, the name its calls use, if it has one. `fallback` is the name of the
/// variable holding a function expression.
fn marked_name(node: &Node, fallback: Option<&str>) -> Option<Option<String>> {
  let func = node.stx.func()?;
  let directive = func.directives.iter().find(|d| d.starts_with(MARKER))?;
  if let Syntax::FuncDecl { .. } = node.stx.as_ref() {
    return Some(
      func
        .name
        .as_ref()
        .and_then(|n| n.stx.ident_name())
        .map(str::to_string),
    );
  }
  Some(
    directive
      .strip_prefix("#execute[name=")
      .and_then(|rest| rest.strip_suffix(']'))
      .or(fallback)
      .map(str::to_string),
  )
}

struct Discover {
  tree: ScopeTree<usize>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  executed: Vec<Executed>,
  seen: HashSet<NodeId>,
}

impl Discover {
  fn register(
    &mut self,
    func: &Node,
    holder: Option<&str>,
    removal: Option<NodeId>,
    kind: DeclKind,
  ) {
    let Some(name) = marked_name(func, holder) else {
      return;
    };
    if !self.seen.insert(func.id) {
      return;
    }
    let idx = self.executed.len();
    if let Some(name) = &name {
      self.tree.insert(self.scopes.current(), name, kind, idx);
    }
    self.executed.push(Executed {
      func: func.id,
      removal,
      name,
      synthetic: format!("EXECUTED_FUNCTION_{idx}"),
      errored: false,
      failed: false,
    });
  }
}

impl Rewrite for Discover {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    match node.stx.as_ref() {
      Syntax::VarDecl { kind, .. } => self.kinds.push(*kind),
      Syntax::VarDeclarator {
        target,
        init: Some(init),
      } if matches!(target.stx.as_ref(), Syntax::IdPat { .. })
        && matches!(
          init.stx.as_ref(),
          Syntax::FuncExpr { .. } | Syntax::ArrowFunc { .. }
        ) =>
      {
        let kind = self.kinds.last().copied().unwrap_or(VarDeclKind::Var).into();
        self.register(init, target.stx.ident_name(), Some(node.id), kind);
      }
      Syntax::FuncDecl { .. } => self.register(node, None, Some(node.id), DeclKind::Function),
      Syntax::FuncExpr { .. } | Syntax::ArrowFunc { .. } => {
        self.register(node, None, None, DeclKind::Param)
      }
      _ => {}
    };
    self.scopes.enter(&mut self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    if let Syntax::VarDecl { .. } = node.stx.as_ref() {
      self.kinds.pop();
    }
    Ok(None)
  }
}

/// `let g = f;` where `f` is an executed function makes `g` another name for it.
struct Aliases<'a> {
  tree: &'a mut ScopeTree<usize>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  found: usize,
}

impl<'a> Rewrite for Aliases<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Syntax::VarDeclarator {
      target,
      init: Some(init),
    } = node.stx.as_ref()
    {
      if let (Syntax::IdPat { name: alias }, Syntax::IdExpr { name }) =
        (target.stx.as_ref(), init.stx.as_ref())
      {
        let scope = self.scopes.current();
        if let Some(idx) = self.tree.lookup(scope, name).copied() {
          let kind = self.kinds.last().copied().unwrap_or(VarDeclKind::Var).into();
          self.tree.insert(scope, alias, kind, idx);
          self.found += 1;
          return Ok(Some(Replacement::Remove));
        }
      }
    }
    if let Syntax::VarDecl { kind, .. } = node.stx.as_ref() {
      self.kinds.push(*kind);
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    if let Syntax::VarDecl { .. } = node.stx.as_ref() {
      self.kinds.pop();
    }
    Ok(None)
  }
}

struct Calls<'a, 'c> {
  cx: &'a mut PassCtx<'c>,
  tree: &'a mut ScopeTree<usize>,
  scopes: ScopeStack,
  executed: &'a mut [Executed],
  marked: HashSet<NodeId>,
  // Nesting depth inside marked functions, whose bodies are left alone.
  inside: usize,
  callees: HashSet<NodeId>,
  replaced: usize,
}

impl<'a, 'c> Calls<'a, 'c> {
  fn executed_callee(&self, node: &Node) -> Option<usize> {
    let Syntax::CallExpr {
      callee,
      optional: false,
      ..
    } = node.stx.as_ref()
    else {
      return None;
    };
    let name = callee.stx.ident_name()?;
    if !matches!(callee.stx.as_ref(), Syntax::IdExpr { .. }) {
      return None;
    }
    self.tree.lookup(self.scopes.current(), name).copied()
  }

  fn evaluate_call(&mut self, idx: usize, node: &Node) -> Option<Node> {
    let Syntax::CallExpr { arguments, .. } = node.stx.as_ref() else {
      return None;
    };
    let call = Node::synthetic(Syntax::CallExpr {
      callee: Node::synthetic(Syntax::IdExpr {
        name: self.executed[idx].synthetic.clone(),
      }),
      arguments: arguments.iter().map(Node::duplicate).collect(),
      optional: false,
    });
    let code = print(&call, PrintOptions { pretty: false });
    match self.cx.evaluator.evaluate(&code) {
      Ok(value) => value_node(&value),
      Err(err) => {
        debug!(%err, code, "call of executed function failed");
        None
      }
    }
  }
}

impl<'a, 'c> Rewrite for Calls<'a, 'c> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if self.marked.contains(&node.id) {
      self.inside += 1;
    }
    if self.inside == 0 {
      if self.executed_callee(node).is_some() {
        if let Syntax::CallExpr { callee, .. } = node.stx.as_ref() {
          self.callees.insert(callee.id);
        }
      } else if let Syntax::IdExpr { name } = node.stx.as_ref() {
        // Any use other than a direct call needs the function to stay.
        if !self.callees.contains(&node.id) {
          if let Some(idx) = self.tree.lookup(self.scopes.current(), name).copied() {
            self.executed[idx].failed = true;
          }
        }
      }
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    if self.marked.contains(&node.id) {
      self.inside -= 1;
      return Ok(None);
    }
    if self.inside > 0 {
      return Ok(None);
    }
    let Some(idx) = self.executed_callee(node) else {
      return Ok(None);
    };
    if self.executed[idx].errored {
      return Ok(None);
    }
    match self.evaluate_call(idx, node) {
      Some(lit) => {
        self.replaced += 1;
        Ok(Some(Replacement::One(lit)))
      }
      None => {
        self.executed[idx].failed = true;
        Ok(None)
      }
    }
  }
}

/// `function EXECUTED_FUNCTION_n(params) { body }`, with references to the function's own name
/// pointed at the synthetic name.
fn synthetic_function(func: &Func, executed: &Executed) -> Node {
  let body = if func.has_expression_body() {
    Node::synthetic(Syntax::BlockStmt {
      body: vec![Node::synthetic(Syntax::ReturnStmt {
        value: Some(func.body.duplicate()),
      })],
    })
  } else {
    func.body.duplicate()
  };
  let mut decl = Node::synthetic(Syntax::FuncDecl {
    func: Func {
      name: Some(Node::synthetic(Syntax::IdPat {
        name: executed.synthetic.clone(),
      })),
      params: func.params.iter().map(Node::duplicate).collect(),
      body,
      directives: Vec::new(),
      is_async: false,
      is_generator: false,
      is_arrow: false,
    },
  });
  if let Some(name) = &executed.name {
    rename_references(&mut decl, name, &executed.synthetic);
  }
  decl
}

fn rename_references(node: &mut Node, from: &str, to: &str) {
  if let Syntax::IdExpr { name } = node.stx.as_mut() {
    if name == from {
      *name = to.to_string();
    }
  }
  for child in node.children_mut() {
    rename_references(child, from, to);
  }
}

pub struct ExecutePass;

impl Pass for ExecutePass {
  fn name(&self) -> &'static str {
    "execute"
  }

  fn run(&mut self, cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut tree = ScopeTree::new(program.id);
    let mut discover = Discover {
      scopes: ScopeStack::new(tree.root()),
      tree,
      kinds: Vec::new(),
      executed: Vec::new(),
      seen: HashSet::new(),
    };
    rewrite(program, &mut discover)?;
    let Discover {
      tree: discovered,
      mut executed,
      seen: marked,
      ..
    } = discover;
    tree = discovered;
    if executed.is_empty() {
      return Ok(false);
    }

    for e in executed.iter_mut() {
      let Some(func) = program.find(e.func).and_then(|n| n.stx.func()) else {
        e.errored = true;
        continue;
      };
      let code = print(&synthetic_function(func, e), PrintOptions { pretty: false });
      if let Err(err) = cx.evaluator.evaluate(&code) {
        debug!(%err, name = ?e.name, "executed function failed to evaluate");
        e.errored = true;
      }
    }

    let mut aliases = Aliases {
      scopes: ScopeStack::new(tree.root()),
      tree: &mut tree,
      kinds: Vec::new(),
      found: 0,
    };
    rewrite(program, &mut aliases)?;
    let aliased = aliases.found;

    let mut calls = Calls {
      cx,
      scopes: ScopeStack::new(tree.root()),
      tree: &mut tree,
      executed: &mut executed,
      marked,
      inside: 0,
      callees: HashSet::new(),
      replaced: 0,
    };
    rewrite(program, &mut calls)?;
    let replaced = calls.replaced;

    let mut removed = 0;
    for e in executed.iter().filter(|e| !e.failed && !e.errored) {
      match e.removal {
        Some(target) => {
          if remove(program, target)? {
            removed += 1;
          }
        }
        None => warn!(name = ?e.name, "executed function has no removable declaration"),
      }
    }
    debug!(
      functions = executed.len(),
      aliased, replaced, removed, "executed marked functions"
    );
    Ok(aliased + replaced + removed > 0)
  }
}

#[cfg(test)]
mod tests {
  use crate::config::Config;
  use crate::deobfuscate;

  fn run(source: &str) -> String {
    let config = Config {
      miscellaneous: crate::config::MiscellaneousConfig {
        beautify: false,
        ..Config::disabled().miscellaneous
      },
      ..Config::disabled()
    };
    deobfuscate(source, &config).unwrap()
  }

  #[test]
  fn replaces_calls_and_removes_function() {
    assert_eq!(
      run(r##"function add(a, b) { "#execute"; return a + b; } log(add(1, 2), add("x", "y"));"##),
      r#"log(3,"xy");"#
    );
  }

  #[test]
  fn named_expressions_and_aliases() {
    assert_eq!(
      run(r##"var d = function (s) { "#execute[name=d]"; return s.split("").reverse().join(""); }; let e = d; log(e("cba"));"##),
      r#"log("abc");"#
    );
  }

  #[test]
  fn recursion_uses_synthetic_name() {
    assert_eq!(
      run(r##"function fib(n) { "#execute"; return n < 2 ? n : fib(n - 1) + fib(n - 2); } log(fib(10));"##),
      "log(55);"
    );
  }

  #[test]
  fn failed_calls_keep_the_function() {
    let out = run(r##"function f(a) { "#execute"; return a * 2; } log(f(2), f(x));"##);
    assert!(out.starts_with("function f(a)"), "{out}");
    assert!(out.ends_with("log(4,f(x));"), "{out}");
  }

  #[test]
  fn unmarked_functions_are_ignored() {
    assert_eq!(
      run("function f(a) { return a; } f(1);"),
      "function f(a){return a;}f(1);"
    );
  }
}

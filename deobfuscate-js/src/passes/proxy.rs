//! Inlines proxy functions: functions whose whole body returns one simple expression of their
//! parameters.
//!
//! Proxies that call each other in a cycle are never inlined, since expanding them wouldn't
//! terminate. Every other call `p(a, b)` is replaced by a copy of the returned expression with
//! the parameters substituted, and the expansion repeats while the result is itself a proxy call.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::graph::Graph;
use crate::mutate::remove;
use crate::mutate::rewrite;
use crate::mutate::rewrite_children;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use crate::scope::declared_names;
use crate::scope::DeclKind;
use crate::scope::DeclSite;
use crate::scope::ScopeId;
use crate::scope::ScopeKind;
use crate::scope::ScopeStack;
use crate::scope::ScopeTree;
use ahash::HashSet;
use ahash::HashSetExt;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Func;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;
use syntax_js::operator::OperatorName;
use tracing::debug;

// Bounds nested expansion of a single call.
const MAX_EXPANSION_DEPTH: usize = 64;

struct Proxy {
  /// The declaration removed once the proxy is unused: a `FuncDecl` or a `VarDeclarator`.
  decl: NodeId,
  func: NodeId,
  params: Vec<String>,
  body: Node,
}

/// A name bound in some scope: a proxy, or any other declaration shadowing outer proxies.
type Binding = Option<usize>;

fn is_unsafe_in_proxy(node: &Node) -> bool {
  match node.stx.as_ref() {
    Syntax::FuncExpr { .. }
    | Syntax::ArrowFunc { .. }
    | Syntax::ClassExpr { .. }
    | Syntax::ThisExpr {}
    | Syntax::SuperExpr {}
    | Syntax::NewTarget {}
    | Syntax::AwaitExpr { .. }
    | Syntax::YieldExpr { .. }
    | Syntax::LitRegex { .. }
    | Syntax::UnaryPostfixExpr { .. } => true,
    Syntax::UnaryExpr {
      operator: OperatorName::PrefixIncrement | OperatorName::PrefixDecrement,
      ..
    } => true,
    Syntax::BinaryExpr { operator, .. } => operator.is_assignment(),
    Syntax::IdExpr { name } => name == "arguments",
    _ => node.children().into_iter().any(is_unsafe_in_proxy),
  }
}

/// The returned expression, if `func` is a proxy.
fn proxy_expression(func: &Func) -> Option<&Node> {
  if func.is_async || func.is_generator {
    return None;
  }
  if !func
    .params
    .iter()
    .all(|p| matches!(p.stx.as_ref(), Syntax::IdPat { .. }))
  {
    return None;
  }
  let expr = match func.body.stx.as_ref() {
    Syntax::BlockStmt { body } => match body.as_slice() {
      [stmt] => match stmt.stx.as_ref() {
        Syntax::ReturnStmt { value: Some(value) } => value,
        _ => return None,
      },
      _ => return None,
    },
    _ => &func.body,
  };
  let simple = match expr.stx.as_ref() {
    Syntax::CallExpr { .. }
    | Syntax::UnaryExpr { .. }
    | Syntax::ComputedMemberExpr { .. }
    | Syntax::IdExpr { .. } => true,
    Syntax::BinaryExpr { .. } => true,
    stx => stx.is_literal(),
  };
  (simple && !is_unsafe_in_proxy(expr)).then_some(expr)
}

fn param_names(func: &Func) -> Vec<String> {
  func
    .params
    .iter()
    .filter_map(|p| p.stx.ident_name())
    .map(str::to_string)
    .collect()
}

fn free_names(node: &Node, params: &[String], out: &mut Vec<String>) {
  if let Syntax::IdExpr { name } = node.stx.as_ref() {
    if !params.contains(name) && !out.contains(name) {
      out.push(name.clone());
    }
  }
  for child in node.children() {
    free_names(child, params, out);
  }
}

fn callee_name(node: &Node) -> Option<&str> {
  let Syntax::CallExpr {
    callee,
    arguments,
    optional: false,
  } = node.stx.as_ref()
  else {
    return None;
  };
  if arguments
    .iter()
    .any(|a| matches!(a.stx.as_ref(), Syntax::SpreadElement { .. }))
  {
    return None;
  }
  match callee.stx.as_ref() {
    Syntax::IdExpr { name } => Some(name),
    _ => None,
  }
}

struct Discover {
  tree: ScopeTree<Binding>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  proxies: Vec<Proxy>,
}

impl Discover {
  /// Binds `name` in the current scope. A name declared twice in one scope is never treated as a
  /// proxy.
  fn bind(&mut self, name: &str, kind: DeclKind, binding: Binding) {
    let scope = self.scopes.current();
    let target = self.tree.declaration_scope(scope, kind);
    let binding = match self.tree.get(target, name) {
      Some(_) => None,
      None => binding,
    };
    self.tree.insert(scope, name, kind, binding);
  }

  fn add_proxy(&mut self, decl: NodeId, func_node: &Node) -> Option<usize> {
    let func = func_node.stx.func()?;
    let body = proxy_expression(func)?;
    self.proxies.push(Proxy {
      decl,
      func: func_node.id,
      params: param_names(func),
      body: body.clone(),
    });
    Some(self.proxies.len() - 1)
  }
}

impl Rewrite for Discover {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Syntax::VarDecl { kind, .. } = node.stx.as_ref() {
      self.kinds.push(*kind);
    }
    let proxy = match node.stx.as_ref() {
      Syntax::FuncDecl { .. } => self.add_proxy(node.id, node),
      Syntax::VarDeclarator {
        target,
        init: Some(init),
      } if matches!(target.stx.as_ref(), Syntax::IdPat { .. }) => self.add_proxy(node.id, init),
      _ => None,
    };
    let declared: Vec<(String, DeclKind, DeclSite)> =
      declared_names(node, self.kinds.last().copied())
        .into_iter()
        .filter_map(|(pat, kind, site)| Some((pat.stx.ident_name()?.to_string(), kind, site)))
        .collect();
    for (name, kind, _) in declared.iter().filter(|d| d.2 == DeclSite::Outer) {
      self.bind(name, *kind, proxy);
    }
    self.scopes.enter(&mut self.tree, node);
    for (name, kind, _) in declared.iter().filter(|d| d.2 == DeclSite::Inner) {
      self.bind(name, *kind, None);
    }
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

/// `let g = f;` where `f` is a proxy.
struct Alias {
  declarator: NodeId,
  name: String,
  /// The scope `name` is bound in.
  scope: ScopeId,
  proxy: usize,
}

/// Registers every alias of a proxy as another name for it.
struct Aliases<'a> {
  tree: &'a mut ScopeTree<Binding>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  found: Vec<Alias>,
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
        if let Some(Some(idx)) = self.tree.lookup(scope, name).copied() {
          let kind = self.kinds.last().copied().unwrap_or(VarDeclKind::Var).into();
          let bound_in = self.tree.insert(scope, alias, kind, Some(idx));
          self.found.push(Alias {
            declarator: node.id,
            name: alias.clone(),
            scope: bound_in,
            proxy: idx,
          });
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

fn substitute(node: &mut Node, params: &[String], args: &[Node]) {
  if let Syntax::IdExpr { name } = node.stx.as_ref() {
    if let Some(arg) = params.iter().position(|p| p == name).and_then(|i| args.get(i)) {
      *node = arg.duplicate();
    }
    return;
  }
  for child in node.children_mut() {
    substitute(child, params, args);
  }
}

struct Inline<'a> {
  tree: &'a mut ScopeTree<Binding>,
  scopes: ScopeStack,
  proxies: &'a [Proxy],
  cyclic: &'a HashSet<usize>,
  // Entered scopes created after discovery, whose bindings weren't recorded.
  unknown: HashSet<NodeId>,
  depth: usize,
  inlined: usize,
}

impl<'a> Inline<'a> {
  fn inlinable(&self, node: &Node) -> Option<usize> {
    if !self.unknown.is_empty() || self.depth >= MAX_EXPANSION_DEPTH {
      return None;
    }
    let name = callee_name(node)?;
    let scope = self.scopes.current();
    let idx = (*self.tree.lookup(scope, name)?)?;
    if self.cyclic.contains(&idx) {
      return None;
    }
    // The copied expression must see the same bindings at the call site as in the proxy.
    let proxy = &self.proxies[idx];
    let home = self.tree.scope_of(proxy.func)?;
    let mut free = Vec::new();
    free_names(&proxy.body, &proxy.params, &mut free);
    free
      .iter()
      .all(|n| self.tree.resolve(scope, n) == self.tree.resolve(home, n))
      .then_some(idx)
  }

  fn expand(&self, idx: usize, call: &Node) -> Node {
    let proxy = &self.proxies[idx];
    let mut body = proxy.body.duplicate();
    if let Syntax::CallExpr { arguments, .. } = call.stx.as_ref() {
      substitute(&mut body, &proxy.params, arguments);
    }
    body
  }
}

impl<'a> Rewrite for Inline<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Some(idx) = self.inlinable(node) {
      let mut replacement = self.expand(idx, node);
      self.inlined += 1;
      let outer = self.depth;
      while let Some(next) = self.inlinable(&replacement) {
        replacement = self.expand(next, &replacement);
        self.inlined += 1;
        self.depth += 1;
      }
      self.depth += 1;
      rewrite_children(&mut replacement, self)?;
      self.depth = outer;
      return Ok(Some(Replacement::One(replacement)));
    }
    if ScopeKind::of(&node.stx).is_some() && self.tree.scope_of(node.id).is_none() {
      self.unknown.insert(node.id);
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    self.unknown.remove(&node.id);
    Ok(None)
  }
}

/// Counts references to removal candidates, ignoring references from inside the candidates'
/// own declarations.
struct References<'a> {
  tree: &'a mut ScopeTree<Binding>,
  scopes: ScopeStack,
  skip: HashSet<NodeId>,
  skipping: usize,
  counts: Vec<usize>,
}

impl<'a> Rewrite for References<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if self.skip.contains(&node.id) {
      self.skipping += 1;
    }
    if self.skipping == 0 {
      if let Syntax::IdExpr { name } = node.stx.as_ref() {
        if let Some(Some(idx)) = self.tree.lookup(self.scopes.current(), name) {
          self.counts[*idx] += 1;
        }
      }
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    if self.skip.contains(&node.id) {
      self.skipping -= 1;
    }
    Ok(None)
  }
}

/// Counts the references to each alias left after inlining, reads and writes alike.
struct AliasReferences<'a> {
  tree: &'a mut ScopeTree<Binding>,
  scopes: ScopeStack,
  aliases: &'a [Alias],
  declarators: HashSet<NodeId>,
  skipping: usize,
  counts: Vec<usize>,
}

impl<'a> Rewrite for AliasReferences<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if self.declarators.contains(&node.id) {
      self.skipping += 1;
    }
    if self.skipping == 0 {
      if let Syntax::IdExpr { name } = node.stx.as_ref() {
        let bound_in = self.tree.resolve(self.scopes.current(), name);
        for (i, alias) in self.aliases.iter().enumerate() {
          if &alias.name == name && bound_in == Some(alias.scope) {
            self.counts[i] += 1;
          }
        }
      }
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    if self.declarators.contains(&node.id) {
      self.skipping -= 1;
    }
    Ok(None)
  }
}

pub struct ProxyPass {
  /// Delete proxies once nothing refers to them.
  pub remove: bool,
}

impl ProxyPass {
  fn unused(
    program: &mut Node,
    tree: &mut ScopeTree<Binding>,
    proxies: &[Proxy],
    mut candidates: Vec<usize>,
  ) -> DeobfuscateResult<Vec<usize>> {
    loop {
      let mut refs = References {
        scopes: ScopeStack::new(tree.root()),
        tree: &mut *tree,
        skip: candidates.iter().map(|i| proxies[*i].decl).collect(),
        skipping: 0,
        counts: vec![0; proxies.len()],
      };
      rewrite(program, &mut refs)?;
      let counts = refs.counts;
      let before = candidates.len();
      candidates.retain(|i| counts[*i] == 0);
      if candidates.len() == before {
        return Ok(candidates);
      }
    }
  }
}

impl Pass for ProxyPass {
  fn name(&self) -> &'static str {
    "proxy"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let tree = ScopeTree::new(program.id);
    let mut discover = Discover {
      scopes: ScopeStack::new(tree.root()),
      tree,
      kinds: Vec::new(),
      proxies: Vec::new(),
    };
    rewrite(program, &mut discover)?;
    let Discover {
      mut tree, proxies, ..
    } = discover;
    if proxies.is_empty() {
      return Ok(false);
    }

    let mut aliases = Aliases {
      scopes: ScopeStack::new(tree.root()),
      tree: &mut tree,
      kinds: Vec::new(),
      found: Vec::new(),
    };
    rewrite(program, &mut aliases)?;
    let aliased = aliases.found;

    let mut graph = Graph::new();
    for (idx, proxy) in proxies.iter().enumerate() {
      graph.add_node(idx);
      let Some(home) = tree.scope_of(proxy.func) else {
        continue;
      };
      let mut calls = Vec::new();
      collect_calls(&proxy.body, &mut calls);
      for name in calls {
        if let Some(Some(callee)) = tree.lookup(home, name) {
          graph.add_edge(idx, *callee);
        }
      }
    }
    let cyclic = graph.cyclic_nodes();
    debug!(
      proxies = proxies.len(),
      cyclic = cyclic.len(),
      "found proxy functions"
    );

    let mut inline = Inline {
      scopes: ScopeStack::new(tree.root()),
      tree: &mut tree,
      proxies: &proxies,
      cyclic: &cyclic,
      unknown: HashSet::new(),
      depth: 0,
      inlined: 0,
    };
    rewrite(program, &mut inline)?;
    let inlined = inline.inlined;

    // An alias is dropped only once every call through it has been inlined.
    let mut refs = AliasReferences {
      scopes: ScopeStack::new(tree.root()),
      tree: &mut tree,
      aliases: &aliased,
      declarators: aliased.iter().map(|a| a.declarator).collect(),
      skipping: 0,
      counts: vec![0; aliased.len()],
    };
    rewrite(program, &mut refs)?;
    let alias_refs = refs.counts;
    let mut removed_aliases = 0;
    for (alias, count) in aliased.iter().zip(alias_refs) {
      if count == 0 && !cyclic.contains(&alias.proxy) && remove(program, alias.declarator)? {
        removed_aliases += 1;
      }
    }

    let mut removed = 0;
    if self.remove {
      let candidates = (0..proxies.len()).filter(|i| !cyclic.contains(i)).collect();
      for idx in Self::unused(program, &mut tree, &proxies, candidates)? {
        if remove(program, proxies[idx].decl)? {
          removed += 1;
        }
      }
    }
    debug!(inlined, removed, "inlined proxy functions");
    Ok(removed_aliases + inlined + removed > 0)
  }
}

fn collect_calls<'a>(node: &'a Node, out: &mut Vec<&'a str>) {
  if let Some(name) = callee_name(node) {
    out.push(name);
  }
  for child in node.children() {
    collect_calls(child, out);
  }
}

#[cfg(test)]
mod tests {
  use super::proxy_expression;
  use syntax_js::ast::Syntax;
  use syntax_js::parse;
  use syntax_js::ParseOptions;

  fn is_proxy(source: &str) -> bool {
    let program = parse(source, ParseOptions::default()).unwrap();
    let Syntax::Program { body, .. } = program.stx.as_ref() else {
      unreachable!();
    };
    proxy_expression(body[0].stx.func().unwrap()).is_some()
  }

  #[test]
  fn proxy_shapes() {
    assert!(is_proxy("function f(a, b) { return a + b; }"));
    assert!(is_proxy("function f(a) { return g(a, 1); }"));
    assert!(is_proxy("function f(a) { return a[0]; }"));
    assert!(is_proxy("function f() { return 1; }"));
    assert!(!is_proxy("function f(a) { a(); return a; }"));
    assert!(!is_proxy("function f({ a }) { return a; }"));
    assert!(!is_proxy("function f(a) { return a.b; }"));
    assert!(!is_proxy("function f(a) { return a = 1; }"));
    assert!(!is_proxy("function f(a) { return g(function () {}); }"));
    assert!(!is_proxy("function f() { return this.x; }"));
    assert!(!is_proxy("async function f(a) { return g(a); }"));
  }
}

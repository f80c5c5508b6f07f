//! Lexical scopes, generic over what each pass records for a name.
//!
//! Scopes live in an arena and are addressed by [`ScopeId`]. A scope is keyed by the node that
//! creates it, so a pass can build the tree during one walk and find the same scopes again during
//! later walks over the same program.

use crate::err::DeobfuscateError;
use crate::err::DeobfuscateResult;
use ahash::HashMap;
use ahash::HashMapExt;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct ScopeId(u32);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScopeKind {
  Global,
  Function,
  Block,
}

impl ScopeKind {
  /// The kind of scope `stx` opens, if any. The program itself is the root and not included.
  pub fn of(stx: &Syntax) -> Option<ScopeKind> {
    match stx {
      Syntax::FuncDecl { .. } | Syntax::FuncExpr { .. } | Syntax::ArrowFunc { .. } => {
        Some(ScopeKind::Function)
      }
      Syntax::BlockStmt { .. }
      | Syntax::CatchClause { .. }
      | Syntax::ForStmt { .. }
      | Syntax::ForInStmt { .. }
      | Syntax::ForOfStmt { .. }
      | Syntax::SwitchStmt { .. }
      | Syntax::ClassExpr { .. } => Some(ScopeKind::Block),
      _ => None,
    }
  }
}

/// How a name was introduced. This decides which scope receives it and which redeclarations
/// are errors.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclKind {
  /// Hoisted to the nearest function or global scope.
  Var,
  /// Function declarations. Hoisted like `var` from the top level of a function or the program,
  /// otherwise bound in the enclosing block.
  Function,
  Let,
  Const,
  /// Parameters, catch bindings and function expression names; bound where declared.
  Param,
}

impl DeclKind {
  pub fn is_block_scoped(self) -> bool {
    matches!(self, DeclKind::Let | DeclKind::Const)
  }
}

impl From<VarDeclKind> for DeclKind {
  fn from(kind: VarDeclKind) -> Self {
    match kind {
      VarDeclKind::Var => DeclKind::Var,
      VarDeclKind::Let => DeclKind::Let,
      VarDeclKind::Const => DeclKind::Const,
    }
  }
}

struct Entry<B> {
  kind: DeclKind,
  binding: B,
}

struct ScopeData<B> {
  node: NodeId,
  kind: ScopeKind,
  parent: Option<ScopeId>,
  children: Vec<ScopeId>,
  // Declaration order, for deterministic iteration.
  names: Vec<String>,
  bindings: HashMap<String, Entry<B>>,
}

pub struct ScopeTree<B> {
  scopes: Vec<ScopeData<B>>,
  by_node: HashMap<NodeId, ScopeId>,
}

impl<B> ScopeTree<B> {
  pub fn new(root: NodeId) -> ScopeTree<B> {
    let mut tree = ScopeTree {
      scopes: Vec::new(),
      by_node: HashMap::new(),
    };
    tree.push(root, ScopeKind::Global, None);
    tree
  }

  fn push(&mut self, node: NodeId, kind: ScopeKind, parent: Option<ScopeId>) -> ScopeId {
    let id = ScopeId(self.scopes.len() as u32);
    self.scopes.push(ScopeData {
      node,
      kind,
      parent,
      children: Vec::new(),
      names: Vec::new(),
      bindings: HashMap::new(),
    });
    if let Some(parent) = parent {
      self.data_mut(parent).children.push(id);
    }
    self.by_node.insert(node, id);
    id
  }

  fn data(&self, id: ScopeId) -> &ScopeData<B> {
    &self.scopes[id.0 as usize]
  }

  fn data_mut(&mut self, id: ScopeId) -> &mut ScopeData<B> {
    &mut self.scopes[id.0 as usize]
  }

  pub fn root(&self) -> ScopeId {
    ScopeId(0)
  }

  /// The scope created by `node`, creating it as a child of `parent` the first time.
  pub fn enter(&mut self, parent: ScopeId, node: NodeId, kind: ScopeKind) -> ScopeId {
    match self.by_node.get(&node) {
      Some(id) => *id,
      None => self.push(node, kind, Some(parent)),
    }
  }

  pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
    self.by_node.get(&node).copied()
  }

  pub fn parent(&self, id: ScopeId) -> Option<ScopeId> {
    self.data(id).parent
  }

  pub fn children(&self, id: ScopeId) -> &[ScopeId] {
    &self.data(id).children
  }

  pub fn kind(&self, id: ScopeId) -> ScopeKind {
    self.data(id).kind
  }

  pub fn node(&self, id: ScopeId) -> NodeId {
    self.data(id).node
  }

  /// Whether `scope` is the body block of a function.
  fn is_function_body(&self, scope: ScopeId) -> bool {
    let data = self.data(scope);
    data.kind == ScopeKind::Block
      && data
        .parent
        .is_some_and(|parent| self.kind(parent) == ScopeKind::Function)
  }

  /// The scope a declaration made in `scope` is registered in.
  pub fn declaration_scope(&self, scope: ScopeId, kind: DeclKind) -> ScopeId {
    match kind {
      DeclKind::Var => self.hoisting_scope(scope),
      DeclKind::Function if self.is_function_body(scope) => self.hoisting_scope(scope),
      _ => scope,
    }
  }

  fn hoisting_scope(&self, scope: ScopeId) -> ScopeId {
    let mut current = scope;
    loop {
      let data = self.data(current);
      match (data.kind, data.parent) {
        (ScopeKind::Function | ScopeKind::Global, _) | (_, None) => return current,
        (_, Some(parent)) => current = parent,
      }
    }
  }

  fn set(&mut self, scope: ScopeId, name: &str, kind: DeclKind, binding: B) {
    let data = self.data_mut(scope);
    if data
      .bindings
      .insert(name.to_string(), Entry { kind, binding })
      .is_none()
    {
      data.names.push(name.to_string());
    }
  }

  /// Declares `name` following the language's hoisting and redeclaration rules. Redeclaring a
  /// non-block-scoped name keeps the existing binding, which is returned.
  pub fn declare(
    &mut self,
    scope: ScopeId,
    name: &str,
    kind: DeclKind,
    binding: B,
  ) -> DeobfuscateResult<&mut B> {
    let target = self.declaration_scope(scope, kind);
    let data = self.data_mut(target);
    if let Some(existing) = data.bindings.get(name) {
      if existing.kind.is_block_scoped() || kind.is_block_scoped() {
        return Err(DeobfuscateError::Redeclaration(name.to_string()));
      }
    } else {
      data.names.push(name.to_string());
    }
    let entry = data
      .bindings
      .entry(name.to_string())
      .or_insert(Entry { kind, binding });
    Ok(&mut entry.binding)
  }

  /// Like [`ScopeTree::declare`], but a redeclaration overwrites the earlier binding instead of
  /// failing. Returns the scope the name was registered in.
  pub fn insert(&mut self, scope: ScopeId, name: &str, kind: DeclKind, binding: B) -> ScopeId {
    let target = self.declaration_scope(scope, kind);
    self.set(target, name, kind, binding);
    target
  }

  pub fn get(&self, scope: ScopeId, name: &str) -> Option<&B> {
    self.data(scope).bindings.get(name).map(|e| &e.binding)
  }

  pub fn get_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut B> {
    self
      .data_mut(scope)
      .bindings
      .get_mut(name)
      .map(|e| &mut e.binding)
  }

  /// The nearest scope from `scope` outwards that binds `name`.
  pub fn resolve(&self, scope: ScopeId, name: &str) -> Option<ScopeId> {
    let mut current = Some(scope);
    while let Some(id) = current {
      let data = self.data(id);
      if data.bindings.contains_key(name) {
        return Some(id);
      }
      current = data.parent;
    }
    None
  }

  pub fn lookup(&self, scope: ScopeId, name: &str) -> Option<&B> {
    self
      .resolve(scope, name)
      .and_then(|found| self.get(found, name))
  }

  pub fn lookup_mut(&mut self, scope: ScopeId, name: &str) -> Option<&mut B> {
    let found = self.resolve(scope, name)?;
    self.get_mut(found, name)
  }

  /// Bindings of `scope` in declaration order.
  pub fn bindings(&self, scope: ScopeId) -> impl Iterator<Item = (&str, &B)> + '_ {
    let data = self.data(scope);
    data
      .names
      .iter()
      .filter_map(move |name| data.bindings.get(name).map(|e| (name.as_str(), &e.binding)))
  }

  /// Every scope, parents before their children, siblings in creation order.
  pub fn preorder(&self) -> Vec<ScopeId> {
    let mut out = Vec::with_capacity(self.scopes.len());
    let mut stack = vec![self.root()];
    while let Some(id) = stack.pop() {
      out.push(id);
      stack.extend(self.children(id).iter().rev().copied());
    }
    out
  }
}

/// The current scope during a [`crate::mutate::rewrite`] walk. Call [`ScopeStack::enter`] only
/// when the visited node is kept, since `leave` isn't called for a node replaced on entry.
pub struct ScopeStack {
  stack: Vec<ScopeId>,
}

impl ScopeStack {
  pub fn new(root: ScopeId) -> ScopeStack {
    ScopeStack { stack: vec![root] }
  }

  pub fn current(&self) -> ScopeId {
    self.stack.last().copied().unwrap_or(ScopeId(0))
  }

  pub fn enter<B>(&mut self, tree: &mut ScopeTree<B>, node: &Node) {
    if let Some(kind) = ScopeKind::of(&node.stx) {
      let id = tree.enter(self.current(), node.id, kind);
      self.stack.push(id);
    }
  }

  pub fn leave(&mut self, node: &Node) {
    if ScopeKind::of(&node.stx).is_some() && self.stack.len() > 1 {
      self.stack.pop();
    }
  }
}

/// Where a name declared by a node is bound.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DeclSite {
  /// The scope enclosing the node.
  Outer,
  /// The scope the node creates.
  Inner,
}

type Declared<'a> = Vec<(&'a Node, DeclKind, DeclSite)>;

fn push_bound<'a>(out: &mut Declared<'a>, pat: Option<&'a Node>, kind: DeclKind, site: DeclSite) {
  if let Some(pat) = pat {
    out.extend(bound_names(pat).into_iter().map(|n| (n, kind, site)));
  }
}

/// The `IdPat`s a node declares directly. `var_kind` is the kind of the `VarDecl` enclosing a
/// `VarDeclarator`.
pub fn declared_names(node: &Node, var_kind: Option<VarDeclKind>) -> Declared<'_> {
  let mut out = Vec::new();
  match node.stx.as_ref() {
    Syntax::FuncDecl { func } => {
      push_bound(&mut out, func.name.as_ref(), DeclKind::Function, DeclSite::Outer);
      for param in &func.params {
        push_bound(&mut out, Some(param), DeclKind::Param, DeclSite::Inner);
      }
    }
    Syntax::FuncExpr { func } | Syntax::ArrowFunc { func } => {
      push_bound(&mut out, func.name.as_ref(), DeclKind::Param, DeclSite::Inner);
      for param in &func.params {
        push_bound(&mut out, Some(param), DeclKind::Param, DeclSite::Inner);
      }
    }
    Syntax::VarDeclarator { target, .. } => {
      let kind = var_kind.unwrap_or(VarDeclKind::Var).into();
      push_bound(&mut out, Some(target), kind, DeclSite::Outer);
    }
    Syntax::ClassDecl { class } => {
      push_bound(&mut out, class.name.as_ref(), DeclKind::Let, DeclSite::Outer)
    }
    Syntax::ClassExpr { class } => {
      push_bound(&mut out, class.name.as_ref(), DeclKind::Param, DeclSite::Inner)
    }
    Syntax::CatchClause { param, .. } => {
      push_bound(&mut out, param.as_ref(), DeclKind::Param, DeclSite::Inner)
    }
    Syntax::ImportDecl {
      default, namespace, ..
    } => {
      push_bound(&mut out, default.as_ref(), DeclKind::Let, DeclSite::Outer);
      push_bound(&mut out, namespace.as_ref(), DeclKind::Let, DeclSite::Outer);
    }
    Syntax::ImportSpecifier { local, .. } => {
      push_bound(&mut out, Some(local), DeclKind::Let, DeclSite::Outer)
    }
    _ => {}
  };
  out
}

/// Every `IdPat` bound by a binding pattern, in source order.
pub fn bound_names(pat: &Node) -> Vec<&Node> {
  let mut out = Vec::new();
  collect_bound(pat, &mut out);
  out
}

fn collect_bound<'a>(pat: &'a Node, out: &mut Vec<&'a Node>) {
  match pat.stx.as_ref() {
    Syntax::IdPat { .. } => out.push(pat),
    Syntax::ArrPat { elements } => {
      for e in elements {
        collect_bound(e, out);
      }
    }
    Syntax::ObjPat { props } => {
      for p in props {
        collect_bound(p, out);
      }
    }
    Syntax::PatProp { target, .. } | Syntax::RestPat { target } => collect_bound(target, out),
    Syntax::AssignPat { target, .. } => collect_bound(target, out),
    _ => {}
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use syntax_js::ast::Node;

  fn node() -> NodeId {
    NodeId::fresh()
  }

  #[test]
  fn var_hoists_to_function_scope() {
    let mut tree = ScopeTree::<u32>::new(node());
    let func = tree.enter(tree.root(), node(), ScopeKind::Function);
    let block = tree.enter(func, node(), ScopeKind::Block);
    assert_eq!(tree.insert(block, "a", DeclKind::Var, 1), func);
    assert_eq!(tree.insert(block, "b", DeclKind::Let, 2), block);
    assert_eq!(tree.lookup(block, "a"), Some(&1));
    assert_eq!(tree.lookup(func, "b"), None);
    assert_eq!(tree.resolve(block, "a"), Some(func));
  }

  #[test]
  fn block_functions_stay_in_their_block() {
    let mut tree = ScopeTree::<u32>::new(node());
    let root = tree.root();
    let func = tree.enter(root, node(), ScopeKind::Function);
    let body = tree.enter(func, node(), ScopeKind::Block);
    let inner = tree.enter(body, node(), ScopeKind::Block);
    let top_block = tree.enter(root, node(), ScopeKind::Block);
    assert_eq!(tree.declaration_scope(root, DeclKind::Function), root);
    assert_eq!(tree.declaration_scope(body, DeclKind::Function), func);
    assert_eq!(tree.declaration_scope(inner, DeclKind::Function), inner);
    assert_eq!(tree.declaration_scope(top_block, DeclKind::Function), top_block);
    assert_eq!(tree.declaration_scope(inner, DeclKind::Var), func);
  }

  #[test]
  fn block_function_beside_outer_let() {
    let mut tree = ScopeTree::<u32>::new(node());
    let root = tree.root();
    let block = tree.enter(root, node(), ScopeKind::Block);
    tree.declare(root, "f", DeclKind::Let, 1).unwrap();
    assert_eq!(*tree.declare(block, "f", DeclKind::Function, 2).unwrap(), 2);
    assert_eq!(tree.lookup(root, "f"), Some(&1));
    assert_eq!(tree.lookup(block, "f"), Some(&2));
  }

  #[test]
  fn inner_bindings_shadow_outer_ones() {
    let mut tree = ScopeTree::<&str>::new(node());
    let block = tree.enter(tree.root(), node(), ScopeKind::Block);
    tree.insert(tree.root(), "x", DeclKind::Var, "outer");
    tree.insert(block, "x", DeclKind::Const, "inner");
    assert_eq!(tree.lookup(block, "x"), Some(&"inner"));
    assert_eq!(tree.lookup(tree.root(), "x"), Some(&"outer"));
    assert_eq!(tree.lookup(block, "y"), None);
  }

  #[test]
  fn redeclaration_rules() {
    let mut tree = ScopeTree::<Vec<u32>>::new(node());
    let root = tree.root();
    tree.declare(root, "a", DeclKind::Var, vec![1]).unwrap();
    tree.declare(root, "a", DeclKind::Var, vec![2]).unwrap().push(3);
    assert_eq!(tree.get(root, "a"), Some(&vec![1, 3]));
    assert!(matches!(
      tree.declare(root, "a", DeclKind::Let, vec![]),
      Err(DeobfuscateError::Redeclaration(name)) if name == "a"
    ));
    tree.declare(root, "b", DeclKind::Const, vec![]).unwrap();
    assert!(tree.declare(root, "b", DeclKind::Var, vec![]).is_err());
  }

  #[test]
  fn enter_reuses_scopes_by_node() {
    let mut tree = ScopeTree::<()>::new(node());
    let key = node();
    let first = tree.enter(tree.root(), key, ScopeKind::Block);
    let second = tree.enter(tree.root(), key, ScopeKind::Block);
    assert_eq!(first, second);
    assert_eq!(tree.scope_of(key), Some(first));
    assert_eq!(tree.children(tree.root()), &[first]);
  }

  #[test]
  fn preorder_visits_parents_first() {
    let mut tree = ScopeTree::<()>::new(node());
    let a = tree.enter(tree.root(), node(), ScopeKind::Function);
    let a1 = tree.enter(a, node(), ScopeKind::Block);
    let b = tree.enter(tree.root(), node(), ScopeKind::Block);
    assert_eq!(tree.preorder(), vec![tree.root(), a, a1, b]);
  }

  #[test]
  fn bound_names_of_patterns() {
    let src = "let [a, {b, c: [d = 1], ...e}, ...f] = x;";
    let p = syntax_js::parse(src, Default::default()).unwrap();
    let Syntax::Program { body, .. } = p.stx.as_ref() else {
      unreachable!();
    };
    let Syntax::VarDecl { declarators, .. } = body[0].stx.as_ref() else {
      unreachable!();
    };
    let Syntax::VarDeclarator { target, .. } = declarators[0].stx.as_ref() else {
      unreachable!();
    };
    let names: Vec<_> = bound_names(target)
      .into_iter()
      .filter_map(|n| n.stx.ident_name())
      .collect();
    assert_eq!(names, vec!["a", "b", "d", "e", "f"]);
  }

  #[test]
  fn scope_kinds_of_syntax() {
    let block = Node::synthetic(Syntax::BlockStmt { body: vec![] });
    assert_eq!(ScopeKind::of(&block.stx), Some(ScopeKind::Block));
    let id = Node::synthetic(Syntax::IdExpr { name: "a".into() });
    assert_eq!(ScopeKind::of(&id.stx), None);
  }
}

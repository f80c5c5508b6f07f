use crate::ast::node::Node;
use crate::ast::syntax::Class;
use crate::ast::syntax::Func;
use crate::ast::syntax::Syntax;

/// A position in a parent node that holds children. Tree edits need to know the kind of position,
/// since only a list can take zero or several replacement nodes.
#[derive(Debug)]
pub enum Slot<'a> {
  One(&'a Node),
  Opt(&'a Option<Node>),
  List(&'a Vec<Node>),
}

#[derive(Debug)]
pub enum SlotMut<'a> {
  One(&'a mut Node),
  Opt(&'a mut Option<Node>),
  List(&'a mut Vec<Node>),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SlotKind {
  One,
  Opt,
  List,
}

impl<'a> Slot<'a> {
  pub fn kind(&self) -> SlotKind {
    match self {
      Slot::One(_) => SlotKind::One,
      Slot::Opt(_) => SlotKind::Opt,
      Slot::List(_) => SlotKind::List,
    }
  }

  pub fn nodes(&self) -> Vec<&'a Node> {
    match *self {
      Slot::One(n) => vec![n],
      Slot::Opt(n) => n.iter().collect(),
      Slot::List(n) => n.iter().collect(),
    }
  }
}

macro_rules! push_slot {
  ($out:ident, $slot:ident, Nested, $field:ident, $method:ident) => {
    $out.extend($field.$method())
  };
  ($out:ident, $slot:ident, $kind:ident, $field:ident, $method:ident) => {
    $out.push($slot::$kind($field))
  };
}

// Children are listed in source order. The match is exhaustive, so adding a variant without
// listing it here is a compile error.
macro_rules! slot_table {
  ($($variant:ident { $($field:ident: $kind:ident),* })*) => {
    impl Syntax {
      pub fn slots(&self) -> Vec<Slot<'_>> {
        let mut out = Vec::new();
        match self {
          $(
            #[allow(unused_variables)]
            Syntax::$variant { $($field,)* .. } => {
              $(push_slot!(out, Slot, $kind, $field, slots);)*
            }
          )*
        }
        out
      }

      pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
        let mut out = Vec::new();
        match self {
          $(
            #[allow(unused_variables)]
            Syntax::$variant { $($field,)* .. } => {
              $(push_slot!(out, SlotMut, $kind, $field, slots_mut);)*
            }
          )*
        }
        out
      }
    }
  };
}

slot_table! {
  Program { body: List }
  BlockStmt { body: List }
  BreakStmt {}
  ClassDecl { class: Nested }
  ContinueStmt {}
  DebuggerStmt {}
  DoWhileStmt { body: One, test: One }
  EmptyStmt {}
  ExprStmt { expr: One }
  ForInStmt { left: One, right: One, body: One }
  ForOfStmt { left: One, right: One, body: One }
  ForStmt { init: Opt, test: Opt, update: Opt, body: One }
  FuncDecl { func: Nested }
  IfStmt { test: One, consequent: One, alternate: Opt }
  LabelStmt { body: One }
  ReturnStmt { value: Opt }
  SwitchStmt { discriminant: One, cases: List }
  SwitchCase { test: Opt, body: List }
  ThrowStmt { value: One }
  TryStmt { block: One, handler: Opt, finalizer: Opt }
  CatchClause { param: Opt, body: One }
  VarDecl { declarators: List }
  VarDeclarator { target: One, init: Opt }
  WhileStmt { test: One, body: One }
  WithStmt { object: One, body: One }
  ImportDecl { default: Opt, namespace: Opt, named: List }
  ImportSpecifier { local: One }
  ExportAll {}
  ExportDecl { decl: One }
  ExportDefaultExpr { value: One }
  ExportNamed { specifiers: List }
  ExportSpecifier { local: One }
  ArrHole {}
  ArrowFunc { func: Nested }
  AwaitExpr { argument: One }
  BinaryExpr { left: One, right: One }
  CallExpr { callee: One, arguments: List }
  ClassExpr { class: Nested }
  ClassMember { key: One, value: Opt }
  ComputedMemberExpr { object: One, member: One }
  CondExpr { test: One, consequent: One, alternate: One }
  FuncExpr { func: Nested }
  IdExpr {}
  IdPat {}
  ImportCall { argument: One }
  ImportMeta {}
  LitArr { elements: List }
  LitBigInt {}
  LitBool {}
  LitNull {}
  LitNum {}
  LitObj { props: List }
  LitRegex {}
  LitStr {}
  LitTemplate { exprs: List }
  MemberExpr { object: One }
  NewExpr { callee: One, arguments: List }
  NewTarget {}
  ObjProp { key: One, value: One }
  PropKey {}
  SpreadElement { argument: One }
  SuperExpr {}
  TaggedTemplate { tag: One, exprs: List }
  ThisExpr {}
  UnaryExpr { argument: One }
  UnaryPostfixExpr { argument: One }
  YieldExpr { argument: Opt }
  ArrPat { elements: List }
  AssignPat { target: One, default: One }
  ObjPat { props: List }
  PatProp { key: One, target: One }
  RestPat { target: One }
}

impl Func {
  pub fn slots(&self) -> Vec<Slot<'_>> {
    vec![
      Slot::Opt(&self.name),
      Slot::List(&self.params),
      Slot::One(&self.body),
    ]
  }

  pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
    vec![
      SlotMut::Opt(&mut self.name),
      SlotMut::List(&mut self.params),
      SlotMut::One(&mut self.body),
    ]
  }
}

impl Class {
  pub fn slots(&self) -> Vec<Slot<'_>> {
    vec![
      Slot::Opt(&self.name),
      Slot::Opt(&self.extends),
      Slot::List(&self.members),
    ]
  }

  pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
    vec![
      SlotMut::Opt(&mut self.name),
      SlotMut::Opt(&mut self.extends),
      SlotMut::List(&mut self.members),
    ]
  }
}

impl Node {
  pub fn slots(&self) -> Vec<Slot<'_>> {
    self.stx.slots()
  }

  pub fn slots_mut(&mut self) -> Vec<SlotMut<'_>> {
    self.stx.slots_mut()
  }

  /// Direct children in source order.
  pub fn children(&self) -> Vec<&Node> {
    self.slots().iter().flat_map(|s| s.nodes()).collect()
  }

  pub fn children_mut(&mut self) -> Vec<&mut Node> {
    let mut out = Vec::new();
    for slot in self.stx.slots_mut() {
      match slot {
        SlotMut::One(n) => out.push(n),
        SlotMut::Opt(n) => out.extend(n.as_mut()),
        SlotMut::List(n) => out.extend(n.iter_mut()),
      }
    }
    out
  }

  /// Find a node by id anywhere in this subtree, including this node.
  pub fn find(&self, id: crate::ast::node::NodeId) -> Option<&Node> {
    if self.id == id {
      return Some(self);
    }
    self.children().into_iter().find_map(|c| c.find(id))
  }

  pub fn find_mut(&mut self, id: crate::ast::node::NodeId) -> Option<&mut Node> {
    if self.id == id {
      return Some(self);
    }
    self
      .children_mut()
      .into_iter()
      .find_map(|c| c.find_mut(id))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::ast::syntax::VarDeclKind;

  fn id(name: &str) -> Node {
    Node::synthetic(Syntax::IdExpr {
      name: name.to_string(),
    })
  }

  #[test]
  fn test_children_in_source_order() {
    let node = Node::synthetic(Syntax::IfStmt {
      test: id("a"),
      consequent: id("b"),
      alternate: Some(id("c")),
    });
    let names: Vec<_> = node
      .children()
      .iter()
      .filter_map(|c| c.stx.ident_name())
      .collect();
    assert_eq!(names, vec!["a", "b", "c"]);
  }

  #[test]
  fn test_slot_kinds() {
    let decl = Node::synthetic(Syntax::VarDecl {
      kind: VarDeclKind::Var,
      declarators: vec![],
    });
    let kinds: Vec<_> = decl.slots().iter().map(|s| s.kind()).collect();
    assert_eq!(kinds, vec![SlotKind::List]);
  }

  #[test]
  fn test_find_mut() {
    let inner = id("x");
    let target = inner.id;
    let mut node = Node::synthetic(Syntax::ExprStmt { expr: inner });
    node.find_mut(target).unwrap().stx = Box::new(Syntax::ThisExpr {});
    assert!(matches!(node.children()[0].stx.as_ref(), Syntax::ThisExpr {}));
  }
}

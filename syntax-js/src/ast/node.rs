use crate::ast::syntax::Syntax;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::loc::Loc;
use derive_visitor::Drive;
use derive_visitor::DriveMut;
use derive_visitor::VisitorMut;
use std::fmt;
use std::fmt::Debug;
use std::fmt::Display;
use std::fmt::Formatter;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;

static NEXT_NODE_ID: AtomicU32 = AtomicU32::new(1);

/// Identity of a node. Every constructed node gets a fresh one, so two nodes compare equal by id
/// only if one was cloned from the other without going through [`Node::duplicate`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct NodeId(u32);

impl NodeId {
  pub fn fresh() -> NodeId {
    NodeId(NEXT_NODE_ID.fetch_add(1, Ordering::Relaxed))
  }
}

impl Display for NodeId {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

#[derive(Drive, DriveMut, Clone)]
pub struct Node {
  #[drive(skip)]
  pub id: NodeId,
  // A location is not a SourceRange; after some transformations, it's possible to create entirely new nodes that don't exist at all in the source code.
  #[drive(skip)]
  pub loc: Loc,
  pub stx: Box<Syntax>,
}

impl Node {
  pub fn new(loc: Loc, stx: Syntax) -> Node {
    Node {
      id: NodeId::fresh(),
      loc,
      stx: Box::new(stx),
    }
  }

  /// A node created by a transformation, with no source location.
  pub fn synthetic(stx: Syntax) -> Node {
    Node::new(Loc::default(), stx)
  }

  /// Deep copy of this subtree where every copied node has a fresh id, so the copy never aliases
  /// the original.
  pub fn duplicate(&self) -> Node {
    let mut copy = self.clone();
    copy.drive_mut(&mut Renumber);
    copy
  }

  /// Create an error at this node's location.
  pub fn error(&self, typ: SyntaxErrorType) -> SyntaxError {
    self.loc.error(typ, None)
  }
}

#[derive(VisitorMut)]
#[visitor(Node(enter))]
struct Renumber;

impl Renumber {
  fn enter_node(&mut self, node: &mut Node) {
    node.id = NodeId::fresh();
  }
}

impl Debug for Node {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    self.stx.fmt(f)
  }
}

#[cfg(test)]
mod tests {
  use crate::ast::Node;
  use crate::ast::Syntax;

  #[test]
  fn duplicate_assigns_fresh_ids() {
    let original = Node::synthetic(Syntax::ExprStmt {
      expr: Node::synthetic(Syntax::IdExpr { name: "a".into() }),
    });
    let copy = original.duplicate();
    assert_ne!(copy.id, original.id);
    let (Syntax::ExprStmt { expr: a }, Syntax::ExprStmt { expr: b }) =
      (original.stx.as_ref(), copy.stx.as_ref())
    else {
      panic!("expected expression statements");
    };
    assert_ne!(a.id, b.id);
    assert!(matches!(b.stx.as_ref(), Syntax::IdExpr { name } if name == "a"));
  }
}

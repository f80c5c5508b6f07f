//! In-place edits of the program tree.
//!
//! Every pass edits the tree through [`rewrite`]: a pre-order walk where a visitor may hand back a
//! [`Replacement`] for the node it's looking at. Where the replacement goes depends on the slot
//! that holds the node, as declared by the slot table in `syntax-js`: list slots splice, optional
//! slots can be cleared, and single-node slots only ever take exactly one node.

use crate::err::DeobfuscateError;
use crate::err::DeobfuscateResult;
use crate::err::StructuralError;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::SlotMut;
use syntax_js::ast::Syntax;

#[derive(Debug)]
pub enum Replacement {
  Remove,
  One(Node),
  /// Only valid for a node held in a list slot.
  Many(Vec<Node>),
}

/// Visitor for [`rewrite`].
///
/// When `enter` returns a replacement, the visited node is swapped out and neither its children
/// nor the replacement are visited. `leave` runs after the children, so returning a replacement
/// from it gives a post-order rewrite.
pub trait Rewrite {
  fn enter(&mut self, _node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    Ok(None)
  }

  fn leave(&mut self, _node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    Ok(None)
  }
}

/// Walks `root` and everything below it. The root itself can't be replaced.
pub fn rewrite<R: Rewrite + ?Sized>(root: &mut Node, r: &mut R) -> DeobfuscateResult<()> {
  match visit(root, SlotKind::One, r)? {
    None => Ok(()),
    Some(_) => Err(StructuralError::RootReplaced.into()),
  }
}

/// Walks the children of `node` without entering or leaving `node` itself.
pub fn rewrite_children<R: Rewrite + ?Sized>(node: &mut Node, r: &mut R) -> DeobfuscateResult<()> {
  for slot in node.slots_mut() {
    match slot {
      SlotMut::One(child) => {
        if let Some(rep) = visit(child, SlotKind::One, r)? {
          fill_single(child, rep)?;
        }
      }
      SlotMut::Opt(opt) => {
        let Some(child) = opt.as_mut() else {
          continue;
        };
        let id = child.id;
        match visit(child, SlotKind::Opt, r)? {
          None => {}
          Some(Replacement::Remove) => *opt = None,
          Some(Replacement::One(node)) => *opt = Some(node),
          Some(Replacement::Many(_)) => return Err(DeobfuscateError::UnsupportedReplacement(id)),
        }
      }
      SlotMut::List(list) => {
        let mut i = 0;
        while i < list.len() {
          match visit(&mut list[i], SlotKind::List, r)? {
            None => i += 1,
            Some(Replacement::Remove) => {
              list.remove(i);
            }
            Some(Replacement::One(node)) => {
              list[i] = node;
              i += 1;
            }
            Some(Replacement::Many(nodes)) => {
              let count = nodes.len();
              list.splice(i..=i, nodes);
              i += count;
            }
          }
        }
      }
    }
  }
  Ok(())
}

fn visit<R: Rewrite + ?Sized>(
  node: &mut Node,
  slot: SlotKind,
  r: &mut R,
) -> DeobfuscateResult<Option<Replacement>> {
  if let Some(rep) = r.enter(node, slot)? {
    return Ok(Some(rep));
  }
  rewrite_children(node, r)?;
  r.leave(node, slot)
}

fn fill_single(slot: &mut Node, rep: Replacement) -> DeobfuscateResult<()> {
  match rep {
    Replacement::One(node) => *slot = node,
    // A statement body can't be absent, but an empty statement is equivalent.
    Replacement::Remove if is_statement(&slot.stx) => {
      *slot = Node::synthetic(Syntax::EmptyStmt {});
    }
    Replacement::Remove => return Err(StructuralError::RequiredSlot(slot.id).into()),
    Replacement::Many(_) => return Err(DeobfuscateError::UnsupportedReplacement(slot.id)),
  };
  Ok(())
}

struct Target {
  id: NodeId,
  replacement: Option<Replacement>,
  found: bool,
}

impl Rewrite for Target {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if self.found || node.id != self.id {
      return Ok(None);
    }
    self.found = true;
    Ok(self.replacement.take())
  }
}

/// Replaces the node with id `target` anywhere below `root`. Returns whether it was found.
pub fn replace(
  root: &mut Node,
  target: NodeId,
  replacement: Replacement,
) -> DeobfuscateResult<bool> {
  if root.id == target {
    return Err(StructuralError::RootReplaced.into());
  }
  let mut t = Target {
    id: target,
    replacement: Some(replacement),
    found: false,
  };
  rewrite_children(root, &mut t)?;
  Ok(t.found)
}

pub fn remove(root: &mut Node, target: NodeId) -> DeobfuscateResult<bool> {
  replace(root, target, Replacement::Remove)
}

pub fn is_statement(stx: &Syntax) -> bool {
  matches!(
    stx,
    Syntax::BlockStmt { .. }
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
      | Syntax::ThrowStmt { .. }
      | Syntax::TryStmt { .. }
      | Syntax::VarDecl { .. }
      | Syntax::WhileStmt { .. }
      | Syntax::WithStmt { .. }
      | Syntax::ImportDecl { .. }
      | Syntax::ExportAll { .. }
      | Syntax::ExportDecl { .. }
      | Syntax::ExportDefaultExpr { .. }
      | Syntax::ExportNamed { .. }
  )
}

#[cfg(test)]
mod tests {
  use super::*;
  use print_js::print;
  use print_js::PrintOptions;
  use syntax_js::parse;
  use syntax_js::ParseOptions;

  fn program(source: &str) -> Node {
    parse(source, ParseOptions::default()).unwrap()
  }

  fn compact(node: &Node) -> String {
    print(node, PrintOptions { pretty: false })
  }

  fn body(node: &Node) -> &Vec<Node> {
    match node.stx.as_ref() {
      Syntax::Program { body, .. } | Syntax::BlockStmt { body } => body,
      _ => panic!("expected a statement list"),
    }
  }

  #[test]
  fn splices_into_list_slots() {
    let mut p = program("a(); b(); c();");
    let target = body(&p)[1].id;
    let nodes = program("x(); y();");
    let Syntax::Program { body: new, .. } = *nodes.stx else {
      unreachable!();
    };
    assert!(replace(&mut p, target, Replacement::Many(new)).unwrap());
    assert_eq!(compact(&p), "a();x();y();c();");
  }

  #[test]
  fn removes_from_list_and_optional_slots() {
    let mut p = program("a(); if (x) y(); else z();");
    let Syntax::IfStmt { alternate, .. } = body(&p)[1].stx.as_ref() else {
      unreachable!();
    };
    let alt = alternate.as_ref().unwrap().id;
    assert!(remove(&mut p, alt).unwrap());
    let first = body(&p)[0].id;
    assert!(remove(&mut p, first).unwrap());
    assert_eq!(compact(&p), "if(x)y();");
  }

  #[test]
  fn removed_statement_body_becomes_empty() {
    let mut p = program("while (x) f();");
    let Syntax::WhileStmt { body: stmt, .. } = body(&p)[0].stx.as_ref() else {
      unreachable!();
    };
    let id = stmt.id;
    assert!(remove(&mut p, id).unwrap());
    assert_eq!(compact(&p), "while(x);");
  }

  #[test]
  fn single_slots_reject_lists_and_removal_of_expressions() {
    let mut p = program("f(a + b);");
    let Syntax::ExprStmt { expr } = body(&p)[0].stx.as_ref() else {
      unreachable!();
    };
    let id = expr.id;
    let err = replace(&mut p, id, Replacement::Many(vec![])).unwrap_err();
    assert!(matches!(err, DeobfuscateError::UnsupportedReplacement(n) if n == id));
    let err = remove(&mut p, id).unwrap_err();
    assert!(matches!(
      err,
      DeobfuscateError::Structural(StructuralError::RequiredSlot(_))
    ));
  }

  #[test]
  fn missing_target_is_reported() {
    let mut p = program("a();");
    let other = program("b();");
    assert!(!remove(&mut p, body(&other)[0].id).unwrap());
    let root = p.id;
    assert!(matches!(
      remove(&mut p, root),
      Err(DeobfuscateError::Structural(StructuralError::RootReplaced))
    ));
  }
}

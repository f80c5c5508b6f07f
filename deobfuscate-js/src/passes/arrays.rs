//! Replaces constant reads from literal arrays, like `_0x12[3]`, with the element itself.
//!
//! Discovery and substitution alternate until no new literal array shows up, since substituting
//! into an array literal can turn it into a literal array too.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::mutate::remove;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use crate::scope::declared_names;
use crate::scope::DeclKind;
use crate::scope::DeclSite;
use crate::scope::ScopeStack;
use crate::scope::ScopeTree;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;
use syntax_js::operator::OperatorName;
use tracing::debug;

struct LitArray {
  decl: NodeId,
  elements: Vec<Node>,
  substitutions: usize,
  /// Written through an element, reassigned, used as a method receiver or passed around, so its
  /// elements aren't constant.
  written: bool,
}

type Binding = Option<usize>;

/// A literal, or an operator tree over literals that evaluates without side effects.
fn is_constant_element(node: &Node) -> bool {
  match node.stx.as_ref() {
    Syntax::LitRegex { .. } => false,
    Syntax::ArrHole {} => true,
    Syntax::UnaryExpr { operator, argument } => {
      matches!(
        operator,
        OperatorName::UnaryNegation
          | OperatorName::UnaryPlus
          | OperatorName::LogicalNot
          | OperatorName::BitwiseNot
          | OperatorName::Typeof
          | OperatorName::Void
      ) && is_constant_element(argument)
        && !matches!(argument.stx.as_ref(), Syntax::ArrHole {})
    }
    Syntax::BinaryExpr {
      operator,
      left,
      right,
    } => {
      !operator.is_assignment()
        && !matches!(operator, OperatorName::In | OperatorName::Instanceof)
        && [left, right]
          .iter()
          .all(|n| is_constant_element(n) && !matches!(n.stx.as_ref(), Syntax::ArrHole {}))
    }
    stx => stx.is_literal(),
  }
}

fn literal_elements(init: &Node) -> Option<&Vec<Node>> {
  match init.stx.as_ref() {
    Syntax::LitArr { elements } if elements.iter().all(is_constant_element) => Some(elements),
    _ => None,
  }
}

/// Adds the nodes written by an assignment whose left side is `node`.
fn mark_targets(node: &Node, out: &mut HashSet<NodeId>) {
  match node.stx.as_ref() {
    Syntax::IdExpr { .. } | Syntax::MemberExpr { .. } | Syntax::ComputedMemberExpr { .. } => {
      out.insert(node.id);
    }
    Syntax::LitArr { elements } | Syntax::ArrPat { elements } => {
      for e in elements {
        mark_targets(e, out);
      }
    }
    Syntax::LitObj { props } | Syntax::ObjPat { props } => {
      for p in props {
        mark_targets(p, out);
      }
    }
    Syntax::ObjProp { value: target, .. }
    | Syntax::PatProp { target, .. }
    | Syntax::RestPat { target }
    | Syntax::AssignPat { target, .. }
    | Syntax::SpreadElement { argument: target } => mark_targets(target, out),
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      ..
    } => mark_targets(left, out),
    _ => {}
  }
}

/// Collects the targets written by `node`, if it's an assignment, update, `delete` or a
/// `for`-`in`/`of` head.
fn written_by(node: &Node, out: &mut HashSet<NodeId>) {
  match node.stx.as_ref() {
    Syntax::BinaryExpr { operator, left, .. } if operator.is_assignment() => {
      mark_targets(left, out)
    }
    Syntax::UnaryExpr {
      operator:
        OperatorName::PrefixIncrement | OperatorName::PrefixDecrement | OperatorName::Delete,
      argument,
    }
    | Syntax::UnaryPostfixExpr { argument, .. } => mark_targets(argument, out),
    Syntax::ForInStmt { left, .. } | Syntax::ForOfStmt { left, .. } => mark_targets(left, out),
    _ => {}
  }
}

fn member_object(node: &Node) -> Option<&Node> {
  match node.stx.as_ref() {
    Syntax::MemberExpr { object, .. } | Syntax::ComputedMemberExpr { object, .. } => Some(object),
    _ => None,
  }
}

struct Discover<'a> {
  tree: ScopeTree<Binding>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  arrays: &'a mut Vec<LitArray>,
  known: &'a mut HashMap<NodeId, usize>,
  found: bool,
}

impl<'a> Discover<'a> {
  fn bind(&mut self, name: &str, kind: DeclKind, binding: Binding) {
    let scope = self.scopes.current();
    let target = self.tree.declaration_scope(scope, kind);
    let binding = match self.tree.get(target, name) {
      Some(_) => None,
      None => binding,
    };
    self.tree.insert(scope, name, kind, binding);
  }

  fn record(&mut self, decl: NodeId, elements: &[Node]) -> usize {
    match self.known.get(&decl) {
      Some(&idx) => {
        self.arrays[idx].elements = elements.to_vec();
        idx
      }
      None => {
        let idx = self.arrays.len();
        self.arrays.push(LitArray {
          decl,
          elements: elements.to_vec(),
          substitutions: 0,
          written: false,
        });
        self.known.insert(decl, idx);
        self.found = true;
        idx
      }
    }
  }
}

impl<'a> Rewrite for Discover<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Syntax::VarDecl { kind, .. } = node.stx.as_ref() {
      self.kinds.push(*kind);
    }
    let array = match node.stx.as_ref() {
      Syntax::VarDeclarator {
        target,
        init: Some(init),
      } if matches!(target.stx.as_ref(), Syntax::IdPat { .. }) => literal_elements(init),
      _ => None,
    };
    let array = array.map(|elements| self.record(node.id, elements));
    let declared: Vec<(String, DeclKind, DeclSite)> =
      declared_names(node, self.kinds.last().copied())
        .into_iter()
        .filter_map(|(pat, kind, site)| Some((pat.stx.ident_name()?.to_string(), kind, site)))
        .collect();
    for (name, kind, _) in declared.iter().filter(|d| d.2 == DeclSite::Outer) {
      self.bind(name, *kind, array);
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

/// What a walk over references does with each use of a literal array.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
  /// Flag arrays that are written to.
  Writes,
  /// Replace constant element reads.
  Substitute,
  /// Count every remaining reference.
  Count,
}

struct Uses<'a> {
  tree: &'a mut ScopeTree<Binding>,
  scopes: ScopeStack,
  arrays: &'a mut [LitArray],
  mode: Mode,
  targets: HashSet<NodeId>,
  /// References that are the object of a member read.
  reads: HashSet<NodeId>,
  /// Objects of called members, like `a` in `a.reverse()`.
  receivers: HashSet<NodeId>,
  counts: Vec<usize>,
  substituted: usize,
}

impl<'a> Uses<'a> {
  fn resolve(&self, name: &str) -> Option<usize> {
    *self.tree.lookup(self.scopes.current(), name)?
  }

  /// The element read by `node`, if it's a constant in-range read from a literal array.
  fn element_read(&self, node: &Node) -> Option<(usize, Node)> {
    let Syntax::ComputedMemberExpr {
      object,
      member,
      optional: false,
    } = node.stx.as_ref()
    else {
      return None;
    };
    let Syntax::IdExpr { name } = object.stx.as_ref() else {
      return None;
    };
    let Syntax::LitNum { value } = member.stx.as_ref() else {
      return None;
    };
    if self.targets.contains(&node.id) || value.fract() != 0.0 || *value < 0.0 {
      return None;
    }
    let idx = self.resolve(name)?;
    let array = &self.arrays[idx];
    if array.written {
      return None;
    }
    let element = array.elements.get(*value as usize)?;
    if let Syntax::ArrHole {} = element.stx.as_ref() {
      return None;
    }
    Some((idx, element.duplicate()))
  }
}

impl<'a> Rewrite for Uses<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    written_by(node, &mut self.targets);
    match self.mode {
      Mode::Substitute => {
        if let Some((idx, element)) = self.element_read(node) {
          self.arrays[idx].substitutions += 1;
          self.substituted += 1;
          return Ok(Some(Replacement::One(element)));
        }
      }
      Mode::Writes => {
        if let Syntax::CallExpr { callee, .. } = node.stx.as_ref() {
          if let Some(object) = member_object(callee) {
            self.receivers.insert(object.id);
          }
        } else if let Some(object) = member_object(node) {
          if !self.receivers.contains(&object.id) {
            self.reads.insert(object.id);
          }
        }
        // Any use other than a member read may change the array.
        let written = match node.stx.as_ref() {
          Syntax::IdExpr { name }
            if self.targets.contains(&node.id) || !self.reads.contains(&node.id) =>
          {
            self.resolve(name)
          }
          Syntax::ComputedMemberExpr { object, .. } | Syntax::MemberExpr { object, .. }
            if self.targets.contains(&node.id) =>
          {
            object.stx.ident_name().and_then(|n| self.resolve(n))
          }
          _ => None,
        };
        if let Some(idx) = written {
          self.arrays[idx].written = true;
        }
      }
      Mode::Count => {
        if let Syntax::IdExpr { name } = node.stx.as_ref() {
          if let Some(idx) = self.resolve(name) {
            self.counts[idx] += 1;
          }
        }
      }
    };
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    Ok(None)
  }
}

pub struct ArraysPass {
  /// Delete unpacked arrays once nothing refers to them.
  pub remove: bool,
}

impl ArraysPass {
  fn discover(
    program: &mut Node,
    arrays: &mut Vec<LitArray>,
    known: &mut HashMap<NodeId, usize>,
  ) -> DeobfuscateResult<(ScopeTree<Binding>, bool)> {
    let tree = ScopeTree::new(program.id);
    let mut discover = Discover {
      scopes: ScopeStack::new(tree.root()),
      tree,
      kinds: Vec::new(),
      arrays,
      known,
      found: false,
    };
    rewrite(program, &mut discover)?;
    Ok((discover.tree, discover.found))
  }

  fn uses(
    program: &mut Node,
    tree: &mut ScopeTree<Binding>,
    arrays: &mut [LitArray],
    mode: Mode,
  ) -> DeobfuscateResult<(usize, Vec<usize>)> {
    let mut uses = Uses {
      scopes: ScopeStack::new(tree.root()),
      counts: vec![0; arrays.len()],
      tree,
      arrays,
      mode,
      targets: HashSet::new(),
      reads: HashSet::new(),
      receivers: HashSet::new(),
      substituted: 0,
    };
    rewrite(program, &mut uses)?;
    Ok((uses.substituted, uses.counts))
  }
}

impl Pass for ArraysPass {
  fn name(&self) -> &'static str {
    "arrays"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut arrays = Vec::new();
    let mut known = HashMap::new();
    let mut substituted = 0;
    loop {
      let (mut tree, found) = Self::discover(program, &mut arrays, &mut known)?;
      if !found {
        break;
      }
      Self::uses(program, &mut tree, &mut arrays, Mode::Writes)?;
      substituted += Self::uses(program, &mut tree, &mut arrays, Mode::Substitute)?.0;
    }

    let mut removed = 0;
    if self.remove && arrays.iter().any(|a| a.substitutions > 0) {
      let (mut tree, _) = Self::discover(program, &mut arrays, &mut known)?;
      let (_, counts) = Self::uses(program, &mut tree, &mut arrays, Mode::Count)?;
      for (idx, array) in arrays.iter().enumerate() {
        if array.substitutions > 0 && counts[idx] == 0 && remove(program, array.decl)? {
          removed += 1;
        }
      }
    }
    debug!(
      arrays = arrays.len(),
      substituted, removed, "unpacked literal arrays"
    );
    Ok(substituted + removed > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::is_constant_element;
  use syntax_js::parse_expression;

  #[test]
  fn constant_elements() {
    for src in ["1", "'a'", "-1", "!0", "1 + 2 * 3", "null", "typeof 1"] {
      assert!(is_constant_element(&parse_expression(src).unwrap()), "{src}");
    }
    for src in ["a", "f()", "/x/", "[1]", "a = 1", "-a"] {
      assert!(!is_constant_element(&parse_expression(src).unwrap()), "{src}");
    }
  }
}

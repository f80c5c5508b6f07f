//! Renames obfuscated identifiers such as `_0x3f2a` to readable words.
//!
//! Every binding is resolved first, in two walks over the program: declarations (with hoisting),
//! then references. Names already in use anywhere, plus every unresolved global, are reserved, and
//! each obfuscated binding takes the next word from a seeded shuffle of the bundled word list.
//! Since no word is handed out twice, renamed bindings never collide with each other or with
//! anything that was already there.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateError;
use crate::err::DeobfuscateResult;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use crate::scope::declared_names;
use crate::scope::DeclKind;
use crate::scope::DeclSite;
use crate::scope::ScopeId;
use crate::scope::ScopeStack;
use crate::scope::ScopeTree;
use ahash::HashMap;
use ahash::HashMapExt;
use ahash::HashSet;
use ahash::HashSetExt;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::ser::SerializeMap;
use serde::Serialize;
use serde::Serializer;
use std::collections::VecDeque;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;
use syntax_js::token::RESERVED_WORDS;
use tracing::debug;

const WORDS: &str = include_str!("names.txt");

/// Names that are never handed out, on top of every reserved word.
const ALWAYS_RESERVED: &[&str] = &["if", "do", "in", "var", "let", "try", "for"];

pub const OBFUSCATED_PREFIX: &str = "_0x";

pub fn is_obfuscated(name: &str) -> bool {
  name.starts_with(OBFUSCATED_PREFIX)
}

/// The names given to renamed bindings of one scope, with one child per nested scope that has
/// renames somewhere below it.
///
/// Serializes as `{"children": [...], "<new>": "<old>", ...}`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NameMapping {
  /// `(new, old)` pairs in the order the names were assigned.
  pub renamed: Vec<(String, String)>,
  pub children: Vec<NameMapping>,
}

impl NameMapping {
  /// Number of renames in this scope and all nested ones.
  pub fn len(&self) -> usize {
    self.renamed.len() + self.children.iter().map(NameMapping::len).sum::<usize>()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// The original name of `new`, searching this scope and then nested ones.
  pub fn original(&self, new: &str) -> Option<&str> {
    self
      .renamed
      .iter()
      .find(|(n, _)| n == new)
      .map(|(_, old)| old.as_str())
      .or_else(|| self.children.iter().find_map(|c| c.original(new)))
  }

  pub fn to_json(&self) -> serde_json::Result<String> {
    serde_json::to_string_pretty(self)
  }
}

impl Serialize for NameMapping {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.renamed.len() + 1))?;
    map.serialize_entry("children", &self.children)?;
    for (new, old) in &self.renamed {
      map.serialize_entry(new, old)?;
    }
    map.end()
  }
}

struct Variable {
  name: String,
  /// Every `IdPat` and `IdExpr` node of the binding.
  sites: Vec<NodeId>,
}

struct Declarations<'a> {
  tree: ScopeTree<usize>,
  scopes: ScopeStack,
  kinds: Vec<VarDeclKind>,
  vars: &'a mut Vec<Variable>,
  /// Names declared by `export` declarations, which are part of the module's interface.
  exported: HashSet<String>,
}

impl<'a> Declarations<'a> {
  fn declare(&mut self, site: NodeId, name: &str, kind: DeclKind) -> DeobfuscateResult<()> {
    let next = self.vars.len();
    let idx = *self
      .tree
      .declare(self.scopes.current(), name, kind, next)?;
    if idx == next {
      self.vars.push(Variable {
        name: name.to_string(),
        sites: Vec::new(),
      });
    }
    self.vars[idx].sites.push(site);
    Ok(())
  }
}

impl<'a> Rewrite for Declarations<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    match node.stx.as_ref() {
      Syntax::VarDecl { kind, .. } => self.kinds.push(*kind),
      Syntax::ExportDecl { decl } => {
        let pats = match decl.stx.as_ref() {
          Syntax::VarDecl { declarators, .. } => declarators
            .iter()
            .flat_map(|d| declared_names(d, None))
            .collect(),
          _ => declared_names(decl, None),
        };
        self.exported.extend(
          pats
            .into_iter()
            .filter(|(_, _, site)| *site == DeclSite::Outer)
            .filter_map(|(pat, ..)| pat.stx.ident_name().map(str::to_string)),
        );
      }
      _ => {}
    };
    let declared: Vec<(NodeId, String, DeclKind, DeclSite)> =
      declared_names(node, self.kinds.last().copied())
        .into_iter()
        .filter_map(|(pat, kind, site)| {
          Some((pat.id, pat.stx.ident_name()?.to_string(), kind, site))
        })
        .collect();
    for (id, name, kind, _) in declared.iter().filter(|d| d.3 == DeclSite::Outer) {
      self.declare(*id, name, *kind)?;
    }
    self.scopes.enter(&mut self.tree, node);
    for (id, name, kind, _) in declared.iter().filter(|d| d.3 == DeclSite::Inner) {
      self.declare(*id, name, *kind)?;
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

struct References<'a> {
  tree: &'a mut ScopeTree<usize>,
  scopes: ScopeStack,
  vars: &'a mut [Variable],
  unresolved: HashSet<String>,
}

impl<'a> Rewrite for References<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Syntax::IdExpr { name } = node.stx.as_ref() {
      match self.tree.lookup(self.scopes.current(), name) {
        Some(&idx) => self.vars[idx].sites.push(node.id),
        None => {
          self.unresolved.insert(name.clone());
        }
      }
    }
    self.scopes.enter(self.tree, node);
    Ok(None)
  }

  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    self.scopes.leave(node);
    Ok(None)
  }
}

struct Apply<'a> {
  names: &'a HashMap<NodeId, String>,
}

impl<'a> Rewrite for Apply<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    if let Some(new) = self.names.get(&node.id) {
      if let Syntax::IdExpr { name } | Syntax::IdPat { name } = node.stx.as_mut() {
        name.clone_from(new);
      }
    }
    Ok(None)
  }
}

/// Hands out candidate names in a seeded random order, skipping reserved ones.
pub struct NamePool {
  candidates: Vec<String>,
}

impl NamePool {
  pub fn new<'a>(
    words: impl IntoIterator<Item = &'a str>,
    reserved: &HashSet<String>,
    seed: u64,
  ) -> NamePool {
    let mut seen = HashSet::new();
    let mut candidates: Vec<String> = words
      .into_iter()
      .filter(|w| !reserved.contains(*w) && !RESERVED_WORDS.contains(w) && seen.insert(*w))
      .map(str::to_string)
      .collect();
    candidates.shuffle(&mut StdRng::seed_from_u64(seed));
    // Taken from the back.
    candidates.reverse();
    NamePool { candidates }
  }

  pub fn bundled(reserved: &HashSet<String>, seed: u64) -> NamePool {
    NamePool::new(WORDS.split_whitespace(), reserved, seed)
  }

  pub fn next(&mut self) -> DeobfuscateResult<String> {
    self.candidates.pop().ok_or(DeobfuscateError::Exhaustion)
  }
}

/// Builds the mapping for `scope`, dropping nested scopes without any renames.
fn mapping(
  tree: &ScopeTree<usize>,
  scope: ScopeId,
  renamed: &mut HashMap<ScopeId, Vec<(String, String)>>,
) -> NameMapping {
  let children = tree
    .children(scope)
    .iter()
    .map(|&child| mapping(tree, child, renamed))
    .filter(|child| !child.is_empty())
    .collect();
  NameMapping {
    renamed: renamed.remove(&scope).unwrap_or_default(),
    children,
  }
}

/// Renames every obfuscated binding of `program` in place, drawing names from `pool_for`, which
/// is given the set of names that must not be used.
pub fn rename_with(
  program: &mut Node,
  pool_for: impl FnOnce(&HashSet<String>) -> NamePool,
) -> DeobfuscateResult<NameMapping> {
  let mut vars = Vec::new();
  let tree = ScopeTree::new(program.id);
  let mut declarations = Declarations {
    scopes: ScopeStack::new(tree.root()),
    tree,
    kinds: Vec::new(),
    vars: &mut vars,
    exported: HashSet::new(),
  };
  rewrite(program, &mut declarations)?;
  let exported = declarations.exported;
  let mut tree = declarations.tree;

  let mut references = References {
    scopes: ScopeStack::new(tree.root()),
    tree: &mut tree,
    vars: &mut vars,
    unresolved: HashSet::new(),
  };
  rewrite(program, &mut references)?;
  let mut reserved = references.unresolved;
  reserved.extend(ALWAYS_RESERVED.iter().map(|w| w.to_string()));
  reserved.extend(
    vars
      .iter()
      .filter(|v| !is_obfuscated(&v.name))
      .map(|v| v.name.clone()),
  );
  let mut pool = pool_for(&reserved);

  // Breadth first, so outer scopes get the earlier names.
  let mut names = HashMap::new();
  let mut renamed: HashMap<ScopeId, Vec<(String, String)>> = HashMap::new();
  let mut queue = VecDeque::from([tree.root()]);
  while let Some(scope) = queue.pop_front() {
    for (name, &idx) in tree.bindings(scope) {
      if !is_obfuscated(name) || (scope == tree.root() && exported.contains(name)) {
        continue;
      }
      let new = pool.next()?;
      for site in &vars[idx].sites {
        names.insert(*site, new.clone());
      }
      renamed
        .entry(scope)
        .or_default()
        .push((new, name.to_string()));
    }
    queue.extend(tree.children(scope).iter().copied());
  }
  rewrite(program, &mut Apply { names: &names })?;
  Ok(mapping(&tree, tree.root(), &mut renamed))
}

pub struct RenamePass {
  pub seed: u64,
}

impl Pass for RenamePass {
  fn name(&self) -> &'static str {
    "rename"
  }

  fn run(&mut self, cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let seed = self.seed;
    let mapping = rename_with(program, |reserved| NamePool::bundled(reserved, seed))?;
    let renamed = mapping.len();
    debug!(renamed, "renamed obfuscated identifiers");
    cx.name_mapping = Some(mapping);
    Ok(renamed > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::rename_with;
  use super::NameMapping;
  use super::NamePool;
  use crate::err::DeobfuscateError;
  use ahash::HashSet;
  use ahash::HashSetExt;
  use print_js::print;
  use print_js::PrintOptions;
  use syntax_js::parse;
  use syntax_js::ParseOptions;

  fn rename(src: &str, words: &[&'static str]) -> Result<(String, NameMapping), DeobfuscateError> {
    let mut program = parse(src, ParseOptions::default()).unwrap();
    let mapping = rename_with(&mut program, |reserved| {
      NamePool::new(words.iter().copied(), reserved, 0)
    })?;
    Ok((print(&program, PrintOptions { pretty: false }), mapping))
  }

  #[test]
  fn renames_declarations_and_references() {
    let (code, mapping) = rename(
      "var _0x1 = 1; function _0x2(_0x3) { return _0x3 + _0x1; }",
      &["red", "green", "blue"],
    )
    .unwrap();
    assert_eq!(mapping.len(), 3);
    let global = |old: &str| {
      mapping
        .renamed
        .iter()
        .find(|(_, o)| o == old)
        .map(|(n, _)| n.clone())
        .unwrap()
    };
    let param = &mapping.children[0].renamed[0];
    assert_eq!(param.1, "_0x3");
    assert_eq!(
      code,
      format!(
        "var {a}=1;function {f}({p}){{return {p}+{a};}}",
        a = global("_0x1"),
        f = global("_0x2"),
        p = param.0,
      )
    );
  }

  #[test]
  fn keeps_reserved_and_existing_names() {
    let (code, _) = rename("var red = 1; var _0x1 = green; _0x1(red);", &[
      "red", "green", "if", "blue",
    ])
    .unwrap();
    assert_eq!(code, "var red=1;var blue=green;blue(red);");
  }

  #[test]
  fn shadowed_names_rename_separately() {
    let (code, _) = rename(
      "let _0x1 = 1; { let _0x1 = 2; f(_0x1); } f(_0x1);",
      &["outer", "inner"],
    )
    .unwrap();
    assert!(code == "let outer=1;{let inner=2;f(inner);}f(outer);"
      || code == "let inner=1;{let outer=2;f(outer);}f(inner);");
  }

  #[test]
  fn block_functions_are_block_scoped() {
    let (code, _) = rename("let f = 1; { function f() {} } log(f);", &["a"]).unwrap();
    assert_eq!(code, "let f=1;{function f(){}}log(f);");

    let (code, mapping) = rename(
      "let _0x1 = 1; { function _0x1() {} _0x1(); } log(_0x1);",
      &["outer", "inner"],
    )
    .unwrap();
    assert_eq!(mapping.len(), 2);
    assert!(code == "let outer=1;{function inner(){}inner();}log(outer);"
      || code == "let inner=1;{function outer(){}outer();}log(inner);");
  }

  #[test]
  fn exhaustion_is_fatal() {
    let err = rename("var _0x1, _0x2;", &["only"]).unwrap_err();
    assert!(matches!(err, DeobfuscateError::Exhaustion));
  }

  #[test]
  fn redeclaring_block_scoped_names_is_fatal() {
    let err = rename("let _0x1; var _0x1;", &["a", "b"]).unwrap_err();
    assert_eq!(err.to_string(), "Identifier _0x1 has already been declared");
  }

  #[test]
  fn mapping_serializes_new_to_old() {
    let mapping = NameMapping {
      renamed: vec![("apple".to_string(), "_0x1".to_string())],
      children: vec![NameMapping {
        renamed: vec![("pear".to_string(), "_0x2".to_string())],
        children: Vec::new(),
      }],
    };
    let json = serde_json::to_value(&mapping).unwrap();
    assert_eq!(
      json,
      serde_json::json!({"children": [{"children": [], "pear": "_0x2"}], "apple": "_0x1"})
    );
    assert_eq!(mapping.original("pear"), Some("_0x2"));
    assert_eq!(mapping.len(), 2);
  }

  #[test]
  fn pool_is_seeded() {
    let reserved = HashSet::new();
    let words = ["a1", "b2", "c3", "d4", "e5", "f6"];
    let draw = |seed| {
      let mut pool = NamePool::new(words.iter().copied(), &reserved, seed);
      (0..6).map(|_| pool.next().unwrap()).collect::<Vec<_>>()
    };
    assert_eq!(draw(3), draw(3));
    let mut sorted = draw(3);
    sorted.sort();
    assert_eq!(sorted, words);
  }
}

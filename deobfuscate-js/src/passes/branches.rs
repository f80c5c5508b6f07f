use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use syntax_js::ast::VarDeclKind;
use tracing::debug;

/// Whether splicing `body` into the enclosing list would move a block-scoped declaration out of
/// its block.
fn has_lexical_declaration(body: &[Node]) -> bool {
  body.iter().any(|stmt| match stmt.stx.as_ref() {
    Syntax::VarDecl { kind, .. } => *kind != VarDeclKind::Var,
    Syntax::ClassDecl { .. } | Syntax::FuncDecl { .. } => true,
    _ => false,
  })
}

fn empty_statement() -> Node {
  Node::synthetic(Syntax::EmptyStmt {})
}

/// The replacement for an `if` statement whose test is known to be `test`.
fn pruned_statement(
  test: bool,
  consequent: Node,
  alternate: Option<Node>,
  slot: SlotKind,
) -> Replacement {
  let chosen = if test { Some(consequent) } else { alternate };
  let Some(mut chosen) = chosen else {
    return match slot {
      SlotKind::One => Replacement::One(empty_statement()),
      SlotKind::Opt | SlotKind::List => Replacement::Remove,
    };
  };
  if slot == SlotKind::List {
    if let Syntax::BlockStmt { body } = chosen.stx.as_mut() {
      if !has_lexical_declaration(body) {
        return Replacement::Many(std::mem::take(body));
      }
    }
  }
  Replacement::One(chosen)
}

#[derive(Default)]
struct Prune {
  removed: usize,
}

impl Rewrite for Prune {
  // Runs on leave, so the chosen branch has already been pruned when it's spliced in.
  fn leave(&mut self, node: &mut Node, slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    let test = match node.stx.as_ref() {
      Syntax::IfStmt { test, .. } | Syntax::CondExpr { test, .. } => match test.stx.as_ref() {
        Syntax::LitBool { value } => *value,
        _ => return Ok(None),
      },
      _ => return Ok(None),
    };
    let replacement = match std::mem::replace(node.stx.as_mut(), Syntax::EmptyStmt {}) {
      Syntax::IfStmt {
        consequent,
        alternate,
        ..
      } => pruned_statement(test, consequent, alternate, slot),
      Syntax::CondExpr {
        consequent,
        alternate,
        ..
      } => Replacement::One(if test { consequent } else { alternate }),
      _ => return Ok(None),
    };
    self.removed += 1;
    Ok(Some(replacement))
  }
}

pub struct BranchesPass;

impl Pass for BranchesPass {
  fn name(&self) -> &'static str {
    "branches"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut prune = Prune::default();
    rewrite(program, &mut prune)?;
    debug!(removed = prune.removed, "removed dead branches");
    Ok(prune.removed > 0)
  }
}

#[cfg(test)]
mod tests {
  use crate::deobfuscate;
  use crate::Config;

  fn prune(src: &str) -> String {
    let mut config = Config::disabled();
    config.expressions.remove_dead_branches = true;
    config.miscellaneous.beautify = false;
    deobfuscate(src, &config).unwrap()
  }

  #[test]
  fn splices_chosen_block() {
    assert_eq!(prune("if (true) { a(); b(); } else { c(); }"), "a();b();");
    assert_eq!(prune("if (false) { a(); } else { c(); }"), "c();");
    assert_eq!(prune("x(); if (false) { a(); } y();"), "x();y();");
  }

  #[test]
  fn prunes_nested_branches() {
    assert_eq!(
      prune("if (true) { if (false) a(); else { b(); } }"),
      "b();"
    );
    assert_eq!(prune("x = true ? false ? 1 : 2 : 3;"), "x=2;");
  }

  #[test]
  fn keeps_block_with_lexical_declarations() {
    assert_eq!(prune("if (true) { let a = 1; }"), "{let a=1;}");
  }

  #[test]
  fn single_statement_slot_gets_empty_statement() {
    assert_eq!(prune("while (x) if (false) a();"), "while(x);");
  }

  #[test]
  fn ignores_non_literal_tests() {
    assert_eq!(prune("if (x) { a(); }"), "if(x){a();}");
  }
}

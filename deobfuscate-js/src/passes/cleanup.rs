use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use tracing::debug;

fn is_empty_declaration(node: &Node) -> bool {
  matches!(node.stx.as_ref(), Syntax::VarDecl { declarators, .. } if declarators.is_empty())
}

#[derive(Default)]
struct Sweep {
  removed: usize,
}

impl Rewrite for Sweep {
  fn enter(&mut self, node: &mut Node, slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    let empty = match node.stx.as_ref() {
      Syntax::ExportDecl { decl } => is_empty_declaration(decl),
      _ => is_empty_declaration(node),
    };
    if !empty {
      return Ok(None);
    }
    self.removed += 1;
    Ok(Some(match slot {
      SlotKind::List | SlotKind::Opt => Replacement::Remove,
      // A loop or `if` body.
      SlotKind::One => Replacement::One(Node::synthetic(Syntax::EmptyStmt {})),
    }))
  }
}

/// Removes variable declarations left without declarators by earlier passes.
pub struct CleanupPass;

impl Pass for CleanupPass {
  fn name(&self) -> &'static str {
    "cleanup"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut sweep = Sweep::default();
    rewrite(program, &mut sweep)?;
    debug!(removed = sweep.removed, "removed empty declarations");
    Ok(sweep.removed > 0)
  }
}

#[cfg(test)]
mod tests {
  use super::CleanupPass;
  use crate::config::Config;
  use crate::eval::SandboxEvaluator;
  use crate::mutate::remove;
  use crate::passes::Pass;
  use crate::passes::PassCtx;
  use print_js::print;
  use print_js::PrintOptions;
  use syntax_js::ast::Node;
  use syntax_js::ast::Syntax;
  use syntax_js::parse;
  use syntax_js::ParseOptions;

  fn declarators(node: &Node, out: &mut Vec<syntax_js::ast::NodeId>) {
    if let Syntax::VarDeclarator { .. } = node.stx.as_ref() {
      out.push(node.id);
    }
    for child in node.children() {
      declarators(child, out);
    }
  }

  /// Strips every declarator, then runs cleanup.
  fn sweep(src: &str) -> String {
    let mut program = parse(src, ParseOptions::default()).unwrap();
    let mut ids = Vec::new();
    declarators(&program, &mut ids);
    for id in ids {
      assert!(remove(&mut program, id).unwrap());
    }
    let config = Config::default();
    let mut evaluator = SandboxEvaluator::default();
    let mut cx = PassCtx::new(&config, &mut evaluator);
    CleanupPass.run(&mut cx, &mut program).unwrap();
    print(&program, PrintOptions { pretty: false })
  }

  #[test]
  fn removes_empty_declarations() {
    assert_eq!(sweep("var a = 1; f(); let b, c;"), "f();");
    assert_eq!(sweep("for (var i = 0; i < 1;) {}"), "for(;i<1;){}");
    assert_eq!(sweep("if (x) var a = 1;"), "if(x);");
  }

  #[test]
  fn removes_empty_exports() {
    let mut program = parse("export var a = 1; f();", ParseOptions { is_module: true }).unwrap();
    let mut ids = Vec::new();
    declarators(&program, &mut ids);
    for id in ids {
      remove(&mut program, id).unwrap();
    }
    let config = Config::default();
    let mut evaluator = SandboxEvaluator::default();
    let mut cx = PassCtx::new(&config, &mut evaluator);
    assert!(CleanupPass.run(&mut cx, &mut program).unwrap());
    assert_eq!(print(&program, PrintOptions { pretty: false }), "f();");
  }
}

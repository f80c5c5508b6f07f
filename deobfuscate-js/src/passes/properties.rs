use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::Syntax;
use syntax_js::char::is_identifier_name;
use tracing::debug;

#[derive(Default)]
struct Dot {
  converted: usize,
}

impl Rewrite for Dot {
  // On leave, so the object expression is already converted.
  fn leave(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    let Syntax::ComputedMemberExpr {
      object,
      member,
      optional,
    } = node.stx.as_mut()
    else {
      return Ok(None);
    };
    let prop = match member.stx.as_ref() {
      Syntax::LitStr { value } if is_identifier_name(value) => value.clone(),
      _ => return Ok(None),
    };
    let object = std::mem::replace(object, Node::synthetic(Syntax::EmptyStmt {}));
    let optional = *optional;
    *node.stx = Syntax::MemberExpr {
      object,
      prop,
      optional,
    };
    self.converted += 1;
    Ok(None)
  }
}

/// Turns `a["b"]` into `a.b` wherever `b` is a valid identifier name.
pub struct PropertiesPass;

impl Pass for PropertiesPass {
  fn name(&self) -> &'static str {
    "properties"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let mut dot = Dot::default();
    rewrite(program, &mut dot)?;
    debug!(converted = dot.converted, "simplified property accesses");
    Ok(dot.converted > 0)
  }
}

#[cfg(test)]
mod tests {
  use crate::deobfuscate;
  use crate::Config;

  fn dot(src: &str) -> String {
    let mut config = Config::disabled();
    config.miscellaneous.simplify_properties = true;
    config.miscellaneous.beautify = false;
    deobfuscate(src, &config).unwrap()
  }

  #[test]
  fn converts_nested_accesses() {
    assert_eq!(dot(r#"a["b"]["c"](d["e"]);"#), "a.b.c(d.e);");
    assert_eq!(dot(r#"x = a?.["b"];"#), "x=a?.b;");
    assert_eq!(dot(r#"a["if"] = 1;"#), "a.if=1;");
  }

  #[test]
  fn keeps_non_identifier_keys() {
    assert_eq!(dot(r#"a["b-c"]; a["1x"]; a[""]; a[b];"#), r#"a["b-c"];a["1x"];a[""];a[b];"#);
  }

  #[test]
  fn numeric_objects_stay_valid() {
    assert_eq!(dot(r#"x = 1["toString"]();"#), "x=(1).toString();");
  }
}

//! Decodes string-building idioms into the string literal they produce.
//!
//! Only exact call shapes are recognized. Nothing is evaluated, so an idiom whose callee has been
//! redefined by the program is still decoded; obfuscators don't do that.

use super::Pass;
use super::PassCtx;
use crate::err::DeobfuscateResult;
use crate::literal::numeric_value;
use crate::literal::string_node;
use crate::mutate::remove;
use crate::mutate::rewrite;
use crate::mutate::Replacement;
use crate::mutate::Rewrite;
use sandbox_js::ops::to_int32;
use sandbox_js::ops::to_uint32;
use syntax_js::ast::slot::SlotKind;
use syntax_js::ast::Node;
use syntax_js::ast::NodeId;
use syntax_js::ast::Syntax;
use syntax_js::operator::OperatorName;
use tracing::debug;

fn method_call<'a>(node: &'a Node, method: &str) -> Option<(&'a Node, &'a [Node])> {
  match node.stx.as_ref() {
    Syntax::CallExpr {
      callee,
      arguments,
      optional: false,
    } => match callee.stx.as_ref() {
      Syntax::MemberExpr {
        object,
        prop,
        optional: false,
      } if prop == method => Some((object, arguments)),
      _ => None,
    },
    _ => None,
  }
}

fn is_empty_string(args: &[Node]) -> bool {
  match args {
    [arg] => matches!(arg.stx.as_ref(), Syntax::LitStr { value } if value.is_empty()),
    _ => false,
  }
}

fn from_code_units(units: &[u16]) -> Option<String> {
  String::from_utf16(units).ok()
}

/// `"literal".split("").reverse().join("")`.
fn reversed_string(node: &Node) -> Option<String> {
  let (reversed, args) = method_call(node, "join")?;
  if !is_empty_string(args) {
    return None;
  }
  let (split, args) = method_call(reversed, "reverse")?;
  if !args.is_empty() {
    return None;
  }
  let (literal, args) = method_call(split, "split")?;
  if !is_empty_string(args) {
    return None;
  }
  let Syntax::LitStr { value } = literal.stx.as_ref() else {
    return None;
  };
  // `split("")` splits into UTF-16 code units.
  let mut units: Vec<u16> = value.encode_utf16().collect();
  units.reverse();
  from_code_units(&units)
}

/// `String.fromCharCode(n1, n2, ...)` with numeric literal arguments.
fn char_codes(node: &Node) -> Option<String> {
  let (object, args) = method_call(node, "fromCharCode")?;
  if object.stx.ident_name() != Some("String") {
    return None;
  }
  let units = args
    .iter()
    .map(|arg| numeric_value(arg).map(|n| to_uint32(n) as u16))
    .collect::<Option<Vec<_>>>()?;
  from_code_units(&units)
}

/// A function decoding dot-separated character codes XORed with a fixed key.
struct XorDecoder {
  decl: NodeId,
  name: String,
  key: i32,
}

fn contains(node: &Node, pred: &impl Fn(&Node) -> bool) -> bool {
  pred(node) || node.children().into_iter().any(|c| contains(c, pred))
}

impl XorDecoder {
  fn detect(stmt: &Node) -> Option<XorDecoder> {
    let Syntax::FuncDecl { func } = stmt.stx.as_ref() else {
      return None;
    };
    if func.params.len() != 2 {
      return None;
    }
    let name = func.name.as_ref()?.stx.ident_name()?;
    let Syntax::BlockStmt { body } = func.body.stx.as_ref() else {
      return None;
    };
    let [key_assign, locals, setup, for_loop, ret] = body.as_slice() else {
      return None;
    };

    let Syntax::ExprStmt { expr } = key_assign.stx.as_ref() else {
      return None;
    };
    let Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      right,
    } = expr.stx.as_ref()
    else {
      return None;
    };
    left.stx.ident_name()?;
    let key = numeric_value(right)?;

    if !matches!(locals.stx.as_ref(), Syntax::VarDecl { declarators, .. } if declarators.len() == 3)
      || !matches!(setup.stx.as_ref(), Syntax::ExprStmt { .. })
    {
      return None;
    }

    let Syntax::ForStmt {
      init: Some(init),
      test: Some(test),
      update: Some(_),
      body: loop_body,
    } = for_loop.stx.as_ref()
    else {
      return None;
    };
    let is_assignment = matches!(
      init.stx.as_ref(),
      Syntax::BinaryExpr { operator, .. } if operator.is_assignment()
    );
    if !is_assignment
      || !matches!(test.stx.as_ref(), Syntax::BinaryExpr { .. })
      || !matches!(loop_body.stx.as_ref(), Syntax::BlockStmt { .. })
    {
      return None;
    }
    let decodes = contains(loop_body, &|n| {
      matches!(n.stx.as_ref(), Syntax::MemberExpr { prop, .. } if prop == "fromCharCode")
    }) && contains(loop_body, &|n| {
      matches!(
        n.stx.as_ref(),
        Syntax::BinaryExpr {
          operator: OperatorName::BitwiseXor | OperatorName::AssignmentBitwiseXor,
          ..
        }
      )
    });
    if !decodes {
      return None;
    }

    match ret.stx.as_ref() {
      Syntax::ReturnStmt { value: Some(value) } if value.stx.ident_name().is_some() => {}
      _ => return None,
    };
    Some(XorDecoder {
      decl: stmt.id,
      name: name.to_string(),
      key: to_int32(key),
    })
  }

  /// Decodes an argument like `"104.101.108."`.
  fn decode(&self, encoded: &str) -> Option<String> {
    let codes = encoded.strip_suffix('.')?;
    let units = codes
      .split('.')
      .map(|piece| {
        if piece.is_empty() || piece.len() > 3 || !piece.bytes().all(|b| b.is_ascii_digit()) {
          return None;
        }
        let code: i32 = piece.parse().ok()?;
        Some(to_uint32((code ^ self.key) as f64) as u16)
      })
      .collect::<Option<Vec<_>>>()?;
    from_code_units(&units)
  }

  fn call(&self, node: &Node) -> Option<String> {
    let Syntax::CallExpr {
      callee,
      arguments,
      optional: false,
    } = node.stx.as_ref()
    else {
      return None;
    };
    if callee.stx.ident_name() != Some(self.name.as_str()) {
      return None;
    }
    match arguments.as_slice() {
      [arg] => match arg.stx.as_ref() {
        Syntax::LitStr { value } => self.decode(value),
        _ => None,
      },
      _ => None,
    }
  }
}

struct Decode<'a> {
  xor: Option<&'a XorDecoder>,
  decoded: usize,
  /// References to the XOR decoder left after decoding.
  decoder_refs: usize,
}

impl<'a> Rewrite for Decode<'a> {
  fn enter(&mut self, node: &mut Node, _slot: SlotKind) -> DeobfuscateResult<Option<Replacement>> {
    let decoded = reversed_string(node)
      .or_else(|| char_codes(node))
      .or_else(|| self.xor.and_then(|xor| xor.call(node)));
    if let Some(decoded) = decoded {
      self.decoded += 1;
      return Ok(Some(Replacement::One(string_node(decoded))));
    }
    if let (Some(xor), Syntax::IdExpr { name }) = (self.xor, node.stx.as_ref()) {
      if *name == xor.name {
        self.decoder_refs += 1;
      }
    }
    Ok(None)
  }
}

pub struct StringsPass;

impl Pass for StringsPass {
  fn name(&self) -> &'static str {
    "strings"
  }

  fn run(&mut self, _cx: &mut PassCtx<'_>, program: &mut Node) -> DeobfuscateResult<bool> {
    let xor = match program.stx.as_ref() {
      Syntax::Program { body, .. } => body.iter().find_map(XorDecoder::detect),
      _ => None,
    };
    let mut decode = Decode {
      xor: xor.as_ref(),
      decoded: 0,
      decoder_refs: 0,
    };
    rewrite(program, &mut decode)?;
    let (decoded, decoder_refs) = (decode.decoded, decode.decoder_refs);
    let mut removed = false;
    if let Some(xor) = &xor {
      // The decoder's own name and any call that couldn't be decoded keep it alive.
      if decoder_refs == 0 {
        removed = remove(program, xor.decl)?;
      } else {
        debug!(name = %xor.name, refs = decoder_refs, "kept XOR decoder with remaining uses");
      }
    }
    debug!(decoded, "decoded string idioms");
    Ok(decoded > 0 || removed)
  }
}

#[cfg(test)]
mod tests {
  use super::char_codes;
  use super::reversed_string;
  use super::XorDecoder;
  use syntax_js::ast::NodeId;
  use syntax_js::parse_expression;

  #[test]
  fn reverses_split_join() {
    let node = parse_expression(r#""dlroW olleH".split("").reverse().join("")"#).unwrap();
    assert_eq!(reversed_string(&node).as_deref(), Some("Hello World"));
    let node = parse_expression(r#""ab".split(",").reverse().join("")"#).unwrap();
    assert_eq!(reversed_string(&node), None);
  }

  #[test]
  fn decodes_char_codes() {
    let node = parse_expression("String.fromCharCode(72, 101, 108, 108, 111)").unwrap();
    assert_eq!(char_codes(&node).as_deref(), Some("Hello"));
    let node = parse_expression("String.fromCharCode(65601)").unwrap();
    assert_eq!(char_codes(&node).as_deref(), Some("A"));
    let node = parse_expression("String.fromCharCode(x)").unwrap();
    assert_eq!(char_codes(&node), None);
  }

  #[test]
  fn decodes_xor_arguments() {
    let xor = XorDecoder {
      decl: NodeId::fresh(),
      name: "d".to_string(),
      key: 7,
    };
    assert_eq!(xor.decode("79.98.107.107.104.").as_deref(), Some("Hello"));
    assert_eq!(xor.decode("79.98"), None);
    assert_eq!(xor.decode("7999."), None);
    assert_eq!(xor.decode("."), None);
  }
}

use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::PropKind;
use crate::ast::syntax::Syntax;
use crate::char::is_line_terminator;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::lex::KEYWORDS_MAPPING;
use crate::loc::Loc;
use crate::num::parse_number_literal;
use crate::token::TT;

fn push_code_point(out: &mut Vec<u16>, cp: u32) -> Option<()> {
  let c = char::from_u32(cp);
  match c {
    Some(c) => {
      let mut buf = [0u16; 2];
      out.extend_from_slice(c.encode_utf16(&mut buf));
    }
    // Lone surrogate.
    None if cp <= 0xffff => out.push(cp as u16),
    None => return None,
  };
  Some(())
}

/// Decodes escape sequences in the body of a string literal or template part. Returns None if an
/// escape is malformed.
pub fn decode_escapes(raw: &str) -> Option<String> {
  let mut out = Vec::<u16>::with_capacity(raw.len());
  let mut chars = raw.chars().peekable();
  while let Some(c) = chars.next() {
    if c != '\\' {
      let mut buf = [0u16; 2];
      out.extend_from_slice(c.encode_utf16(&mut buf));
      continue;
    }
    let e = chars.next()?;
    match e {
      'b' => out.push(0x08),
      'f' => out.push(0x0c),
      'n' => out.push(0x0a),
      'r' => out.push(0x0d),
      't' => out.push(0x09),
      'v' => out.push(0x0b),
      '\r' => {
        if chars.peek() == Some(&'\n') {
          chars.next();
        }
      }
      c if is_line_terminator(c) => {}
      'x' => {
        let hex: String = (0..2).filter_map(|_| chars.next()).collect();
        if hex.len() != 2 {
          return None;
        }
        out.push(u16::from_str_radix(&hex, 16).ok()?);
      }
      'u' => {
        let cp = if chars.peek() == Some(&'{') {
          chars.next();
          let mut hex = String::new();
          loop {
            match chars.next()? {
              '}' => break,
              c => hex.push(c),
            }
          }
          u32::from_str_radix(&hex, 16).ok()?
        } else {
          let hex: String = (0..4).filter_map(|_| chars.next()).collect();
          if hex.len() != 4 {
            return None;
          }
          u32::from_str_radix(&hex, 16).ok()?
        };
        push_code_point(&mut out, cp)?;
      }
      '0'..='7' => {
        // `\0` or a legacy octal escape of up to three digits, at most 0o377.
        let mut value = e.to_digit(8)?;
        let max_len = if e <= '3' { 3 } else { 2 };
        let mut len = 1;
        while len < max_len {
          match chars.peek().and_then(|c| c.to_digit(8)) {
            Some(d) => {
              value = value * 8 + d;
              chars.next();
              len += 1;
            }
            None => break,
          }
        }
        out.push(value as u16);
      }
      c => {
        let mut buf = [0u16; 2];
        out.extend_from_slice(c.encode_utf16(&mut buf));
      }
    };
  }
  Some(String::from_utf16_lossy(&out))
}

impl<'a> Parser<'a> {
  pub fn lit_str_value(&mut self) -> SyntaxResult<(Loc, String)> {
    let t = self.require(TT::LiteralString)?;
    let raw = self.str(t.loc);
    let body = &raw[1..raw.len() - 1];
    let value = decode_escapes(body).ok_or_else(|| t.error(SyntaxErrorType::InvalidCharacterEscape))?;
    Ok((t.loc, value))
  }

  pub fn lit_str(&mut self) -> SyntaxResult<Node> {
    let (loc, value) = self.lit_str_value()?;
    Ok(Node::new(loc, Syntax::LitStr { value }))
  }

  pub fn lit_num(&mut self) -> SyntaxResult<Node> {
    let t = self.require(TT::LiteralNumber)?;
    let value = parse_number_literal(self.str(t.loc))
      .ok_or_else(|| t.error(SyntaxErrorType::MalformedLiteralNumber))?;
    Ok(Node::new(t.loc, Syntax::LitNum { value }))
  }

  pub fn lit_bigint(&mut self) -> SyntaxResult<Node> {
    let t = self.require(TT::LiteralBigInt)?;
    let raw = self.str(t.loc);
    Ok(Node::new(t.loc, Syntax::LitBigInt {
      raw: raw[..raw.len() - 1].to_string(),
    }))
  }

  pub fn lit_regex(&mut self) -> SyntaxResult<Node> {
    let t = self.require_with_mode(TT::LiteralRegex, LexMode::SlashIsRegex)?;
    let raw = self.str(t.loc);
    let end = raw
      .rfind('/')
      .filter(|&i| i > 0)
      .ok_or_else(|| t.error(SyntaxErrorType::ExpectedSyntax("regular expression")))?;
    Ok(Node::new(t.loc, Syntax::LitRegex {
      pattern: raw[1..end].to_string(),
      flags: raw[end + 1..].to_string(),
    }))
  }

  /// Parses the parts of a template starting at its first token. Returns the raw text of every
  /// string part and the substitutions between them.
  pub fn lit_template_parts(&mut self, ctx: ParseCtx) -> SyntaxResult<(Vec<String>, Vec<Node>)> {
    let t = self.consume();
    let mut quasis = Vec::new();
    let mut exprs = Vec::new();
    let raw = self.str(t.loc);
    let mut is_end = match t.typ {
      TT::LiteralTemplatePartString => {
        quasis.push(raw[1..raw.len() - 2].to_string());
        false
      }
      TT::LiteralTemplatePartStringEnd => {
        quasis.push(raw[1..raw.len() - 1].to_string());
        true
      }
      _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("template"))),
    };
    while !is_end {
      exprs.push(self.expr_seq(ctx, [TT::BraceClose])?);
      self.require(TT::BraceClose)?;
      let part = self.consume_with_mode(LexMode::TemplateStrContinue);
      let raw = self.str(part.loc);
      match part.typ {
        TT::LiteralTemplatePartString => quasis.push(raw[..raw.len() - 2].to_string()),
        TT::LiteralTemplatePartStringEnd => {
          quasis.push(raw[..raw.len() - 1].to_string());
          is_end = true;
        }
        _ => {
          return Err(Loc(part.loc.1, part.loc.1).error(
            SyntaxErrorType::UnexpectedEnd,
            Some(TT::LiteralTemplatePartString),
          ))
        }
      };
    }
    Ok((quasis, exprs))
  }

  pub fn lit_template(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let (quasis, exprs) = p.lit_template_parts(ctx)?;
      for raw in quasis.iter() {
        if decode_escapes(raw).is_none() {
          return Err(p.source_range().error(SyntaxErrorType::InvalidCharacterEscape, None));
        }
      }
      Ok(Syntax::LitTemplate { quasis, exprs })
    })
  }

  pub fn lit_arr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::BracketOpen)?;
      let mut elements = Vec::new();
      loop {
        if p.consume_if(TT::BracketClose).is_match() {
          break;
        };
        let t = p.peek();
        if t.typ == TT::Comma {
          p.consume();
          elements.push(Node::new(t.loc, Syntax::ArrHole {}));
          continue;
        };
        elements.push(p.spread_or_expr(ctx, [TT::Comma, TT::BracketClose])?);
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::BracketClose)?;
          break;
        }
      }
      Ok(Syntax::LitArr { elements })
    })
  }

  pub fn spread_or_expr<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N]) -> SyntaxResult<Node> {
    if self.peek().typ == TT::DotDotDot {
      return self.with_loc(|p| {
        p.consume();
        Ok(Syntax::SpreadElement {
          argument: p.expr(ctx, terminators)?,
        })
      });
    }
    self.expr(ctx, terminators)
  }

  /// Parses a property name in an object literal, pattern or class body. Returns the key and
  /// whether it's computed.
  pub fn prop_key(&mut self, ctx: ParseCtx) -> SyntaxResult<(Node, bool)> {
    let t = self.peek();
    Ok(match t.typ {
      TT::BracketOpen => {
        self.consume();
        let key = self.expr(ctx, [TT::BracketClose])?;
        self.require(TT::BracketClose)?;
        (key, true)
      }
      TT::LiteralString => (self.lit_str()?, false),
      TT::LiteralNumber => (self.lit_num()?, false),
      TT::LiteralBigInt => (self.lit_bigint()?, false),
      TT::Identifier | TT::PrivateMember | TT::LiteralTrue | TT::LiteralFalse | TT::LiteralNull => {
        self.consume();
        (Node::new(t.loc, Syntax::PropKey { name: self.string(t.loc) }), false)
      }
      typ if KEYWORDS_MAPPING.contains_key(&typ) => {
        self.consume();
        (Node::new(t.loc, Syntax::PropKey { name: self.string(t.loc) }), false)
      }
      _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("property name"))),
    })
  }

  pub fn lit_obj(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let mut props = Vec::new();
      while !p.consume_if(TT::BraceClose).is_match() {
        props.push(p.obj_member(ctx)?);
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::BraceClose)?;
          break;
        }
      }
      Ok(Syntax::LitObj { props })
    })
  }

  fn obj_member(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    if self.peek().typ == TT::DotDotDot {
      return self.spread_or_expr(ctx, [TT::Comma, TT::BraceClose]);
    }
    self.with_loc(|p| {
      let [t0, t1] = p.peek_n::<2>();
      // `get`, `set` and `async` are modifiers only when followed by another key.
      let followed_by_key = !matches!(
        t1.typ,
        TT::ParenthesisOpen | TT::Colon | TT::Comma | TT::BraceClose | TT::Equals
      );
      let mut kind = PropKind::Init;
      let mut is_async = false;
      let mut is_generator = false;
      match t0.typ {
        TT::KeywordGet if followed_by_key => {
          p.consume();
          kind = PropKind::Getter;
        }
        TT::KeywordSet if followed_by_key => {
          p.consume();
          kind = PropKind::Setter;
        }
        TT::KeywordAsync if followed_by_key && !t1.preceded_by_line_terminator => {
          p.consume();
          is_async = true;
          is_generator = p.consume_if(TT::Asterisk).is_match();
          kind = PropKind::Method;
        }
        TT::Asterisk => {
          p.consume();
          is_generator = true;
          kind = PropKind::Method;
        }
        _ => {}
      };
      let key_token = p.peek();
      let (key, computed) = p.prop_key(ctx)?;
      if kind != PropKind::Init || p.peek().typ == TT::ParenthesisOpen {
        let value = p.method(ctx, is_async, is_generator)?;
        return Ok(Syntax::ObjProp {
          key,
          value,
          computed,
          kind: if kind == PropKind::Init { PropKind::Method } else { kind },
        });
      }
      if p.consume_if(TT::Colon).is_match() {
        let value = p.expr(ctx, [TT::Comma, TT::BraceClose])?;
        return Ok(Syntax::ObjProp {
          key,
          value,
          computed,
          kind: PropKind::Init,
        });
      }
      // Shorthand, possibly with a default that's only valid once this becomes a pattern.
      let Syntax::PropKey { name } = key.stx.as_ref() else {
        return Err(key_token.error(SyntaxErrorType::ExpectedSyntax("property value")));
      };
      if computed || !super::pat::is_valid_pattern_identifier(key_token.typ, ctx.rules) {
        return Err(key_token.error(SyntaxErrorType::ExpectedSyntax("property value")));
      }
      let mut value = Node::new(key.loc, Syntax::IdExpr { name: name.clone() });
      if p.consume_if(TT::Equals).is_match() {
        let default = p.expr(ctx, [TT::Comma, TT::BraceClose])?;
        value = Node::new(key.loc + default.loc, Syntax::BinaryExpr {
          operator: crate::operator::OperatorName::Assignment,
          left: value,
          right: default,
        });
      }
      Ok(Syntax::ObjProp {
        key,
        value,
        computed: false,
        kind: PropKind::Shorthand,
      })
    })
  }
}

#[cfg(test)]
mod tests {
  use super::decode_escapes;

  #[test]
  fn test_decode_escapes() {
    assert_eq!(decode_escapes(r"a\nb").unwrap(), "a\nb");
    assert_eq!(decode_escapes(r"\x41B\u{43}").unwrap(), "ABC");
    assert_eq!(decode_escapes(r"\101\0").unwrap(), "A\0");
    assert_eq!(decode_escapes("a\\\nb").unwrap(), "ab");
    assert_eq!(decode_escapes(r"\'\q").unwrap(), "'q");
    assert!(decode_escapes(r"\x4").is_none());
  }
}

use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::PropKind;
use crate::ast::syntax::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::operator::OperatorName;
use crate::token::TT;
use crate::token::UNRESERVED_KEYWORDS;

#[derive(Clone, Copy)]
pub struct ParsePatternRules {
  // `await` is not allowed as an identifier inside an async function or a module.
  pub await_allowed: bool,
  // `yield` is not allowed as an identifier inside a generator function.
  pub yield_allowed: bool,
}

impl ParsePatternRules {
  pub fn with_await_allowed(&self, await_allowed: bool) -> ParsePatternRules {
    Self {
      await_allowed,
      ..*self
    }
  }

  pub fn with_yield_allowed(&self, yield_allowed: bool) -> ParsePatternRules {
    Self {
      yield_allowed,
      ..*self
    }
  }
}

pub fn is_valid_pattern_identifier(typ: TT, rules: ParsePatternRules) -> bool {
  match typ {
    TT::Identifier => true,
    TT::KeywordAwait => rules.await_allowed,
    TT::KeywordYield => rules.yield_allowed,
    t => UNRESERVED_KEYWORDS.contains(&t),
  }
}

impl<'a> Parser<'a> {
  pub fn id_pat(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let t = p.consume();
      if !is_valid_pattern_identifier(t.typ, ctx.rules) {
        return Err(t.error(SyntaxErrorType::ExpectedSyntax("identifier")));
      };
      Ok(Syntax::IdPat {
        name: p.string(t.loc),
      })
    })
  }

  /// Binding pattern, as used by declarations and parameters. Leaves are `IdPat`.
  pub fn pat(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    match self.peek().typ {
      TT::BracketOpen => self.arr_pat(ctx),
      TT::BraceOpen => self.obj_pat(ctx),
      _ => self.id_pat(ctx),
    }
  }

  /// Pattern optionally followed by `= default`.
  pub fn pat_with_default(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    let start = self.checkpoint();
    let target = self.pat(ctx)?;
    if !self.consume_if(TT::Equals).is_match() {
      return Ok(target);
    }
    let default = self.expr(ctx, [TT::Comma, TT::BracketClose, TT::BraceClose, TT::ParenthesisClose])?;
    Ok(Node::new(self.since_checkpoint(start), Syntax::AssignPat {
      target,
      default,
    }))
  }

  fn arr_pat(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
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
        }
        if t.typ == TT::DotDotDot {
          let rest = p.with_loc(|p| {
            p.consume();
            Ok(Syntax::RestPat { target: p.pat(ctx)? })
          })?;
          elements.push(rest);
          p.require(TT::BracketClose)?;
          break;
        }
        elements.push(p.pat_with_default(ctx)?);
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::BracketClose)?;
          break;
        }
      }
      Ok(Syntax::ArrPat { elements })
    })
  }

  fn obj_pat(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let mut props = Vec::new();
      while !p.consume_if(TT::BraceClose).is_match() {
        if p.peek().typ == TT::DotDotDot {
          let rest = p.with_loc(|p| {
            p.consume();
            Ok(Syntax::RestPat {
              target: p.id_pat(ctx)?,
            })
          })?;
          props.push(rest);
          p.require(TT::BraceClose)?;
          break;
        }
        let prop = p.with_loc(|p| {
          let (key, computed) = p.prop_key(ctx)?;
          if !computed && p.peek().typ != TT::Colon {
            // Shorthand `{ a }` or `{ a = 1 }`.
            let Syntax::PropKey { name } = key.stx.as_ref() else {
              return Err(key.error(SyntaxErrorType::ExpectedSyntax("identifier")));
            };
            let mut target = Node::new(key.loc, Syntax::IdPat { name: name.clone() });
            if p.consume_if(TT::Equals).is_match() {
              let default = p.expr(ctx, [TT::Comma, TT::BraceClose])?;
              target = Node::new(key.loc + default.loc, Syntax::AssignPat { target, default });
            }
            return Ok(Syntax::PatProp {
              key,
              target,
              computed: false,
              shorthand: true,
            });
          }
          p.require(TT::Colon)?;
          let target = p.pat_with_default(ctx)?;
          Ok(Syntax::PatProp {
            key,
            target,
            computed,
            shorthand: false,
          })
        })?;
        props.push(prop);
        if !p.consume_if(TT::Comma).is_match() {
          p.require(TT::BraceClose)?;
          break;
        }
      }
      Ok(Syntax::ObjPat { props })
    })
  }
}

/// Reinterprets an already parsed expression as an assignment target. Array and object literals
/// become patterns whose leaves stay references (`IdExpr` or member expressions), since a
/// destructuring assignment doesn't declare anything.
pub fn expr_to_assign_target(node: Node, operator: OperatorName) -> SyntaxResult<Node> {
  let loc = node.loc;
  let id = node.id;
  match *node.stx {
    Syntax::IdExpr { .. } | Syntax::MemberExpr { optional: false, .. } | Syntax::ComputedMemberExpr { optional: false, .. } => Ok(node),
    Syntax::LitArr { elements } if operator == OperatorName::Assignment => {
      let count = elements.len();
      let mut out = Vec::with_capacity(count);
      for (i, el) in elements.into_iter().enumerate() {
        let el_loc = el.loc;
        out.push(match *el.stx {
          Syntax::ArrHole {} => Node::new(el_loc, Syntax::ArrHole {}),
          Syntax::SpreadElement { argument } if i + 1 == count => Node::new(el_loc, Syntax::RestPat {
            target: expr_to_assign_target(argument, operator)?,
          }),
          stx => expr_to_assign_target_with_default(Node {
            id: el.id,
            loc: el_loc,
            stx: Box::new(stx),
          })?,
        });
      }
      Ok(Node::new(loc, Syntax::ArrPat { elements: out }))
    }
    Syntax::LitObj { props } if operator == OperatorName::Assignment => {
      let count = props.len();
      let mut out = Vec::with_capacity(count);
      for (i, prop) in props.into_iter().enumerate() {
        let prop_loc = prop.loc;
        out.push(match *prop.stx {
          Syntax::SpreadElement { argument } if i + 1 == count => Node::new(prop_loc, Syntax::RestPat {
            target: expr_to_assign_target(argument, operator)?,
          }),
          Syntax::ObjProp {
            key,
            value,
            computed,
            kind: PropKind::Init,
          } => Node::new(prop_loc, Syntax::PatProp {
            key,
            target: expr_to_assign_target_with_default(value)?,
            computed,
            shorthand: false,
          }),
          Syntax::ObjProp {
            key,
            value,
            kind: PropKind::Shorthand,
            ..
          } => Node::new(prop_loc, Syntax::PatProp {
            key,
            target: expr_to_assign_target_with_default(value)?,
            computed: false,
            shorthand: true,
          }),
          _ => return Err(prop_loc.error(SyntaxErrorType::InvalidAssigmentTarget, None)),
        });
      }
      Ok(Node::new(loc, Syntax::ObjPat { props: out }))
    }
    stx => Err(
      Node {
        id,
        loc,
        stx: Box::new(stx),
      }
      .error(SyntaxErrorType::InvalidAssigmentTarget),
    ),
  }
}

fn expr_to_assign_target_with_default(node: Node) -> SyntaxResult<Node> {
  let loc = node.loc;
  match *node.stx {
    Syntax::BinaryExpr {
      operator: OperatorName::Assignment,
      left,
      right,
    } => Ok(Node::new(loc, Syntax::AssignPat {
      // Already converted when the assignment was parsed.
      target: left,
      default: right,
    })),
    stx => expr_to_assign_target(
      Node {
        id: node.id,
        loc,
        stx: Box::new(stx),
      },
      OperatorName::Assignment,
    ),
  }
}

use super::operator::MULTARY_OPERATOR_MAPPING;
use super::operator::UNARY_OPERATOR_MAPPING;
use super::pat::expr_to_assign_target;
use super::pat::is_valid_pattern_identifier;
use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::LexMode;
use crate::lex::KEYWORDS_MAPPING;
use crate::operator::Associativity;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;
use crate::token::TT;

pub struct Asi {
  pub can_end_with_asi: bool,
  pub did_end_with_asi: bool,
}

impl Asi {
  pub fn can() -> Asi {
    Asi {
      can_end_with_asi: true,
      did_end_with_asi: false,
    }
  }

  pub fn no() -> Asi {
    Asi {
      can_end_with_asi: false,
      did_end_with_asi: false,
    }
  }
}

/// Whether `node` can't be the left operand of `**` unless parenthesized, as in `-a ** b`.
fn is_unary_base(node: &Node) -> bool {
  match node.stx.as_ref() {
    Syntax::UnaryExpr { operator, .. } => !matches!(
      operator,
      OperatorName::PrefixIncrement | OperatorName::PrefixDecrement
    ),
    Syntax::AwaitExpr { .. } => true,
    _ => false,
  }
}

fn assignment_precedence() -> u8 {
  OPERATORS[&OperatorName::Assignment].precedence
}

impl<'a> Parser<'a> {
  pub fn call_args(&mut self, ctx: ParseCtx) -> SyntaxResult<Vec<Node>> {
    let mut args = Vec::new();
    while self.peek().typ != TT::ParenthesisClose {
      args.push(self.spread_or_expr(ctx, [TT::Comma, TT::ParenthesisClose])?);
      if !self.consume_if(TT::Comma).is_match() {
        break;
      };
    }
    Ok(args)
  }

  /// Parses an expression that stops before a top-level comma, e.g. an argument or initializer.
  pub fn expr<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N]) -> SyntaxResult<Node> {
    self.expr_with_min_prec(ctx, assignment_precedence(), terminators, &mut Asi::no())
  }

  /// Like [`Parser::expr`], but may end at a point where a semicolon would be inserted.
  pub fn expr_until_asi<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N]) -> SyntaxResult<Node> {
    self.expr_with_min_prec(ctx, assignment_precedence(), terminators, &mut Asi::can())
  }

  /// Parses a full expression, including the comma operator.
  pub fn expr_seq<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N]) -> SyntaxResult<Node> {
    self.expr_with_min_prec(ctx, 1, terminators, &mut Asi::no())
  }

  pub fn expr_with_asi<const N: usize>(
    &mut self,
    ctx: ParseCtx,
    terminators: [TT; N],
    asi: &mut Asi,
  ) -> SyntaxResult<Node> {
    self.expr_with_min_prec(ctx, 1, terminators, asi)
  }

  /// Parses a parenthesised expression like `(a + b)`.
  pub fn grouping(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.require(TT::ParenthesisOpen)?;
    let expr = self.expr_seq(ctx, [TT::ParenthesisClose])?;
    self.require(TT::ParenthesisClose)?;
    Ok(expr)
  }

  pub fn arrow_func_expr<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N], asi: &mut Asi) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let [t0, t1] = p.peek_n::<2>();
      // `async => 1` has a parameter named async.
      let is_async = t0.typ == TT::KeywordAsync
        && t1.typ != TT::EqualsChevronRight
        && !t1.preceded_by_line_terminator;
      if is_async {
        p.consume();
      }
      let rules = ctx.rules.with_await_allowed(!is_async && ctx.rules.await_allowed);
      let params_ctx = ctx.with_rules(rules);
      let params = if p.peek().typ == TT::ParenthesisOpen {
        p.params(params_ctx)?
      } else {
        vec![p.id_pat(params_ctx)?]
      };
      let arrow = p.require(TT::EqualsChevronRight)?;
      if arrow.preceded_by_line_terminator {
        return Err(arrow.error(SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters));
      }
      let body_ctx = ctx.in_function_body(rules.with_await_allowed(!is_async));
      let (directives, body) = if p.peek().typ == TT::BraceOpen {
        p.func_body(body_ctx)?
      } else {
        let body = p.expr_with_min_prec(body_ctx, assignment_precedence(), terminators, asi)?;
        (Vec::new(), body)
      };
      Ok(Syntax::ArrowFunc {
        func: crate::ast::syntax::Func {
          name: None,
          params,
          body,
          directives,
          is_async,
          is_generator: false,
          is_arrow: true,
        },
      })
    })
  }

  fn arrow_function_or_grouping_expr<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N], asi: &mut Asi) -> SyntaxResult<Node> {
    // Try and parse as arrow function signature first.
    // If we fail, backtrack and parse as grouping instead.
    // After we see `=>`, we assume it's definitely an arrow function and do not backtrack.
    let signature = self.rewindable(|p| {
      let cp = p.checkpoint();
      p.params(ctx)?;
      let arrow = p.peek();
      if arrow.typ != TT::EqualsChevronRight {
        return Err(arrow.error(SyntaxErrorType::RequiredTokenNotFound(TT::EqualsChevronRight)));
      }
      Ok(cp)
    });
    match signature {
      Some(cp) => {
        self.restore_checkpoint(cp);
        self.arrow_func_expr(ctx, terminators, asi)
      }
      None => self.grouping(ctx),
    }
  }

  fn member_prop_name(&mut self) -> SyntaxResult<String> {
    let t = self.consume();
    match t.typ {
      TT::Identifier | TT::PrivateMember | TT::LiteralTrue | TT::LiteralFalse | TT::LiteralNull => {}
      typ if KEYWORDS_MAPPING.contains_key(&typ) => {}
      _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("member access property"))),
    };
    Ok(self.string(t.loc))
  }

  fn new_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordNew)?;
      let [t0, t1] = p.peek_n::<2>();
      let mut callee = if t0.typ == TT::KeywordNew && t1.typ != TT::Dot {
        p.new_expr(ctx)?
      } else {
        p.expr_operand(ctx, [], &mut Asi::no())?
      };
      loop {
        let t = p.peek();
        callee = match t.typ {
          TT::Dot => {
            p.consume();
            let prop = p.member_prop_name()?;
            Node::new(callee.loc + t.loc, Syntax::MemberExpr {
              object: callee,
              prop,
              optional: false,
            })
          }
          TT::BracketOpen => {
            p.consume();
            let member = p.expr_seq(ctx, [TT::BracketClose])?;
            let end = p.require(TT::BracketClose)?;
            Node::new(callee.loc + end.loc, Syntax::ComputedMemberExpr {
              object: callee,
              member,
              optional: false,
            })
          }
          _ => break,
        };
      }
      let arguments = if p.consume_if(TT::ParenthesisOpen).is_match() {
        let args = p.call_args(ctx)?;
        p.require(TT::ParenthesisClose)?;
        args
      } else {
        Vec::new()
      };
      Ok(Syntax::NewExpr { callee, arguments })
    })
  }

  fn expr_operand<const N: usize>(&mut self, ctx: ParseCtx, terminators: [TT; N], asi: &mut Asi) -> SyntaxResult<Node> {
    let t0 = self.peek_with_mode(LexMode::SlashIsRegex);
    if let Some(operator) = UNARY_OPERATOR_MAPPING.get(&t0.typ) {
      return self.with_loc(|p| {
        p.consume_with_mode(LexMode::SlashIsRegex);
        let next_min_prec = operator.precedence + (operator.associativity == Associativity::Left) as u8;
        let argument = p.expr_with_min_prec(ctx, next_min_prec, terminators, asi)?;
        let argument = match operator.name {
          OperatorName::PrefixIncrement | OperatorName::PrefixDecrement => {
            expr_to_assign_target(argument, operator.name)?
          }
          _ => argument,
        };
        Ok(Syntax::UnaryExpr {
          operator: operator.name,
          argument,
        })
      });
    };

    if t0.typ == TT::KeywordAwait && !ctx.rules.await_allowed {
      return self.with_loc(|p| {
        p.consume();
        let prec = OPERATORS[&OperatorName::Await].precedence;
        Ok(Syntax::AwaitExpr {
          argument: p.expr_with_min_prec(ctx, prec, terminators, asi)?,
        })
      });
    }

    if t0.typ == TT::KeywordYield && !ctx.rules.yield_allowed {
      return self.with_loc(|p| {
        p.consume();
        let delegate = p.consume_if(TT::Asterisk).is_match();
        let next = p.peek_with_mode(LexMode::SlashIsRegex);
        let has_argument = delegate
          || !(next.preceded_by_line_terminator
            || terminators.contains(&next.typ)
            || matches!(
              next.typ,
              TT::EOF
                | TT::Semicolon
                | TT::Comma
                | TT::Colon
                | TT::ParenthesisClose
                | TT::BracketClose
                | TT::BraceClose
            ));
        let argument = if has_argument {
          Some(p.expr_with_min_prec(ctx, assignment_precedence(), terminators, asi)?)
        } else {
          None
        };
        Ok(Syntax::YieldExpr { argument, delegate })
      });
    }

    let [_, t1, t2] = self.peek_n::<3>();

    // Check for async keyword first, before checking if it's a valid identifier.
    if t0.typ == TT::KeywordAsync && !t1.preceded_by_line_terminator {
      match t1.typ {
        TT::ParenthesisOpen => {
          if let Some(arrow) = self.rewindable(|p| p.arrow_func_expr(ctx, terminators, asi)) {
            return Ok(arrow);
          }
        }
        TT::KeywordFunction => return self.func_expr(ctx),
        _ if is_valid_pattern_identifier(t1.typ, ctx.rules) && t2.typ == TT::EqualsChevronRight => {
          return self.arrow_func_expr(ctx, terminators, asi);
        }
        _ => {}
      };
    };

    if is_valid_pattern_identifier(t0.typ, ctx.rules) {
      if t1.typ == TT::EqualsChevronRight {
        // Single-unparenthesised-parameter arrow function.
        return self.arrow_func_expr(ctx, terminators, asi);
      }
      let t = self.consume();
      return Ok(Node::new(t.loc, Syntax::IdExpr {
        name: self.string(t.loc),
      }));
    };

    #[rustfmt::skip]
    let expr = match t0.typ {
      TT::BracketOpen => self.lit_arr(ctx)?,
      TT::BraceOpen => self.lit_obj(ctx)?,
      TT::KeywordClass => self.class_expr(ctx)?,
      TT::KeywordFunction => self.func_expr(ctx)?,
      TT::KeywordImport => match t1.typ {
        TT::Dot => self.with_loc(|p| {
          p.consume();
          p.consume();
          let prop = p.consume();
          if p.str(prop.loc) != "meta" {
            return Err(prop.error(SyntaxErrorType::ExpectedSyntax("`meta` property")));
          }
          Ok(Syntax::ImportMeta {})
        })?,
        TT::ParenthesisOpen => self.with_loc(|p| {
          p.consume();
          p.consume();
          let argument = p.expr(ctx, [TT::ParenthesisClose])?;
          p.require(TT::ParenthesisClose)?;
          Ok(Syntax::ImportCall { argument })
        })?,
        _ => return Err(t0.error(SyntaxErrorType::ExpectedSyntax("import expression"))),
      },
      TT::KeywordNew if t1.typ == TT::Dot => self.with_loc(|p| {
        p.consume();
        p.consume();
        let prop = p.consume();
        if p.str(prop.loc) != "target" {
          return Err(prop.error(SyntaxErrorType::ExpectedSyntax("`target` property")));
        }
        Ok(Syntax::NewTarget {})
      })?,
      TT::KeywordNew => self.new_expr(ctx)?,
      TT::KeywordSuper => self.with_loc(|p| p.require(TT::KeywordSuper).map(|_| Syntax::SuperExpr {}))?,
      TT::KeywordThis => self.with_loc(|p| p.require(TT::KeywordThis).map(|_| Syntax::ThisExpr {}))?,
      TT::LiteralBigInt => self.lit_bigint()?,
      TT::LiteralTrue | TT::LiteralFalse => self.with_loc(|p| {
        let t = p.consume();
        Ok(Syntax::LitBool { value: t.typ == TT::LiteralTrue })
      })?,
      TT::LiteralNull => self.with_loc(|p| p.require(TT::LiteralNull).map(|_| Syntax::LitNull {}))?,
      TT::LiteralNumber => self.lit_num()?,
      TT::LiteralRegex => self.lit_regex()?,
      TT::LiteralString => self.lit_str()?,
      TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd => self.lit_template(ctx)?,
      TT::ParenthesisOpen => self.arrow_function_or_grouping_expr(ctx, terminators, asi)?,
      // `#x in obj`.
      TT::PrivateMember => self.with_loc(|p| {
        let name = p.consume_as_string();
        Ok(Syntax::IdExpr { name })
      })?,
      TT::EOF => return Err(t0.error(SyntaxErrorType::UnexpectedEnd)),
      _ => return Err(t0.error(SyntaxErrorType::ExpectedSyntax("expression operand"))),
    };
    Ok(expr)
  }

  pub fn expr_with_min_prec<const N: usize>(
    &mut self,
    ctx: ParseCtx,
    min_prec: u8,
    terminators: [TT; N],
    asi: &mut Asi,
  ) -> SyntaxResult<Node> {
    let first = self.peek_with_mode(LexMode::SlashIsRegex).typ;
    // A parenthesized operand starts with `(` instead.
    let bare_unary = UNARY_OPERATOR_MAPPING.contains_key(&first) || first == TT::KeywordAwait;
    let mut left = self.expr_operand(ctx, terminators, asi)?;

    loop {
      let cp = self.checkpoint();
      let t = self.consume();

      if terminators.contains(&t.typ) {
        self.restore_checkpoint(cp);
        break;
      };

      match t.typ {
        // Automatic Semicolon Insertion rules: no newline between operand and postfix operator.
        TT::PlusPlus | TT::HyphenHyphen if !t.preceded_by_line_terminator => {
          let operator_name = match t.typ {
            TT::PlusPlus => OperatorName::PostfixIncrement,
            _ => OperatorName::PostfixDecrement,
          };
          let operator = &OPERATORS[&operator_name];
          if operator.precedence < min_prec {
            self.restore_checkpoint(cp);
            break;
          };
          let argument = expr_to_assign_target(left, operator_name)?;
          left = Node::new(argument.loc + t.loc, Syntax::UnaryPostfixExpr {
            operator: operator_name,
            argument,
          });
          continue;
        }
        // Automatic Semicolon Insertion rules: no newline between operand and template literal.
        TT::LiteralTemplatePartString | TT::LiteralTemplatePartStringEnd if !t.preceded_by_line_terminator => {
          self.restore_checkpoint(cp);
          let start = left.loc;
          let (quasis, exprs) = self.lit_template_parts(ctx)?;
          let end = self.since_checkpoint(cp);
          left = Node::new(start + end, Syntax::TaggedTemplate {
            tag: left,
            quasis,
            exprs,
          });
          continue;
        }
        _ => {}
      };

      match MULTARY_OPERATOR_MAPPING.get(&t.typ) {
        None => {
          if asi.can_end_with_asi
            && (t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF)
          {
            // Automatic Semicolon Insertion.
            self.restore_checkpoint(cp);
            asi.did_end_with_asi = true;
            break;
          };
          return Err(t.error(SyntaxErrorType::ExpectedSyntax("expression operator")));
        }
        Some(operator) => {
          if operator.precedence < min_prec {
            self.restore_checkpoint(cp);
            break;
          };
          if operator.name == OperatorName::Exponentiation && bare_unary && is_unary_base(&left) {
            return Err(t.error(SyntaxErrorType::UnaryBaseOfExponentiation));
          }

          let next_min_prec = operator.precedence + (operator.associativity == Associativity::Left) as u8;

          left = match operator.name {
            OperatorName::Call | OperatorName::OptionalChainingCall => {
              let arguments = self.call_args(ctx)?;
              let end = self.require(TT::ParenthesisClose)?;
              Node::new(left.loc + end.loc, Syntax::CallExpr {
                callee: left,
                arguments,
                optional: operator.name == OperatorName::OptionalChainingCall,
              })
            }
            OperatorName::ComputedMemberAccess | OperatorName::OptionalChainingComputedMemberAccess => {
              let member = self.expr_seq(ctx, [TT::BracketClose])?;
              let end = self.require(TT::BracketClose)?;
              Node::new(left.loc + end.loc, Syntax::ComputedMemberExpr {
                object: left,
                member,
                optional: operator.name == OperatorName::OptionalChainingComputedMemberAccess,
              })
            }
            OperatorName::Conditional => {
              let consequent = self.expr(ctx, [TT::Colon])?;
              self.require(TT::Colon)?;
              let alternate = self.expr_with_min_prec(
                ctx,
                OPERATORS[&OperatorName::ConditionalAlternate].precedence,
                terminators,
                asi,
              )?;
              Node::new(left.loc + alternate.loc, Syntax::CondExpr {
                test: left,
                consequent,
                alternate,
              })
            }
            OperatorName::MemberAccess | OperatorName::OptionalChainingMemberAccess => {
              let prop = self.member_prop_name()?;
              let end = self.since_checkpoint(cp);
              Node::new(left.loc + end, Syntax::MemberExpr {
                object: left,
                prop,
                optional: operator.name == OperatorName::OptionalChainingMemberAccess,
              })
            }
            _ => {
              if operator.name.is_assignment() {
                left = expr_to_assign_target(left, operator.name)?;
              };
              let right = self.expr_with_min_prec(ctx, next_min_prec, terminators, asi)?;
              Node::new(left.loc + right.loc, Syntax::BinaryExpr {
                operator: operator.name,
                left,
                right,
              })
            }
          };
        }
      };
    }

    Ok(left)
  }
}

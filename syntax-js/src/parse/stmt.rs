use super::expr::Asi;
use super::pat::expr_to_assign_target;
use super::pat::is_valid_pattern_identifier;
use super::pat::ParsePatternRules;
use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::Syntax;
use crate::ast::syntax::VarDeclKind;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::operator::OperatorName;
use crate::operator::OPERATORS;
use crate::token::TT;

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum VarDeclParseMode {
  // Standard parsing mode for var/let/const statement.
  Asi,
  // Parse as many valid declarators as possible, then break before the first invalid token (i.e.
  // not a comma). Used by for-loop parser.
  Leftmost,
}

impl<'a> Parser<'a> {
  /// Requires a semicolon unless Automatic Semicolon Insertion applies.
  pub fn semicolon_or_asi(&mut self) -> SyntaxResult<()> {
    if self.consume_if(TT::Semicolon).is_match() {
      return Ok(());
    }
    let t = self.peek();
    if t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF {
      return Ok(());
    }
    Err(t.error(SyntaxErrorType::RequiredTokenNotFound(TT::Semicolon)))
  }

  fn is_let_decl(&mut self) -> bool {
    let [t0, t1] = self.peek_n::<2>();
    t0.typ == TT::KeywordLet
      && (t1.typ == TT::BracketOpen
        || t1.typ == TT::BraceOpen
        || is_valid_pattern_identifier(t1.typ, ParsePatternRules {
          await_allowed: true,
          yield_allowed: true,
        }))
  }

  pub fn stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    let [t0, t1] = self.peek_n::<2>();
    #[rustfmt::skip]
    let stmt = match t0.typ {
      TT::BraceOpen => self.block_stmt(ctx)?,
      TT::KeywordBreak => self.break_or_continue_stmt(ctx, true)?,
      TT::KeywordClass => self.class_decl(ctx, true)?,
      TT::KeywordConst | TT::KeywordVar => self.var_decl_stmt(ctx)?,
      TT::KeywordLet if self.is_let_decl() => self.var_decl_stmt(ctx)?,
      TT::KeywordContinue => self.break_or_continue_stmt(ctx, false)?,
      TT::KeywordDebugger => self.with_loc(|p| {
        p.consume();
        p.semicolon_or_asi()?;
        Ok(Syntax::DebuggerStmt {})
      })?,
      TT::KeywordDo => self.do_while_stmt(ctx)?,
      TT::KeywordExport if ctx.is_module => self.export_stmt(ctx)?,
      TT::KeywordFor => self.for_stmt(ctx)?,
      TT::KeywordFunction => self.func_decl(ctx, true)?,
      TT::KeywordAsync if t1.typ == TT::KeywordFunction && !t1.preceded_by_line_terminator => self.func_decl(ctx, true)?,
      TT::KeywordIf => self.if_stmt(ctx)?,
      TT::KeywordImport if ctx.is_module && t1.typ != TT::ParenthesisOpen && t1.typ != TT::Dot => self.import_stmt(ctx)?,
      TT::KeywordReturn => self.return_stmt(ctx)?,
      TT::KeywordSwitch => self.switch_stmt(ctx)?,
      TT::KeywordThrow => self.throw_stmt(ctx)?,
      TT::KeywordTry => self.try_stmt(ctx)?,
      TT::KeywordWhile => self.while_stmt(ctx)?,
      TT::KeywordWith => self.with_stmt(ctx)?,
      TT::Semicolon => self.with_loc(|p| p.require(TT::Semicolon).map(|_| Syntax::EmptyStmt {}))?,
      t if is_valid_pattern_identifier(t, ctx.rules) && t1.typ == TT::Colon => self.label_stmt(ctx)?,
      _ => self.expr_stmt(ctx)?,
    };
    Ok(stmt)
  }

  pub fn block_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let body = p.stmts(ctx, TT::BraceClose)?;
      p.require(TT::BraceClose)?;
      Ok(Syntax::BlockStmt { body })
    })
  }

  fn label_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let name = p.consume_as_string();
      p.require(TT::Colon)?;
      let body = p.stmt(ctx)?;
      Ok(Syntax::LabelStmt { name, body })
    })
  }

  fn break_or_continue_stmt(&mut self, ctx: ParseCtx, is_break: bool) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.consume();
      let t = p.peek();
      let label = if is_valid_pattern_identifier(t.typ, ctx.rules) && !t.preceded_by_line_terminator {
        Some(p.consume_as_string())
      } else {
        None
      };
      p.semicolon_or_asi()?;
      Ok(if is_break {
        Syntax::BreakStmt { label }
      } else {
        Syntax::ContinueStmt { label }
      })
    })
  }

  // Outputs a statement node, not an expression; don't reuse it where an expression is expected.
  pub fn expr_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let mut asi = Asi::can();
      let expr = p.expr_with_asi(ctx, [TT::Semicolon], &mut asi)?;
      if !asi.did_end_with_asi {
        p.semicolon_or_asi()?;
      };
      Ok(Syntax::ExprStmt { expr })
    })
  }

  pub fn var_decl(&mut self, ctx: ParseCtx, mode: VarDeclParseMode) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let t = p.consume();
      let kind = match t.typ {
        TT::KeywordLet => VarDeclKind::Let,
        TT::KeywordConst => VarDeclKind::Const,
        TT::KeywordVar => VarDeclKind::Var,
        _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("variable declaration"))),
      };
      let mut declarators = Vec::new();
      let mut asi = match mode {
        VarDeclParseMode::Asi => Asi::can(),
        VarDeclParseMode::Leftmost => Asi::no(),
      };
      loop {
        let declarator = p.with_loc(|p| {
          let target = p.pat(ctx)?;
          let init = p.consume_if(TT::Equals).and_then(|| {
            p.expr_with_min_prec(
              ctx,
              OPERATORS[&OperatorName::Assignment].precedence,
              [TT::Semicolon, TT::Comma, TT::KeywordIn, TT::KeywordOf],
              &mut asi,
            )
          })?;
          Ok(Syntax::VarDeclarator { target, init })
        })?;
        declarators.push(declarator);
        if asi.did_end_with_asi || !p.consume_if(TT::Comma).is_match() {
          break;
        }
      }
      Ok(Syntax::VarDecl { kind, declarators })
    })
  }

  fn var_decl_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    let decl = self.var_decl(ctx, VarDeclParseMode::Asi)?;
    self.semicolon_or_asi()?;
    Ok(decl)
  }

  fn for_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordFor)?;
      let is_await = p.consume_if(TT::KeywordAwait).is_match();
      p.require(TT::ParenthesisOpen)?;
      let t = p.peek();
      let init = match t.typ {
        TT::Semicolon => None,
        TT::KeywordVar | TT::KeywordConst => Some(p.var_decl(ctx, VarDeclParseMode::Leftmost)?),
        TT::KeywordLet if p.is_let_decl() => Some(p.var_decl(ctx, VarDeclParseMode::Leftmost)?),
        _ => Some(p.expr_with_min_prec(
          ctx,
          1,
          [TT::Semicolon, TT::KeywordIn, TT::KeywordOf],
          &mut Asi::no(),
        )?),
      };
      let next = p.peek();
      match (init, next.typ) {
        (Some(left), TT::KeywordIn | TT::KeywordOf) => {
          p.consume();
          let left = match left.stx.as_ref() {
            Syntax::VarDecl { .. } => left,
            _ => expr_to_assign_target(left, OperatorName::Assignment)?,
          };
          let right = if next.typ == TT::KeywordIn {
            p.expr_seq(ctx, [TT::ParenthesisClose])?
          } else {
            p.expr(ctx, [TT::ParenthesisClose])?
          };
          p.require(TT::ParenthesisClose)?;
          let body = p.stmt(ctx)?;
          Ok(if next.typ == TT::KeywordIn {
            Syntax::ForInStmt { left, right, body }
          } else {
            Syntax::ForOfStmt {
              is_await,
              left,
              right,
              body,
            }
          })
        }
        (init, _) => {
          p.require(TT::Semicolon)?;
          let test = if p.peek().typ == TT::Semicolon {
            None
          } else {
            Some(p.expr_seq(ctx, [TT::Semicolon])?)
          };
          p.require(TT::Semicolon)?;
          let update = if p.peek().typ == TT::ParenthesisClose {
            None
          } else {
            Some(p.expr_seq(ctx, [TT::ParenthesisClose])?)
          };
          p.require(TT::ParenthesisClose)?;
          let body = p.stmt(ctx)?;
          Ok(Syntax::ForStmt {
            init,
            test,
            update,
            body,
          })
        }
      }
    })
  }

  fn if_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordIf)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.expr_seq(ctx, [TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      let consequent = p.stmt(ctx)?;
      let alternate = p.consume_if(TT::KeywordElse).and_then(|| p.stmt(ctx))?;
      Ok(Syntax::IfStmt {
        test,
        consequent,
        alternate,
      })
    })
  }

  fn return_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordReturn)?;
      let t = p.peek();
      let value = if t.preceded_by_line_terminator || t.typ == TT::BraceClose || t.typ == TT::EOF {
        // Automatic Semicolon Insertion.
        None
      } else if p.consume_if(TT::Semicolon).is_match() {
        None
      } else {
        let mut asi = Asi::can();
        let value = p.expr_with_asi(ctx, [TT::Semicolon], &mut asi)?;
        if !asi.did_end_with_asi {
          p.semicolon_or_asi()?;
        };
        Some(value)
      };
      Ok(Syntax::ReturnStmt { value })
    })
  }

  fn throw_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordThrow)?;
      if p.peek().preceded_by_line_terminator {
        // Illegal under Automatic Semicolon Insertion rules.
        return Err(start.error(SyntaxErrorType::LineTerminatorAfterThrow));
      }
      let mut asi = Asi::can();
      let value = p.expr_with_asi(ctx, [TT::Semicolon], &mut asi)?;
      if !asi.did_end_with_asi {
        p.semicolon_or_asi()?;
      };
      Ok(Syntax::ThrowStmt { value })
    })
  }

  fn try_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let start = p.require(TT::KeywordTry)?;
      let block = p.block_stmt(ctx)?;
      let handler = if p.peek().typ == TT::KeywordCatch {
        Some(p.with_loc(|p| {
          p.consume();
          let param = p.consume_if(TT::ParenthesisOpen).and_then(|| {
            let pat = p.pat(ctx)?;
            p.require(TT::ParenthesisClose)?;
            Ok(pat)
          })?;
          let body = p.block_stmt(ctx)?;
          Ok(Syntax::CatchClause { param, body })
        })?)
      } else {
        None
      };
      let finalizer = p.consume_if(TT::KeywordFinally).and_then(|| p.block_stmt(ctx))?;
      if handler.is_none() && finalizer.is_none() {
        return Err(start.error(SyntaxErrorType::TryStatementHasNoCatchOrFinally));
      }
      Ok(Syntax::TryStmt {
        block,
        handler,
        finalizer,
      })
    })
  }

  fn while_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordWhile)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.expr_seq(ctx, [TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      let body = p.stmt(ctx)?;
      Ok(Syntax::WhileStmt { test, body })
    })
  }

  fn with_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordWith)?;
      p.require(TT::ParenthesisOpen)?;
      let object = p.expr_seq(ctx, [TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      let body = p.stmt(ctx)?;
      Ok(Syntax::WithStmt { object, body })
    })
  }

  fn do_while_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordDo)?;
      let body = p.stmt(ctx)?;
      p.require(TT::KeywordWhile)?;
      p.require(TT::ParenthesisOpen)?;
      let test = p.expr_seq(ctx, [TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      // A semicolon is always inserted after a do-while, even on the same line.
      let _ = p.consume_if(TT::Semicolon);
      Ok(Syntax::DoWhileStmt { body, test })
    })
  }

  fn switch_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordSwitch)?;
      p.require(TT::ParenthesisOpen)?;
      let discriminant = p.expr_seq(ctx, [TT::ParenthesisClose])?;
      p.require(TT::ParenthesisClose)?;
      p.require(TT::BraceOpen)?;
      let mut cases = Vec::new();
      while !p.consume_if(TT::BraceClose).is_match() {
        cases.push(p.with_loc(|p| {
          let t = p.consume();
          let test = match t.typ {
            TT::KeywordCase => Some(p.expr_seq(ctx, [TT::Colon])?),
            TT::KeywordDefault => None,
            _ => return Err(t.error(SyntaxErrorType::ExpectedSyntax("switch case"))),
          };
          p.require(TT::Colon)?;
          let mut body = Vec::new();
          while !matches!(
            p.peek().typ,
            TT::KeywordCase | TT::KeywordDefault | TT::BraceClose | TT::EOF
          ) {
            body.push(p.stmt(ctx)?);
          }
          Ok(Syntax::SwitchCase { test, body })
        })?);
      }
      Ok(Syntax::SwitchStmt {
        discriminant,
        cases,
      })
    })
  }
}

use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::Class;
use crate::ast::syntax::ClassMemberKind;
use crate::ast::syntax::Func;
use crate::ast::syntax::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// Parses a parenthesised parameter list, including the parentheses.
  pub fn params(&mut self, ctx: ParseCtx) -> SyntaxResult<Vec<Node>> {
    self.require(TT::ParenthesisOpen)?;
    let mut params = Vec::new();
    while !self.consume_if(TT::ParenthesisClose).is_match() {
      if self.peek().typ == TT::DotDotDot {
        params.push(self.with_loc(|p| {
          p.consume();
          Ok(Syntax::RestPat { target: p.pat(ctx)? })
        })?);
        self.require(TT::ParenthesisClose)?;
        break;
      }
      params.push(self.pat_with_default(ctx)?);
      if !self.consume_if(TT::Comma).is_match() {
        self.require(TT::ParenthesisClose)?;
        break;
      }
    }
    Ok(params)
  }

  pub fn stmts(&mut self, ctx: ParseCtx, end: TT) -> SyntaxResult<Vec<Node>> {
    let mut body = Vec::new();
    while self.peek().typ != end {
      body.push(self.stmt(ctx)?);
    }
    Ok(body)
  }

  /// Parses statements until `end`, splitting off the leading directive prologue.
  pub fn body_with_directives(&mut self, ctx: ParseCtx, end: TT) -> SyntaxResult<(Vec<String>, Vec<Node>)> {
    let mut directives = Vec::new();
    let mut body = Vec::new();
    loop {
      let t = self.peek();
      if t.typ != TT::LiteralString {
        break;
      }
      let stmt = self.stmt(ctx)?;
      match stmt.stx.as_ref() {
        Syntax::ExprStmt { expr } if expr.loc == t.loc => {
          if let Syntax::LitStr { value } = expr.stx.as_ref() {
            directives.push(value.clone());
            continue;
          }
          body.push(stmt);
          break;
        }
        _ => {
          body.push(stmt);
          break;
        }
      };
    }
    body.extend(self.stmts(ctx, end)?);
    Ok((directives, body))
  }

  pub fn func_body(&mut self, ctx: ParseCtx) -> SyntaxResult<(Vec<String>, Node)> {
    let mut directives = Vec::new();
    let body = self.with_loc(|p| {
      p.require(TT::BraceOpen)?;
      let (d, body) = p.body_with_directives(ctx, TT::BraceClose)?;
      directives = d;
      p.require(TT::BraceClose)?;
      Ok(Syntax::BlockStmt { body })
    })?;
    Ok((directives, body))
  }

  /// Parses everything after the name of a function: parameters and body.
  fn func_signature_and_body(&mut self, ctx: ParseCtx, name: Option<Node>, is_async: bool, is_generator: bool) -> SyntaxResult<Func> {
    let rules = ctx
      .rules
      .with_await_allowed(!is_async && !ctx.is_module)
      .with_yield_allowed(!is_generator);
    let fn_ctx = ctx.in_function_body(rules);
    let params = self.params(fn_ctx)?;
    let (directives, body) = self.func_body(fn_ctx)?;
    Ok(Func {
      name,
      params,
      body,
      directives,
      is_async,
      is_generator,
      is_arrow: false,
    })
  }

  fn func_header(&mut self, ctx: ParseCtx, name_required: bool) -> SyntaxResult<Func> {
    let is_async = self.consume_if(TT::KeywordAsync).is_match();
    self.require(TT::KeywordFunction)?;
    let is_generator = self.consume_if(TT::Asterisk).is_match();
    let name = if self.peek().typ == TT::ParenthesisOpen && !name_required {
      None
    } else {
      Some(self.id_pat(ctx)?)
    };
    self.func_signature_and_body(ctx, name, is_async, is_generator)
  }

  pub fn func_decl(&mut self, ctx: ParseCtx, name_required: bool) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      Ok(Syntax::FuncDecl {
        func: p.func_header(ctx, name_required)?,
      })
    })
  }

  pub fn func_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      Ok(Syntax::FuncExpr {
        func: p.func_header(ctx, false)?,
      })
    })
  }

  /// Parses the parameters and body of a method into an anonymous function expression.
  pub fn method(&mut self, ctx: ParseCtx, is_async: bool, is_generator: bool) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      Ok(Syntax::FuncExpr {
        func: p.func_signature_and_body(ctx, None, is_async, is_generator)?,
      })
    })
  }

  fn class(&mut self, ctx: ParseCtx, name_required: bool) -> SyntaxResult<Class> {
    self.require(TT::KeywordClass)?;
    let t = self.peek();
    let name = if name_required || (t.typ != TT::KeywordExtends && t.typ != TT::BraceOpen) {
      Some(self.id_pat(ctx)?)
    } else {
      None
    };
    let extends = self
      .consume_if(TT::KeywordExtends)
      .and_then(|| self.expr(ctx, [TT::BraceOpen]))?;
    self.require(TT::BraceOpen)?;
    let mut members = Vec::new();
    while !self.consume_if(TT::BraceClose).is_match() {
      if self.consume_if(TT::Semicolon).is_match() {
        continue;
      }
      members.push(self.class_member(ctx)?);
    }
    Ok(Class {
      name,
      extends,
      members,
    })
  }

  fn class_member(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      let is_modifier = |t: TT| {
        !matches!(
          t,
          TT::ParenthesisOpen | TT::Equals | TT::Semicolon | TT::BraceClose
        )
      };
      let [t0, t1] = p.peek_n::<2>();
      if t0.typ == TT::KeywordStatic && t1.typ == TT::BraceOpen {
        let key = Node::new(t0.loc, Syntax::PropKey {
          name: "static".to_string(),
        });
        p.consume();
        let fn_ctx = ctx.in_function_body(ctx.rules);
        let (_, body) = p.func_body(fn_ctx)?;
        return Ok(Syntax::ClassMember {
          key,
          value: Some(body),
          computed: false,
          is_static: true,
          kind: ClassMemberKind::StaticBlock,
        });
      }
      let is_static = t0.typ == TT::KeywordStatic && is_modifier(t1.typ);
      if is_static {
        p.consume();
      }
      let [t0, t1] = p.peek_n::<2>();
      let mut kind = ClassMemberKind::Field;
      let mut is_async = false;
      let mut is_generator = false;
      match t0.typ {
        TT::KeywordGet if is_modifier(t1.typ) => {
          p.consume();
          kind = ClassMemberKind::Getter;
        }
        TT::KeywordSet if is_modifier(t1.typ) => {
          p.consume();
          kind = ClassMemberKind::Setter;
        }
        TT::KeywordAsync if is_modifier(t1.typ) && !t1.preceded_by_line_terminator => {
          p.consume();
          is_async = true;
          is_generator = p.consume_if(TT::Asterisk).is_match();
          kind = ClassMemberKind::Method;
        }
        TT::Asterisk => {
          p.consume();
          is_generator = true;
          kind = ClassMemberKind::Method;
        }
        _ => {}
      };
      let (key, computed) = p.prop_key(ctx)?;
      if kind != ClassMemberKind::Field || p.peek().typ == TT::ParenthesisOpen {
        let value = p.method(ctx, is_async, is_generator)?;
        return Ok(Syntax::ClassMember {
          key,
          value: Some(value),
          computed,
          is_static,
          kind: if kind == ClassMemberKind::Field {
            ClassMemberKind::Method
          } else {
            kind
          },
        });
      }
      let value = p
        .consume_if(TT::Equals)
        .and_then(|| p.expr_until_asi(ctx.in_function_body(ctx.rules), [TT::Semicolon, TT::BraceClose]))?;
      let t = p.peek();
      if !p.consume_if(TT::Semicolon).is_match() && !t.preceded_by_line_terminator && t.typ != TT::BraceClose {
        return Err(t.error(SyntaxErrorType::ExpectedSyntax("class member terminator")));
      }
      Ok(Syntax::ClassMember {
        key,
        value,
        computed,
        is_static,
        kind: ClassMemberKind::Field,
      })
    })
  }

  pub fn class_decl(&mut self, ctx: ParseCtx, name_required: bool) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      Ok(Syntax::ClassDecl {
        class: p.class(ctx, name_required)?,
      })
    })
  }

  pub fn class_expr(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      Ok(Syntax::ClassExpr {
        class: p.class(ctx, false)?,
      })
    })
  }
}

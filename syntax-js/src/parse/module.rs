use super::ParseCtx;
use super::Parser;
use crate::ast::node::Node;
use crate::ast::syntax::Syntax;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::KEYWORDS_MAPPING;
use crate::token::TT;

impl<'a> Parser<'a> {
  /// A name in an import or export clause, which may be any identifier name or a string.
  fn module_export_name(&mut self) -> SyntaxResult<(crate::loc::Loc, String)> {
    let t = self.peek();
    match t.typ {
      TT::LiteralString => self.lit_str_value(),
      TT::Identifier => {
        self.consume();
        Ok((t.loc, self.string(t.loc)))
      }
      typ if KEYWORDS_MAPPING.contains_key(&typ) => {
        self.consume();
        Ok((t.loc, self.string(t.loc)))
      }
      _ => Err(t.error(SyntaxErrorType::ExpectedSyntax("exported name"))),
    }
  }

  fn from_clause(&mut self) -> SyntaxResult<String> {
    self.require(TT::KeywordFrom)?;
    Ok(self.lit_str_value()?.1)
  }

  pub fn import_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordImport)?;
      if p.peek().typ == TT::LiteralString {
        let source = p.lit_str_value()?.1;
        p.semicolon_or_asi()?;
        return Ok(Syntax::ImportDecl {
          default: None,
          namespace: None,
          named: Vec::new(),
          source,
        });
      }
      let mut default = None;
      let mut namespace = None;
      let mut named = Vec::new();
      if p.peek().typ != TT::Asterisk && p.peek().typ != TT::BraceOpen {
        default = Some(p.id_pat(ctx)?);
        if !p.consume_if(TT::Comma).is_match() {
          let source = p.from_clause()?;
          p.semicolon_or_asi()?;
          return Ok(Syntax::ImportDecl {
            default,
            namespace,
            named,
            source,
          });
        }
      }
      if p.consume_if(TT::Asterisk).is_match() {
        p.require(TT::KeywordAs)?;
        namespace = Some(p.id_pat(ctx)?);
      } else {
        p.require(TT::BraceOpen)?;
        named = p.list(TT::Comma, TT::BraceClose, |p| {
          p.with_loc(|p| {
            let (loc, imported) = p.module_export_name()?;
            let local = if p.consume_if(TT::KeywordAs).is_match() {
              p.id_pat(ctx)?
            } else {
              Node::new(loc, Syntax::IdPat {
                name: imported.clone(),
              })
            };
            Ok(Syntax::ImportSpecifier { imported, local })
          })
        })?;
      }
      let source = p.from_clause()?;
      p.semicolon_or_asi()?;
      Ok(Syntax::ImportDecl {
        default,
        namespace,
        named,
        source,
      })
    })
  }

  pub fn export_stmt(&mut self, ctx: ParseCtx) -> SyntaxResult<Node> {
    self.with_loc(|p| {
      p.require(TT::KeywordExport)?;
      let [t0, t1] = p.peek_n::<2>();
      match t0.typ {
        TT::Asterisk => {
          p.consume();
          let alias = if p.consume_if(TT::KeywordAs).is_match() {
            Some(p.module_export_name()?.1)
          } else {
            None
          };
          let source = p.from_clause()?;
          p.semicolon_or_asi()?;
          Ok(Syntax::ExportAll { alias, source })
        }
        TT::BraceOpen => {
          p.consume();
          let names = p.list(TT::Comma, TT::BraceClose, |p| {
            p.with_loc(|p| {
              let (loc, local) = p.module_export_name()?;
              let exported = if p.consume_if(TT::KeywordAs).is_match() {
                p.module_export_name()?.1
              } else {
                local.clone()
              };
              Ok(Syntax::ExportSpecifier {
                local: Node::new(loc, Syntax::IdExpr { name: local }),
                exported,
              })
            })
          })?;
          let source = if p.peek().typ == TT::KeywordFrom {
            Some(p.from_clause()?)
          } else {
            None
          };
          let specifiers = match source {
            // Re-exported names don't refer to local bindings.
            Some(_) => names
              .into_iter()
              .map(|mut n| {
                if let Syntax::ExportSpecifier { local, .. } = n.stx.as_mut() {
                  if let Syntax::IdExpr { name } = local.stx.as_ref() {
                    let name = name.clone();
                    *local = Node::new(local.loc, Syntax::PropKey { name });
                  }
                }
                n
              })
              .collect(),
            None => names,
          };
          p.semicolon_or_asi()?;
          Ok(Syntax::ExportNamed { specifiers, source })
        }
        TT::KeywordDefault => {
          p.consume();
          let value = match t1.typ {
            TT::KeywordFunction => p.func_decl(ctx, false)?,
            TT::KeywordAsync => {
              let [_, _, t2] = p.peek_n::<3>();
              if t2.typ == TT::KeywordFunction && !t2.preceded_by_line_terminator {
                p.func_decl(ctx, false)?
              } else {
                let value = p.expr_until_asi(ctx, [TT::Semicolon])?;
                p.semicolon_or_asi()?;
                value
              }
            }
            TT::KeywordClass => p.class_decl(ctx, false)?,
            _ => {
              let value = p.expr_until_asi(ctx, [TT::Semicolon])?;
              p.semicolon_or_asi()?;
              value
            }
          };
          Ok(Syntax::ExportDefaultExpr { value })
        }
        _ => {
          let decl = match t0.typ {
            TT::KeywordVar | TT::KeywordLet | TT::KeywordConst => {
              let decl = p.var_decl(ctx, super::stmt::VarDeclParseMode::Asi)?;
              p.semicolon_or_asi()?;
              decl
            }
            TT::KeywordFunction | TT::KeywordAsync => p.func_decl(ctx, true)?,
            TT::KeywordClass => p.class_decl(ctx, true)?,
            _ => return Err(t0.error(SyntaxErrorType::ExpectedSyntax("exportable"))),
          };
          Ok(Syntax::ExportDecl { decl })
        }
      }
    })
  }
}

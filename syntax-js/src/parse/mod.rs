use crate::ast::node::Node;
use crate::ast::syntax::Syntax;
use crate::error::SyntaxError;
use crate::error::SyntaxErrorType;
use crate::error::SyntaxResult;
use crate::lex::lex_next;
use crate::lex::LexMode;
use crate::lex::Lexer;
use crate::loc::Loc;
use crate::token::Token;
use crate::token::TT;
use pat::ParsePatternRules;

pub mod expr;
pub mod func;
pub mod lit;
pub mod module;
pub mod operator;
pub mod pat;
pub mod stmt;
#[cfg(test)]
mod tests;

// Almost every parse_* function takes these values. The struct is received by value and altered
// copies are passed down with the with_* methods, so nothing has to be unwound after a call
// returns.
#[derive(Clone, Copy)]
pub struct ParseCtx {
  pub rules: ParsePatternRules,
  pub is_module: bool,
}

impl ParseCtx {
  pub fn with_rules(&self, rules: ParsePatternRules) -> ParseCtx {
    ParseCtx { rules, ..*self }
  }

  pub fn in_function_body(&self, rules: ParsePatternRules) -> ParseCtx {
    self.with_rules(rules)
  }
}

#[derive(Debug)]
#[must_use]
pub struct MaybeToken {
  typ: TT,
  loc: Loc,
  matched: bool,
}

impl MaybeToken {
  pub fn is_match(&self) -> bool {
    self.matched
  }

  pub fn match_loc(&self) -> Option<Loc> {
    if self.matched {
      Some(self.loc)
    } else {
      None
    }
  }

  pub fn error(&self, err: SyntaxErrorType) -> SyntaxError {
    debug_assert!(!self.matched);
    self.loc.error(err, Some(self.typ))
  }

  pub fn and_then<R, F: FnOnce() -> SyntaxResult<R>>(self, f: F) -> SyntaxResult<Option<R>> {
    Ok(if self.matched { Some(f()?) } else { None })
  }
}

#[derive(Clone, Copy)]
pub struct ParserCheckpoint {
  next_tok_i: usize,
}

/// To get the lexer's `next` after this token was lexed, use `token.loc.1`.
struct BufferedToken {
  token: Token,
  lex_mode: LexMode,
}

pub struct Parser<'a> {
  lexer: Lexer<'a>,
  buf: Vec<BufferedToken>,
  next_tok_i: usize,
}

// Parsing routines are methods on Parser spread over the submodules, rather than free functions
// taking `&mut Parser`.
impl<'a> Parser<'a> {
  pub fn new(lexer: Lexer<'a>) -> Parser<'a> {
    Parser {
      lexer,
      buf: Vec::new(),
      next_tok_i: 0,
    }
  }

  pub fn source_range(&self) -> Loc {
    self.lexer.source_range()
  }

  pub fn str(&self, loc: Loc) -> &str {
    &self.lexer[loc]
  }

  pub fn string(&self, loc: Loc) -> String {
    self.str(loc).to_string()
  }

  pub fn checkpoint(&self) -> ParserCheckpoint {
    ParserCheckpoint {
      next_tok_i: self.next_tok_i,
    }
  }

  /// Range from the first token consumed after `checkpoint` to the last token consumed so far.
  pub fn since_checkpoint(&self, checkpoint: ParserCheckpoint) -> Loc {
    let start = match self.buf.get(checkpoint.next_tok_i) {
      Some(t) => t.token.loc.0,
      None => self.lexer.next(),
    };
    if self.next_tok_i <= checkpoint.next_tok_i {
      return Loc(start, start);
    }
    Loc(start, self.buf[self.next_tok_i - 1].token.loc.1)
  }

  pub fn restore_checkpoint(&mut self, checkpoint: ParserCheckpoint) {
    self.next_tok_i = checkpoint.next_tok_i;
  }

  fn reset_to(&mut self, n: usize) {
    self.next_tok_i = n;
    self.buf.truncate(n);
    match self.buf.last() {
      Some(t) => self.lexer.seek(t.token.loc.1),
      None => self.lexer.seek(0),
    };
  }

  fn forward<K: FnOnce(&Token) -> bool>(&mut self, mode: LexMode, keep: K) -> (bool, Token) {
    if self
      .buf
      .get(self.next_tok_i)
      .is_some_and(|t| t.lex_mode != mode)
    {
      self.reset_to(self.next_tok_i);
    }
    if self.buf.len() == self.next_tok_i {
      let token = lex_next(&mut self.lexer, mode);
      self.buf.push(BufferedToken {
        token,
        lex_mode: mode,
      });
    }
    let t = self.buf[self.next_tok_i].token.clone();
    let k = keep(&t);
    if k {
      self.next_tok_i += 1;
    };
    (k, t)
  }

  pub fn consume_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| true).1
  }

  pub fn consume(&mut self) -> Token {
    self.consume_with_mode(LexMode::Standard)
  }

  /// Consumes the next token regardless of type, and returns its raw source code as a string.
  pub fn consume_as_string(&mut self) -> String {
    let loc = self.consume().loc;
    self.string(loc)
  }

  pub fn peek_with_mode(&mut self, mode: LexMode) -> Token {
    self.forward(mode, |_| false).1
  }

  pub fn peek(&mut self) -> Token {
    self.peek_with_mode(LexMode::Standard)
  }

  pub fn peek_n<const N: usize>(&mut self) -> [Token; N] {
    let cp = self.checkpoint();
    let tokens = std::array::from_fn(|_| self.consume());
    self.restore_checkpoint(cp);
    tokens
  }

  pub fn maybe_consume_with_mode(&mut self, typ: TT, mode: LexMode) -> MaybeToken {
    let (matched, t) = self.forward(mode, |t| t.typ == typ);
    MaybeToken {
      typ,
      matched,
      loc: t.loc,
    }
  }

  pub fn consume_if(&mut self, typ: TT) -> MaybeToken {
    self.maybe_consume_with_mode(typ, LexMode::Standard)
  }

  pub fn require_with_mode(&mut self, typ: TT, mode: LexMode) -> SyntaxResult<Token> {
    let t = self.consume_with_mode(mode);
    if t.typ != typ {
      Err(t.error(SyntaxErrorType::RequiredTokenNotFound(typ)))
    } else {
      Ok(t)
    }
  }

  pub fn require(&mut self, typ: TT) -> SyntaxResult<Token> {
    self.require_with_mode(typ, LexMode::Standard)
  }

  pub fn with_loc<F>(&mut self, f: F) -> SyntaxResult<Node>
  where
    F: FnOnce(&mut Self) -> SyntaxResult<Syntax>,
  {
    let start = self.checkpoint();
    let stx = f(self)?;
    Ok(Node::new(self.since_checkpoint(start), stx))
  }

  /// Runs `f`, rewinding to where it started and returning None if it fails.
  pub fn rewindable<S, F>(&mut self, f: F) -> Option<S>
  where
    F: FnOnce(&mut Self) -> SyntaxResult<S>,
  {
    let cp = self.checkpoint();
    match f(self) {
      Ok(v) => Some(v),
      Err(_) => {
        self.restore_checkpoint(cp);
        None
      }
    }
  }

  /// Parse a list of items separated by a delimiter until `close`, which will also be consumed.
  /// Allows for a trailing delimiter.
  pub fn list<F>(&mut self, delim: TT, close: TT, mut f: F) -> SyntaxResult<Vec<Node>>
  where
    F: FnMut(&mut Self) -> SyntaxResult<Node>,
  {
    let mut nodes = Vec::new();
    while !self.consume_if(close).is_match() {
      nodes.push(f(self)?);
      if !self.consume_if(delim).is_match() {
        self.require(close)?;
        break;
      }
    }
    Ok(nodes)
  }

  fn top_level_ctx(is_module: bool) -> ParseCtx {
    ParseCtx {
      rules: ParsePatternRules {
        await_allowed: !is_module,
        yield_allowed: true,
      },
      is_module,
    }
  }

  pub fn standalone_expr(&mut self) -> SyntaxResult<Node> {
    let expr = self.expr_seq(Self::top_level_ctx(false), [TT::EOF])?;
    self.require(TT::EOF)?;
    Ok(expr)
  }

  pub fn top_level(&mut self, is_module: bool) -> SyntaxResult<Node> {
    let ctx = Self::top_level_ctx(is_module);
    let (directives, body) = self.body_with_directives(ctx, TT::EOF)?;
    self.require(TT::EOF)?;
    Ok(Node::new(self.source_range(), Syntax::Program {
      body,
      directives,
      is_module,
    }))
  }
}

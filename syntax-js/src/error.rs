use crate::loc::Loc;
use crate::token::TT;
use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fmt::Formatter;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum SyntaxErrorType {
  ExpectedNotFound,
  ExpectedSyntax(&'static str),
  InvalidAssigmentTarget,
  InvalidCharacterEscape,
  LineTerminatorAfterArrowFunctionParameters,
  LineTerminatorAfterThrow,
  LineTerminatorInRegex,
  LineTerminatorInString,
  MalformedLiteralNumber,
  RequiredTokenNotFound(TT),
  TryStatementHasNoCatchOrFinally,
  UnaryBaseOfExponentiation,
  UnexpectedEnd,
}

impl Display for SyntaxErrorType {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    let line_terminator = |place: &str| format!("line break not allowed {place}");
    let msg = match self {
      SyntaxErrorType::ExpectedNotFound => "unexpected token".to_string(),
      SyntaxErrorType::ExpectedSyntax(what) => format!("expected {what}"),
      SyntaxErrorType::InvalidAssigmentTarget => "cannot assign to this expression".to_string(),
      SyntaxErrorType::InvalidCharacterEscape => "bad escape sequence".to_string(),
      SyntaxErrorType::LineTerminatorAfterArrowFunctionParameters => {
        line_terminator("before `=>`")
      }
      SyntaxErrorType::LineTerminatorAfterThrow => line_terminator("after `throw`"),
      SyntaxErrorType::LineTerminatorInRegex => line_terminator("inside a regex literal"),
      SyntaxErrorType::LineTerminatorInString => line_terminator("inside a string literal"),
      SyntaxErrorType::MalformedLiteralNumber => "bad number literal".to_string(),
      SyntaxErrorType::RequiredTokenNotFound(tt) => format!("expected {tt:?}"),
      SyntaxErrorType::TryStatementHasNoCatchOrFinally => {
        "`try` needs a `catch` or `finally` clause".to_string()
      }
      SyntaxErrorType::UnaryBaseOfExponentiation => {
        "a unary expression before `**` must be parenthesized".to_string()
      }
      SyntaxErrorType::UnexpectedEnd => "source ended too early".to_string(),
    };
    f.write_str(&msg)
  }
}

/// A parse failure. Two errors are equal when their types are, wherever they occurred.
#[derive(Clone, Debug)]
pub struct SyntaxError {
  pub typ: SyntaxErrorType,
  pub loc: Loc,
  /// The token found where the error was detected, if any.
  pub actual_token: Option<TT>,
}

impl SyntaxError {
  pub fn new(typ: SyntaxErrorType, loc: Loc, actual_token: Option<TT>) -> SyntaxError {
    SyntaxError {
      typ,
      loc,
      actual_token,
    }
  }
}

impl Display for SyntaxError {
  fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
    write!(f, "{} at offset {}", self.typ, self.loc.0)?;
    if let Some(tt) = self.actual_token {
      write!(f, " (found {tt:?})")?;
    }
    Ok(())
  }
}

impl Error for SyntaxError {}

impl PartialEq for SyntaxError {
  fn eq(&self, other: &Self) -> bool {
    self.typ == other.typ
  }
}

impl Eq for SyntaxError {}

pub type SyntaxResult<T> = Result<T, SyntaxError>;

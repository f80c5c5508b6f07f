use crate::value::Value;
use std::fmt::Display;
use syntax_js::error::SyntaxError;

/// Errors produced while evaluating a snippet.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SandboxError {
  /// A JavaScript `throw` value. This is catchable from JS.
  #[error("uncaught exception: {}", describe_thrown(.0))]
  Throw(Value),

  /// A non-catchable termination condition.
  #[error("{0}")]
  Termination(TerminationReason),

  /// The snippet failed to parse.
  #[error("syntax error: {0}")]
  Syntax(SyntaxError),

  /// The snippet uses a construct the interpreter deliberately doesn't implement.
  #[error("unsupported: {0}")]
  Unsupported(&'static str),
}

impl SandboxError {
  /// Whether a script `try` may observe this error.
  pub fn is_catchable(&self) -> bool {
    matches!(self, SandboxError::Throw(_))
  }
}

impl From<SyntaxError> for SandboxError {
  fn from(err: SyntaxError) -> Self {
    SandboxError::Syntax(err)
  }
}

fn describe_thrown(value: &Value) -> String {
  match value {
    Value::Object(obj) => {
      let obj = obj.borrow();
      let name = obj.own_string_prop("name");
      let message = obj.own_string_prop("message");
      match (name, message) {
        (Some(name), Some(message)) => format!("{name}: {message}"),
        (Some(name), None) => name,
        _ => "[object]".to_string(),
      }
    }
    other => crate::ops::to_js_string(other).to_utf8_lossy(),
  }
}

/// The reason execution terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationReason {
  OutOfFuel,
  StackOverflow,
}

impl Display for TerminationReason {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      TerminationReason::OutOfFuel => f.write_str("execution terminated: out of fuel"),
      TerminationReason::StackOverflow => f.write_str("execution terminated: stack overflow"),
    }
  }
}

pub type SandboxResult<T> = Result<T, SandboxError>;

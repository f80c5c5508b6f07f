//! The evaluation capability used to pre-execute marked functions.

use sandbox_js::Budget;
use sandbox_js::Realm;
use sandbox_js::SandboxError;
use sandbox_js::Value;

/// A value handed back by an [`Evaluator`], detached from whatever engine produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum SandboxValue {
  Undefined,
  Null,
  Bool(bool),
  Number(f64),
  String(String),
  Array(Vec<SandboxValue>),
  /// Functions, plain objects, strings with lone surrogates, and arrays nested too deeply.
  Opaque,
}

/// Always recovered from: the code that failed to evaluate is left as is.
#[derive(Debug, Clone, thiserror::Error)]
pub enum EvalError {
  #[error(transparent)]
  Sandbox(#[from] SandboxError),

  #[error("{0}")]
  Other(String),
}

/// Runs a snippet of JavaScript and returns the completion value of its last statement.
/// Declarations made by one call stay visible to later calls.
pub trait Evaluator {
  fn evaluate(&mut self, code: &str) -> Result<SandboxValue, EvalError>;
}

const MAX_ARRAY_DEPTH: usize = 16;

/// [`Evaluator`] backed by the budgeted interpreter.
pub struct SandboxEvaluator {
  realm: Realm,
}

impl SandboxEvaluator {
  pub fn new(budget: Budget) -> SandboxEvaluator {
    SandboxEvaluator {
      realm: Realm::new(budget),
    }
  }
}

impl Default for SandboxEvaluator {
  fn default() -> Self {
    SandboxEvaluator::new(Budget::default())
  }
}

fn detach(value: &Value, depth: usize) -> SandboxValue {
  match value {
    Value::Undefined => SandboxValue::Undefined,
    Value::Null => SandboxValue::Null,
    Value::Bool(b) => SandboxValue::Bool(*b),
    Value::Number(n) => SandboxValue::Number(*n),
    Value::String(s) => match s.to_utf8() {
      Some(s) => SandboxValue::String(s),
      None => SandboxValue::Opaque,
    },
    Value::Object(obj) => {
      if depth >= MAX_ARRAY_DEPTH {
        return SandboxValue::Opaque;
      }
      let obj = obj.borrow();
      match obj.array_elements() {
        Some(elems) => SandboxValue::Array(elems.iter().map(|e| detach(e, depth + 1)).collect()),
        None => SandboxValue::Opaque,
      }
    }
  }
}

impl Evaluator for SandboxEvaluator {
  fn evaluate(&mut self, code: &str) -> Result<SandboxValue, EvalError> {
    let value = self.realm.evaluate(code)?;
    Ok(detach(&value, 0))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn converts_primitives_and_arrays() {
    let mut e = SandboxEvaluator::default();
    assert_eq!(e.evaluate("1 + 2").unwrap(), SandboxValue::Number(3.0));
    assert_eq!(
      e.evaluate("'a' + 'b'").unwrap(),
      SandboxValue::String("ab".into())
    );
    assert_eq!(
      e.evaluate("[1, [null, true]]").unwrap(),
      SandboxValue::Array(vec![
        SandboxValue::Number(1.0),
        SandboxValue::Array(vec![SandboxValue::Null, SandboxValue::Bool(true)]),
      ])
    );
    assert_eq!(e.evaluate("({})").unwrap(), SandboxValue::Opaque);
    assert_eq!(e.evaluate("void 0").unwrap(), SandboxValue::Undefined);
  }

  #[test]
  fn declarations_persist_between_calls() {
    let mut e = SandboxEvaluator::default();
    e.evaluate("function twice(x) { return x * 2; }").unwrap();
    assert_eq!(e.evaluate("twice(21)").unwrap(), SandboxValue::Number(42.0));
  }

  #[test]
  fn failures_are_reported() {
    let mut e = SandboxEvaluator::new(Budget {
      fuel: 1_000,
      max_stack_depth: 8,
    });
    assert!(e.evaluate("throw new Error('x')").is_err());
    assert!(e.evaluate("while (true) {}").is_err());
    assert!(e.evaluate("Math.random()").is_err());
  }
}

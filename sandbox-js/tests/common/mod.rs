#![allow(dead_code)]

use sandbox_js::ops::to_js_string;
use sandbox_js::Budget;
use sandbox_js::Realm;
use sandbox_js::SandboxError;
use sandbox_js::Value;

/// Evaluates `source` in a fresh realm and renders the result; strings are quoted so they can be
/// told apart from numbers.
pub fn eval(source: &str) -> Result<String, SandboxError> {
  let mut realm = Realm::new(Budget::default());
  eval_in(&mut realm, source)
}

pub fn eval_in(realm: &mut Realm, source: &str) -> Result<String, SandboxError> {
  Ok(match realm.evaluate(source)? {
    Value::String(s) => format!("{:?}", s.to_utf8_lossy()),
    other => to_js_string(&other).to_utf8_lossy(),
  })
}

/// The `name` of the error thrown by `source`.
pub fn thrown_name(source: &str) -> String {
  match eval(source) {
    Err(SandboxError::Throw(Value::Object(obj))) => obj
      .borrow()
      .own_string_prop("name")
      .unwrap_or_default(),
    other => panic!("expected a thrown error object, got {other:?}"),
  }
}

mod common;

use common::bare_config;
use deobfuscate_js::deobfuscate_with_evaluator;
use deobfuscate_js::eval::EvalError;
use deobfuscate_js::eval::Evaluator;
use deobfuscate_js::eval::SandboxValue;

/// Answers calls from a fixed table and records every snippet it's given.
#[derive(Default)]
struct Stub {
  seen: Vec<String>,
  answers: Vec<(&'static str, SandboxValue)>,
}

impl Evaluator for Stub {
  fn evaluate(&mut self, code: &str) -> Result<SandboxValue, EvalError> {
    self.seen.push(code.to_string());
    if code.starts_with("function ") {
      return Ok(SandboxValue::Undefined);
    }
    self
      .answers
      .iter()
      .find(|(call, _)| *call == code)
      .map(|(_, value)| value.clone())
      .ok_or_else(|| EvalError::Other(format!("unexpected call {code}")))
  }
}

#[test]
fn replaces_calls_with_evaluated_literals() {
  let mut stub = Stub {
    answers: vec![
      ("EXECUTED_FUNCTION_0(1)", SandboxValue::String("one".to_string())),
      (
        "EXECUTED_FUNCTION_0(2)",
        SandboxValue::Array(vec![SandboxValue::Number(-2.0), SandboxValue::Null]),
      ),
    ],
    ..Stub::default()
  };
  let out = deobfuscate_with_evaluator(
    "function decode(n) { '#execute'; return lookup(n); } f(decode(1), decode(2));",
    &bare_config(),
    &mut stub,
  )
  .unwrap();
  assert_eq!(out.code, r#"f("one",[-2,null]);"#);
  assert!(stub.seen[0].starts_with("function EXECUTED_FUNCTION_0(n){"), "{:?}", stub.seen);
}

#[test]
fn unconvertible_results_keep_the_function() {
  let mut stub = Stub {
    answers: vec![
      ("EXECUTED_FUNCTION_0(1)", SandboxValue::Number(7.0)),
      ("EXECUTED_FUNCTION_0(2)", SandboxValue::Opaque),
    ],
    ..Stub::default()
  };
  let out = deobfuscate_with_evaluator(
    "function decode(n) { '#execute'; return n; } f(decode(1), decode(2));",
    &bare_config(),
    &mut stub,
  )
  .unwrap();
  assert_eq!(out.code, r##"function decode(n){"#execute";return n;}f(7,decode(2));"##);
}

#[test]
fn sandbox_runs_marked_functions() {
  let out = deobfuscate_js::deobfuscate(
    r#"
      var _0xk = function (s) {
        '#execute';
        return s.split('').map(function (c) { return String.fromCharCode(c.charCodeAt(0) + 1); }).join('');
      };
      console.log(_0xk('gdkkn'));
    "#,
    &bare_config(),
  )
  .unwrap();
  assert_eq!(out, r#"console.log("hello");"#);
}

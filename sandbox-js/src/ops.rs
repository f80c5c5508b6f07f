//! Abstract operations and operator semantics on values.
//!
//! Everything here is pure: conversions of objects to primitives use the built-in behavior for
//! arrays, plain objects and functions, and never call script code. The expression simplifier
//! folds constants through these same functions, so folded results match what the interpreter
//! computes at runtime.

use crate::string::JsString;
use crate::value::ObjRef;
use crate::value::ObjectKind;
use crate::value::Value;
use syntax_js::num::number_to_string;
use syntax_js::num::string_to_number;
use syntax_js::operator::OperatorName;

// Nested arrays deeper than this stringify as empty, which also breaks reference cycles.
const MAX_STRINGIFY_DEPTH: usize = 32;

pub fn to_boolean(value: &Value) -> bool {
  match value {
    Value::Undefined | Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => *n != 0.0 && !n.is_nan(),
    Value::String(s) => !s.is_empty(),
    Value::Object(_) => true,
  }
}

fn object_to_string(obj: &ObjRef, depth: usize) -> JsString {
  let obj = obj.borrow();
  match &obj.kind {
    ObjectKind::Array(elems) => {
      if depth >= MAX_STRINGIFY_DEPTH {
        return JsString::from("");
      }
      let mut units = Vec::new();
      for (i, elem) in elems.iter().enumerate() {
        if i > 0 {
          units.push(b',' as u16);
        }
        match elem {
          Value::Undefined | Value::Null => {}
          Value::Object(inner) => {
            units.extend_from_slice(object_to_string(inner, depth + 1).as_code_units())
          }
          other => units.extend_from_slice(to_js_string(other).as_code_units()),
        }
      }
      JsString::from_u16_vec(units)
    }
    ObjectKind::Error => {
      let name = obj.own_string_prop("name").unwrap_or_else(|| "Error".to_string());
      match obj.own_string_prop("message") {
        Some(message) if !message.is_empty() => JsString::from(format!("{name}: {message}")),
        _ => JsString::from(name),
      }
    }
    ObjectKind::Plain => JsString::from("[object Object]"),
    ObjectKind::Closure(_) | ObjectKind::Native { .. } => {
      JsString::from("function () { [native code] }")
    }
  }
}

/// `ToPrimitive` using the built-in `valueOf`/`toString` of each object kind.
pub fn to_primitive(value: &Value) -> Value {
  match value {
    Value::Object(obj) => Value::String(object_to_string(obj, 0)),
    other => other.clone(),
  }
}

pub fn to_number(value: &Value) -> f64 {
  match value {
    Value::Undefined => f64::NAN,
    Value::Null => 0.0,
    Value::Bool(b) => {
      if *b {
        1.0
      } else {
        0.0
      }
    }
    Value::Number(n) => *n,
    Value::String(s) => string_to_number(&s.to_utf8_lossy()),
    Value::Object(_) => to_number(&to_primitive(value)),
  }
}

pub fn to_js_string(value: &Value) -> JsString {
  match value {
    Value::Undefined => JsString::from("undefined"),
    Value::Null => JsString::from("null"),
    Value::Bool(b) => JsString::from(if *b { "true" } else { "false" }),
    Value::Number(n) => JsString::from(number_to_string(*n)),
    Value::String(s) => s.clone(),
    Value::Object(obj) => object_to_string(obj, 0),
  }
}

fn modulo_2_32(n: f64) -> f64 {
  if !n.is_finite() || n == 0.0 {
    return 0.0;
  }
  n.trunc().rem_euclid(4294967296.0)
}

pub fn to_uint32(n: f64) -> u32 {
  modulo_2_32(n) as u32
}

pub fn to_int32(n: f64) -> i32 {
  to_uint32(n) as i32
}

/// Integer conversion used by index and count arguments of builtins.
pub fn to_integer_or_infinity(value: &Value) -> f64 {
  let n = to_number(value);
  if n.is_nan() {
    0.0
  } else {
    n.trunc()
  }
}

pub fn type_of(value: &Value) -> &'static str {
  match value {
    Value::Undefined => "undefined",
    Value::Null => "object",
    Value::Bool(_) => "boolean",
    Value::Number(_) => "number",
    Value::String(_) => "string",
    Value::Object(obj) if obj.borrow().is_callable() => "function",
    Value::Object(_) => "object",
  }
}

pub fn strict_equals(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
    (Value::Bool(x), Value::Bool(y)) => x == y,
    (Value::Number(x), Value::Number(y)) => x == y,
    (Value::String(x), Value::String(y)) => x == y,
    (Value::Object(x), Value::Object(y)) => x.ptr_eq(y),
    _ => false,
  }
}

/// `SameValueZero`, as used by `includes`: like `===` but `NaN` equals itself.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Number(x), Value::Number(y)) if x.is_nan() && y.is_nan() => true,
    _ => strict_equals(a, b),
  }
}

pub fn loose_equals(a: &Value, b: &Value) -> bool {
  match (a, b) {
    (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
    (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
    (Value::Number(_), Value::String(_)) => loose_equals(a, &Value::Number(to_number(b))),
    (Value::String(_), Value::Number(_)) => loose_equals(&Value::Number(to_number(a)), b),
    (Value::Bool(_), _) => loose_equals(&Value::Number(to_number(a)), b),
    (_, Value::Bool(_)) => loose_equals(a, &Value::Number(to_number(b))),
    (Value::Object(_), Value::Object(_)) => strict_equals(a, b),
    (Value::Object(_), _) => loose_equals(&to_primitive(a), b),
    (_, Value::Object(_)) => loose_equals(a, &to_primitive(b)),
    _ => strict_equals(a, b),
  }
}

/// Abstract relational comparison `a < b`. `None` means undefined, i.e. a `NaN` was involved.
fn less_than(a: &Value, b: &Value) -> Option<bool> {
  let pa = to_primitive(a);
  let pb = to_primitive(b);
  if let (Value::String(x), Value::String(y)) = (&pa, &pb) {
    return Some(x.as_code_units() < y.as_code_units());
  }
  let x = to_number(&pa);
  let y = to_number(&pb);
  if x.is_nan() || y.is_nan() {
    return None;
  }
  Some(x < y)
}

pub fn exponentiate(base: f64, exponent: f64) -> f64 {
  if exponent.is_nan() {
    return f64::NAN;
  }
  if exponent == 0.0 {
    return 1.0;
  }
  if base.abs() == 1.0 && exponent.is_infinite() {
    return f64::NAN;
  }
  base.powf(exponent)
}

/// `a + b`: string concatenation if either primitive operand is a string, numeric addition
/// otherwise.
pub fn add(a: &Value, b: &Value) -> Value {
  let pa = to_primitive(a);
  let pb = to_primitive(b);
  if matches!(pa, Value::String(_)) || matches!(pb, Value::String(_)) {
    return Value::String(to_js_string(&pa).concat(&to_js_string(&pb)));
  }
  Value::Number(to_number(&pa) + to_number(&pb))
}

/// Applies a binary operator that doesn't need access to script state. Returns `None` for
/// operators that can't be computed from values alone (`in`, `instanceof`, logical and
/// assignment operators).
pub fn binary(op: OperatorName, a: &Value, b: &Value) -> Option<Value> {
  let num = |f: fn(f64, f64) -> f64| Value::Number(f(to_number(a), to_number(b)));
  let int = |f: fn(i32, i32) -> i32| {
    Value::Number(f(to_int32(to_number(a)), to_int32(to_number(b))) as f64)
  };
  Some(match op {
    OperatorName::Addition => add(a, b),
    OperatorName::Subtraction => num(|x, y| x - y),
    OperatorName::Multiplication => num(|x, y| x * y),
    OperatorName::Division => num(|x, y| x / y),
    OperatorName::Remainder => num(|x, y| x % y),
    OperatorName::Exponentiation => num(exponentiate),
    OperatorName::BitwiseAnd => int(|x, y| x & y),
    OperatorName::BitwiseOr => int(|x, y| x | y),
    OperatorName::BitwiseXor => int(|x, y| x ^ y),
    OperatorName::BitwiseLeftShift => {
      let shift = to_uint32(to_number(b)) & 31;
      Value::Number(to_int32(to_number(a)).wrapping_shl(shift) as f64)
    }
    OperatorName::BitwiseRightShift => {
      let shift = to_uint32(to_number(b)) & 31;
      Value::Number((to_int32(to_number(a)) >> shift) as f64)
    }
    OperatorName::BitwiseUnsignedRightShift => {
      let shift = to_uint32(to_number(b)) & 31;
      Value::Number((to_uint32(to_number(a)) >> shift) as f64)
    }
    OperatorName::Equality => Value::Bool(loose_equals(a, b)),
    OperatorName::Inequality => Value::Bool(!loose_equals(a, b)),
    OperatorName::StrictEquality => Value::Bool(strict_equals(a, b)),
    OperatorName::StrictInequality => Value::Bool(!strict_equals(a, b)),
    OperatorName::LessThan => Value::Bool(less_than(a, b) == Some(true)),
    OperatorName::GreaterThan => Value::Bool(less_than(b, a) == Some(true)),
    OperatorName::LessThanOrEqual => Value::Bool(less_than(b, a) == Some(false)),
    OperatorName::GreaterThanOrEqual => Value::Bool(less_than(a, b) == Some(false)),
    _ => return None,
  })
}

/// Applies a unary operator that doesn't need access to script state.
pub fn unary(op: OperatorName, a: &Value) -> Option<Value> {
  Some(match op {
    OperatorName::UnaryNegation => Value::Number(-to_number(a)),
    OperatorName::UnaryPlus => Value::Number(to_number(a)),
    OperatorName::LogicalNot => Value::Bool(!to_boolean(a)),
    OperatorName::BitwiseNot => Value::Number(!to_int32(to_number(a)) as f64),
    OperatorName::Typeof => Value::string(type_of(a)),
    OperatorName::Void => Value::Undefined,
    _ => return None,
  })
}

#[cfg(test)]
mod tests {
  use super::binary;
  use super::to_int32;
  use super::to_js_string;
  use super::unary;
  use crate::value::Object;
  use crate::value::ObjectKind;
  use crate::value::ObjRef;
  use crate::value::Value;
  use syntax_js::operator::OperatorName;

  fn s(v: &str) -> Value {
    Value::string(v)
  }

  fn n(v: f64) -> Value {
    Value::Number(v)
  }

  fn show(v: Option<Value>) -> String {
    match v {
      Some(Value::String(s)) => format!("{:?}", s.to_utf8_lossy()),
      Some(v) => to_js_string(&v).to_utf8_lossy(),
      None => "none".to_string(),
    }
  }

  #[test]
  fn arithmetic_coercion() {
    assert_eq!(show(binary(OperatorName::Subtraction, &s("5"), &n(1.0))), "4");
    assert_eq!(show(binary(OperatorName::Addition, &s("5"), &n(1.0))), "\"51\"");
    assert_eq!(show(binary(OperatorName::Addition, &n(1.0), &Value::Bool(true))), "2");
    assert_eq!(show(binary(OperatorName::Multiplication, &s("a"), &n(1.0))), "NaN");
    assert_eq!(show(binary(OperatorName::Remainder, &n(-7.0), &n(2.0))), "-1");
    assert_eq!(show(binary(OperatorName::Exponentiation, &n(1.0), &n(f64::INFINITY))), "NaN");
  }

  #[test]
  fn bitwise_truncation() {
    assert_eq!(show(binary(OperatorName::BitwiseLeftShift, &n(1.0), &n(33.0))), "2");
    assert_eq!(show(binary(OperatorName::BitwiseOr, &n(4294967296.5), &n(0.0))), "0");
    assert_eq!(show(binary(OperatorName::BitwiseUnsignedRightShift, &n(-1.0), &n(0.0))), "4294967295");
    assert_eq!(show(binary(OperatorName::BitwiseRightShift, &n(-8.0), &n(1.0))), "-4");
    assert_eq!(to_int32(2147483648.0), -2147483648);
    assert_eq!(show(unary(OperatorName::BitwiseNot, &n(5.0))), "-6");
  }

  #[test]
  fn equality() {
    assert_eq!(show(binary(OperatorName::Equality, &s("1"), &n(1.0))), "true");
    assert_eq!(show(binary(OperatorName::StrictEquality, &s("1"), &n(1.0))), "false");
    assert_eq!(show(binary(OperatorName::Equality, &Value::Null, &Value::Undefined)), "true");
    assert_eq!(show(binary(OperatorName::Equality, &Value::Null, &n(0.0))), "false");
    assert_eq!(show(binary(OperatorName::Equality, &n(f64::NAN), &n(f64::NAN))), "false");
    let empty = Value::Object(ObjRef::new(Object::new(None, ObjectKind::Array(Vec::new()))));
    assert_eq!(show(binary(OperatorName::Equality, &empty, &s(""))), "true");
    assert_eq!(show(binary(OperatorName::Equality, &empty, &Value::Bool(false))), "true");
  }

  #[test]
  fn relational() {
    assert_eq!(show(binary(OperatorName::LessThan, &s("a"), &s("b"))), "true");
    assert_eq!(show(binary(OperatorName::LessThan, &s("10"), &s("9"))), "true");
    assert_eq!(show(binary(OperatorName::LessThan, &s("10"), &n(9.0))), "false");
    assert_eq!(show(binary(OperatorName::LessThanOrEqual, &n(f64::NAN), &n(1.0))), "false");
    assert_eq!(show(binary(OperatorName::GreaterThanOrEqual, &n(2.0), &n(2.0))), "true");
  }

  #[test]
  fn object_conversions() {
    let empty_obj = Value::Object(ObjRef::new(Object::new(None, ObjectKind::Plain)));
    let empty_arr = Value::Object(ObjRef::new(Object::new(None, ObjectKind::Array(Vec::new()))));
    assert_eq!(show(binary(OperatorName::Addition, &empty_arr, &empty_arr)), "\"\"");
    assert_eq!(
      show(binary(OperatorName::Addition, &empty_arr, &empty_obj)),
      "\"[object Object]\""
    );
    assert_eq!(show(unary(OperatorName::UnaryPlus, &empty_arr)), "0");
    assert_eq!(show(unary(OperatorName::LogicalNot, &empty_arr)), "false");
    assert_eq!(show(unary(OperatorName::Typeof, &Value::Null)), "\"object\"");
  }
}

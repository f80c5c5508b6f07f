use super::define_value;
use crate::error::SandboxResult;
use crate::ops::exponentiate;
use crate::ops::to_number;
use crate::realm::Realm;
use crate::value::NativeFn;
use crate::value::Value;

pub(super) fn install(realm: &mut Realm) {
  let math = realm.new_object();
  let constants = [
    ("PI", std::f64::consts::PI),
    ("E", std::f64::consts::E),
    ("LN2", std::f64::consts::LN_2),
    ("LN10", std::f64::consts::LN_10),
    ("LOG2E", std::f64::consts::LOG2_E),
    ("LOG10E", std::f64::consts::LOG10_E),
    ("SQRT2", std::f64::consts::SQRT_2),
    ("SQRT1_2", std::f64::consts::FRAC_1_SQRT_2),
  ];
  for (name, value) in constants {
    define_value(&math, name, Value::Number(value));
  }
  let functions: [(&'static str, NativeFn); 10] = [
    ("floor", |_, _, a| unary(a, f64::floor)),
    ("ceil", |_, _, a| unary(a, f64::ceil)),
    ("round", |_, _, a| unary(a, round)),
    ("abs", |_, _, a| unary(a, f64::abs)),
    ("sqrt", |_, _, a| unary(a, f64::sqrt)),
    ("trunc", |_, _, a| unary(a, f64::trunc)),
    ("sign", |_, _, a| unary(a, sign)),
    ("min", |_, _, a| fold(a, f64::INFINITY, min)),
    ("max", |_, _, a| fold(a, f64::NEG_INFINITY, max)),
    ("pow", pow),
  ];
  for (name, call) in functions {
    let func = realm.new_native(name, call);
    define_value(&math, name, Value::Object(func));
  }
  realm.define_global("Math", Value::Object(math));
}

fn unary(args: &[Value], f: fn(f64) -> f64) -> SandboxResult<Value> {
  let x = args.first().map_or(f64::NAN, to_number);
  Ok(Value::Number(f(x)))
}

fn fold(args: &[Value], init: f64, f: fn(f64, f64) -> f64) -> SandboxResult<Value> {
  Ok(Value::Number(
    args.iter().map(to_number).fold(init, f),
  ))
}

fn round(x: f64) -> f64 {
  if !x.is_finite() || x.fract() == 0.0 {
    return x;
  }
  if (-0.5..0.0).contains(&x) {
    return -0.0;
  }
  (x + 0.5).floor()
}

fn sign(x: f64) -> f64 {
  if x.is_nan() || x == 0.0 {
    x
  } else {
    x.signum()
  }
}

fn min(a: f64, b: f64) -> f64 {
  if a.is_nan() || b.is_nan() {
    f64::NAN
  } else if a == b && a == 0.0 {
    // -0 is smaller than +0.
    if a.is_sign_negative() { a } else { b }
  } else {
    a.min(b)
  }
}

fn max(a: f64, b: f64) -> f64 {
  if a.is_nan() || b.is_nan() {
    f64::NAN
  } else if a == b && a == 0.0 {
    if a.is_sign_positive() { a } else { b }
  } else {
    a.max(b)
  }
}

fn pow(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let base = args.first().map_or(f64::NAN, to_number);
  let exponent = args.get(1).map_or(f64::NAN, to_number);
  Ok(Value::Number(exponentiate(base, exponent)))
}

#[cfg(test)]
mod tests {
  use super::max;
  use super::min;
  use super::round;

  #[test]
  fn rounding_goes_towards_positive_infinity() {
    assert_eq!(round(2.5), 3.0);
    assert_eq!(round(-2.5), -2.0);
    assert!(round(-0.4).is_sign_negative());
    assert_eq!(round(4503599627370497.0), 4503599627370497.0);
  }

  #[test]
  fn min_max_propagate_nan() {
    assert!(min(1.0, f64::NAN).is_nan());
    assert_eq!(max(1.0, 3.0), 3.0);
    assert!(min(0.0, -0.0).is_sign_negative());
  }
}

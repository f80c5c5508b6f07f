use super::arg;
use super::define_constructor;
use super::define_method;
use super::define_value;
use crate::error::SandboxResult;
use crate::ops::to_integer_or_infinity;
use crate::ops::to_number;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::Value;
use syntax_js::num::number_to_string;

// Fraction digits emitted for non-decimal radixes.
const MAX_FRACTION_DIGITS: usize = 52;

pub(super) fn install(realm: &mut Realm) {
  let proto = realm.intrinsics().number_proto.clone();
  let ctor = define_constructor(realm, "Number", number, &proto);
  define_value(&ctor, "NaN", Value::Number(f64::NAN));
  define_value(&ctor, "POSITIVE_INFINITY", Value::Number(f64::INFINITY));
  define_value(&ctor, "NEGATIVE_INFINITY", Value::Number(f64::NEG_INFINITY));
  define_value(&ctor, "MAX_SAFE_INTEGER", Value::Number(9007199254740991.0));
  define_value(&ctor, "MIN_SAFE_INTEGER", Value::Number(-9007199254740991.0));
  define_method(realm, &proto, "toString", to_string);
  define_method(realm, &proto, "valueOf", value_of);
}

fn number(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Number(match args.first() {
    Some(value) => to_number(value),
    None => 0.0,
  }))
}

fn this_number(realm: &Realm, this: &Value) -> SandboxResult<f64> {
  match this {
    Value::Number(n) => Ok(*n),
    _ => Err(realm.throw_error(ErrorKind::TypeError, "not a number")),
  }
}

/// Formats `n` in the given radix. Integer digits are exact; the fraction is cut off after a fixed
/// number of digits.
pub(crate) fn number_to_radix_string(n: f64, radix: u32) -> String {
  if radix == 10 || !n.is_finite() {
    return number_to_string(n);
  }
  if n == 0.0 {
    return "0".to_string();
  }
  let mut out = String::new();
  if n < 0.0 {
    out.push('-');
  }
  let n = n.abs();
  let mut int = n.trunc();
  let mut int_digits = Vec::new();
  while int >= 1.0 {
    let d = int % radix as f64;
    int_digits.push(d as u32);
    int = ((int - d) / radix as f64).trunc();
  }
  if int_digits.is_empty() {
    int_digits.push(0);
  }
  out.extend(
    int_digits
      .iter()
      .rev()
      .filter_map(|&d| char::from_digit(d, radix)),
  );
  let mut frac = n.fract();
  if frac > 0.0 {
    out.push('.');
    for _ in 0..MAX_FRACTION_DIGITS {
      frac *= radix as f64;
      let d = frac.trunc();
      out.extend(char::from_digit(d as u32, radix));
      frac -= d;
      if frac == 0.0 {
        break;
      }
    }
  }
  out
}

fn to_string(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let n = this_number(realm, &this)?;
  let radix = match arg(args, 0) {
    Value::Undefined => 10.0,
    v => to_integer_or_infinity(&v),
  };
  if !(2.0..=36.0).contains(&radix) {
    return Err(realm.throw_error(
      ErrorKind::RangeError,
      "toString() radix must be between 2 and 36",
    ));
  }
  Ok(Value::String(JsString::from(number_to_radix_string(
    n,
    radix as u32,
  ))))
}

fn value_of(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Number(this_number(realm, &this)?))
}

#[cfg(test)]
mod tests {
  use super::number_to_radix_string;

  #[test]
  fn radix_formatting() {
    assert_eq!(number_to_radix_string(255.0, 16), "ff");
    assert_eq!(number_to_radix_string(-10.0, 2), "-1010");
    assert_eq!(number_to_radix_string(0.5, 2), "0.1");
    assert_eq!(number_to_radix_string(0.5, 16), "0.8");
    assert_eq!(number_to_radix_string(35.0, 36), "z");
    assert_eq!(number_to_radix_string(1.5, 10), "1.5");
    assert_eq!(number_to_radix_string(f64::NAN, 16), "NaN");
  }
}

use super::arg;
use super::define_constructor;
use super::define_method;
use crate::error::SandboxResult;
use crate::ops::to_boolean;
use crate::ops::to_int32;
use crate::ops::to_js_string;
use crate::ops::to_number;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::NativeFn;
use crate::value::Value;
use syntax_js::char::is_whitespace;

pub(super) fn install(realm: &mut Realm) {
  realm.define_global("undefined", Value::Undefined);
  realm.define_global("NaN", Value::Number(f64::NAN));
  realm.define_global("Infinity", Value::Number(f64::INFINITY));
  let globals: [(&'static str, NativeFn); 6] = [
    ("parseInt", parse_int),
    ("parseFloat", parse_float),
    ("isNaN", is_nan),
    ("isFinite", is_finite),
    ("encodeURIComponent", encode_uri_component),
    ("decodeURIComponent", decode_uri_component),
  ];
  for (name, call) in globals {
    let func = realm.new_native(name, call);
    realm.define_global(name, Value::Object(func));
  }
  let boolean_proto = realm.intrinsics().boolean_proto.clone();
  define_constructor(realm, "Boolean", boolean, &boolean_proto);
  define_method(realm, &boolean_proto, "toString", boolean_to_string);
  define_method(realm, &boolean_proto, "valueOf", boolean_value_of);

  for (kind, call) in error_constructors() {
    let proto = realm.intrinsics().error_proto(kind);
    define_constructor(realm, kind.name(), call, &proto);
  }
  let error_proto = realm.intrinsics().error_proto(ErrorKind::Error);
  define_method(realm, &error_proto, "toString", error_to_string);
}

fn trim_start(units: &[u16]) -> &[u16] {
  let start = units
    .iter()
    .position(|&u| !char::from_u32(u as u32).is_some_and(is_whitespace))
    .unwrap_or(units.len());
  &units[start..]
}

/// `parseInt`: the longest prefix of digits in the given radix, after an optional sign and, for
/// radix 16 or an unspecified radix, an optional `0x` prefix.
pub(crate) fn parse_int_str(input: &JsString, radix: i32) -> f64 {
  let mut units = trim_start(input.as_code_units());
  let mut sign = 1.0;
  if let Some(&first) = units.first() {
    if first == b'-' as u16 || first == b'+' as u16 {
      if first == b'-' as u16 {
        sign = -1.0;
      }
      units = &units[1..];
    }
  }
  let mut radix = radix as u32;
  let mut strip_prefix = true;
  if radix != 0 {
    if !(2..=36).contains(&radix) {
      return f64::NAN;
    }
    strip_prefix = radix == 16;
  } else {
    radix = 10;
  }
  if strip_prefix
    && units.len() >= 2
    && units[0] == b'0' as u16
    && (units[1] == b'x' as u16 || units[1] == b'X' as u16)
  {
    units = &units[2..];
    radix = 16;
  }
  let digits: Vec<u32> = units
    .iter()
    .map_while(|&u| char::from_u32(u as u32).and_then(|c| c.to_digit(radix)))
    .collect();
  if digits.is_empty() {
    return f64::NAN;
  }
  if radix == 10 {
    // Exact decimal conversion, matching how number literals are read.
    let text: String = digits
      .iter()
      .filter_map(|&d| char::from_digit(d, 10))
      .collect();
    return sign * text.parse::<f64>().unwrap_or(f64::NAN);
  }
  let value = digits
    .iter()
    .fold(0.0, |acc, &d| acc * radix as f64 + d as f64);
  sign * value
}

fn parse_int(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let input = to_js_string(&arg(args, 0));
  let radix = to_int32(to_number(&arg(args, 1)));
  Ok(Value::Number(parse_int_str(&input, radix)))
}

/// `parseFloat`: the longest prefix that forms a decimal literal, or `Infinity`.
pub(crate) fn parse_float_str(input: &JsString) -> f64 {
  let units = trim_start(input.as_code_units());
  let text: String = units
    .iter()
    .map_while(|&u| char::from_u32(u as u32).filter(char::is_ascii))
    .collect();
  let bytes = text.as_bytes();
  let mut i = 0;
  let mut sign = 1.0;
  if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
    if bytes[i] == b'-' {
      sign = -1.0;
    }
    i += 1;
  }
  if text[i..].starts_with("Infinity") {
    return sign * f64::INFINITY;
  }
  let start = i;
  let int_digits = bytes[i..].iter().take_while(|b| b.is_ascii_digit()).count();
  i += int_digits;
  let mut frac_digits = 0;
  if i < bytes.len() && bytes[i] == b'.' {
    frac_digits = bytes[i + 1..].iter().take_while(|b| b.is_ascii_digit()).count();
    if int_digits > 0 || frac_digits > 0 {
      i += 1 + frac_digits;
    }
  }
  if int_digits == 0 && frac_digits == 0 {
    return f64::NAN;
  }
  if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
    let mut j = i + 1;
    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
      j += 1;
    }
    let exp_digits = bytes[j..].iter().take_while(|b| b.is_ascii_digit()).count();
    if exp_digits > 0 {
      i = j + exp_digits;
    }
  }
  sign * text[start..i].parse::<f64>().unwrap_or(f64::NAN)
}

fn parse_float(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Number(parse_float_str(&to_js_string(&arg(args, 0)))))
}

fn is_nan(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Bool(to_number(&arg(args, 0)).is_nan()))
}

fn is_finite(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Bool(to_number(&arg(args, 0)).is_finite()))
}

fn is_uri_unreserved(c: u16) -> bool {
  c < 0x80 && {
    let b = c as u8;
    b.is_ascii_alphanumeric() || b"-_.!~*'()".contains(&b)
  }
}

fn encode_uri_component(realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let input = to_js_string(&arg(args, 0));
  let mut out = Vec::new();
  for c in char::decode_utf16(input.as_code_units().iter().copied()) {
    let Ok(c) = c else {
      return Err(realm.throw_error(ErrorKind::URIError, "URI malformed"));
    };
    if c.is_ascii() && is_uri_unreserved(c as u16) {
      out.push(c as u16);
      continue;
    }
    let mut buf = [0u8; 4];
    for b in c.encode_utf8(&mut buf).bytes() {
      out.extend(format!("%{b:02X}").encode_utf16());
    }
  }
  Ok(Value::String(JsString::from_u16_vec(out)))
}

fn hex_byte(units: &[u16], at: usize) -> Option<u8> {
  if units.get(at) != Some(&(b'%' as u16)) {
    return None;
  }
  let hi = char::from_u32(*units.get(at + 1)? as u32)?.to_digit(16)?;
  let lo = char::from_u32(*units.get(at + 2)? as u32)?.to_digit(16)?;
  Some((hi * 16 + lo) as u8)
}

fn decode_uri_component(realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let input = to_js_string(&arg(args, 0));
  let units = input.as_code_units();
  let mut out = Vec::with_capacity(units.len());
  let mut i = 0;
  while i < units.len() {
    if units[i] != b'%' as u16 {
      out.push(units[i]);
      i += 1;
      continue;
    }
    let malformed = || realm.throw_error(ErrorKind::URIError, "URI malformed");
    let first = hex_byte(units, i).ok_or_else(malformed)?;
    let len = match first {
      0x00..=0x7f => 1,
      0xc0..=0xdf => 2,
      0xe0..=0xef => 3,
      0xf0..=0xf7 => 4,
      _ => return Err(malformed()),
    };
    let mut bytes = vec![first];
    for k in 1..len {
      bytes.push(hex_byte(units, i + 3 * k).ok_or_else(malformed)?);
    }
    let decoded = std::str::from_utf8(&bytes).map_err(|_| malformed())?;
    out.extend(decoded.encode_utf16());
    i += 3 * len;
  }
  Ok(Value::String(JsString::from_u16_vec(out)))
}

fn boolean(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Bool(to_boolean(&arg(args, 0))))
}

fn this_boolean(realm: &Realm, this: &Value) -> SandboxResult<bool> {
  match this {
    Value::Bool(b) => Ok(*b),
    _ => Err(realm.throw_error(ErrorKind::TypeError, "not a boolean")),
  }
}

fn boolean_to_string(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::string(if this_boolean(realm, &this)? { "true" } else { "false" }))
}

fn boolean_value_of(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Bool(this_boolean(realm, &this)?))
}

fn construct_error(realm: &mut Realm, kind: ErrorKind, args: &[Value]) -> SandboxResult<Value> {
  let message = match arg(args, 0) {
    Value::Undefined => String::new(),
    other => to_js_string(&other).to_utf8_lossy(),
  };
  Ok(realm.new_error(kind, &message))
}

fn error_constructors() -> [(ErrorKind, NativeFn); 6] {
  [
    (ErrorKind::Error, |r, _, a| construct_error(r, ErrorKind::Error, a)),
    (ErrorKind::TypeError, |r, _, a| construct_error(r, ErrorKind::TypeError, a)),
    (ErrorKind::RangeError, |r, _, a| construct_error(r, ErrorKind::RangeError, a)),
    (ErrorKind::ReferenceError, |r, _, a| construct_error(r, ErrorKind::ReferenceError, a)),
    (ErrorKind::SyntaxError, |r, _, a| construct_error(r, ErrorKind::SyntaxError, a)),
    (ErrorKind::URIError, |r, _, a| construct_error(r, ErrorKind::URIError, a)),
  ]
}

fn error_to_string(_realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::String(to_js_string(&this)))
}

#[cfg(test)]
mod tests {
  use super::parse_float_str;
  use super::parse_int_str;
  use crate::string::JsString;

  fn int(s: &str, radix: i32) -> f64 {
    parse_int_str(&JsString::from(s), radix)
  }

  fn float(s: &str) -> f64 {
    parse_float_str(&JsString::from(s))
  }

  #[test]
  fn parse_int_prefixes() {
    assert_eq!(int("  42px", 0), 42.0);
    assert_eq!(int("-0x1F", 0), -31.0);
    assert_eq!(int("0x1F", 10), 0.0);
    assert_eq!(int("ff", 16), 255.0);
    assert_eq!(int("z", 36), 35.0);
    assert!(int("", 0).is_nan());
    assert!(int("12", 1).is_nan());
  }

  #[test]
  fn parse_float_prefixes() {
    assert_eq!(float("3.14abc"), 3.14);
    assert_eq!(float(".5"), 0.5);
    assert_eq!(float("1e3x"), 1000.0);
    assert_eq!(float("1e"), 1.0);
    assert_eq!(float("-Infinityx"), f64::NEG_INFINITY);
    assert!(float("abc").is_nan());
    assert!(float(".").is_nan());
  }
}

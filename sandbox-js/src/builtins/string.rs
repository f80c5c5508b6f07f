use super::arg;
use super::clamped_index;
use super::define_constructor;
use super::define_method;
use super::relative_index;
use crate::error::SandboxResult;
use crate::ops::to_integer_or_infinity;
use crate::ops::to_js_string;
use crate::ops::to_number;
use crate::ops::to_uint32;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::NativeFn;
use crate::value::Value;
use syntax_js::char::is_whitespace;

// Longest string `repeat` may build, in code units.
const MAX_STRING_LENGTH: usize = 1 << 28;

pub(super) fn install(realm: &mut Realm) {
  let proto = realm.intrinsics().string_proto.clone();
  let ctor = define_constructor(realm, "String", string, &proto);
  define_method(realm, &ctor, "fromCharCode", from_char_code);
  let methods: [(&'static str, NativeFn); 23] = [
    ("charAt", char_at),
    ("charCodeAt", char_code_at),
    ("indexOf", index_of),
    ("lastIndexOf", last_index_of),
    ("slice", slice),
    ("substring", substring),
    ("substr", substr),
    ("split", split),
    ("concat", concat),
    ("toUpperCase", to_upper_case),
    ("toLowerCase", to_lower_case),
    ("trim", trim),
    ("trimStart", trim_start),
    ("trimEnd", trim_end),
    ("replace", replace),
    ("repeat", repeat),
    ("startsWith", starts_with),
    ("endsWith", ends_with),
    ("includes", includes),
    ("padStart", pad_start),
    ("padEnd", pad_end),
    ("toString", to_string),
    ("valueOf", to_string),
  ];
  for (name, call) in methods {
    define_method(realm, &proto, name, call);
  }
}

/// `this` coerced to a string, as every `String.prototype` method does first.
fn this_string(realm: &Realm, this: &Value) -> SandboxResult<JsString> {
  if this.is_nullish() {
    return Err(realm.throw_error(
      ErrorKind::TypeError,
      "String.prototype method called on null or undefined",
    ));
  }
  Ok(to_js_string(this))
}

fn string(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::String(match args.first() {
    Some(value) => to_js_string(value),
    None => JsString::from(""),
  }))
}

fn from_char_code(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let units = args
    .iter()
    .map(|v| (to_uint32(to_number(v)) & 0xffff) as u16)
    .collect();
  Ok(Value::String(JsString::from_u16_vec(units)))
}

fn char_at(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let pos = to_integer_or_infinity(&arg(args, 0));
  Ok(Value::String(
    if pos >= 0.0 && pos < s.len_code_units() as f64 {
      s.slice(pos as usize, pos as usize + 1)
    } else {
      JsString::from("")
    },
  ))
}

fn char_code_at(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let pos = to_integer_or_infinity(&arg(args, 0));
  Ok(Value::Number(
    if pos >= 0.0 && pos < s.len_code_units() as f64 {
      s.as_code_units()[pos as usize] as f64
    } else {
      f64::NAN
    },
  ))
}

fn index_of(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let needle = to_js_string(&arg(args, 0));
  let from = clamped_index(&arg(args, 1), s.len_code_units(), 0);
  Ok(Value::Number(match s.find(needle.as_code_units(), from) {
    Some(i) => i as f64,
    None => -1.0,
  }))
}

fn last_index_of(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let needle = to_js_string(&arg(args, 0));
  let from = match to_number(&arg(args, 1)) {
    n if n.is_nan() => s.len_code_units(),
    n => n.trunc().clamp(0.0, s.len_code_units() as f64) as usize,
  };
  Ok(Value::Number(match s.rfind(needle.as_code_units(), from) {
    Some(i) => i as f64,
    None => -1.0,
  }))
}

fn slice(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let len = s.len_code_units();
  let start = relative_index(&arg(args, 0), len, 0);
  let end = relative_index(&arg(args, 1), len, len);
  Ok(Value::String(s.slice(start, end.max(start))))
}

fn substring(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let len = s.len_code_units();
  let a = clamped_index(&arg(args, 0), len, 0);
  let b = clamped_index(&arg(args, 1), len, len);
  Ok(Value::String(s.slice(a.min(b), a.max(b))))
}

fn substr(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let len = s.len_code_units();
  let start = relative_index(&arg(args, 0), len, 0);
  let count = match arg(args, 1) {
    Value::Undefined => len,
    v => to_integer_or_infinity(&v).clamp(0.0, len as f64) as usize,
  };
  Ok(Value::String(s.slice(start, start.saturating_add(count))))
}

fn split(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let limit = match arg(args, 1) {
    Value::Undefined => u32::MAX as usize,
    v => to_uint32(to_number(&v)) as usize,
  };
  let sep = match arg(args, 0) {
    Value::Undefined => return Ok(realm.new_array(vec![Value::String(s)])),
    v => to_js_string(&v),
  };
  let mut parts = Vec::new();
  if sep.is_empty() {
    parts.extend(
      s.as_code_units()
        .iter()
        .map(|&u| Value::String(JsString::from_code_units(&[u]))),
    );
  } else {
    let mut start = 0;
    while let Some(i) = s.find(sep.as_code_units(), start) {
      parts.push(Value::String(s.slice(start, i)));
      start = i + sep.len_code_units();
    }
    parts.push(Value::String(s.slice(start, s.len_code_units())));
  }
  parts.truncate(limit);
  Ok(realm.new_array(parts))
}

fn concat(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let mut s = this_string(realm, &this)?;
  for arg in args {
    s = s.concat(&to_js_string(arg));
  }
  Ok(Value::String(s))
}

fn map_chars(s: &JsString, f: impl Fn(char, &mut Vec<u16>)) -> JsString {
  let mut out = Vec::with_capacity(s.len_code_units());
  for c in char::decode_utf16(s.as_code_units().iter().copied()) {
    match c {
      Ok(c) => f(c, &mut out),
      Err(err) => out.push(err.unpaired_surrogate()),
    }
  }
  JsString::from_u16_vec(out)
}

fn to_upper_case(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  Ok(Value::String(map_chars(&s, |c, out| {
    for u in c.to_uppercase() {
      out.extend(u.encode_utf16(&mut [0; 2]).iter());
    }
  })))
}

fn to_lower_case(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  Ok(Value::String(map_chars(&s, |c, out| {
    for u in c.to_lowercase() {
      out.extend(u.encode_utf16(&mut [0; 2]).iter());
    }
  })))
}

fn is_space_unit(u: u16) -> bool {
  char::from_u32(u as u32).is_some_and(is_whitespace)
}

fn trimmed(s: &JsString, start: bool, end: bool) -> JsString {
  let units = s.as_code_units();
  let mut a = 0;
  let mut b = units.len();
  if start {
    while a < b && is_space_unit(units[a]) {
      a += 1;
    }
  }
  if end {
    while b > a && is_space_unit(units[b - 1]) {
      b -= 1;
    }
  }
  s.slice(a, b)
}

fn trim(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::String(trimmed(&this_string(realm, &this)?, true, true)))
}

fn trim_start(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::String(trimmed(&this_string(realm, &this)?, true, false)))
}

fn trim_end(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::String(trimmed(&this_string(realm, &this)?, false, true)))
}

/// Expands `$$`, `$&`, `` $` `` and `$'` in a replacement template.
fn expand_replacement(template: &JsString, subject: &JsString, at: usize, matched: &JsString) -> Vec<u16> {
  let t = template.as_code_units();
  let mut out = Vec::with_capacity(t.len());
  let mut i = 0;
  while i < t.len() {
    if t[i] == b'$' as u16 && i + 1 < t.len() {
      let next = t[i + 1];
      let expansion = if next == b'$' as u16 {
        Some(JsString::from("$"))
      } else if next == b'&' as u16 {
        Some(matched.clone())
      } else if next == b'`' as u16 {
        Some(subject.slice(0, at))
      } else if next == b'\'' as u16 {
        Some(subject.slice(at + matched.len_code_units(), subject.len_code_units()))
      } else {
        None
      };
      if let Some(expansion) = expansion {
        out.extend_from_slice(expansion.as_code_units());
        i += 2;
        continue;
      }
    }
    out.push(t[i]);
    i += 1;
  }
  out
}

fn replace(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let pattern = to_js_string(&arg(args, 0));
  let replacement = arg(args, 1);
  let Some(at) = s.find(pattern.as_code_units(), 0) else {
    return Ok(Value::String(s));
  };
  let inserted = if replacement.is_callable() {
    let result = realm.call(
      &replacement,
      Value::Undefined,
      &[
        Value::String(pattern.clone()),
        Value::Number(at as f64),
        Value::String(s.clone()),
      ],
    )?;
    to_js_string(&result).as_code_units().to_vec()
  } else {
    expand_replacement(&to_js_string(&replacement), &s, at, &pattern)
  };
  let mut out = s.slice(0, at).as_code_units().to_vec();
  out.extend(inserted);
  out.extend_from_slice(
    s.slice(at + pattern.len_code_units(), s.len_code_units())
      .as_code_units(),
  );
  Ok(Value::String(JsString::from_u16_vec(out)))
}

fn repeat(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let count = to_integer_or_infinity(&arg(args, 0));
  if count < 0.0 || count.is_infinite() {
    return Err(realm.throw_error(ErrorKind::RangeError, format!("Invalid count value: {count}")));
  }
  let count = count as usize;
  if s.len_code_units().saturating_mul(count) > MAX_STRING_LENGTH {
    return Err(realm.throw_error(ErrorKind::RangeError, "Invalid string length"));
  }
  Ok(Value::String(JsString::from_u16_vec(s.as_code_units().repeat(count))))
}

fn starts_with(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let needle = to_js_string(&arg(args, 0));
  let start = clamped_index(&arg(args, 1), s.len_code_units(), 0);
  Ok(Value::Bool(
    s.as_code_units()[start..].starts_with(needle.as_code_units()),
  ))
}

fn ends_with(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let needle = to_js_string(&arg(args, 0));
  let end = clamped_index(&arg(args, 1), s.len_code_units(), s.len_code_units());
  Ok(Value::Bool(
    s.as_code_units()[..end].ends_with(needle.as_code_units()),
  ))
}

fn includes(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let needle = to_js_string(&arg(args, 0));
  let from = clamped_index(&arg(args, 1), s.len_code_units(), 0);
  Ok(Value::Bool(s.find(needle.as_code_units(), from).is_some()))
}

fn padding(realm: &Realm, s: &JsString, args: &[Value]) -> SandboxResult<Vec<u16>> {
  let target = to_integer_or_infinity(&arg(args, 0));
  let len = s.len_code_units() as f64;
  if target <= len {
    return Ok(Vec::new());
  }
  if target > MAX_STRING_LENGTH as f64 {
    return Err(realm.throw_error(ErrorKind::RangeError, "Invalid string length"));
  }
  let filler = match arg(args, 1) {
    Value::Undefined => JsString::from(" "),
    v => to_js_string(&v),
  };
  if filler.is_empty() {
    return Ok(Vec::new());
  }
  Ok(
    filler
      .as_code_units()
      .iter()
      .copied()
      .cycle()
      .take((target - len) as usize)
      .collect(),
  )
}

fn pad_start(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let mut out = padding(realm, &s, args)?;
  out.extend_from_slice(s.as_code_units());
  Ok(Value::String(JsString::from_u16_vec(out)))
}

fn pad_end(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let s = this_string(realm, &this)?;
  let mut out = s.as_code_units().to_vec();
  out.extend(padding(realm, &s, args)?);
  Ok(Value::String(JsString::from_u16_vec(out)))
}

fn to_string(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  match this {
    Value::String(s) => Ok(Value::String(s)),
    _ => Err(realm.throw_error(ErrorKind::TypeError, "not a string")),
  }
}

//! The builtin library installed into every realm.
//!
//! Only deterministic functionality is provided. Anything that depends on the host (time,
//! randomness, I/O) is absent, so snippets that reach for it fail with a `ReferenceError`.

mod array;
mod function;
mod global;
mod math;
mod number;
mod object;
mod string;

use crate::ops::to_integer_or_infinity;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::NativeFn;
use crate::value::ObjRef;
use crate::value::Value;

pub(crate) fn install(realm: &mut Realm) {
  object::install(realm);
  function::install(realm);
  global::install(realm);
  string::install(realm);
  array::install(realm);
  number::install(realm);
  math::install(realm);
}

/// The `i`-th argument, or `undefined` if absent.
pub(crate) fn arg(args: &[Value], i: usize) -> Value {
  args.get(i).cloned().unwrap_or(Value::Undefined)
}

pub(crate) fn define_method(realm: &Realm, target: &ObjRef, name: &'static str, call: NativeFn) {
  let func = realm.new_native(name, call);
  target
    .borrow_mut()
    .set_own(JsString::from(name), Value::Object(func));
}

pub(crate) fn define_value(target: &ObjRef, name: &str, value: Value) {
  target.borrow_mut().set_own(JsString::from(name), value);
}

/// Creates a global constructor function, linking it with its prototype object.
pub(crate) fn define_constructor(
  realm: &mut Realm,
  name: &'static str,
  call: NativeFn,
  proto: &ObjRef,
) -> ObjRef {
  let ctor = realm.new_native(name, call);
  define_value(&ctor, "prototype", Value::Object(proto.clone()));
  define_value(proto, "constructor", Value::Object(ctor.clone()));
  realm.define_global(name, Value::Object(ctor.clone()));
  ctor
}

/// Resolves a relative index argument as `slice` does: negative values count from `len`, and the
/// result is clamped to `0..=len`.
pub(crate) fn relative_index(value: &Value, len: usize, default: usize) -> usize {
  if matches!(value, Value::Undefined) {
    return default;
  }
  let rel = to_integer_or_infinity(value);
  let len = len as f64;
  let idx = if rel < 0.0 {
    (len + rel).max(0.0)
  } else {
    rel.min(len)
  };
  idx as usize
}

/// Clamps an index argument to `0..=len` without counting from the end.
pub(crate) fn clamped_index(value: &Value, len: usize, default: usize) -> usize {
  if matches!(value, Value::Undefined) {
    return default;
  }
  to_integer_or_infinity(value).clamp(0.0, len as f64) as usize
}

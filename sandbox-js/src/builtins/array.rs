use super::arg;
use super::define_constructor;
use super::define_method;
use super::relative_index;
use crate::error::SandboxResult;
use crate::ops::same_value_zero;
use crate::ops::strict_equals;
use crate::ops::to_boolean;
use crate::ops::to_js_string;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::NativeFn;
use crate::value::ObjRef;
use crate::value::Value;

pub(super) fn install(realm: &mut Realm) {
  let proto = realm.intrinsics().array_proto.clone();
  let ctor = define_constructor(realm, "Array", array, &proto);
  define_method(realm, &ctor, "isArray", is_array);
  let methods: [(&'static str, NativeFn); 19] = [
    ("push", push),
    ("pop", pop),
    ("shift", shift),
    ("unshift", unshift),
    ("slice", slice),
    ("splice", splice),
    ("join", join),
    ("reverse", reverse),
    ("concat", concat),
    ("indexOf", index_of),
    ("includes", includes),
    ("map", map),
    ("filter", filter),
    ("forEach", for_each),
    ("reduce", reduce),
    ("some", some),
    ("every", every),
    ("fill", fill),
    ("toString", to_string),
  ];
  for (name, call) in methods {
    define_method(realm, &proto, name, call);
  }
}

fn this_array(realm: &Realm, this: &Value) -> SandboxResult<ObjRef> {
  match this {
    Value::Object(obj) if obj.borrow().is_array() => Ok(obj.clone()),
    _ => Err(realm.throw_error(
      ErrorKind::TypeError,
      "Array.prototype method called on a non-array",
    )),
  }
}

fn elements(arr: &ObjRef) -> Vec<Value> {
  arr.borrow().array_elements().cloned().unwrap_or_default()
}

fn len(arr: &ObjRef) -> usize {
  arr.borrow().array_elements().map_or(0, Vec::len)
}

fn element(arr: &ObjRef, i: usize) -> Value {
  arr
    .borrow()
    .array_elements()
    .and_then(|e| e.get(i).cloned())
    .unwrap_or(Value::Undefined)
}

fn with_elements<R>(arr: &ObjRef, f: impl FnOnce(&mut Vec<Value>) -> R) -> Option<R> {
  arr.borrow_mut().array_elements_mut().map(f)
}

fn array(realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  if let [Value::Number(n)] = args {
    if *n < 0.0 || n.fract() != 0.0 || *n > u32::MAX as f64 {
      return Err(realm.throw_error(ErrorKind::RangeError, "Invalid array length"));
    }
    return Ok(realm.new_array(vec![Value::Undefined; *n as usize]));
  }
  Ok(realm.new_array(args.to_vec()))
}

fn is_array(_realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::Bool(
    arg(args, 0).as_object().is_some_and(|o| o.borrow().is_array()),
  ))
}

fn push(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let len = with_elements(&arr, |e| {
    e.extend_from_slice(args);
    e.len()
  });
  Ok(Value::Number(len.unwrap_or(0) as f64))
}

fn pop(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  Ok(with_elements(&arr, |e| e.pop()).flatten().unwrap_or(Value::Undefined))
}

fn shift(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let first = with_elements(&arr, |e| (!e.is_empty()).then(|| e.remove(0)));
  Ok(first.flatten().unwrap_or(Value::Undefined))
}

fn unshift(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let len = with_elements(&arr, |e| {
    e.splice(0..0, args.iter().cloned());
    e.len()
  });
  Ok(Value::Number(len.unwrap_or(0) as f64))
}

fn slice(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let elems = elements(&arr);
  let start = relative_index(&arg(args, 0), elems.len(), 0);
  let end = relative_index(&arg(args, 1), elems.len(), elems.len()).max(start);
  Ok(realm.new_array(elems[start..end].to_vec()))
}

fn splice(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let len = len(&arr);
  let start = relative_index(&arg(args, 0), len, 0);
  let delete_count = match args.len() {
    0 => 0,
    1 => len - start,
    _ => super::clamped_index(&args[1], len - start, 0),
  };
  let inserted = args.get(2..).unwrap_or_default();
  let removed = with_elements(&arr, |e| {
    e.splice(start..start + delete_count, inserted.iter().cloned())
      .collect::<Vec<_>>()
  });
  Ok(realm.new_array(removed.unwrap_or_default()))
}

fn join_elements(elems: &[Value], sep: &JsString) -> JsString {
  let mut out = Vec::new();
  for (i, elem) in elems.iter().enumerate() {
    if i > 0 {
      out.extend_from_slice(sep.as_code_units());
    }
    if !elem.is_nullish() {
      out.extend_from_slice(to_js_string(elem).as_code_units());
    }
  }
  JsString::from_u16_vec(out)
}

fn join(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let sep = match arg(args, 0) {
    Value::Undefined => JsString::from(","),
    v => to_js_string(&v),
  };
  Ok(Value::String(join_elements(&elements(&arr), &sep)))
}

fn to_string(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  Ok(Value::String(join_elements(&elements(&arr), &JsString::from(","))))
}

fn reverse(realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  with_elements(&arr, |e| e.reverse());
  Ok(this)
}

fn concat(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let mut out = elements(&arr);
  for arg in args {
    match arg.as_object().filter(|o| o.borrow().is_array()) {
      Some(other) => out.extend(elements(other)),
      None => out.push(arg.clone()),
    }
  }
  Ok(realm.new_array(out))
}

fn index_of(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let elems = elements(&arr);
  let from = relative_index(&arg(args, 1), elems.len(), 0);
  let needle = arg(args, 0);
  Ok(Value::Number(
    elems[from..]
      .iter()
      .position(|e| strict_equals(e, &needle))
      .map_or(-1.0, |i| (i + from) as f64),
  ))
}

fn includes(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let elems = elements(&arr);
  let from = relative_index(&arg(args, 1), elems.len(), 0);
  let needle = arg(args, 0);
  Ok(Value::Bool(
    elems[from..].iter().any(|e| same_value_zero(e, &needle)),
  ))
}

fn fill(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let len = len(&arr);
  let start = relative_index(&arg(args, 1), len, 0);
  let end = relative_index(&arg(args, 2), len, len).max(start);
  let value = arg(args, 0);
  with_elements(&arr, |e| e[start..end].fill(value));
  Ok(this)
}

fn callback(realm: &Realm, args: &[Value]) -> SandboxResult<Value> {
  let f = arg(args, 0);
  if !f.is_callable() {
    return Err(realm.throw_error(
      ErrorKind::TypeError,
      format!("{} is not a function", to_js_string(&f)),
    ));
  }
  Ok(f)
}

/// Calls `f(element, index, array)` for each index below the original length that still exists,
/// stopping early when `visit` returns `false`.
fn each(
  realm: &mut Realm,
  this: &Value,
  args: &[Value],
  mut visit: impl FnMut(Value, Value) -> bool,
) -> SandboxResult<()> {
  let arr = this_array(realm, this)?;
  let f = callback(realm, args)?;
  let this_arg = arg(args, 1);
  let original_len = len(&arr);
  for i in 0..original_len {
    if i >= len(&arr) {
      break;
    }
    let item = element(&arr, i);
    let result = realm.call(
      &f,
      this_arg.clone(),
      &[item.clone(), Value::Number(i as f64), this.clone()],
    )?;
    if !visit(item, result) {
      break;
    }
  }
  Ok(())
}

fn map(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let mut out = Vec::new();
  each(realm, &this, args, |_, result| {
    out.push(result);
    true
  })?;
  Ok(realm.new_array(out))
}

fn filter(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let mut out = Vec::new();
  each(realm, &this, args, |item, result| {
    if to_boolean(&result) {
      out.push(item);
    }
    true
  })?;
  Ok(realm.new_array(out))
}

fn for_each(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  each(realm, &this, args, |_, _| true)?;
  Ok(Value::Undefined)
}

fn some(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let mut found = false;
  each(realm, &this, args, |_, result| {
    found = to_boolean(&result);
    !found
  })?;
  Ok(Value::Bool(found))
}

fn every(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let mut all = true;
  each(realm, &this, args, |_, result| {
    all = to_boolean(&result);
    all
  })?;
  Ok(Value::Bool(all))
}

fn reduce(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let arr = this_array(realm, &this)?;
  let f = callback(realm, args)?;
  let original_len = len(&arr);
  let mut i = 0;
  let mut acc = match args.get(1) {
    Some(initial) => initial.clone(),
    None => {
      if original_len == 0 {
        return Err(realm.throw_error(
          ErrorKind::TypeError,
          "Reduce of empty array with no initial value",
        ));
      }
      i = 1;
      element(&arr, 0)
    }
  };
  while i < original_len && i < len(&arr) {
    let item = element(&arr, i);
    acc = realm.call(
      &f,
      Value::Undefined,
      &[acc, item, Value::Number(i as f64), this.clone()],
    )?;
    i += 1;
  }
  Ok(acc)
}

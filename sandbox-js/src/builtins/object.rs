use super::arg;
use super::define_constructor;
use super::define_method;
use crate::error::SandboxResult;
use crate::ops::to_js_string;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::ObjectKind;
use crate::value::Value;

pub(super) fn install(realm: &mut Realm) {
  let proto = realm.intrinsics().object_proto.clone();
  let ctor = define_constructor(realm, "Object", object, &proto);
  define_method(realm, &ctor, "keys", keys);
  define_method(realm, &proto, "hasOwnProperty", has_own_property);
  define_method(realm, &proto, "toString", to_string);
  define_method(realm, &proto, "valueOf", value_of);
}

fn object(realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  Ok(match arg(args, 0) {
    value @ Value::Object(_) => value,
    _ => Value::Object(realm.new_object()),
  })
}

fn keys(realm: &mut Realm, _this: Value, args: &[Value]) -> SandboxResult<Value> {
  let keys: Vec<Value> = match arg(args, 0) {
    Value::Object(obj) => obj.borrow().own_keys().into_iter().map(Value::String).collect(),
    Value::String(s) => (0..s.len_code_units())
      .map(|i| Value::String(JsString::from(i.to_string())))
      .collect(),
    Value::Undefined | Value::Null => {
      return Err(realm.throw_error(
        ErrorKind::TypeError,
        "Cannot convert undefined or null to object",
      ))
    }
    _ => Vec::new(),
  };
  Ok(realm.new_array(keys))
}

fn has_own_property(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let key = to_js_string(&arg(args, 0));
  Ok(Value::Bool(match &this {
    Value::Object(obj) => obj.borrow().has_own(&key),
    Value::String(s) => {
      crate::value::array_index(&key).is_some_and(|i| i < s.len_code_units())
        || key.as_code_units().iter().copied().eq("length".encode_utf16())
    }
    Value::Undefined | Value::Null => {
      return Err(realm.throw_error(
        ErrorKind::TypeError,
        "Cannot convert undefined or null to object",
      ))
    }
    _ => false,
  }))
}

fn to_string(_realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  let tag = match &this {
    Value::Undefined => "Undefined",
    Value::Null => "Null",
    Value::Bool(_) => "Boolean",
    Value::Number(_) => "Number",
    Value::String(_) => "String",
    Value::Object(obj) => match obj.borrow().kind {
      ObjectKind::Array(_) => "Array",
      ObjectKind::Closure(_) | ObjectKind::Native { .. } => "Function",
      ObjectKind::Error => "Error",
      ObjectKind::Plain => "Object",
    },
  };
  Ok(Value::String(JsString::from(format!("[object {tag}]"))))
}

fn value_of(_realm: &mut Realm, this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(this)
}

use super::arg;
use super::define_method;
use crate::error::SandboxResult;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::value::Value;

pub(super) fn install(realm: &mut Realm) {
  let proto = realm.intrinsics().function_proto.clone();
  define_method(realm, &proto, "call", call);
  define_method(realm, &proto, "apply", apply);
  define_method(realm, &proto, "toString", to_string);
}

fn call(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let rest = args.get(1..).unwrap_or_default();
  realm.call(&this, arg(args, 0), rest)
}

fn apply(realm: &mut Realm, this: Value, args: &[Value]) -> SandboxResult<Value> {
  let call_args = match arg(args, 1) {
    Value::Undefined | Value::Null => Vec::new(),
    Value::Object(obj) => match obj.borrow().array_elements() {
      Some(elems) => elems.clone(),
      None => Vec::new(),
    },
    _ => {
      return Err(realm.throw_error(
        ErrorKind::TypeError,
        "CreateListFromArrayLike called on non-object",
      ))
    }
  };
  realm.call(&this, arg(args, 0), &call_args)
}

fn to_string(_realm: &mut Realm, _this: Value, _args: &[Value]) -> SandboxResult<Value> {
  Ok(Value::string("function () { [native code] }"))
}

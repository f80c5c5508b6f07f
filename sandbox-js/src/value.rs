use crate::env::EnvRef;
use crate::error::SandboxResult;
use crate::realm::Realm;
use crate::string::JsString;
use ahash::HashMap;
use ahash::HashMapExt;
use std::cell::Ref;
use std::cell::RefCell;
use std::cell::RefMut;
use std::fmt;
use std::rc::Rc;
use syntax_js::ast::syntax::Func;

/// A JavaScript value.
#[derive(Clone, Debug)]
pub enum Value {
  Undefined,
  Null,
  Bool(bool),
  /// An IEEE-754 double.
  Number(f64),
  String(JsString),
  Object(ObjRef),
}

impl Value {
  pub fn string(s: &str) -> Value {
    Value::String(JsString::from(s))
  }

  pub fn is_nullish(&self) -> bool {
    matches!(self, Value::Undefined | Value::Null)
  }

  pub fn as_object(&self) -> Option<&ObjRef> {
    match self {
      Value::Object(obj) => Some(obj),
      _ => None,
    }
  }

  pub fn is_callable(&self) -> bool {
    self.as_object().is_some_and(|o| o.borrow().is_callable())
  }
}

impl From<JsString> for Value {
  fn from(s: JsString) -> Self {
    Value::String(s)
  }
}

impl From<f64> for Value {
  fn from(n: f64) -> Self {
    Value::Number(n)
  }
}

impl From<bool> for Value {
  fn from(b: bool) -> Self {
    Value::Bool(b)
  }
}

/// A host function exposed to scripts. Receives `this` and the call arguments.
pub type NativeFn = fn(&mut Realm, Value, &[Value]) -> SandboxResult<Value>;

/// A script function closed over the environment it was created in.
#[derive(Clone)]
pub struct Closure {
  pub func: Rc<Func>,
  pub env: EnvRef,
}

pub enum ObjectKind {
  Plain,
  Array(Vec<Value>),
  Closure(Closure),
  Native { name: &'static str, call: NativeFn },
  Error,
}

pub struct Object {
  pub proto: Option<ObjRef>,
  pub kind: ObjectKind,
  props: HashMap<JsString, Value>,
  // Insertion order of `props`.
  keys: Vec<JsString>,
}

/// Parses a canonical array index such as `0` or `17`, but not `01` or `1.0`.
pub fn array_index(key: &JsString) -> Option<usize> {
  let units = key.as_code_units();
  if units.is_empty() || units.len() > 10 || (units.len() > 1 && units[0] == b'0' as u16) {
    return None;
  }
  let mut n: u64 = 0;
  for &u in units {
    if !(b'0' as u16..=b'9' as u16).contains(&u) {
      return None;
    }
    n = n * 10 + (u - b'0' as u16) as u64;
  }
  (n < u32::MAX as u64).then_some(n as usize)
}

fn is_length_key(key: &JsString) -> bool {
  key.as_code_units().iter().copied().eq("length".encode_utf16())
}

impl Object {
  pub fn new(proto: Option<ObjRef>, kind: ObjectKind) -> Object {
    Object {
      proto,
      kind,
      props: HashMap::new(),
      keys: Vec::new(),
    }
  }

  pub fn is_callable(&self) -> bool {
    matches!(
      self.kind,
      ObjectKind::Closure(_) | ObjectKind::Native { .. }
    )
  }

  pub fn is_array(&self) -> bool {
    matches!(self.kind, ObjectKind::Array(_))
  }

  pub fn array_elements(&self) -> Option<&Vec<Value>> {
    match &self.kind {
      ObjectKind::Array(elems) => Some(elems),
      _ => None,
    }
  }

  pub fn array_elements_mut(&mut self) -> Option<&mut Vec<Value>> {
    match &mut self.kind {
      ObjectKind::Array(elems) => Some(elems),
      _ => None,
    }
  }

  pub fn get_own(&self, key: &JsString) -> Option<Value> {
    if let ObjectKind::Array(elems) = &self.kind {
      if is_length_key(key) {
        return Some(Value::Number(elems.len() as f64));
      }
      if let Some(i) = array_index(key) {
        return elems.get(i).cloned();
      }
    }
    self.props.get(key).cloned()
  }

  pub fn has_own(&self, key: &JsString) -> bool {
    self.get_own(key).is_some()
  }

  pub fn set_own(&mut self, key: JsString, value: Value) {
    if let ObjectKind::Array(elems) = &mut self.kind {
      if let Some(i) = array_index(&key) {
        if i >= elems.len() {
          elems.resize(i + 1, Value::Undefined);
        }
        elems[i] = value;
        return;
      }
      if is_length_key(&key) {
        if let Value::Number(n) = value {
          if n >= 0.0 && n.fract() == 0.0 && n < u32::MAX as f64 {
            elems.resize(n as usize, Value::Undefined);
          }
        }
        return;
      }
    }
    if !self.props.contains_key(&key) {
      self.keys.push(key.clone());
    }
    self.props.insert(key, value);
  }

  pub fn delete_own(&mut self, key: &JsString) -> bool {
    if let ObjectKind::Array(elems) = &mut self.kind {
      if let Some(i) = array_index(key) {
        if let Some(slot) = elems.get_mut(i) {
          *slot = Value::Undefined;
        }
        return true;
      }
    }
    if self.props.remove(key).is_some() {
      self.keys.retain(|k| k != key);
    }
    true
  }

  /// Own enumerable keys in property order: integer keys ascending, then strings in insertion
  /// order.
  pub fn own_keys(&self) -> Vec<JsString> {
    let mut out = Vec::new();
    if let ObjectKind::Array(elems) = &self.kind {
      out.extend((0..elems.len()).map(|i| JsString::from(i.to_string())));
    }
    let mut indices: Vec<(usize, JsString)> = self
      .keys
      .iter()
      .filter_map(|k| array_index(k).map(|i| (i, k.clone())))
      .collect();
    indices.sort_by_key(|(i, _)| *i);
    out.extend(indices.into_iter().map(|(_, k)| k));
    out.extend(self.keys.iter().filter(|k| array_index(k).is_none()).cloned());
    out
  }

  pub fn own_string_prop(&self, name: &str) -> Option<String> {
    match self.props.get(&JsString::from(name)) {
      Some(Value::String(s)) => Some(s.to_utf8_lossy()),
      _ => None,
    }
  }
}

/// Shared, mutable reference to a heap object. Equality is identity.
#[derive(Clone)]
pub struct ObjRef(Rc<RefCell<Object>>);

impl ObjRef {
  pub fn new(obj: Object) -> ObjRef {
    ObjRef(Rc::new(RefCell::new(obj)))
  }

  pub fn borrow(&self) -> Ref<'_, Object> {
    self.0.borrow()
  }

  pub fn borrow_mut(&self) -> RefMut<'_, Object> {
    self.0.borrow_mut()
  }

  pub fn ptr_eq(&self, other: &ObjRef) -> bool {
    Rc::ptr_eq(&self.0, &other.0)
  }
}

impl fmt::Debug for ObjRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let Ok(obj) = self.0.try_borrow() else {
      return f.write_str("[object (borrowed)]");
    };
    match &obj.kind {
      ObjectKind::Plain => f.write_str("[object Object]"),
      ObjectKind::Array(elems) => write!(f, "[array; {}]", elems.len()),
      ObjectKind::Closure(_) => f.write_str("[function]"),
      ObjectKind::Native { name, .. } => write!(f, "[native function {name}]"),
      ObjectKind::Error => f.write_str("[object Error]"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::array_index;
  use super::Object;
  use super::ObjectKind;
  use super::Value;
  use crate::string::JsString;

  #[test]
  fn canonical_array_indices() {
    assert_eq!(array_index(&JsString::from("0")), Some(0));
    assert_eq!(array_index(&JsString::from("42")), Some(42));
    assert_eq!(array_index(&JsString::from("042")), None);
    assert_eq!(array_index(&JsString::from("1.5")), None);
    assert_eq!(array_index(&JsString::from("")), None);
  }

  #[test]
  fn key_order_puts_integers_first() {
    let mut obj = Object::new(None, ObjectKind::Plain);
    obj.set_own(JsString::from("b"), Value::Null);
    obj.set_own(JsString::from("2"), Value::Null);
    obj.set_own(JsString::from("a"), Value::Null);
    obj.set_own(JsString::from("1"), Value::Null);
    let keys: Vec<String> = obj.own_keys().iter().map(|k| k.to_utf8_lossy()).collect();
    assert_eq!(keys, ["1", "2", "b", "a"]);
  }

  #[test]
  fn array_length_tracks_elements() {
    let mut arr = Object::new(None, ObjectKind::Array(vec![Value::Null]));
    arr.set_own(JsString::from("3"), Value::Bool(true));
    assert!(matches!(arr.get_own(&JsString::from("length")), Some(Value::Number(n)) if n == 4.0));
    arr.set_own(JsString::from("length"), Value::Number(1.0));
    assert_eq!(arr.array_elements().map(|e| e.len()), Some(1));
  }
}

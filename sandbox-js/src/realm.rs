use crate::builtins;
use crate::env::EnvError;
use crate::env::EnvRef;
use crate::error::SandboxError;
use crate::error::SandboxResult;
use crate::error::TerminationReason;
use crate::interp::Completion;
use crate::string::JsString;
use crate::value::array_index;
use crate::value::Closure;
use crate::value::NativeFn;
use crate::value::ObjRef;
use crate::value::Object;
use crate::value::ObjectKind;
use crate::value::Value;
use ahash::HashMap;
use ahash::HashMapExt;
use std::rc::Rc;
use syntax_js::ast::node::Node;
use syntax_js::ast::node::NodeId;
use syntax_js::ast::syntax::Func;
use syntax_js::ast::syntax::Syntax;
use syntax_js::parse;
use syntax_js::ParseOptions;
use tracing::debug;

/// Per-evaluation resource limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Budget {
  /// Units of work allowed per [`Realm::evaluate`] call. Every statement, loop iteration and
  /// function call consumes one unit.
  pub fuel: u64,
  /// Maximum depth of nested function calls.
  pub max_stack_depth: usize,
}

impl Default for Budget {
  fn default() -> Self {
    Self {
      fuel: 1_000_000,
      max_stack_depth: 64,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  Error,
  TypeError,
  RangeError,
  ReferenceError,
  SyntaxError,
  URIError,
}

impl ErrorKind {
  pub const ALL: [ErrorKind; 6] = [
    ErrorKind::Error,
    ErrorKind::TypeError,
    ErrorKind::RangeError,
    ErrorKind::ReferenceError,
    ErrorKind::SyntaxError,
    ErrorKind::URIError,
  ];

  pub fn name(self) -> &'static str {
    match self {
      ErrorKind::Error => "Error",
      ErrorKind::TypeError => "TypeError",
      ErrorKind::RangeError => "RangeError",
      ErrorKind::ReferenceError => "ReferenceError",
      ErrorKind::SyntaxError => "SyntaxError",
      ErrorKind::URIError => "URIError",
    }
  }
}

enum Callee {
  Native(NativeFn),
  Closure(Closure),
}

/// Prototype objects shared by all values of a realm.
pub struct Intrinsics {
  pub object_proto: ObjRef,
  pub function_proto: ObjRef,
  pub array_proto: ObjRef,
  pub string_proto: ObjRef,
  pub number_proto: ObjRef,
  pub boolean_proto: ObjRef,
  error_protos: Vec<(ErrorKind, ObjRef)>,
}

impl Intrinsics {
  fn new() -> Intrinsics {
    let object_proto = ObjRef::new(Object::new(None, ObjectKind::Plain));
    let derived = || ObjRef::new(Object::new(Some(object_proto.clone()), ObjectKind::Plain));
    let function_proto = ObjRef::new(Object::new(Some(object_proto.clone()), ObjectKind::Native {
      name: "",
      call: |_, _, _| Ok(Value::Undefined),
    }));
    let array_proto = derived();
    let string_proto = derived();
    let number_proto = derived();
    let boolean_proto = derived();
    let base_error_proto = derived();
    let error_protos = ErrorKind::ALL
      .iter()
      .map(|&kind| {
        let proto = if kind == ErrorKind::Error {
          base_error_proto.clone()
        } else {
          ObjRef::new(Object::new(Some(base_error_proto.clone()), ObjectKind::Plain))
        };
        proto
          .borrow_mut()
          .set_own(JsString::from("name"), Value::string(kind.name()));
        (kind, proto)
      })
      .collect();
    Intrinsics {
      object_proto,
      function_proto,
      array_proto,
      string_proto,
      number_proto,
      boolean_proto,
      error_protos,
    }
  }

  pub fn error_proto(&self, kind: ErrorKind) -> ObjRef {
    self
      .error_protos
      .iter()
      .find(|(k, _)| *k == kind)
      .map(|(_, proto)| proto.clone())
      .unwrap_or_else(|| self.object_proto.clone())
  }
}

/// An isolated global environment that evaluates script snippets.
///
/// Declarations made by one [`Realm::evaluate`] call stay visible to later calls, so a function
/// can be registered once and then called many times.
pub struct Realm {
  pub(crate) global: EnvRef,
  intrinsics: Intrinsics,
  budget: Budget,
  fuel: u64,
  depth: usize,
  // Functions are shared between every closure created from the same syntax node.
  functions: HashMap<NodeId, Rc<Func>>,
}

impl Realm {
  pub fn new(budget: Budget) -> Realm {
    let mut realm = Realm {
      global: EnvRef::new_global(),
      intrinsics: Intrinsics::new(),
      budget,
      fuel: budget.fuel,
      depth: 0,
      functions: HashMap::new(),
    };
    builtins::install(&mut realm);
    realm
  }

  pub fn budget(&self) -> Budget {
    self.budget
  }

  pub fn intrinsics(&self) -> &Intrinsics {
    &self.intrinsics
  }

  /// Parses `source` as a script and runs it, returning the completion value of its last
  /// value-producing statement.
  pub fn evaluate(&mut self, source: &str) -> SandboxResult<Value> {
    let program = parse(source, ParseOptions { is_module: false })?;
    let Syntax::Program { body, .. } = program.stx.as_ref() else {
      return Err(SandboxError::Unsupported("non-program root"));
    };
    self.fuel = self.budget.fuel;
    self.depth = 0;
    let global = self.global.clone();
    let result = self
      .hoist_declarations(&global, body, true)
      .and_then(|_| self.eval_stmt_list(&global, body));
    debug!(
      fuel_used = self.budget.fuel - self.fuel,
      ok = result.is_ok(),
      "evaluated snippet"
    );
    match result? {
      Completion::Normal(value) => Ok(value.unwrap_or(Value::Undefined)),
      Completion::Return(_) => Err(SandboxError::Unsupported("return outside of function")),
      Completion::Break(_) | Completion::Continue(_) => {
        Err(SandboxError::Unsupported("jump outside of loop"))
      }
    }
  }

  /// Consumes one unit of fuel.
  pub(crate) fn tick(&mut self) -> SandboxResult<()> {
    if self.fuel == 0 {
      return Err(SandboxError::Termination(TerminationReason::OutOfFuel));
    }
    self.fuel -= 1;
    Ok(())
  }

  pub fn new_object(&self) -> ObjRef {
    ObjRef::new(Object::new(
      Some(self.intrinsics.object_proto.clone()),
      ObjectKind::Plain,
    ))
  }

  pub fn new_array(&self, elements: Vec<Value>) -> Value {
    Value::Object(ObjRef::new(Object::new(
      Some(self.intrinsics.array_proto.clone()),
      ObjectKind::Array(elements),
    )))
  }

  pub fn new_native(&self, name: &'static str, call: NativeFn) -> ObjRef {
    ObjRef::new(Object::new(
      Some(self.intrinsics.function_proto.clone()),
      ObjectKind::Native { name, call },
    ))
  }

  pub fn new_error(&self, kind: ErrorKind, message: &str) -> Value {
    let mut obj = Object::new(Some(self.intrinsics.error_proto(kind)), ObjectKind::Error);
    obj.set_own(JsString::from("name"), Value::string(kind.name()));
    obj.set_own(JsString::from("message"), Value::string(message));
    Value::Object(ObjRef::new(obj))
  }

  /// A thrown error of the given kind, ready to be returned with `Err(..)`.
  pub fn throw_error(&self, kind: ErrorKind, message: impl AsRef<str>) -> SandboxError {
    SandboxError::Throw(self.new_error(kind, message.as_ref()))
  }

  pub(crate) fn env_error(&self, err: EnvError) -> SandboxError {
    let kind = match err {
      EnvError::Undeclared(_) | EnvError::Uninitialized(_) => ErrorKind::ReferenceError,
      EnvError::ConstAssignment(_) => ErrorKind::TypeError,
      EnvError::Redeclared(_) => ErrorKind::SyntaxError,
    };
    self.throw_error(kind, err.message())
  }

  /// Defines a global binding, as a script-level `var` would.
  pub fn define_global(&mut self, name: &str, value: Value) {
    self.global.define_var(name, value);
  }

  /// Reads a global binding.
  pub fn global(&self, name: &str) -> Option<Value> {
    self.global.lookup(name).ok()
  }

  pub(crate) fn closure(&mut self, node: &Node, func: &Func, env: &EnvRef) -> Value {
    let func = self
      .functions
      .entry(node.id)
      .or_insert_with(|| Rc::new(func.clone()))
      .clone();
    let is_named_expr = !func.is_arrow && matches!(node.stx.as_ref(), Syntax::FuncExpr { .. });
    let name = func.name.as_ref().and_then(|n| n.stx.ident_name()).map(str::to_string);
    // A named function expression sees its own name in a scope of its own.
    let env = match (&name, is_named_expr) {
      (Some(_), true) => env.new_block(),
      _ => env.clone(),
    };
    let obj = ObjRef::new(Object::new(
      Some(self.intrinsics.function_proto.clone()),
      ObjectKind::Closure(Closure {
        func,
        env: env.clone(),
      }),
    ));
    if let (Some(name), true) = (name, is_named_expr) {
      env.initialize(&name, Value::Object(obj.clone()));
    }
    Value::Object(obj)
  }

  fn proto_of_primitive(&self, value: &Value) -> Option<ObjRef> {
    match value {
      Value::String(_) => Some(self.intrinsics.string_proto.clone()),
      Value::Number(_) => Some(self.intrinsics.number_proto.clone()),
      Value::Bool(_) => Some(self.intrinsics.boolean_proto.clone()),
      _ => None,
    }
  }

  fn get_from_chain(&self, start: Option<ObjRef>, key: &JsString) -> Value {
    let mut cur = start;
    while let Some(obj) = cur {
      let next = {
        let obj = obj.borrow();
        if let Some(value) = obj.get_own(key) {
          return value;
        }
        obj.proto.clone()
      };
      cur = next;
    }
    Value::Undefined
  }

  /// `target[key]`, following prototype chains. Primitives use their realm prototypes.
  pub fn get(&mut self, target: &Value, key: &JsString) -> SandboxResult<Value> {
    match target {
      Value::Undefined | Value::Null => Err(self.throw_error(
        ErrorKind::TypeError,
        format!(
          "Cannot read properties of {} (reading '{}')",
          crate::ops::to_js_string(target),
          key
        ),
      )),
      Value::String(s) => {
        if key.as_code_units().iter().copied().eq("length".encode_utf16()) {
          return Ok(Value::Number(s.len_code_units() as f64));
        }
        if let Some(i) = array_index(key) {
          return Ok(match s.as_code_units().get(i) {
            Some(&unit) => Value::String(JsString::from_code_units(&[unit])),
            None => Value::Undefined,
          });
        }
        Ok(self.get_from_chain(self.proto_of_primitive(target), key))
      }
      Value::Number(_) | Value::Bool(_) => {
        Ok(self.get_from_chain(self.proto_of_primitive(target), key))
      }
      Value::Object(obj) => {
        let is_closure = matches!(obj.borrow().kind, ObjectKind::Closure(_));
        if is_closure
          && key.as_code_units().iter().copied().eq("prototype".encode_utf16())
          && !obj.borrow().has_own(key)
        {
          let proto = self.new_object();
          proto
            .borrow_mut()
            .set_own(JsString::from("constructor"), target.clone());
          obj
            .borrow_mut()
            .set_own(key.clone(), Value::Object(proto.clone()));
          return Ok(Value::Object(proto));
        }
        Ok(self.get_from_chain(Some(obj.clone()), key))
      }
    }
  }

  /// `target[key] = value`. Writes to primitives are silently dropped.
  pub fn set(&mut self, target: &Value, key: JsString, value: Value) -> SandboxResult<()> {
    match target {
      Value::Undefined | Value::Null => Err(self.throw_error(
        ErrorKind::TypeError,
        format!(
          "Cannot set properties of {} (setting '{}')",
          crate::ops::to_js_string(target),
          key
        ),
      )),
      Value::Object(obj) => {
        obj.borrow_mut().set_own(key, value);
        Ok(())
      }
      _ => Ok(()),
    }
  }

  /// `key in target`.
  pub fn has_property(&self, target: &ObjRef, key: &JsString) -> bool {
    let mut cur = Some(target.clone());
    while let Some(obj) = cur {
      let next = {
        let obj = obj.borrow();
        if obj.has_own(key) {
          return true;
        }
        obj.proto.clone()
      };
      cur = next;
    }
    false
  }

  /// Calls `callee` with the given `this` and arguments.
  pub fn call(&mut self, callee: &Value, this: Value, args: &[Value]) -> SandboxResult<Value> {
    let Some(obj) = callee.as_object().filter(|o| o.borrow().is_callable()) else {
      return Err(self.throw_error(
        ErrorKind::TypeError,
        format!("{} is not a function", crate::ops::to_js_string(callee)),
      ));
    };
    self.tick()?;
    if self.depth >= self.budget.max_stack_depth {
      return Err(SandboxError::Termination(TerminationReason::StackOverflow));
    }
    let target = match &obj.borrow().kind {
      ObjectKind::Native { call, .. } => Callee::Native(*call),
      ObjectKind::Closure(closure) => Callee::Closure(closure.clone()),
      _ => return Err(SandboxError::Unsupported("call of non-function object")),
    };
    self.depth += 1;
    let result = match target {
      Callee::Native(native) => native(self, this, args),
      Callee::Closure(closure) => self.call_closure(&closure, this, args),
    };
    self.depth -= 1;
    result
  }

  /// `new callee(...args)`.
  pub fn construct(&mut self, callee: &Value, args: &[Value]) -> SandboxResult<Value> {
    let is_closure = match callee.as_object() {
      Some(obj) => match &obj.borrow().kind {
        ObjectKind::Closure(closure) => {
          if closure.func.is_arrow || closure.func.is_async || closure.func.is_generator {
            return Err(self.throw_error(ErrorKind::TypeError, "not a constructor"));
          }
          true
        }
        _ => false,
      },
      None => false,
    };
    if !is_closure {
      // Native constructors behave the same with or without `new`.
      return self.call(callee, Value::Undefined, args);
    }
    let proto = match self.get(callee, &JsString::from("prototype"))? {
      Value::Object(proto) => proto,
      _ => self.intrinsics.object_proto.clone(),
    };
    let this = Value::Object(ObjRef::new(Object::new(Some(proto), ObjectKind::Plain)));
    match self.call(callee, this.clone(), args)? {
      result @ Value::Object(_) => Ok(result),
      _ => Ok(this),
    }
  }

  /// `value instanceof ctor`.
  pub fn instance_of(&mut self, value: &Value, ctor: &Value) -> SandboxResult<bool> {
    if !ctor.is_callable() {
      return Err(self.throw_error(
        ErrorKind::TypeError,
        "Right-hand side of 'instanceof' is not callable",
      ));
    }
    let Value::Object(obj) = value else {
      return Ok(false);
    };
    let Value::Object(proto) = self.get(ctor, &JsString::from("prototype"))? else {
      return Ok(false);
    };
    let mut cur = obj.borrow().proto.clone();
    while let Some(p) = cur {
      if p.ptr_eq(&proto) {
        return Ok(true);
      }
      cur = p.borrow().proto.clone();
    }
    Ok(false)
  }
}

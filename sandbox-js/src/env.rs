use crate::value::Value;
use ahash::HashMap;
use ahash::HashMapExt;
use std::cell::RefCell;
use std::rc::Rc;

/// Why a binding operation failed. The interpreter turns these into thrown errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
  /// `ReferenceError`: the name isn't declared in any enclosing scope.
  Undeclared(String),
  /// `ReferenceError`: a `let`/`const`/`class` binding was used before its declaration ran.
  Uninitialized(String),
  /// `TypeError`: assignment to a `const` binding.
  ConstAssignment(String),
  /// `SyntaxError`: a lexical binding was declared twice in the same scope.
  Redeclared(String),
}

impl EnvError {
  pub fn message(&self) -> String {
    match self {
      EnvError::Undeclared(name) => format!("{name} is not defined"),
      EnvError::Uninitialized(name) => format!("Cannot access '{name}' before initialization"),
      EnvError::ConstAssignment(_) => "Assignment to constant variable.".to_string(),
      EnvError::Redeclared(name) => format!("Identifier '{name}' has already been declared"),
    }
  }
}

#[derive(Debug)]
struct Binding {
  value: Value,
  mutable: bool,
  // False while a lexical binding is in its temporal dead zone.
  initialized: bool,
  lexical: bool,
}

#[derive(Debug)]
struct Scope {
  bindings: HashMap<String, Binding>,
  parent: Option<EnvRef>,
  // Function and global scopes receive hoisted `var` declarations.
  is_function: bool,
  // `this` of a non-arrow function scope. Arrow function scopes leave this unset so lookups
  // continue outwards.
  this: Option<Value>,
}

/// Reference to one scope in the environment chain.
#[derive(Clone, Debug)]
pub struct EnvRef(Rc<RefCell<Scope>>);

impl EnvRef {
  pub fn new_global() -> EnvRef {
    EnvRef(Rc::new(RefCell::new(Scope {
      bindings: HashMap::new(),
      parent: None,
      is_function: true,
      this: None,
    })))
  }

  /// A block scope nested in this one.
  pub fn new_block(&self) -> EnvRef {
    EnvRef(Rc::new(RefCell::new(Scope {
      bindings: HashMap::new(),
      parent: Some(self.clone()),
      is_function: false,
      this: None,
    })))
  }

  /// The scope of a function body whose closure was created in this scope.
  pub fn new_function(&self, this: Option<Value>) -> EnvRef {
    EnvRef(Rc::new(RefCell::new(Scope {
      bindings: HashMap::new(),
      parent: Some(self.clone()),
      is_function: true,
      this,
    })))
  }

  fn parent(&self) -> Option<EnvRef> {
    self.0.borrow().parent.clone()
  }

  fn var_scope(&self) -> EnvRef {
    let mut cur = self.clone();
    loop {
      if cur.0.borrow().is_function {
        return cur;
      }
      match cur.parent() {
        Some(parent) => cur = parent,
        None => return cur,
      }
    }
  }

  /// Declares a `var` in the nearest function or global scope. Existing bindings keep their value.
  pub fn declare_var(&self, name: &str) {
    let scope = self.var_scope();
    let mut scope = scope.0.borrow_mut();
    scope.bindings.entry(name.to_string()).or_insert(Binding {
      value: Value::Undefined,
      mutable: true,
      initialized: true,
      lexical: false,
    });
  }

  /// Declares and initializes a function-scoped binding, overwriting any previous value. Used for
  /// hoisted function declarations and parameters.
  pub fn define_var(&self, name: &str, value: Value) {
    let scope = self.var_scope();
    scope.0.borrow_mut().bindings.insert(name.to_string(), Binding {
      value,
      mutable: true,
      initialized: true,
      lexical: false,
    });
  }

  /// Declares a lexical binding in this scope. It stays uninitialized until [`EnvRef::initialize`].
  pub fn declare_lexical(&self, name: &str, mutable: bool) -> Result<(), EnvError> {
    let mut scope = self.0.borrow_mut();
    if scope.bindings.get(name).is_some_and(|b| b.lexical) {
      return Err(EnvError::Redeclared(name.to_string()));
    }
    scope.bindings.insert(name.to_string(), Binding {
      value: Value::Undefined,
      mutable,
      initialized: false,
      lexical: true,
    });
    Ok(())
  }

  /// Ends the temporal dead zone of a lexical binding declared in this scope.
  pub fn initialize(&self, name: &str, value: Value) {
    let mut scope = self.0.borrow_mut();
    match scope.bindings.get_mut(name) {
      Some(binding) => {
        binding.value = value;
        binding.initialized = true;
      }
      None => {
        scope.bindings.insert(name.to_string(), Binding {
          value,
          mutable: true,
          initialized: true,
          lexical: true,
        });
      }
    }
  }

  pub fn has(&self, name: &str) -> bool {
    let mut cur = Some(self.clone());
    while let Some(scope) = cur {
      if scope.0.borrow().bindings.contains_key(name) {
        return true;
      }
      cur = scope.parent();
    }
    false
  }

  pub fn lookup(&self, name: &str) -> Result<Value, EnvError> {
    let mut cur = Some(self.clone());
    while let Some(scope) = cur {
      if let Some(binding) = scope.0.borrow().bindings.get(name) {
        if !binding.initialized {
          return Err(EnvError::Uninitialized(name.to_string()));
        }
        return Ok(binding.value.clone());
      }
      cur = scope.parent();
    }
    Err(EnvError::Undeclared(name.to_string()))
  }

  /// Assigns to the nearest binding of `name`. Assigning to an undeclared name creates a global.
  pub fn assign(&self, name: &str, value: Value) -> Result<(), EnvError> {
    let mut cur = self.clone();
    loop {
      {
        let mut scope = cur.0.borrow_mut();
        if let Some(binding) = scope.bindings.get_mut(name) {
          if !binding.initialized {
            return Err(EnvError::Uninitialized(name.to_string()));
          }
          if !binding.mutable {
            return Err(EnvError::ConstAssignment(name.to_string()));
          }
          binding.value = value;
          return Ok(());
        }
      }
      match cur.parent() {
        Some(parent) => cur = parent,
        None => break,
      }
    }
    cur.define_var(name, value);
    Ok(())
  }

  /// `this` of the innermost non-arrow function, or `undefined` at the top level.
  pub fn this_value(&self) -> Value {
    let mut cur = Some(self.clone());
    while let Some(scope) = cur {
      if let Some(this) = &scope.0.borrow().this {
        return this.clone();
      }
      cur = scope.parent();
    }
    Value::Undefined
  }
}

#[cfg(test)]
mod tests {
  use super::EnvError;
  use super::EnvRef;
  use crate::value::Value;

  fn num(env: &EnvRef, name: &str) -> f64 {
    match env.lookup(name) {
      Ok(Value::Number(n)) => n,
      other => panic!("unexpected lookup result {other:?}"),
    }
  }

  #[test]
  fn var_hoists_past_blocks() {
    let global = EnvRef::new_global();
    let func = global.new_function(None);
    let block = func.new_block();
    block.declare_var("x");
    block.assign("x", Value::Number(1.0)).unwrap();
    assert_eq!(num(&func, "x"), 1.0);
    assert!(!global.has("x"));
  }

  #[test]
  fn lexical_bindings_have_a_dead_zone() {
    let global = EnvRef::new_global();
    let block = global.new_block();
    block.declare_lexical("y", false).unwrap();
    assert_eq!(block.lookup("y").unwrap_err(), EnvError::Uninitialized("y".to_string()));
    block.initialize("y", Value::Number(2.0));
    assert_eq!(num(&block, "y"), 2.0);
    assert_eq!(
      block.assign("y", Value::Null).unwrap_err(),
      EnvError::ConstAssignment("y".to_string())
    );
    assert_eq!(
      block.declare_lexical("y", true).unwrap_err(),
      EnvError::Redeclared("y".to_string())
    );
  }

  #[test]
  fn undeclared_assignment_creates_global() {
    let global = EnvRef::new_global();
    let inner = global.new_function(None).new_block();
    inner.assign("z", Value::Bool(true)).unwrap();
    assert!(global.has("z"));
    assert!(matches!(global.lookup("missing"), Err(EnvError::Undeclared(_))));
  }

  #[test]
  fn this_skips_arrow_scopes() {
    let global = EnvRef::new_global();
    let method = global.new_function(Some(Value::Number(7.0)));
    let arrow = method.new_function(None);
    assert!(matches!(arrow.this_value(), Value::Number(n) if n == 7.0));
    assert!(matches!(global.this_value(), Value::Undefined));
  }
}

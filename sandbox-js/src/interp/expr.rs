use super::BindMode;
use crate::env::EnvRef;
use crate::error::SandboxError;
use crate::error::SandboxResult;
use crate::ops;
use crate::ops::to_boolean;
use crate::ops::to_js_string;
use crate::ops::to_number;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::Value;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::PropKind;
use syntax_js::ast::syntax::Syntax;
use syntax_js::decode_escapes;
use syntax_js::operator::OperatorName;

/// A resolved assignment target.
enum Reference {
  Binding(String),
  Property(Value, JsString),
}

impl Realm {
  fn eval_reference(&mut self, env: &EnvRef, target: &Node) -> SandboxResult<Reference> {
    match target.stx.as_ref() {
      Syntax::IdExpr { name } | Syntax::IdPat { name } => Ok(Reference::Binding(name.clone())),
      Syntax::MemberExpr { object, prop, .. } => {
        if prop.starts_with('#') {
          return Err(SandboxError::Unsupported("private member"));
        }
        let object = self.eval_expr(env, object)?;
        Ok(Reference::Property(object, JsString::from(prop.as_str())))
      }
      Syntax::ComputedMemberExpr { object, member, .. } => {
        let object = self.eval_expr(env, object)?;
        let key = self.eval_expr(env, member)?;
        Ok(Reference::Property(object, to_js_string(&key)))
      }
      _ => Err(SandboxError::Unsupported("assignment target")),
    }
  }

  fn get_reference(&mut self, env: &EnvRef, reference: &Reference) -> SandboxResult<Value> {
    match reference {
      Reference::Binding(name) => env.lookup(name).map_err(|err| self.env_error(err)),
      Reference::Property(object, key) => self.get(object, key),
    }
  }

  fn put_reference(
    &mut self,
    env: &EnvRef,
    reference: Reference,
    value: Value,
  ) -> SandboxResult<()> {
    match reference {
      Reference::Binding(name) => env.assign(&name, value).map_err(|err| self.env_error(err)),
      Reference::Property(object, key) => self.set(&object, key, value),
    }
  }

  fn eval_args(&mut self, env: &EnvRef, args: &[Node]) -> SandboxResult<Vec<Value>> {
    let mut out = Vec::with_capacity(args.len());
    for arg in args {
      match arg.stx.as_ref() {
        Syntax::SpreadElement { argument } => {
          let value = self.eval_expr(env, argument)?;
          out.extend(self.iterate(&value)?);
        }
        _ => out.push(self.eval_expr(env, arg)?),
      }
    }
    Ok(out)
  }

  fn eval_assignment(
    &mut self,
    env: &EnvRef,
    operator: OperatorName,
    left: &Node,
    right: &Node,
  ) -> SandboxResult<Value> {
    if operator == OperatorName::Assignment {
      if matches!(left.stx.as_ref(), Syntax::ArrPat { .. } | Syntax::ObjPat { .. }) {
        let value = self.eval_expr(env, right)?;
        self.bind_pattern(env, left, value.clone(), BindMode::Assign)?;
        return Ok(value);
      }
      let reference = self.eval_reference(env, left)?;
      let value = self.eval_expr(env, right)?;
      self.put_reference(env, reference, value.clone())?;
      return Ok(value);
    }
    let reference = self.eval_reference(env, left)?;
    let current = self.get_reference(env, &reference)?;
    let short_circuits = match operator {
      OperatorName::AssignmentLogicalAnd => Some(!to_boolean(&current)),
      OperatorName::AssignmentLogicalOr => Some(to_boolean(&current)),
      OperatorName::AssignmentNullishCoalescing => Some(!current.is_nullish()),
      _ => None,
    };
    let value = match short_circuits {
      Some(true) => return Ok(current),
      Some(false) => self.eval_expr(env, right)?,
      None => {
        let rhs = self.eval_expr(env, right)?;
        operator
          .compound_base()
          .and_then(|base| ops::binary(base, &current, &rhs))
          .ok_or(SandboxError::Unsupported("assignment operator"))?
      }
    };
    self.put_reference(env, reference, value.clone())?;
    Ok(value)
  }

  fn eval_update(
    &mut self,
    env: &EnvRef,
    argument: &Node,
    delta: f64,
    prefix: bool,
  ) -> SandboxResult<Value> {
    let reference = self.eval_reference(env, argument)?;
    let old = to_number(&self.get_reference(env, &reference)?);
    let new = old + delta;
    self.put_reference(env, reference, Value::Number(new))?;
    Ok(Value::Number(if prefix { new } else { old }))
  }

  fn eval_unary(&mut self, env: &EnvRef, operator: OperatorName, argument: &Node) -> SandboxResult<Value> {
    match operator {
      OperatorName::Typeof => {
        if let Syntax::IdExpr { name } = argument.stx.as_ref() {
          if !env.has(name) {
            return Ok(Value::string("undefined"));
          }
        }
      }
      OperatorName::Delete => {
        return match argument.stx.as_ref() {
          Syntax::MemberExpr { .. } | Syntax::ComputedMemberExpr { .. } => {
            if let Reference::Property(Value::Object(obj), key) =
              self.eval_reference(env, argument)?
            {
              obj.borrow_mut().delete_own(&key);
            }
            Ok(Value::Bool(true))
          }
          Syntax::IdExpr { .. } => Ok(Value::Bool(false)),
          _ => {
            self.eval_expr(env, argument)?;
            Ok(Value::Bool(true))
          }
        };
      }
      OperatorName::PrefixIncrement => return self.eval_update(env, argument, 1.0, true),
      OperatorName::PrefixDecrement => return self.eval_update(env, argument, -1.0, true),
      OperatorName::Await => return Err(SandboxError::Unsupported("await")),
      _ => {}
    }
    let value = self.eval_expr(env, argument)?;
    ops::unary(operator, &value).ok_or(SandboxError::Unsupported("unary operator"))
  }

  fn eval_binary(
    &mut self,
    env: &EnvRef,
    operator: OperatorName,
    left: &Node,
    right: &Node,
  ) -> SandboxResult<Value> {
    if operator.is_assignment() {
      return self.eval_assignment(env, operator, left, right);
    }
    let lhs = self.eval_expr(env, left)?;
    match operator {
      OperatorName::LogicalAnd if !to_boolean(&lhs) => return Ok(lhs),
      OperatorName::LogicalOr if to_boolean(&lhs) => return Ok(lhs),
      OperatorName::NullishCoalescing if !lhs.is_nullish() => return Ok(lhs),
      OperatorName::LogicalAnd
      | OperatorName::LogicalOr
      | OperatorName::NullishCoalescing
      | OperatorName::Comma => return self.eval_expr(env, right),
      _ => {}
    }
    let rhs = self.eval_expr(env, right)?;
    match operator {
      OperatorName::In => {
        let Value::Object(obj) = &rhs else {
          return Err(self.throw_error(
            ErrorKind::TypeError,
            "Cannot use 'in' operator to search for a key in a primitive",
          ));
        };
        Ok(Value::Bool(self.has_property(obj, &to_js_string(&lhs))))
      }
      OperatorName::Instanceof => Ok(Value::Bool(self.instance_of(&lhs, &rhs)?)),
      _ => ops::binary(operator, &lhs, &rhs).ok_or(SandboxError::Unsupported("binary operator")),
    }
  }

  fn eval_call(
    &mut self,
    env: &EnvRef,
    callee: &Node,
    arguments: &[Node],
    optional: bool,
  ) -> SandboxResult<Value> {
    let (func, this) = match callee.stx.as_ref() {
      Syntax::MemberExpr {
        object,
        prop,
        optional: member_optional,
      } => {
        let object = self.eval_expr(env, object)?;
        if *member_optional && object.is_nullish() {
          return Ok(Value::Undefined);
        }
        let func = self.get(&object, &JsString::from(prop.as_str()))?;
        (func, object)
      }
      Syntax::ComputedMemberExpr {
        object,
        member,
        optional: member_optional,
      } => {
        let object = self.eval_expr(env, object)?;
        if *member_optional && object.is_nullish() {
          return Ok(Value::Undefined);
        }
        let key = self.eval_expr(env, member)?;
        let func = self.get(&object, &to_js_string(&key))?;
        (func, object)
      }
      Syntax::SuperExpr {} => return Err(SandboxError::Unsupported("super call")),
      _ => (self.eval_expr(env, callee)?, Value::Undefined),
    };
    if optional && func.is_nullish() {
      return Ok(Value::Undefined);
    }
    let args = self.eval_args(env, arguments)?;
    self.call(&func, this, &args)
  }

  fn eval_object_literal(&mut self, env: &EnvRef, props: &[Node]) -> SandboxResult<Value> {
    let obj = self.new_object();
    for prop in props {
      match prop.stx.as_ref() {
        Syntax::ObjProp {
          key,
          value,
          computed,
          kind,
        } => {
          if matches!(kind, PropKind::Getter | PropKind::Setter) {
            return Err(SandboxError::Unsupported("accessor property"));
          }
          let key = self.eval_prop_key(env, key, *computed)?;
          let value = self.eval_expr(env, value)?;
          obj.borrow_mut().set_own(key, value);
        }
        Syntax::SpreadElement { argument } => {
          let source = self.eval_expr(env, argument)?;
          match &source {
            Value::Object(src) => {
              let keys = src.borrow().own_keys();
              for key in keys {
                let value = self.get(&source, &key)?;
                obj.borrow_mut().set_own(key, value);
              }
            }
            Value::String(s) => {
              for (i, unit) in s.as_code_units().iter().enumerate() {
                obj.borrow_mut().set_own(
                  JsString::from(i.to_string()),
                  Value::String(JsString::from_code_units(&[*unit])),
                );
              }
            }
            _ => {}
          }
        }
        _ => return Err(SandboxError::Unsupported("object literal member")),
      }
    }
    Ok(Value::Object(obj))
  }

  pub(crate) fn eval_expr(&mut self, env: &EnvRef, expr: &Node) -> SandboxResult<Value> {
    match expr.stx.as_ref() {
      Syntax::LitNum { value } => Ok(Value::Number(*value)),
      Syntax::LitStr { value } => Ok(Value::string(value)),
      Syntax::LitBool { value } => Ok(Value::Bool(*value)),
      Syntax::LitNull {} => Ok(Value::Null),
      Syntax::LitTemplate { quasis, exprs } => {
        let mut units = Vec::new();
        for (i, quasi) in quasis.iter().enumerate() {
          let cooked = decode_escapes(quasi).unwrap_or_else(|| quasi.clone());
          units.extend(cooked.encode_utf16());
          if let Some(expr) = exprs.get(i) {
            let value = self.eval_expr(env, expr)?;
            units.extend_from_slice(to_js_string(&value).as_code_units());
          }
        }
        Ok(Value::String(JsString::from_u16_vec(units)))
      }
      Syntax::IdExpr { name } => env.lookup(name).map_err(|err| self.env_error(err)),
      Syntax::ThisExpr {} => Ok(env.this_value()),
      Syntax::LitArr { elements } => {
        let mut values = Vec::with_capacity(elements.len());
        for elem in elements {
          match elem.stx.as_ref() {
            Syntax::ArrHole {} => values.push(Value::Undefined),
            Syntax::SpreadElement { argument } => {
              let value = self.eval_expr(env, argument)?;
              values.extend(self.iterate(&value)?);
            }
            _ => values.push(self.eval_expr(env, elem)?),
          }
        }
        Ok(self.new_array(values))
      }
      Syntax::LitObj { props } => self.eval_object_literal(env, props),
      Syntax::FuncExpr { func } | Syntax::ArrowFunc { func } => Ok(self.closure(expr, func, env)),
      Syntax::UnaryExpr { operator, argument } => self.eval_unary(env, *operator, argument),
      Syntax::UnaryPostfixExpr { operator, argument } => {
        let delta = match operator {
          OperatorName::PostfixIncrement => 1.0,
          _ => -1.0,
        };
        self.eval_update(env, argument, delta, false)
      }
      Syntax::BinaryExpr {
        operator,
        left,
        right,
      } => self.eval_binary(env, *operator, left, right),
      Syntax::CondExpr {
        test,
        consequent,
        alternate,
      } => {
        let test = self.eval_expr(env, test)?;
        if to_boolean(&test) {
          self.eval_expr(env, consequent)
        } else {
          self.eval_expr(env, alternate)
        }
      }
      Syntax::MemberExpr {
        object,
        prop,
        optional,
      } => {
        if prop.starts_with('#') {
          return Err(SandboxError::Unsupported("private member"));
        }
        let object = self.eval_expr(env, object)?;
        if *optional && object.is_nullish() {
          return Ok(Value::Undefined);
        }
        self.get(&object, &JsString::from(prop.as_str()))
      }
      Syntax::ComputedMemberExpr {
        object,
        member,
        optional,
      } => {
        let object = self.eval_expr(env, object)?;
        if *optional && object.is_nullish() {
          return Ok(Value::Undefined);
        }
        let key = self.eval_expr(env, member)?;
        self.get(&object, &to_js_string(&key))
      }
      Syntax::CallExpr {
        callee,
        arguments,
        optional,
      } => self.eval_call(env, callee, arguments, *optional),
      Syntax::NewExpr { callee, arguments } => {
        let callee = self.eval_expr(env, callee)?;
        let args = self.eval_args(env, arguments)?;
        self.construct(&callee, &args)
      }
      Syntax::LitBigInt { .. } => Err(SandboxError::Unsupported("bigint literal")),
      Syntax::LitRegex { .. } => Err(SandboxError::Unsupported("regular expression literal")),
      Syntax::TaggedTemplate { .. } => Err(SandboxError::Unsupported("tagged template")),
      Syntax::ClassExpr { .. } => Err(SandboxError::Unsupported("class expression")),
      Syntax::YieldExpr { .. } => Err(SandboxError::Unsupported("yield")),
      Syntax::AwaitExpr { .. } => Err(SandboxError::Unsupported("await")),
      _ => Err(SandboxError::Unsupported("expression")),
    }
  }
}

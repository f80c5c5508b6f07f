use crate::env::EnvRef;
use crate::error::SandboxError;
use crate::error::SandboxResult;
use crate::ops::to_js_string;
use crate::realm::ErrorKind;
use crate::realm::Realm;
use crate::string::JsString;
use crate::value::ObjectKind;
use crate::value::Value;
use syntax_js::ast::node::Node;
use syntax_js::ast::syntax::Syntax;
use syntax_js::num::number_to_string;

/// How the leaves of a pattern receive their values.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum BindMode {
  /// Destructuring assignment: leaves are references.
  Assign,
  /// `var` declarator.
  Var,
  /// `let`/`const` declarator, parameter or catch binding, initialized in the given scope.
  Lexical,
}

impl Realm {
  /// The property name of a non-computed key, or the evaluated key of a computed one.
  pub(crate) fn eval_prop_key(
    &mut self,
    env: &EnvRef,
    key: &Node,
    computed: bool,
  ) -> SandboxResult<JsString> {
    if computed {
      let value = self.eval_expr(env, key)?;
      return Ok(to_js_string(&value));
    }
    match key.stx.as_ref() {
      Syntax::PropKey { name } => Ok(JsString::from(name.as_str())),
      Syntax::LitStr { value } => Ok(JsString::from(value.as_str())),
      Syntax::LitNum { value } => Ok(JsString::from(number_to_string(*value))),
      _ => Err(SandboxError::Unsupported("property key")),
    }
  }

  /// Values produced by iterating `value`, for array patterns, spread and `for..of`.
  pub(crate) fn iterate(&mut self, value: &Value) -> SandboxResult<Vec<Value>> {
    match value {
      Value::String(s) => {
        let units = s.as_code_units();
        let mut out = Vec::new();
        let mut i = 0;
        while i < units.len() {
          let is_pair = (0xD800..0xDC00).contains(&units[i])
            && units.get(i + 1).is_some_and(|u| (0xDC00..0xE000).contains(u));
          let len = if is_pair { 2 } else { 1 };
          out.push(Value::String(JsString::from_code_units(&units[i..i + len])));
          i += len;
        }
        Ok(out)
      }
      Value::Object(obj) => match &obj.borrow().kind {
        ObjectKind::Array(elems) => Ok(elems.clone()),
        _ => Err(self.throw_error(ErrorKind::TypeError, "object is not iterable")),
      },
      other => Err(self.throw_error(
        ErrorKind::TypeError,
        format!("{} is not iterable", to_js_string(other)),
      )),
    }
  }

  pub(crate) fn bind_pattern(
    &mut self,
    env: &EnvRef,
    pat: &Node,
    value: Value,
    mode: BindMode,
  ) -> SandboxResult<()> {
    match pat.stx.as_ref() {
      Syntax::IdPat { name } | Syntax::IdExpr { name } => match mode {
        BindMode::Lexical => {
          env.initialize(name, value);
          Ok(())
        }
        BindMode::Var => {
          env.declare_var(name);
          env.assign(name, value).map_err(|err| self.env_error(err))
        }
        BindMode::Assign => env.assign(name, value).map_err(|err| self.env_error(err)),
      },
      Syntax::MemberExpr { object, prop, .. } => {
        let object = self.eval_expr(env, object)?;
        self.set(&object, JsString::from(prop.as_str()), value)
      }
      Syntax::ComputedMemberExpr { object, member, .. } => {
        let object = self.eval_expr(env, object)?;
        let key = self.eval_expr(env, member)?;
        self.set(&object, to_js_string(&key), value)
      }
      Syntax::AssignPat { target, default } => {
        let value = match value {
          Value::Undefined => self.eval_expr(env, default)?,
          value => value,
        };
        self.bind_pattern(env, target, value, mode)
      }
      Syntax::ArrPat { elements } => {
        let items = self.iterate(&value)?;
        for (i, elem) in elements.iter().enumerate() {
          match elem.stx.as_ref() {
            Syntax::ArrHole {} => {}
            Syntax::RestPat { target } => {
              let rest = self.new_array(items.get(i..).map(<[Value]>::to_vec).unwrap_or_default());
              self.bind_pattern(env, target, rest, mode)?;
            }
            _ => {
              let item = items.get(i).cloned().unwrap_or(Value::Undefined);
              self.bind_pattern(env, elem, item, mode)?;
            }
          }
        }
        Ok(())
      }
      Syntax::ObjPat { props } => {
        if value.is_nullish() {
          return Err(self.throw_error(
            ErrorKind::TypeError,
            format!("Cannot destructure '{}'", to_js_string(&value)),
          ));
        }
        let mut used = Vec::new();
        for prop in props {
          match prop.stx.as_ref() {
            Syntax::PatProp {
              key,
              target,
              computed,
              ..
            } => {
              let key = self.eval_prop_key(env, key, *computed)?;
              let item = self.get(&value, &key)?;
              used.push(key);
              self.bind_pattern(env, target, item, mode)?;
            }
            Syntax::RestPat { target } => {
              let rest = self.new_object();
              if let Value::Object(source) = &value {
                let keys = source.borrow().own_keys();
                for key in keys.into_iter().filter(|k| !used.contains(k)) {
                  let item = self.get(&value, &key)?;
                  rest.borrow_mut().set_own(key, item);
                }
              }
              self.bind_pattern(env, target, Value::Object(rest), mode)?;
            }
            _ => return Err(SandboxError::Unsupported("object pattern member")),
          }
        }
        Ok(())
      }
      _ => Err(SandboxError::Unsupported("binding pattern")),
    }
  }
}
